//! Tank, bullet and map templates
//!
//! Templates arrive as JSON documents shaped like
//! `{ "bullets": {..}, "tanks": {..}, "maps": {..} }`, keyed by name. Every
//! field is optional and falls back to a sensible default. Several documents
//! can be layered (base game first, then mods); a later record replaces an
//! earlier one with the same name.
//!
//! Loading never fails as a whole. Anything wrong is collected as a
//! [`Problem`] and the offending record is either patched with a default or
//! dropped, so the game can still show the list to the player and start.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Rgba;

/// Opaque handle naming a sprite in whatever atlas the renderer uses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteId(pub String);

impl SpriteId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Immutable bullet parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BulletTemplate {
    pub speed: f32,
    /// Collision radius
    pub size: f32,
    /// Seconds before the bullet expires
    pub live_time: f32,
    pub damage: i32,
    pub sprite: SpriteId,
}

impl BulletTemplate {
    /// Distance covered before expiring
    pub fn range(&self) -> f32 {
        self.speed * self.live_time
    }

    pub fn range2(&self) -> f32 {
        let r = self.range();
        r * r
    }
}

/// Immutable tank parameters
#[derive(Debug, Clone, PartialEq)]
pub struct TankTemplate {
    pub name: String,
    pub bullet: Rc<BulletTemplate>,

    /// Thrust acceleration
    pub speed: f32,
    /// Reverse thrust relative to forward thrust
    pub transmission: f32,
    /// Hull turn rate, radians per second
    pub steer: f32,
    pub base_sprite: SpriteId,

    /// Collision radius
    pub size: f32,
    pub max_health: i32,
    /// AI backs off once `max_health / health` exceeds this
    pub retreat_ratio: i32,
    /// Delay after a hit before regeneration starts
    pub regeneration_proc: f32,
    /// Interval between regeneration pulses
    pub regeneration_tick: f32,
    pub regeneration_power: i32,

    /// Template this tank turns into on level-up
    pub next: Option<String>,
    pub needed_score: i32,
    /// Score granted to whoever destroys this tank
    pub value: i32,

    /// AI retreats when closer than `range * distancing`
    pub distancing: f32,
    pub reload_speed: f32,
    pub turret_len: f32,
    /// Turret turn rate, radians per second
    pub turret_speed: f32,
    pub turret_sprite: SpriteId,
    pub turret_pivot: Vec2,
    pub turret_offset: Vec2,
    /// How far past bullet range the AI keeps tracking, as a fraction
    pub memory: f32,
}

/// Map and session parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapTemplate {
    #[serde(skip)]
    pub name: String,
    pub size: Vec2,
    pub tile_size: Vec2,
    /// Sprite scale for drawing
    pub scale: Vec2,
    pub friction: f32,
    /// Seconds between enemy spawns
    pub spawn_rate: f32,
    /// Spawn period multiplier applied on each player level-up
    pub spawn_scaling: f32,
    pub seed: Option<u64>,
    pub team_count: u32,
    pub background: Rgba,
    /// Tank templates enemies are drawn from
    pub spawns: Vec<String>,
    /// Player's starting tank; random spawn pick when missing
    pub player: Option<String>,
    pub win_message: String,
    pub lose_message: String,
    /// Templates the player may not level up into
    pub disabled_player: BTreeSet<String>,
    /// Templates enemies may not level up into
    pub disabled_enemy: BTreeSet<String>,
}

impl Default for MapTemplate {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: Vec2::new(5000.0, 5000.0),
            tile_size: Vec2::new(300.0, 300.0),
            scale: Vec2::new(1.5, 1.5),
            friction: 10.0,
            spawn_rate: 60.0,
            spawn_scaling: 0.6,
            seed: None,
            team_count: 2,
            background: Rgba::BLACK,
            spawns: Vec::new(),
            player: None,
            win_message: "YOU WON!".into(),
            lose_message: "YOU LOST!".into(),
            disabled_player: BTreeSet::new(),
            disabled_enemy: BTreeSet::new(),
        }
    }
}

impl MapTemplate {
    /// Whether `template` is off limits for a level-up
    pub fn disabled(&self, template: &str, player: bool) -> bool {
        if player {
            self.disabled_player.contains(template)
        } else {
            self.disabled_enemy.contains(template)
        }
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tank {tank} uses unknown bullet {bullet}, using defaults")]
    UnknownBullet { tank: String, bullet: String },
    #[error("map {map} references unknown tank {tank}")]
    UnknownTank { map: String, tank: String },
    #[error("tank {tank} levels up into unknown tank {next}")]
    UnknownNext { tank: String, next: String },
    #[error("map {map} is unusable: {reason}")]
    InvalidMap { map: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something was patched over; the game still works
    Note,
    /// Data was dropped
    Fatal,
}

/// One collected loading problem
#[derive(Debug)]
pub struct Problem {
    pub severity: Severity,
    pub error: AssetError,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.severity {
            Severity::Note => "[note]",
            Severity::Fatal => "[fatal]",
        };
        write!(f, "{marker} {}", self.error)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawBullet {
    speed: f32,
    size: f32,
    live_time: f32,
    damage: i32,
    sprite: Option<String>,
}

impl Default for RawBullet {
    fn default() -> Self {
        Self {
            speed: 500.0,
            size: 5.0,
            live_time: 1.0,
            damage: 1,
            sprite: None,
        }
    }
}

impl RawBullet {
    fn build(&self, name: &str) -> BulletTemplate {
        BulletTemplate {
            speed: self.speed,
            size: self.size,
            live_time: self.live_time,
            damage: self.damage,
            sprite: sprite_or(&self.sprite, name, 3),
        }
    }
}

/// A tank's bullet: a catalog name or an inline record
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawBulletRef {
    Named(String),
    Inline(RawBullet),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawTank {
    bullet: Option<RawBulletRef>,
    speed: f32,
    transmission: f32,
    steer_speed: f32,
    base_sprite: Option<String>,
    max_health: i32,
    size: f32,
    retreat_ratio: i32,
    regeneration_proc: f32,
    regeneration_tick: f32,
    regeneration_power: i32,
    next: Option<String>,
    needed_score: i32,
    value: i32,
    distancing: f32,
    reload_speed: f32,
    turret_len: f32,
    turret_speed: f32,
    turret_sprite: Option<String>,
    turret_pivot: Vec2,
    turret_offset: Vec2,
    memory: f32,
}

impl Default for RawTank {
    fn default() -> Self {
        Self {
            bullet: None,
            speed: 2000.0,
            transmission: 0.5,
            steer_speed: 3.0,
            base_sprite: None,
            max_health: 50,
            size: 20.0,
            retreat_ratio: 5,
            regeneration_proc: 10.0,
            regeneration_tick: 1.0,
            regeneration_power: 1,
            next: None,
            needed_score: 10,
            value: 1,
            distancing: 0.5,
            reload_speed: 1.0,
            turret_len: 50.0,
            turret_speed: 3.0,
            turret_sprite: None,
            turret_pivot: Vec2::new(-7.0, 0.0),
            turret_offset: Vec2::new(-7.0, 0.0),
            memory: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawCatalog {
    bullets: BTreeMap<String, RawBullet>,
    tanks: BTreeMap<String, RawTank>,
    maps: BTreeMap<String, MapTemplate>,
}

/// Default sprite names append a slot digit to the template name
fn sprite_or(explicit: &Option<String>, name: &str, slot: u8) -> SpriteId {
    match explicit {
        Some(s) => SpriteId::new(s.clone()),
        None => SpriteId(format!("{name}{slot}")),
    }
}

/// Accumulates catalog documents, then resolves them into a [`Catalog`]
#[derive(Debug, Default)]
pub struct CatalogLoader {
    raw: RawCatalog,
    problems: Vec<Problem>,
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer a JSON document over what was added before
    pub fn add_str(&mut self, origin: &str, json: &str) -> &mut Self {
        match serde_json::from_str::<RawCatalog>(json) {
            Ok(raw) => {
                log::info!(
                    "Catalog {}: {} bullets, {} tanks, {} maps",
                    origin,
                    raw.bullets.len(),
                    raw.tanks.len(),
                    raw.maps.len()
                );
                self.raw.bullets.extend(raw.bullets);
                self.raw.tanks.extend(raw.tanks);
                self.raw.maps.extend(raw.maps);
            }
            Err(source) => self.fatal(AssetError::Json {
                origin: origin.to_string(),
                source,
            }),
        }
        self
    }

    pub fn add_file(&mut self, path: &Path) -> &mut Self {
        match std::fs::read_to_string(path) {
            Ok(json) => self.add_str(&path.display().to_string(), &json),
            Err(source) => {
                self.fatal(AssetError::Io {
                    path: path.to_path_buf(),
                    source,
                });
                self
            }
        }
    }

    /// Layer `catalog.json` from a mod directory
    pub fn add_mod(&mut self, dir: &Path) -> &mut Self {
        self.add_file(&dir.join("catalog.json"))
    }

    fn note(&mut self, error: AssetError) {
        self.problems.push(Problem {
            severity: Severity::Note,
            error,
        });
    }

    fn fatal(&mut self, error: AssetError) {
        self.problems.push(Problem {
            severity: Severity::Fatal,
            error,
        });
    }

    /// Resolve references and validate
    pub fn compile(mut self) -> LoadedCatalog {
        let raw = std::mem::take(&mut self.raw);

        let bullets: BTreeMap<String, Rc<BulletTemplate>> = raw
            .bullets
            .iter()
            .map(|(name, b)| (name.clone(), Rc::new(b.build(name))))
            .collect();

        let mut tanks = BTreeMap::new();
        for (name, t) in &raw.tanks {
            let bullet = match &t.bullet {
                Some(RawBulletRef::Named(b)) => match bullets.get(b) {
                    Some(found) => found.clone(),
                    None => {
                        self.note(AssetError::UnknownBullet {
                            tank: name.clone(),
                            bullet: b.clone(),
                        });
                        Rc::new(RawBullet::default().build(name))
                    }
                },
                Some(RawBulletRef::Inline(b)) => Rc::new(b.build(name)),
                None => Rc::new(RawBullet::default().build(name)),
            };

            let next = t.next.clone().filter(|n| !n.is_empty());
            if let Some(n) = &next {
                if !raw.tanks.contains_key(n) {
                    self.note(AssetError::UnknownNext {
                        tank: name.clone(),
                        next: n.clone(),
                    });
                }
            }

            tanks.insert(
                name.clone(),
                Rc::new(TankTemplate {
                    name: name.clone(),
                    bullet,
                    speed: t.speed,
                    transmission: t.transmission,
                    steer: t.steer_speed,
                    base_sprite: sprite_or(&t.base_sprite, name, 2),
                    size: t.size,
                    max_health: t.max_health.max(1),
                    retreat_ratio: t.retreat_ratio,
                    regeneration_proc: t.regeneration_proc,
                    regeneration_tick: t.regeneration_tick,
                    regeneration_power: t.regeneration_power,
                    next,
                    needed_score: t.needed_score,
                    value: t.value,
                    distancing: t.distancing,
                    reload_speed: t.reload_speed,
                    turret_len: t.turret_len,
                    turret_speed: t.turret_speed,
                    turret_sprite: sprite_or(&t.turret_sprite, name, 1),
                    turret_pivot: t.turret_pivot,
                    turret_offset: t.turret_offset,
                    memory: t.memory,
                }),
            );
        }

        let mut maps = BTreeMap::new();
        for (name, mut map) in raw.maps {
            map.name = name.clone();

            if map.tile_size.x <= 0.0 || map.tile_size.y <= 0.0 {
                self.fatal(AssetError::InvalidMap {
                    map: name,
                    reason: format!("tile size {} must be positive", map.tile_size),
                });
                continue;
            }
            if map.size.x <= 0.0 || map.size.y <= 0.0 {
                self.fatal(AssetError::InvalidMap {
                    map: name,
                    reason: format!("size {} must be positive", map.size),
                });
                continue;
            }
            let cells = (map.size / map.tile_size).ceil().as_dvec2();
            if cells.x * cells.y > MAX_GRID_CELLS {
                self.fatal(AssetError::InvalidMap {
                    map: name,
                    reason: format!(
                        "{}x{} grid cells exceed the limit of {}",
                        cells.x, cells.y, MAX_GRID_CELLS
                    ),
                });
                continue;
            }

            let referenced = map.spawns.iter().chain(map.player.iter());
            let missing: Vec<String> = referenced
                .filter(|t| !tanks.contains_key(*t))
                .cloned()
                .collect();
            for tank in missing {
                self.note(AssetError::UnknownTank {
                    map: name.clone(),
                    tank,
                });
            }

            maps.insert(name, map);
        }

        for p in &self.problems {
            log::warn!("{}", p);
        }

        LoadedCatalog {
            catalog: Catalog {
                tanks,
                maps,
            },
            problems: self.problems,
        }
    }
}

/// Result of [`CatalogLoader::compile`]
#[derive(Debug)]
pub struct LoadedCatalog {
    pub catalog: Catalog,
    pub problems: Vec<Problem>,
}

impl LoadedCatalog {
    pub fn has_fatal(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Fatal)
    }
}

/// Largest spatial grid a map may ask for
pub const MAX_GRID_CELLS: f64 = 1_048_576.0;

/// Catalog shipped inside the binary
pub const BUNDLED: &str = include_str!("../assets/catalog.json");

/// Resolved templates, looked up by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tanks: BTreeMap<String, Rc<TankTemplate>>,
    maps: BTreeMap<String, MapTemplate>,
}

impl Catalog {
    /// Load a single JSON document
    pub fn from_json(json: &str) -> LoadedCatalog {
        let mut loader = CatalogLoader::new();
        loader.add_str("<memory>", json);
        loader.compile()
    }

    pub fn tank(&self, name: &str) -> Option<&Rc<TankTemplate>> {
        self.tanks.get(name)
    }

    pub fn map(&self, name: &str) -> Option<&MapTemplate> {
        self.maps.get(name)
    }

    pub fn tanks(&self) -> impl Iterator<Item = &Rc<TankTemplate>> {
        self.tanks.values()
    }

    pub fn map_names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    /// Register a tank template directly
    pub fn insert_tank(&mut self, template: TankTemplate) -> Rc<TankTemplate> {
        let template = Rc::new(template);
        self.tanks.insert(template.name.clone(), template.clone());
        template
    }

    pub fn insert_map(&mut self, map: MapTemplate) {
        self.maps.insert(map.name.clone(), map);
    }
}
