//! World and session state
//!
//! The world owns every runtime record through two slot storages and keeps
//! the spatial hash in sync with tank positions. This file holds the
//! lifecycle side: loading a map, creating tanks and bullets, spawning,
//! scoring, leveling up and ending a run. The per-frame step lives in
//! `tick.rs`, AI in `ai.rs`.

use std::f32::consts::TAU;
use std::rc::Rc;

use glam::Vec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::Aabb;
use super::grid::SpatialHash;
use super::state::{Bullet, Controls, GameEvent, GamePhase, Tank};
use super::storage::{Key, Storage};
use super::timer::Timer;
use crate::camera::Camera;
use crate::catalog::{Catalog, MapTemplate, TankTemplate};
use crate::consts::{PLAYER_GROUP, PLAYER_START};
use crate::settings::Settings;

pub struct World {
    pub catalog: Catalog,
    /// Working copy of the loaded map; spawn rate changes during a run
    pub map: MapTemplate,
    /// Map as it was loaded, for retries
    last_map: Option<MapTemplate>,
    pub phase: GamePhase,

    pub tanks: Storage<Tank>,
    pub bullets: Storage<Bullet>,
    pub grid: SpatialHash,
    pub(super) spawning: Timer,

    pub player: Option<usize>,
    pub total_score: i32,
    /// Let the AI drive the player's tank
    pub autopilot: bool,

    pub camera: Camera,
    /// Visible world rectangle, for culling only
    pub frame: Aabb,
    /// Clamped delta of the current step
    pub delta: f32,

    pub(super) rng: Pcg32,
    /// Largest tank radius in the catalog, pads bullet queries
    pub(super) reach: f32,
    /// Reusable grid query buffer
    pub(super) buff: Vec<usize>,
    /// Reusable id list for iteration
    pub(super) ids: Vec<usize>,
    events: Vec<GameEvent>,
}

impl World {
    pub fn new(catalog: Catalog, settings: &Settings, seed: u64) -> Self {
        let reach = catalog.tanks().map(|t| t.size).fold(0.0, f32::max);
        let map = MapTemplate::default();
        Self {
            catalog,
            grid: SpatialHash::covering(map.size, map.tile_size),
            map,
            last_map: None,
            phase: GamePhase::Menu,
            tanks: Storage::new(),
            bullets: Storage::new(),
            spawning: Timer::period(f32::INFINITY),
            player: None,
            total_score: 0,
            autopilot: false,
            camera: Camera::from_settings(settings),
            frame: Aabb::new(Vec2::ZERO, Vec2::ZERO),
            delta: 0.0,
            rng: Pcg32::seed_from_u64(seed),
            reach,
            buff: Vec::new(),
            ids: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Load a map by name; false if the catalog has no such map
    pub fn load_map_named(&mut self, name: &str) -> bool {
        match self.catalog.map(name) {
            Some(map) => {
                let map = map.clone();
                self.load_map(map);
                true
            }
            None => {
                log::warn!("No map named {}", name);
                false
            }
        }
    }

    /// Reset the session onto `map` and put the player in
    pub fn load_map(&mut self, map: MapTemplate) {
        let seed = map.seed.unwrap_or_else(|| self.rng.next_u64());
        log::info!("Loading map {} (seed {})", map.name, seed);

        self.last_map = Some(map.clone());
        self.grid = SpatialHash::covering(map.size, map.tile_size);
        self.spawning = Timer::period(map.spawn_rate);
        self.map = map;
        self.rng = Pcg32::seed_from_u64(seed);
        self.total_score = 0;
        self.player = None;

        self.tanks.clear();
        self.bullets.clear();

        let start = self
            .map
            .player
            .as_deref()
            .and_then(|name| self.catalog.tank(name))
            .cloned();
        match start {
            Some(template) => {
                self.create_tank(true, PLAYER_GROUP, PLAYER_START, 0.0, 0.0, template);
            }
            None => {
                self.random_spawn(true, PLAYER_GROUP);
            }
        }

        self.phase = GamePhase::Playing;
        self.update_score();
    }

    /// Reload the last map from scratch
    pub fn retry(&mut self) -> bool {
        match self.last_map.clone() {
            Some(map) => {
                self.load_map(map);
                true
            }
            None => false,
        }
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
        }
    }

    /// Give up the run
    pub fn quit(&mut self) {
        if matches!(self.phase, GamePhase::Playing | GamePhase::Paused) {
            self.end_game(false);
        }
    }

    pub fn player_tank(&self) -> Option<&Tank> {
        self.player.and_then(|id| self.tanks.get(id))
    }

    /// Take every event produced since the last call
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Allocate a tank, register it in the grid and return its id
    ///
    /// A new player tank replaces the previous one, which is marked dead.
    pub fn create_tank(
        &mut self,
        player: bool,
        group: u32,
        pos: Vec2,
        base_rot: f32,
        turret_rot: f32,
        template: Rc<TankTemplate>,
    ) -> usize {
        let name = template.name.clone();
        let id = self.tanks.allocate_with(|id| {
            Tank::new(
                template,
                id,
                group,
                player,
                pos,
                base_rot,
                turret_rot,
                Controls::default(),
            )
        });
        self.tanks.item_mut(id).address = self.grid.insert(pos, id, group);

        if player {
            if let Some(old) = self.player.and_then(|p| self.tanks.get_mut(p)) {
                old.health = 0;
            }
            self.player = Some(id);
        }

        log::debug!("Spawned {} #{} in group {} at {}", name, id, group, pos);
        self.emit(GameEvent::TankSpawned {
            id,
            template: name,
            group,
        });
        id
    }

    /// Fire the tank's bullet from its muzzle
    pub(super) fn create_bullet(&mut self, owner: usize) -> usize {
        let key = self.tanks.key(owner);
        let t = self.tanks.item(owner);
        let (template, group, pos, vel, rot) = (
            t.template.bullet.clone(),
            t.group,
            t.muzzle(),
            t.vel,
            t.turret_angle(),
        );
        self.bullets
            .allocate_with(|id| Bullet::new(template, id, group, key, pos, vel, rot))
    }

    /// Drop a tank from storage and grid
    pub(super) fn remove_tank(&mut self, id: usize) {
        let tank = self.tanks.remove(id);
        self.grid.remove(tank.address, id, tank.group);
        if self.player == Some(id) {
            self.end_game(false);
        }
    }

    /// Spawn an enemy whenever the spawn timer fires
    pub(super) fn spawn(&mut self) {
        if !self.spawning.tick_done_reset(self.delta) {
            return;
        }
        let group = 1 + self.rng.random_range(0..self.map.team_count.max(1));
        self.random_spawn(false, group);
    }

    /// Create a random template from the map's spawn pool at a random spot
    pub fn random_spawn(&mut self, player: bool, group: u32) -> Option<usize> {
        if self.map.spawns.is_empty() {
            log::warn!("Map {} has nothing to spawn", self.map.name);
            return None;
        }
        let pick = self.rng.random_range(0..self.map.spawns.len());
        let name = &self.map.spawns[pick];
        let Some(template) = self.catalog.tank(name).cloned() else {
            log::warn!("Spawn entry {} is not a known tank", name);
            return None;
        };

        let pos = Vec2::new(
            self.rng.random::<f32>() * self.map.size.x,
            self.rng.random::<f32>() * self.map.size.y,
        );
        let base_rot = self.rng.random::<f32>() * TAU;
        let turret_rot = self.rng.random::<f32>() * TAU;
        Some(self.create_tank(player, group, pos, base_rot, turret_rot, template))
    }

    /// Credit `killer` for destroying `victim`
    ///
    /// The victim is still in storage when this runs.
    pub(super) fn on_death(&mut self, killer: Key, victim: usize) {
        let value = self.tanks.item(victim).template.value;

        if let Some(k) = self.tanks.resolve(killer).filter(|k| !k.dead()) {
            let reached = k.score + value >= k.template.needed_score;
            self.tanks.item_mut(killer.id).score += value;
            self.emit(GameEvent::Killed {
                killer: killer.id,
                victim,
                value,
            });

            if self.player == Some(killer.id) {
                self.total_score += value;
                self.update_score();
            }
            if reached {
                self.level_up(killer.id);
            }
        }

        if self.player == Some(victim) {
            self.end_game(false);
        }
    }

    /// Report the player's progress
    pub(super) fn update_score(&mut self) {
        let Some(t) = self.player_tank() else {
            return;
        };
        let event = GameEvent::ScoreChanged {
            score: t.score,
            needed: t.template.needed_score,
            total: self.total_score,
        };
        self.emit(event);
    }

    /// Replace a tank that reached its score threshold with its next tier
    pub(super) fn level_up(&mut self, id: usize) {
        let t = self.tanks.item(id);
        let player = t.player;
        let next = t
            .template
            .next
            .as_deref()
            .and_then(|name| self.catalog.tank(name))
            .cloned();

        let next = match next {
            Some(next) if !self.map.disabled(&next.name, player) => next,
            other => {
                if player {
                    // Victory only when there is no tier left at all
                    self.end_game(other.is_none());
                } else {
                    log::debug!("#{} maxed out, farming again", id);
                }
                self.tanks.item_mut(id).score = 0;
                return;
            }
        };

        if player {
            self.map.spawn_rate *= self.map.spawn_scaling;
            self.spawning.period = self.map.spawn_rate;
        }

        let t = self.tanks.item(id);
        let (group, pos, base_rot, turret_rot) = (t.group, t.pos, t.base_rot, t.turret_rot);
        let name = next.name.clone();
        let new = self.create_tank(player, group, pos, base_rot, turret_rot, next);
        self.tanks.item_mut(id).health = 0;

        log::info!("#{} leveled up into {} as #{}", id, name, new);
        self.emit(GameEvent::LeveledUp {
            old: id,
            new,
            template: name,
        });
        if player {
            self.update_score();
        }
    }

    /// Finish the run and report the outcome
    pub fn end_game(&mut self, victory: bool) {
        if matches!(self.phase, GamePhase::Over { .. }) {
            return;
        }
        let message = if victory {
            self.map.win_message.clone()
        } else {
            self.map.lose_message.clone()
        };
        log::info!("{} (total score {})", message, self.total_score);

        self.player = None;
        self.phase = GamePhase::Over { victory };
        self.emit(GameEvent::GameEnded {
            victory,
            message,
            total_score: self.total_score,
        });
    }
}
