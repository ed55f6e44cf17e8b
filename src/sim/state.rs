//! Runtime entity records and the signals flowing in and out of the world
//!
//! A runtime record pairs a shared, immutable template with the mutable
//! state the simulation owns.

use std::rc::Rc;

use glam::Vec2;

use super::grid::Address;
use super::storage::Key;
use super::timer::{Easing, Interpolator, Timer};
use crate::catalog::{BulletTemplate, TankTemplate};
use crate::color::Rgba;
use crate::consts::{BAR_REVEAL, BAR_START_ALPHA, HIT_FLASH};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// No map loaded, or sitting on a menu
    #[default]
    Menu,
    /// Active gameplay
    Playing,
    /// Map loaded but frozen
    Paused,
    /// Run ended
    Over { victory: bool },
}

/// Boolean "pressed" state for one tank's controls
///
/// The player's tank gets this from the input layer every frame; AI tanks
/// fill it in themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
}

/// Something the UI or session layer may want to react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// Player's score or threshold changed
    ScoreChanged { score: i32, needed: i32, total: i32 },
    TankSpawned { id: usize, template: String, group: u32 },
    Killed { killer: usize, victim: usize, value: i32 },
    LeveledUp { old: usize, new: usize, template: String },
    GameEnded {
        victory: bool,
        message: String,
        total_score: i32,
    },
}

/// A tank in the arena
#[derive(Debug, Clone)]
pub struct Tank {
    pub template: Rc<TankTemplate>,
    pub id: usize,
    pub group: u32,
    pub player: bool,

    pub pos: Vec2,
    pub vel: Vec2,
    /// Point the turret tracks
    pub aim: Vec2,
    pub base_rot: f32,
    /// Turret rotation relative to the hull
    pub turret_rot: f32,

    pub health: i32,
    pub score: i32,
    pub target: Option<Key>,
    pub input: Controls,

    pub reloader: Timer,
    /// Regeneration delay, then regeneration pulses
    pub healing: Timer,
    /// Whether the post-hit delay has elapsed
    pub regenerating: bool,

    pub mask: Rgba,
    pub hit_inter: Interpolator,
    pub heal_inter: Interpolator,
    pub bar_inter: Interpolator,

    pub address: Address,
}

impl Tank {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        template: Rc<TankTemplate>,
        id: usize,
        group: u32,
        player: bool,
        pos: Vec2,
        base_rot: f32,
        turret_rot: f32,
        input: Controls,
    ) -> Self {
        Self {
            id,
            group,
            player,
            pos,
            vel: Vec2::ZERO,
            aim: pos,
            base_rot,
            turret_rot,
            health: template.max_health,
            score: 0,
            target: None,
            input,
            reloader: Timer::period(template.reload_speed),
            healing: Timer::period(template.regeneration_proc),
            regenerating: false,
            mask: Rgba::WHITE,
            hit_inter: Interpolator::new(0.0, 1.0, HIT_FLASH, Easing::Linear),
            heal_inter: Interpolator::new(0.0, 1.0, template.regeneration_tick, Easing::Linear),
            bar_inter: Interpolator::new(BAR_START_ALPHA, 0.0, BAR_REVEAL, Easing::Linear),
            address: Address::ZERO,
            template,
        }
    }

    /// Take a bullet's damage and turn toward whoever fired it
    pub fn hit(&mut self, bullet: &Bullet) {
        self.health -= bullet.template.damage;
        self.target = Some(bullet.owner);
        self.healing = Timer::period(self.template.regeneration_proc);
        self.regenerating = false;

        self.hit_inter.reset();
        self.bar_inter.reset();
    }

    /// Regenerate after the post-hit delay has elapsed
    pub fn heal(&mut self, delta: f32) {
        if self.healthy() {
            return;
        }

        if self.healing.tick_done_reset(delta) {
            if !self.regenerating {
                self.regenerating = true;
                self.healing.period = self.template.regeneration_tick;
            } else {
                self.health = (self.health + self.template.regeneration_power)
                    .min(self.template.max_health);
                self.heal_inter.reset();
            }
        }
    }

    /// Advance visual feedback and tint the mask
    pub fn update_tint(&mut self, delta: f32) {
        if !self.heal_inter.done() {
            let c = self.heal_inter.update(delta);
            self.mask.r = c;
            self.mask.b = c;
        }
        if !self.hit_inter.done() {
            let c = self.hit_inter.update(delta);
            self.mask.g = c;
            self.mask.b = c;
        }
        if !self.bar_inter.done() {
            self.bar_inter.update(delta);
        }
    }

    #[inline]
    pub fn dead(&self) -> bool {
        self.health <= 0
    }

    #[inline]
    pub fn healthy(&self) -> bool {
        self.health == self.template.max_health
    }

    /// Whether the AI should back away from its target
    ///
    /// Integer ratio on purpose: `50 / 10 > 5` is false.
    pub fn should_retreat(&self) -> bool {
        if self.dead() {
            return false;
        }
        self.template.max_health / self.health > self.template.retreat_ratio
    }

    pub fn detarget(&mut self) {
        self.target = None;
        self.input.fire = false;
    }

    /// Absolute turret angle
    pub fn turret_angle(&self) -> f32 {
        self.base_rot + self.turret_rot
    }

    /// Turret pivot in world space
    pub fn turret_base(&self) -> Vec2 {
        self.pos + Vec2::from_angle(self.base_rot).rotate(self.template.turret_offset)
    }

    /// Where fired bullets appear
    pub fn muzzle(&self) -> Vec2 {
        self.turret_base() + crate::polar(self.turret_angle(), self.template.turret_len)
    }

    /// Health ring progress in 0..=π, zero when at full health
    pub fn bar_progress(&self) -> f32 {
        let progress =
            self.health.max(0) as f32 / self.template.max_health as f32 * std::f32::consts::PI;
        if progress >= std::f32::consts::PI {
            0.0
        } else {
            progress
        }
    }
}

/// A bullet in flight
#[derive(Debug, Clone)]
pub struct Bullet {
    pub template: Rc<BulletTemplate>,
    pub id: usize,
    pub group: u32,
    pub owner: Key,
    pub pos: Vec2,
    pub vel: Vec2,
    pub rot: f32,
    pub live: Timer,
}

impl Bullet {
    pub fn new(
        template: Rc<BulletTemplate>,
        id: usize,
        group: u32,
        owner: Key,
        pos: Vec2,
        inherited: Vec2,
        rot: f32,
    ) -> Self {
        Self {
            id,
            group,
            owner,
            pos,
            vel: crate::polar(rot, template.speed) + inherited,
            rot,
            live: Timer::period(template.live_time),
            template,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::fixtures;

    fn tank() -> Tank {
        Tank::new(fixtures::tank_template("test"), 0, 1, false, Vec2::ZERO, 0.0, 0.0, Controls::default())
    }

    fn bullet(t: &Tank) -> Bullet {
        let owner = Key { id: 9, generation: 0 };
        Bullet::new(t.template.bullet.clone(), 0, 2, owner, Vec2::ZERO, Vec2::ZERO, 0.0)
    }

    #[test]
    fn test_hit_damages_and_retaliates() {
        let mut t = tank();
        let b = bullet(&t);
        t.hit(&b);
        assert_eq!(t.health, 30);
        assert_eq!(t.target, Some(b.owner));
        assert!(!t.hit_inter.done());
        assert!(!t.dead());
    }

    #[test]
    fn test_regeneration_waits_then_pulses() {
        let mut t = tank();
        let b = bullet(&t);
        t.hit(&b);

        // Still inside the post-hit delay
        t.heal(9.0);
        assert_eq!(t.health, 30);

        // Delay elapses, switch to pulses
        t.heal(1.0);
        assert_eq!(t.health, 30);
        assert_eq!(t.healing.period, 1.0);

        t.heal(1.0);
        assert_eq!(t.health, 31);
        t.heal(1.0);
        assert_eq!(t.health, 32);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut t = tank();
        t.health = 49;
        t.healing = Timer::period(t.template.regeneration_tick);
        t.regenerating = true;
        t.heal(5.0);
        assert_eq!(t.health, 50);
        assert!(t.healthy());
    }

    #[test]
    fn test_should_retreat_integer_ratio() {
        let mut t = tank();
        t.health = 10; // 50 / 10 = 5, not above 5
        assert!(!t.should_retreat());
        t.health = 8; // 50 / 8 = 6
        assert!(t.should_retreat());
        t.health = 0;
        assert!(!t.should_retreat());
    }

    #[test]
    fn test_muzzle_sits_at_turret_tip() {
        let t = tank();
        // Offset (-7, 0) then 50 along +x
        assert!((t.muzzle() - Vec2::new(43.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_bar_progress() {
        let mut t = tank();
        assert_eq!(t.bar_progress(), 0.0);
        t.health = 25;
        assert!((t.bar_progress() - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_bullet_inherits_velocity() {
        let t = tank();
        let b = Bullet::new(
            t.template.bullet.clone(),
            0,
            1,
            Key { id: 0, generation: 0 },
            Vec2::ZERO,
            Vec2::new(0.0, 100.0),
            0.0,
        );
        assert!((b.vel - Vec2::new(500.0, 100.0)).length() < 1e-3);
    }
}
