//! Per-frame simulation step
//!
//! Advances the world by one variable-length frame: player input, tanks,
//! bullets, the dead-tank sweep, then enemy spawning.

use glam::Vec2;

use super::collision::{Aabb, Circle};
use super::state::{Controls, GamePhase};
use super::world::World;
use crate::consts::MAX_DELTA;
use crate::{polar, turn_toward};

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Pressed state for the player's tank
    pub controls: Controls,
    /// Cursor in screen space, relative to the viewport center
    pub cursor: Vec2,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Scroll wheel movement this frame
    pub scroll: f32,
    /// Pause toggle
    pub pause: bool,
    /// Let the AI drive the player's tank
    pub autopilot: bool,
}

impl World {
    /// Advance the world by `delta` seconds
    pub fn update(&mut self, input: &FrameInput, delta: f32) {
        if input.pause {
            match self.phase {
                GamePhase::Playing => {
                    self.pause();
                    return;
                }
                GamePhase::Paused => self.resume(),
                _ => {}
            }
        }
        if self.phase != GamePhase::Playing {
            return;
        }

        self.delta = delta.clamp(0.0, MAX_DELTA);
        self.autopilot = input.autopilot;

        self.update_player(input);
        self.frame = self.camera.frame(input.viewport);

        let mut ids = std::mem::take(&mut self.ids);
        ids.clear();
        ids.extend_from_slice(self.tanks.occupied());
        for &id in &ids {
            if !self.tanks.used(id) {
                continue;
            }
            self.update_tank(id);
            if self.tanks.item(id).dead() {
                self.remove_tank(id);
                continue;
            }
            self.control_tank(id);
        }

        ids.clear();
        ids.extend_from_slice(self.bullets.occupied());
        for &id in &ids {
            if self.update_bullet(id) {
                self.bullets.remove(id);
            }
        }

        // Tanks replaced by a level-up this frame
        ids.clear();
        ids.extend(self.tanks.iter().filter(|(_, t)| t.dead()).map(|(id, _)| id));
        for &id in &ids {
            self.remove_tank(id);
        }
        self.ids = ids;

        self.spawn();
    }

    /// Camera, controls and aim for the player's tank
    fn update_player(&mut self, input: &FrameInput) {
        self.camera.scroll(input.scroll);
        let Some(id) = self.player else {
            return;
        };

        let t = self.tanks.item_mut(id);
        self.camera.follow(t.pos);
        if !self.autopilot {
            t.input = input.controls;
            t.aim = self.camera.unproject(input.cursor);
        }
    }

    /// Feedback, reload, motion, regeneration and the grid address
    fn update_tank(&mut self, id: usize) {
        let delta = self.delta;
        let friction = (self.map.friction * delta).clamp(0.0, 1.0);
        let hover = self.player_tank().map(|p| p.aim);

        let t = self.tanks.item_mut(id);
        if hover.is_some_and(|aim| Aabb::square(t.pos, t.template.size).contains(aim)) {
            t.bar_inter.reset();
        }
        t.update_tint(delta);
        t.reloader.tick(delta);

        t.pos += t.vel * delta;
        t.vel -= t.vel * friction;

        t.heal(delta);
        self.grid.update(&mut t.address, t.pos, id, t.group);
    }

    /// Turn back into the map, or steer, shoot and drive
    fn control_tank(&mut self, id: usize) {
        let delta = self.delta;
        let bounds = Aabb::from_size(self.map.size);
        let center = self.map.size * 0.5;
        let driven = !self.autopilot && self.player == Some(id);

        let t = self.tanks.item_mut(id);
        let speed = t.template.speed * delta;

        if !bounds.contains(t.pos) {
            t.vel += polar(t.base_rot, speed);
            t.base_rot = turn_toward(t.base_rot, (center - t.pos).to_angle(), t.template.steer * delta);
            return;
        }

        let facing = (t.aim - t.pos).to_angle();
        let turret = turn_toward(t.turret_angle(), facing, t.template.turret_speed * delta);
        t.turret_rot = crate::normalize_angle(turret - t.base_rot);

        let fire = t.input.fire && t.reloader.done();
        if fire {
            t.reloader.reset();
        }

        if t.input.forward {
            t.vel += polar(t.base_rot, speed);
        } else if t.input.back {
            t.vel -= polar(t.base_rot, speed * t.template.transmission);
        }

        if driven {
            let steer = t.template.steer * delta;
            if t.input.left {
                t.base_rot = crate::normalize_angle(t.base_rot + steer);
            } else if t.input.right {
                t.base_rot = crate::normalize_angle(t.base_rot - steer);
            }
        }

        if fire {
            self.create_bullet(id);
        }
        if !driven {
            self.update_ai(id);
        }
    }

    /// Move a bullet or resolve its hit; true once it should be removed
    fn update_bullet(&mut self, id: usize) -> bool {
        let b = self.bullets.item(id);
        let shell = Circle::new(b.pos, b.template.size);

        let mut buff = std::mem::take(&mut self.buff);
        buff.clear();
        self.grid.query(
            Aabb::square(b.pos, b.template.size + self.reach),
            &mut buff,
            b.group,
            false,
        );
        let hit = buff.iter().copied().find(|&tid| {
            let t = self.tanks.item(tid);
            !t.dead() && Circle::new(t.pos, t.template.size).intersects(&shell)
        });
        self.buff = buff;

        let Some(tid) = hit else {
            let delta = self.delta;
            let b = self.bullets.item_mut(id);
            b.pos += b.vel * delta;
            b.live.tick(delta);
            return b.live.done();
        };

        let b = self.bullets.item(id);
        let owner = b.owner;
        self.tanks.item_mut(tid).hit(b);

        if self.tanks.item(tid).dead() {
            // The shell keeps flying after a kill
            self.on_death(owner, tid);
            self.remove_tank(tid);
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::PLAYER_GROUP;
    use crate::settings::Settings;
    use crate::sim::fixtures;
    use crate::sim::state::GameEvent;

    const DT: f32 = 1.0 / 60.0;

    fn world() -> World {
        let mut w = World::new(fixtures::catalog(), &Settings::default(), 3);
        assert!(w.load_map_named("test"));
        w.drain_events().for_each(drop);
        w
    }

    fn idle() -> FrameInput {
        FrameInput {
            viewport: Vec2::new(800.0, 600.0),
            ..Default::default()
        }
    }

    /// Park the player somewhere safe and out of the way
    fn park_player(w: &mut World, pos: Vec2) -> usize {
        let p = w.player.unwrap();
        let t = w.tanks.item_mut(p);
        t.pos = pos;
        t.aim = pos;
        w.grid.update(&mut t.address, pos, p, PLAYER_GROUP);
        p
    }

    fn shell(w: &mut World, shooter: usize) -> usize {
        w.create_bullet(shooter)
    }

    #[test]
    fn test_paused_world_stands_still() {
        let mut w = world();
        let p = park_player(&mut w, Vec2::new(100.0, 100.0));
        w.tanks.item_mut(p).vel = Vec2::new(50.0, 0.0);
        w.pause();
        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(p).pos, Vec2::new(100.0, 100.0));

        let toggle = FrameInput {
            pause: true,
            ..idle()
        };
        w.update(&toggle, DT);
        assert_eq!(w.phase, GamePhase::Playing);
        assert!(w.tanks.item(p).pos.x > 100.0);
    }

    #[test]
    fn test_delta_is_clamped() {
        let mut w = world();
        w.update(&idle(), 5.0);
        assert_eq!(w.delta, MAX_DELTA);
    }

    #[test]
    fn test_forward_input_moves_player() {
        let mut w = world();
        let p = park_player(&mut w, Vec2::new(1500.0, 1500.0));
        let input = FrameInput {
            controls: Controls {
                forward: true,
                ..Default::default()
            },
            ..idle()
        };
        for _ in 0..10 {
            w.update(&input, DT);
        }
        let t = w.tanks.item(p);
        assert!(t.pos.x > 1500.0);
        assert!(t.vel.x > 0.0);
        assert_eq!(w.grid.adr(t.pos), t.address);
    }

    #[test]
    fn test_out_of_bounds_tank_turns_home() {
        use std::f32::consts::FRAC_PI_2;

        let mut w = world();
        let p = park_player(&mut w, Vec2::new(-50.0, 1500.0));
        // Loaded and mashing every control; `left` alone would turn away
        // from the map
        let t = w.tanks.item_mut(p);
        t.base_rot = FRAC_PI_2;
        t.reloader.skip();
        let steer = t.template.steer;
        let speed = t.template.speed;
        let input = FrameInput {
            controls: Controls {
                forward: true,
                back: true,
                left: true,
                fire: true,
                ..Default::default()
            },
            ..idle()
        };
        w.update(&input, DT);

        assert_eq!(w.bullets.count(), 0);
        let t = w.tanks.item(p);
        // Center lies at angle 0: exactly one steer step toward it
        let expected = FRAC_PI_2 - steer * DT;
        assert!((t.base_rot - expected).abs() < 1e-5, "base_rot {}", t.base_rot);
        // Thrust along the heading held before the turn, ignoring `back`
        let thrust = polar(FRAC_PI_2, speed * DT);
        assert!((t.vel - thrust).length() < 1e-3, "vel {}", t.vel);
        assert!(t.reloader.done());
    }

    #[test]
    fn test_hit_damages_and_consumes_bullet() {
        let mut w = world();
        park_player(&mut w, Vec2::new(2800.0, 2800.0));
        let light = w.catalog.tank("light").unwrap().clone();
        let shooter = w.create_tank(false, 1, Vec2::new(500.0, 500.0), 0.0, 0.0, light.clone());
        let target = w.create_tank(false, 2, Vec2::new(600.0, 500.0), 0.0, 0.0, light);
        let b = shell(&mut w, shooter);
        // Drop the shell right on the target
        w.bullets.item_mut(b).pos = Vec2::new(600.0, 500.0);

        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(target).health, 30);
        assert!(!w.bullets.used(b));
        assert_eq!(w.tanks.item(target).target, Some(w.tanks.key(shooter)));
    }

    #[test]
    fn test_incoming_shell_hits_player_once() {
        let mut w = world();
        let p = w.player.unwrap();
        assert_eq!(w.tanks.item(p).pos, Vec2::ZERO);
        let light = w.catalog.tank("light").unwrap().clone();
        let shooter = w.create_tank(false, 1, Vec2::new(2000.0, 2000.0), 0.0, 0.0, light);
        let b = shell(&mut w, shooter);
        {
            let b = w.bullets.item_mut(b);
            b.pos = Vec2::new(-30.0, 0.0);
            b.vel = Vec2::new(600.0, 0.0);
        }

        // 30 apart, radii sum to 25: no contact yet
        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(p).health, 50);

        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(p).health, 30);
        assert!(!w.bullets.used(b));

        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(p).health, 30);
    }

    #[test]
    fn test_allies_are_not_hit() {
        let mut w = world();
        park_player(&mut w, Vec2::new(2800.0, 2800.0));
        let light = w.catalog.tank("light").unwrap().clone();
        let shooter = w.create_tank(false, 1, Vec2::new(500.0, 500.0), 0.0, 0.0, light.clone());
        let ally = w.create_tank(false, 1, Vec2::new(600.0, 500.0), 0.0, 0.0, light);
        let b = shell(&mut w, shooter);
        w.bullets.item_mut(b).pos = Vec2::new(600.0, 500.0);

        w.update(&idle(), DT);
        assert_eq!(w.tanks.item(ally).health, 50);
        assert!(w.bullets.used(b));
    }

    #[test]
    fn test_kill_removes_tank_from_grid() {
        let mut w = world();
        park_player(&mut w, Vec2::new(2800.0, 2800.0));
        let light = w.catalog.tank("heavy").unwrap().clone();
        let shooter = w.create_tank(false, 1, Vec2::new(500.0, 500.0), 0.0, 0.0, light.clone());
        let target = w.create_tank(false, 2, Vec2::new(600.0, 500.0), 0.0, 0.0, light);
        w.tanks.item_mut(target).health = 10;
        let b = shell(&mut w, shooter);
        w.bullets.item_mut(b).pos = Vec2::new(600.0, 500.0);

        let cells = w.grid.len();
        w.update(&idle(), DT);
        assert!(!w.tanks.used(target));
        assert_eq!(w.grid.len(), cells - 1);
        assert_eq!(w.tanks.item(shooter).score, 1);
        // Killing shells keep flying
        assert!(w.bullets.used(b));
        assert!(
            w.drain_events()
                .any(|e| matches!(e, GameEvent::Killed { victim, .. } if victim == target))
        );
    }

    #[test]
    fn test_kill_levels_up_enemy() {
        let mut w = world();
        park_player(&mut w, Vec2::new(2800.0, 2800.0));
        let light = w.catalog.tank("light").unwrap().clone();
        let shooter = w.create_tank(false, 1, Vec2::new(500.0, 500.0), 0.0, 0.0, light.clone());
        let target = w.create_tank(false, 2, Vec2::new(600.0, 500.0), 0.0, 0.0, light);
        w.tanks.item_mut(target).health = 10;
        let b = shell(&mut w, shooter);
        w.bullets.item_mut(b).pos = Vec2::new(600.0, 500.0);

        w.update(&idle(), DT);
        // The shooter was swapped for its next tier at the same spot
        assert!(!w.tanks.used(shooter) || w.tanks.item(shooter).template.name == "heavy");
        let heavy = w
            .tanks
            .iter()
            .filter(|(_, t)| t.template.name == "heavy")
            .count();
        assert_eq!(heavy, 1);
        assert_eq!(w.grid.len(), w.tanks.count());
    }

    #[test]
    fn test_bullet_expires() {
        let mut w = world();
        let p = park_player(&mut w, Vec2::new(1500.0, 1500.0));
        let b = shell(&mut w, p);
        for _ in 0..70 {
            w.update(&idle(), DT);
        }
        assert!(!w.bullets.used(b));
    }

    #[test]
    fn test_player_fire_respects_reload() {
        let mut w = world();
        park_player(&mut w, Vec2::new(1500.0, 1500.0));
        let input = FrameInput {
            controls: Controls {
                fire: true,
                ..Default::default()
            },
            ..idle()
        };
        // Reload is one second and starts empty
        for _ in 0..30 {
            w.update(&input, DT);
        }
        assert_eq!(w.bullets.count(), 0);
        for _ in 0..40 {
            w.update(&input, DT);
        }
        assert_eq!(w.bullets.count(), 1);
    }

    #[test]
    fn test_spawner_adds_enemies() {
        let mut w = world();
        w.spawning.period = 0.5;
        for _ in 0..8 {
            w.update(&idle(), MAX_DELTA);
        }
        assert!(w.tanks.count() >= 2);
        assert!(w.tanks.iter().all(|(_, t)| t.player || t.group >= 1));
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut w = world();
            w.spawning.period = 0.3;
            let input = FrameInput {
                autopilot: true,
                ..idle()
            };
            for _ in 0..600 {
                w.update(&input, DT);
            }
            w.tanks
                .iter()
                .map(|(id, t)| (id, t.pos, t.health))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
