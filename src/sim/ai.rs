//! Enemy tank AI
//!
//! Each AI tank latches onto the nearest hostile in bullet range, keeps a
//! comfortable distance, steers around allies and shoots where the target
//! will be.

use glam::Vec2;

use super::collision::Aabb;
use super::world::World;
use crate::{angle_to, turn_toward};

/// Intercept point for a bullet of `speed` fired from `shooter` at a target
/// moving with velocity `vel` relative to the shooter
///
/// Returns `None` when the bullet can never catch the target.
pub fn predict(shooter: Vec2, target: Vec2, vel: Vec2, speed: f32) -> Option<Vec2> {
    let d = target - shooter;
    let a = vel.length_squared() - speed * speed;
    let b = 2.0 * d.dot(vel);
    let c = d.length_squared();

    let t = if a.abs() < f32::EPSILON {
        if b.abs() < f32::EPSILON {
            return None;
        }
        -c / b
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let root = disc.sqrt();
        let t1 = (-b - root) / (2.0 * a);
        let t2 = (-b + root) / (2.0 * a);
        match (t1 >= 0.0, t2 >= 0.0) {
            (true, true) => t1.min(t2),
            (true, false) => t1,
            (false, true) => t2,
            (false, false) => return None,
        }
    };

    if t < 0.0 {
        return None;
    }
    Some(target + vel * t)
}

impl World {
    /// Targeting, movement and firing decisions for one AI-driven tank
    pub(super) fn update_ai(&mut self, id: usize) {
        let delta = self.delta;
        let t = self.tanks.item(id);
        let (pos, group, size) = (t.pos, t.group, t.template.size);
        let (range, range2) = (t.template.bullet.range(), t.template.bullet.range2());
        let (memory, distancing) = (t.template.memory, t.template.distancing);
        let (retreat, current) = (t.should_retreat(), t.target);

        let key = match current {
            Some(key) => key,
            None => {
                let mut buff = std::mem::take(&mut self.buff);
                buff.clear();
                self.grid
                    .query(Aabb::square(pos, range), &mut buff, group, false);
                let nearest = buff
                    .iter()
                    .map(|&o| (o, self.tanks.item(o)))
                    .filter(|(_, o)| !o.dead())
                    .map(|(o, other)| (o, pos.distance_squared(other.pos)))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                self.buff = buff;

                match nearest {
                    Some((o, dist2)) if dist2 <= range2 => {
                        let key = self.tanks.key(o);
                        self.tanks.item_mut(id).target = Some(key);
                        key
                    }
                    _ => return,
                }
            }
        };

        let Some(target) = self.tanks.resolve(key).filter(|o| !o.dead()) else {
            self.tanks.item_mut(id).detarget();
            return;
        };
        let (opos, ovel, osize) = (target.pos, target.vel, target.template.size);

        let mut dif = opos - pos;
        let dist = dif.length();
        if dif.length_squared() > range2 * (1.0 + memory) {
            self.tanks.item_mut(id).detarget();
            return;
        }

        if retreat || dist < range * distancing {
            dif = -dif;
        }

        // Slide sideways past the first crowding ally
        let personal = Aabb::square(pos, size * 2.0);
        let mut buff = std::mem::take(&mut self.buff);
        buff.clear();
        self.grid.query(personal, &mut buff, group, true);
        let crowding = buff.iter().copied().find(|&o| {
            let other = self.tanks.item(o);
            o != id && personal.intersects(&Aabb::square(other.pos, other.template.size * 2.0))
        });
        self.buff = buff;
        if let Some(o) = crowding {
            let away = pos - self.tanks.item(o).pos;
            dif += away.perp().normalize_or_zero() * dif.length();
        }

        let t = self.tanks.item_mut(id);
        let bullet_speed = t.template.bullet.speed;
        t.base_rot = turn_toward(t.base_rot, dif.to_angle(), t.template.steer * delta);
        t.input.forward = true;

        match predict(pos, opos, ovel - t.vel, bullet_speed) {
            Some(aim) => {
                t.aim = aim;
                let to_aim = aim - pos;
                let error = angle_to(to_aim.to_angle(), t.turret_angle()).abs();
                let tolerance = (osize / dist.max(f32::EPSILON)).atan();
                t.input.fire = to_aim.length_squared() <= range2 && error < tolerance;
            }
            None => {
                t.aim = opos;
                t.input.fire = false;
            }
        }
    }
}
