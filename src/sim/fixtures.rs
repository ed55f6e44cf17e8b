//! Hand-built templates for simulation tests

use std::rc::Rc;

use glam::Vec2;

use crate::catalog::{BulletTemplate, Catalog, MapTemplate, SpriteId, TankTemplate};

pub fn bullet_template() -> BulletTemplate {
    BulletTemplate {
        speed: 500.0,
        size: 5.0,
        live_time: 1.0,
        damage: 20,
        sprite: SpriteId::new("shell"),
    }
}

pub fn tank(name: &str) -> TankTemplate {
    TankTemplate {
        name: name.into(),
        bullet: Rc::new(bullet_template()),
        speed: 2000.0,
        transmission: 0.5,
        steer: 3.0,
        base_sprite: SpriteId(format!("{name}2")),
        size: 20.0,
        max_health: 50,
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
        turret_sprite: SpriteId(format!("{name}1")),
        turret_pivot: Vec2::new(-7.0, 0.0),
        turret_offset: Vec2::new(-7.0, 0.0),
        memory: 0.5,
    }
}

pub fn tank_template(name: &str) -> Rc<TankTemplate> {
    Rc::new(tank(name))
}

/// Quiet map: spawns effectively never fire on their own
pub fn map() -> MapTemplate {
    MapTemplate {
        name: "test".into(),
        size: Vec2::new(3000.0, 3000.0),
        tile_size: Vec2::new(300.0, 300.0),
        spawn_rate: 1.0e6,
        seed: Some(7),
        spawns: vec!["light".into()],
        player: Some("light".into()),
        ..MapTemplate::default()
    }
}

/// `light` levels into `heavy`, `heavy` is the last tier
pub fn catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.insert_tank(TankTemplate {
        next: Some("heavy".into()),
        needed_score: 1,
        ..tank("light")
    });
    catalog.insert_tank(TankTemplate {
        max_health: 100,
        ..tank("heavy")
    });
    catalog.insert_map(map());
    catalog
}
