//! Outbound draw list
//!
//! The arena is described as a flat list of commands in world space, culled
//! against the camera frame. A renderer only needs the camera view, sprite
//! lookup by id and the three primitives below.

use glam::{Affine2, Vec2};

use crate::catalog::SpriteId;
use crate::color::Rgba;
use crate::consts::BAR_RADIUS_FACTOR;
use crate::settings::Settings;
use crate::sim::{Aabb, Tank, World};

/// Outline thickness of the health ring
const RING_THICKNESS: f32 = 3.0;
/// Opacity of the grid cell highlight under entities
const TILE_ALPHA: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Filled rectangle
    Rect { rect: Aabb, color: Rgba },
    /// Rectangle outline, for grid cells under entities
    Outline { rect: Aabb, color: Rgba },
    /// Sprite placed by `transform` around its `pivot`, multiplied by `tint`
    Sprite {
        sprite: SpriteId,
        transform: Affine2,
        pivot: Vec2,
        tint: Rgba,
    },
    /// Arc from `-sweep` to `sweep` radians
    Arc {
        center: Vec2,
        radius: f32,
        sweep: f32,
        thickness: f32,
        color: Rgba,
    },
}

/// Everything needed to paint one frame
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// World to screen transform
    pub view: Affine2,
    /// Color behind the map
    pub clear: Rgba,
    /// Health rings and other overlays
    pub ui_color: Rgba,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    /// Empty scene painted with the player's colors
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            clear: settings.background,
            ui_color: settings.ui_color,
            ..Default::default()
        }
    }

    /// Rebuild the draw list from the world, reusing the allocation
    pub fn build(&mut self, world: &World) {
        self.commands.clear();
        self.view = world.camera.view();

        let background = world.map.background;
        self.commands.push(DrawCommand::Rect {
            rect: Aabb::from_size(world.map.size),
            color: background,
        });

        let tile_color = background.inverted().with_alpha(TILE_ALPHA);
        let scale = world.map.scale;

        for (_, t) in world.tanks.iter() {
            if !world.frame.contains(t.pos) {
                continue;
            }
            self.tiles(world, t.pos, t.template.size, tile_color);
            self.tank(t, scale);
        }

        for (_, b) in world.bullets.iter() {
            if !world.frame.contains(b.pos) {
                continue;
            }
            self.tiles(world, b.pos, b.template.size, tile_color);
            self.commands.push(DrawCommand::Sprite {
                sprite: b.template.sprite.clone(),
                transform: Affine2::from_scale_angle_translation(scale, b.rot, b.pos),
                pivot: Vec2::ZERO,
                tint: Rgba::WHITE,
            });
        }
    }

    fn tank(&mut self, t: &Tank, scale: Vec2) {
        self.commands.push(DrawCommand::Sprite {
            sprite: t.template.base_sprite.clone(),
            transform: Affine2::from_scale_angle_translation(scale, t.base_rot, t.pos),
            pivot: Vec2::ZERO,
            tint: t.mask,
        });
        self.commands.push(DrawCommand::Sprite {
            sprite: t.template.turret_sprite.clone(),
            transform: Affine2::from_scale_angle_translation(
                scale,
                t.turret_angle(),
                t.turret_base(),
            ),
            pivot: t.template.turret_pivot,
            tint: t.mask,
        });

        if !t.bar_inter.done() {
            self.commands.push(DrawCommand::Arc {
                center: t.pos,
                radius: t.template.size * BAR_RADIUS_FACTOR,
                sweep: t.bar_progress(),
                thickness: RING_THICKNESS,
                color: self.ui_color.with_alpha(t.bar_inter.value()),
            });
        }
    }

    /// Outline the grid cells a square around `pos` touches
    fn tiles(&mut self, world: &World, pos: Vec2, size: f32, color: Rgba) {
        let area = Aabb::square(pos, size);
        let min = world.grid.adr(area.min);
        let max = world.grid.adr(area.max);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.commands.push(DrawCommand::Outline {
                    rect: world.grid.cell_rect(glam::UVec2::new(x, y)),
                    color,
                });
            }
        }
    }

    pub fn sprites(&self) -> impl Iterator<Item = &SpriteId> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Sprite { sprite, .. } => Some(sprite),
            _ => None,
        })
    }
}
