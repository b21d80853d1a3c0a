//! Projectile flight: wall bounces, board contact, and the piercing lance.

use bevy::prelude::*;

use crate::audio::sound_effect;
use crate::game::cell::Cell;
use crate::game::coords::{
    BUBBLE_SIZE, FIELD_TOP, GridCoord, ROW_HEIGHT, SHOOTER_POS, WINDOW_WIDTH,
};
use crate::game::grid::BubbleGrid;
use crate::game::messages::{BubbleDestroyed, BubbleSettled, FireProjectile, LanceFinished};
use crate::game::session::Ceiling;
use crate::game::shooter::ShotKind;

pub const PROJECTILE_SPEED: f32 = 900.0;
/// Center distance below which a projectile touches a resting bubble.
const COLLISION_RADIUS: f32 = BUBBLE_SIZE * 0.9;

#[derive(Component, Debug)]
pub struct Projectile {
    pub velocity: Vec2,
    pub shot: ShotKind,
    /// Cells destroyed so far (lance only).
    pub pierced: usize,
}

pub(super) fn spawn_projectiles(
    mut commands: Commands,
    mut fire: MessageReader<FireProjectile>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    asset_server: Res<AssetServer>,
) {
    for message in fire.read() {
        let direction = message.direction.normalize_or_zero();
        if direction.y <= 0.0 {
            continue;
        }
        commands.spawn(sound_effect(asset_server.load("audio/sound_effects/fire.ogg")));
        commands.spawn((
            Name::new("Projectile"),
            Projectile {
                velocity: direction * PROJECTILE_SPEED,
                shot: message.shot,
                pierced: 0,
            },
            Mesh2d(meshes.add(Circle::new(BUBBLE_SIZE / 2.0 - 2.0))),
            MeshMaterial2d(materials.add(message.shot.display_color())),
            Transform::from_translation(SHOOTER_POS.extend(5.0)),
            DespawnOnExit(crate::screens::Screen::Gameplay),
        ));
    }
}

/// One frame of lance travel at `pos`: which cells it carves out and
/// whether an immune cell stops it.
pub struct LanceStep {
    pub destroyed: Vec<(GridCoord, Cell)>,
    pub blocked: bool,
}

pub fn lance_step(grid: &mut BubbleGrid, pos: Vec2, ceiling_offset: usize) -> LanceStep {
    let mut step = LanceStep { destroyed: Vec::new(), blocked: false };
    let touching: Vec<GridCoord> = grid
        .occupied_coords()
        .filter(|coord| coord.world_center(ceiling_offset).distance(pos) < COLLISION_RADIUS)
        .collect();
    for coord in touching {
        let cell = grid.cell(coord);
        if cell.ability_immune() {
            step.blocked = true;
        } else {
            step.destroyed.push((coord, grid.take(coord)));
        }
    }
    step
}

pub(super) fn move_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut grid: ResMut<BubbleGrid>,
    ceiling: Res<Ceiling>,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
    mut settled: MessageWriter<BubbleSettled>,
    mut destroyed: MessageWriter<BubbleDestroyed>,
    mut lance_finished: MessageWriter<LanceFinished>,
) {
    let half_width = WINDOW_WIDTH / 2.0;
    let radius = BUBBLE_SIZE / 2.0;
    let ceiling_y = FIELD_TOP - ceiling.offset as f32 * ROW_HEIGHT;

    for (entity, mut transform, mut projectile) in &mut projectiles {
        let mut pos = transform.translation.truncate();
        pos += projectile.velocity * time.delta_secs();

        if projectile.shot == ShotKind::IceLance {
            let step = lance_step(&mut grid, pos, ceiling.offset);
            projectile.pierced += step.destroyed.len();
            for (coord, cell) in step.destroyed {
                destroyed.write(BubbleDestroyed { coord, cell, fell: false });
            }
            let hit_wall = pos.x.abs() > half_width - radius;
            if step.blocked || hit_wall || pos.y >= ceiling_y {
                lance_finished.write(LanceFinished { destroyed: projectile.pierced });
                commands.entity(entity).despawn();
                continue;
            }
            transform.translation = pos.extend(transform.translation.z);
            continue;
        }

        // Wall bounce.
        if pos.x < -half_width + radius {
            pos.x = -half_width + radius;
            projectile.velocity.x = projectile.velocity.x.abs();
        } else if pos.x > half_width - radius {
            pos.x = half_width - radius;
            projectile.velocity.x = -projectile.velocity.x.abs();
        }

        let contact = grid
            .occupied_coords()
            .map(|coord| (coord, coord.world_center(ceiling.offset).distance(pos)))
            .filter(|(_, dist)| *dist < COLLISION_RADIUS)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(coord, _)| coord);

        if let Some(contact) = contact {
            let cured_slime = grid.cell(contact).is_slime()
                && matches!(projectile.shot, ShotKind::Plain(_));
            let coord = if cured_slime {
                contact
            } else {
                grid.nearest_empty_slot(pos, contact, ceiling.offset)
            };
            settled.write(BubbleSettled {
                coord,
                shot: projectile.shot,
                impact: pos,
                cured_slime,
            });
            commands.entity(entity).despawn();
            continue;
        }

        if pos.y + radius >= ceiling_y {
            let coord = GridCoord::from_world(pos, ceiling.offset);
            let coord = if grid.cell(coord).is_occupied() {
                grid.nearest_empty_slot(pos, coord, ceiling.offset)
            } else {
                coord
            };
            settled.write(BubbleSettled {
                coord,
                shot: projectile.shot,
                impact: pos,
                cured_slime: false,
            });
            commands.entity(entity).despawn();
            continue;
        }

        transform.translation = pos.extend(transform.translation.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cell::{BubbleColor, SpecialKind};

    #[test]
    fn lance_carves_colors_and_stops_at_stone() {
        let mut grid = BubbleGrid::default();
        let soft = GridCoord::new(5, 3);
        let stone = GridCoord::new(2, 3);
        grid.set(soft, Cell::Color(BubbleColor::Red));
        grid.set(stone, Cell::Special(SpecialKind::Stone));

        let step = lance_step(&mut grid, soft.world_center(0), 0);
        assert_eq!(step.destroyed.len(), 1);
        assert!(!step.blocked);
        assert_eq!(grid.cell(soft), Cell::Empty);

        let step = lance_step(&mut grid, stone.world_center(0), 0);
        assert!(step.blocked);
        assert!(step.destroyed.is_empty());
        assert!(grid.cell(stone).is_stone());
    }

    #[test]
    fn lance_in_open_space_touches_nothing() {
        let mut grid = BubbleGrid::default();
        grid.set(GridCoord::new(0, 0), Cell::Color(BubbleColor::Blue));
        let step = lance_step(&mut grid, Vec2::new(0.0, -300.0), 0);
        assert!(step.destroyed.is_empty());
        assert!(!step.blocked);
    }
}
