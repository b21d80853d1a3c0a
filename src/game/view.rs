//! Presentation: mirrors the board from gameplay messages.
//!
//! Nothing in here is read back by the simulation; the grid resource is
//! the single source of truth and this layer only follows its messages.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::game::cell::{Cell, SpecialKind};
use crate::game::coords::{
    BUBBLE_SIZE, FIELD_TOP, GridCoord, LIMIT_LINE_Y, ROW_HEIGHT, SHOOTER_POS, WINDOW_WIDTH,
};
use crate::game::messages::{BubbleDestroyed, BubblePlaced, CeilingLowered, CellTransformed};
use crate::game::queue::NextQueue;
use crate::game::session::{Ceiling, GameSession};
use crate::game::shooter::{AimDirection, LoadedShot, ShooterState};
use crate::theme::GameFont;

/// Maps grid cells to their bubble entities.
#[derive(Resource, Default)]
pub struct BoardView {
    entities: HashMap<GridCoord, Entity>,
}

/// Shared circle mesh for every bubble sprite.
#[derive(Resource)]
pub struct BubbleAssets {
    pub mesh: Handle<Mesh>,
}

impl FromWorld for BubbleAssets {
    fn from_world(world: &mut World) -> Self {
        let mesh = world
            .resource_mut::<Assets<Mesh>>()
            .add(Circle::new(BUBBLE_SIZE / 2.0 - 2.0));
        Self { mesh }
    }
}

#[derive(Component)]
pub struct GridBubble;

#[derive(Component)]
pub struct ShooterBubble;

/// Index into the upcoming-shot display, front first.
#[derive(Component)]
pub struct QueueSlot(pub usize);

#[derive(Component)]
pub struct HudScore;

#[derive(Component)]
pub struct HudLevel;

#[derive(Component)]
pub struct HudTimer;

/// Fill color and overlay glyph for a cell.
pub(super) fn cell_visual(cell: Cell) -> (Color, Option<&'static str>) {
    match cell {
        Cell::Empty => (Color::NONE, None),
        Cell::Color(color) => (color.to_color(), None),
        Cell::Special(kind) => match kind {
            SpecialKind::Stone => (Color::srgb(0.45, 0.45, 0.5), None),
            SpecialKind::Anchor => (Color::srgb(0.3, 0.3, 0.38), Some("A")),
            SpecialKind::Bomb => (Color::srgb(0.15, 0.15, 0.2), Some("B")),
            SpecialKind::Prism => (Color::srgb(0.95, 0.95, 0.95), Some("*")),
            SpecialKind::Slime => (Color::srgb(0.45, 0.75, 0.2), Some("~")),
            SpecialKind::Stop => (Color::srgb(0.7, 0.2, 0.2), Some("X")),
            SpecialKind::Chameleon(color) => (color.to_color(), Some("?")),
        },
    }
}

fn spawn_bubble(
    commands: &mut Commands,
    assets: &BubbleAssets,
    materials: &mut Assets<ColorMaterial>,
    font: &GameFont,
    coord: GridCoord,
    cell: Cell,
    ceiling_offset: usize,
) -> Entity {
    let (color, glyph) = cell_visual(cell);
    let mut entity = commands.spawn((
        Name::new("Bubble"),
        GridBubble,
        Mesh2d(assets.mesh.clone()),
        MeshMaterial2d(materials.add(color)),
        Transform::from_translation(coord.world_center(ceiling_offset).extend(1.0)),
        DespawnOnExit(crate::screens::Screen::Gameplay),
    ));
    if let Some(glyph) = glyph {
        entity.with_children(|parent| {
            parent.spawn((
                Text2d::new(glyph),
                TextFont {
                    font: font.0.clone(),
                    font_size: 36.0,
                    ..default()
                },
                TextColor(Color::srgba(0.0, 0.0, 0.0, 0.7)),
                Transform::from_translation(Vec3::Z),
            ));
        });
    }
    entity.id()
}

/// Spawn, despawn, and restyle bubble entities from board messages.
pub(super) fn apply_board_messages(
    mut commands: Commands,
    mut view: ResMut<BoardView>,
    assets: Res<BubbleAssets>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    font: Res<GameFont>,
    ceiling: Res<Ceiling>,
    mut placed: MessageReader<BubblePlaced>,
    mut destroyed: MessageReader<BubbleDestroyed>,
    mut transformed: MessageReader<CellTransformed>,
) {
    for message in destroyed.read() {
        if let Some(entity) = view.entities.remove(&message.coord) {
            commands.entity(entity).despawn();
        }
    }
    for message in placed.read() {
        if let Some(old) = view.entities.remove(&message.coord) {
            commands.entity(old).despawn();
        }
        let entity = spawn_bubble(
            &mut commands,
            &assets,
            &mut materials,
            &font,
            message.coord,
            message.cell,
            ceiling.offset,
        );
        view.entities.insert(message.coord, entity);
    }
    for message in transformed.read() {
        if let Some(old) = view.entities.remove(&message.coord) {
            commands.entity(old).despawn();
        }
        let entity = spawn_bubble(
            &mut commands,
            &assets,
            &mut materials,
            &font,
            message.coord,
            message.cell,
            ceiling.offset,
        );
        view.entities.insert(message.coord, entity);
    }
}

/// Shift every bubble down when the ceiling descends.
pub(super) fn apply_ceiling_shift(
    mut lowered: MessageReader<CeilingLowered>,
    view: Res<BoardView>,
    mut transforms: Query<&mut Transform, With<GridBubble>>,
) {
    let Some(message) = lowered.read().last() else {
        return;
    };
    for (coord, entity) in &view.entities {
        if let Ok(mut transform) = transforms.get_mut(*entity) {
            let target = coord.world_center(message.offset);
            transform.translation.x = target.x;
            transform.translation.y = target.y;
        }
    }
}

/// Keep the shooter bubble showing the loaded shot.
pub(super) fn update_shooter_bubble(
    loaded: Res<LoadedShot>,
    state: Res<ShooterState>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    query: Query<&MeshMaterial2d<ColorMaterial>, With<ShooterBubble>>,
) {
    if !loaded.is_changed() && !state.is_changed() {
        return;
    }
    let color = match *state {
        ShooterState::Ready => loaded.0.display_color(),
        ShooterState::Reloading => Color::srgba(0.3, 0.3, 0.3, 0.5),
    };
    for material in &query {
        if let Some(material) = materials.get_mut(&material.0) {
            material.color = color;
        }
    }
}

pub(super) fn update_queue_display(
    queue: Res<NextQueue>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    query: Query<(&QueueSlot, &MeshMaterial2d<ColorMaterial>)>,
) {
    if !queue.is_changed() {
        return;
    }
    let upcoming: Vec<_> = queue.peek().collect();
    for (slot, material) in &query {
        let color = match upcoming.get(slot.0) {
            Some(color) => color.to_color(),
            None => Color::srgba(0.2, 0.2, 0.2, 0.4),
        };
        if let Some(material) = materials.get_mut(&material.0) {
            material.color = color;
        }
    }
}

pub(super) fn update_hud(
    session: Res<GameSession>,
    mut score: Query<&mut Text2d, (With<HudScore>, Without<HudLevel>, Without<HudTimer>)>,
    mut level: Query<&mut Text2d, (With<HudLevel>, Without<HudScore>, Without<HudTimer>)>,
    mut timer: Query<&mut Text2d, (With<HudTimer>, Without<HudScore>, Without<HudLevel>)>,
) {
    if !session.is_changed() {
        return;
    }
    for mut text in &mut score {
        text.0 = format!("Score {}", session.score);
    }
    for mut text in &mut level {
        text.0 = format!("Level {}", session.level);
    }
    for mut text in &mut timer {
        text.0 = format!("{:03.0}", session.time_left.ceil());
    }
}

/// Aim guide with a single wall-bounce preview, plus the limit line and
/// the current ceiling edge.
pub(super) fn draw_guides(mut gizmos: Gizmos, aim: Res<AimDirection>, ceiling: Res<Ceiling>) {
    let half_width = WINDOW_WIDTH / 2.0;
    let guide = Color::srgba(1.0, 1.0, 1.0, 0.35);
    let mut pos = SHOOTER_POS;
    let mut dir = aim.0;
    for _ in 0..2 {
        let t_wall = if dir.x > 0.0 {
            (half_width - pos.x) / dir.x
        } else if dir.x < 0.0 {
            (-half_width - pos.x) / dir.x
        } else {
            f32::INFINITY
        };
        let ceiling_y = FIELD_TOP - ceiling.offset as f32 * ROW_HEIGHT;
        let t_top = if dir.y > 0.0 { (ceiling_y - pos.y) / dir.y } else { f32::INFINITY };
        let t = t_wall.min(t_top).min(1200.0);
        let end = pos + dir * t;
        gizmos.line_2d(pos, end, guide);
        if t_top <= t_wall {
            break;
        }
        pos = end;
        dir.x = -dir.x;
    }

    gizmos.line_2d(
        Vec2::new(-half_width, LIMIT_LINE_Y),
        Vec2::new(half_width, LIMIT_LINE_Y),
        Color::srgba(0.9, 0.2, 0.2, 0.6),
    );
    let ceiling_y = FIELD_TOP - ceiling.offset as f32 * ROW_HEIGHT;
    gizmos.line_2d(
        Vec2::new(-half_width, ceiling_y),
        Vec2::new(half_width, ceiling_y),
        Color::srgba(0.8, 0.8, 1.0, 0.5),
    );
}
