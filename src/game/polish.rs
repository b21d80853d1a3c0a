//! Visual and audio feedback: falling bubbles, pop flashes, score popups.

use bevy::prelude::*;
use rand::Rng;

use crate::audio::sound_effect;
use crate::game::coords::{BUBBLE_SIZE, WINDOW_HEIGHT};
use crate::game::messages::{BubbleDestroyed, LevelCompleted, MatchPopped};
use crate::game::session::Ceiling;
use crate::game::view::BubbleAssets;
use crate::theme::GameFont;

const GRAVITY: f32 = 2200.0;
const POP_LIFETIME: f32 = 0.25;
const POPUP_LIFETIME: f32 = 0.8;

/// A dislodged bubble tumbling off the board.
#[derive(Component)]
pub(crate) struct FallingBubble {
    velocity: Vec2,
}

/// An expanding flash where a bubble popped.
#[derive(Component)]
pub(crate) struct PopEffect {
    age: f32,
}

/// Rising score text.
#[derive(Component)]
pub(crate) struct ScorePopup {
    age: f32,
}

pub(super) fn spawn_destruction_effects(
    mut commands: Commands,
    mut destroyed: MessageReader<BubbleDestroyed>,
    assets: Res<BubbleAssets>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    ceiling: Res<Ceiling>,
    asset_server: Res<AssetServer>,
) {
    let mut rng = rand::rng();
    let mut any_popped = false;
    for message in destroyed.read() {
        let pos = message.coord.world_center(ceiling.offset);
        let (color, _) = crate::game::view::cell_visual(message.cell);
        if message.fell {
            commands.spawn((
                Name::new("Falling Bubble"),
                FallingBubble {
                    velocity: Vec2::new(rng.random_range(-120.0..120.0), rng.random_range(50.0..200.0)),
                },
                Mesh2d(assets.mesh.clone()),
                MeshMaterial2d(materials.add(color)),
                Transform::from_translation(pos.extend(2.0)),
                DespawnOnExit(crate::screens::Screen::Gameplay),
            ));
        } else {
            any_popped = true;
            commands.spawn((
                Name::new("Pop Effect"),
                PopEffect { age: 0.0 },
                Mesh2d(assets.mesh.clone()),
                MeshMaterial2d(materials.add(color.with_alpha(0.6))),
                Transform::from_translation(pos.extend(2.0)),
                DespawnOnExit(crate::screens::Screen::Gameplay),
            ));
        }
    }
    if any_popped {
        commands.spawn(sound_effect(asset_server.load("audio/sound_effects/pop.ogg")));
    }
}

pub(super) fn spawn_score_popups(
    mut commands: Commands,
    mut popped: MessageReader<MatchPopped>,
    mut completed: MessageReader<LevelCompleted>,
    ceiling: Res<Ceiling>,
    font: Res<GameFont>,
    asset_server: Res<AssetServer>,
) {
    for message in popped.read() {
        let centroid = message
            .coords
            .iter()
            .map(|c| c.world_center(ceiling.offset))
            .sum::<Vec2>()
            / message.coords.len().max(1) as f32;
        spawn_popup(&mut commands, &font, centroid, format!("+{}", message.coords.len() * 10));
    }
    for message in completed.read() {
        commands.spawn(sound_effect(
            asset_server.load("audio/sound_effects/level_complete.ogg"),
        ));
        spawn_popup(
            &mut commands,
            &font,
            Vec2::ZERO,
            format!("Level clear! +{}", message.bonus),
        );
    }
}

fn spawn_popup(commands: &mut Commands, font: &GameFont, pos: Vec2, text: String) {
    commands.spawn((
        Name::new("Score Popup"),
        ScorePopup { age: 0.0 },
        Text2d::new(text),
        TextFont {
            font: font.0.clone(),
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_translation(pos.extend(10.0)),
        DespawnOnExit(crate::screens::Screen::Gameplay),
    ));
}

pub(super) fn animate_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut falling: Query<(Entity, &mut FallingBubble, &mut Transform)>,
    mut pops: Query<
        (Entity, &mut PopEffect, &mut Transform, &MeshMaterial2d<ColorMaterial>),
        Without<FallingBubble>,
    >,
    mut popups: Query<
        (Entity, &mut ScorePopup, &mut Transform, &mut TextColor),
        (Without<FallingBubble>, Without<PopEffect>),
    >,
) {
    let dt = time.delta_secs();

    for (entity, mut bubble, mut transform) in &mut falling {
        bubble.velocity.y -= GRAVITY * dt;
        transform.translation.x += bubble.velocity.x * dt;
        transform.translation.y += bubble.velocity.y * dt;
        transform.rotate_z(3.0 * dt);
        if transform.translation.y < -(WINDOW_HEIGHT / 2.0) - BUBBLE_SIZE {
            commands.entity(entity).despawn();
        }
    }

    for (entity, mut pop, mut transform, material) in &mut pops {
        pop.age += dt;
        let t = (pop.age / POP_LIFETIME).min(1.0);
        transform.scale = Vec3::splat(1.0 + t * 0.6);
        if let Some(material) = materials.get_mut(&material.0) {
            material.color = material.color.with_alpha(0.6 * (1.0 - t));
        }
        if pop.age >= POP_LIFETIME {
            commands.entity(entity).despawn();
        }
    }

    for (entity, mut popup, mut transform, mut color) in &mut popups {
        popup.age += dt;
        let t = (popup.age / POPUP_LIFETIME).min(1.0);
        transform.translation.y += 60.0 * dt;
        color.0 = color.0.with_alpha(1.0 - t);
        if popup.age >= POPUP_LIFETIME {
            commands.entity(entity).despawn();
        }
    }
}
