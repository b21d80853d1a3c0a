//! The main game module for the bubble shooter.
//!
//! The grid, matching, and session logic are plain data and pure functions;
//! systems wire them together with messages. Presentation only ever follows
//! those messages.

pub mod cell;
pub mod cluster;
pub mod coords;
mod debug;
pub mod grid;
pub mod highscore;
mod level;
pub mod messages;
mod polish;
pub mod profile;
mod powerups;
mod projectile;
pub mod queue;
pub mod session;
pub mod shooter;
mod specials;
mod tasks;
mod view;

use bevy::prelude::*;

use crate::audio::music;
use crate::game::coords::{FIELD_TOP, SHOOTER_POS, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::game::messages::*;
use crate::screens::Screen;
use crate::theme::GameFont;
use crate::{AppSystems, PausableSystems};

/// Ordered stages of one gameplay frame.
#[derive(SystemSet, Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum GameSet {
    /// Deferred effects and level loads queued on earlier frames.
    Deferred,
    /// Shooter state changes from this frame's input.
    Input,
    /// Projectile flight and contact.
    Projectile,
    /// Grid resolution of settled shots.
    Resolve,
    /// Scoring, descent, win and loss.
    Session,
    /// Mirror the board and effects.
    View,
}

pub(super) fn plugin(app: &mut App) {
    app.configure_sets(
        Update,
        (
            GameSet::Deferred,
            GameSet::Input,
            GameSet::Projectile,
            GameSet::Resolve,
            GameSet::Session,
            GameSet::View,
        )
            .chain()
            .in_set(AppSystems::Update)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    app.add_message::<FireProjectile>();
    app.add_message::<ActivateAbility>();
    app.add_message::<LoadLevel>();
    app.add_message::<BubbleSettled>();
    app.add_message::<LanceFinished>();
    app.add_message::<BubblePlaced>();
    app.add_message::<BubbleDestroyed>();
    app.add_message::<CellTransformed>();
    app.add_message::<MatchPopped>();
    app.add_message::<FloatingRemoved>();
    app.add_message::<AbilityDestroyed>();
    app.add_message::<TurnElapsed>();
    app.add_message::<CeilingLowered>();
    app.add_message::<LevelCompleted>();
    app.add_message::<GameOver>();

    app.init_resource::<grid::BubbleGrid>();
    app.init_resource::<queue::NextQueue>();
    app.init_resource::<session::GameSession>();
    app.init_resource::<session::Ceiling>();
    app.init_resource::<session::LossPending>();
    app.init_resource::<tasks::PendingEffects>();
    app.init_resource::<view::BoardView>();
    app.init_resource::<view::BubbleAssets>();

    app.add_plugins((
        shooter::plugin,
        highscore::plugin,
        profile::plugin,
        powerups::plugin,
        debug::plugin,
    ));

    app.add_systems(
        Update,
        session::tick_session
            .in_set(AppSystems::TickTimers)
            .in_set(PausableSystems)
            .run_if(in_state(Screen::Gameplay)),
    );

    app.add_systems(
        Update,
        (
            (level::load_level, specials::drain_deferred)
                .chain()
                .in_set(GameSet::Deferred),
            (projectile::spawn_projectiles, projectile::move_projectiles)
                .chain()
                .in_set(GameSet::Projectile),
            specials::resolve_settled.in_set(GameSet::Resolve),
            (
                session::apply_scoring,
                session::descend_ceiling,
                session::check_win,
                session::check_loss,
            )
                .chain()
                .in_set(GameSet::Session),
            (
                view::apply_board_messages,
                view::apply_ceiling_shift,
                view::update_shooter_bubble,
                view::update_queue_display,
                view::update_hud,
                view::draw_guides,
                polish::spawn_destruction_effects,
                polish::spawn_score_popups,
                polish::animate_effects,
            )
                .in_set(GameSet::View),
        ),
    );
}

/// Build a fresh session when entering gameplay.
/// Called from `screens/gameplay.rs` on `OnEnter(Screen::Gameplay)`.
pub fn spawn_game(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    assets: Res<view::BubbleAssets>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    font: Res<GameFont>,
    mut profile: ResMut<profile::PlayerProfile>,
    mut load: MessageWriter<LoadLevel>,
) {
    commands.insert_resource(grid::BubbleGrid::default());
    commands.insert_resource(queue::NextQueue::default());
    commands.insert_resource(session::GameSession::default());
    commands.insert_resource(session::Ceiling::default());
    commands.insert_resource(session::LossPending::default());
    commands.insert_resource(tasks::PendingEffects::default());
    commands.insert_resource(view::BoardView::default());
    commands.insert_resource(shooter::ShooterState::default());
    commands.insert_resource(shooter::AimDirection::default());
    commands.insert_resource(shooter::LoadedShot::default());

    commands.spawn((
        Name::new("Field Background"),
        Sprite::from_color(
            Color::srgb(0.07, 0.07, 0.11),
            Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT),
        ),
        Transform::from_xyz(0.0, 0.0, -2.0),
        DespawnOnExit(Screen::Gameplay),
    ));

    commands.spawn((
        Name::new("Shooter Bubble"),
        view::ShooterBubble,
        Mesh2d(assets.mesh.clone()),
        MeshMaterial2d(materials.add(Color::srgb(0.3, 0.3, 0.3))),
        Transform::from_translation(SHOOTER_POS.extend(4.0)),
        DespawnOnExit(Screen::Gameplay),
    ));

    for slot in 0..queue::QUEUE_LEN {
        commands.spawn((
            Name::new("Queue Slot"),
            view::QueueSlot(slot),
            Mesh2d(assets.mesh.clone()),
            MeshMaterial2d(materials.add(Color::srgba(0.2, 0.2, 0.2, 0.4))),
            Transform::from_translation(
                (SHOOTER_POS + Vec2::new(80.0 + slot as f32 * 55.0, 10.0)).extend(3.0),
            )
            .with_scale(Vec3::splat(0.55 - slot as f32 * 0.12)),
            DespawnOnExit(Screen::Gameplay),
        ));
    }

    let hud_font = |size: f32| TextFont {
        font: font.0.clone(),
        font_size: size,
        ..default()
    };
    let hud_y = FIELD_TOP + 24.0;
    commands.spawn((
        Name::new("Score Display"),
        view::HudScore,
        Text2d::new("Score 0"),
        hud_font(28.0),
        TextColor(Color::WHITE),
        Transform::from_xyz(-WINDOW_WIDTH / 2.0 + 110.0, hud_y, 10.0),
        DespawnOnExit(Screen::Gameplay),
    ));
    commands.spawn((
        Name::new("Level Display"),
        view::HudLevel,
        Text2d::new("Level 1"),
        hud_font(28.0),
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, hud_y, 10.0),
        DespawnOnExit(Screen::Gameplay),
    ));
    commands.spawn((
        Name::new("Timer Display"),
        view::HudTimer,
        Text2d::new("120"),
        hud_font(28.0),
        TextColor(Color::WHITE),
        Transform::from_xyz(WINDOW_WIDTH / 2.0 - 80.0, hud_y, 10.0),
        DespawnOnExit(Screen::Gameplay),
    ));

    if !profile.seen_tutorial {
        profile.seen_tutorial = true;
        profile.save();
        commands.spawn((
            Name::new("Tutorial Hint"),
            Text2d::new("Aim with the mouse or arrows, shoot with click or space.\nE fires your character ability."),
            hud_font(24.0),
            TextColor(Color::srgba(1.0, 1.0, 1.0, 0.8)),
            Transform::from_xyz(0.0, SHOOTER_POS.y + 160.0, 10.0),
            DespawnOnExit(Screen::Gameplay),
        ));
    }

    commands.spawn((
        Name::new("Gameplay Music"),
        music(asset_server.load("audio/music/gameplay.ogg")),
        DespawnOnExit(Screen::Gameplay),
    ));

    load.write(LoadLevel { level: 1 });
    info!("Game spawned - bubble shooter ready!");
}
