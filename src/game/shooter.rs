//! The shooter: aiming, firing, reloading, and character abilities.

use bevy::prelude::*;
use bevy::input::common_conditions::input_just_pressed;

use crate::game::cell::BubbleColor;
use crate::game::coords::SHOOTER_POS;
use crate::game::grid::BubbleGrid;
use crate::game::messages::{ActivateAbility, FireProjectile};
use crate::game::projectile::Projectile;
use crate::game::queue::NextQueue;
use crate::game::session::GameSession;

/// Radians per second of keyboard aim rotation.
const AIM_SPEED: f32 = 2.5;
/// Keep shots at least this far off the horizontal.
const MAX_AIM_ANGLE: f32 = 1.4;

/// What leaves the shooter when the player fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotKind {
    Plain(BubbleColor),
    /// Settles as the majority neighbor color; hardens to a prism when it
    /// finds nothing to pop.
    Wild,
    /// Wipes every bubble of the color it lands against.
    ColorBlast,
    /// Settles, then detonates.
    Bomb,
    /// Pierces the board, carving out everything soft in its path.
    IceLance,
    /// Recolors every bubble of the color it lands against.
    MassTransform(BubbleColor),
}

impl ShotKind {
    pub fn display_color(self) -> Color {
        match self {
            ShotKind::Plain(color) => color.to_color(),
            ShotKind::Wild => Color::srgb(0.95, 0.95, 0.95),
            ShotKind::ColorBlast => Color::srgb(1.0, 0.5, 0.75),
            ShotKind::Bomb => Color::srgb(0.15, 0.15, 0.2),
            ShotKind::IceLance => Color::srgb(0.6, 0.9, 1.0),
            ShotKind::MassTransform(_) => Color::srgb(0.6, 0.3, 0.8),
        }
    }
}

/// The playable cast; each brings one ability shot per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Character {
    #[default]
    Pinky,
    Bluey,
    Whitey,
    Goldie,
    WitchKitty,
}

impl Character {
    pub fn name(self) -> &'static str {
        match self {
            Character::Pinky => "Pinky",
            Character::Bluey => "Bluey",
            Character::Whitey => "Whitey",
            Character::Goldie => "Goldie",
            Character::WitchKitty => "Witch Kitty",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Character::Pinky => Character::Bluey,
            Character::Bluey => Character::Whitey,
            Character::Whitey => Character::Goldie,
            Character::Goldie => Character::WitchKitty,
            Character::WitchKitty => Character::Pinky,
        }
    }

    /// The ability shot, parameterized on the currently loaded color where
    /// the ability needs one.
    pub fn ability_shot(self, loaded_color: BubbleColor) -> ShotKind {
        match self {
            Character::Pinky => ShotKind::ColorBlast,
            Character::Bluey => ShotKind::Bomb,
            Character::Whitey => ShotKind::IceLance,
            Character::Goldie => ShotKind::Wild,
            Character::WitchKitty => ShotKind::MassTransform(loaded_color),
        }
    }
}

/// Chosen on the title screen; persists across sessions.
#[derive(Resource, Debug, Default)]
pub struct SelectedCharacter(pub Character);

#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShooterState {
    #[default]
    Ready,
    Reloading,
}

/// Unit vector the next shot travels along.
#[derive(Resource, Debug)]
pub struct AimDirection(pub Vec2);

impl Default for AimDirection {
    fn default() -> Self {
        Self(Vec2::Y)
    }
}

#[derive(Resource, Debug)]
pub struct LoadedShot(pub ShotKind);

impl Default for LoadedShot {
    fn default() -> Self {
        Self(ShotKind::Plain(BubbleColor::random()))
    }
}

pub(super) fn plugin(app: &mut App) {
    use crate::AppSystems;
    use crate::game::GameSet;

    app.init_resource::<SelectedCharacter>();
    app.init_resource::<ShooterState>();
    app.init_resource::<AimDirection>();
    app.init_resource::<LoadedShot>();

    app.add_systems(
        Update,
        (
            aim_with_keys,
            aim_with_mouse,
            fire.run_if(
                input_just_pressed(KeyCode::Space).or(input_just_pressed(MouseButton::Left)),
            ),
            request_ability.run_if(input_just_pressed(KeyCode::KeyE)),
        )
            .in_set(AppSystems::RecordInput)
            .in_set(crate::PausableSystems)
            .run_if(in_state(crate::screens::Screen::Gameplay)),
    );
    app.add_systems(Update, (apply_ability, reload).in_set(GameSet::Input));
}

fn aim_with_keys(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mut aim: ResMut<AimDirection>,
) {
    let mut turn = 0.0;
    if keyboard.pressed(KeyCode::ArrowLeft) {
        turn += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        turn -= 1.0;
    }
    if turn == 0.0 {
        return;
    }
    let angle = aim.0.y.atan2(aim.0.x) + turn * AIM_SPEED * time.delta_secs();
    let angle = angle.clamp(
        std::f32::consts::FRAC_PI_2 - MAX_AIM_ANGLE,
        std::f32::consts::FRAC_PI_2 + MAX_AIM_ANGLE,
    );
    aim.0 = Vec2::new(angle.cos(), angle.sin());
}

fn aim_with_mouse(
    windows: Query<&Window>,
    camera: Query<(&Camera, &GlobalTransform)>,
    mut aim: ResMut<AimDirection>,
) {
    let Ok(window) = windows.single() else { return };
    let Some(cursor) = window.cursor_position() else { return };
    let Ok((camera, camera_transform)) = camera.single() else { return };
    let Ok(world) = camera.viewport_to_world_2d(camera_transform, cursor) else { return };
    let direction = world - SHOOTER_POS;
    if direction.y > 10.0 {
        aim.0 = direction.normalize();
    }
}

fn fire(
    mut session: ResMut<GameSession>,
    mut state: ResMut<ShooterState>,
    aim: Res<AimDirection>,
    loaded: Res<LoadedShot>,
    mut fire: MessageWriter<FireProjectile>,
) {
    if !session.board_ready || *state != ShooterState::Ready {
        return;
    }
    *state = ShooterState::Reloading;
    session.register_shot();
    fire.write(FireProjectile { direction: aim.0, shot: loaded.0 });
}

fn request_ability(mut ability: MessageWriter<ActivateAbility>) {
    ability.write(ActivateAbility);
}

/// Swap the loaded plain shot for the character's ability shot, once per
/// level.
fn apply_ability(
    mut requests: MessageReader<ActivateAbility>,
    mut session: ResMut<GameSession>,
    character: Res<SelectedCharacter>,
    state: Res<ShooterState>,
    mut loaded: ResMut<LoadedShot>,
) {
    if requests.is_empty() {
        return;
    }
    requests.clear();
    let ShotKind::Plain(color) = loaded.0 else {
        return;
    };
    if session.ability_used || *state != ShooterState::Ready {
        return;
    }
    session.ability_used = true;
    loaded.0 = character.0.ability_shot(color);
    info!("{} readies their ability", character.0.name());
}

/// Load the next queued color once the previous shot has left the field.
fn reload(
    mut state: ResMut<ShooterState>,
    mut just_fired: MessageReader<FireProjectile>,
    projectiles: Query<(), With<Projectile>>,
    grid: Res<BubbleGrid>,
    mut queue: ResMut<NextQueue>,
    mut loaded: ResMut<LoadedShot>,
) {
    // The projectile entity spawns a set later than this runs, so the
    // frame's own fire message has to hold the reload off.
    if just_fired.read().count() > 0 {
        return;
    }
    if *state != ShooterState::Reloading || !projectiles.is_empty() {
        return;
    }
    *state = ShooterState::Ready;
    loaded.0 = ShotKind::Plain(queue.advance(&grid.colors_on_board()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_cycle_covers_the_whole_cast() {
        let mut character = Character::Pinky;
        let mut seen = vec![character];
        for _ in 0..4 {
            character = character.next();
            assert!(!seen.contains(&character));
            seen.push(character);
        }
        assert_eq!(character.next(), Character::Pinky);
    }

    #[test]
    fn witch_kitty_keeps_the_loaded_color() {
        let shot = Character::WitchKitty.ability_shot(BubbleColor::Yellow);
        assert_eq!(shot, ShotKind::MassTransform(BubbleColor::Yellow));
        let shot = Character::Whitey.ability_shot(BubbleColor::Yellow);
        assert_eq!(shot, ShotKind::IceLance);
    }
}
