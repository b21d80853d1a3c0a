//! Persistent power-ups: milestone unlocks and their on-demand triggers.

use bevy::input::common_conditions::input_just_pressed;
use bevy::prelude::*;

use crate::game::messages::LoadLevel;
use crate::game::profile::{PlayerProfile, PowerUpFlag};
use crate::game::session::{Ceiling, GameSession};

/// How long the on-demand freezes last.
const FREEZE_SECONDS: f32 = 15.0;

/// Each on-demand power-up fires once per level.
#[derive(Resource, Debug, Default)]
pub struct PowerUpUses {
    pub ceiling_freeze_used: bool,
    pub timer_pause_used: bool,
}

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PowerUpUses>();
    app.add_systems(
        Update,
        (
            unlock_milestones,
            freeze_ceiling.run_if(input_just_pressed(KeyCode::KeyF)),
            pause_timer.run_if(input_just_pressed(KeyCode::KeyT)),
        )
            .in_set(crate::PausableSystems)
            .run_if(in_state(crate::screens::Screen::Gameplay)),
    );
}

/// Reaching a new level for the first time can unlock a power-up.
fn unlock_milestones(mut loads: MessageReader<LoadLevel>, mut profile: ResMut<PlayerProfile>, mut uses: ResMut<PowerUpUses>) {
    for load in loads.read() {
        *uses = PowerUpUses::default();
        let unlock = match load.level {
            2 => Some(PowerUpFlag::ExtraLife),
            4 => Some(PowerUpFlag::FreezeCeiling),
            6 => Some(PowerUpFlag::PauseTimer),
            _ => None,
        };
        if let Some(flag) = unlock
            && profile.unlock(flag)
        {
            info!("unlocked {flag:?}");
            profile.save();
        }
    }
}

fn freeze_ceiling(
    profile: Res<PlayerProfile>,
    mut uses: ResMut<PowerUpUses>,
    mut ceiling: ResMut<Ceiling>,
) {
    if !profile.has(PowerUpFlag::FreezeCeiling) || uses.ceiling_freeze_used {
        return;
    }
    uses.ceiling_freeze_used = true;
    ceiling.freeze_for(FREEZE_SECONDS);
    info!("ceiling frozen for {FREEZE_SECONDS}s");
}

fn pause_timer(
    profile: Res<PlayerProfile>,
    mut uses: ResMut<PowerUpUses>,
    mut session: ResMut<GameSession>,
) {
    if !profile.has(PowerUpFlag::PauseTimer) || uses.timer_pause_used || !session.board_ready {
        return;
    }
    uses.timer_pause_used = true;
    session.timer_freeze = FREEZE_SECONDS;
    info!("level timer paused for {FREEZE_SECONDS}s");
}
