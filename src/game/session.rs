//! Session state: score, level timer, ceiling descent, win and loss.
//!
//! Everything here is a plain resource scoped to one play session and
//! rebuilt on entering gameplay, never a global.

use bevy::prelude::*;

use crate::game::coords::{BUBBLE_SIZE, LIMIT_LINE_Y};
use crate::game::grid::BubbleGrid;
use crate::game::highscore::HighScores;
use crate::game::messages::{
    AbilityDestroyed, CeilingLowered, FloatingRemoved, GameOver, LevelCompleted, LoadLevel,
    MatchPopped, TurnElapsed,
};
use crate::game::profile::{PlayerProfile, PowerUpFlag};
use crate::game::projectile::Projectile;
use crate::game::tasks::PendingEffects;

pub const LEVEL_TIME: f32 = 120.0;
/// Grace period between touching the limit line and losing.
pub const LOSS_GRACE: f32 = 1.0;

const MATCH_POINTS: u32 = 10;
const FLOATING_POINTS: u32 = 5;
const ABILITY_POINTS: u32 = 10;
const LEVEL_BONUS_BASE: u32 = 2000;
const TIME_BONUS_MAX: i64 = 8000;
const TIME_BONUS_DECAY: i64 = 50;

#[derive(Resource, Debug)]
pub struct GameSession {
    pub score: u32,
    pub level: u32,
    /// Shots fired this level; paces the ceiling descent.
    pub shots: u32,
    /// Shots settled this level; paces the chameleon and slime ticks.
    pub turns: u32,
    pub time_left: f32,
    pub extra_life_spent: bool,
    /// One character ability per level.
    pub ability_used: bool,
    /// Seconds the level timer stays paused (timer power-up).
    pub timer_freeze: f32,
    /// The current board is populated and win checks may run.
    pub board_ready: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            shots: 0,
            turns: 0,
            time_left: LEVEL_TIME,
            extra_life_spent: false,
            ability_used: false,
            timer_freeze: 0.0,
            board_ready: false,
        }
    }
}

impl GameSession {
    /// Reset the per-level counters, keeping score and unlocks.
    pub fn start_level(&mut self, level: u32) {
        // A restart of the same level keeps the spare life spent.
        if level != self.level {
            self.extra_life_spent = false;
        }
        self.level = level;
        self.shots = 0;
        self.turns = 0;
        self.time_left = LEVEL_TIME;
        self.ability_used = false;
        self.timer_freeze = 0.0;
        self.board_ready = false;
    }

    pub fn register_shot(&mut self) -> u32 {
        self.shots += 1;
        self.shots
    }

    pub fn register_turn(&mut self) -> u32 {
        self.turns += 1;
        self.turns
    }

    /// Shots between ceiling drops; tightens one per level down to four.
    pub fn shots_per_drop(&self) -> u32 {
        (10 - (self.level as i64 - 1)).max(4) as u32
    }

    pub fn elapsed(&self) -> f32 {
        (LEVEL_TIME - self.time_left).max(0.0)
    }

    /// Clearing fast pays more; the time bonus drains to zero over the
    /// level timer.
    pub fn level_bonus(&self) -> u32 {
        let drained = (self.elapsed() as i64) * TIME_BONUS_DECAY;
        LEVEL_BONUS_BASE + (TIME_BONUS_MAX - drained).max(0) as u32
    }
}

/// Ceiling descent state. The whole field shifts down one row at a time;
/// a dislodged stop bubble freezes it for the rest of the level.
#[derive(Resource, Debug, Default)]
pub struct Ceiling {
    pub offset: usize,
    permanently_frozen: bool,
    freeze_timer: f32,
}

impl Ceiling {
    pub fn is_frozen(&self) -> bool {
        self.permanently_frozen || self.freeze_timer > 0.0
    }

    pub fn freeze_permanently(&mut self) {
        self.permanently_frozen = true;
    }

    pub fn freeze_for(&mut self, seconds: f32) {
        self.freeze_timer = self.freeze_timer.max(seconds);
    }

    pub fn drop_row(&mut self) -> usize {
        self.offset += 1;
        self.offset
    }

    pub fn tick(&mut self, delta: f32) {
        self.freeze_timer = (self.freeze_timer - delta).max(0.0);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Armed while bubbles sit at or below the limit line.
#[derive(Resource, Debug, Default)]
pub struct LossPending(pub Option<Timer>);

pub(super) fn tick_session(
    time: Res<Time>,
    mut session: ResMut<GameSession>,
    mut ceiling: ResMut<Ceiling>,
) {
    if !session.board_ready {
        return;
    }
    ceiling.tick(time.delta_secs());
    if session.timer_freeze > 0.0 {
        session.timer_freeze = (session.timer_freeze - time.delta_secs()).max(0.0);
    } else {
        session.time_left = (session.time_left - time.delta_secs()).max(0.0);
    }
}

pub(super) fn apply_scoring(
    mut session: ResMut<GameSession>,
    mut popped: MessageReader<MatchPopped>,
    mut floating: MessageReader<FloatingRemoved>,
    mut ability: MessageReader<AbilityDestroyed>,
) {
    for message in popped.read() {
        session.score += message.coords.len() as u32 * MATCH_POINTS;
    }
    for message in floating.read() {
        session.score += message.coords.len() as u32 * FLOATING_POINTS;
    }
    for message in ability.read() {
        session.score += message.count as u32 * ABILITY_POINTS;
    }
}

/// Lower the ceiling once the fired-shot count reaches the next drop,
/// evaluated when the shot finishes resolving.
pub(super) fn descend_ceiling(
    mut turns: MessageReader<TurnElapsed>,
    session: Res<GameSession>,
    mut ceiling: ResMut<Ceiling>,
    mut lowered: MessageWriter<CeilingLowered>,
) {
    for _ in turns.read() {
        if ceiling.is_frozen() {
            continue;
        }
        if session.shots > 0 && session.shots % session.shots_per_drop() == 0 {
            let offset = ceiling.drop_row();
            lowered.write(CeilingLowered { offset });
            debug!("ceiling descends to offset {offset}");
        }
    }
}

pub(super) fn check_win(
    grid: Res<BubbleGrid>,
    pending: Res<PendingEffects>,
    projectiles: Query<(), With<Projectile>>,
    mut session: ResMut<GameSession>,
    mut ceiling: ResMut<Ceiling>,
    mut completed: MessageWriter<LevelCompleted>,
    mut load: MessageWriter<LoadLevel>,
) {
    if !session.board_ready
        || !grid.is_empty()
        || !pending.is_empty()
        || !projectiles.is_empty()
    {
        return;
    }
    let bonus = session.level_bonus();
    session.score += bonus;
    session.board_ready = false;
    ceiling.reset();
    completed.write(LevelCompleted { bonus });
    info!(
        "level {} cleared, bonus {bonus}, score {}",
        session.level, session.score
    );
    load.write(LoadLevel { level: session.level + 1 });
}

/// Arm, cancel, and resolve the loss grace timer.
pub(super) fn check_loss(
    time: Res<Time>,
    grid: Res<BubbleGrid>,
    ceiling: Res<Ceiling>,
    mut session: ResMut<GameSession>,
    mut loss: ResMut<LossPending>,
    profile: Res<PlayerProfile>,
    mut high_scores: ResMut<HighScores>,
    mut load: MessageWriter<LoadLevel>,
    mut game_over: MessageWriter<GameOver>,
) {
    if !session.board_ready {
        return;
    }

    let lowest = grid
        .occupied_coords()
        .map(|c| c.world_center(ceiling.offset).y)
        .fold(f32::INFINITY, f32::min);
    let breached = lowest - BUBBLE_SIZE / 2.0 <= LIMIT_LINE_Y;
    let timed_out = session.time_left <= 0.0;

    if !breached && !timed_out {
        loss.0 = None;
        return;
    }

    let timer = loss
        .0
        .get_or_insert_with(|| Timer::from_seconds(LOSS_GRACE, TimerMode::Once));
    if !timer.tick(time.delta()).just_finished() {
        return;
    }
    loss.0 = None;

    if !session.extra_life_spent && profile.has(PowerUpFlag::ExtraLife) {
        // The spare life restarts the level with the score intact.
        session.extra_life_spent = true;
        session.board_ready = false;
        info!("extra life spent, restarting level {}", session.level);
        load.write(LoadLevel { level: session.level });
        return;
    }

    let (score, level) = (session.score, session.level);
    if high_scores.add_score(score, level) {
        high_scores.save();
    }
    session.board_ready = false;
    info!("game over at level {level} with score {score}");
    game_over.write(GameOver { score, level });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_cadence_tightens_with_level_and_floors_at_four() {
        let mut session = GameSession::default();
        assert_eq!(session.shots_per_drop(), 10);
        session.level = 3;
        assert_eq!(session.shots_per_drop(), 8);
        session.level = 7;
        assert_eq!(session.shots_per_drop(), 4);
        session.level = 30;
        assert_eq!(session.shots_per_drop(), 4);
    }

    #[test]
    fn level_bonus_drains_with_time() {
        let mut session = GameSession::default();
        assert_eq!(session.level_bonus(), 10_000);
        session.time_left = LEVEL_TIME - 60.0;
        assert_eq!(session.level_bonus(), 2000 + 5000);
        session.time_left = 0.0;
        assert_eq!(session.level_bonus(), 2000);
    }

    #[test]
    fn start_level_keeps_the_score() {
        let mut session = GameSession::default();
        session.score = 1234;
        session.shots = 5;
        session.turns = 9;
        session.start_level(2);
        assert_eq!(session.score, 1234);
        assert_eq!(session.shots, 0);
        assert_eq!(session.turns, 0);
        assert_eq!(session.level, 2);
        assert_eq!(session.time_left, LEVEL_TIME);
    }

    #[test]
    fn shot_and_settle_counters_advance_independently() {
        let mut session = GameSession::default();
        session.register_shot();
        session.register_shot();
        assert_eq!(session.shots, 2);
        assert_eq!(session.turns, 0);
        assert_eq!(session.register_turn(), 1);
        assert_eq!(session.shots, 2);
    }

    #[test]
    fn ceiling_freeze_expires_but_permanent_sticks() {
        let mut ceiling = Ceiling::default();
        ceiling.freeze_for(2.0);
        assert!(ceiling.is_frozen());
        ceiling.tick(2.5);
        assert!(!ceiling.is_frozen());
        ceiling.freeze_permanently();
        ceiling.tick(100.0);
        assert!(ceiling.is_frozen());
    }

    #[test]
    fn spare_life_stays_spent_across_a_restart_of_the_same_level() {
        let mut session = GameSession::default();
        session.level = 3;
        session.extra_life_spent = true;
        session.start_level(3);
        assert!(session.extra_life_spent);
        session.start_level(4);
        assert!(!session.extra_life_spent);
    }
}
