//! Gameplay messages.
//!
//! The simulation only writes these; the presentation and scoring layers
//! mirror the board from them and never reach into the grid mid-frame.

use bevy::prelude::*;

use crate::game::cell::{BubbleColor, Cell};
use crate::game::coords::GridCoord;
use crate::game::shooter::ShotKind;

/// Launch the loaded shot in `direction`.
#[derive(Message, Debug, Clone, Copy)]
pub struct FireProjectile {
    pub direction: Vec2,
    pub shot: ShotKind,
}

/// Swap the loaded shot for the selected character's ability shot.
#[derive(Message, Debug, Clone, Copy)]
pub struct ActivateAbility;

/// Tear down the current board and populate it for `level`.
#[derive(Message, Debug, Clone, Copy)]
pub struct LoadLevel {
    pub level: u32,
}

/// A projectile came to rest against the board or the ceiling.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubbleSettled {
    pub coord: GridCoord,
    pub shot: ShotKind,
    pub impact: Vec2,
    /// The projectile hit a slime cell and cures it in place instead of
    /// occupying a slot of its own.
    pub cured_slime: bool,
}

/// An ice lance left the field after carving its path.
#[derive(Message, Debug, Clone, Copy)]
pub struct LanceFinished {
    pub destroyed: usize,
}

/// A cell gained contents.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubblePlaced {
    pub coord: GridCoord,
    pub cell: Cell,
}

/// A cell lost its contents, with what it held.
#[derive(Message, Debug, Clone, Copy)]
pub struct BubbleDestroyed {
    pub coord: GridCoord,
    pub cell: Cell,
    /// The cell fell off the board rather than being destroyed in place.
    pub fell: bool,
}

/// A cell changed contents in place (slime spread, chameleon drift, cure).
#[derive(Message, Debug, Clone, Copy)]
pub struct CellTransformed {
    pub coord: GridCoord,
    pub cell: Cell,
}

/// A flood-fill group popped.
#[derive(Message, Debug, Clone)]
pub struct MatchPopped {
    pub coords: Vec<GridCoord>,
    pub color: BubbleColor,
}

/// Unsupported cells dropped after a removal.
#[derive(Message, Debug, Clone)]
pub struct FloatingRemoved {
    pub coords: Vec<GridCoord>,
}

/// An ability (blast, lance, color wipe) destroyed this many cells.
#[derive(Message, Debug, Clone, Copy)]
pub struct AbilityDestroyed {
    pub count: usize,
}

/// A shot finished resolving; `turns` is the running count this level.
#[derive(Message, Debug, Clone, Copy)]
pub struct TurnElapsed {
    pub turns: u32,
}

/// The ceiling descended to `offset` rows below its start.
#[derive(Message, Debug, Clone, Copy)]
pub struct CeilingLowered {
    pub offset: usize,
}

/// The board was cleared; `bonus` is the level completion award.
#[derive(Message, Debug, Clone, Copy)]
pub struct LevelCompleted {
    pub bonus: u32,
}

/// The run ended. Menus react; the simulation is already stopped.
#[derive(Message, Debug, Clone, Copy)]
pub struct GameOver {
    pub score: u32,
    pub level: u32,
}
