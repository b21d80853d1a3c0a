//! Level generation and the load-level flow.

use bevy::prelude::*;
use rand::seq::SliceRandom;

use crate::game::cell::{BubbleColor, Cell, SpecialKind};
use crate::game::coords::{GRID_HEIGHT, GridCoord};
use crate::game::grid::BubbleGrid;
use crate::game::messages::{BubbleDestroyed, BubblePlaced, LoadLevel};
use crate::game::queue::NextQueue;
use crate::game::session::{Ceiling, GameSession, LossPending};
use crate::game::tasks::PendingEffects;

/// Starting rows grow every other level but always leave room to shoot.
pub fn initial_rows(level: u32) -> usize {
    (6 + (level as usize - 1) / 2).min(GRID_HEIGHT - 2)
}

/// How many of each special a level seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialSchedule {
    pub stones: usize,
    pub anchors: usize,
    pub prisms: usize,
    pub chameleons: usize,
    pub bombs: usize,
    pub slimes: usize,
    pub stops: usize,
}

impl SpecialSchedule {
    pub fn for_level(level: u32) -> Self {
        let level = level as usize;
        Self {
            stones: (level / 2).min(4),
            anchors: (level / 3).min(2),
            prisms: if level >= 2 { 1 } else { 0 },
            chameleons: if level >= 3 { (level - 2).min(3) } else { 0 },
            bombs: if level >= 4 { (level / 4).min(2) } else { 0 },
            slimes: if level >= 5 { 1 } else { 0 },
            stops: if level >= 6 { 1 } else { 0 },
        }
    }

    pub fn total(&self) -> usize {
        self.stones + self.anchors + self.prisms + self.chameleons + self.bombs + self.slimes
            + self.stops
    }
}

/// Fill the board for `level`: random colors in the starting rows, then
/// specials swapped in over them. Stones avoid touching other stones so a
/// wall of them cannot seal a level.
pub fn populate(grid: &mut BubbleGrid, level: u32) {
    grid.clear();
    let rows = initial_rows(level);
    let mut rng = rand::rng();
    for row in 0..rows {
        for col in 0..GridCoord::columns_in_row(row) {
            grid.set(GridCoord::new(row, col), Cell::Color(BubbleColor::random()));
        }
    }

    let schedule = SpecialSchedule::for_level(level);
    let mut candidates: Vec<GridCoord> = grid.occupied_coords().collect();
    candidates.shuffle(&mut rng);

    let mut place = |grid: &mut BubbleGrid, kind: SpecialKind, count: usize| {
        let mut placed = 0;
        while placed < count {
            let Some(coord) = candidates.pop() else { return };
            if !matches!(grid.cell(coord), Cell::Color(_)) {
                continue;
            }
            if kind == SpecialKind::Stone
                && coord.neighbors().any(|n| grid.cell(n).is_stone())
            {
                continue;
            }
            let cell = match (kind, grid.cell(coord)) {
                // Chameleons start as the color they replace.
                (SpecialKind::Chameleon(_), Cell::Color(color)) => {
                    Cell::Special(SpecialKind::Chameleon(color))
                }
                _ => Cell::Special(kind),
            };
            grid.set(coord, cell);
            placed += 1;
        }
    };

    place(grid, SpecialKind::Stone, schedule.stones);
    place(grid, SpecialKind::Anchor, schedule.anchors);
    place(grid, SpecialKind::Prism, schedule.prisms);
    place(grid, SpecialKind::Chameleon(BubbleColor::Red), schedule.chameleons);
    place(grid, SpecialKind::Bomb, schedule.bombs);
    place(grid, SpecialKind::Slime, schedule.slimes);
    place(grid, SpecialKind::Stop, schedule.stops);
}

/// Tear the board down and rebuild it when a [`LoadLevel`] arrives.
pub(super) fn load_level(
    mut loads: MessageReader<LoadLevel>,
    mut grid: ResMut<BubbleGrid>,
    mut queue: ResMut<NextQueue>,
    mut session: ResMut<GameSession>,
    mut ceiling: ResMut<Ceiling>,
    mut pending: ResMut<PendingEffects>,
    mut loss: ResMut<LossPending>,
    mut placed: MessageWriter<BubblePlaced>,
    mut destroyed: MessageWriter<BubbleDestroyed>,
) {
    let Some(load) = loads.read().last() else {
        return;
    };

    let leftovers: Vec<GridCoord> = grid.occupied_coords().collect();
    for coord in leftovers {
        let cell = grid.take(coord);
        destroyed.write(BubbleDestroyed { coord, cell, fell: true });
    }

    populate(&mut grid, load.level);
    for coord in grid.occupied_coords() {
        placed.write(BubblePlaced { coord, cell: grid.cell(coord) });
    }

    session.start_level(load.level);
    session.board_ready = true;
    ceiling.reset();
    pending.clear();
    loss.0 = None;
    queue.reset();
    queue.refill(&grid.colors_on_board());
    info!("level {} loaded, {} starting rows", load.level, initial_rows(load.level));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_rows_grow_then_cap() {
        assert_eq!(initial_rows(1), 6);
        assert_eq!(initial_rows(2), 6);
        assert_eq!(initial_rows(3), 7);
        assert_eq!(initial_rows(13), 12);
        assert_eq!(initial_rows(99), GRID_HEIGHT - 2);
    }

    #[test]
    fn early_levels_skip_the_nasty_specials() {
        let schedule = SpecialSchedule::for_level(1);
        assert_eq!(schedule.bombs, 0);
        assert_eq!(schedule.slimes, 0);
        assert_eq!(schedule.stops, 0);
        assert_eq!(schedule.chameleons, 0);
    }

    #[test]
    fn late_levels_cap_their_schedules() {
        let schedule = SpecialSchedule::for_level(40);
        assert_eq!(schedule.stones, 4);
        assert_eq!(schedule.anchors, 2);
        assert_eq!(schedule.chameleons, 3);
        assert_eq!(schedule.bombs, 2);
        assert_eq!(schedule.slimes, 1);
        assert_eq!(schedule.stops, 1);
    }

    #[test]
    fn populate_fills_the_starting_rows() {
        let mut grid = BubbleGrid::default();
        populate(&mut grid, 1);
        for row in 0..initial_rows(1) {
            for col in 0..GridCoord::columns_in_row(row) {
                assert!(grid.cell(GridCoord::new(row, col)).is_occupied());
            }
        }
        for col in 0..GridCoord::columns_in_row(initial_rows(1)) {
            assert_eq!(grid.cell(GridCoord::new(initial_rows(1), col)), Cell::Empty);
        }
    }

    #[test]
    fn stones_never_touch_each_other() {
        for _ in 0..20 {
            let mut grid = BubbleGrid::default();
            populate(&mut grid, 8);
            for coord in grid.occupied_coords() {
                if grid.cell(coord).is_stone() {
                    assert!(
                        !coord.neighbors().any(|n| grid.cell(n).is_stone()),
                        "adjacent stones at {coord:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn seeded_chameleons_keep_the_replaced_color() {
        let mut grid = BubbleGrid::default();
        populate(&mut grid, 3);
        let chameleons = grid
            .occupied_coords()
            .filter(|&c| matches!(grid.cell(c), Cell::Special(SpecialKind::Chameleon(_))))
            .count();
        assert_eq!(chameleons, SpecialSchedule::for_level(3).chameleons);
    }
}
