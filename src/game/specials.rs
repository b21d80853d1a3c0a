//! Shot resolution and special-bubble behavior.
//!
//! Everything that writes the grid after a projectile stops lives here:
//! plain settles, ability shots, deferred bomb chains, and the per-turn
//! slime and chameleon ticks. Each write goes out as a message so the
//! presentation layer can mirror it.

use std::collections::{HashSet, VecDeque};

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use rand::Rng;

use crate::game::cell::{BubbleColor, Cell, SpecialKind};
use crate::game::cluster::{
    ResolveOutcome, SupportOutcome, adopt_neighbor_color, resolve_color_settle, run_support_pass,
};
use crate::game::coords::GridCoord;
use crate::game::grid::BubbleGrid;
use crate::game::messages::{
    AbilityDestroyed, BubbleDestroyed, BubblePlaced, BubbleSettled, CellTransformed,
    FloatingRemoved, LanceFinished, MatchPopped, TurnElapsed,
};
use crate::game::session::{Ceiling, GameSession};
use crate::game::shooter::ShotKind;
use crate::game::tasks::{CHAIN_DELAY_FRAMES, DeferredEffect, PendingEffects};

/// Chameleons drift every second shot; slime spreads every sixth.
const CHAMELEON_PERIOD: u32 = 2;
const SLIME_PERIOD: u32 = 6;

/// Writers for every board-mutation message, bundled so the resolution
/// systems keep readable signatures.
#[derive(SystemParam)]
pub(super) struct BoardMessages<'w> {
    placed: MessageWriter<'w, BubblePlaced>,
    destroyed: MessageWriter<'w, BubbleDestroyed>,
    transformed: MessageWriter<'w, CellTransformed>,
    popped: MessageWriter<'w, MatchPopped>,
    floating: MessageWriter<'w, FloatingRemoved>,
    ability: MessageWriter<'w, AbilityDestroyed>,
}

impl BoardMessages<'_> {
    fn emit_support(&mut self, support: &SupportOutcome, ceiling: &mut Ceiling) {
        for (coord, cell) in &support.floating {
            self.destroyed.write(BubbleDestroyed { coord: *coord, cell: *cell, fell: true });
        }
        for coord in &support.isolated_anchors {
            self.destroyed.write(BubbleDestroyed {
                coord: *coord,
                cell: Cell::Special(SpecialKind::Anchor),
                fell: true,
            });
        }
        if !support.floating.is_empty() || !support.isolated_anchors.is_empty() {
            let coords = support
                .floating
                .iter()
                .map(|(c, _)| *c)
                .chain(support.isolated_anchors.iter().copied())
                .collect();
            self.floating.write(FloatingRemoved { coords });
        }
        if support.dislodged_stop {
            ceiling.freeze_permanently();
        }
    }

    fn emit_resolve(&mut self, outcome: &ResolveOutcome, color: BubbleColor, ceiling: &mut Ceiling) {
        if outcome.matched() {
            for (coord, cell) in &outcome.popped {
                self.destroyed.write(BubbleDestroyed { coord: *coord, cell: *cell, fell: false });
            }
            self.popped.write(MatchPopped {
                coords: outcome.popped.iter().map(|(c, _)| *c).collect(),
                color,
            });
        }
        self.emit_support(&outcome.support, ceiling);
    }
}

/// Every cell within two packed steps of `center`, excluding it.
pub fn blast_area(center: GridCoord) -> Vec<GridCoord> {
    let mut seen = HashSet::from([center]);
    let mut queue = VecDeque::from([(center, 0usize)]);
    let mut area = Vec::new();
    while let Some((coord, depth)) = queue.pop_front() {
        if depth == 2 {
            continue;
        }
        for neighbor in coord.neighbors() {
            if seen.insert(neighbor) {
                area.push(neighbor);
                queue.push_back((neighbor, depth + 1));
            }
        }
    }
    area
}

/// What one bomb detonation did.
pub struct BlastOutcome {
    /// Destroyed cells, the consumed bomb first.
    pub destroyed: Vec<(GridCoord, Cell)>,
    /// Bombs caught in the blast, left in place for their own detonation.
    pub chained: Vec<GridCoord>,
}

/// Consume the bomb at `center` and destroy its two-ring area.
///
/// Obstacles in the area survive. Other bombs survive too but are
/// reported for chaining.
pub fn bomb_blast(grid: &mut BubbleGrid, center: GridCoord) -> BlastOutcome {
    let mut outcome = BlastOutcome {
        destroyed: vec![(center, grid.take(center))],
        chained: Vec::new(),
    };
    for coord in blast_area(center) {
        let cell = grid.cell(coord);
        if !cell.is_occupied() {
            continue;
        }
        if cell.is_bomb() {
            outcome.chained.push(coord);
        } else if !cell.ability_immune() {
            outcome.destroyed.push((coord, grid.take(coord)));
        }
    }
    outcome
}

/// Destroy every cell showing `color`, chameleons included.
pub fn destroy_color(grid: &mut BubbleGrid, color: BubbleColor) -> Vec<(GridCoord, Cell)> {
    let targets: Vec<GridCoord> = grid
        .occupied_coords()
        .filter(|&c| grid.cell(c).concrete_color() == Some(color))
        .collect();
    targets.into_iter().map(|c| (c, grid.take(c))).collect()
}

/// Recolor every cell showing `color` to a random different color.
pub fn transform_color(grid: &mut BubbleGrid, color: BubbleColor) -> Vec<(GridCoord, Cell)> {
    let targets: Vec<GridCoord> = grid
        .occupied_coords()
        .filter(|&c| grid.cell(c).concrete_color() == Some(color))
        .collect();
    let mut transformed = Vec::new();
    for coord in targets {
        let new_cell = match grid.cell(coord) {
            Cell::Special(SpecialKind::Chameleon(c)) => {
                Cell::Special(SpecialKind::Chameleon(c.random_other()))
            }
            _ => Cell::Color(color.random_other()),
        };
        grid.set(coord, new_cell);
        transformed.push((coord, new_cell));
    }
    transformed
}

/// Contagion tick: convert exactly one uniformly random infection target
/// across the whole board. Targets are plain-colored neighbors of any
/// slime, excluding the ceiling row.
pub fn spread_slime(grid: &mut BubbleGrid) -> Option<GridCoord> {
    let mut rng = rand::rng();
    let victims: Vec<GridCoord> = grid
        .occupied_coords()
        .filter(|&c| grid.cell(c).is_slime())
        .flat_map(|slime| slime.neighbors())
        .filter(|&n| n.row != 0 && matches!(grid.cell(n), Cell::Color(_)))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    if victims.is_empty() {
        return None;
    }
    let victim = victims[rng.random_range(0..victims.len())];
    grid.set(victim, Cell::Special(SpecialKind::Slime));
    Some(victim)
}

/// Each chameleon adopts the color of a uniformly random plain-colored
/// neighbor, if it has one.
pub fn drift_chameleons(grid: &mut BubbleGrid) -> Vec<(GridCoord, Cell)> {
    let mut rng = rand::rng();
    let chameleons: Vec<(GridCoord, BubbleColor)> = grid
        .occupied_coords()
        .filter_map(|c| match grid.cell(c) {
            Cell::Special(SpecialKind::Chameleon(color)) => Some((c, color)),
            _ => None,
        })
        .collect();
    let mut changed = Vec::new();
    for (coord, current) in chameleons {
        let choices: Vec<BubbleColor> = coord
            .neighbors()
            .filter_map(|n| match grid.cell(n) {
                Cell::Color(color) => Some(color),
                _ => None,
            })
            .collect();
        if choices.is_empty() {
            continue;
        }
        let adopted = choices[rng.random_range(0..choices.len())];
        if adopted != current {
            let cell = Cell::Special(SpecialKind::Chameleon(adopted));
            grid.set(coord, cell);
            changed.push((coord, cell));
        }
    }
    changed
}

/// What a wild shot becomes at `coord`: the majority neighbor color, or a
/// wildcard when nothing colored surrounds it.
fn wild_settle_cell(grid: &BubbleGrid, coord: GridCoord) -> Cell {
    match adopt_neighbor_color(grid, coord) {
        Some(color) => Cell::Color(color),
        None => Cell::Special(SpecialKind::Prism),
    }
}

/// The color a board-targeting ability acts on: whatever the occupied
/// neighbor nearest the impact point shows. An immune special there means
/// the ability fizzles.
fn target_color(grid: &BubbleGrid, coord: GridCoord, impact: Vec2, offset: usize) -> Option<BubbleColor> {
    grid.occupied_neighbors(coord)
        .min_by(|a, b| {
            a.world_center(offset)
                .distance_squared(impact)
                .total_cmp(&b.world_center(offset).distance_squared(impact))
        })
        .and_then(|n| grid.cell(n).concrete_color())
}

fn run_blast(
    grid: &mut BubbleGrid,
    center: GridCoord,
    pending: &mut PendingEffects,
    messages: &mut BoardMessages,
    ceiling: &mut Ceiling,
) -> usize {
    let blast = bomb_blast(grid, center);
    for (coord, cell) in &blast.destroyed {
        messages.destroyed.write(BubbleDestroyed { coord: *coord, cell: *cell, fell: false });
    }
    for chained in blast.chained {
        pending.schedule(CHAIN_DELAY_FRAMES, DeferredEffect::BombBlast(chained));
    }
    let count = blast.destroyed.len();
    let support = run_support_pass(grid);
    messages.emit_support(&support, ceiling);
    count
}

/// Drain effects whose delay elapsed: chained bomb blasts and match checks
/// queued behind a mass transform.
pub(super) fn drain_deferred(
    mut grid: ResMut<BubbleGrid>,
    mut pending: ResMut<PendingEffects>,
    mut ceiling: ResMut<Ceiling>,
    mut messages: BoardMessages,
) {
    for effect in pending.drain_ready() {
        match effect {
            DeferredEffect::BombBlast(coord) => {
                if !grid.cell(coord).is_bomb() {
                    continue;
                }
                let count = run_blast(&mut grid, coord, &mut pending, &mut messages, &mut ceiling);
                messages.ability.write(AbilityDestroyed { count });
            }
            DeferredEffect::MatchCheck(coord) => {
                let Some(color) = grid.cell(coord).concrete_color() else {
                    continue;
                };
                let outcome = resolve_color_settle(&mut grid, coord, color);
                messages.emit_resolve(&outcome, color, &mut ceiling);
            }
        }
    }
}

/// Apply a settled shot to the grid and run the per-turn board ticks.
pub(super) fn resolve_settled(
    mut settles: MessageReader<BubbleSettled>,
    mut lances: MessageReader<LanceFinished>,
    mut grid: ResMut<BubbleGrid>,
    mut pending: ResMut<PendingEffects>,
    mut ceiling: ResMut<Ceiling>,
    mut session: ResMut<GameSession>,
    mut messages: BoardMessages,
    mut turns: MessageWriter<TurnElapsed>,
) {
    let mut turn_taken = false;

    for settle in settles.read() {
        turn_taken = true;
        match settle.shot {
            ShotKind::Plain(color) => {
                if settle.cured_slime {
                    let cell = Cell::Color(color);
                    grid.set(settle.coord, cell);
                    messages.transformed.write(CellTransformed { coord: settle.coord, cell });
                } else {
                    let cell = Cell::Color(color);
                    grid.set(settle.coord, cell);
                    messages.placed.write(BubblePlaced { coord: settle.coord, cell });
                }
                let outcome = resolve_color_settle(&mut grid, settle.coord, color);
                messages.emit_resolve(&outcome, color, &mut ceiling);
            }
            ShotKind::Wild => {
                let cell = wild_settle_cell(&grid, settle.coord);
                grid.set(settle.coord, cell);
                messages.placed.write(BubblePlaced { coord: settle.coord, cell });
                if let Some(color) = cell.concrete_color() {
                    let outcome = resolve_color_settle(&mut grid, settle.coord, color);
                    messages.emit_resolve(&outcome, color, &mut ceiling);
                }
            }
            ShotKind::Bomb => {
                let cell = Cell::Special(SpecialKind::Bomb);
                grid.set(settle.coord, cell);
                messages.placed.write(BubblePlaced { coord: settle.coord, cell });
                let count =
                    run_blast(&mut grid, settle.coord, &mut pending, &mut messages, &mut ceiling);
                messages.ability.write(AbilityDestroyed { count });
            }
            ShotKind::ColorBlast => {
                if let Some(color) =
                    target_color(&grid, settle.coord, settle.impact, ceiling.offset)
                {
                    let destroyed = destroy_color(&mut grid, color);
                    for (coord, cell) in &destroyed {
                        messages
                            .destroyed
                            .write(BubbleDestroyed { coord: *coord, cell: *cell, fell: false });
                    }
                    messages.ability.write(AbilityDestroyed { count: destroyed.len() });
                    let support = run_support_pass(&mut grid);
                    messages.emit_support(&support, &mut ceiling);
                }
                // No neighbor color means the shot fizzles against an
                // obstacle; the turn is still spent.
            }
            ShotKind::MassTransform(color) => {
                let cell = Cell::Color(color);
                grid.set(settle.coord, cell);
                messages.placed.write(BubblePlaced { coord: settle.coord, cell });
                // The target may be the shot's own color; the just-placed
                // cell recolors along with the rest of the board then.
                if let Some(target) =
                    target_color(&grid, settle.coord, settle.impact, ceiling.offset)
                {
                    for (coord, cell) in transform_color(&mut grid, target) {
                        messages.transformed.write(CellTransformed { coord, cell });
                        pending.schedule(CHAIN_DELAY_FRAMES, DeferredEffect::MatchCheck(coord));
                    }
                }
                pending.schedule(CHAIN_DELAY_FRAMES, DeferredEffect::MatchCheck(settle.coord));
            }
            // Lances never settle; they finish below.
            ShotKind::IceLance => {}
        }
    }

    for lance in lances.read() {
        turn_taken = true;
        let support = run_support_pass(&mut grid);
        messages.emit_support(&support, &mut ceiling);
        messages.ability.write(AbilityDestroyed { count: lance.destroyed });
    }

    if !turn_taken {
        return;
    }

    let turn_count = session.register_turn();
    if turn_count % CHAMELEON_PERIOD == 0 {
        for (coord, cell) in drift_chameleons(&mut grid) {
            messages.transformed.write(CellTransformed { coord, cell });
        }
    }
    if turn_count % SLIME_PERIOD == 0
        && let Some(coord) = spread_slime(&mut grid)
    {
        messages
            .transformed
            .write(CellTransformed { coord, cell: Cell::Special(SpecialKind::Slime) });
    }
    turns.write(TurnElapsed { turns: turn_count });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(row: usize, col: usize) -> GridCoord {
        GridCoord::new(row, col)
    }

    #[test]
    fn blast_area_spans_two_rings() {
        let area = blast_area(coord(6, 4));
        assert!(area.contains(&coord(6, 3)));
        assert!(area.contains(&coord(6, 2)));
        assert!(area.contains(&coord(4, 4)));
        assert!(!area.contains(&coord(6, 1)));
        assert!(!area.contains(&coord(6, 4)));
        // Interior two-ring neighborhood of a hex packing is 18 cells.
        assert_eq!(area.len(), 18);
    }

    #[test]
    fn bomb_spares_obstacles_and_chains_bombs() {
        let mut grid = BubbleGrid::default();
        let center = coord(6, 4);
        grid.set(center, Cell::Special(SpecialKind::Bomb));
        grid.set(coord(6, 3), Cell::Color(BubbleColor::Red));
        grid.set(coord(6, 5), Cell::Special(SpecialKind::Stone));
        grid.set(coord(6, 2), Cell::Special(SpecialKind::Bomb));
        let outcome = bomb_blast(&mut grid, center);

        assert_eq!(outcome.destroyed[0].0, center);
        assert!(outcome.destroyed.iter().any(|(c, _)| *c == coord(6, 3)));
        assert_eq!(outcome.chained, vec![coord(6, 2)]);
        assert!(grid.cell(coord(6, 5)).is_stone());
        assert!(grid.cell(coord(6, 2)).is_bomb());
        assert_eq!(grid.cell(center), Cell::Empty);
    }

    #[test]
    fn color_wipe_takes_matching_chameleons() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Red));
        grid.set(coord(0, 2), Cell::Special(SpecialKind::Chameleon(BubbleColor::Red)));
        grid.set(coord(0, 4), Cell::Color(BubbleColor::Blue));
        let destroyed = destroy_color(&mut grid, BubbleColor::Red);
        assert_eq!(destroyed.len(), 2);
        assert_eq!(grid.cell(coord(0, 4)), Cell::Color(BubbleColor::Blue));
    }

    #[test]
    fn transform_recolors_every_target() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Red));
        grid.set(coord(0, 1), Cell::Color(BubbleColor::Red));
        let transformed = transform_color(&mut grid, BubbleColor::Red);
        assert_eq!(transformed.len(), 2);
        for (coord, _) in transformed {
            assert_ne!(grid.cell(coord).concrete_color(), Some(BubbleColor::Red));
            assert!(grid.cell(coord).is_occupied());
        }
    }

    #[test]
    fn transform_includes_the_shots_own_color() {
        let mut grid = BubbleGrid::default();
        let landed = coord(0, 2);
        grid.set(coord(0, 1), Cell::Color(BubbleColor::Red));
        grid.set(landed, Cell::Color(BubbleColor::Red));
        // Landing a red shot against a red cluster still targets red.
        assert_eq!(
            target_color(&grid, landed, landed.world_center(0), 0),
            Some(BubbleColor::Red)
        );
        let transformed = transform_color(&mut grid, BubbleColor::Red);
        assert_eq!(transformed.len(), 2);
        assert!(transformed.iter().any(|(c, _)| *c == landed));
        assert!(
            grid.occupied_coords()
                .all(|c| grid.cell(c).concrete_color() != Some(BubbleColor::Red))
        );
    }

    #[test]
    fn wild_adopts_a_colored_neighbor() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Blue));
        assert_eq!(wild_settle_cell(&grid, coord(0, 3)), Cell::Color(BubbleColor::Blue));
    }

    #[test]
    fn isolated_wild_stays_as_a_wildcard() {
        let mut grid = BubbleGrid::default();
        let landed = coord(0, 3);
        grid.set(coord(0, 2), Cell::Special(SpecialKind::Stone));
        let cell = wild_settle_cell(&grid, landed);
        assert!(cell.is_wildcard());
        grid.set(landed, cell);
        for color in BubbleColor::ALL {
            assert!(grid.cell(landed).matches_color(color));
        }
    }

    #[test]
    fn contagion_converts_exactly_one_cell_per_tick() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(5, 3), Cell::Special(SpecialKind::Slime));
        grid.set(coord(5, 2), Cell::Color(BubbleColor::Red));
        grid.set(coord(5, 4), Cell::Color(BubbleColor::Blue));
        let converted = spread_slime(&mut grid);
        let victim = converted.expect("one neighbor should be infected");
        assert!(grid.cell(victim).is_slime());
        let slimes = grid
            .occupied_coords()
            .filter(|&c| grid.cell(c).is_slime())
            .count();
        assert_eq!(slimes, 2);
    }

    #[test]
    fn slime_ignores_specials_and_the_ceiling_row() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(1, 3), Cell::Special(SpecialKind::Slime));
        grid.set(coord(1, 2), Cell::Special(SpecialKind::Stone));
        grid.set(coord(1, 4), Cell::Special(SpecialKind::Prism));
        grid.set(coord(0, 3), Cell::Color(BubbleColor::Red));
        assert!(spread_slime(&mut grid).is_none());
    }

    #[test]
    fn chameleon_adopts_a_neighboring_color() {
        let mut grid = BubbleGrid::default();
        let coord_ = coord(0, 3);
        grid.set(coord_, Cell::Special(SpecialKind::Chameleon(BubbleColor::Red)));
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Blue));
        grid.set(coord(0, 4), Cell::Color(BubbleColor::Blue));
        let changed = drift_chameleons(&mut grid);
        assert_eq!(changed.len(), 1);
        assert_eq!(
            grid.cell(coord_),
            Cell::Special(SpecialKind::Chameleon(BubbleColor::Blue))
        );
    }

    #[test]
    fn chameleon_without_plain_neighbors_keeps_its_color() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 3), Cell::Special(SpecialKind::Chameleon(BubbleColor::Blue)));
        grid.set(coord(0, 2), Cell::Special(SpecialKind::Stone));
        grid.set(
            coord(0, 4),
            Cell::Special(SpecialKind::Chameleon(BubbleColor::Red)),
        );
        assert!(drift_chameleons(&mut grid).is_empty());
    }
}
