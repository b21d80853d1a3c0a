//! Match detection and support analysis, as pure functions over the grid.

use std::collections::{HashSet, VecDeque};

use crate::game::cell::{BubbleColor, Cell};
use crate::game::coords::GridCoord;
use crate::game::grid::BubbleGrid;

/// A flood-filled group needs at least this many bubbles to pop.
pub const MIN_MATCH_SIZE: usize = 3;

/// Flood-fill the same-color group containing `start`.
///
/// Wildcards join and propagate the fill; blockers (stones, anchors, slime,
/// dormant bombs) stop it. Returns every member including `start`, or an
/// empty vec when `start` itself does not carry `color`.
pub fn find_matches(grid: &BubbleGrid, start: GridCoord, color: BubbleColor) -> Vec<GridCoord> {
    if !grid.cell(start).matches_color(color) {
        return Vec::new();
    }
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut group = Vec::new();
    while let Some(coord) = queue.pop_front() {
        group.push(coord);
        for neighbor in coord.neighbors() {
            if !seen.contains(&neighbor) && grid.cell(neighbor).matches_color(color) {
                seen.insert(neighbor);
                queue.push_back(neighbor);
            }
        }
    }
    group
}

/// Every occupied cell reachable from the ceiling row or from an anchor.
pub fn find_supported(grid: &BubbleGrid) -> HashSet<GridCoord> {
    let mut supported = HashSet::new();
    let mut queue = VecDeque::new();
    for coord in grid.occupied_coords() {
        if coord.row == 0 || grid.cell(coord).is_anchor() {
            supported.insert(coord);
            queue.push_back(coord);
        }
    }
    while let Some(coord) = queue.pop_front() {
        for neighbor in grid.occupied_neighbors(coord) {
            if supported.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
    supported
}

/// What a support pass removed from the grid.
#[derive(Debug, Default)]
pub struct SupportOutcome {
    /// Unsupported cells that fell, with their former contents.
    pub floating: Vec<(GridCoord, Cell)>,
    /// Anchors swept because nothing but other anchors held on to them.
    pub isolated_anchors: Vec<GridCoord>,
    /// Whether any removed cell was a stop bubble.
    pub dislodged_stop: bool,
}

impl SupportOutcome {
    pub fn removed_count(&self) -> usize {
        self.floating.len() + self.isolated_anchors.len()
    }
}

/// Remove everything the board no longer supports.
///
/// First drops cells unreachable from the ceiling and anchors, then sweeps
/// anchors kept alive only by other anchors. An anchor below the top row
/// with no non-anchor neighbor is holding nothing and goes too; the sweep
/// loops so chains and pairs of such anchors unravel fully.
pub fn run_support_pass(grid: &mut BubbleGrid) -> SupportOutcome {
    let mut outcome = SupportOutcome::default();
    let supported = find_supported(grid);
    let floating: Vec<GridCoord> = grid
        .occupied_coords()
        .filter(|coord| !supported.contains(coord))
        .collect();
    for coord in floating {
        let cell = grid.take(coord);
        if cell.is_stop() {
            outcome.dislodged_stop = true;
        }
        outcome.floating.push((coord, cell));
    }

    loop {
        let isolated: Vec<GridCoord> = grid
            .occupied_coords()
            .filter(|&coord| {
                coord.row != 0
                    && grid.cell(coord).is_anchor()
                    && !grid
                        .occupied_neighbors(coord)
                        .any(|n| !grid.cell(n).is_anchor())
            })
            .collect();
        if isolated.is_empty() {
            break;
        }
        for coord in isolated {
            grid.take(coord);
            outcome.isolated_anchors.push(coord);
        }
    }
    outcome
}

/// What settling a colored shot did to the grid.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// The popped match group, if it reached [`MIN_MATCH_SIZE`].
    pub popped: Vec<(GridCoord, Cell)>,
    pub support: SupportOutcome,
}

impl ResolveOutcome {
    pub fn matched(&self) -> bool {
        !self.popped.is_empty()
    }
}

/// Pop the match around a freshly settled colored bubble and drop whatever
/// that strands. The settled cell must already be written to the grid.
pub fn resolve_color_settle(
    grid: &mut BubbleGrid,
    coord: GridCoord,
    color: BubbleColor,
) -> ResolveOutcome {
    let group = find_matches(grid, coord, color);
    if group.len() < MIN_MATCH_SIZE {
        return ResolveOutcome::default();
    }
    let mut outcome = ResolveOutcome::default();
    for member in group {
        let cell = grid.take(member);
        outcome.popped.push((member, cell));
    }
    outcome.support = run_support_pass(grid);
    outcome
}

/// The most common concrete color among a cell's occupied neighbors.
pub fn adopt_neighbor_color(grid: &BubbleGrid, coord: GridCoord) -> Option<BubbleColor> {
    let mut counts: Vec<(BubbleColor, usize)> = Vec::new();
    for neighbor in grid.occupied_neighbors(coord) {
        if let Some(color) = grid.cell(neighbor).concrete_color() {
            match counts.iter_mut().find(|(c, _)| *c == color) {
                Some((_, n)) => *n += 1,
                None => counts.push((color, 1)),
            }
        }
    }
    counts.into_iter().max_by_key(|(_, n)| *n).map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cell::SpecialKind;

    fn coord(row: usize, col: usize) -> GridCoord {
        GridCoord::new(row, col)
    }

    #[test]
    fn four_in_a_row_pops_and_leaves_the_rest() {
        let mut grid = BubbleGrid::default();
        for col in 0..4 {
            grid.set(coord(0, col), Cell::Color(BubbleColor::Red));
        }
        grid.set(coord(0, 4), Cell::Color(BubbleColor::Blue));
        let outcome = resolve_color_settle(&mut grid, coord(0, 0), BubbleColor::Red);
        assert_eq!(outcome.popped.len(), 4);
        assert_eq!(grid.cell(coord(0, 4)), Cell::Color(BubbleColor::Blue));
    }

    #[test]
    fn pairs_stay_on_the_board() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Red));
        grid.set(coord(0, 1), Cell::Color(BubbleColor::Red));
        let outcome = resolve_color_settle(&mut grid, coord(0, 1), BubbleColor::Red);
        assert!(!outcome.matched());
        assert_eq!(grid.cell(coord(0, 0)), Cell::Color(BubbleColor::Red));
    }

    #[test]
    fn prism_bridges_two_sides_of_a_match() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Green));
        grid.set(coord(0, 1), Cell::Special(SpecialKind::Prism));
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Green));
        let group = find_matches(&grid, coord(0, 0), BubbleColor::Green);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn stone_splits_a_would_be_match() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Green));
        grid.set(coord(0, 1), Cell::Special(SpecialKind::Stone));
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Green));
        grid.set(coord(0, 3), Cell::Color(BubbleColor::Green));
        let group = find_matches(&grid, coord(0, 0), BubbleColor::Green);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn popping_drops_the_stranded_tail() {
        let mut grid = BubbleGrid::default();
        // Column hanging from the ceiling: red, red, then a blue tail.
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Red));
        grid.set(coord(1, 2), Cell::Color(BubbleColor::Red));
        grid.set(coord(2, 2), Cell::Color(BubbleColor::Blue));
        // Settle a third red next to the top one.
        grid.set(coord(0, 3), Cell::Color(BubbleColor::Red));
        let outcome = resolve_color_settle(&mut grid, coord(0, 3), BubbleColor::Red);
        assert_eq!(outcome.popped.len(), 3);
        assert_eq!(outcome.support.floating.len(), 1);
        assert_eq!(
            outcome.support.floating[0],
            (coord(2, 2), Cell::Color(BubbleColor::Blue))
        );
        assert!(grid.is_empty());
    }

    #[test]
    fn anchor_keeps_its_cluster_aloft() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(5, 3), Cell::Special(SpecialKind::Anchor));
        grid.set(coord(5, 4), Cell::Color(BubbleColor::Yellow));
        let outcome = run_support_pass(&mut grid);
        assert_eq!(outcome.removed_count(), 0);
        assert_eq!(grid.cell(coord(5, 4)), Cell::Color(BubbleColor::Yellow));
    }

    #[test]
    fn lone_anchor_is_swept() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(5, 3), Cell::Special(SpecialKind::Anchor));
        let outcome = run_support_pass(&mut grid);
        assert_eq!(outcome.isolated_anchors, vec![coord(5, 3)]);
        assert!(grid.is_empty());
    }

    #[test]
    fn anchor_pair_unravels() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(5, 3), Cell::Special(SpecialKind::Anchor));
        grid.set(coord(5, 4), Cell::Special(SpecialKind::Anchor));
        let outcome = run_support_pass(&mut grid);
        assert_eq!(outcome.isolated_anchors.len(), 2);
        assert!(grid.is_empty());
    }

    #[test]
    fn top_row_anchor_survives_alone() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 3), Cell::Special(SpecialKind::Anchor));
        let outcome = run_support_pass(&mut grid);
        assert_eq!(outcome.removed_count(), 0);
    }

    #[test]
    fn support_pass_is_idempotent() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 0), Cell::Color(BubbleColor::Red));
        grid.set(coord(1, 0), Cell::Special(SpecialKind::Anchor));
        grid.set(coord(4, 4), Cell::Color(BubbleColor::Blue));
        grid.set(coord(5, 5), Cell::Special(SpecialKind::Anchor));
        grid.set(coord(5, 6), Cell::Special(SpecialKind::Anchor));
        let first = run_support_pass(&mut grid);
        assert!(first.removed_count() > 0);
        let second = run_support_pass(&mut grid);
        assert_eq!(second.removed_count(), 0);
    }

    #[test]
    fn dislodged_stop_is_reported() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(3, 3), Cell::Special(SpecialKind::Stop));
        let outcome = run_support_pass(&mut grid);
        assert!(outcome.dislodged_stop);
    }

    #[test]
    fn adopts_the_majority_neighbor_color() {
        let mut grid = BubbleGrid::default();
        grid.set(coord(0, 2), Cell::Color(BubbleColor::Blue));
        grid.set(coord(0, 4), Cell::Color(BubbleColor::Blue));
        grid.set(coord(1, 3), Cell::Color(BubbleColor::Red));
        assert_eq!(
            adopt_neighbor_color(&grid, coord(0, 3)),
            Some(BubbleColor::Blue)
        );
        assert_eq!(adopt_neighbor_color(&grid, coord(10, 3)), None);
    }
}
