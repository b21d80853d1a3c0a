//! Brick-offset grid coordinates and their world-space mapping.
//!
//! Even rows hold [`GRID_WIDTH`] bubbles; odd rows hold one fewer and are
//! shifted right by half a bubble, so rows pack like bricks. Row spacing is
//! `size * sqrt(3) / 2`, the hex-packed vertical pitch.

use bevy::prelude::*;

pub const GRID_WIDTH: usize = 8;
pub const GRID_HEIGHT: usize = 14;

pub const WINDOW_WIDTH: f32 = 720.0;
pub const WINDOW_HEIGHT: f32 = 1080.0;

/// Bubble diameter; the playfield is exactly [`GRID_WIDTH`] bubbles wide.
pub const BUBBLE_SIZE: f32 = WINDOW_WIDTH / GRID_WIDTH as f32;
/// Vertical distance between row centers.
pub const ROW_HEIGHT: f32 = BUBBLE_SIZE * 0.866_025_4;

pub const FIELD_LEFT: f32 = -WINDOW_WIDTH / 2.0;
/// Top edge of the playfield, below the HUD band.
pub const FIELD_TOP: f32 = WINDOW_HEIGHT / 2.0 - 50.0;

/// Bubbles at or below this line lose the game (after the grace period).
pub const LIMIT_LINE_Y: f32 = -(WINDOW_HEIGHT / 2.0) + 200.0;

pub const SHOOTER_POS: Vec2 = Vec2::new(0.0, -(WINDOW_HEIGHT / 2.0) + 20.0);

/// A cell address in the brick-offset grid. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct GridCoord {
    pub row: usize,
    pub col: usize,
}

impl GridCoord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Number of columns in the given row (odd rows hold one fewer).
    pub const fn columns_in_row(row: usize) -> usize {
        if row % 2 == 0 { GRID_WIDTH } else { GRID_WIDTH - 1 }
    }

    pub fn in_bounds(self) -> bool {
        self.row < GRID_HEIGHT && self.col < Self::columns_in_row(self.row)
    }

    /// The up-to-six packed neighbors of this cell, filtered to the grid.
    ///
    /// In brick-offset addressing the diagonal partner column differs by
    /// row parity: odd rows sit half a bubble right of even rows, so their
    /// up/down diagonals are `col` and `col + 1`, while even rows use
    /// `col - 1` and `col`.
    pub fn neighbors(self) -> impl Iterator<Item = GridCoord> {
        let row = self.row as isize;
        let col = self.col as isize;
        let diag = if self.row % 2 == 1 { col + 1 } else { col - 1 };
        [
            (row, col - 1),
            (row, col + 1),
            (row - 1, col),
            (row - 1, diag),
            (row + 1, col),
            (row + 1, diag),
        ]
        .into_iter()
        .filter_map(|(r, c)| {
            if r < 0 || c < 0 {
                return None;
            }
            let coord = GridCoord::new(r as usize, c as usize);
            coord.in_bounds().then_some(coord)
        })
    }

    /// Cell center relative to the top-left of the field, ignoring descent.
    pub fn field_center(self) -> Vec2 {
        let offset = if self.row % 2 == 1 { BUBBLE_SIZE / 2.0 } else { 0.0 };
        Vec2::new(
            self.col as f32 * BUBBLE_SIZE + offset + BUBBLE_SIZE / 2.0,
            self.row as f32 * ROW_HEIGHT + BUBBLE_SIZE / 2.0,
        )
    }

    /// Cell center in world space, shifted down by the ceiling descent.
    pub fn world_center(self, ceiling_offset: usize) -> Vec2 {
        let local = self.field_center();
        Vec2::new(
            FIELD_LEFT + local.x,
            FIELD_TOP - local.y - ceiling_offset as f32 * ROW_HEIGHT,
        )
    }

    /// The grid cell whose center is closest to a world position, clamped
    /// to the field.
    pub fn from_world(pos: Vec2, ceiling_offset: usize) -> GridCoord {
        let local_y = FIELD_TOP - pos.y - ceiling_offset as f32 * ROW_HEIGHT - BUBBLE_SIZE / 2.0;
        let row = (local_y / ROW_HEIGHT).round().clamp(0.0, (GRID_HEIGHT - 1) as f32) as usize;
        let offset = if row % 2 == 1 { BUBBLE_SIZE / 2.0 } else { 0.0 };
        let local_x = pos.x - FIELD_LEFT - offset - BUBBLE_SIZE / 2.0;
        let max_col = (Self::columns_in_row(row) - 1) as f32;
        let col = (local_x / BUBBLE_SIZE).round().clamp(0.0, max_col) as usize;
        GridCoord::new(row, col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_rows_are_narrower() {
        assert_eq!(GridCoord::columns_in_row(0), GRID_WIDTH);
        assert_eq!(GridCoord::columns_in_row(1), GRID_WIDTH - 1);
        assert!(!GridCoord::new(1, GRID_WIDTH - 1).in_bounds());
        assert!(GridCoord::new(0, GRID_WIDTH - 1).in_bounds());
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        for row in 0..GRID_HEIGHT {
            for col in 0..GridCoord::columns_in_row(row) {
                let coord = GridCoord::new(row, col);
                for neighbor in coord.neighbors() {
                    assert!(
                        neighbor.neighbors().any(|back| back == coord),
                        "{coord:?} -> {neighbor:?} is not symmetric"
                    );
                }
            }
        }
    }

    #[test]
    fn interior_cells_have_six_neighbors() {
        assert_eq!(GridCoord::new(5, 3).neighbors().count(), 6);
        // Top-left corner touches only three cells.
        assert_eq!(GridCoord::new(0, 0).neighbors().count(), 3);
    }

    #[test]
    fn neighbors_are_adjacent_in_world_space() {
        let coord = GridCoord::new(6, 4);
        let center = coord.world_center(0);
        for neighbor in coord.neighbors() {
            let dist = center.distance(neighbor.world_center(0));
            assert!(
                (dist - BUBBLE_SIZE).abs() < 1.0,
                "{neighbor:?} at distance {dist}"
            );
        }
    }

    #[test]
    fn world_roundtrip() {
        for offset in [0, 2] {
            for row in 0..GRID_HEIGHT {
                for col in 0..GridCoord::columns_in_row(row) {
                    let coord = GridCoord::new(row, col);
                    let back = GridCoord::from_world(coord.world_center(offset), offset);
                    assert_eq!(back, coord);
                }
            }
        }
    }

    #[test]
    fn from_world_clamps_outside_positions() {
        let coord = GridCoord::from_world(Vec2::new(-10_000.0, 10_000.0), 0);
        assert_eq!(coord, GridCoord::new(0, 0));
        let coord = GridCoord::from_world(Vec2::new(10_000.0, -10_000.0), 0);
        assert!(coord.in_bounds());
    }
}
