//! The bubble field: a brick-offset grid of [`Cell`]s.
//!
//! The grid stores plain data, not entities, so matching and support logic
//! stay pure functions over it. The presentation layer mirrors it from
//! messages instead of reading it directly.

use bevy::prelude::*;

use crate::game::cell::{BubbleColor, Cell};
use crate::game::coords::{GRID_HEIGHT, GridCoord};

#[derive(Resource, Debug, Clone)]
pub struct BubbleGrid {
    rows: Vec<Vec<Cell>>,
}

impl Default for BubbleGrid {
    fn default() -> Self {
        let rows = (0..GRID_HEIGHT)
            .map(|row| vec![Cell::Empty; GridCoord::columns_in_row(row)])
            .collect();
        Self { rows }
    }
}

impl BubbleGrid {
    pub fn cell(&self, coord: GridCoord) -> Cell {
        self.rows
            .get(coord.row)
            .and_then(|row| row.get(coord.col))
            .copied()
            .unwrap_or(Cell::Empty)
    }

    pub fn set(&mut self, coord: GridCoord, cell: Cell) {
        if let Some(slot) = self
            .rows
            .get_mut(coord.row)
            .and_then(|row| row.get_mut(coord.col))
        {
            *slot = cell;
        }
    }

    /// Empty the cell and return what it held.
    pub fn take(&mut self, coord: GridCoord) -> Cell {
        let cell = self.cell(coord);
        self.set(coord, Cell::Empty);
        cell
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(Cell::Empty);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(|c| *c == Cell::Empty))
    }

    pub fn occupied_coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().filter_map(move |(c, cell)| {
                cell.is_occupied().then_some(GridCoord::new(r, c))
            })
        })
    }

    pub fn occupied_neighbors(&self, coord: GridCoord) -> impl Iterator<Item = GridCoord> + '_ {
        coord.neighbors().filter(|n| self.cell(*n).is_occupied())
    }

    /// Concrete colors currently on the board (for queue bias and ability
    /// targeting). Wildcards and colorless specials do not count.
    pub fn colors_on_board(&self) -> Vec<BubbleColor> {
        let mut colors = Vec::new();
        for coord in self.occupied_coords() {
            if let Some(color) = self.cell(coord).concrete_color()
                && !colors.contains(&color)
            {
                colors.push(color);
            }
        }
        colors
    }

    /// The empty slot closest to `pos` that touches `contact` or the top
    /// row. Searches the rows around the contact cell and picks the
    /// Euclidean-nearest center; falls back to the clamped approximate
    /// cell when the neighborhood is somehow full.
    pub fn nearest_empty_slot(
        &self,
        pos: Vec2,
        contact: GridCoord,
        ceiling_offset: usize,
    ) -> GridCoord {
        let lo = contact.row.saturating_sub(1);
        let hi = (contact.row + 1).min(GRID_HEIGHT - 1);
        let mut best: Option<(f32, GridCoord)> = None;
        for row in lo..=hi {
            for col in 0..GridCoord::columns_in_row(row) {
                let coord = GridCoord::new(row, col);
                if self.cell(coord).is_occupied() {
                    continue;
                }
                let attached = coord.row == 0
                    || coord.neighbors().any(|n| self.cell(n).is_occupied());
                if !attached {
                    continue;
                }
                let dist = coord.world_center(ceiling_offset).distance_squared(pos);
                if best.is_none_or(|(d, _)| dist < d) {
                    best = Some((dist, coord));
                }
            }
        }
        match best {
            Some((_, coord)) => coord,
            None => GridCoord::from_world(pos, ceiling_offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cell::SpecialKind;

    #[test]
    fn take_empties_the_cell() {
        let mut grid = BubbleGrid::default();
        let coord = GridCoord::new(2, 3);
        grid.set(coord, Cell::Color(BubbleColor::Red));
        assert_eq!(grid.take(coord), Cell::Color(BubbleColor::Red));
        assert_eq!(grid.cell(coord), Cell::Empty);
    }

    #[test]
    fn out_of_bounds_reads_are_empty() {
        let grid = BubbleGrid::default();
        assert_eq!(grid.cell(GridCoord::new(99, 0)), Cell::Empty);
        assert_eq!(grid.cell(GridCoord::new(1, 7)), Cell::Empty);
    }

    #[test]
    fn colors_on_board_skips_colorless_specials() {
        let mut grid = BubbleGrid::default();
        grid.set(GridCoord::new(0, 0), Cell::Color(BubbleColor::Blue));
        grid.set(GridCoord::new(0, 1), Cell::Special(SpecialKind::Stone));
        grid.set(GridCoord::new(0, 2), Cell::Special(SpecialKind::Prism));
        grid.set(
            GridCoord::new(0, 3),
            Cell::Special(SpecialKind::Chameleon(BubbleColor::Yellow)),
        );
        let colors = grid.colors_on_board();
        assert_eq!(colors.len(), 2);
        assert!(colors.contains(&BubbleColor::Blue));
        assert!(colors.contains(&BubbleColor::Yellow));
    }

    #[test]
    fn nearest_slot_touches_the_contact_bubble() {
        let mut grid = BubbleGrid::default();
        let contact = GridCoord::new(0, 3);
        grid.set(contact, Cell::Color(BubbleColor::Green));
        // Approach from straight below the contact bubble.
        let pos = contact.world_center(0) - Vec2::new(0.0, 60.0);
        let slot = grid.nearest_empty_slot(pos, contact, 0);
        assert!(slot.neighbors().any(|n| n == contact));
        assert_eq!(grid.cell(slot), Cell::Empty);
    }

    #[test]
    fn nearest_slot_never_returns_an_occupied_cell() {
        let mut grid = BubbleGrid::default();
        for col in 0..GridCoord::columns_in_row(0) {
            grid.set(GridCoord::new(0, col), Cell::Color(BubbleColor::Red));
        }
        let contact = GridCoord::new(0, 4);
        let pos = contact.world_center(0) - Vec2::new(10.0, 70.0);
        let slot = grid.nearest_empty_slot(pos, contact, 0);
        assert_eq!(grid.cell(slot), Cell::Empty);
        assert_eq!(slot.row, 1);
    }
}
