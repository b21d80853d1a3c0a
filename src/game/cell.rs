//! Grid cell contents: plain colors and the special bubble kinds.
//!
//! Every kind is a closed enum variant so the matching and support passes
//! handle all of them exhaustively, instead of the stringly-typed tags the
//! original game used.

use bevy::prelude::*;
use rand::Rng;

/// The plain bubble palette (5 colors, like the original).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Default)]
pub enum BubbleColor {
    #[default]
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
}

impl BubbleColor {
    /// All palette colors.
    pub const ALL: [BubbleColor; 5] = [
        BubbleColor::Red,
        BubbleColor::Green,
        BubbleColor::Blue,
        BubbleColor::Yellow,
        BubbleColor::Magenta,
    ];

    /// Get the actual color for rendering.
    pub fn to_color(self) -> Color {
        match self {
            BubbleColor::Red => Color::srgb(0.95, 0.2, 0.2),
            BubbleColor::Green => Color::srgb(0.2, 0.85, 0.3),
            BubbleColor::Blue => Color::srgb(0.25, 0.4, 0.95),
            BubbleColor::Yellow => Color::srgb(0.95, 0.85, 0.2),
            BubbleColor::Magenta => Color::srgb(0.9, 0.25, 0.85),
        }
    }

    /// Get a random palette color.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// A random palette color different from `self`.
    pub fn random_other(self) -> Self {
        let mut rng = rand::rng();
        loop {
            let color = Self::ALL[rng.random_range(0..Self::ALL.len())];
            if color != self {
                return color;
            }
        }
    }
}

/// Special bubble kinds with their own interaction rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum SpecialKind {
    /// Pure obstacle. Immune to every special effect; only the support
    /// pass removes it.
    Stone,
    /// Obstacle that also acts as a support root for the cells around it.
    Anchor,
    /// Explodes when a blast reaches it, destroying its two-ring area.
    Bomb,
    /// Universal match wildcard.
    Prism,
    /// Spreads to a neighboring color bubble on its turn tick; cured in
    /// place by a plain hit.
    Slime,
    /// Freezes the ceiling for the rest of the level when dislodged.
    Stop,
    /// Carries a current color and drifts toward the colors around it
    /// every other shot.
    Chameleon(BubbleColor),
}

/// Content of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub enum Cell {
    #[default]
    Empty,
    Color(BubbleColor),
    Special(SpecialKind),
}

impl Cell {
    pub fn is_occupied(self) -> bool {
        self != Cell::Empty
    }

    /// The concrete color this cell exposes to the matching engine, if any.
    pub fn concrete_color(self) -> Option<BubbleColor> {
        match self {
            Cell::Color(color) => Some(color),
            Cell::Special(SpecialKind::Chameleon(color)) => Some(color),
            _ => None,
        }
    }

    /// Whether this cell is a universal wildcard for flood-fill matching.
    pub fn is_wildcard(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Prism))
    }

    /// Cells that never start or propagate a color match.
    pub fn blocks_match(self) -> bool {
        matches!(
            self,
            Cell::Special(
                SpecialKind::Stone | SpecialKind::Anchor | SpecialKind::Slime | SpecialKind::Bomb
            )
        )
    }

    /// Whether a flood-fill match on `color` flows through this cell.
    pub fn matches_color(self, color: BubbleColor) -> bool {
        if self.blocks_match() {
            return false;
        }
        self.is_wildcard() || self.concrete_color() == Some(color)
    }

    /// Cells that survive bomb blasts and ice lances.
    pub fn ability_immune(self) -> bool {
        matches!(
            self,
            Cell::Special(
                SpecialKind::Stone
                    | SpecialKind::Anchor
                    | SpecialKind::Slime
                    | SpecialKind::Stop
                    | SpecialKind::Bomb
            )
        )
    }

    pub fn is_anchor(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Anchor))
    }

    pub fn is_bomb(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Bomb))
    }

    pub fn is_slime(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Slime))
    }

    pub fn is_stop(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Stop))
    }

    pub fn is_stone(self) -> bool {
        matches!(self, Cell::Special(SpecialKind::Stone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prism_matches_every_color() {
        let prism = Cell::Special(SpecialKind::Prism);
        for color in BubbleColor::ALL {
            assert!(prism.matches_color(color));
        }
    }

    #[test]
    fn blockers_never_match() {
        let blockers = [
            Cell::Special(SpecialKind::Stone),
            Cell::Special(SpecialKind::Anchor),
            Cell::Special(SpecialKind::Slime),
            Cell::Special(SpecialKind::Bomb),
        ];
        for cell in blockers {
            for color in BubbleColor::ALL {
                assert!(!cell.matches_color(color));
            }
        }
    }

    #[test]
    fn chameleon_matches_as_its_current_color() {
        let cell = Cell::Special(SpecialKind::Chameleon(BubbleColor::Blue));
        assert!(cell.matches_color(BubbleColor::Blue));
        assert!(!cell.matches_color(BubbleColor::Red));
    }

    #[test]
    fn stop_has_no_color_and_never_matches() {
        let stop = Cell::Special(SpecialKind::Stop);
        assert_eq!(stop.concrete_color(), None);
        for color in BubbleColor::ALL {
            assert!(!stop.matches_color(color));
        }
    }

    #[test]
    fn random_other_differs() {
        for color in BubbleColor::ALL {
            for _ in 0..20 {
                assert_ne!(color.random_other(), color);
            }
        }
    }
}
