//! The upcoming-shot queue with board-aware color draws.

use std::collections::VecDeque;

use bevy::prelude::*;
use rand::Rng;

use crate::game::cell::BubbleColor;

/// Shots visible ahead of the loaded one.
pub const QUEUE_LEN: usize = 2;
/// Draws remembered for run suppression.
const HISTORY_LEN: usize = 3;
/// Chance a draw comes from the colors still on the board.
const BOARD_BIAS: f64 = 0.7;
const MAX_RESAMPLES: usize = 16;

/// Colors queued up behind the loaded shot.
///
/// Draws favor colors still on the board and refuse to hand the player
/// three of the same color in a row.
#[derive(Resource, Debug, Default)]
pub struct NextQueue {
    upcoming: VecDeque<BubbleColor>,
    recent: VecDeque<BubbleColor>,
}

impl NextQueue {
    /// Top up the queue to [`QUEUE_LEN`] entries.
    pub fn refill(&mut self, board_colors: &[BubbleColor]) {
        while self.upcoming.len() < QUEUE_LEN {
            let color = self.draw(board_colors);
            self.record(color);
            self.upcoming.push_back(color);
        }
    }

    /// Pop the next color to load and draw a replacement.
    pub fn advance(&mut self, board_colors: &[BubbleColor]) -> BubbleColor {
        self.refill(board_colors);
        let next = self.upcoming.pop_front().unwrap_or_else(BubbleColor::random);
        self.refill(board_colors);
        next
    }

    /// The queued colors, front first.
    pub fn peek(&self) -> impl Iterator<Item = BubbleColor> + '_ {
        self.upcoming.iter().copied()
    }

    pub fn reset(&mut self) {
        self.upcoming.clear();
        self.recent.clear();
    }

    fn record(&mut self, color: BubbleColor) {
        self.recent.push_back(color);
        while self.recent.len() > HISTORY_LEN {
            self.recent.pop_front();
        }
    }

    fn would_run_of_three(&self, color: BubbleColor) -> bool {
        let mut iter = self.recent.iter().rev();
        iter.next() == Some(&color) && iter.next() == Some(&color)
    }

    fn draw(&self, board_colors: &[BubbleColor]) -> BubbleColor {
        let mut rng = rand::rng();
        for _ in 0..MAX_RESAMPLES {
            let color = if !board_colors.is_empty() && rng.random_bool(BOARD_BIAS) {
                board_colors[rng.random_range(0..board_colors.len())]
            } else {
                BubbleColor::random()
            };
            if !self.would_run_of_three(color) {
                return color;
            }
        }
        // Resampling can only stall when the last two draws agree, so any
        // other color breaks the run.
        match self.recent.back() {
            Some(last) => last.random_other(),
            None => BubbleColor::random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_keeps_the_queue_full() {
        let mut queue = NextQueue::default();
        queue.refill(&[]);
        assert_eq!(queue.peek().count(), QUEUE_LEN);
        queue.advance(&[]);
        assert_eq!(queue.peek().count(), QUEUE_LEN);
    }

    #[test]
    fn never_hands_out_three_in_a_row() {
        let mut queue = NextQueue::default();
        let board = [BubbleColor::Red, BubbleColor::Blue];
        let mut last_two = (None, None);
        for _ in 0..1000 {
            let color = queue.advance(&board);
            assert!(
                !(last_two.0 == Some(color) && last_two.1 == Some(color)),
                "three {color:?} in a row"
            );
            last_two = (last_two.1, Some(color));
        }
    }

    #[test]
    fn single_board_color_still_terminates() {
        let mut queue = NextQueue::default();
        for _ in 0..100 {
            queue.advance(&[BubbleColor::Magenta]);
        }
    }

    #[test]
    fn reset_forgets_history() {
        let mut queue = NextQueue::default();
        queue.advance(&[]);
        queue.reset();
        assert_eq!(queue.peek().count(), 0);
    }
}
