//! Frame-delayed board effects.
//!
//! Bomb chains and post-transform match checks resolve a few frames after
//! the action that queued them, so cascades read as a sequence instead of
//! one instantaneous wipe. An explicit queue drained at the top of the
//! frame replaces the original's scattered timers.

use bevy::prelude::*;

use crate::game::coords::GridCoord;

/// Frames between links of a cascade.
pub const CHAIN_DELAY_FRAMES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredEffect {
    /// Detonate the bomb at this cell (if it is still a bomb).
    BombBlast(GridCoord),
    /// Re-run match detection at this cell (if it still holds a color).
    MatchCheck(GridCoord),
}

#[derive(Resource, Debug, Default)]
pub struct PendingEffects {
    queue: Vec<(u32, DeferredEffect)>,
}

impl PendingEffects {
    pub fn schedule(&mut self, delay_frames: u32, effect: DeferredEffect) {
        self.queue.push((delay_frames, effect));
    }

    /// Tick every entry down one frame and return those that are due.
    pub fn drain_ready(&mut self) -> Vec<DeferredEffect> {
        let mut ready = Vec::new();
        self.queue.retain_mut(|(frames, effect)| {
            if *frames == 0 {
                ready.push(*effect);
                false
            } else {
                *frames -= 1;
                true
            }
        });
        ready
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effects_fire_after_their_delay() {
        let mut pending = PendingEffects::default();
        let blast = DeferredEffect::BombBlast(GridCoord::new(1, 1));
        pending.schedule(2, blast);
        assert!(pending.drain_ready().is_empty());
        assert!(pending.drain_ready().is_empty());
        assert_eq!(pending.drain_ready(), vec![blast]);
        assert!(pending.is_empty());
    }

    #[test]
    fn zero_delay_fires_on_the_next_drain() {
        let mut pending = PendingEffects::default();
        let check = DeferredEffect::MatchCheck(GridCoord::new(0, 0));
        pending.schedule(0, check);
        assert_eq!(pending.drain_ready(), vec![check]);
    }

    #[test]
    fn clear_drops_everything() {
        let mut pending = PendingEffects::default();
        pending.schedule(5, DeferredEffect::MatchCheck(GridCoord::new(0, 0)));
        pending.clear();
        assert!(pending.is_empty());
    }
}
