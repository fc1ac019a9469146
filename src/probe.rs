//! Hooks into the fork protocol.
//!
//! `picked_up` runs after the lock is taken and the held flag is set.
//! `putting_down` runs before the flag is cleared and the lock released. A
//! probe therefore always sees a fork as held by the seat it is told about.

use tracing::{debug, trace};

use crate::fork::ForkId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

pub trait DiningProbe: Sync {
    fn picked_up(&self, _seat: usize, _fork: ForkId, _side: Side) {}

    fn putting_down(&self, _seat: usize, _fork: ForkId, _side: Side) {}

    fn ate(&self, _seat: usize, _meal: usize) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProbe;

impl DiningProbe for NoProbe {}

/// Logs fork traffic at `trace` and finished meals at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProbe;

impl DiningProbe for TracingProbe {
    fn picked_up(&self, seat: usize, fork: ForkId, side: Side) {
        trace!(seat, %fork, ?side, "picked up fork");
    }

    fn putting_down(&self, seat: usize, fork: ForkId, side: Side) {
        trace!(seat, %fork, ?side, "putting down fork");
    }

    fn ate(&self, seat: usize, meal: usize) {
        debug!(seat, meal, "finished a meal");
    }
}
