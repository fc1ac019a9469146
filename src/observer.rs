//! A read-only watcher that redraws the table while dinner is in progress.
//!
//! The observer only loads the philosophers' atomics. It never touches a fork,
//! so a frame may be a few microseconds stale but can never hold anyone up.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::philosopher::State;
use crate::render::Render;
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatView {
    pub index: usize,
    pub state: State,
    pub has_left: bool,
    pub has_right: bool,
    pub meals: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSnapshot {
    pub seats: Vec<SeatView>,
}

impl TableSnapshot {
    pub fn eating(&self) -> usize {
        self.seats
            .iter()
            .filter(|seat| seat.state == State::Eating)
            .count()
    }

    pub fn forks_in_hand(&self) -> usize {
        self.seats
            .iter()
            .map(|seat| usize::from(seat.has_left) + usize::from(seat.has_right))
            .sum()
    }

    pub fn total_meals(&self) -> usize {
        self.seats.iter().map(|seat| seat.meals).sum()
    }
}

pub struct Observer<'a, R: Render> {
    table: &'a Table,
    running: &'a AtomicBool,
    renderer: R,
    poll: Duration,
}

impl<'a, R: Render> Observer<'a, R> {
    pub fn new(table: &'a Table, running: &'a AtomicBool, renderer: R, poll: Duration) -> Self {
        Self {
            table,
            running,
            renderer,
            poll,
        }
    }

    /// Renders frames until `running` is cleared, then renders the final table.
    /// Returns the number of frames drawn before the final one.
    pub fn watch(mut self) -> io::Result<usize> {
        let mut frames = 0;
        while self.running.load(Ordering::Acquire) {
            if let Err(err) = self.renderer.frame(&self.table.snapshot()) {
                warn!(%err, frames, "observer stopped: frame could not be drawn");
                return Err(err);
            }
            frames += 1;
            thread::sleep(self.poll);
        }

        self.renderer.finish(&self.table.snapshot())?;
        Ok(frames)
    }
}
