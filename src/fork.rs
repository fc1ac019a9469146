//! A fork is a single try-lock shared by two neighbouring philosophers.
//!
//! The lock word stores `seat + 1` of the current holder, or `0` when the fork
//! is on the table. Taking it is one compare-and-swap; nobody ever waits on it.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

const ON_TABLE: usize = 0;

/// Index of a fork in the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForkId(pub usize);

impl fmt::Display for ForkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub struct Fork {
    label: String,
    owner: AtomicUsize,
}

impl Fork {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            owner: AtomicUsize::new(ON_TABLE),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Takes the fork for `seat` if it is on the table. Never blocks.
    pub fn try_acquire(&self, seat: usize) -> bool {
        self.owner
            .compare_exchange(ON_TABLE, seat + 1, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Puts the fork back on the table.
    ///
    /// # Panics
    ///
    /// Panics if `seat` is not the current holder. The dining protocol never
    /// releases a fork it did not take, so this is always a bug.
    pub fn release(&self, seat: usize) {
        let released =
            self.owner
                .compare_exchange(seat + 1, ON_TABLE, Ordering::Release, Ordering::Relaxed);
        match released {
            Ok(_) => {}
            Err(ON_TABLE) => panic!("{} released by seat {seat} but it was on the table", self.label),
            Err(owner) => panic!(
                "{} released by seat {seat} but it is held by seat {}",
                self.label,
                owner - 1
            ),
        }
    }

    /// Seat currently holding the fork.
    pub fn holder(&self) -> Option<usize> {
        match self.owner.load(Ordering::Acquire) {
            ON_TABLE => None,
            owner => Some(owner - 1),
        }
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let fork = Fork::new("Fork 1");
        assert!(!fork.is_held());

        assert!(fork.try_acquire(3));
        assert_eq!(fork.holder(), Some(3));

        fork.release(3);
        assert_eq!(fork.holder(), None);
    }

    #[test]
    fn test_second_acquire_fails_without_blocking() {
        let fork = Fork::new("Fork 1");
        assert!(fork.try_acquire(0));
        assert!(!fork.try_acquire(1));
        assert!(!fork.try_acquire(0));
        assert_eq!(fork.holder(), Some(0));
    }

    #[test]
    fn test_seat_zero_is_distinct_from_on_table() {
        let fork = Fork::new("Fork 1");
        assert!(fork.try_acquire(0));
        assert!(fork.is_held());
        fork.release(0);
        assert!(fork.try_acquire(0));
    }

    #[test]
    #[should_panic(expected = "was on the table")]
    fn test_release_without_holding_panics() {
        let fork = Fork::new("Fork 2");
        fork.release(1);
    }

    #[test]
    #[should_panic(expected = "held by seat 0")]
    fn test_release_by_other_seat_panics() {
        let fork = Fork::new("Fork 2");
        assert!(fork.try_acquire(0));
        fork.release(1);
    }

    #[test]
    fn test_only_one_contender_wins() {
        let fork = Fork::new("Fork 1");
        let wins = AtomicUsize::new(0);

        thread::scope(|s| {
            for seat in 0..8 {
                let fork = &fork;
                let wins = &wins;
                s.spawn(move || {
                    if fork.try_acquire(seat) {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(wins.load(Ordering::SeqCst), 1);
        assert!(fork.is_held());
    }

    #[test]
    fn test_display_uses_label() {
        assert_eq!(Fork::new("Fork 4").to_string(), "Fork 4");
        assert_eq!(ForkId(2).to_string(), "#2");
    }
}
