//! The round table: philosophers and forks in one arena, linked by index.

use crate::error::TableError;
use crate::fork::{Fork, ForkId};
use crate::observer::TableSnapshot;
use crate::philosopher::Philosopher;

#[derive(Debug)]
pub struct Table {
    philosophers: Vec<Philosopher>,
    forks: Vec<Fork>,
}

/// Fork assignment for a seat while the table is being laid.
#[derive(Debug, Default, Clone, Copy)]
struct Place {
    left: Option<ForkId>,
    right: Option<ForkId>,
}

impl Table {
    /// Seats `seats` philosophers in a ring with one fork between each pair.
    ///
    /// Seat `i` reuses its left neighbour's right fork and its right
    /// neighbour's left fork when those are already laid, and lays a new
    /// fork otherwise. This leaves exactly `seats` forks, with seat `i`'s
    /// right fork being seat `i + 1`'s left fork.
    pub fn new(seats: usize) -> Result<Self, TableError> {
        if seats < 2 {
            return Err(TableError::TooFewSeats { seats });
        }

        let mut places = vec![Place::default(); seats];
        let mut forks = Vec::with_capacity(seats);
        let mut philosophers = Vec::with_capacity(seats);

        for seat in 0..seats {
            let left_neighbour = (seat + seats - 1) % seats;
            let right_neighbour = (seat + 1) % seats;

            let left = match places[left_neighbour].right {
                Some(id) => id,
                None => lay_fork(&mut forks),
            };
            places[seat].left = Some(left);

            let right = match places[right_neighbour].left {
                Some(id) => id,
                None => lay_fork(&mut forks),
            };
            places[seat].right = Some(right);

            philosophers.push(Philosopher::new(seat, left, right));
        }

        Ok(Self {
            philosophers,
            forks,
        })
    }

    pub fn seats(&self) -> usize {
        self.philosophers.len()
    }

    pub fn philosophers(&self) -> &[Philosopher] {
        &self.philosophers
    }

    pub fn philosopher(&self, seat: usize) -> Option<&Philosopher> {
        self.philosophers.get(seat)
    }

    pub fn forks(&self) -> &[Fork] {
        &self.forks
    }

    pub fn fork(&self, id: ForkId) -> &Fork {
        &self.forks[id.0]
    }

    pub fn left_neighbour(&self, seat: usize) -> usize {
        (seat + self.seats() - 1) % self.seats()
    }

    pub fn right_neighbour(&self, seat: usize) -> usize {
        (seat + 1) % self.seats()
    }

    /// Reads every seat without touching any fork lock.
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            seats: self.philosophers.iter().map(Philosopher::view).collect(),
        }
    }

    pub fn total_meals(&self) -> usize {
        self.philosophers.iter().map(Philosopher::meals).sum()
    }
}

fn lay_fork(forks: &mut Vec<Fork>) -> ForkId {
    let id = ForkId(forks.len());
    forks.push(Fork::new(format!("Fork {}", forks.len() + 1)));
    id
}
