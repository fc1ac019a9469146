//! Runs a whole dinner: one thread per philosopher plus an observer thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::DinnerConfig;
use crate::error::DinnerError;
use crate::observer::Observer;
use crate::philosopher::Philosopher;
use crate::probe::{DiningProbe, TracingProbe};
use crate::render::Render;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatReport {
    pub name: String,
    pub meals: usize,
    pub attempts: usize,
    pub left_busy: usize,
    pub right_busy: usize,
}

impl From<&Philosopher> for SeatReport {
    fn from(philosopher: &Philosopher) -> Self {
        let stats = philosopher.stats();
        Self {
            name: philosopher.name().to_string(),
            meals: philosopher.meals(),
            attempts: stats.attempts,
            left_busy: stats.left_busy,
            right_busy: stats.right_busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DinnerReport {
    pub seats: Vec<SeatReport>,
    pub frames: usize,
    pub elapsed: Duration,
}

impl DinnerReport {
    pub fn total_meals(&self) -> usize {
        self.seats.iter().map(|seat| seat.meals).sum()
    }

    pub fn total_attempts(&self) -> usize {
        self.seats.iter().map(|seat| seat.attempts).sum()
    }
}

impl fmt::Display for DinnerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seat in &self.seats {
            writeln!(
                f,
                "{}: {} meals in {} attempts (left fork busy {}, right fork busy {})",
                seat.name, seat.meals, seat.attempts, seat.left_busy, seat.right_busy
            )?;
        }
        write!(
            f,
            "{} meals served in {:.2?}, {} frames drawn",
            self.total_meals(),
            self.elapsed,
            self.frames
        )
    }
}

#[derive(Debug)]
pub struct Dinner {
    config: DinnerConfig,
    table: Table,
}

impl Dinner {
    pub fn new(config: DinnerConfig) -> Result<Self, DinnerError> {
        config.validate()?;
        let table = Table::new(config.seats)?;
        Ok(Self { config, table })
    }

    pub fn config(&self) -> &DinnerConfig {
        &self.config
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn serve<R: Render + Send>(&self, renderer: R) -> Result<DinnerReport, DinnerError> {
        self.serve_with(renderer, &TracingProbe)
    }

    /// Seats everybody, waits until all of them have eaten their meals, then
    /// stops the observer and lets it draw the final table.
    ///
    /// Philosophers who already finished in an earlier serving leave at once.
    pub fn serve_with<R: Render + Send>(
        &self,
        renderer: R,
        probe: &dyn DiningProbe,
    ) -> Result<DinnerReport, DinnerError> {
        let plan = self.config.meal_plan();
        let running = AtomicBool::new(true);
        let started = Instant::now();
        info!(
            seats = self.table.seats(),
            meals = plan.meals,
            already_eaten = self.table.total_meals(),
            "dinner time"
        );

        let frames = thread::scope(|s| -> Result<usize, DinnerError> {
            let observer = Observer::new(&self.table, &running, renderer, self.config.poll_interval());
            let watcher = thread::Builder::new()
                .name("observer".to_string())
                .spawn_scoped(s, move || observer.watch())
                .map_err(|err| DinnerError::spawn("observer", err))?;

            let mut outcome = Ok(());
            let mut diners = Vec::with_capacity(self.table.seats());
            for philosopher in self.table.philosophers() {
                let spawned = thread::Builder::new()
                    .name(philosopher.name().to_string())
                    .spawn_scoped(s, move || {
                        philosopher.dine(self.table.forks(), &plan, probe);
                        debug!(seat = philosopher.index(), "left the table");
                    });
                match spawned {
                    Ok(handle) => diners.push((philosopher, handle)),
                    Err(err) => {
                        outcome = Err(DinnerError::spawn(philosopher.name(), err));
                        break;
                    }
                }
            }

            for (philosopher, handle) in diners {
                if handle.join().is_err() && outcome.is_ok() {
                    outcome = Err(DinnerError::PhilosopherPanicked {
                        seat: philosopher.index(),
                        name: philosopher.name().to_string(),
                    });
                }
            }

            running.store(false, Ordering::Release);
            thread::sleep(self.config.grace_period());

            let frames = match watcher.join() {
                Ok(Ok(frames)) => Ok(frames),
                Ok(Err(err)) => Err(DinnerError::Render {
                    message: err.to_string(),
                }),
                Err(_) => Err(DinnerError::ObserverPanicked),
            };
            outcome?;
            frames
        })?;

        let report = DinnerReport {
            seats: self.table.philosophers().iter().map(SeatReport::from).collect(),
            frames,
            elapsed: started.elapsed(),
        };
        info!(
            meals = report.total_meals(),
            attempts = report.total_attempts(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "dinner is over"
        );
        Ok(report)
    }
}
