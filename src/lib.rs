//! Dining philosophers around a ring of try-lock forks.
//!
//! Every philosopher runs on its own thread and only ever *tries* to take a
//! fork. Whoever gets the left fork but not the right one puts the left fork
//! straight back, so nobody sits on one fork waiting for another and the ring
//! can never deadlock. An observer thread redraws the table from the
//! philosophers' atomic flags without taking any fork itself.

pub mod config;
pub mod dinner;
pub mod error;
pub mod fork;
pub mod observer;
pub mod philosopher;
pub mod probe;
pub mod render;
pub mod table;

pub use config::{DinnerConfig, MillisRange, RetryPolicy};
pub use dinner::{Dinner, DinnerReport, SeatReport};
pub use error::{ConfigError, DinnerError, TableError};
pub use fork::{Fork, ForkId};
pub use observer::{Observer, SeatView, TableSnapshot};
pub use philosopher::{DiningStats, MealPlan, Philosopher, State};
pub use probe::{DiningProbe, NoProbe, Side, TracingProbe};
pub use render::{Render, Silent, TableArt};
pub use table::Table;
