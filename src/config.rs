use std::fs;
use std::path::Path;
use std::time::Duration;

use crossbeam::utils::Backoff;
use rand::Rng;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::philosopher::MealPlan;

pub const MAX_SEATS: usize = 256;
pub const MAX_MEALS: usize = 100_000;
const MAX_PAUSE_MS: u64 = 60_000;
const MAX_POLL_MS: u64 = 1_000;
const MAX_GRACE_MS: u64 = 10_000;
const MAX_JITTER_US: u64 = 1_000_000;

// =============================================================================
// Durations
// =============================================================================

/// Inclusive range of milliseconds a philosopher spends on something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MillisRange {
    pub min: u64,
    pub max: u64,
}

impl MillisRange {
    pub const ZERO: MillisRange = MillisRange { min: 0, max: 0 };

    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn pick(&self, rng: &mut impl Rng) -> Duration {
        if self.min >= self.max {
            return Duration::from_millis(self.min);
        }
        Duration::from_millis(rng.gen_range(self.min..=self.max))
    }

    /// Sleeps for a random duration within the range; zero does not sleep.
    pub fn pause(&self, rng: &mut impl Rng) {
        let duration = self.pick(rng);
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }

    fn validate(&self, field: &str, limit: u64) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::invalid_range(field, self.min, self.max));
        }
        if self.max > limit {
            return Err(ConfigError::out_of_range(format!("{field}.max"), self.max, 0, limit));
        }
        Ok(())
    }
}

// =============================================================================
// Retry policy
// =============================================================================

/// What a philosopher does after failing to pick up both forks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    /// Retry immediately.
    Spin,
    /// Exponential spin then yield, reset after every meal.
    #[default]
    Backoff,
    /// Sleep a random number of microseconds in `0..=max_us`.
    Jitter { max_us: u64 },
}

impl RetryPolicy {
    pub fn wait(&self, backoff: &Backoff, rng: &mut impl Rng) {
        match *self {
            RetryPolicy::Spin => std::hint::spin_loop(),
            RetryPolicy::Backoff => backoff.snooze(),
            RetryPolicy::Jitter { max_us } => {
                let micros = rng.gen_range(0..=max_us);
                if micros > 0 {
                    std::thread::sleep(Duration::from_micros(micros));
                } else {
                    std::thread::yield_now();
                }
            }
        }
    }
}

// =============================================================================
// Dinner configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DinnerConfig {
    pub seats: usize,
    pub meals: usize,
    pub eat_ms: MillisRange,
    pub think_ms: MillisRange,
    pub retry: RetryPolicy,
    pub poll_ms: u64,
    pub grace_ms: u64,
}

impl Default for DinnerConfig {
    fn default() -> Self {
        Self {
            seats: 5,
            meals: 5,
            eat_ms: MillisRange::new(10, 1000),
            think_ms: MillisRange::ZERO,
            retry: RetryPolicy::default(),
            poll_ms: 15,
            grace_ms: 250,
        }
    }
}

impl DinnerConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DinnerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_SEATS).contains(&self.seats) {
            return Err(ConfigError::out_of_range(
                "seats",
                self.seats as u64,
                2,
                MAX_SEATS as u64,
            ));
        }
        if !(1..=MAX_MEALS).contains(&self.meals) {
            return Err(ConfigError::out_of_range(
                "meals",
                self.meals as u64,
                1,
                MAX_MEALS as u64,
            ));
        }
        self.eat_ms.validate("eat_ms", MAX_PAUSE_MS)?;
        self.think_ms.validate("think_ms", MAX_PAUSE_MS)?;
        if let RetryPolicy::Jitter { max_us } = self.retry {
            if max_us > MAX_JITTER_US {
                return Err(ConfigError::out_of_range("retry.jitter.max_us", max_us, 0, MAX_JITTER_US));
            }
        }
        if !(1..=MAX_POLL_MS).contains(&self.poll_ms) {
            return Err(ConfigError::out_of_range("poll_ms", self.poll_ms, 1, MAX_POLL_MS));
        }
        if self.grace_ms > MAX_GRACE_MS {
            return Err(ConfigError::out_of_range("grace_ms", self.grace_ms, 0, MAX_GRACE_MS));
        }
        Ok(())
    }

    pub fn meal_plan(&self) -> MealPlan {
        MealPlan {
            meals: self.meals,
            eat: self.eat_ms,
            think: self.think_ms,
            retry: self.retry,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}
