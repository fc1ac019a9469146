use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("a ring needs at least 2 seats, got {seats}")]
    TooFewSeats { seats: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to parse config: {message}")]
    Parse { message: String },

    #[error("Value {value} for field '{field}' is out of range (min: {min}, max: {max})")]
    OutOfRange {
        field: String,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("Invalid range for field '{field}': min {min} is greater than max {max}")]
    InvalidRange { field: String, min: u64, max: u64 },
}

impl ConfigError {
    pub fn out_of_range(field: impl Into<String>, value: u64, min: u64, max: u64) -> Self {
        Self::OutOfRange {
            field: field.into(),
            value,
            min,
            max,
        }
    }

    pub fn invalid_range(field: impl Into<String>, min: u64, max: u64) -> Self {
        Self::InvalidRange {
            field: field.into(),
            min,
            max,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse {
            message: err.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DinnerError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to spawn thread '{name}': {message}")]
    Spawn { name: String, message: String },

    #[error("{name} (seat {seat}) panicked while dining")]
    PhilosopherPanicked { seat: usize, name: String },

    #[error("the table observer panicked")]
    ObserverPanicked,

    #[error("Failed to render the table: {message}")]
    Render { message: String },
}

impl DinnerError {
    pub fn spawn(name: impl Into<String>, err: std::io::Error) -> Self {
        Self::Spawn {
            name: name.into(),
            message: err.to_string(),
        }
    }
}
