use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use dining_philosophers::{Dinner, DinnerConfig, MillisRange, RetryPolicy, Silent, TableArt};

#[derive(Parser)]
#[command(name = "dinner")]
#[command(version)]
#[command(about = "Dining philosophers sharing try-lock forks around a round table")]
struct Cli {
    /// TOML file with dinner settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of philosophers (and forks)
    #[arg(long)]
    seats: Option<usize>,

    /// Meals each philosopher eats before leaving
    #[arg(long)]
    meals: Option<usize>,

    /// Shortest meal in milliseconds
    #[arg(long)]
    min_eat_ms: Option<u64>,

    /// Longest meal in milliseconds
    #[arg(long)]
    max_eat_ms: Option<u64>,

    /// What to do after failing to get both forks
    #[arg(long, value_enum)]
    retry: Option<Retry>,

    /// Upper bound of the random sleep used by `--retry jitter`
    #[arg(long, default_value = "200")]
    jitter_us: u64,

    /// Do not draw the table
    #[arg(short, long)]
    quiet: bool,

    /// Draw the table without colours
    #[arg(long)]
    plain: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pause: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Retry {
    Spin,
    Backoff,
    Jitter,
}

impl Cli {
    fn dinner_config(&self) -> Result<DinnerConfig> {
        let mut config = match &self.config {
            Some(path) => DinnerConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => DinnerConfig::default(),
        };

        if let Some(seats) = self.seats {
            config.seats = seats;
        }
        if let Some(meals) = self.meals {
            config.meals = meals;
        }
        if self.min_eat_ms.is_some() || self.max_eat_ms.is_some() {
            config.eat_ms = MillisRange::new(
                self.min_eat_ms.unwrap_or(config.eat_ms.min),
                self.max_eat_ms.unwrap_or(config.eat_ms.max),
            );
        }
        if let Some(retry) = self.retry {
            config.retry = match retry {
                Retry::Spin => RetryPolicy::Spin,
                Retry::Backoff => RetryPolicy::Backoff,
                Retry::Jitter => RetryPolicy::Jitter {
                    max_us: self.jitter_us,
                },
            };
        }

        config.validate().context("invalid dinner settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = cli.dinner_config()?;
    let dinner = Dinner::new(config).context("failed to lay the table")?;

    println!("{}", "Dinner Time!".bold());
    println!(
        "{} philosophers, {} meals each",
        dinner.config().seats,
        dinner.config().meals
    );
    let served = if cli.quiet {
        dinner.serve(Silent)
    } else if cli.plain {
        dinner.serve(TableArt::plain(io::stdout()))
    } else {
        dinner.serve(TableArt::new(io::stdout()))
    };
    let report = served.context("dinner was interrupted")?;

    println!("{}", "Dinner is over!".green());
    println!("Bed time fellas!");
    println!();
    println!("{report}");

    if cli.pause {
        println!("Press Enter to leave the table.");
        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read from stdin")?;
    }

    Ok(())
}
