mod commands;
mod input;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use calgrid_core::config::Settings;
use calgrid_core::error::CalGridResult;
use calgrid_core::recurrence::Preset;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calgrid")]
#[command(version, about = "Lay out calendar events and expand recurrence rules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lay out each day's timed events into columns
    Day {
        /// Events file (.ics or .json)
        file: PathBuf,

        /// First day to show (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// Number of days to show
        #[arg(short = 'n', long)]
        days: Option<u32>,

        /// Only lay out this hour slot of each day (0-23)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
        hour: Option<u32>,

        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a month grid with each day's first events
    Month {
        /// Events file (.ics or .json)
        file: PathBuf,

        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// List the occurrences of a recurrence rule
    Expand {
        /// Rule string (e.g. "RRULE:FREQ=WEEKLY;BYDAY=MO,WE")
        #[arg(required_unless_present = "preset")]
        rule: Option<String>,

        /// Use a named preset instead of a rule string
        #[arg(short, long, conflicts_with = "rule")]
        preset: Option<Preset>,

        /// First occurrence (e.g. "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        /// Maximum number of occurrences (capped at 1000)
        #[arg(short, long)]
        max: Option<usize>,

        /// Skip occurrences on this date (YYYY-MM-DD), repeatable
        #[arg(long = "exdate")]
        exdates: Vec<String>,
    },
    /// Describe a recurrence rule in plain English
    Describe {
        /// Rule string (e.g. "RRULE:FREQ=MONTHLY;COUNT=5")
        #[arg(required_unless_present = "preset")]
        rule: Option<String>,

        /// Use a named preset instead of a rule string
        #[arg(short, long, conflicts_with = "rule")]
        preset: Option<Preset>,
    },
    /// Show the config file path and the effective settings
    Config {
        /// Write a commented default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = Settings::load();
    let settings = settings_or_default(&loaded);
    init_logging(&settings.logging.level);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "Failed to load settings, using defaults");
    }

    match cli.command {
        Commands::Day {
            file,
            date,
            days,
            hour,
            json,
        } => commands::day::run(&settings, &file, date.as_deref(), days, hour, json),
        Commands::Month { file, month } => commands::month::run(&settings, &file, month.as_deref()),
        Commands::Expand {
            rule,
            preset,
            start,
            max,
            exdates,
        } => {
            let pattern = commands::resolve_pattern(rule.as_deref(), preset)?;
            commands::expand::run(&settings, &pattern, &start, max, &exdates)
        }
        Commands::Describe { rule, preset } => {
            let pattern = commands::resolve_pattern(rule.as_deref(), preset)?;
            commands::describe::run(&pattern)
        }
        Commands::Config { init } => commands::config::run(&settings, init),
    }
}

/// The loaded settings, or the defaults when there is no usable config
/// (e.g. no config directory on this platform).
fn settings_or_default(loaded: &CalGridResult<Settings>) -> Settings {
    loaded.as_ref().cloned().unwrap_or_default()
}

/// Log to stderr. RUST_LOG wins over the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
