use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use schedule_engine::{
    location_view, parse_anchor_date, resolve_window_with_filter, week_view, Clock, FixedClock,
    RuleSnapshot, SystemClock, WeekStartDay,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schedule",
    version,
    about = "Resolve recurring weekday schedules from a rule snapshot"
)]
struct Cli {
    /// Rule snapshot JSON file (use "-" for stdin)
    #[arg(short, long)]
    snapshot: PathBuf,

    /// Pin "today" to this date (YYYY-MM-DD) instead of reading the clock
    #[arg(long)]
    today: Option<String>,

    /// IANA timezone used to determine "today"
    #[arg(long, default_value = "UTC")]
    timezone: String,

    /// Which weekday the snapshot numbers as 0
    #[arg(long, value_enum, default_value_t = WeekStart::Sunday)]
    week_start: WeekStart,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Site-wide 7-day week page
    Week {
        /// Weeks ahead of the current week; negative values show the current week
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,
    },
    /// Next 14 days of one location, first open slot per day
    Location {
        /// Location id
        #[arg(long)]
        location: u64,
    },
    /// Resolve an arbitrary window
    Resolve {
        /// First date of the window (YYYY-MM-DD)
        #[arg(long)]
        anchor: String,

        /// Number of days to resolve
        #[arg(long, allow_negative_numbers = true)]
        days: i64,

        /// Only rules owned by this group
        #[arg(long)]
        owner: Option<u64>,

        /// Only rules linked to this location
        #[arg(long)]
        location: Option<u64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WeekStart {
    Sunday,
    Monday,
}

impl From<WeekStart> for WeekStartDay {
    fn from(value: WeekStart) -> Self {
        match value {
            WeekStart::Sunday => WeekStartDay::Sunday,
            WeekStart::Monday => WeekStartDay::Monday,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let snapshot = load_snapshot(&cli.snapshot, cli.week_start.into())?;
    let clock = build_clock(cli.today.as_deref(), &cli.timezone)?;

    let output = match cli.command {
        Command::Week { offset } => {
            let view = week_view(&snapshot, clock.as_ref(), offset)
                .context("Failed to resolve week view")?;
            serde_json::to_string_pretty(&view)?
        }
        Command::Location { location } => {
            let days = location_view(&snapshot, clock.as_ref(), location)
                .context("Failed to resolve location view")?;
            serde_json::to_string_pretty(&days)?
        }
        Command::Resolve {
            anchor,
            days,
            owner,
            location,
        } => {
            let anchor = parse_anchor_date(&anchor)?;
            let resolved = resolve_window_with_filter(&snapshot, anchor, days, |rule| {
                owner.is_none_or(|id| rule.owner_group.as_ref().is_some_and(|g| g.id == id))
                    && location.is_none_or(|id| rule.location_id == Some(id))
            })
            .context("Failed to resolve window")?;
            serde_json::to_string_pretty(&resolved)?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_snapshot(path: &Path, week_start: WeekStartDay) -> Result<RuleSnapshot> {
    let json = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read snapshot from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?
    };

    let snapshot = RuleSnapshot::from_json_with_week_start(&json, week_start)
        .context("Failed to load rule snapshot")?;
    tracing::info!(rules = snapshot.rule_count(), "Loaded rule snapshot");
    Ok(snapshot)
}

fn build_clock(today: Option<&str>, timezone: &str) -> Result<Box<dyn Clock>> {
    match today {
        Some(date) => Ok(Box::new(FixedClock(
            parse_anchor_date(date).context("Invalid --today")?,
        ))),
        None => Ok(Box::new(SystemClock::from_name(timezone)?)),
    }
}
