pub mod output;
pub mod range;
pub mod records;
pub mod stats;

use std::path::PathBuf;

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use range::{process_range_command, RangeCommand};
use records::{process_records_command, RecordsCommand};
use stats::{process_stats_command, StatsCommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    engine::prefs::{CardOrder, DayOfWeek, Preferences, StartOfDayShift, PREFERENCES_FILE},
    report::Reporter,
    storage::record_storage::RecordStorageImpl,
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Tracktime", version, long_about = None)]
#[command(about = "Summaries of tracked activities over days, weeks, months and years", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[command(flatten)]
    preferences: PreferenceArgs,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show the boundaries of a range")]
    Range {
        #[command(flatten)]
        command: RangeCommand,
    },
    #[command(about = "Show time spent per category inside a range")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(about = "Show records of a single day")]
    Records {
        #[command(flatten)]
        command: RecordsCommand,
    },
    #[command(about = "Show the default range used for exports")]
    ExportRange {
        #[arg(long, default_value_t = 7, help = "Number of days including today")]
        days: u32,
    },
}

/// Overrides of the stored preferences for a single invocation.
#[derive(Debug, Clone, clap::Args)]
struct PreferenceArgs {
    #[arg(long, global = true, help = "First day of the week")]
    first_day: Option<DayOfWeek>,
    #[arg(
        long,
        global = true,
        allow_negative_numbers = true,
        help = "Shift of the day start from midnight in minutes. -60 starts days at 23:00"
    )]
    shift_minutes: Option<i64>,
    #[arg(long, global = true, help = "Show durations as fractional hours")]
    proportional: bool,
    #[arg(long, global = true, help = "Use 12 hour clock")]
    twelve_hour: bool,
    #[arg(long, global = true, help = "Don't count untracked time")]
    hide_untracked: bool,
    #[arg(long, global = true, help = "Order of categories")]
    order: Option<CardOrder>,
}

impl PreferenceArgs {
    fn apply(self, mut prefs: Preferences) -> Result<Preferences> {
        if let Some(first_day) = self.first_day {
            prefs = prefs.with_first_day_of_week(first_day);
        }
        if let Some(minutes) = self.shift_minutes {
            let millis = minutes
                .checked_mul(60_000)
                .ok_or_else(|| anyhow::anyhow!("Shift of {minutes} minutes is too large"))?;
            prefs = prefs.with_shift(StartOfDayShift::from_millis(millis)?);
        }
        if let Some(order) = self.order {
            prefs.card_order = order;
        }
        prefs.use_proportional_minutes |= self.proportional;
        prefs.use_military_time &= !self.twelve_hour;
        prefs.show_untracked &= !self.hide_untracked;
        prefs.validate()?;
        Ok(prefs)
    }
}

pub type CliReporter = Reporter<RecordStorageImpl, Local>;

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(CLI_PREFIX, &dir, logging_level, args.log)?;

    let prefs = args.preferences.apply(Preferences::load(&dir.join(PREFERENCES_FILE))?)?;
    debug!("Running with preferences {prefs:?}");

    let reporter = Reporter::new(
        RecordStorageImpl::new(dir.join("records"))?,
        Box::new(DefaultClock),
        Local,
        prefs,
    );

    match args.commands {
        Commands::Range { command } => process_range_command(&reporter, command).await,
        Commands::Stats { command } => process_stats_command(&reporter, command).await,
        Commands::Records { command } => process_records_command(&reporter, command).await,
        Commands::ExportRange { days } => {
            let range = reporter.export_range(days)?;
            output::print_range(&range, reporter.preferences());
            Ok(())
        }
    }
}
