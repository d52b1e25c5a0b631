use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Days, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    engine::{
        calendar::shifted_day_start,
        prefs::Preferences,
        range::{Interval, RangeKind},
    },
    navigation::{range_selector_items, RangeNavigation},
};

use super::{output, Args, CliReporter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RangeKindArg {
    Day,
    Week,
    Month,
    Year,
    Overall,
    Custom,
}

/// Arguments selecting a range. Shared by every command that works on a range.
#[derive(Debug, Clone, clap::Args)]
pub struct RangeSelection {
    #[arg(value_enum, default_value_t = RangeKindArg::Day, help = "Kind of range")]
    kind: RangeKindArg,
    #[arg(
        long,
        short,
        default_value_t = 0,
        allow_negative_numbers = true,
        conflicts_with = "date",
        help = "How many ranges away from the current one. -1 is the previous one"
    )]
    offset: i32,
    #[arg(
        long,
        help = "Jump to the range containing this date. Examples are \"yesterday\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(
        long = "start",
        short,
        help = "Start of a custom range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of a custom range. Examples are \"yesterday\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long = "days",
        default_value_t = false,
        help = "Take custom bounds as whole days. If start and end are both 15/03/2025 this selects the whole day"
    )]
    treat_as_days: bool,
}

impl RangeSelection {
    /// Range kind and navigation offset described by the arguments.
    pub fn navigation(&self, prefs: &Preferences, now: &DateTime<Local>) -> Result<(RangeKind, i32)> {
        let date_style = self.date_style;
        let kind = match self.kind {
            RangeKindArg::Day => RangeKind::Day,
            RangeKindArg::Week => RangeKind::Week,
            RangeKindArg::Month => RangeKind::Month,
            RangeKindArg::Year => RangeKind::Year,
            RangeKindArg::Overall => RangeKind::Overall,
            RangeKindArg::Custom => RangeKind::Custom(self.custom_interval(prefs, now)?),
        };
        if self.kind != RangeKindArg::Custom
            && (self.start_date.is_some() || self.end_date.is_some())
        {
            return Err(validation_error("--start and --end are only used with custom ranges"));
        }

        match &self.date {
            Some(date) => {
                let target = parse_date(date, now, date_style, "date")?;
                let navigation = RangeNavigation::new(kind).jump_to(&target, prefs, now)?;
                Ok((*navigation.kind(), navigation.position()))
            }
            // Offsets mean nothing for overall and custom ranges
            None if !kind.is_navigable() => Ok((kind, 0)),
            None => Ok((kind, self.offset)),
        }
    }

    fn custom_interval(
        &self,
        prefs: &Preferences,
        now: &DateTime<Local>,
    ) -> Result<Interval> {
        let (Some(start), Some(end)) = (&self.start_date, &self.end_date) else {
            return Err(validation_error("Custom ranges need both --start and --end"));
        };
        let mut start = parse_date(start, now, self.date_style, "start")?.to_utc();
        let mut end = parse_date(end, now, self.date_style, "end")?.to_utc();
        if self.treat_as_days {
            let shift = prefs.shift();
            let first = start.with_timezone(&Local).date_naive();
            let last = end
                .with_timezone(&Local)
                .date_naive()
                .checked_add_days(Days::new(1))
                .ok_or_else(|| validation_error("End date is too far in the future"))?;
            start = shifted_day_start(&Local, first, shift)?;
            end = shifted_day_start(&Local, last, shift)?;
        }
        Interval::new(start, end)
            .map_err(|e| validation_error(&format!("Failed to validate custom range {e}")))
    }
}

fn parse_date(
    value: &str,
    now: &DateTime<Local>,
    date_style: DateStyle,
    name: &str,
) -> Result<DateTime<Local>> {
    parse_date_string(value, *now, date_style.into())
        .map(|v| v.with_timezone(&Local))
        .map_err(|e| validation_error(&format!("Failed to validate {name} date {e}")))
}

fn validation_error(message: &str) -> anyhow::Error {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, message)
        .into()
}

#[derive(Debug, Parser)]
pub struct RangeCommand {
    #[command(flatten)]
    selection: RangeSelection,
    #[arg(long, help = "Also list the entries of the range selector")]
    selector: bool,
}

/// Prints the boundaries and the title of the selected range.
pub async fn process_range_command(
    reporter: &CliReporter,
    RangeCommand {
        selection,
        selector,
    }: RangeCommand,
) -> Result<()> {
    let prefs = reporter.preferences();
    let (kind, offset) = selection.navigation(prefs, &reporter.now())?;
    let range = reporter.range(&kind, offset).await?;
    output::print_range(&range, prefs);

    if selector {
        println!();
        for item in range_selector_items(&kind) {
            println!("{}", item.label(&kind));
        }
    }
    Ok(())
}
