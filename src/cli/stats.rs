use anyhow::Result;
use ansi_term::Style;
use clap::Parser;

use crate::{
    engine::aggregate::Bucket,
    utils::percentage::{duration_percentage, Percentage},
};

use super::{output, range::RangeSelection, CliReporter};

#[derive(Debug, Parser)]
pub struct StatsCommand {
    #[command(flatten)]
    selection: RangeSelection,
    #[arg(short = 'p', long = "min-percentage", help = "Hide categories below specified percentage", default_value_t = Percentage::default())]
    min_percentage: Percentage,
}

/// Prints per category totals of a range. Percentages are relative to the part of the range
/// before now.
pub async fn process_stats_command(
    reporter: &CliReporter,
    StatsCommand {
        selection,
        min_percentage,
    }: StatsCommand,
) -> Result<()> {
    let prefs = reporter.preferences();
    let (kind, offset) = selection.navigation(prefs, &reporter.now())?;
    let statistics = reporter.statistics(&kind, offset).await?;
    let aggregate = &statistics.aggregate;

    println!("{}", Style::new().bold().paint(&statistics.range.title));
    for (bucket, total) in &statistics.totals {
        let percentage = duration_percentage(total.duration, aggregate.accounted());
        if percentage < min_percentage {
            continue;
        }
        let records = match bucket {
            Bucket::Category(_) => total.fragments.to_string(),
            Bucket::Untracked => String::new(),
        };
        println!(
            "{}%\t{}\t{}\t{}",
            *percentage as i32,
            output::duration(total.duration, prefs),
            records,
            output::bucket_name(bucket, statistics.category(bucket))
        );
    }
    println!(
        "{}\t{}",
        Style::new().bold().paint("Tracked"),
        output::duration(aggregate.tracked(), prefs)
    );
    Ok(())
}
