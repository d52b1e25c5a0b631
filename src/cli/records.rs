use anyhow::Result;
use ansi_term::Style;
use clap::Parser;

use crate::{
    engine::{record::Category, split::RecordFragment},
    report::RecordItem,
};

use super::{output, CliReporter};

#[derive(Debug, Parser)]
pub struct RecordsCommand {
    #[arg(
        long,
        short,
        default_value_t = 0,
        allow_negative_numbers = true,
        help = "How many days away from today. -1 is yesterday"
    )]
    offset: i32,
}

/// Prints records of a day in chronological order, untracked gaps included.
pub async fn process_records_command(
    reporter: &CliReporter,
    RecordsCommand { offset }: RecordsCommand,
) -> Result<()> {
    let prefs = reporter.preferences();
    let day = reporter.records_for_day(offset).await?;

    println!("{}", Style::new().bold().paint(&day.range.title));
    for item in &day.items {
        let name = match item {
            RecordItem::Fragment(fragment) => fragment_name(fragment, &day.categories),
            RecordItem::Untracked(_) => Style::new().dimmed().paint("Untracked").to_string(),
        };
        println!(
            "{}\t{}\t{}\t{}",
            output::format_instant(item.start(), prefs),
            output::format_instant(item.end(), prefs),
            output::duration(item.end() - item.start(), prefs),
            name
        );
    }
    Ok(())
}

fn fragment_name(fragment: &RecordFragment, categories: &[Category]) -> String {
    let name = categories
        .iter()
        .find(|v| v.id == fragment.category_id)
        .map(output::category_name)
        .unwrap_or_else(|| output::unknown_category(fragment.category_id));
    if fragment.is_running() {
        format!("{name} (running)")
    } else {
        name
    }
}
