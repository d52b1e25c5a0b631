//! Plain text rendering shared by the commands. Columns are separated with tabs so the output
//! can be piped into other tools.

use ansi_term::{Colour, Style};
use chrono::{DateTime, Local, Utc};

use crate::engine::{
    aggregate::Bucket,
    duration::{format_duration, format_time_of_day, DurationUnits},
    prefs::Preferences,
    range::ResolvedRange,
    record::{Category, CategoryId},
};

const PALETTE: [Colour; 6] = [
    Colour::Red,
    Colour::Green,
    Colour::Yellow,
    Colour::Blue,
    Colour::Purple,
    Colour::Cyan,
];

pub fn format_instant(instant: DateTime<Utc>, prefs: &Preferences) -> String {
    let local = instant.with_timezone(&Local);
    format!(
        "{} {}",
        local.format("%Y-%m-%d"),
        format_time_of_day(&local, prefs.use_military_time)
    )
}

pub fn duration(value: chrono::Duration, prefs: &Preferences) -> String {
    format_duration(
        value,
        prefs.use_proportional_minutes,
        &DurationUnits::default(),
    )
}

pub fn print_range(range: &ResolvedRange, prefs: &Preferences) {
    println!("{}", Style::new().bold().paint(&range.title));
    println!(
        "{}\t{}",
        format_instant(range.start(), prefs),
        format_instant(range.end(), prefs)
    );
}

/// Name of a bucket, coloured by the category color.
pub fn bucket_name(bucket: &Bucket, category: Option<&Category>) -> String {
    match (bucket, category) {
        (Bucket::Untracked, _) => Style::new().dimmed().paint("Untracked").to_string(),
        (Bucket::Category(_), Some(category)) => category_name(category),
        (Bucket::Category(id), None) => unknown_category(*id),
    }
}

pub fn category_name(category: &Category) -> String {
    PALETTE[category.color as usize % PALETTE.len()]
        .paint(&category.name)
        .to_string()
}

pub fn unknown_category(id: CategoryId) -> String {
    format!("Category {id}")
}
