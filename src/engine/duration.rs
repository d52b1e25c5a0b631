use chrono::{DateTime, Duration, NaiveTime, TimeZone};

use super::prefs::StartOfDayShift;

/// Unit suffixes. They come from the localization layer, the formatter only decides which units
/// are shown and their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationUnits {
    pub hour: String,
    pub minute: String,
    pub second: String,
}

impl Default for DurationUnits {
    fn default() -> Self {
        Self {
            hour: "h".into(),
            minute: "m".into(),
            second: "s".into(),
        }
    }
}

const MILLIS_IN_SECOND: i64 = 1000;
const MILLIS_IN_MINUTE: i64 = 60 * MILLIS_IN_SECOND;
const MILLIS_IN_HOUR: i64 = 60 * MILLIS_IN_MINUTE;

/// Integer division rounding halves up. Only used with non-negative values and positive
/// divisors. Never overflows.
fn div_round(value: i64, divisor: i64) -> i64 {
    value / divisor + i64::from(value % divisor >= divisor - divisor / 2)
}

/// Formats a duration for display.
///
/// By default durations of an hour or more show hours and minutes ("1h 15m"), shorter ones
/// minutes and seconds ("4m 5s"), and anything under a minute only seconds. The smallest shown
/// unit is rounded. With `use_proportional_minutes` the duration is shown as fractional hours
/// with two digits ("1.25h").
pub fn format_duration(
    duration: Duration,
    use_proportional_minutes: bool,
    units: &DurationUnits,
) -> String {
    let millis = duration.num_milliseconds();
    let sign = if millis < 0 { "-" } else { "" };
    let millis = millis.saturating_abs();

    if use_proportional_minutes {
        let hundredths = div_round(millis, MILLIS_IN_HOUR / 100);
        return format!(
            "{sign}{}.{:02}{}",
            hundredths / 100,
            hundredths % 100,
            units.hour
        );
    }

    let seconds = div_round(millis, MILLIS_IN_SECOND);
    if seconds >= 60 * 60 {
        let minutes = div_round(millis, MILLIS_IN_MINUTE);
        format!(
            "{sign}{}{} {}{}",
            minutes / 60,
            units.hour,
            minutes % 60,
            units.minute
        )
    } else if seconds >= 60 {
        format!(
            "{sign}{}{} {}{}",
            seconds / 60,
            units.minute,
            seconds % 60,
            units.second
        )
    } else {
        format!("{sign}{seconds}{}", units.second)
    }
}

fn time_format(use_military_time: bool) -> &'static str {
    if use_military_time {
        "%H:%M"
    } else {
        "%-I:%M %p"
    }
}

/// Formats the wall-clock time of `instant`, "13:00" or "1:00 PM".
pub fn format_time_of_day<Tz: TimeZone>(instant: &DateTime<Tz>, use_military_time: bool) -> String
where
    Tz::Offset: std::fmt::Display,
{
    instant.format(time_format(use_military_time)).to_string()
}

/// Wall-clock time at which the tracker's day starts. A shift of -1h starts the day at 23:00,
/// the sign is shown separately.
pub fn format_start_of_day(shift: StartOfDayShift, use_military_time: bool) -> String {
    let (time, _) = NaiveTime::MIN.overflowing_add_signed(shift.as_duration());
    time.format(time_format(use_military_time)).to_string()
}
