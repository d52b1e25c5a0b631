//! Pure calendar arithmetic over instants. Nothing here mutates a calendar in place: every
//! function maps an instant (or a date) to a new one.
//!
//! Days are computed on the wall-clock calendar of the time zone carried by the instant. The
//! start of day shift is applied on top of those local midnights, so a single shift setting
//! moves every day/week/month/year boundary consistently.

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc, Weekday,
};

use super::{
    error::{out_of_range, EngineResult},
    prefs::DayOfWeek,
};

/// Converts a wall-clock time into an instant. Ambiguous times (clocks turned back) resolve to
/// the earliest instant, skipped times (clocks turned forward) to the first existing minute
/// after them.
pub fn from_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> EngineResult<DateTime<Tz>> {
    if let Some(v) = tz.from_local_datetime(&local).earliest() {
        return Ok(v);
    }
    // Gaps are at most a couple of hours long in practice.
    (1..=4 * 60)
        .filter_map(|minutes| local.checked_add_signed(Duration::minutes(minutes)))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .ok_or_else(|| out_of_range(format!("{local} doesn't exist in the time zone")))
}

/// Local midnight of `date`.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> EngineResult<DateTime<Tz>> {
    from_local(tz, date.and_time(NaiveTime::MIN))
}

/// Local midnight of the day containing `instant`.
pub fn start_of_calendar_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> EngineResult<DateTime<Tz>> {
    local_midnight(&instant.timezone(), instant.date_naive())
}

/// Local midnight of the most recent day (today included) whose weekday is `first_day_of_week`.
pub fn start_of_calendar_week<Tz: TimeZone>(
    instant: &DateTime<Tz>,
    first_day_of_week: DayOfWeek,
) -> EngineResult<DateTime<Tz>> {
    let date = week_start_date(instant.date_naive(), first_day_of_week)?;
    local_midnight(&instant.timezone(), date)
}

pub fn start_of_calendar_month<Tz: TimeZone>(
    instant: &DateTime<Tz>,
) -> EngineResult<DateTime<Tz>> {
    local_midnight(&instant.timezone(), month_start_date(instant.date_naive()))
}

pub fn start_of_calendar_year<Tz: TimeZone>(instant: &DateTime<Tz>) -> EngineResult<DateTime<Tz>> {
    local_midnight(&instant.timezone(), year_start_date(instant.date_naive())?)
}

/// The tracker's day begins `shift` after the calendar boundary. Negative shifts move it into
/// the previous calendar day.
pub fn apply_start_of_day_shift<Tz: TimeZone>(
    day_boundary: DateTime<Tz>,
    shift: Duration,
) -> EngineResult<DateTime<Tz>> {
    day_boundary
        .checked_add_signed(shift)
        .ok_or_else(|| out_of_range("start of day shift overflows"))
}

/// Instant at which the tracker's day for `date` begins.
pub fn shifted_day_start<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    shift: Duration,
) -> EngineResult<DateTime<Utc>> {
    Ok(apply_start_of_day_shift(local_midnight(tz, date)?, shift)?.to_utc())
}

/// Calendar date of the tracker's day that contains `instant`.
pub fn shifted_date<Tz: TimeZone>(instant: &DateTime<Tz>, shift: Duration) -> EngineResult<NaiveDate> {
    instant
        .clone()
        .checked_sub_signed(shift)
        .map(|v| v.date_naive())
        .ok_or_else(|| out_of_range("start of day shift overflows"))
}

pub fn week_start_date(date: NaiveDate, first_day_of_week: DayOfWeek) -> EngineResult<NaiveDate> {
    let first: Weekday = first_day_of_week.into();
    let days_back = (date.weekday().num_days_from_monday() + 7 - first.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(days_back as u64))
        .ok_or_else(|| out_of_range(format!("week of {date}")))
}

pub fn month_start_date(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

pub fn year_start_date(date: NaiveDate) -> EngineResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .ok_or_else(|| out_of_range(format!("year of {date}")))
}

pub fn add_days(date: NaiveDate, days: i64) -> EngineResult<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
    .ok_or_else(|| out_of_range(format!("{date} moved by {days} days")))
}

/// Moves a date by whole months. The day of month is clamped, so Jan 31 + 1 month is the last
/// day of February.
pub fn add_months(date: NaiveDate, months: i64) -> EngineResult<NaiveDate> {
    let magnitude = u32::try_from(months.unsigned_abs())
        .map(Months::new)
        .map_err(|_| out_of_range(format!("{months} months")))?;
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
    .ok_or_else(|| out_of_range(format!("{date} moved by {months} months")))
}
