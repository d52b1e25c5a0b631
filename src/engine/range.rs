use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{
    calendar::{
        add_days, add_months, from_local, month_start_date, shifted_date, shifted_day_start,
        week_start_date, year_start_date,
    },
    error::{out_of_range, EngineError, EngineResult},
    prefs::Preferences,
};

/// Half-open time span `[start, end)`. Construction rejects `start > end`, so every engine
/// function taking an [Interval] can rely on it being well formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = EngineError;

    fn try_from(value: RawInterval) -> Result<Self, Self::Error> {
        Interval::new(value.start, value.end)
    }
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> EngineResult<Self> {
        if start > end {
            Err(EngineError::InvalidInterval { start, end })
        } else {
            Ok(Self { start, end })
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Part of the interval that lies before `moment`. Empty when the interval starts later.
    pub fn until(&self, moment: DateTime<Utc>) -> Interval {
        Interval {
            start: self.start,
            end: moment.clamp(self.start, self.end),
        }
    }
}

/// Range selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKind {
    Day,
    Week,
    Month,
    Year,
    Overall,
    Custom(Interval),
}

impl RangeKind {
    /// Whether navigation offsets mean anything for this kind.
    pub fn is_navigable(&self) -> bool {
        match self {
            RangeKind::Day | RangeKind::Week | RangeKind::Month | RangeKind::Year => true,
            RangeKind::Overall | RangeKind::Custom(_) => false,
        }
    }
}

/// Concrete interval plus the title shown above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub interval: Interval,
    pub title: String,
}

impl ResolvedRange {
    pub fn start(&self) -> DateTime<Utc> {
        self.interval.start()
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.interval.end()
    }
}

/// Resolves `kind` moved by `offset` ranges away from the one containing today.
///
/// "Today" is the calendar date of `now` in its time zone; the start of day shift only moves the
/// boundaries. Because of that, when `now` falls between midnight and a positive shift it
/// belongs to the range at offset -1 (and symmetrically for negative shifts).
///
/// `earliest_record` is only used for [RangeKind::Overall] and should be the earliest start of
/// any record ever tracked.
pub fn resolve<Tz: TimeZone>(
    kind: &RangeKind,
    offset: i32,
    prefs: &Preferences,
    now: &DateTime<Tz>,
    earliest_record: Option<DateTime<Utc>>,
) -> EngineResult<ResolvedRange> {
    let tz = now.timezone();
    let today = now.date_naive();
    let shift = prefs.shift();
    let offset = offset as i64;

    let (first, last) = match kind {
        RangeKind::Day => {
            let day = add_days(today, offset)?;
            (day, add_days(day, 1)?)
        }
        RangeKind::Week => {
            let anchor = add_days(today, offset * 7)?;
            let first = week_start_date(anchor, prefs.first_day_of_week)?;
            (first, add_days(first, 7)?)
        }
        RangeKind::Month => {
            let first = add_months(month_start_date(today), offset)?;
            (first, add_months(first, 1)?)
        }
        RangeKind::Year => {
            let first = add_months(year_start_date(today)?, offset * 12)?;
            (first, add_months(first, 12)?)
        }
        RangeKind::Overall => {
            let end = now.to_utc();
            let start = earliest_record.map_or(end, |v| v.min(end));
            let interval = Interval::new(start, end)?;
            return Ok(ResolvedRange {
                title: span_title(&tz, &interval),
                interval,
            });
        }
        RangeKind::Custom(interval) => {
            return Ok(ResolvedRange {
                interval: *interval,
                title: span_title(&tz, interval),
            });
        }
    };

    let interval = Interval::new(
        shifted_day_start(&tz, first, shift)?,
        shifted_day_start(&tz, last, shift)?,
    )?;
    Ok(ResolvedRange {
        title: title(kind, &interval, prefs, now)?,
        interval,
    })
}

/// Title of a navigable range, derived from its boundaries rather than from the offset.
fn title<Tz: TimeZone>(
    kind: &RangeKind,
    interval: &Interval,
    prefs: &Preferences,
    now: &DateTime<Tz>,
) -> EngineResult<String> {
    let tz = now.timezone();
    let shift = prefs.shift();
    let first = shifted_date(&interval.start().with_timezone(&tz), shift)?;

    Ok(match kind {
        RangeKind::Day => match (first - now.date_naive()).num_days() {
            0 => "Today".to_string(),
            -1 => "Yesterday".to_string(),
            1 => "Tomorrow".to_string(),
            _ => first.format("%a, %b %-d").to_string(),
        },
        RangeKind::Week => {
            let last = add_days(shifted_date(&interval.end().with_timezone(&tz), shift)?, -1)?;
            format!("{} – {}", first.format("%b %-d"), last.format("%b %-d"))
        }
        RangeKind::Month => first.format("%B").to_string(),
        RangeKind::Year => first.year().to_string(),
        RangeKind::Overall | RangeKind::Custom(_) => span_title(&tz, interval),
    })
}

/// Title for ranges that aren't aligned to calendar units. Shows the first and the last day the
/// range touches.
fn span_title<Tz: TimeZone>(tz: &Tz, interval: &Interval) -> String {
    let first = interval.start().with_timezone(tz).date_naive();
    let last = if interval.end() > interval.start() {
        (interval.end() - Duration::milliseconds(1))
            .with_timezone(tz)
            .date_naive()
    } else {
        first
    };
    let format = "%b %-d, %Y";
    if first == last {
        first.format(format).to_string()
    } else {
        format!("{} – {}", first.format(format), last.format(format))
    }
}

/// `now` moved by `offset` ranges, keeping the time of day. Used as the initial value of date
/// pickers. Month steps clamp the day, so Jan 31 + 1 month is the last day of February.
pub fn timestamp_for_offset<Tz: TimeZone>(
    kind: &RangeKind,
    offset: i32,
    now: &DateTime<Tz>,
) -> EngineResult<DateTime<Tz>> {
    let offset = offset as i64;
    let local = now.naive_local();
    let date = match kind {
        RangeKind::Day => add_days(local.date(), offset)?,
        RangeKind::Week => add_days(local.date(), offset * 7)?,
        RangeKind::Month => add_months(local.date(), offset)?,
        RangeKind::Year => add_months(local.date(), offset * 12)?,
        RangeKind::Overall | RangeKind::Custom(_) => return Ok(now.clone()),
    };
    from_local(&now.timezone(), date.and_time(local.time()))
}

/// Offset that makes [resolve] land on the range containing the calendar date of `target`.
/// This is what a "jump to date" action uses.
pub fn offset_for_timestamp<Tz: TimeZone>(
    kind: &RangeKind,
    target: &DateTime<Tz>,
    prefs: &Preferences,
    now: &DateTime<Tz>,
) -> EngineResult<i32> {
    let target = target.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();

    let offset = match kind {
        RangeKind::Day => (target - today).num_days(),
        RangeKind::Week => {
            let first = prefs.first_day_of_week;
            (week_start_date(target, first)? - week_start_date(today, first)?).num_days() / 7
        }
        RangeKind::Month => month_index(target) - month_index(today),
        RangeKind::Year => (target.year() - today.year()) as i64,
        RangeKind::Overall | RangeKind::Custom(_) => 0,
    };
    i32::try_from(offset).map_err(|_| out_of_range(format!("offset {offset}")))
}

fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Range covering the last `days` tracker days, today included. Used as the default range of
/// exports.
pub fn last_days<Tz: TimeZone>(
    days: u32,
    prefs: &Preferences,
    now: &DateTime<Tz>,
) -> EngineResult<ResolvedRange> {
    let back = i32::try_from(days.max(1) - 1).map_err(|_| out_of_range(format!("{days} days")))?;
    let first = resolve(&RangeKind::Day, -back, prefs, now, None)?;
    let last = resolve(&RangeKind::Day, 0, prefs, now, None)?;
    let interval = Interval::new(first.start(), last.end())?;
    Ok(ResolvedRange {
        title: span_title(&now.timezone(), &interval),
        interval,
    })
}

/// Tiles `interval` into tracker days. The first and last pieces are cut to the interval, so
/// the pieces cover it exactly.
pub fn day_intervals<Tz: TimeZone>(
    interval: &Interval,
    prefs: &Preferences,
    tz: &Tz,
) -> EngineResult<Vec<Interval>> {
    let shift = prefs.shift();
    let mut day = shifted_date(&interval.start().with_timezone(tz), shift)?;
    let mut current = interval.start();
    let mut days = vec![];
    while current < interval.end() {
        day = add_days(day, 1)?;
        let next = shifted_day_start(tz, day, shift)?.min(interval.end());
        if next > current {
            days.push(Interval::new(current, next)?);
            current = next;
        }
    }
    Ok(days)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate, TimeZone, Timelike, Utc, Weekday};

    use super::*;
    use crate::engine::prefs::{DayOfWeek, StartOfDayShift};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn shifted(hours: i64) -> Preferences {
        Preferences::default()
            .with_shift(StartOfDayShift::from_millis(hours * 3_600_000).unwrap())
    }

    // Friday.
    fn now() -> DateTime<Utc> {
        utc(2024, 4, 5, 12, 0)
    }

    #[test]
    fn day_today_and_neighbours() -> EngineResult<()> {
        let prefs = Preferences::default();
        let today = resolve(&RangeKind::Day, 0, &prefs, &now(), None)?;
        assert_eq!(today.start(), utc(2024, 4, 5, 0, 0));
        assert_eq!(today.end(), utc(2024, 4, 6, 0, 0));
        assert_eq!(today.title, "Today");

        assert_eq!(resolve(&RangeKind::Day, -1, &prefs, &now(), None)?.title, "Yesterday");
        assert_eq!(resolve(&RangeKind::Day, 1, &prefs, &now(), None)?.title, "Tomorrow");
        assert_eq!(resolve(&RangeKind::Day, 2, &prefs, &now(), None)?.title, "Sun, Apr 7");
        Ok(())
    }

    #[test]
    fn resolution_is_deterministic() -> EngineResult<()> {
        let prefs = shifted(3);
        for kind in [RangeKind::Day, RangeKind::Week, RangeKind::Month, RangeKind::Year] {
            assert_eq!(
                resolve(&kind, -17, &prefs, &now(), None)?,
                resolve(&kind, -17, &prefs, &now(), None)?
            );
        }
        Ok(())
    }

    #[test]
    fn consecutive_offsets_tile() -> EngineResult<()> {
        for prefs in [Preferences::default(), shifted(2), shifted(-5)] {
            for kind in [RangeKind::Day, RangeKind::Week, RangeKind::Month, RangeKind::Year] {
                for offset in -30..30 {
                    let current = resolve(&kind, offset, &prefs, &now(), None)?;
                    let next = resolve(&kind, offset + 1, &prefs, &now(), None)?;
                    assert_eq!(current.end(), next.start(), "{kind:?} {offset}");
                    assert!(current.start() < current.end());
                }
            }
        }
        Ok(())
    }

    #[test]
    fn exactly_one_adjacent_day_contains_now() -> EngineResult<()> {
        let moments = [
            utc(2024, 4, 5, 0, 30),
            utc(2024, 4, 5, 12, 0),
            utc(2024, 4, 5, 23, 30),
        ];
        for hours in [-3, -1, 0, 1, 3] {
            let prefs = shifted(hours);
            for now in moments {
                let containing = (-1..=1)
                    .map(|offset| resolve(&RangeKind::Day, offset, &prefs, &now, None))
                    .collect::<EngineResult<Vec<_>>>()?
                    .into_iter()
                    .filter(|v| v.interval.contains(now))
                    .count();
                assert_eq!(containing, 1, "shift {hours} now {now}");
            }
        }
        Ok(())
    }

    #[test]
    fn positive_shift_before_boundary_belongs_to_previous_day() -> EngineResult<()> {
        let prefs = shifted(1);
        let now = utc(2024, 4, 5, 0, 30);
        let today = resolve(&RangeKind::Day, 0, &prefs, &now, None)?;
        assert_eq!(today.start(), utc(2024, 4, 5, 1, 0));
        assert!(!today.interval.contains(now));
        assert!(resolve(&RangeKind::Day, -1, &prefs, &now, None)?
            .interval
            .contains(now));
        Ok(())
    }

    #[test]
    fn negative_shift_moves_start_into_previous_day() -> EngineResult<()> {
        let today = resolve(&RangeKind::Day, 0, &shifted(-2), &now(), None)?;
        assert_eq!(today.start(), utc(2024, 4, 4, 22, 0));
        assert_eq!(today.end(), utc(2024, 4, 5, 22, 0));
        assert_eq!(today.title, "Today");
        Ok(())
    }

    #[test]
    fn week_uses_first_day() -> EngineResult<()> {
        let monday = Preferences::default();
        let week = resolve(&RangeKind::Week, 0, &monday, &now(), None)?;
        assert_eq!(week.start(), utc(2024, 4, 1, 0, 0));
        assert_eq!(week.end(), utc(2024, 4, 8, 0, 0));
        assert_eq!(week.title, "Apr 1 – Apr 7");

        let sunday = monday.with_first_day_of_week(DayOfWeek::Sunday);
        let week = resolve(&RangeKind::Week, 0, &sunday, &now(), None)?;
        assert_eq!(week.start(), utc(2024, 3, 31, 0, 0));
        assert_eq!(week.title, "Mar 31 – Apr 6");
        Ok(())
    }

    #[test]
    fn switching_first_day_moves_saturday_record() -> EngineResult<()> {
        // Sunday 2024-04-07, the record was yesterday.
        let now = utc(2024, 4, 7, 12, 0);
        let record = utc(2024, 4, 6, 15, 0);

        let monday = Preferences::default();
        assert!(resolve(&RangeKind::Week, 0, &monday, &now, None)?
            .interval
            .contains(record));

        let sunday = monday.with_first_day_of_week(DayOfWeek::Sunday);
        assert!(!resolve(&RangeKind::Week, 0, &sunday, &now, None)?
            .interval
            .contains(record));
        assert!(resolve(&RangeKind::Week, -1, &sunday, &now, None)?
            .interval
            .contains(record));
        Ok(())
    }

    #[test]
    fn sunday_first_week_takes_in_saturday() -> EngineResult<()> {
        // Saturday 2024-04-06, record earlier the same day.
        let now = utc(2024, 4, 6, 17, 0);
        let record = Interval::new(utc(2024, 4, 6, 15, 0), utc(2024, 4, 6, 16, 0))?;

        let monday = Preferences::default();
        let previous = resolve(&RangeKind::Week, -1, &monday, &now, None)?;
        assert!(!previous.interval.contains(record.start()));

        let sunday = monday.with_first_day_of_week(DayOfWeek::Sunday);
        let current = resolve(&RangeKind::Week, 0, &sunday, &now, None)?;
        assert!(current.interval.contains(record.start()));
        assert!(current.end() >= record.end());
        Ok(())
    }

    #[test]
    fn weeks_around_new_year_are_contiguous() -> EngineResult<()> {
        let prefs = Preferences::default().with_first_day_of_week(DayOfWeek::Sunday);
        for year in [1960, 2024, 2060] {
            let last_day = Utc.with_ymd_and_hms(year, 12, 31, 12, 0, 0).unwrap();
            let offset = offset_for_timestamp(&RangeKind::Week, &last_day, &prefs, &now())?;
            let last_week = resolve(&RangeKind::Week, offset, &prefs, &now(), None)?;
            let first_week = resolve(&RangeKind::Week, offset + 1, &prefs, &now(), None)?;

            assert!(last_week.interval.contains(last_day));
            assert_eq!(last_week.interval.duration(), Duration::days(7));
            assert_eq!(first_week.interval.duration(), Duration::days(7));
            assert_eq!(last_week.end(), first_week.start());
            assert_eq!(last_week.start().weekday(), Weekday::Sun);
        }
        Ok(())
    }

    #[test]
    fn extreme_offsets_resolve() -> EngineResult<()> {
        let prefs = Preferences::default().with_first_day_of_week(DayOfWeek::Sunday);
        for offset in [-2500, 2500] {
            let week = resolve(&RangeKind::Week, offset, &prefs, &now(), None)?;
            assert_eq!(week.interval.duration(), Duration::days(7));
            assert_eq!(week.start().weekday(), Weekday::Sun);
        }
        let year = resolve(&RangeKind::Year, -2000, &prefs, &now(), None)?;
        assert_eq!(year.title, "24");
        assert_eq!(year.start().year(), 24);
        Ok(())
    }

    #[test]
    fn overflowing_offset_is_an_error() {
        let prefs = Preferences::default();
        assert!(matches!(
            resolve(&RangeKind::Year, i32::MAX, &prefs, &now(), None),
            Err(EngineError::OutOfRange(_))
        ));
        assert!(matches!(
            resolve(&RangeKind::Day, i32::MIN, &prefs, &now(), None),
            Err(EngineError::OutOfRange(_))
        ));
    }

    #[test]
    fn month_and_year_handle_lengths() -> EngineResult<()> {
        let prefs = Preferences::default();
        let february = resolve(&RangeKind::Month, -2, &prefs, &now(), None)?;
        assert_eq!(february.start(), utc(2024, 2, 1, 0, 0));
        assert_eq!(february.interval.duration(), Duration::days(29));
        assert_eq!(february.title, "February");

        let year = resolve(&RangeKind::Year, 0, &prefs, &now(), None)?;
        assert_eq!(year.start(), utc(2024, 1, 1, 0, 0));
        assert_eq!(year.interval.duration(), Duration::days(366));
        assert_eq!(year.title, "2024");
        Ok(())
    }

    #[test]
    fn overall_and_custom_ignore_offset() -> EngineResult<()> {
        let prefs = Preferences::default();
        let earliest = utc(2023, 1, 10, 8, 0);
        let overall = resolve(&RangeKind::Overall, 5, &prefs, &now(), Some(earliest))?;
        assert_eq!(overall.start(), earliest);
        assert_eq!(overall.end(), now());
        assert_eq!(overall.title, "Jan 10, 2023 – Apr 5, 2024");

        let empty = resolve(&RangeKind::Overall, 0, &prefs, &now(), None)?;
        assert_eq!(empty.interval.duration(), Duration::zero());

        let custom = RangeKind::Custom(Interval::new(utc(2024, 3, 1, 0, 0), utc(2024, 3, 11, 0, 0))?);
        let resolved = resolve(&custom, -3, &prefs, &now(), None)?;
        assert_eq!(resolved, resolve(&custom, 7, &prefs, &now(), None)?);
        assert_eq!(resolved.start(), utc(2024, 3, 1, 0, 0));
        assert_eq!(resolved.title, "Mar 1, 2024 – Mar 10, 2024");
        Ok(())
    }

    #[test]
    fn malformed_interval_is_rejected() {
        assert_eq!(
            Interval::new(utc(2024, 3, 2, 0, 0), utc(2024, 3, 1, 0, 0)),
            Err(EngineError::InvalidInterval {
                start: utc(2024, 3, 2, 0, 0),
                end: utc(2024, 3, 1, 0, 0),
            })
        );
        assert!(serde_json::from_str::<Interval>(
            r#"{"start":"2024-03-02T00:00:00Z","end":"2024-03-01T00:00:00Z"}"#
        )
        .is_err());
    }

    #[test]
    fn titles_use_local_time_zone() -> EngineResult<()> {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        // 02:00 UTC is still the previous evening in UTC-5.
        let now = utc(2024, 4, 5, 2, 0).with_timezone(&tz);
        let today = resolve(&RangeKind::Day, 0, &Preferences::default(), &now, None)?;
        assert_eq!(today.start(), utc(2024, 4, 4, 5, 0));
        assert_eq!(
            resolve(&RangeKind::Day, -2, &Preferences::default(), &now, None)?.title,
            "Tue, Apr 2"
        );
        Ok(())
    }

    #[test]
    fn jump_to_date_round_trips() -> EngineResult<()> {
        let prefs = Preferences::default().with_first_day_of_week(DayOfWeek::Sunday);
        let targets = [
            utc(1950, 1, 1, 9, 0),
            utc(2024, 4, 4, 23, 0),
            utc(2024, 4, 6, 1, 0),
            utc(2050, 1, 1, 9, 0),
        ];
        for kind in [RangeKind::Day, RangeKind::Week, RangeKind::Month, RangeKind::Year] {
            for target in targets {
                let offset = offset_for_timestamp(&kind, &target, &prefs, &now())?;
                assert!(
                    resolve(&kind, offset, &prefs, &now(), None)?
                        .interval
                        .contains(target),
                    "{kind:?} {target}"
                );
            }
        }
        assert_eq!(
            offset_for_timestamp(&RangeKind::Overall, &targets[0], &prefs, &now())?,
            0
        );
        Ok(())
    }

    #[test]
    fn timestamp_for_offset_clamps_month_end() -> EngineResult<()> {
        let now = utc(2024, 1, 31, 10, 15);
        let moved = timestamp_for_offset(&RangeKind::Month, 1, &now)?;
        assert_eq!(moved.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(moved.hour(), 10);
        assert_eq!(
            timestamp_for_offset(&RangeKind::Week, -1, &now)?,
            utc(2024, 1, 24, 10, 15)
        );
        assert_eq!(timestamp_for_offset(&RangeKind::Overall, 4, &now)?, now);
        Ok(())
    }

    #[test]
    fn last_seven_days() -> EngineResult<()> {
        let range = last_days(7, &Preferences::default(), &now())?;
        assert_eq!(range.start(), utc(2024, 3, 30, 0, 0));
        assert_eq!(range.end(), utc(2024, 4, 6, 0, 0));
        assert_eq!(range.title, "Mar 30, 2024 – Apr 5, 2024");
        Ok(())
    }

    #[test]
    fn day_intervals_cover_range() -> EngineResult<()> {
        let prefs = shifted(1);
        let interval = Interval::new(utc(2024, 4, 1, 12, 0), utc(2024, 4, 3, 6, 0))?;
        let days = day_intervals(&interval, &prefs, &Utc)?;
        assert_eq!(
            days,
            vec![
                Interval::new(utc(2024, 4, 1, 12, 0), utc(2024, 4, 2, 1, 0))?,
                Interval::new(utc(2024, 4, 2, 1, 0), utc(2024, 4, 3, 1, 0))?,
                Interval::new(utc(2024, 4, 3, 1, 0), utc(2024, 4, 3, 6, 0))?,
            ]
        );
        Ok(())
    }
}
