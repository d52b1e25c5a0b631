//! Glue between storage, the clock, preferences and the engine. Everything the command line
//! prints goes through a [Reporter].

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use futures::try_join;
use tracing::{debug, instrument};

use crate::{
    engine::{
        aggregate::{aggregate, Aggregate, Bucket, Total},
        order::sorted_totals,
        prefs::Preferences,
        range::{last_days, resolve, Interval, RangeKind, ResolvedRange},
        record::{Category, Record, RunningRecord},
        split::RecordFragment,
    },
    storage::record_storage::RecordStorage,
    utils::clock::Clock,
};

/// Statistics of one range, with buckets already ordered for display.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub range: ResolvedRange,
    pub aggregate: Aggregate,
    pub totals: Vec<(Bucket, Total)>,
    pub categories: Vec<Category>,
}

impl Statistics {
    pub fn category(&self, bucket: &Bucket) -> Option<&Category> {
        match bucket {
            Bucket::Category(id) => self.categories.iter().find(|v| v.id == *id),
            Bucket::Untracked => None,
        }
    }
}

/// Entry of a day preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordItem {
    Fragment(RecordFragment),
    Untracked(Interval),
}

impl RecordItem {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            RecordItem::Fragment(v) => v.start,
            RecordItem::Untracked(v) => v.start(),
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            RecordItem::Fragment(v) => v.end,
            RecordItem::Untracked(v) => v.end(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DayRecords {
    pub range: ResolvedRange,
    pub items: Vec<RecordItem>,
    pub categories: Vec<Category>,
}

pub struct Reporter<S, Tz> {
    storage: S,
    clock: Box<dyn Clock>,
    tz: Tz,
    prefs: Preferences,
}

impl<S, Tz> Reporter<S, Tz>
where
    S: RecordStorage,
    Tz: TimeZone,
{
    pub fn new(storage: S, clock: Box<dyn Clock>, tz: Tz, prefs: Preferences) -> Self {
        Self {
            storage,
            clock,
            tz,
            prefs,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.time().with_timezone(&self.tz)
    }

    /// Resolves a range without aggregating anything. For [RangeKind::Overall] this still needs
    /// every record to find the earliest one.
    #[instrument(skip(self))]
    pub async fn range(&self, kind: &RangeKind, offset: i32) -> Result<ResolvedRange> {
        let now = self.now();
        let earliest = if *kind == RangeKind::Overall {
            let (records, running) =
                try_join!(self.storage.get_all(), self.storage.get_running())?;
            earliest_start(&records, &running)
        } else {
            None
        };
        Ok(resolve(kind, offset, &self.prefs, &now, earliest)?)
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self, kind: &RangeKind, offset: i32) -> Result<Statistics> {
        let now = self.now();
        let (range, records, running, categories) = if *kind == RangeKind::Overall {
            let (records, running, categories) = try_join!(
                self.storage.get_all(),
                self.storage.get_running(),
                self.storage.get_categories()
            )?;
            let range = resolve(
                kind,
                offset,
                &self.prefs,
                &now,
                earliest_start(&records, &running),
            )?;
            (range, records, running, categories)
        } else {
            let range = resolve(kind, offset, &self.prefs, &now, None)?;
            let (records, running, categories) = try_join!(
                self.storage.get_from_range(range.start(), range.end()),
                self.storage.get_running(),
                self.storage.get_categories()
            )?;
            (range, records, running, categories)
        };
        debug!(
            "Aggregating {} records and {} running ones for {}",
            records.len(),
            running.len(),
            range.title
        );

        let aggregate = aggregate(
            &records,
            &running,
            &range.interval,
            &self.prefs,
            now.with_timezone(&Utc),
        );
        let totals = sorted_totals(&aggregate, &categories, &self.prefs);
        Ok(Statistics {
            range,
            aggregate,
            totals,
            categories,
        })
    }

    /// Fragments of one tracker day in chronological order, with untracked gaps between them
    /// when untracked time is shown.
    #[instrument(skip(self))]
    pub async fn records_for_day(&self, offset: i32) -> Result<DayRecords> {
        let now = self.now();
        let range = resolve(&RangeKind::Day, offset, &self.prefs, &now, None)?;
        let (records, running, categories) = try_join!(
            self.storage.get_from_range(range.start(), range.end()),
            self.storage.get_running(),
            self.storage.get_categories()
        )?;
        let Aggregate {
            fragments,
            untracked_gaps,
            ..
        } = aggregate(
            &records,
            &running,
            &range.interval,
            &self.prefs,
            now.with_timezone(&Utc),
        );

        let mut items = fragments
            .into_iter()
            .map(RecordItem::Fragment)
            .chain(untracked_gaps.into_iter().map(RecordItem::Untracked))
            .collect::<Vec<_>>();
        items.sort_by_key(|v| (v.start(), v.end()));

        Ok(DayRecords {
            range,
            items,
            categories,
        })
    }

    /// Default range offered when exporting records.
    pub fn export_range(&self, days: u32) -> Result<ResolvedRange> {
        Ok(last_days(days, &self.prefs, &self.now())?)
    }
}

fn earliest_start(records: &[Record], running: &[RunningRecord]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .map(|v| v.time_started)
        .chain(running.iter().map(|v| v.time_started))
        .min()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use anyhow::Result;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

    use super::{RecordItem, Reporter};
    use crate::{
        engine::{
            aggregate::Bucket,
            prefs::{CardOrder, Preferences},
            range::RangeKind,
            record::{Category, CategoryId, Record, RecordId, RunningRecord},
        },
        storage::record_storage::MemoryRecordStorage,
        utils::{clock::MockClock, logging::TEST_LOGGING},
    };

    fn utc(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, h, 0, 0).unwrap()
    }

    fn record(id: u64, category: u64, start: DateTime<Utc>, end: DateTime<Utc>) -> Record {
        Record {
            id: RecordId(id),
            category_id: CategoryId(category),
            tag_ids: BTreeSet::new(),
            time_started: start,
            time_ended: end,
        }
    }

    fn clock(now: DateTime<Utc>) -> Box<MockClock> {
        let mut clock = MockClock::new();
        clock.expect_time().returning(move || now);
        Box::new(clock)
    }

    fn storage() -> MemoryRecordStorage {
        MemoryRecordStorage::new(
            vec![
                record(1, 1, utc(1, 9), utc(1, 10)),
                record(2, 1, utc(5, 8), utc(5, 10)),
                record(3, 2, utc(5, 10), utc(5, 11)),
                record(4, 2, utc(4, 23), utc(5, 1)),
            ],
            vec![RunningRecord {
                category_id: CategoryId(2),
                tag_ids: BTreeSet::new(),
                time_started: utc(5, 11),
            }],
            vec![
                Category {
                    id: CategoryId(1),
                    name: "Work".into(),
                    color: 0,
                },
                Category {
                    id: CategoryId(2),
                    name: "Reading".into(),
                    color: 1,
                },
            ],
        )
    }

    fn reporter(prefs: Preferences) -> Reporter<MemoryRecordStorage, Utc> {
        Reporter::new(storage(), clock(utc(5, 12)), Utc, prefs)
    }

    #[tokio::test]
    async fn today_statistics() -> Result<()> {
        *TEST_LOGGING;
        let stats = reporter(Preferences::default())
            .statistics(&RangeKind::Day, 0)
            .await?;

        assert_eq!(stats.range.title, "Today");
        let reading = stats.aggregate.total(Bucket::Category(CategoryId(2))).unwrap();
        // 00:00 - 01:00, 10:00 - 11:00 and the running one since 11:00
        assert_eq!(reading.duration, Duration::hours(3));
        assert_eq!(
            stats.aggregate.total(Bucket::Untracked).unwrap().duration,
            Duration::hours(7)
        );
        assert_eq!(stats.aggregate.excluded_future, Duration::hours(12));
        assert_eq!(
            stats.totals.iter().map(|v| v.0).collect::<Vec<_>>(),
            vec![
                Bucket::Category(CategoryId(2)),
                Bucket::Category(CategoryId(1)),
                Bucket::Untracked
            ]
        );
        assert_eq!(stats.category(&stats.totals[0].0).unwrap().name, "Reading");
        Ok(())
    }

    #[tokio::test]
    async fn overall_starts_at_earliest_record() -> Result<()> {
        let stats = reporter(Preferences {
            card_order: CardOrder::Duration,
            show_untracked: false,
            ..Preferences::default()
        })
        .statistics(&RangeKind::Overall, 3)
        .await?;

        assert_eq!(stats.range.start(), utc(1, 9));
        assert_eq!(stats.range.end(), utc(5, 12));
        assert!(stats.aggregate.untracked.is_none());
        assert_eq!(stats.totals.len(), 2);
        assert_eq!(stats.totals[0].1.duration, Duration::hours(4));
        Ok(())
    }

    #[tokio::test]
    async fn resolves_range_in_reporter_time_zone() -> Result<()> {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let reporter = Reporter::new(storage(), clock(utc(5, 22)), tz, Preferences::default());
        let range = reporter.range(&RangeKind::Day, 0).await?;
        assert_eq!(range.start(), utc(5, 21));
        assert_eq!(range.title, "Today");

        let overall = reporter.range(&RangeKind::Overall, 0).await?;
        assert_eq!(overall.start(), utc(1, 9));
        Ok(())
    }

    #[tokio::test]
    async fn day_records_with_gaps() -> Result<()> {
        let day = reporter(Preferences::default()).records_for_day(0).await?;
        let items = day.items;
        assert_eq!(items.len(), 5);
        assert!(matches!(&items[0], RecordItem::Fragment(v) if v.start == utc(5, 0) && v.end == utc(5, 1)));
        assert_eq!(
            items[1],
            RecordItem::Untracked(crate::engine::range::Interval::new(utc(5, 1), utc(5, 8))?)
        );
        assert!(matches!(&items[4], RecordItem::Fragment(v) if v.is_running() && v.end == utc(5, 12)));
        assert_eq!(day.categories.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn yesterday_records_without_untracked() -> Result<()> {
        let day = reporter(Preferences {
            show_untracked: false,
            ..Preferences::default()
        })
        .records_for_day(-1)
        .await?;
        assert_eq!(day.range.title, "Yesterday");
        assert_eq!(day.items.len(), 1);
        assert_eq!(day.items[0].start(), utc(4, 23));
        assert_eq!(day.items[0].end(), utc(5, 0));
        Ok(())
    }

    #[test]
    fn export_range_covers_last_week() -> Result<()> {
        let range = reporter(Preferences::default()).export_range(7)?;
        assert_eq!(range.start(), utc(5, 0) - Duration::days(6));
        assert_eq!(range.end(), utc(6, 0));
        Ok(())
    }
}
