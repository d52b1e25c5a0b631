use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::{
    prefs::Preferences,
    range::Interval,
    record::{CategoryId, Record, RunningRecord},
    split::{clip, RecordFragment},
};

/// Accumulated duration of a bucket together with the number of pieces that contributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Total {
    pub duration: Duration,
    pub fragments: usize,
}

impl Default for Total {
    fn default() -> Self {
        Self {
            duration: Duration::zero(),
            fragments: 0,
        }
    }
}

impl Total {
    fn add(&mut self, duration: Duration) {
        self.duration += duration;
        self.fragments += 1;
    }
}

/// A line in the statistics: either a real category or the time nobody tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Category(CategoryId),
    Untracked,
}

/// Everything tracked inside one interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub interval: Interval,
    /// Every category with at least one fragment in the interval.
    pub categories: HashMap<CategoryId, Total>,
    /// Present only when untracked time is shown.
    pub untracked: Option<Total>,
    /// Holes between fragments before `now`. Empty when untracked time is hidden.
    pub untracked_gaps: Vec<Interval>,
    /// Fragments ordered by start, for record previews.
    pub fragments: Vec<RecordFragment>,
    /// Part of the interval that lies after `now`. It is never counted as untracked.
    pub excluded_future: Duration,
}

impl Aggregate {
    pub fn tracked(&self) -> Duration {
        self.categories
            .values()
            .fold(Duration::zero(), |acc, v| acc + v.duration)
    }

    /// Part of the interval the statistics are about, i.e. everything before `now`.
    pub fn accounted(&self) -> Duration {
        self.interval.duration() - self.excluded_future
    }

    pub fn total(&self, bucket: Bucket) -> Option<Total> {
        match bucket {
            Bucket::Category(id) => self.categories.get(&id).copied(),
            Bucket::Untracked => self.untracked,
        }
    }
}

/// Aggregates finished and running records against `interval`.
///
/// Untracked time is the accounted part of the interval minus the tracked fragments inside it.
/// Records are expected not to overlap when multitasking is disabled; overlapping input isn't
/// deduplicated, so untracked time saturates at zero in that case.
pub fn aggregate(
    records: &[Record],
    running: &[RunningRecord],
    interval: &Interval,
    prefs: &Preferences,
    now: DateTime<Utc>,
) -> Aggregate {
    let mut fragments = records
        .iter()
        .filter_map(|v| clip(v, interval, now))
        .chain(running.iter().filter_map(|v| clip(v, interval, now)))
        .collect::<Vec<_>>();
    fragments.sort_by_key(|v| (v.start, v.end));

    let mut categories = HashMap::<CategoryId, Total>::new();
    for fragment in &fragments {
        categories
            .entry(fragment.category_id)
            .or_default()
            .add(fragment.duration());
    }

    let accounted = interval.until(now);
    let excluded_future = interval.duration() - accounted.duration();

    let (untracked, untracked_gaps) = if prefs.show_untracked {
        let gaps = untracked_gaps(&fragments, &accounted, prefs.allow_multitasking);
        let tracked_before_now = fragments
            .iter()
            .filter_map(|v| v.clone().split_by(accounted.end()).0)
            .fold(Duration::zero(), |acc, v| acc + v.duration());
        let untracked = Total {
            duration: (accounted.duration() - tracked_before_now).max(Duration::zero()),
            fragments: gaps.len(),
        };
        (Some(untracked), gaps)
    } else {
        (None, vec![])
    };

    Aggregate {
        interval: *interval,
        categories,
        untracked,
        untracked_gaps,
        fragments,
        excluded_future,
    }
}

/// Holes inside `window` not covered by any fragment. Fragments have to be sorted by start.
fn untracked_gaps(
    fragments: &[RecordFragment],
    window: &Interval,
    allow_multitasking: bool,
) -> Vec<Interval> {
    let mut gaps = vec![];
    let mut cursor = window.start();
    for fragment in fragments {
        if fragment.start >= window.end() {
            break;
        }
        if fragment.start > cursor {
            gaps.extend(Interval::new(cursor, fragment.start).ok());
        } else if fragment.start < cursor && !allow_multitasking {
            warn!(
                "Record {:?} overlaps another one while multitasking is disabled",
                fragment.record_id
            );
        }
        cursor = cursor.max(fragment.end);
    }
    if cursor < window.end() {
        gaps.extend(Interval::new(cursor, window.end()).ok());
    }
    gaps
}
