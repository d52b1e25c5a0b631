use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use super::{
    range::Interval,
    record::{CategoryId, RecordId, TagId, Trackable},
};

/// Portion of a record that falls inside one interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFragment {
    /// `None` for the running record.
    pub record_id: Option<RecordId>,
    pub category_id: CategoryId,
    pub tag_ids: BTreeSet<TagId>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl RecordFragment {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn is_running(&self) -> bool {
        self.record_id.is_none()
    }

    /// Splits a fragment into the part before `split` and the part after it.
    pub fn split_by(self, split: DateTime<Utc>) -> (Option<RecordFragment>, Option<RecordFragment>) {
        if split <= self.start {
            (None, Some(self))
        } else if split >= self.end {
            (Some(self), None)
        } else {
            let before = RecordFragment {
                end: split,
                ..self.clone()
            };
            let after = RecordFragment {
                start: split,
                ..self
            };
            (Some(before), Some(after))
        }
    }
}

/// Returns the part of `record` inside `interval`, or nothing when they don't overlap.
///
/// A record overlaps `[start, end)` when it starts before `end` and ends after `start`. Running
/// records end at `now`, so one that starts after `now` has nothing to show yet. Reversed records
/// yield nothing as well.
pub fn clip(record: &impl Trackable, interval: &Interval, now: DateTime<Utc>) -> Option<RecordFragment> {
    let started = record.time_started();
    let ended = record.effective_end(now);
    if ended < started || started >= interval.end() || ended <= interval.start() {
        return None;
    }

    Some(RecordFragment {
        record_id: record.record_id(),
        category_id: record.category_id(),
        tag_ids: record.tag_ids().clone(),
        start: started.max(interval.start()),
        end: ended.min(interval.end()),
    })
}

/// Cuts a record into one fragment per interval it touches. Intervals are expected to be
/// ordered and non-overlapping, like the ones produced by
/// [day_intervals](super::range::day_intervals).
pub fn split(
    record: &impl Trackable,
    intervals: &[Interval],
    now: DateTime<Utc>,
) -> Vec<RecordFragment> {
    intervals
        .iter()
        .filter_map(|interval| clip(record, interval, now))
        .collect()
}
