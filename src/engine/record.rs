use std::{collections::BTreeSet, fmt::Display};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub u64);

impl Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished activity record. Repositories guarantee `time_started <= time_ended`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub category_id: CategoryId,
    #[serde(default)]
    pub tag_ids: BTreeSet<TagId>,
    pub time_started: DateTime<Utc>,
    pub time_ended: DateTime<Utc>,
}

impl Record {
    pub fn duration(&self) -> Duration {
        self.time_ended - self.time_started
    }
}

/// A record that is still being tracked. It has no end, so for aggregation it lasts until "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningRecord {
    pub category_id: CategoryId,
    #[serde(default)]
    pub tag_ids: BTreeSet<TagId>,
    pub time_started: DateTime<Utc>,
}

/// Anything that occupies time on the timeline and can be clipped against an interval.
pub trait Trackable {
    fn record_id(&self) -> Option<RecordId>;

    fn category_id(&self) -> CategoryId;

    fn tag_ids(&self) -> &BTreeSet<TagId>;

    fn time_started(&self) -> DateTime<Utc>;

    /// End used for overlap math. Running records end at `now`.
    fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc>;
}

impl Trackable for Record {
    fn record_id(&self) -> Option<RecordId> {
        Some(self.id)
    }

    fn category_id(&self) -> CategoryId {
        self.category_id
    }

    fn tag_ids(&self) -> &BTreeSet<TagId> {
        &self.tag_ids
    }

    fn time_started(&self) -> DateTime<Utc> {
        self.time_started
    }

    fn effective_end(&self, _now: DateTime<Utc>) -> DateTime<Utc> {
        self.time_ended
    }
}

impl Trackable for RunningRecord {
    fn record_id(&self) -> Option<RecordId> {
        None
    }

    fn category_id(&self) -> CategoryId {
        self.category_id
    }

    fn tag_ids(&self) -> &BTreeSet<TagId> {
        &self.tag_ids
    }

    fn time_started(&self) -> DateTime<Utc> {
        self.time_started
    }

    fn effective_end(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now
    }
}

/// Presentation data for a category. The engine only needs it for ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// Position of the color in the palette. Sorting by color groups similar colors together.
    #[serde(default)]
    pub color: u32,
}
