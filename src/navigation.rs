//! Presentation-side state of the range selector. The engine never sees these types, it only
//! receives the resolved [RangeKind].

use chrono::{DateTime, TimeZone, Utc};

use crate::engine::{
    error::EngineResult,
    prefs::Preferences,
    range::{offset_for_timestamp, resolve, timestamp_for_offset, Interval, RangeKind, ResolvedRange},
};

/// Entry of the range selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSelectorItem {
    RangeOption(RangeKind),
    /// Opens a date picker to jump to the range containing a date.
    SelectDateAction,
    /// Opens the custom range picker.
    SelectRangeAction,
}

impl RangeSelectorItem {
    pub fn label(&self, current: &RangeKind) -> String {
        match self {
            RangeSelectorItem::RangeOption(kind) => match kind {
                RangeKind::Day => "Day",
                RangeKind::Week => "Week",
                RangeKind::Month => "Month",
                RangeKind::Year => "Year",
                RangeKind::Overall => "Overall",
                RangeKind::Custom(_) => "Custom",
            }
            .to_string(),
            RangeSelectorItem::SelectDateAction => match current {
                RangeKind::Day => "Select day",
                RangeKind::Week => "Select week",
                RangeKind::Month => "Select month",
                RangeKind::Year => "Select year",
                RangeKind::Overall | RangeKind::Custom(_) => "Select date",
            }
            .to_string(),
            RangeSelectorItem::SelectRangeAction => "Custom range".to_string(),
        }
    }
}

/// Items offered while `current` is selected. Picking a date only makes sense for ranges that
/// can be navigated.
pub fn range_selector_items(current: &RangeKind) -> Vec<RangeSelectorItem> {
    let date_action = current
        .is_navigable()
        .then_some(RangeSelectorItem::SelectDateAction);

    date_action
        .into_iter()
        .chain(
            [
                RangeKind::Day,
                RangeKind::Week,
                RangeKind::Month,
                RangeKind::Year,
                RangeKind::Overall,
            ]
            .map(RangeSelectorItem::RangeOption),
        )
        .chain([RangeSelectorItem::SelectRangeAction])
        .collect()
}

/// Selected range and how many ranges away from today it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeNavigation {
    kind: RangeKind,
    position: i32,
}

impl Default for RangeNavigation {
    fn default() -> Self {
        Self::new(RangeKind::Day)
    }
}

impl RangeNavigation {
    pub fn new(kind: RangeKind) -> Self {
        Self { kind, position: 0 }
    }

    pub fn kind(&self) -> &RangeKind {
        &self.kind
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn previous(self) -> Self {
        self.move_by(-1)
    }

    pub fn next(self) -> Self {
        self.move_by(1)
    }

    pub fn today(self) -> Self {
        Self {
            position: 0,
            ..self
        }
    }

    /// Switches to another range kind. The position always resets to the current range.
    pub fn select(self, kind: RangeKind) -> Self {
        Self::new(kind)
    }

    pub fn select_custom(self, interval: Interval) -> Self {
        Self::new(RangeKind::Custom(interval))
    }

    /// Jumps to the range containing `target`, as picked in a date picker.
    pub fn jump_to<Tz: TimeZone>(
        self,
        target: &DateTime<Tz>,
        prefs: &Preferences,
        now: &DateTime<Tz>,
    ) -> EngineResult<Self> {
        Ok(Self {
            position: offset_for_timestamp(&self.kind, target, prefs, now)?,
            ..self
        })
    }

    /// Initial value for the date picker.
    pub fn picker_timestamp<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> EngineResult<DateTime<Tz>> {
        timestamp_for_offset(&self.kind, self.position, now)
    }

    pub fn resolve<Tz: TimeZone>(
        &self,
        prefs: &Preferences,
        now: &DateTime<Tz>,
        earliest_record: Option<DateTime<Utc>>,
    ) -> EngineResult<ResolvedRange> {
        resolve(&self.kind, self.position, prefs, now, earliest_record)
    }

    fn move_by(self, delta: i32) -> Self {
        if !self.kind.is_navigable() {
            return self;
        }
        Self {
            position: self.position.saturating_add(delta),
            ..self
        }
    }
}
