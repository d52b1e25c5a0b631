use std::{collections::HashMap, path::Path};

use anyhow::Result;
use chrono::{Duration, NaiveTime, Timelike, Weekday};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    error::{EngineError, EngineResult},
    record::CategoryId,
};

/// Day the week starts with. Kept separate from [Weekday] so it can be parsed from the command
/// line and stored in the preferences file by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    #[default]
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<DayOfWeek> for Weekday {
    fn from(value: DayOfWeek) -> Self {
        match value {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(value: Weekday) -> Self {
        match value {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// How category totals are ordered when presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CardOrder {
    #[default]
    Name,
    Color,
    Duration,
    Manual,
}

/// Signed shift of the day boundary away from local midnight, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct StartOfDayShift(i64);

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

impl TryFrom<i64> for StartOfDayShift {
    type Error = EngineError;

    fn try_from(value: i64) -> EngineResult<Self> {
        StartOfDayShift::from_millis(value)
    }
}

impl From<StartOfDayShift> for i64 {
    fn from(value: StartOfDayShift) -> Self {
        value.0
    }
}

impl StartOfDayShift {
    pub fn from_millis(millis: i64) -> EngineResult<Self> {
        let shift = Self(millis);
        shift.validate()?;
        Ok(shift)
    }

    /// Builds a shift from a time of day picked by the user. The time picker can't express a
    /// sign, so it is passed separately.
    pub fn from_time_of_day(time: NaiveTime, positive: bool) -> Self {
        let millis = time.num_seconds_from_midnight() as i64 * 1000
            + (time.nanosecond() / 1_000_000) as i64;
        Self(if positive { millis } else { -millis })
    }

    pub fn millis(&self) -> i64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::milliseconds(self.0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 >= 0
    }

    /// Flips the sign while keeping the magnitude, like the sign toggle next to the time picker.
    pub fn negated(self) -> Self {
        Self(-self.0)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.0.unsigned_abs() >= DAY_MILLIS.unsigned_abs() {
            Err(EngineError::InvalidPreference(format!(
                "start of day shift must be shorter than a day, got {}ms",
                self.0
            )))
        } else {
            Ok(())
        }
    }
}

/// Immutable snapshot of the settings the engine depends on. It is passed into every call
/// instead of being read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub first_day_of_week: DayOfWeek,
    pub start_of_day_shift: StartOfDayShift,
    pub use_military_time: bool,
    pub use_proportional_minutes: bool,
    pub show_untracked: bool,
    pub allow_multitasking: bool,
    pub card_order: CardOrder,
    pub manual_card_order: HashMap<CategoryId, i64>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            first_day_of_week: DayOfWeek::Monday,
            start_of_day_shift: StartOfDayShift::default(),
            use_military_time: true,
            use_proportional_minutes: false,
            show_untracked: true,
            allow_multitasking: true,
            card_order: CardOrder::Name,
            manual_card_order: HashMap::new(),
        }
    }
}

pub const PREFERENCES_FILE: &str = "preferences.json";

impl Preferences {
    /// Reads preferences from a json file. A missing file means that nothing was configured yet.
    pub fn load(path: &Path) -> Result<Self> {
        let preferences = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Preferences>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences at {path:?}, using defaults");
                Preferences::default()
            }
            Err(e) => return Err(e.into()),
        };
        preferences.validate()?;
        Ok(preferences)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.start_of_day_shift.validate()
    }

    pub fn shift(&self) -> Duration {
        self.start_of_day_shift.as_duration()
    }

    pub fn with_first_day_of_week(self, first_day_of_week: DayOfWeek) -> Self {
        Self {
            first_day_of_week,
            ..self
        }
    }

    pub fn with_shift(self, start_of_day_shift: StartOfDayShift) -> Self {
        Self {
            start_of_day_shift,
            ..self
        }
    }
}
