//! The time-range resolution and aggregation engine.
//!
//! Everything here is synchronous and pure: callers pass records, a [prefs::Preferences]
//! snapshot and the current instant, and get plain values back. The flow is:
//!  - [range::resolve] turns a [range::RangeKind] plus a navigation offset into an interval.
//!  - [split::clip] cuts records to that interval.
//!  - [aggregate::aggregate] sums the fragments per category and computes untracked time.
//!  - [duration::format_duration] renders the sums.

pub mod aggregate;
pub mod calendar;
pub mod duration;
pub mod error;
pub mod order;
pub mod prefs;
pub mod range;
pub mod record;
pub mod split;
