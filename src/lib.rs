//! Time range resolution and aggregation for an activity tracker.
//! Resolves days, weeks, months and years with a configurable start of day, cuts records to
//! them and sums tracked and untracked time. A small cli prints the results from json lines
//! storage.
//!

pub mod cli;
pub mod engine;
pub mod navigation;
pub mod report;
pub mod storage;
pub mod utils;
