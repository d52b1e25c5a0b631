use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use fs4::tokio::AsyncFileExt;
use serde::de::DeserializeOwned;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};
use tracing::{debug, warn};

use crate::engine::record::{Category, Record, RunningRecord};

pub const RECORDS_FILE: &str = "records.jsonl";
pub const RUNNING_FILE: &str = "running.jsonl";
pub const CATEGORIES_FILE: &str = "categories.jsonl";

/// Interface for abstracting the source of records.
pub trait RecordStorage {
    /// Every finished record. Needed for the overall range.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Finished records overlapping `[start, end)`.
    fn get_from_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Record>>> + Send;

    /// Records that are currently being tracked.
    fn get_running(&self) -> impl Future<Output = Result<Vec<RunningRecord>>> + Send;

    fn get_categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send;
}

fn overlaps(record: &Record, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    record.time_started < end && record.time_ended > start
}

/// Records ending before they start are rejected here so that the engine never sees them.
fn well_formed(record: &Record) -> bool {
    if record.time_started > record.time_ended {
        warn!(
            "Skipping record {:?} which ends at {} before starting at {}",
            record.id, record.time_ended, record.time_started
        );
        false
    } else {
        true
    }
}

/// The main realization of [RecordStorage]. Stores records as json lines inside a directory.
pub struct RecordStorageImpl {
    record_dir: PathBuf,
}

impl RecordStorageImpl {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    async fn read_all_records(&self) -> Result<Vec<Record>> {
        let records = read_json_lines::<Record>(&self.record_dir.join(RECORDS_FILE)).await?;
        Ok(records.into_iter().filter(well_formed).collect())
    }
}

/// Reads a json lines file. A missing file counts as an empty one.
async fn read_json_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    async fn extract<T: DeserializeOwned>(path: &Path) -> std::result::Result<Vec<T>, std::io::Error> {
        debug!("Extracting {path:?}");
        let file = File::open(path).await?;
        file.lock_shared()?;
        let buffer = BufReader::new(file);
        let mut lines = buffer.lines();
        let mut values = vec![];
        while let Some(v) = lines.next_line().await? {
            if v.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<T>(&v) {
                Ok(v) => values.push(v),
                Err(e) => {
                    // Partially written lines are skipped instead of failing the whole file
                    warn!(
                        "During parsing in path {:?} found illegal json string {}:  {e}",
                        path, &v
                    )
                }
            }
        }

        lines.into_inner().into_inner().unlock_async().await?;

        Ok(values)
    }

    match extract(path).await {
        Ok(s) => Ok(s),
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                Ok(vec![])
            } else {
                Err(e)?
            }
        }
    }
}

impl RecordStorage for RecordStorageImpl {
    async fn get_all(&self) -> Result<Vec<Record>> {
        self.read_all_records().await
    }

    async fn get_from_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Record>> {
        let records = self.read_all_records().await?;
        Ok(records
            .into_iter()
            .filter(|v| overlaps(v, start, end))
            .collect())
    }

    async fn get_running(&self) -> Result<Vec<RunningRecord>> {
        read_json_lines(&self.record_dir.join(RUNNING_FILE)).await
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        read_json_lines(&self.record_dir.join(CATEGORIES_FILE)).await
    }
}

/// Keeps everything in memory. Useful for embedding the engine and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStorage {
    records: Vec<Record>,
    running: Vec<RunningRecord>,
    categories: Vec<Category>,
}

impl MemoryRecordStorage {
    pub fn new(records: Vec<Record>, running: Vec<RunningRecord>, categories: Vec<Category>) -> Self {
        Self {
            records: records.into_iter().filter(well_formed).collect(),
            running,
            categories,
        }
    }
}

impl RecordStorage for MemoryRecordStorage {
    async fn get_all(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    async fn get_from_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Record>> {
        Ok(self
            .records
            .iter()
            .filter(|v| overlaps(v, start, end))
            .cloned()
            .collect())
    }

    async fn get_running(&self) -> Result<Vec<RunningRecord>> {
        Ok(self.running.clone())
    }

    async fn get_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }
}
