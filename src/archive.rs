use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::event::Event;
use crate::storage::{read_collection_if_exists, write_collection};
use crate::temporal::resolve_year;
use crate::Error;

/// Events split between the current-year collection and per-year archives.
///
/// Every input event lands in exactly one place: `current` or a single
/// entry of `by_year`. Discovery order is kept inside each list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct YearPartition {
    pub current_year: i32,
    pub current: Vec<Event>,
    pub by_year: BTreeMap<i32, Vec<Event>>,
}

impl YearPartition {
    fn new(current_year: i32) -> Self {
        Self {
            current_year,
            ..Self::default()
        }
    }

    fn push(&mut self, event: Event, today: NaiveDate) {
        let year = resolve_year(&event.displayed_date, &event.block_texts(), today);
        if year == self.current_year {
            self.current.push(event);
        } else {
            self.by_year.entry(year).or_default().push(event);
        }
    }

    /// Total events across all partitions.
    pub fn len(&self) -> usize {
        self.current.len() + self.by_year.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition raw stored records by resolved year.
///
/// Records that do not deserialize into an [`Event`] are logged and skipped;
/// they never abort the batch.
pub fn partition_records(records: Vec<Value>, today: NaiveDate) -> YearPartition {
    let mut partition = YearPartition::new(today.year());
    for (i, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<Event>(record) {
            Ok(event) => partition.push(event, today),
            Err(e) => tracing::warn!(index = i, error = %e, "skipping malformed record"),
        }
    }
    partition
}

/// Partition an in-memory collection by resolved year.
pub fn partition_events(events: Vec<Event>, today: NaiveDate) -> YearPartition {
    let mut partition = YearPartition::new(today.year());
    for event in events {
        partition.push(event, today);
    }
    partition
}

/// File name of the archive for `year`.
pub fn year_file_name(year: i32) -> String {
    format!("eventos_de_{year}.json")
}

/// Persists partitions: the current-year file plus one file per archived year.
#[derive(Debug, Clone)]
pub struct Archiver {
    current_file: PathBuf,
    archive_dir: PathBuf,
}

impl Archiver {
    pub fn new(current_file: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            current_file: current_file.into(),
            archive_dir: archive_dir.into(),
        }
    }

    pub fn current_file(&self) -> &Path {
        &self.current_file
    }

    pub fn year_path(&self, year: i32) -> PathBuf {
        self.archive_dir.join(year_file_name(year))
    }

    /// Overwrite every year file the partition touches, then the current file.
    ///
    /// Each file is fully replaced, so writing the same partition twice
    /// leaves the store unchanged. The current file is written last: if a
    /// year file fails, the current file still holds the events that were
    /// on their way out.
    pub fn write(&self, partition: &YearPartition) -> Result<(), Error> {
        for (year, events) in &partition.by_year {
            write_collection(&self.year_path(*year), events)?;
        }
        write_collection(&self.current_file, &partition.current)?;
        tracing::info!(
            current = partition.current.len(),
            archived = partition.len() - partition.current.len(),
            years = partition.by_year.len(),
            "archive written"
        );
        Ok(())
    }

    /// Partition and persist an in-memory collection.
    pub fn archive_events(&self, events: Vec<Event>, today: NaiveDate) -> Result<YearPartition, Error> {
        let partition = partition_events(events, today);
        self.write(&partition)?;
        Ok(partition)
    }

    /// Re-partition whatever the current file holds.
    ///
    /// A missing current file is not an error: nothing is written and `None`
    /// is returned.
    pub fn archive_store(&self, today: NaiveDate) -> Result<Option<YearPartition>, Error> {
        let Some(records) = read_collection_if_exists(&self.current_file)? else {
            tracing::warn!(path = %self.current_file.display(), "no current collection to archive");
            return Ok(None);
        };
        let partition = partition_records(records, today);
        self.write(&partition)?;
        Ok(Some(partition))
    }
}
