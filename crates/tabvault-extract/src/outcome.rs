use std::fmt::Display;

use serde::{Serialize, Serializer};
use tabvault_archive::{ArchiveFormat, SkipReason};

use crate::error::{EntryError, ExtractError};
use crate::event::ObjectRef;

/// Terminal state of one extraction job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum OverallStatus {
    /// The archive was opened and walked. Individual entries may still have failed.
    Completed,
    /// The archive could not be parsed; nothing was written.
    Rejected,
    /// The source object could not be fetched; nothing was attempted.
    SourceMissing,
}

#[derive(Debug, Serialize)]
pub struct EntryFailure {
    pub name: String,
    #[serde(rename = "reason", serialize_with = "display")]
    pub error: EntryError,
}

impl EntryFailure {
    pub fn new(name: impl Into<String>, error: EntryError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

/// What happened to one entry.
#[derive(Debug)]
pub enum EntryResult {
    Written { key: String },
    Skipped { name: String, reason: SkipReason },
    Failed(EntryFailure),
}

/// Aggregate result of one extraction job.
#[derive(Debug, Serialize)]
pub struct ExtractionOutcome {
    pub source: ObjectRef,
    pub target_folder: Option<String>,
    #[serde(serialize_with = "display_opt")]
    pub format: Option<ArchiveFormat>,
    /// Eligible entries, whether or not they were written.
    pub attempted_count: usize,
    pub succeeded_count: usize,
    pub skipped_count: usize,
    /// In archive order. A stream that broke off adds one trailing failure
    /// named after the archive; it is not counted as attempted.
    pub failures: Vec<EntryFailure>,
    /// Destination keys in archive order.
    pub written: Vec<String>,
    pub overall_status: OverallStatus,
    #[serde(serialize_with = "display_opt")]
    pub fatal: Option<ExtractError>,
    pub source_deleted: bool,
}

impl ExtractionOutcome {
    pub(crate) fn new(source: ObjectRef) -> Self {
        Self {
            source,
            target_folder: None,
            format: None,
            attempted_count: 0,
            succeeded_count: 0,
            skipped_count: 0,
            failures: Vec::new(),
            written: Vec::new(),
            overall_status: OverallStatus::Completed,
            fatal: None,
            source_deleted: false,
        }
    }

    pub(crate) fn abort(mut self, status: OverallStatus, error: ExtractError) -> Self {
        self.overall_status = status;
        self.fatal = Some(error);
        self
    }

    pub(crate) fn record(&mut self, result: EntryResult) {
        match result {
            EntryResult::Written { key } => {
                self.attempted_count += 1;
                self.succeeded_count += 1;
                self.written.push(key);
            }
            EntryResult::Skipped { .. } => self.skipped_count += 1,
            EntryResult::Failed(failure) => {
                self.attempted_count += 1;
                self.failures.push(failure);
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.overall_status == OverallStatus::Completed
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

fn display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_opt<T: Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}
