//! Extraction job orchestration.
//!
//! A job moves through
//! `SourceFetching → (SourceMissing | ArchiveOpening) → (Rejected | Iterating) → Completed`.
//! The archive is walked on the blocking pool and entries are handed to the
//! async publisher over a channel of capacity one: entry order is preserved
//! and at most one decompressed entry is waiting at a time.

use std::ops::ControlFlow;
use std::sync::Arc;

use bytes::Bytes;
use tabvault_archive::{Classification, EntrySource, ExtractionTarget, PendingEntry, SkipReason};
use tabvault_store::ObjectStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{EntryError, ExtractError};
use crate::event::{ObjectRef, UploadInfo, parse_event};
use crate::outcome::{EntryFailure, EntryResult, ExtractionOutcome, OverallStatus};
use crate::publish::Publisher;

pub const DEFAULT_PREFIX: &str = "tabs";
pub const DEFAULT_TARGET_FOLDER: &str = "default";

/// Where extracted objects go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSettings {
    pub destination_bucket: String,
    pub prefix: String,
    pub default_target_folder: String,
}

impl ExtractSettings {
    pub fn new(destination_bucket: impl Into<String>) -> Self {
        Self {
            destination_bucket: destination_bucket.into(),
            prefix: DEFAULT_PREFIX.to_owned(),
            default_target_folder: DEFAULT_TARGET_FOLDER.to_owned(),
        }
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn default_target_folder(mut self, folder: impl Into<String>) -> Self {
        self.default_target_folder = folder.into();
        self
    }
}

/// An entry as it crosses from the archive walker to the publisher.
enum Staged {
    Skipped {
        name: String,
        reason: SkipReason,
    },
    Ready {
        name: String,
        target: ExtractionTarget,
        body: Bytes,
    },
    Failed(EntryFailure),
}

pub struct Extractor<S> {
    store: Arc<S>,
    settings: ExtractSettings,
}

impl<S: ObjectStore + 'static> Extractor<S> {
    pub fn new(store: Arc<S>, settings: ExtractSettings) -> Self {
        Self { store, settings }
    }

    pub fn settings(&self) -> &ExtractSettings {
        &self.settings
    }

    /// Run one job per record of a raw notification, in record order.
    pub async fn handle_event(&self, raw: &[u8]) -> Result<Vec<ExtractionOutcome>, ExtractError> {
        let sources = parse_event(raw)?;
        let mut outcomes = Vec::with_capacity(sources.len());
        for source in &sources {
            outcomes.push(self.extract(source).await);
        }
        Ok(outcomes)
    }

    /// Extract one archive object into the destination bucket.
    ///
    /// Never fails as a call: fatal conditions are reported through
    /// [`ExtractionOutcome::overall_status`]. The source object is deleted
    /// only when the job completes.
    #[tracing::instrument(skip_all, fields(source = %source))]
    pub async fn extract(&self, source: &ObjectRef) -> ExtractionOutcome {
        let mut outcome = ExtractionOutcome::new(source.clone());

        let object = match self.store.get(&source.bucket, &source.key).await {
            Ok(object) => object,
            Err(err) => {
                warn!(error = %err, "source archive unavailable");
                return outcome.abort(
                    OverallStatus::SourceMissing,
                    ExtractError::SourceMissing {
                        bucket: source.bucket.clone(),
                        key: source.key.clone(),
                        source: err,
                    },
                );
            }
        };

        let upload = UploadInfo::from_metadata(
            &object.meta.metadata,
            &self.settings.default_target_folder,
            &source.key,
        );
        outcome.target_folder = Some(upload.target_folder.clone());
        info!(
            target_folder = %upload.target_folder,
            original_filename = %upload.original_filename,
            bytes = object.body.len(),
            "processing archive"
        );

        let archive = match tabvault_archive::open(object.body) {
            Ok(archive) => archive,
            Err(err) => {
                warn!(error = %err, "archive rejected");
                return outcome.abort(OverallStatus::Rejected, ExtractError::CorruptArchive(err));
            }
        };
        outcome.format = Some(archive.format());

        if let Err(err) = self.iterate(archive, &upload, &mut outcome).await {
            warn!(error = %err, "archive rejected");
            return outcome.abort(OverallStatus::Rejected, ExtractError::CorruptArchive(err));
        }

        outcome.overall_status = OverallStatus::Completed;
        match self.store.delete(&source.bucket, &source.key).await {
            Ok(()) => outcome.source_deleted = true,
            Err(err) => warn!(error = %err, "could not delete source archive"),
        }

        info!(
            attempted = outcome.attempted_count,
            succeeded = outcome.succeeded_count,
            skipped = outcome.skipped_count,
            failed = outcome.failed_count(),
            source_deleted = outcome.source_deleted,
            "archive extraction completed"
        );
        outcome
    }

    /// Walk and publish every entry. `Err` only when the container failed
    /// before yielding anything.
    async fn iterate(
        &self,
        archive: Box<dyn EntrySource>,
        upload: &UploadInfo,
        outcome: &mut ExtractionOutcome,
    ) -> Result<(), tabvault_archive::Error> {
        let (tx, mut rx) = mpsc::channel(1);
        let prefix = self.settings.prefix.clone();
        let folder = upload.target_folder.clone();
        let walker = tokio::task::spawn_blocking(move || walk(archive, &prefix, &folder, tx));

        let publisher = Publisher::new(
            &*self.store,
            &self.settings.destination_bucket,
            &upload.original_filename,
        );
        let mut seen = 0usize;
        while let Some(staged) = rx.recv().await {
            seen += 1;
            let result = match staged {
                Staged::Skipped { name, reason } => {
                    debug!(entry = %name, %reason, "skipped");
                    EntryResult::Skipped { name, reason }
                }
                Staged::Ready { name, target, body } => publisher.publish(target, &name, body).await,
                Staged::Failed(failure) => {
                    warn!(entry = %failure.name, error = %failure.error, "entry read failed");
                    EntryResult::Failed(failure)
                }
            };
            outcome.record(result);
        }

        let walked = walker
            .await
            .map_err(|e| tabvault_archive::Error::Io(std::io::Error::other(e)))
            .and_then(|walked| walked);
        match walked {
            Ok(()) => Ok(()),
            Err(err) if seen == 0 => Err(err),
            Err(err) => {
                warn!(error = %err, entries = seen, "archive stream broke off");
                outcome.failures.push(EntryFailure::new(
                    upload.original_filename.clone(),
                    EntryError::Truncated(err),
                ));
                Ok(())
            }
        }
    }
}

/// Runs on the blocking pool. Stops early if the receiver goes away.
fn walk(
    archive: Box<dyn EntrySource>,
    prefix: &str,
    folder: &str,
    tx: mpsc::Sender<Staged>,
) -> tabvault_archive::Result<()> {
    archive.visit(&mut |pending| match tx.blocking_send(stage(pending, prefix, folder)) {
        Ok(()) => ControlFlow::Continue(()),
        Err(_) => ControlFlow::Break(()),
    })
}

fn stage(
    pending: tabvault_archive::Result<PendingEntry<'_>>,
    prefix: &str,
    folder: &str,
) -> Staged {
    let pending = match pending {
        Ok(pending) => pending,
        Err(err) => {
            let name = entry_label(&err);
            return Staged::Failed(EntryFailure::new(name, EntryError::ReadFailed(err)));
        }
    };

    match tabvault_archive::classify(pending.entry()) {
        Classification::Skip(reason) => Staged::Skipped {
            name: pending.entry().name.clone(),
            reason,
        },
        Classification::Eligible(path) => match pending.read_content() {
            Ok((entry, body)) => Staged::Ready {
                name: entry.name,
                target: ExtractionTarget::new(prefix, folder, path),
                body: Bytes::from(body),
            },
            Err(err) => Staged::Failed(EntryFailure::new(path, EntryError::ReadFailed(err))),
        },
    }
}

fn entry_label(err: &tabvault_archive::Error) -> String {
    match err {
        tabvault_archive::Error::EntryOpen {
            name: Some(name), ..
        } => name.clone(),
        tabvault_archive::Error::EntryOpen { index, .. } => format!("#{index}"),
        tabvault_archive::Error::EntryRead { name, .. } => name.clone(),
        _ => String::from("<unknown>"),
    }
}
