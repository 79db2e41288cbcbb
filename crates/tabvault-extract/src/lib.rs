//! Archive extraction for object-store uploads.
//!
//! An uploaded archive object is fetched, walked entry by entry, and every
//! eligible regular file is written back as its own object under
//! `<prefix>/<target-folder>/<path>` with provenance metadata. The source
//! archive is deleted once the walk completes.
//!
//! # Architecture
//!
//! - `event.rs` - Trigger notifications and upload metadata
//! - `extractor.rs` - Job state machine and the walker/publisher pipeline
//! - `publish.rs` - Destination writes and provenance metadata
//! - `outcome.rs` - Per-entry results and the job summary

pub use error::{EntryError, ExtractError};
pub use event::{
    ORIGINAL_FILENAME_KEY, ObjectRef, TARGET_FOLDER_KEY, UPLOAD_TIMESTAMP_KEY, UploadInfo,
    decode_key, parse_event,
};
pub use extractor::{DEFAULT_PREFIX, DEFAULT_TARGET_FOLDER, ExtractSettings, Extractor};
pub use outcome::{EntryFailure, EntryResult, ExtractionOutcome, OverallStatus};
pub use publish::{
    EXTRACTED_FROM_KEY, FILE_SIZE_KEY, ORIGINAL_PATH_KEY, Publisher, SOURCE_ARCHIVE_KEY,
};

mod error;
mod event;
mod extractor;
mod outcome;
mod publish;
