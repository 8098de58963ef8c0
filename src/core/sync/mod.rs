//! High-level registration and export operations
//!
//! - [`bulk`] - bulk registration through asynchronous bulk-create tasks
//! - [`single`] - per-record sync with deduplicated components
//! - [`export`] - incremental JSON Lines export of registered records
//! - [`records`] - input document parsing and target resolution
//! - [`results`] - assay run creation and result upload
//! - [`summary`] - run summaries and per-record errors

pub mod bulk;
pub mod export;
pub mod records;
pub mod results;
pub mod single;
pub mod summary;

pub use bulk::BulkRegistration;
pub use export::{parse_since, ExportReport, IncrementalExport};
pub use records::{load_records, parse_records, SourceRecord, SyncTargets};
pub use results::{
    load_results, parse_results, AssayResultUpload, ResultBatch, ResultTargets, ResultUploadReport,
};
pub use single::RecordSync;
pub use summary::{RegisteredRecord, SyncError, SyncErrorKind, SyncSummary};
