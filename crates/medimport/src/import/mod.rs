//! The import pipeline: a FIFO job queue driving enumeration and the
//! size-based copy reconciliation into the archive tree.

pub mod copier;
pub mod queue;

pub use copier::{destination_directory, import_files, quarter_bucket, ImportStats};
pub use queue::{CompletionCallback, ImportQueue, JobOutcome};
