//! Upload pipeline.
//!
//! A file moves through the stages in this order, each returning a `Result`:
//!
//! 1. [`decoder`] turns CSV or spreadsheet bytes into [`RawRow`]s.
//! 2. [`validator`] checks the first row carries the required columns.
//! 3. [`snapshot`] captures the current, non-empty list of agents.
//! 4. [`distributor`] assigns row `i` to agent `i mod M` under one batch id.
//! 5. The records are bulk-written through the [`RecordStore`](crate::store::RecordStore).
//!
//! [`orchestrator`] sequences the stages and owns the staged upload file,
//! which is removed on every exit path.

pub mod blob;
pub mod decoder;
pub mod distributor;
pub mod orchestrator;
pub mod snapshot;
pub mod validator;

pub use decoder::{FileFormat, RawRow};
pub use orchestrator::{UploadError, UploadOrchestrator, UploadOutcome};
