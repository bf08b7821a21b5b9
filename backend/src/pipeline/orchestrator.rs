//! Runs one upload from raw bytes to persisted batch.
//!
//! Stages, in order: `Received -> Decoded -> Validated -> AgentsSnapshotted ->
//! Distributed -> Persisted -> CleanedUp`. Any failure jumps to `Aborted`.
//! Size and format are checked at `Received`, before anything is staged. Once
//! the upload is staged its blob is deleted on every path, success or not.

use super::blob::{BlobHandle, TempBlobStorage};
use super::decoder::{self, DecodeError, FileFormat};
use super::distributor::{self, BatchId};
use super::snapshot::{AgentSnapshot, NoAgentsError};
use super::validator::{self, SchemaError};
use crate::config::UploadPolicy;
use crate::store::{AgentStore, RecordStore, StoreError};
use chrono::Utc;
use log::{debug, info, warn};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Decoded,
    Validated,
    AgentsSnapshotted,
    Distributed,
    Persisted,
    CleanedUp,
    Aborted,
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UploadStage::Received => "received",
            UploadStage::Decoded => "decoded",
            UploadStage::Validated => "validated",
            UploadStage::AgentsSnapshotted => "agents snapshotted",
            UploadStage::Distributed => "distributed",
            UploadStage::Persisted => "persisted",
            UploadStage::CleanedUp => "cleaned up",
            UploadStage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Everything that can end an upload. None of these are retried.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,
    #[error("File too large: the limit is {limit} bytes")]
    SizeLimit { limit: usize },
    #[error("Only CSV, XLSX, and XLS files are allowed")]
    UnsupportedFormat { filename: String },
    #[error("could not stage upload: {0}")]
    Staging(#[source] io::Error),
    #[error("Invalid file: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    NoAgents(#[from] NoAgentsError),
    #[error("could not read agents: {0}")]
    AgentStore(#[source] StoreError),
    #[error("could not save distributed records: {0}")]
    Persistence(#[source] StoreError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOutcome {
    pub total_records: usize,
    pub distributed_records: usize,
    pub batch_id: BatchId,
}

pub struct UploadOrchestrator {
    agents: Arc<dyn AgentStore>,
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn TempBlobStorage>,
    policy: UploadPolicy,
}

impl UploadOrchestrator {
    pub fn new(
        agents: Arc<dyn AgentStore>,
        records: Arc<dyn RecordStore>,
        blobs: Arc<dyn TempBlobStorage>,
        policy: UploadPolicy,
    ) -> Self {
        Self {
            agents,
            records,
            blobs,
            policy,
        }
    }

    pub fn check_format(&self, filename: &str) -> Result<FileFormat, UploadError> {
        FileFormat::from_filename(filename).ok_or_else(|| UploadError::UnsupportedFormat {
            filename: filename.to_string(),
        })
    }

    pub fn check_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.policy.max_file_size {
            return Err(UploadError::SizeLimit {
                limit: self.policy.max_file_size,
            });
        }
        Ok(())
    }

    /// Decodes, validates, distributes and persists one uploaded file.
    pub fn upload_and_distribute(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<UploadOutcome, UploadError> {
        let format = self.check_format(filename)?;
        self.check_size(bytes.len())?;
        debug!("upload '{}' {} ({} bytes)", filename, UploadStage::Received, bytes.len());

        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let handle = self
            .blobs
            .store(&extension, bytes)
            .map_err(UploadError::Staging)?;

        let mut stage = UploadStage::Received;
        let result = self.process_staged(&handle, format, &mut stage);

        let key = handle.key().to_string();
        if let Err(err) = self.blobs.delete(handle) {
            warn!("could not remove staged upload {}: {}", key, err);
        }

        match &result {
            Ok(outcome) => info!(
                "upload '{}' {}: {} records distributed as {}",
                filename,
                UploadStage::CleanedUp,
                outcome.distributed_records,
                outcome.batch_id
            ),
            Err(err) => warn!(
                "upload '{}' {} after stage '{}': {}",
                filename,
                UploadStage::Aborted,
                stage,
                err
            ),
        }
        result
    }

    fn process_staged(
        &self,
        handle: &BlobHandle,
        format: FileFormat,
        stage: &mut UploadStage,
    ) -> Result<UploadOutcome, UploadError> {
        let bytes = self.blobs.read(handle).map_err(UploadError::Staging)?;

        let rows = decoder::decode(&bytes, format)?;
        advance(stage, UploadStage::Decoded);

        validator::validate(&rows)
            .inspect_err(|err| debug!("missing columns: {}", err.missing().join(", ")))?;
        advance(stage, UploadStage::Validated);

        let agents = self.agents.list_refs().map_err(UploadError::AgentStore)?;
        let snapshot = AgentSnapshot::new(agents)?;
        debug!("{} rows over {} agents", rows.len(), snapshot.len());
        advance(stage, UploadStage::AgentsSnapshotted);

        let uploaded_at = Utc::now();
        let batch_id = BatchId::generate(uploaded_at);
        let total_records = rows.len();
        let records = distributor::distribute(rows, &snapshot, &batch_id, uploaded_at);
        advance(stage, UploadStage::Distributed);

        let distributed_records = self
            .records
            .bulk_insert(&records)
            .map_err(UploadError::Persistence)?;
        advance(stage, UploadStage::Persisted);

        Ok(UploadOutcome {
            total_records,
            distributed_records,
            batch_id,
        })
    }
}

fn advance(stage: &mut UploadStage, next: UploadStage) {
    debug!("upload stage: {} -> {}", stage, next);
    *stage = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewAgent, SqliteStore};
    use common::model::list::{AssignedRecord, BatchSummary, ListEntry};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory blob storage that counts every call.
    #[derive(Default)]
    struct RecordingBlobs {
        blobs: Mutex<HashMap<String, Vec<u8>>>,
        stores: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl TempBlobStorage for RecordingBlobs {
        fn store(&self, extension: &str, bytes: &[u8]) -> io::Result<BlobHandle> {
            let n = self.stores.fetch_add(1, Ordering::SeqCst);
            let key = format!("blob-{n}.{extension}");
            self.blobs
                .lock()
                .unwrap()
                .insert(key.clone(), bytes.to_vec());
            Ok(BlobHandle::new(key))
        }

        fn read(&self, handle: &BlobHandle) -> io::Result<Vec<u8>> {
            self.blobs
                .lock()
                .unwrap()
                .get(handle.key())
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn delete(&self, handle: BlobHandle) -> io::Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.blobs.lock().unwrap().remove(handle.key());
            Ok(())
        }
    }

    /// Record store whose bulk write always fails.
    struct FailingRecords;

    impl RecordStore for FailingRecords {
        fn bulk_insert(&self, _records: &[AssignedRecord]) -> Result<usize, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }

        fn query_by_agent(&self, _agent_id: &str) -> Result<Vec<ListEntry>, StoreError> {
            Ok(Vec::new())
        }

        fn query_batch_aggregates(&self) -> Result<Vec<BatchSummary>, StoreError> {
            Ok(Vec::new())
        }

        fn query_by_batch(&self, _batch_id: &str) -> Result<Vec<ListEntry>, StoreError> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        store: Arc<SqliteStore>,
        blobs: Arc<RecordingBlobs>,
        orchestrator: UploadOrchestrator,
    }

    fn fixture(agent_names: &[&str]) -> Fixture {
        fixture_with_limit(agent_names, 1024)
    }

    fn fixture_with_limit(agent_names: &[&str], max_file_size: usize) -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        for name in agent_names {
            store
                .insert(NewAgent {
                    name: name.to_string(),
                    email: format!("{}@example.com", name.to_lowercase()),
                    mobile_number: "+15550000".to_string(),
                    password_hash: "hash".to_string(),
                })
                .unwrap();
        }
        let blobs = Arc::new(RecordingBlobs::default());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            store.clone(),
            blobs.clone(),
            UploadPolicy {
                max_file_size,
                ..UploadPolicy::default()
            },
        );
        Fixture {
            store,
            blobs,
            orchestrator,
        }
    }

    impl Fixture {
        fn deletes(&self) -> usize {
            self.blobs.deletes.load(Ordering::SeqCst)
        }

        fn stores(&self) -> usize {
            self.blobs.stores.load(Ordering::SeqCst)
        }

        fn written(&self) -> usize {
            self.store
                .query_batch_aggregates()
                .unwrap()
                .iter()
                .map(|b| b.total_records)
                .sum()
        }
    }

    const THREE_ROWS: &[u8] = b"FirstName,Phone,Notes\nA,1,\nB,2,vip\nC,3,\n";

    #[test]
    fn csv_upload_is_distributed_round_robin_and_cleaned_up() {
        let fx = fixture(&["X", "Y"]);
        let outcome = fx
            .orchestrator
            .upload_and_distribute("leads.csv", THREE_ROWS)
            .unwrap();

        assert_eq!(outcome.total_records, 3);
        assert_eq!(outcome.distributed_records, 3);
        assert_eq!(fx.deletes(), 1);
        assert!(fx.blobs.blobs.lock().unwrap().is_empty());

        let entries = fx.store.query_by_batch(outcome.batch_id.as_str()).unwrap();
        let assignment: Vec<_> = entries
            .iter()
            .map(|e| {
                (
                    e.first_name.as_str(),
                    e.agent.as_ref().map(|a| a.name.as_str()),
                )
            })
            .collect();
        assert_eq!(
            assignment,
            vec![("A", Some("X")), ("B", Some("Y")), ("C", Some("X"))]
        );
        assert_eq!(entries[1].notes, "vip");

        let batches = fx.store.query_batch_aggregates().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].total_records, 3);
        assert_eq!(batches[0].agents.len(), 2);
    }

    #[test]
    fn empty_file_fails_schema_without_writes() {
        let fx = fixture(&["X"]);
        let err = fx
            .orchestrator
            .upload_and_distribute("empty.csv", b"")
            .unwrap_err();
        assert!(matches!(err, UploadError::Schema(SchemaError::Empty)));
        assert_eq!(fx.written(), 0);
        assert_eq!(fx.deletes(), 1);
    }

    #[test]
    fn schema_is_checked_before_agents_are_looked_up() {
        let fx = fixture(&[]);
        let err = fx
            .orchestrator
            .upload_and_distribute("leads.csv", b"FirstName,Notes\nA,x\n")
            .unwrap_err();
        match err {
            UploadError::Schema(schema) => assert_eq!(schema.missing(), vec!["Phone"]),
            other => panic!("expected a schema error, got {other:?}"),
        }
        assert_eq!(fx.deletes(), 1);
    }

    #[test]
    fn no_agents_aborts_before_writing() {
        let fx = fixture(&[]);
        let err = fx
            .orchestrator
            .upload_and_distribute("leads.csv", THREE_ROWS)
            .unwrap_err();
        assert!(matches!(err, UploadError::NoAgents(_)));
        assert_eq!(fx.written(), 0);
        assert_eq!(fx.deletes(), 1);
    }

    #[test]
    fn malformed_file_is_a_decode_error() {
        let fx = fixture(&["X"]);
        let err = fx
            .orchestrator
            .upload_and_distribute("leads.xlsx", b"not a zip archive")
            .unwrap_err();
        assert!(matches!(err, UploadError::Decode(_)));
        assert_eq!(fx.deletes(), 1);
    }

    #[test]
    fn persistence_failure_still_cleans_up() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store
            .insert(NewAgent {
                name: "X".to_string(),
                email: "x@example.com".to_string(),
                mobile_number: "1".to_string(),
                password_hash: "hash".to_string(),
            })
            .unwrap();
        let blobs = Arc::new(RecordingBlobs::default());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            Arc::new(FailingRecords),
            blobs.clone(),
            UploadPolicy::default(),
        );

        let err = orchestrator
            .upload_and_distribute("leads.csv", THREE_ROWS)
            .unwrap_err();
        assert!(matches!(err, UploadError::Persistence(_)));
        assert_eq!(blobs.deletes.load(Ordering::SeqCst), 1);
        assert!(store.query_batch_aggregates().unwrap().is_empty());
    }

    #[test]
    fn rejected_uploads_are_never_staged() {
        let fx = fixture(&["X"]);

        let err = fx
            .orchestrator
            .upload_and_distribute("leads.txt", THREE_ROWS)
            .unwrap_err();
        assert!(matches!(err, UploadError::UnsupportedFormat { .. }));

        let oversized = vec![b'a'; 2048];
        let err = fx
            .orchestrator
            .upload_and_distribute("leads.csv", &oversized)
            .unwrap_err();
        assert!(matches!(err, UploadError::SizeLimit { limit: 1024 }));

        assert_eq!(fx.stores(), 0);
        assert_eq!(fx.deletes(), 0);
    }

    #[test]
    fn xlsx_upload_stores_numeric_phone_as_text() {
        let fx = fixture_with_limit(&["X", "Y"], 64 * 1024);
        let outcome = fx
            .orchestrator
            .upload_and_distribute("leads.XLSX", &decoder::sample_workbook())
            .unwrap();

        assert_eq!(outcome.total_records, 2);
        assert_eq!(fx.deletes(), 1);

        let entries = fx.store.query_by_batch(outcome.batch_id.as_str()).unwrap();
        let stored: Vec<_> = entries
            .iter()
            .map(|e| (e.first_name.as_str(), e.phone.as_str(), e.notes.as_str()))
            .collect();
        assert_eq!(
            stored,
            vec![("Ann", "15551234567", ""), ("Bob", "555-0102", "vip")]
        );
    }

    #[test]
    fn each_upload_gets_a_new_batch() {
        let fx = fixture(&["X", "Y"]);
        let first = fx
            .orchestrator
            .upload_and_distribute("leads.csv", THREE_ROWS)
            .unwrap();
        let second = fx
            .orchestrator
            .upload_and_distribute("leads.csv", THREE_ROWS)
            .unwrap();
        assert_ne!(first.batch_id, second.batch_id);
        assert_eq!(fx.store.query_batch_aggregates().unwrap().len(), 2);
        assert_eq!(fx.deletes(), 2);
    }
}
