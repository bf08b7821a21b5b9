//! Round-robin assignment of decoded rows to agents.

use super::decoder::RawRow;
use super::snapshot::AgentSnapshot;
use chrono::{DateTime, Utc};
use common::model::list::AssignedRecord;
use std::fmt;
use uuid::Uuid;

/// Identifier shared by every record of one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchId(String);

impl BatchId {
    /// `batch_<unix millis>_<8 hex chars>`; the random suffix keeps two uploads
    /// landing in the same millisecond apart.
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        BatchId(format!("batch_{}_{}", at.timestamp_millis(), &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

/// Row `i` goes to `snapshot.agent_for(i)`. Every row yields exactly one
/// record; nothing is skipped.
pub fn distribute(
    rows: Vec<RawRow>,
    snapshot: &AgentSnapshot,
    batch_id: &BatchId,
    uploaded_at: DateTime<Utc>,
) -> Vec<AssignedRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(position, row)| AssignedRecord {
            first_name: field(&row, "FirstName"),
            phone: field(&row, "Phone"),
            notes: field(&row, "Notes"),
            agent_id: snapshot.agent_for(position).id.clone(),
            batch_id: batch_id.as_str().to_string(),
            position,
            uploaded_at,
        })
        .collect()
}

fn field(row: &RawRow, column: &str) -> String {
    row.get(column).map(str::trim).unwrap_or_default().to_string()
}
