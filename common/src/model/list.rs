use crate::model::agent::AgentRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded row bound to an agent and a batch, ready to be written.
///
/// Records are append-only: once written they are never updated or deleted
/// by the service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssignedRecord {
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub agent_id: String,
    pub batch_id: String,
    /// 0-based index of the source row inside its batch.
    pub position: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// A stored record as returned by the list queries, with its agent populated.
///
/// `agent` is `None` when the agent was deleted after the batch was written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    #[serde(rename = "_id")]
    pub id: i64,
    pub first_name: String,
    pub phone: String,
    pub notes: String,
    pub agent_id: String,
    pub agent: Option<AgentRef>,
    pub batch_id: String,
    pub position: usize,
    pub uploaded_at: DateTime<Utc>,
}

/// Aggregate view of every record sharing one batch id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    #[serde(rename = "_id")]
    pub batch_id: String,
    pub total_records: usize,
    /// Earliest `uploaded_at` among the batch's records.
    pub uploaded_at: DateTime<Utc>,
    /// Each participating agent once, regardless of how many rows it received.
    pub agents: Vec<AgentRef>,
}
