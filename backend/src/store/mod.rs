//! Storage collaborators.
//!
//! The pipeline and the HTTP handlers only see these traits; [`SqliteStore`]
//! is the one implementation shipped with the service. All methods are
//! synchronous and are called from the blocking thread pool.

mod sqlite;

use common::model::agent::{Agent, AgentRef};
use common::model::list::{AssignedRecord, BatchSummary, ListEntry};
use common::model::user::{Role, User};

pub use sqlite::SqliteStore;

/// All errors that can be returned by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint (agent or user email) was violated.
    #[error("email already exists: {0}")]
    DuplicateEmail(String),

    /// A backend-specific error (connection, SQL, poisoned lock, ...).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// A user row including the credential hash, for login checks only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Fields of a new agent. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub email: String,
    pub mobile_number: String,
    pub password_hash: String,
}

/// Partial update of an agent; `None` leaves the column as it is.
#[derive(Debug, Clone, Default)]
pub struct AgentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile_number: Option<String>,
    pub password_hash: Option<String>,
}

pub trait AgentStore: Send + Sync {
    /// Every agent, oldest first. This order defines the distribution order.
    fn list_all(&self) -> Result<Vec<Agent>, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;

    fn get(&self, id: &str) -> Result<Option<Agent>, StoreError>;

    fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StoreError>;

    fn insert(&self, agent: NewAgent) -> Result<Agent, StoreError>;

    /// Returns `None` when no agent has the given id.
    fn update(&self, id: &str, changes: AgentChanges) -> Result<Option<Agent>, StoreError>;

    /// Returns `false` when no agent has the given id.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// The distribution targets, in `list_all` order.
    fn list_refs(&self) -> Result<Vec<AgentRef>, StoreError> {
        Ok(self.list_all()?.iter().map(Agent::to_ref).collect())
    }
}

pub trait RecordStore: Send + Sync {
    /// Writes every record or none of them. Returns the number written.
    fn bulk_insert(&self, records: &[AssignedRecord]) -> Result<usize, StoreError>;

    /// Records assigned to one agent, newest first.
    fn query_by_agent(&self, agent_id: &str) -> Result<Vec<ListEntry>, StoreError>;

    /// One summary per batch, newest batch first.
    fn query_batch_aggregates(&self) -> Result<Vec<BatchSummary>, StoreError>;

    /// Records of one batch in their original distribution order.
    fn query_by_batch(&self, batch_id: &str) -> Result<Vec<ListEntry>, StoreError>;
}

pub trait UserStore: Send + Sync {
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError>;

    fn get_user(&self, id: &str) -> Result<Option<User>, StoreError>;

    fn insert_user(&self, email: &str, password_hash: &str, role: Role)
        -> Result<User, StoreError>;
}
