use super::{
    AgentChanges, AgentStore, NewAgent, RecordStore, StoreError, UserCredentials, UserStore,
};
use chrono::Utc;
use common::model::agent::{Agent, AgentRef};
use common::model::list::{AssignedRecord, BatchSummary, ListEntry};
use common::model::user::{Role, User};
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS agents (
    seq           INTEGER PRIMARY KEY AUTOINCREMENT,
    id            TEXT NOT NULL UNIQUE,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    mobile_number TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS lists (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name  TEXT NOT NULL,
    phone       TEXT NOT NULL,
    notes       TEXT NOT NULL DEFAULT '',
    agent_id    TEXT NOT NULL,
    batch_id    TEXT NOT NULL,
    position    INTEGER NOT NULL,
    uploaded_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_lists_agent_batch ON lists (agent_id, batch_id);
CREATE INDEX IF NOT EXISTS idx_lists_batch_position ON lists (batch_id, position);
";

const AGENT_COLUMNS: &str = "id, name, email, mobile_number, created_at, updated_at";

const ENTRY_SELECT: &str = "
SELECT l.id, l.first_name, l.phone, l.notes, l.agent_id, a.id, a.name, a.email,
       l.batch_id, l.position, l.uploaded_at
FROM lists l
LEFT JOIN agents a ON a.id = l.agent_id";

/// SQLite-backed implementation of every store trait.
///
/// One connection behind a mutex. Callers run on the blocking thread pool.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }

    fn query_entries(
        &self,
        filter_and_order: &str,
        key: &str,
    ) -> Result<Vec<ListEntry>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{ENTRY_SELECT} {filter_and_order}"))?;
        let entries = stmt
            .query_map(params![key], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

fn agent_from_row(row: &Row) -> rusqlite::Result<Agent> {
    Ok(Agent {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        mobile_number: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn entry_from_row(row: &Row) -> rusqlite::Result<ListEntry> {
    let agent = match row.get::<_, Option<String>>(5)? {
        Some(id) => Some(AgentRef {
            id,
            name: row.get(6)?,
            email: row.get(7)?,
        }),
        None => None,
    };
    Ok(ListEntry {
        id: row.get(0)?,
        first_name: row.get(1)?,
        phone: row.get(2)?,
        notes: row.get(3)?,
        agent_id: row.get(4)?,
        agent,
        batch_id: row.get(8)?,
        position: row.get::<_, i64>(9)? as usize,
        uploaded_at: row.get(10)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

fn role_at(row: &Row, idx: usize) -> rusqlite::Result<Role> {
    match row.get::<_, String>(idx)?.as_str() {
        "admin" => Ok(Role::Admin),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown role '{other}'").into(),
        )),
    }
}

impl AgentStore for SqliteStore {
    fn list_all(&self) -> Result<Vec<Agent>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {AGENT_COLUMNS} FROM agents ORDER BY seq"))?;
        let agents = stmt
            .query_map([], agent_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(agents)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM agents", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn get(&self, id: &str) -> Result<Option<Agent>, StoreError> {
        let conn = self.lock()?;
        let agent = conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                params![id],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StoreError> {
        let conn = self.lock()?;
        let agent = conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE email = ?1"),
                params![email],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    fn insert(&self, agent: NewAgent) -> Result<Agent, StoreError> {
        let now = Utc::now();
        let created = Agent {
            id: uuid::Uuid::new_v4().to_string(),
            name: agent.name,
            email: agent.email,
            mobile_number: agent.mobile_number,
            created_at: now,
            updated_at: now,
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO agents (id, name, email, mobile_number, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                created.id,
                created.name,
                created.email,
                created.mobile_number,
                agent.password_hash,
                created.created_at,
                created.updated_at
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(created.email.clone())
            } else {
                e.into()
            }
        })?;
        Ok(created)
    }

    fn update(&self, id: &str, changes: AgentChanges) -> Result<Option<Agent>, StoreError> {
        let conn = self.lock()?;
        let email = changes.email.clone();
        let updated = conn
            .execute(
                "UPDATE agents SET
                    name = COALESCE(?1, name),
                    email = COALESCE(?2, email),
                    mobile_number = COALESCE(?3, mobile_number),
                    password_hash = COALESCE(?4, password_hash),
                    updated_at = ?5
                 WHERE id = ?6",
                params![
                    changes.name,
                    changes.email,
                    changes.mobile_number,
                    changes.password_hash,
                    Utc::now(),
                    id
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::DuplicateEmail(email.unwrap_or_default())
                } else {
                    e.into()
                }
            })?;
        if updated == 0 {
            return Ok(None);
        }

        let agent = conn
            .query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                params![id],
                agent_from_row,
            )
            .optional()?;
        Ok(agent)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM agents WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}

impl RecordStore for SqliteStore {
    fn bulk_insert(&self, records: &[AssignedRecord]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO lists (first_name, phone, notes, agent_id, batch_id, position, uploaded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.first_name,
                    record.phone,
                    record.notes,
                    record.agent_id,
                    record.batch_id,
                    record.position as i64,
                    record.uploaded_at
                ])?;
            }
        }
        tx.commit()?;
        debug!("bulk insert wrote {} list records", records.len());
        Ok(records.len())
    }

    fn query_by_agent(&self, agent_id: &str) -> Result<Vec<ListEntry>, StoreError> {
        self.query_entries(
            "WHERE l.agent_id = ?1 ORDER BY l.uploaded_at DESC, l.id DESC",
            agent_id,
        )
    }

    fn query_batch_aggregates(&self) -> Result<Vec<BatchSummary>, StoreError> {
        let conn = self.lock()?;

        let mut agents_by_batch: HashMap<String, Vec<AgentRef>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT DISTINCT l.batch_id, a.id, a.name, a.email, a.seq
             FROM lists l
             JOIN agents a ON a.id = l.agent_id
             ORDER BY l.batch_id, a.seq",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                AgentRef {
                    id: row.get(1)?,
                    name: row.get(2)?,
                    email: row.get(3)?,
                },
            ))
        })?;
        for row in rows {
            let (batch_id, agent) = row?;
            agents_by_batch.entry(batch_id).or_default().push(agent);
        }

        let mut stmt = conn.prepare(
            "SELECT batch_id, COUNT(*), MIN(uploaded_at)
             FROM lists
             GROUP BY batch_id
             ORDER BY MIN(uploaded_at) DESC, MAX(id) DESC",
        )?;
        let summaries = stmt
            .query_map([], |row| {
                let batch_id: String = row.get(0)?;
                Ok(BatchSummary {
                    total_records: row.get::<_, i64>(1)? as usize,
                    uploaded_at: row.get(2)?,
                    agents: Vec::new(),
                    batch_id,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries
            .into_iter()
            .map(|mut summary| {
                summary.agents = agents_by_batch
                    .remove(&summary.batch_id)
                    .unwrap_or_default();
                summary
            })
            .collect())
    }

    fn query_by_batch(&self, batch_id: &str) -> Result<Vec<ListEntry>, StoreError> {
        self.query_entries(
            "WHERE l.batch_id = ?1 ORDER BY l.uploaded_at ASC, l.position ASC, l.id ASC",
            batch_id,
        )
    }
}

impl UserStore for SqliteStore {
    fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>, StoreError> {
        let conn = self.lock()?;
        let credentials = conn
            .query_row(
                "SELECT id, email, role, password_hash FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserCredentials {
                        user: User {
                            id: row.get(0)?,
                            email: row.get(1)?,
                            role: role_at(row, 2)?,
                        },
                        password_hash: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, email, role FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        role: role_at(row, 2)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<User, StoreError> {
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
        };
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.id, user.email, password_hash, role.as_str(), Utc::now()],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(email.to_string())
            } else {
                e.into()
            }
        })?;
        Ok(user)
    }
}
