//! # List Service Module
//!
//! Uploading contact lists and reading back how they were distributed. All
//! routes live under `/api/lists` and require a logged-in user.
//!
//! - `POST /upload`: multipart/form-data with a `file` part (`.csv`, `.xlsx`
//!   or `.xls`). The rows are handed to the upload pipeline, which assigns
//!   them round-robin to the current agents under a new batch id.
//! - `GET /agent/{agent_id}`: records assigned to one agent, newest first.
//! - `GET /batches`: one summary per batch with its participating agents.
//! - `GET /batch/{batch_id}`: every record of a batch in distribution order.

mod batches;
mod by_agent;
mod by_batch;
mod upload;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/lists";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/upload", post().to(upload::process))
        .route("/agent/{agent_id}", get().to(by_agent::process))
        .route("/batches", get().to(batches::process))
        .route("/batch/{batch_id}", get().to(by_batch::process))
}
