//! # Agent Service Module
//!
//! CRUD over the agents that uploaded lists are distributed to. All routes
//! live under `/api/agents` and require a logged-in user.
//!
//! - `GET /`: every agent, in creation order (the distribution order).
//! - `GET /{id}`: one agent, or 404.
//! - `POST /`: creates an agent. Name, email, mobile number and password are
//!   required; the email is stored lower-cased and must be unique.
//! - `PUT /{id}`: partial update with the same rules.
//! - `DELETE /{id}`: removes the agent. Records it already received stay.
//!
//! Passwords are stored as bcrypt hashes and never returned.

mod create;
mod delete;
mod list;
mod update;
mod validation;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/agents";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::all))
        .route("", post().to(create::process))
        .route("/{id}", get().to(list::one))
        .route("/{id}", put().to(update::process))
        .route("/{id}", delete().to(delete::process))
}
