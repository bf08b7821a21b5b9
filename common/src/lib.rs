//! Types shared between the HTTP backend and any client of its JSON API.

pub mod model;
pub mod requests;
pub mod responses;
