use crate::model::user::User;
use serde::{Deserialize, Serialize};

/// Generic `{ "message": ... }` body used for errors and acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    pub user: User,
}

/// Outcome of a successful upload-and-distribute call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub message: String,
    pub total_records: usize,
    pub distributed_records: usize,
    pub batch_id: String,
}
