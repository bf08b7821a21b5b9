//! Error type returned by every HTTP handler.
//!
//! Bodies are always `{ "message": ... }`. Server-side failures are logged in
//! full and reported to the client as a generic "Server error".

use crate::pipeline::UploadError;
use crate::store::StoreError;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::MessageResponse;
use log::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn client_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::DuplicateEmail(_)) => "Email already exists".to_string(),
            _ if self.status_code().is_server_error() => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<BlockingError> for ApiError {
    fn from(err: BlockingError) -> Self {
        ApiError::Internal(format!("blocking task failed: {err}"))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {err}"))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upload(err) => match err {
                UploadError::SizeLimit { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                UploadError::MissingFile
                | UploadError::UnsupportedFormat { .. }
                | UploadError::Decode(_)
                | UploadError::Schema(_)
                | UploadError::NoAgents(_) => StatusCode::BAD_REQUEST,
                UploadError::Staging(_)
                | UploadError::AgentStore(_)
                | UploadError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Store(StoreError::DuplicateEmail(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Backend(_)) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }
        HttpResponse::build(status).json(MessageResponse::new(self.client_message()))
    }
}
