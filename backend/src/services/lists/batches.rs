use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/lists/batches`
pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let records = state.records.clone();
    let batches = web::block(move || records.query_batch_aggregates()).await??;
    Ok(HttpResponse::Ok().json(batches))
}
