use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/lists/batch/{batch_id}`: records in distribution order.
pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    batch_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let records = state.records.clone();
    let batch_id = batch_id.into_inner();
    let entries = web::block(move || records.query_by_batch(&batch_id)).await??;
    Ok(HttpResponse::Ok().json(entries))
}
