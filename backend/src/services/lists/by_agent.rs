use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/lists/agent/{agent_id}`: newest records first. An unknown agent
/// simply has no records.
pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    agent_id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let records = state.records.clone();
    let agent_id = agent_id.into_inner();
    let entries = web::block(move || records.query_by_agent(&agent_id)).await??;
    Ok(HttpResponse::Ok().json(entries))
}
