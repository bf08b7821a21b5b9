use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// `GET /api/agents`
pub(crate) async fn all(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let agents = state.agents.clone();
    let all = web::block(move || agents.list_all()).await??;
    Ok(HttpResponse::Ok().json(all))
}

/// `GET /api/agents/{id}`
pub(crate) async fn one(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agents = state.agents.clone();
    let id = id.into_inner();
    let agent = web::block(move || agents.get(&id))
        .await??
        .ok_or_else(|| ApiError::not_found("Agent not found"))?;
    Ok(HttpResponse::Ok().json(agent))
}
