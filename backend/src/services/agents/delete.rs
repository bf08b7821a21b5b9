use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::responses::MessageResponse;
use log::info;

/// Records already distributed to the agent are left in place.
pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let agents = state.agents.clone();
    let id = id.into_inner();
    let target = id.clone();
    if !web::block(move || agents.delete(&target)).await?? {
        return Err(ApiError::not_found("Agent not found"));
    }
    info!("deleted agent {}", id);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Agent deleted successfully")))
}
