use super::validation::{present, validate_email, validate_password};
use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::store::AgentChanges;
use actix_web::{web, HttpResponse};
use common::model::agent::Agent;
use common::requests::UpdateAgentRequest;

pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    id: web::Path<String>,
    payload: web::Json<UpdateAgentRequest>,
) -> Result<HttpResponse, ApiError> {
    let state = state.into_inner();
    let id = id.into_inner();
    let agent = web::block(move || update_agent(&state, &id, payload.into_inner())).await??;
    Ok(HttpResponse::Ok().json(agent))
}

/// Only the fields present in the request change. The email must stay unique
/// among the other agents.
fn update_agent(state: &AppState, id: &str, req: UpdateAgentRequest) -> Result<Agent, ApiError> {
    let email = match present(req.email) {
        Some(email) => {
            validate_email(&email)?;
            Some(email.to_lowercase())
        }
        None => None,
    };
    let password_hash = match req.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password)?;
            Some(bcrypt::hash(&password, state.config.bcrypt_cost)?)
        }
        None => None,
    };

    if let Some(email) = &email {
        if let Some(existing) = state.agents.find_by_email(email)? {
            if existing.id != id {
                return Err(ApiError::bad_request("Email already exists"));
            }
        }
    }

    let changes = AgentChanges {
        name: present(req.name),
        email,
        mobile_number: present(req.mobile_number),
        password_hash,
    };
    state
        .agents
        .update(id, changes)?
        .ok_or_else(|| ApiError::not_found("Agent not found"))
}
