use super::validation::{present, validate_email, validate_password};
use crate::error::ApiError;
use crate::services::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::store::NewAgent;
use actix_web::{web, HttpResponse};
use common::model::agent::Agent;
use common::requests::CreateAgentRequest;
use log::info;

pub(crate) async fn process(
    state: web::Data<AppState>,
    _user: AuthenticatedUser,
    payload: web::Json<CreateAgentRequest>,
) -> Result<HttpResponse, ApiError> {
    let state = state.into_inner();
    let agent = web::block(move || create_agent(&state, payload.into_inner())).await??;
    Ok(HttpResponse::Created().json(agent))
}

pub(crate) fn create_agent(state: &AppState, req: CreateAgentRequest) -> Result<Agent, ApiError> {
    let (Some(name), Some(email), Some(mobile_number), Some(password)) = (
        present(req.name),
        present(req.email),
        present(req.mobile_number),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("All fields are required"));
    };

    validate_email(&email)?;
    validate_password(&password)?;

    let email = email.to_lowercase();
    if state.agents.find_by_email(&email)?.is_some() {
        return Err(ApiError::bad_request("Email already exists"));
    }

    let agent = state.agents.insert(NewAgent {
        name,
        email,
        mobile_number,
        password_hash: bcrypt::hash(&password, state.config.bcrypt_cost)?,
    })?;
    info!("created agent {} <{}>", agent.id, agent.email);
    Ok(agent)
}
