use crate::error::ApiError;
use crate::services::auth::token;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::LoginRequest;
use common::responses::LoginResponse;

pub(crate) async fn process(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let state = state.into_inner();
    let response = web::block(move || login(&state, payload.into_inner())).await??;
    Ok(HttpResponse::Ok().json(response))
}

/// Unknown email and wrong password get the same answer.
fn login(state: &AppState, req: LoginRequest) -> Result<LoginResponse, ApiError> {
    let (Some(email), Some(password)) = (
        req.email.filter(|e| !e.trim().is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let credentials = state
        .users
        .find_user_by_email(&email.trim().to_lowercase())?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
    if !bcrypt::verify(&password, &credentials.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = token::issue(
        &credentials.user,
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))?;

    Ok(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: credentials.user,
    })
}
