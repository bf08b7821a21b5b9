use super::token;
use crate::error::ApiError;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use common::model::user::User;
use futures_util::future::LocalBoxFuture;

/// The user behind a valid `Authorization: Bearer <token>` header.
///
/// Taking this as a handler argument is what makes a route require login.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let authorization = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| ApiError::Internal("application state missing".to_string()))?;
            let token = authorization
                .as_deref()
                .and_then(|value| value.strip_prefix("Bearer "))
                .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))?;
            let claims = token::verify(token, &state.config.jwt_secret)
                .map_err(|_| ApiError::unauthorized("Token is not valid"))?;

            let users = state.users.clone();
            let user = web::block(move || users.get_user(&claims.sub)).await??;
            user.map(AuthenticatedUser)
                .ok_or_else(|| ApiError::unauthorized("Token is not valid"))
        })
    }
}
