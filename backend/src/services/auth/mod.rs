//! # Authentication Service Module
//!
//! Routes under `/api/auth`:
//! - `POST /login`: exchanges an email and password for a signed bearer token.
//! - `GET /me`: returns the user the presented token belongs to.
//!
//! Every other protected route opts in by taking an [`AuthenticatedUser`]
//! argument.

mod extractor;
mod login;
mod me;
pub mod token;

pub use extractor::AuthenticatedUser;

use crate::config::AdminSeed;
use crate::error::ApiError;
use crate::store::UserStore;
use actix_web::web::{get, post, scope};
use actix_web::Scope;
use common::model::user::Role;
use log::info;

const API_PATH: &str = "/api/auth";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/login", post().to(login::process))
        .route("/me", get().to(me::process))
}

/// Creates the configured administrator unless a user with that email exists.
///
/// Returns whether a user was created.
pub fn ensure_admin(users: &dyn UserStore, seed: &AdminSeed, cost: u32) -> Result<bool, ApiError> {
    if users.find_user_by_email(&seed.email)?.is_some() {
        return Ok(false);
    }
    let hash = bcrypt::hash(&seed.password, cost)?;
    users.insert_user(&seed.email, &hash, Role::Admin)?;
    info!("created administrator account {}", seed.email);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{bearer, test_app, TestEnv, ADMIN_EMAIL, ADMIN_PASSWORD};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use common::responses::{CurrentUserResponse, LoginResponse, MessageResponse};
    use serde_json::json;

    #[::core::prelude::v1::test]
    fn admin_is_seeded_once() {
        let env = TestEnv::new();
        let seed = AdminSeed {
            email: "root@example.com".to_string(),
            password: "secret1".to_string(),
        };
        assert!(ensure_admin(&*env.store, &seed, 4).unwrap());
        assert!(!ensure_admin(&*env.store, &seed, 4).unwrap());
    }

    #[actix_web::test]
    async fn login_returns_a_usable_token() {
        let env = TestEnv::new();
        let app = test::init_service(test_app(&env)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL.to_uppercase(), "password": ADMIN_PASSWORD }))
            .to_request();
        let body: LoginResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.message, "Login successful");
        assert_eq!(body.user.email, ADMIN_EMAIL);

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {}", body.token)))
            .to_request();
        let me: CurrentUserResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me.user, body.user);
    }

    #[actix_web::test]
    async fn wrong_password_is_unauthorized() {
        let env = TestEnv::new();
        let app = test::init_service(test_app(&env)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL, "password": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Invalid credentials");
    }

    #[actix_web::test]
    async fn missing_fields_are_a_bad_request() {
        let env = TestEnv::new();
        let app = test::init_service(test_app(&env)).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": ADMIN_EMAIL }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn protected_routes_require_a_valid_token() {
        let env = TestEnv::new();
        let app = test::init_service(test_app(&env)).await;

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/agents")
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/agents")
            .insert_header(bearer(&env))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
