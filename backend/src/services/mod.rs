pub mod agents;
pub mod auth;
pub mod lists;

use crate::error::ApiError;
use actix_web::{web, HttpResponse};
use common::responses::MessageResponse;

const JSON_LIMIT: usize = 1024 * 1024;

/// Registers the liveness route and every API scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health))
        .service(auth::configure_routes())
        .service(agents::configure_routes())
        .service(lists::configure_routes());
}

/// JSON extractor settings; rejected bodies answer with `{ "message": ... }`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            ApiError::bad_request(format!("Invalid request body: {err}")).into()
        })
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse::new("Agent Management API is running!"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::{AdminSeed, AppConfig, UploadPolicy};
    use crate::pipeline::blob::DiskBlobStorage;
    use crate::services::auth::{ensure_admin, token};
    use crate::state::AppState;
    use crate::store::{AgentStore, NewAgent, SqliteStore, UserStore};
    use actix_web::body::MessageBody;
    use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
    use actix_web::{web, App};
    use common::model::agent::Agent;
    use std::sync::Arc;
    use tempfile::TempDir;

    pub const ADMIN_EMAIL: &str = "admin@example.com";
    pub const ADMIN_PASSWORD: &str = "admin123";
    const BCRYPT_TEST_COST: u32 = 4;

    /// An in-memory store with a seeded administrator and a scratch upload
    /// directory, dropped with the value.
    pub struct TestEnv {
        pub store: Arc<SqliteStore>,
        pub state: web::Data<AppState>,
        _dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self::with_max_file_size(64 * 1024)
        }

        pub fn with_max_file_size(max_file_size: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = AppConfig {
                jwt_secret: "test-secret".to_string(),
                bcrypt_cost: BCRYPT_TEST_COST,
                upload: UploadPolicy {
                    upload_dir: dir.path().to_path_buf(),
                    max_file_size,
                },
                ..AppConfig::default()
            };
            let store = Arc::new(SqliteStore::open_in_memory().unwrap());
            let seed = AdminSeed {
                email: ADMIN_EMAIL.to_string(),
                password: ADMIN_PASSWORD.to_string(),
            };
            ensure_admin(&*store, &seed, BCRYPT_TEST_COST).unwrap();

            let blobs = Arc::new(DiskBlobStorage::new(dir.path()).unwrap());
            let state = web::Data::new(AppState::new(config, store.clone(), blobs));
            Self {
                store,
                state,
                _dir: dir,
            }
        }

        /// Inserts an agent directly, bypassing the HTTP validation.
        pub fn agent(&self, name: &str, email: &str) -> Agent {
            self.store
                .insert(NewAgent {
                    name: name.to_string(),
                    email: email.to_string(),
                    mobile_number: "+15550100".to_string(),
                    password_hash: "not-a-real-hash".to_string(),
                })
                .unwrap()
        }
    }

    pub fn test_app(
        env: &TestEnv,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(super::json_config())
            .app_data(env.state.clone())
            .configure(super::configure)
    }

    /// `Authorization` header for the seeded administrator.
    pub fn bearer(env: &TestEnv) -> (&'static str, String) {
        let admin = env
            .store
            .find_user_by_email(ADMIN_EMAIL)
            .unwrap()
            .unwrap()
            .user;
        let token = token::issue(&admin, &env.state.config.jwt_secret, 1).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }
}
