//! Runtime configuration.
//!
//! Everything the service needs to know about its environment is read once in
//! `main` into an [`AppConfig`] and handed to the components that need it. No
//! handler reads the environment on its own.
//!
//! Recognised variables:
//! - `HOST`, `PORT`: bind address (`127.0.0.1:5000`).
//! - `DATABASE_PATH`: SQLite file (`agent_lists.sqlite`).
//! - `JWT_SECRET`, `JWT_EXPIRES_IN_HOURS`: token signing (`24` hours).
//! - `BCRYPT_COST`: password hashing cost (`bcrypt::DEFAULT_COST`).
//! - `UPLOAD_DIR`, `MAX_FILE_SIZE`: staging directory and size cap (`uploads`, 5 MiB).
//! - `ADMIN_EMAIL`, `ADMIN_PASSWORD`: optional administrator seeded at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Used when `JWT_SECRET` is unset. `main` warns loudly when it is in effect.
pub const DEFAULT_JWT_SECRET: &str = "development-secret-change-me";

const DEFAULT_MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("ADMIN_EMAIL and ADMIN_PASSWORD must be set together")]
    PartialAdmin,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub upload: UploadPolicy,
    pub admin: Option<AdminSeed>,
}

/// Credentials of the administrator created on first start.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// Limits applied to an upload before any decoding happens.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    pub upload_dir: PathBuf,
    pub max_file_size: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            database_path: PathBuf::from("agent_lists.sqlite"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            upload: UploadPolicy::default(),
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// the defaults for anything missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email: email.trim().to_lowercase(),
                password,
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialAdmin),
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), "a port number", defaults.port)?,
            database_path: get("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            jwt_secret: get("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_ttl_hours: parse_or(
                "JWT_EXPIRES_IN_HOURS",
                get("JWT_EXPIRES_IN_HOURS"),
                "a whole number of hours",
                defaults.jwt_ttl_hours,
            )?,
            bcrypt_cost: parse_or(
                "BCRYPT_COST",
                get("BCRYPT_COST"),
                "an integer",
                defaults.bcrypt_cost,
            )?,
            upload: UploadPolicy {
                upload_dir: get("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.upload.upload_dir),
                max_file_size: parse_or(
                    "MAX_FILE_SIZE",
                    get("MAX_FILE_SIZE"),
                    "a size in bytes",
                    defaults.upload.max_file_size,
                )?,
            },
            admin,
        })
    }

    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    raw: Option<String>,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            expected,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.upload.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.jwt_ttl_hours, 24);
        assert!(config.admin.is_none());
        assert!(config.uses_default_secret());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("MAX_FILE_SIZE", "1024"),
            ("JWT_SECRET", "s3cret"),
            ("UPLOAD_DIR", "/tmp/staging"),
            ("ADMIN_EMAIL", " Admin@Example.com "),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload.max_file_size, 1024);
        assert_eq!(config.upload.upload_dir, PathBuf::from("/tmp/staging"));
        assert!(!config.uses_default_secret());
        assert_eq!(
            config.admin,
            Some(AdminSeed {
                email: "admin@example.com".to_string(),
                password: "hunter22".to_string(),
            })
        );
    }

    #[test]
    fn invalid_number_is_reported_with_its_key() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                expected: "a port number",
                value: "eighty".to_string(),
            }
        );
    }

    #[test]
    fn admin_email_without_password_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("ADMIN_EMAIL", "a@b.co")])).unwrap_err();
        assert_eq!(err, ConfigError::PartialAdmin);
    }
}
