use serde::Deserialize;
use std::num::{NonZeroU32, NonZeroU64};
use validator::{Validate, ValidationError};

use crate::util::Sensitive;

/// Configuration for connecting to the Postgres database
/// owned by a service.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Database {
    /// Connection URL connecting to the Postgres database.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_DB_URL` or `DATABASE_URL`
    #[validate(custom(function = "validate_postgres_url"))]
    pub url: Sensitive<String>,
    /// Maximum amount of pool size that database can handle
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_DB_POOL_SIZE`
    #[serde(default = "Database::default_pool_size")]
    pub pool_size: NonZeroU32,
    /// **Environment variables**:
    /// - `HOSPITAL_DB_MIN_IDLE`
    pub min_idle: Option<NonZeroU32>,
    /// How long this server can wait until its time limit where the
    /// database connection takes a while to acknowledge or
    /// successfully established.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_DB_TIMEOUT_SECS`
    #[serde(default = "Database::default_pool_timeout_secs")]
    pub timeout_secs: NonZeroU64,
    /// Forces all database connections are encrypted with TLS
    /// (if possible).
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_DB_ENFORCE_TLS`
    #[serde(default = "Database::default_enforce_tls")]
    pub enforce_tls: bool,
    /// Apply pending migrations when the service starts.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_DB_RUN_MIGRATIONS`
    #[serde(default)]
    pub run_migrations: bool,
}

impl Database {
    const DEFAULT_POOL_SIZE: u32 = 5;
    const DEFAULT_POOL_TIMEOUT_SECS: u64 = 5;

    // Required by serde
    const fn default_pool_size() -> NonZeroU32 {
        match NonZeroU32::new(Self::DEFAULT_POOL_SIZE) {
            Some(n) => n,
            None => panic!("DEFAULT_POOL_SIZE is accidentally set to 0"),
        }
    }

    const fn default_pool_timeout_secs() -> NonZeroU64 {
        match NonZeroU64::new(Self::DEFAULT_POOL_TIMEOUT_SECS) {
            Some(n) => n,
            None => panic!("DEFAULT_POOL_TIMEOUT_SECS is accidentally set to 0"),
        }
    }

    const fn default_enforce_tls() -> bool {
        true
    }
}

fn validate_postgres_url(url: &Sensitive<String>) -> Result<(), ValidationError> {
    match url::Url::parse(url.as_str()) {
        Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => Ok(()),
        _ => {
            let mut error = ValidationError::new("url");
            error.message = Some("Invalid Postgres connection URL".into());
            Err(error)
        }
    }
}
