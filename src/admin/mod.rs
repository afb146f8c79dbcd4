//! Admin service: CRUD over centers, specialties, employees,
//! doctors and users, plus credential checks for the gateway.
use error_stack::Result;

use crate::auth::CredentialStore;
use crate::config;
use crate::database::{self, Pool, ADMIN_MIGRATIONS};
use crate::repo::AdminRepositories;

pub mod controllers;

pub use controllers::configure;

#[derive(Debug, Clone)]
pub struct App {
    pub repos: AdminRepositories,
    pub credentials: CredentialStore,
    /// `None` when the repositories do not live in Postgres.
    pub pool: Option<Pool>,
}

impl App {
    #[must_use]
    pub fn new(repos: AdminRepositories, pool: Option<Pool>) -> Self {
        Self {
            credentials: CredentialStore::new(repos.clone()),
            repos,
            pool,
        }
    }

    pub async fn from_config(cfg: &config::Admin) -> Result<Self, database::Error> {
        let pool = Pool::new(&cfg.db).await?;
        if cfg.db.run_migrations {
            pool.migrate(&ADMIN_MIGRATIONS).await?;
        }
        Ok(Self::new(AdminRepositories::postgres(pool.clone()), Some(pool)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(AdminRepositories::in_memory(), None)
    }
}
