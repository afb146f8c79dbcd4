//! Consultations service. Doctors only ever see and touch their
//! own consultations; administrators see everything.
use error_stack::Result;

use crate::config;
use crate::database::{self, Pool, CONSULTAS_MIGRATIONS};
use crate::repo::ConsultasRepositories;

pub mod controllers;
pub mod scope;

pub use controllers::configure;
pub use scope::Scope;

#[derive(Debug, Clone)]
pub struct App {
    pub repos: ConsultasRepositories,
    /// `None` when the repositories do not live in Postgres.
    pub pool: Option<Pool>,
}

impl App {
    #[must_use]
    pub fn new(repos: ConsultasRepositories, pool: Option<Pool>) -> Self {
        Self { repos, pool }
    }

    pub async fn from_config(cfg: &config::Consultas) -> Result<Self, database::Error> {
        let pool = Pool::new(&cfg.db).await?;
        if cfg.db.run_migrations {
            pool.migrate(&CONSULTAS_MIGRATIONS).await?;
        }
        Ok(Self::new(ConsultasRepositories::postgres(pool.clone()), Some(pool)))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(ConsultasRepositories::in_memory(), None)
    }
}
