use crate::database::{self, Result};

mod admin;
mod consultas;

/// Repositories backed by the service's Postgres database.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: database::Pool,
}

impl PgRepository {
    #[must_use]
    pub fn new(pool: database::Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<database::PoolConnection> {
        self.pool.get().await
    }
}
