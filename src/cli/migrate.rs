use clap::{Args, ValueEnum};
use error_stack::{Result, ResultExt};
use thiserror::Error;

use crate::config;
use crate::database::{Pool, ADMIN_MIGRATIONS, CONSULTAS_MIGRATIONS};

#[derive(Debug, Error)]
#[error("Failed to apply migrations")]
pub struct MigrateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Service {
    Admin,
    Consultas,
}

/// Apply the embedded migrations to a service's database
#[derive(Debug, Args)]
pub struct MigrateCommand {
    #[arg(value_enum)]
    pub service: Service,
}

pub fn run(args: &MigrateCommand) -> Result<(), MigrateError> {
    let (db, migrator) = match args.service {
        Service::Admin => (
            config::Admin::load().change_context(MigrateError)?.db,
            &ADMIN_MIGRATIONS,
        ),
        Service::Consultas => (
            config::Consultas::load().change_context(MigrateError)?.db,
            &CONSULTAS_MIGRATIONS,
        ),
    };

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .change_context(MigrateError)
        .attach_printable("could not build tokio runtime")?
        .block_on(async {
            let pool = Pool::new(&db).await.change_context(MigrateError)?;
            pool.migrate(migrator).await.change_context(MigrateError)?;
            tracing::info!(service = ?args.service, "migrations applied");
            Ok(())
        })
}
