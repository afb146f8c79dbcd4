use clap::Parser;
use error_stack::{Result, ResultExt};
use thiserror::Error;

use crate::logging;

mod migrate;
mod server;

#[derive(Debug, Error)]
#[error("Failed to run command")]
pub struct CommandError;

/// Command line options for the hospital services.
#[derive(Debug, Parser)]
#[command(
    about = "Gateway and data services of the hospital dashboard",
    version,
    author,
    long_about
)]
pub struct Cli {
    #[clap(subcommand)]
    pub subcommand: Subcommand,
}

impl Cli {
    pub fn run(self) -> Result<(), CommandError> {
        logging::init().change_context(CommandError)?;

        match self.subcommand {
            Subcommand::Gateway(args) => server::run_gateway(&args).change_context(CommandError),
            Subcommand::Admin(args) => server::run_admin(&args).change_context(CommandError),
            Subcommand::Consultas(args) => {
                server::run_consultas(&args).change_context(CommandError)
            }
            Subcommand::Migrate(args) => migrate::run(&args).change_context(CommandError),
        }
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Expose the gateway: session tokens and the reverse proxy
    Gateway(server::ServerCommand),
    /// Expose the admin data service
    Admin(server::ServerCommand),
    /// Expose the consultations service
    Consultas(server::ServerCommand),
    /// Apply the database migrations of a service
    Migrate(migrate::MigrateCommand),
}
