use thiserror::Error;

mod auth;
mod database;
mod listen;
mod service;
mod upstream;

pub use auth::Auth;
pub use database::Database;
pub use listen::Listen;
pub use service::{Admin, Consultas, Gateway};
pub use upstream::Upstream;

#[derive(Debug, Error)]
#[error("Failed to load configuration")]
pub struct ParseError;
