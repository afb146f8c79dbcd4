//! Plumbing shared by the three HTTP services.
pub mod error;
pub mod session;
pub mod util;

pub use error::{Error, Result};
pub use session::{AdminOnly, Guarded, MedicoOrAdmin, Session};
