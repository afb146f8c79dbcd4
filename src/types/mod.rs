pub mod error;
pub mod id;
pub mod role;

pub use error::ErrorKind;
pub use role::Role;
