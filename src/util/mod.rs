pub mod figment;
pub mod sensitive;
pub mod serde_ext;
pub mod validator;

pub use sensitive::Sensitive;
