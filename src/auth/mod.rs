//! Session tokens and the ways to obtain one.
//!
//! The gateway owns issuance ([`AuthService`]); every service
//! shares the same [`TokenKeys`] so it can check tokens on its own.
mod claims;
mod credentials;
mod google;
mod identity;
mod service;

pub mod password;

pub use claims::{SessionClaims, TokenError, TokenKeys, SESSION_LIFETIME_SECS};
pub use credentials::CredentialStore;
pub use google::{AssertionVerifier, GoogleError, GoogleIdentity, GoogleTokenInfo};
pub use identity::Identity;
pub use service::{AuthError, AuthService, Directory, DirectoryError};

#[cfg(test)]
pub(crate) use claims::tests::auth_config;
