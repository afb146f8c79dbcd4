use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::util::Sensitive;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Auth {
    /// HMAC key used to sign session tokens. Every service that
    /// checks tokens must share the same key.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_AUTH_JWT_SECRET` or `JWT_SECRET`
    #[validate(custom(function = "validate_jwt_secret"))]
    pub jwt_secret: Sensitive<String>,
    /// **Environment variables**:
    /// - `HOSPITAL_AUTH_ISSUER`
    #[serde(default = "Auth::default_issuer")]
    pub issuer: String,
    /// **Environment variables**:
    /// - `HOSPITAL_AUTH_AUDIENCE`
    #[serde(default = "Auth::default_audience")]
    pub audience: String,
    /// Google sign-in is disabled when this is not set.
    ///
    /// **Environment variables**:
    /// - `HOSPITAL_AUTH_GOOGLE_CLIENT_ID`
    #[serde(default)]
    pub google_client_id: Option<String>,
}

impl Auth {
    pub const DEFAULT_ISSUER: &'static str = "HospitalGateway";
    pub const DEFAULT_AUDIENCE: &'static str = "HospitalSystem";
    const MIN_SECRET_LEN: usize = 32;

    fn default_issuer() -> String {
        Self::DEFAULT_ISSUER.to_string()
    }

    fn default_audience() -> String {
        Self::DEFAULT_AUDIENCE.to_string()
    }
}

fn validate_jwt_secret(secret: &Sensitive<String>) -> Result<(), ValidationError> {
    if secret.as_str().len() < Auth::MIN_SECRET_LEN {
        let mut error = ValidationError::new("length");
        error.message = Some("JWT secret must be at least 32 characters long".into());
        return Err(error);
    }
    Ok(())
}
