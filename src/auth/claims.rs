use error_stack::{Report, Result, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Identity;
use crate::config;
use crate::types::id::{CenterId, DoctorId, UserId};
use crate::types::Role;

/// Session tokens are valid for eight hours and cannot be refreshed.
pub const SESSION_LIFETIME_SECS: i64 = 8 * 60 * 60;

const SERVICE_TOKEN_LIFETIME_SECS: i64 = 60;
const SERVICE_SUBJECT: &str = "gateway";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionClaims {
    /// User id, or `gateway` for the tokens the gateway signs for
    /// its own calls to the admin service.
    pub sub: String,
    pub username: String,
    pub role: Role,
    #[serde(rename = "centro_id", default, skip_serializing_if = "Option::is_none")]
    pub center_id: Option<CenterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<DoctorId>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl SessionClaims {
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign session token")]
    Sign,
    /// Bad signature, wrong issuer or audience, expired, or not a
    /// token at all. Callers are never told which.
    #[error("invalid session token")]
    Invalid,
}

/// Signing material shared by every service.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    validation: Validation,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl TokenKeys {
    #[must_use]
    pub fn new(cfg: &config::Auth) -> Self {
        let secret = cfg.jwt_secret.as_str().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            validation,
        }
    }

    pub fn issue(&self, identity: &Identity) -> Result<String, TokenError> {
        self.issue_at(identity, chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, identity: &Identity, issued_at: i64) -> Result<String, TokenError> {
        self.sign(&SessionClaims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            role: identity.role,
            center_id: identity.center_id,
            doctor_id: identity.doctor_id,
            iat: issued_at,
            exp: issued_at + SESSION_LIFETIME_SECS,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })
    }

    /// Short-lived admin token the gateway uses to look users up
    /// on the admin service.
    pub fn service_token(&self) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        self.sign(&SessionClaims {
            sub: SERVICE_SUBJECT.to_string(),
            username: SERVICE_SUBJECT.to_string(),
            role: Role::Admin,
            center_id: None,
            doctor_id: None,
            iat: now,
            exp: now + SERVICE_TOKEN_LIFETIME_SECS,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        })
    }

    #[tracing::instrument(name = "auth.decode_token", skip_all)]
    pub fn decode(&self, token: &str) -> Result<SessionClaims, TokenError> {
        jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .change_context(TokenError::Invalid)
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| Report::new(e).change_context(TokenError::Sign))
    }
}
