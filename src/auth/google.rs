use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";
const ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];

/// What a third party asserts about the person signing in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("identity provider is unreachable")]
    Unavailable,
    #[error("identity assertion was rejected")]
    Rejected,
}

#[async_trait]
pub trait AssertionVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleError>;
}

/// Checks Google ID tokens with Google's `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenInfo {
    client: reqwest::Client,
    client_id: String,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    iss: String,
    email: Option<String>,
    // Google sends booleans in this payload as strings.
    #[serde(default)]
    email_verified: Option<String>,
    name: Option<String>,
}

impl GoogleTokenInfo {
    pub fn new(client_id: String, timeout: Duration) -> Result<Self, GoogleError> {
        let endpoint = Url::parse(TOKENINFO_URL).change_context(GoogleError::Unavailable)?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .change_context(GoogleError::Unavailable)?;

        Ok(Self {
            client,
            client_id,
            endpoint,
        })
    }

    fn check(&self, info: TokenInfo) -> Result<GoogleIdentity, GoogleError> {
        if info.aud != self.client_id {
            return Err(Report::new(GoogleError::Rejected)
                .attach_printable("token was issued for another client"));
        }
        if !ISSUERS.contains(&info.iss.as_str()) {
            return Err(Report::new(GoogleError::Rejected)
                .attach_printable(format!("unexpected issuer {:?}", info.iss)));
        }
        if info.email_verified.as_deref() != Some("true") {
            return Err(Report::new(GoogleError::Rejected).attach_printable("email is not verified"));
        }

        let email = info.email.ok_or_else(|| {
            Report::new(GoogleError::Rejected).attach_printable("token has no email")
        })?;

        Ok(GoogleIdentity {
            email,
            name: info.name,
        })
    }
}

#[async_trait]
impl AssertionVerifier for GoogleTokenInfo {
    #[tracing::instrument(name = "google.verify", skip_all)]
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, GoogleError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("id_token", id_token)])
            .send()
            .await
            .change_context(GoogleError::Unavailable)?;

        if !response.status().is_success() {
            return Err(Report::new(GoogleError::Rejected)
                .attach_printable(format!("tokeninfo answered {}", response.status())));
        }

        let info = response
            .json::<TokenInfo>()
            .await
            .change_context(GoogleError::Rejected)?;

        self.check(info)
    }
}
