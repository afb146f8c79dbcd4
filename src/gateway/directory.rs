use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use url::Url;

use super::Upstream;
use crate::auth::{Directory, DirectoryError, Identity, TokenKeys};
use crate::util::Sensitive;

const SERVICE: &str = Upstream::Admin.name();

/// Looks users up through the admin service's HTTP API.
#[derive(Clone)]
pub struct AdminApiDirectory {
    client: reqwest::Client,
    base: Url,
    keys: Arc<TokenKeys>,
}

impl std::fmt::Debug for AdminApiDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminApiDirectory")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

impl AdminApiDirectory {
    #[must_use]
    pub fn new(client: reqwest::Client, base: Url, keys: Arc<TokenKeys>) -> Self {
        Self { client, base, keys }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base.as_str().trim_end_matches('/'))
    }
}

fn request_error(error: reqwest::Error) -> Report<DirectoryError> {
    let context = if error.is_timeout() {
        DirectoryError::Timeout { service: SERVICE }
    } else if error.is_connect() {
        DirectoryError::Unavailable { service: SERVICE }
    } else {
        DirectoryError::Internal
    };
    Report::new(error).change_context(context)
}

/// `absent` is the status the admin service uses for "no such user".
async fn read_identity(
    response: reqwest::Response,
    absent: &[StatusCode],
) -> Result<Option<Identity>, DirectoryError> {
    let status = response.status();
    if absent.contains(&status) {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(Report::new(DirectoryError::Internal)
            .attach_printable(format!("{SERVICE} answered {status}")));
    }

    response
        .json::<Identity>()
        .await
        .map(Some)
        .map_err(request_error)
}

#[async_trait]
impl Directory for AdminApiDirectory {
    #[tracing::instrument(name = "directory.verify_credentials", skip(self, password))]
    async fn verify_credentials(
        &self,
        username: &str,
        password: &Sensitive<String>,
    ) -> Result<Option<Identity>, DirectoryError> {
        let response = self
            .client
            .post(self.url("usuarios/validate"))
            .json(&json!({
                "username": username,
                "password": password.as_str(),
            }))
            .send()
            .await
            .map_err(request_error)?;

        read_identity(response, &[StatusCode::UNAUTHORIZED, StatusCode::BAD_REQUEST]).await
    }

    #[tracing::instrument(name = "directory.find_by_email", skip(self))]
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError> {
        let token = self
            .keys
            .service_token()
            .change_context(DirectoryError::Internal)?;

        let response = self
            .client
            .post(self.url("usuarios/identify"))
            .bearer_auth(token)
            .json(&json!({ "correo": email }))
            .send()
            .await
            .map_err(request_error)?;

        read_identity(response, &[StatusCode::NOT_FOUND]).await
    }
}
