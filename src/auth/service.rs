use async_trait::async_trait;
use error_stack::{Report, Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use super::{AssertionVerifier, GoogleError, Identity, SessionClaims, TokenKeys};
use crate::util::Sensitive;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("{service} is unreachable")]
    Unavailable { service: &'static str },
    #[error("{service} did not answer in time")]
    Timeout { service: &'static str },
    #[error("failed to look up user")]
    Internal,
}

/// Where users and their passwords live.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &Sensitive<String>,
    ) -> Result<Option<Identity>, DirectoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError>;
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid session token")]
    InvalidToken,
    #[error("{email} is not registered")]
    UnregisteredUser { name: Option<String>, email: String },
    #[error("Google sign-in is not configured")]
    GoogleDisabled,
    #[error("{service} is unreachable")]
    Unavailable { service: &'static str },
    #[error("user lookup timed out")]
    Timeout,
    #[error("failed to authenticate")]
    Internal,
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct AuthService {
    keys: Arc<TokenKeys>,
    directory: Arc<dyn Directory>,
    google: Option<Arc<dyn AssertionVerifier>>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("keys", &self.keys)
            .field("google", &self.google.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    #[must_use]
    pub fn new(keys: Arc<TokenKeys>, directory: Arc<dyn Directory>) -> Self {
        Self {
            keys,
            directory,
            google: None,
        }
    }

    #[must_use]
    pub fn with_google(mut self, verifier: Arc<dyn AssertionVerifier>) -> Self {
        self.google = Some(verifier);
        self
    }

    #[must_use]
    pub fn keys(&self) -> &Arc<TokenKeys> {
        &self.keys
    }

    #[tracing::instrument(name = "auth.login", skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &Sensitive<String>,
    ) -> Result<String, AuthError> {
        let identity = self
            .directory
            .verify_credentials(username, password)
            .await
            .map_err(directory_error)?;

        let Some(identity) = identity else {
            tracing::info!("rejected login attempt");
            return Err(Report::new(AuthError::InvalidCredentials));
        };
        self.issue(&identity)
    }

    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.keys.decode(token).change_context(AuthError::InvalidToken)
    }

    #[tracing::instrument(name = "auth.google_login", skip_all)]
    pub async fn google_login(&self, id_token: &str) -> Result<String, AuthError> {
        let Some(verifier) = self.google.as_ref() else {
            return Err(Report::new(AuthError::GoogleDisabled));
        };

        let asserted = verifier.verify(id_token).await.map_err(google_error)?;

        let identity = self
            .directory
            .find_by_email(&asserted.email)
            .await
            .map_err(directory_error)?;

        match identity {
            Some(identity) => self.issue(&identity),
            None => Err(Report::new(AuthError::UnregisteredUser {
                name: asserted.name,
                email: asserted.email,
            })),
        }
    }

    fn issue(&self, identity: &Identity) -> Result<String, AuthError> {
        tracing::info!(user.id = %identity.id, role = %identity.role, "issued session token");
        self.keys.issue(identity).change_context(AuthError::Internal)
    }
}

fn google_error(report: Report<GoogleError>) -> Report<AuthError> {
    let context = match report.current_context() {
        GoogleError::Unavailable => AuthError::Unavailable { service: "google" },
        GoogleError::Rejected => AuthError::InvalidCredentials,
    };
    report.change_context(context)
}

fn directory_error(report: Report<DirectoryError>) -> Report<AuthError> {
    let context = match report.current_context() {
        DirectoryError::Unavailable { service } => AuthError::Unavailable { service: *service },
        DirectoryError::Timeout { .. } => AuthError::Timeout,
        DirectoryError::Internal => AuthError::Internal,
    };
    report.change_context(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::auth_config;
    use crate::auth::{password, CredentialStore, GoogleIdentity};
    use crate::repo::AdminRepositories;
    use crate::schema::{DoctorDraft, UserDraft};
    use crate::types::id::{CenterId, SpecialtyId};
    use crate::types::Role;

    struct FixedAssertion(Option<GoogleIdentity>);

    #[async_trait]
    impl AssertionVerifier for FixedAssertion {
        async fn verify(&self, _id_token: &str) -> Result<GoogleIdentity, GoogleError> {
            self.0.clone().ok_or_else(|| Report::new(GoogleError::Rejected))
        }
    }

    struct UnreachableProvider;

    #[async_trait]
    impl AssertionVerifier for UnreachableProvider {
        async fn verify(&self, _id_token: &str) -> Result<GoogleIdentity, GoogleError> {
            Err(Report::new(GoogleError::Unavailable))
        }
    }

    async fn service() -> (AuthService, AdminRepositories) {
        let repos = AdminRepositories::in_memory();
        let keys = Arc::new(TokenKeys::new(&auth_config()));
        let directory = Arc::new(CredentialStore::new(repos.clone()));
        (AuthService::new(keys, directory), repos)
    }

    async fn add_user(repos: &AdminRepositories, username: &str, role: Role, email: &str) {
        let hash = password::hash(Sensitive::new(format!("{username}-password")))
            .await
            .unwrap();
        repos
            .users
            .create(UserDraft {
                username: username.into(),
                password_hash: hash,
                role,
                center_id: role.requires_center().then(|| CenterId::new(4)),
                email: Some(email.into()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn login_then_validate_matches_stored_user() {
        let (auth, repos) = service().await;
        add_user(&repos, "dr.vega", Role::Medico, "vega@hospital.test").await;
        let user = repos.users.by_username("dr.vega").await.unwrap().unwrap();
        let doctor = repos
            .doctors
            .create(DoctorDraft {
                name: "Dr. Vega".into(),
                license_number: "MV-9".into(),
                phone: "555".into(),
                specialty_id: SpecialtyId::new(1),
                center_id: CenterId::new(4),
                linked_user_id: Some(user.id),
            })
            .await
            .unwrap();

        let password = Sensitive::new("dr.vega-password".to_string());
        let token = auth.login("dr.vega", &password).await.unwrap();
        let claims = auth.validate_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.username, "dr.vega");
        assert_eq!(claims.role, Role::Medico);
        assert_eq!(claims.center_id, Some(CenterId::new(4)));
        assert_eq!(claims.doctor_id, Some(doctor.id));
    }

    #[tokio::test]
    async fn bad_credentials_are_rejected() {
        let (auth, repos) = service().await;
        add_user(&repos, "root", Role::Admin, "root@hospital.test").await;

        let wrong = Sensitive::new("guess".to_string());
        let error = auth.login("root", &wrong).await.unwrap_err();
        assert!(matches!(error.current_context(), AuthError::InvalidCredentials));

        let error = auth.login("nobody", &wrong).await.unwrap_err();
        assert!(matches!(error.current_context(), AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn google_login_requires_registered_email() {
        let (auth, repos) = service().await;
        add_user(&repos, "ana", Role::Admin, "ana@hospital.test").await;

        let disabled = auth.google_login("id-token").await.unwrap_err();
        assert!(matches!(disabled.current_context(), AuthError::GoogleDisabled));

        let known = auth.clone().with_google(Arc::new(FixedAssertion(Some(GoogleIdentity {
            email: "ana@hospital.test".into(),
            name: Some("Ana".into()),
        }))));
        let token = known.google_login("id-token").await.unwrap();
        assert_eq!(known.validate_token(&token).unwrap().username, "ana");

        let stranger = auth.with_google(Arc::new(FixedAssertion(Some(GoogleIdentity {
            email: "who@else.test".into(),
            name: Some("Who".into()),
        }))));
        let error = stranger.google_login("id-token").await.unwrap_err();
        match error.current_context() {
            AuthError::UnregisteredUser { name, email } => {
                assert_eq!(name.as_deref(), Some("Who"));
                assert_eq!(email, "who@else.test");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn google_outage_is_not_a_credential_error() {
        let (auth, _repos) = service().await;

        let down = auth.clone().with_google(Arc::new(UnreachableProvider));
        let error = down.google_login("id-token").await.unwrap_err();
        assert!(matches!(
            error.current_context(),
            AuthError::Unavailable { service: "google" }
        ));

        let rejecting = auth.with_google(Arc::new(FixedAssertion(None)));
        let error = rejecting.google_login("id-token").await.unwrap_err();
        assert!(matches!(error.current_context(), AuthError::InvalidCredentials));
    }
}
