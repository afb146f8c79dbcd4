use async_trait::async_trait;
use error_stack::{Result, ResultExt};

use super::{password, Directory, DirectoryError, Identity};
use crate::database;
use crate::repo::AdminRepositories;
use crate::schema::User;
use crate::types::Role;
use crate::util::Sensitive;

/// Resolves users stored by the admin service into identities.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    repos: AdminRepositories,
}

impl CredentialStore {
    #[must_use]
    pub fn new(repos: AdminRepositories) -> Self {
        Self { repos }
    }

    /// Returns `None` if the user does not exist or the password
    /// does not match. Both cases cost one hash verification.
    #[tracing::instrument(name = "credentials.verify", skip(self, password))]
    pub async fn verify(
        &self,
        username: &str,
        password: &Sensitive<String>,
    ) -> Result<Option<Identity>, database::Error> {
        let user = self.repos.users.by_username(username).await?;
        let hash = user.as_ref().map(|v| v.password_hash.clone());
        if !password::verify(password, hash).await {
            return Ok(None);
        }

        match user {
            Some(user) => self.identity(&user).await.map(Some),
            None => Ok(None),
        }
    }

    #[tracing::instrument(name = "credentials.by_email", skip(self))]
    pub async fn identify_by_email(&self, email: &str) -> Result<Option<Identity>, database::Error> {
        match self.repos.users.by_email(email).await? {
            Some(user) => self.identity(&user).await.map(Some),
            None => Ok(None),
        }
    }

    /// Doctors carry the id of the doctor record linked to their
    /// account, if there is one.
    async fn identity(&self, user: &User) -> Result<Identity, database::Error> {
        let doctor_id = if user.role == Role::Medico {
            let doctor = self.repos.doctors.by_linked_user(user.id).await?;
            if doctor.is_none() {
                tracing::warn!(user.id = %user.id, "doctor account is not linked to any doctor");
            }
            doctor.map(|v| v.id)
        } else {
            None
        };
        Ok(Identity::new(user, doctor_id))
    }
}

#[async_trait]
impl Directory for CredentialStore {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &Sensitive<String>,
    ) -> Result<Option<Identity>, DirectoryError> {
        self.verify(username, password)
            .await
            .change_context(DirectoryError::Internal)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, DirectoryError> {
        self.identify_by_email(email)
            .await
            .change_context(DirectoryError::Internal)
    }
}
