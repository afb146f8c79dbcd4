use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use std::marker::PhantomData;
use std::ops::Deref;
use thiserror::Error as ThisError;

use super::{error::ErrorStackContext, Error, Result};
use crate::auth::{SessionClaims, TokenKeys};
use crate::types::{ErrorKind, Role};

/// Claims of the bearer token sent with the request.
///
/// Rejects the request with `missing_token` when there is no
/// `Authorization: Bearer` header and with `invalid_token` when the
/// token does not verify.
#[derive(Debug, Clone)]
pub struct Session {
    claims: SessionClaims,
}

impl Session {
    #[must_use]
    pub fn claims(&self) -> &SessionClaims {
        &self.claims
    }

    #[must_use]
    pub fn into_claims(self) -> SessionClaims {
        self.claims
    }

    fn from_headers(req: &HttpRequest) -> Result<Self> {
        #[derive(Debug, ThisError)]
        #[error("token keys are not registered as app data")]
        struct NoTokenKeys;

        let Some(keys) = req.app_data::<web::Data<TokenKeys>>() else {
            return Err(Error::from_context(ErrorKind::Internal, NoTokenKeys));
        };

        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let Some(token) = token else {
            return Err(Error::new(ErrorKind::MissingToken));
        };

        let claims = keys.decode(token).change_kind(ErrorKind::InvalidToken)?;
        Ok(Self { claims })
    }
}

impl Deref for Session {
    type Target = SessionClaims;

    fn deref(&self) -> &Self::Target {
        &self.claims
    }
}

impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}

/// Roles allowed through a [`Guarded`] extractor.
pub trait Guard {
    const ROLES: &'static [Role];
    const DENIED: &'static str;
}

#[derive(Debug)]
pub struct AdminOnly;

impl Guard for AdminOnly {
    const ROLES: &'static [Role] = &[Role::Admin];
    const DENIED: &'static str = "Only administrators can access this resource";
}

#[derive(Debug)]
pub struct MedicoOrAdmin;

impl Guard for MedicoOrAdmin {
    const ROLES: &'static [Role] = &[Role::Admin, Role::Medico];
    const DENIED: &'static str = "Only doctors and administrators can access this resource";
}

/// A [`Session`] whose role passed the guard `G`, or `forbidden`.
#[derive(Debug)]
pub struct Guarded<G> {
    session: Session,
    _guard: PhantomData<G>,
}

impl<G> Guarded<G> {
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }
}

impl<G> Deref for Guarded<G> {
    type Target = SessionClaims;

    fn deref(&self) -> &Self::Target {
        &self.session.claims
    }
}

impl<G: Guard> FromRequest for Guarded<G> {
    type Error = Error;
    type Future = Ready<Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = Session::from_headers(req).and_then(|session| {
            if G::ROLES.contains(&session.role) {
                Ok(Self {
                    session,
                    _guard: PhantomData,
                })
            } else {
                tracing::debug!(role = %session.role, "role is not allowed here");
                Err(Error::forbidden(G::DENIED))
            }
        });
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{auth_config, Identity};
    use crate::types::id::{CenterId, UserId};
    use actix_web::test::TestRequest;

    fn keys() -> TokenKeys {
        TokenKeys::new(&auth_config())
    }

    fn token(role: Role) -> String {
        keys()
            .issue(&Identity {
                id: UserId::new(1),
                username: "someone".into(),
                role,
                center_id: Some(CenterId::new(1)),
                doctor_id: None,
            })
            .unwrap()
    }

    fn request(auth: Option<String>) -> HttpRequest {
        let mut req = TestRequest::default().app_data(web::Data::new(keys()));
        if let Some(auth) = auth {
            req = req.insert_header((header::AUTHORIZATION, auth));
        }
        req.to_http_request()
    }

    #[actix_web::test]
    async fn missing_and_invalid_tokens() {
        let error = Session::extract(&request(None)).await.unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::MissingToken);

        let error = Session::extract(&request(Some("Basic abc".into())))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::MissingToken);

        let error = Session::extract(&request(Some("Bearer garbage".into())))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::InvalidToken);
    }

    #[actix_web::test]
    async fn guards_check_role() {
        let bearer = |role| Some(format!("Bearer {}", token(role)));

        let admin = Guarded::<AdminOnly>::extract(&request(bearer(Role::Admin))).await;
        assert_eq!(admin.unwrap().role, Role::Admin);

        let error = Guarded::<AdminOnly>::extract(&request(bearer(Role::Medico)))
            .await
            .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Forbidden(..)));

        let medico = Guarded::<MedicoOrAdmin>::extract(&request(bearer(Role::Medico))).await;
        assert!(medico.is_ok());

        let error = Guarded::<MedicoOrAdmin>::extract(&request(bearer(Role::Empleado)))
            .await
            .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::Forbidden(..)));
    }
}
