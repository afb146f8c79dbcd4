use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;
use validator::ValidationErrors;

use super::Error;
use crate::auth::AuthError;
use crate::database;
use crate::types::ErrorKind;

impl actix_web::ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ServiceUnavailable | ErrorKind::UpstreamUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorKind::Validation(..) => StatusCode::BAD_REQUEST,
            ErrorKind::MissingToken
            | ErrorKind::InvalidToken
            | ErrorKind::InvalidCredentials
            | ErrorKind::UnregisteredUser { .. } => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden(..) => StatusCode::FORBIDDEN,
            ErrorKind::NotFound(..) => StatusCode::NOT_FOUND,
            ErrorKind::Conflict(..) => StatusCode::CONFLICT,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code()).json(&self.kind)
    }
}

impl From<Report<database::Error>> for Error {
    fn from(value: Report<database::Error>) -> Self {
        let kind = match value.current_context() {
            database::Error::UnhealthyPool => ErrorKind::ServiceUnavailable,
            database::Error::UniqueViolation => ErrorKind::Conflict("Record already exists"),
            database::Error::ForeignKeyViolation => {
                ErrorKind::Conflict("Record is referenced by or references missing data")
            }
            _ => ErrorKind::Internal,
        };
        Error::from_report(kind, value)
    }
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        #[derive(Debug, thiserror::Error)]
        #[error("Validation error occurred")]
        struct ValidateError;
        Error::from_context(ErrorKind::Validation(value), ValidateError)
    }
}

impl From<Report<AuthError>> for Error {
    fn from(value: Report<AuthError>) -> Self {
        let kind = match value.current_context() {
            AuthError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AuthError::InvalidToken => ErrorKind::InvalidToken,
            AuthError::UnregisteredUser { name, email } => ErrorKind::UnregisteredUser {
                name: name.clone(),
                email: email.clone(),
            },
            AuthError::GoogleDisabled => ErrorKind::ServiceUnavailable,
            AuthError::Unavailable { service } => ErrorKind::UpstreamUnavailable {
                service: *service,
            },
            AuthError::Timeout => ErrorKind::Timeout,
            AuthError::Internal => ErrorKind::Internal,
        };
        Error::from_report(kind, value)
    }
}
