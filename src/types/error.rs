use serde::ser::SerializeMap;
use std::fmt::Display;
use validator::ValidationErrors;

/// Client-facing category of a failed request. Each kind maps to
/// exactly one HTTP status and is serialized as the response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    Internal,
    /// The database pool has no usable connection.
    ServiceUnavailable,
    Validation(ValidationErrors),
    MissingToken,
    InvalidToken,
    InvalidCredentials,
    /// The external identity is valid but nobody registered it.
    /// Name and email are echoed back for display only.
    UnregisteredUser {
        name: Option<String>,
        email: String,
    },
    Forbidden(&'static str),
    NotFound(&'static str),
    Conflict(&'static str),
    UpstreamUnavailable {
        service: &'static str,
    },
    Timeout,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Validation(..) => "validation",
            Self::MissingToken => "missing_token",
            Self::InvalidToken => "invalid_token",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UnregisteredUser { .. } => "unregistered_user",
            Self::Forbidden(..) => "forbidden",
            Self::NotFound(..) => "not_found",
            Self::Conflict(..) => "conflict",
            Self::UpstreamUnavailable { .. } => "upstream_unavailable",
            Self::Timeout => "timeout",
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Forbidden(message) | Self::NotFound(message) | Self::Conflict(message) => {
                (*message).to_string()
            }
            Self::UpstreamUnavailable { service } => format!("Service {service} is unavailable"),
            _ => self.to_string(),
        }
    }

    fn data(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(errors) => serde_json::to_value(errors).ok(),
            Self::UnregisteredUser { name, email } => Some(serde_json::json!({
                "name": name,
                "email": email,
            })),
            Self::UpstreamUnavailable { service } => Some(serde_json::json!({
                "service": service,
            })),
            _ => None,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => f.write_str("Failed to perform request"),
            Self::ServiceUnavailable => f.write_str("Service is temporarily unavailable"),
            Self::Validation(..) => f.write_str("Request contains invalid data"),
            Self::MissingToken => f.write_str("Authentication token is required"),
            Self::InvalidToken => f.write_str("Invalid or expired token"),
            Self::InvalidCredentials => f.write_str("Invalid credentials"),
            Self::UnregisteredUser { .. } => f.write_str("User is not registered in the system"),
            Self::Forbidden(message) | Self::NotFound(message) | Self::Conflict(message) => {
                f.write_str(message)
            }
            Self::UpstreamUnavailable { service } => write!(f, "Service {service} is unavailable"),
            Self::Timeout => f.write_str("Request took too long to complete"),
        }
    }
}

impl serde::Serialize for ErrorKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = self.data();
        let len = if data.is_some() { 3 } else { 2 };

        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("code", self.code())?;
        map.serialize_entry("message", &self.message())?;
        if let Some(data) = data {
            map.serialize_entry("data", &data)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_code_and_message() {
        let value = serde_json::to_value(ErrorKind::NotFound("Center not found")).unwrap();
        assert_eq!(
            value,
            json!({ "code": "not_found", "message": "Center not found" })
        );
    }

    #[test]
    fn upstream_names_the_service() {
        let value = serde_json::to_value(ErrorKind::UpstreamUnavailable {
            service: "admin-api",
        })
        .unwrap();

        assert_eq!(value["code"], "upstream_unavailable");
        assert_eq!(value["message"], "Service admin-api is unavailable");
        assert_eq!(value["data"]["service"], "admin-api");
    }

    #[test]
    fn validation_lists_fields() {
        let errors = crate::util::validator::single_error("nombre", "length", "too long");
        let value = serde_json::to_value(ErrorKind::Validation(errors)).unwrap();
        assert_eq!(value["code"], "validation");
        assert!(value["data"].get("nombre").is_some());
    }
}
