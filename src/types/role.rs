use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// Role of a user account, stored and transmitted in lowercase
/// Spanish as the dashboard expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Medico,
    Empleado,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Medico => "medico",
            Self::Empleado => "empleado",
        }
    }

    /// Doctors and employees belong to a center.
    #[must_use]
    pub const fn requires_center(self) -> bool {
        matches!(self, Self::Medico | Self::Empleado)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown role {0:?}")]
pub struct InvalidRole(String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "medico" => Ok(Self::Medico),
            "empleado" => Ok(Self::Empleado),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &<sqlx::Postgres as sqlx::Database>::TypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(value.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::Token;

    #[test]
    fn test_serde_impl() {
        serde_test::assert_tokens(
            &Role::Medico,
            &[Token::UnitVariant {
                name: "Role",
                variant: "medico",
            }],
        );
        assert_eq!("empleado".parse::<Role>().unwrap(), Role::Empleado);
        assert!("doctor".parse::<Role>().is_err());
    }

    #[test]
    fn only_staff_need_center() {
        assert!(!Role::Admin.requires_center());
        assert!(Role::Medico.requires_center());
        assert!(Role::Empleado.requires_center());
    }
}
