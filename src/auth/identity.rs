use serde::{Deserialize, Serialize};

use super::SessionClaims;
use crate::schema::User;
use crate::types::id::{CenterId, DoctorId, UserId};
use crate::types::Role;

/// Who a session belongs to. Exchanged between the admin service
/// and the gateway, then embedded into the session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(default)]
    pub doctor_id: Option<DoctorId>,
}

impl Identity {
    #[must_use]
    pub fn new(user: &User, doctor_id: Option<DoctorId>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            center_id: user.center_id,
            doctor_id,
        }
    }

    /// Returns `None` for tokens that do not belong to a user.
    #[must_use]
    pub fn from_claims(claims: &SessionClaims) -> Option<Self> {
        Some(Self {
            id: claims.user_id()?,
            username: claims.username.clone(),
            role: claims.role,
            center_id: claims.center_id,
            doctor_id: claims.doctor_id,
        })
    }
}
