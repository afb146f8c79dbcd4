use crate::auth::SessionClaims;
use crate::http::{Error, Result};
use crate::schema::{Consultation, ConsultationFilter};
use crate::types::id::{CenterId, DoctorId};
use crate::types::Role;

/// Which consultations a caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Only the consultations of this doctor at this center.
    Doctor {
        doctor_id: DoctorId,
        center_id: CenterId,
    },
}

impl Scope {
    /// Resolves the scope of an already authenticated session.
    /// Doctors without a center or a linked doctor record are
    /// turned away, as is every other role.
    pub fn of(claims: &SessionClaims) -> Result<Self> {
        match claims.role {
            Role::Admin => Ok(Self::All),
            Role::Medico => {
                let center_id = claims
                    .center_id
                    .ok_or_else(|| Error::forbidden("Doctor has no center assigned"))?;
                let doctor_id = claims
                    .doctor_id
                    .ok_or_else(|| Error::forbidden("User is not linked to a doctor"))?;
                Ok(Self::Doctor {
                    doctor_id,
                    center_id,
                })
            }
            Role::Empleado => Err(Error::forbidden(
                "Only doctors and administrators can access consultations",
            )),
        }
    }

    /// Filter for listing. Administrators may narrow by center,
    /// doctors are always narrowed to themselves.
    #[must_use]
    pub fn filter(&self, center_id: Option<CenterId>) -> ConsultationFilter {
        match *self {
            Self::All => ConsultationFilter {
                center_id,
                ..Default::default()
            },
            Self::Doctor {
                doctor_id,
                center_id,
            } => ConsultationFilter {
                doctor_id: Some(doctor_id),
                center_id: Some(center_id),
                ..Default::default()
            },
        }
    }

    #[must_use]
    pub fn permits(&self, consultation: &Consultation) -> bool {
        match *self {
            Self::All => true,
            Self::Doctor {
                doctor_id,
                center_id,
            } => consultation.doctor_id == doctor_id && consultation.center_id == center_id,
        }
    }
}
