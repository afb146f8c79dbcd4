use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use super::Record;
use crate::types::id::{marker::ConsultationMarker, CenterId, ConsultationId, DoctorId, Id};
use crate::util::{
    serde_ext::{double_option, optional_timestamp, timestamp},
    validator::FieldErrors,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    #[default]
    Programada,
    EnCurso,
    Completada,
    Cancelada,
}

impl ConsultationStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Programada => "programada",
            Self::EnCurso => "en_curso",
            Self::Completada => "completada",
            Self::Cancelada => "cancelada",
        }
    }
}

impl Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown consultation status {0:?}")]
pub struct InvalidStatus(String);

impl FromStr for ConsultationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "programada" => Ok(Self::Programada),
            "en_curso" => Ok(Self::EnCurso),
            "completada" => Ok(Self::Completada),
            "cancelada" => Ok(Self::Cancelada),
            _ => Err(InvalidStatus(s.to_string())),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for ConsultationStatus {
    fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
        <&str as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &<sqlx::Postgres as sqlx::Database>::TypeInfo) -> bool {
        <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ConsultationStatus {
    fn encode_by_ref(
        &self,
        buf: &mut <sqlx::Postgres as sqlx::database::HasArguments<'q>>::ArgumentBuffer,
    ) -> sqlx::encode::IsNull {
        <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ConsultationStatus {
    fn decode(
        value: <sqlx::Postgres as sqlx::database::HasValueRef<'r>>::ValueRef,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let value = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
        Ok(value.parse()?)
    }
}

/// A scheduled visit of a patient to a doctor. `doctor_id` and
/// `center_id` point at rows of the admin service and are not
/// checked against it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Consultation {
    pub id: ConsultationId,
    #[serde(rename = "paciente")]
    pub patient: String,
    pub doctor_id: DoctorId,
    #[serde(rename = "centro_id")]
    pub center_id: CenterId,
    #[serde(rename = "fecha")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "notas")]
    pub notes: Option<String>,
    #[serde(rename = "estado")]
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewConsultation {
    #[serde(rename = "paciente")]
    pub patient: String,
    #[serde(default)]
    pub doctor_id: Option<DoctorId>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(rename = "fecha", deserialize_with = "timestamp")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(rename = "notas", default)]
    pub notes: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: Option<ConsultationStatus>,
}

/// A consultation whose doctor and center have been settled
/// according to the caller.
#[derive(Debug, Clone)]
pub struct ConsultationDraft {
    pub patient: String,
    pub doctor_id: DoctorId,
    pub center_id: CenterId,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub status: ConsultationStatus,
}

impl Validate for NewConsultation {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("paciente", Some(self.patient.as_str()), 1, 150);
        errors.into_result()
    }
}

impl NewConsultation {
    #[must_use]
    pub fn into_draft(self, doctor_id: DoctorId, center_id: CenterId) -> ConsultationDraft {
        ConsultationDraft {
            patient: self.patient,
            doctor_id,
            center_id,
            scheduled_at: self.scheduled_at,
            notes: self.notes,
            status: self.status.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsultationChanges {
    #[serde(rename = "paciente", default)]
    pub patient: Option<String>,
    #[serde(default)]
    pub doctor_id: Option<DoctorId>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(rename = "fecha", default, deserialize_with = "optional_timestamp")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(rename = "notas", default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(rename = "estado", default)]
    pub status: Option<ConsultationStatus>,
}

impl Validate for ConsultationChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("paciente", self.patient.as_deref(), 1, 150);
        errors.into_result()
    }
}

impl ConsultationChanges {
    /// Whether the consultation would move to another doctor
    /// or center.
    #[must_use]
    pub fn reassigns(&self, consultation: &Consultation) -> bool {
        self.doctor_id.is_some_and(|id| id != consultation.doctor_id)
            || self.center_id.is_some_and(|id| id != consultation.center_id)
    }

    pub fn apply(self, consultation: &mut Consultation) {
        if let Some(patient) = self.patient {
            consultation.patient = patient;
        }
        if let Some(doctor_id) = self.doctor_id {
            consultation.doctor_id = doctor_id;
        }
        if let Some(center_id) = self.center_id {
            consultation.center_id = center_id;
        }
        if let Some(scheduled_at) = self.scheduled_at {
            consultation.scheduled_at = scheduled_at;
        }
        if let Some(notes) = self.notes {
            consultation.notes = notes;
        }
        if let Some(status) = self.status {
            consultation.status = status;
        }
    }
}

/// Narrows which consultations a query returns. Every `Some`
/// field must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultationFilter {
    pub doctor_id: Option<DoctorId>,
    pub center_id: Option<CenterId>,
    /// Inclusive lower bound on `scheduled_at`.
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `scheduled_at`.
    pub to: Option<DateTime<Utc>>,
}

impl ConsultationFilter {
    #[must_use]
    pub fn matches(&self, consultation: &Consultation) -> bool {
        self.doctor_id.map_or(true, |id| id == consultation.doctor_id)
            && self.center_id.map_or(true, |id| id == consultation.center_id)
            && self.from.map_or(true, |from| consultation.scheduled_at >= from)
            && self.to.map_or(true, |to| consultation.scheduled_at <= to)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub doctor_id: DoctorId,
    pub total: usize,
    #[serde(rename = "consultas")]
    pub consultations: Vec<Consultation>,
}

impl Record for Consultation {
    type Marker = ConsultationMarker;
    type New = ConsultationDraft;

    fn id(&self) -> Id<ConsultationMarker> {
        self.id
    }

    fn build(id: ConsultationId, new: ConsultationDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            patient: new.patient,
            doctor_id: new.doctor_id,
            center_id: new.center_id,
            scheduled_at: new.scheduled_at,
            notes: new.notes,
            status: new.status,
            created_at,
        }
    }
}
