use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use super::{Center, Record, Specialty};
use crate::types::id::{marker::DoctorMarker, CenterId, DoctorId, Id, SpecialtyId, UserId};
use crate::util::{
    serde_ext::double_option,
    validator::{missing, FieldErrors},
};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Doctor {
    pub id: DoctorId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cedula")]
    pub license_number: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "especialidad_id")]
    pub specialty_id: SpecialtyId,
    #[serde(rename = "centro_id")]
    pub center_id: CenterId,
    /// Account this doctor signs in with. Used to resolve a
    /// doctor's own consultations.
    #[serde(rename = "usuario_id")]
    pub linked_user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    #[serde(rename = "especialidad")]
    pub specialty: Option<Specialty>,
    #[serde(rename = "centro")]
    pub center: Option<Center>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDoctor {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cedula")]
    pub license_number: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "especialidad_id", default)]
    pub specialty_id: Option<SpecialtyId>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    #[serde(rename = "usuario_id", default)]
    pub linked_user_id: Option<UserId>,
}

impl Validate for NewDoctor {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", Some(self.name.as_str()), 1, 150);
        errors.check_length("cedula", Some(self.license_number.as_str()), 1, 20);
        errors.check_length("telefono", Some(self.phone.as_str()), 1, 50);
        errors.check_required("especialidad_id", self.specialty_id.as_ref());
        errors.check_required("centro_id", self.center_id.as_ref());
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct DoctorDraft {
    pub name: String,
    pub license_number: String,
    pub phone: String,
    pub specialty_id: SpecialtyId,
    pub center_id: CenterId,
    pub linked_user_id: Option<UserId>,
}

impl NewDoctor {
    pub fn into_draft(self) -> Result<DoctorDraft, ValidationErrors> {
        self.validate()?;
        Ok(DoctorDraft {
            specialty_id: self.specialty_id.ok_or_else(|| missing("especialidad_id"))?,
            center_id: self.center_id.ok_or_else(|| missing("centro_id"))?,
            name: self.name,
            license_number: self.license_number,
            phone: self.phone,
            linked_user_id: self.linked_user_id,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DoctorChanges {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "cedula", default)]
    pub license_number: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "especialidad_id", default)]
    pub specialty_id: Option<SpecialtyId>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
    /// `null` unlinks the doctor from its account.
    #[serde(rename = "usuario_id", default, deserialize_with = "double_option")]
    pub linked_user_id: Option<Option<UserId>>,
}

impl Validate for DoctorChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", self.name.as_deref(), 1, 150);
        errors.check_length("cedula", self.license_number.as_deref(), 1, 20);
        errors.check_length("telefono", self.phone.as_deref(), 1, 50);
        errors.into_result()
    }
}

impl DoctorChanges {
    pub fn apply(self, doctor: &mut Doctor) {
        if let Some(name) = self.name {
            doctor.name = name;
        }
        if let Some(license_number) = self.license_number {
            doctor.license_number = license_number;
        }
        if let Some(phone) = self.phone {
            doctor.phone = phone;
        }
        if let Some(specialty_id) = self.specialty_id {
            doctor.specialty_id = specialty_id;
        }
        if let Some(center_id) = self.center_id {
            doctor.center_id = center_id;
        }
        if let Some(linked_user_id) = self.linked_user_id {
            doctor.linked_user_id = linked_user_id;
        }
    }
}

impl Record for Doctor {
    type Marker = DoctorMarker;
    type New = DoctorDraft;

    fn id(&self) -> Id<DoctorMarker> {
        self.id
    }

    fn build(id: DoctorId, new: DoctorDraft, _created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            license_number: new.license_number,
            phone: new.phone,
            specialty_id: new.specialty_id,
            center_id: new.center_id,
            linked_user_id: new.linked_user_id,
        }
    }
}
