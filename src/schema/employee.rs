use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use super::{Center, Record};
use crate::types::id::{marker::EmployeeMarker, CenterId, EmployeeId, Id};
use crate::util::validator::{missing, FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cedula")]
    pub license_number: String,
    #[serde(rename = "cargo")]
    pub position: String,
    #[serde(rename = "centro_id")]
    pub center_id: CenterId,
}

/// Employee with its center inlined, as returned by reads.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeView {
    #[serde(flatten)]
    pub employee: Employee,
    #[serde(rename = "centro")]
    pub center: Option<Center>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "cedula")]
    pub license_number: String,
    #[serde(rename = "cargo")]
    pub position: String,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
}

impl Validate for NewEmployee {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", Some(self.name.as_str()), 1, 150);
        errors.check_length("cedula", Some(self.license_number.as_str()), 1, 20);
        errors.check_length("cargo", Some(self.position.as_str()), 1, 100);
        errors.check_required("centro_id", self.center_id.as_ref());
        errors.into_result()
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeDraft {
    pub name: String,
    pub license_number: String,
    pub position: String,
    pub center_id: CenterId,
}

impl NewEmployee {
    pub fn into_draft(self) -> Result<EmployeeDraft, ValidationErrors> {
        self.validate()?;
        Ok(EmployeeDraft {
            center_id: self.center_id.ok_or_else(|| missing("centro_id"))?,
            name: self.name,
            license_number: self.license_number,
            position: self.position,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeChanges {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "cedula", default)]
    pub license_number: Option<String>,
    #[serde(rename = "cargo", default)]
    pub position: Option<String>,
    #[serde(rename = "centro_id", default)]
    pub center_id: Option<CenterId>,
}

impl Validate for EmployeeChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", self.name.as_deref(), 1, 150);
        errors.check_length("cedula", self.license_number.as_deref(), 1, 20);
        errors.check_length("cargo", self.position.as_deref(), 1, 100);
        errors.into_result()
    }
}

impl EmployeeChanges {
    pub fn apply(self, employee: &mut Employee) {
        if let Some(name) = self.name {
            employee.name = name;
        }
        if let Some(license_number) = self.license_number {
            employee.license_number = license_number;
        }
        if let Some(position) = self.position {
            employee.position = position;
        }
        if let Some(center_id) = self.center_id {
            employee.center_id = center_id;
        }
    }
}

impl Record for Employee {
    type Marker = EmployeeMarker;
    type New = EmployeeDraft;

    fn id(&self) -> Id<EmployeeMarker> {
        self.id
    }

    fn build(id: EmployeeId, new: EmployeeDraft, _created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            license_number: new.license_number,
            position: new.position,
            center_id: new.center_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_center_is_reported_with_other_fields() {
        let new: NewEmployee = serde_json::from_value(json!({
            "nombre": "Ana",
            "cedula": "",
            "cargo": "Enfermera",
        }))
        .unwrap();

        let errors = new.into_draft().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("cedula"));
        assert!(fields.contains_key("centro_id"));
        assert!(!fields.contains_key("license_number"));
        assert!(!fields.contains_key("center_id"));
    }

    #[test]
    fn long_position_is_reported_as_cargo() {
        let new: NewEmployee = serde_json::from_value(json!({
            "nombre": "Luis",
            "cedula": "CC-9",
            "cargo": "z".repeat(101),
            "centro_id": 1,
        }))
        .unwrap();

        let errors = new.validate().unwrap_err();
        assert!(errors.errors().contains_key("cargo"));
        assert_eq!(errors.errors().len(), 1);
    }
}
