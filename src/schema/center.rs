use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use super::Record;
use crate::types::id::{marker::CenterMarker, CenterId, Id};
use crate::util::{serde_ext::double_option, validator::FieldErrors};

/// A hospital or clinic.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Center {
    pub id: CenterId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "direccion")]
    pub address: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCenter {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(rename = "ciudad", default)]
    pub city: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

impl Validate for NewCenter {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", Some(self.name.as_str()), 1, 150);
        errors.check_length("direccion", self.address.as_deref(), 0, 250);
        errors.check_length("ciudad", self.city.as_deref(), 0, 100);
        errors.check_length("telefono", self.phone.as_deref(), 0, 50);
        errors.into_result()
    }
}

/// Partial update. `null` clears an optional column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CenterChanges {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "direccion", default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(rename = "ciudad", default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(rename = "telefono", default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
}

impl Validate for CenterChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", self.name.as_deref(), 1, 150);
        errors.check_length("direccion", self.address.as_ref().and_then(Option::as_deref), 0, 250);
        errors.check_length("ciudad", self.city.as_ref().and_then(Option::as_deref), 0, 100);
        errors.check_length("telefono", self.phone.as_ref().and_then(Option::as_deref), 0, 50);
        errors.into_result()
    }
}

impl CenterChanges {
    pub fn apply(self, center: &mut Center) {
        if let Some(name) = self.name {
            center.name = name;
        }
        if let Some(address) = self.address {
            center.address = address;
        }
        if let Some(city) = self.city {
            center.city = city;
        }
        if let Some(phone) = self.phone {
            center.phone = phone;
        }
    }
}

impl Record for Center {
    type Marker = CenterMarker;
    type New = NewCenter;

    fn id(&self) -> Id<CenterMarker> {
        self.id
    }

    fn build(id: CenterId, new: NewCenter, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            address: new.address,
            city: new.city,
            phone: new.phone,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_every_field_at_once() {
        let new: NewCenter = serde_json::from_value(json!({
            "nombre": "",
            "telefono": "0".repeat(51),
        }))
        .unwrap();

        let errors = new.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("nombre"));
        assert!(fields.contains_key("telefono"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn reports_errors_under_wire_names() {
        let new: NewCenter = serde_json::from_value(json!({
            "nombre": "Norte",
            "direccion": "x".repeat(251),
            "ciudad": "y".repeat(101),
        }))
        .unwrap();

        let errors = new.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("direccion"));
        assert!(fields.contains_key("ciudad"));
        assert!(!fields.contains_key("address"));
        assert!(!fields.contains_key("city"));
    }

    #[test]
    fn changes_keep_untouched_fields() {
        let mut center = Center::build(
            CenterId::new(1),
            NewCenter {
                name: "Clinica X".into(),
                address: Some("Calle 1".into()),
                city: Some("Bogota".into()),
                phone: Some("123".into()),
            },
            Utc::now(),
        );

        let changes: CenterChanges =
            serde_json::from_value(json!({ "ciudad": "Medellin", "telefono": null })).unwrap();
        assert!(changes.validate().is_ok());
        changes.apply(&mut center);

        assert_eq!(center.name, "Clinica X");
        assert_eq!(center.address.as_deref(), Some("Calle 1"));
        assert_eq!(center.city.as_deref(), Some("Medellin"));
        assert_eq!(center.phone, None);
    }

    #[test]
    fn serializes_with_dashboard_names() {
        let center = Center::build(
            CenterId::new(7),
            NewCenter {
                name: "Hospital Central".into(),
                address: None,
                city: None,
                phone: None,
            },
            Utc::now(),
        );

        let value = serde_json::to_value(&center).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["nombre"], "Hospital Central");
        assert!(value.get("direccion").is_some());
        assert!(value.get("created_at").is_some());
    }
}
