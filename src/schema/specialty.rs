use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationErrors};

use super::Record;
use crate::types::id::{marker::SpecialtyMarker, Id, SpecialtyId};
use crate::util::{serde_ext::double_option, validator::FieldErrors};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Specialty {
    pub id: SpecialtyId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpecialty {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
}

impl Validate for NewSpecialty {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", Some(self.name.as_str()), 1, 150);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpecialtyChanges {
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl Validate for SpecialtyChanges {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = FieldErrors::new();
        errors.check_length("nombre", self.name.as_deref(), 1, 150);
        errors.into_result()
    }
}

impl SpecialtyChanges {
    pub fn apply(self, specialty: &mut Specialty) {
        if let Some(name) = self.name {
            specialty.name = name;
        }
        if let Some(description) = self.description {
            specialty.description = description;
        }
    }
}

impl Record for Specialty {
    type Marker = SpecialtyMarker;
    type New = NewSpecialty;

    fn id(&self) -> Id<SpecialtyMarker> {
        self.id
    }

    fn build(id: SpecialtyId, new: NewSpecialty, _created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
        }
    }
}
