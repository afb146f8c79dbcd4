use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::id::{marker::Marker, Id};

pub mod center;
pub mod consultation;
pub mod doctor;
pub mod employee;
pub mod specialty;
pub mod user;

pub use center::{Center, CenterChanges, NewCenter};
pub use consultation::{
    Consultation, ConsultationChanges, ConsultationDraft, ConsultationFilter, ConsultationStatus,
    DoctorReport, NewConsultation,
};
pub use doctor::{Doctor, DoctorChanges, DoctorDraft, DoctorView, NewDoctor};
pub use employee::{Employee, EmployeeChanges, EmployeeDraft, EmployeeView, NewEmployee};
pub use specialty::{NewSpecialty, Specialty, SpecialtyChanges};
pub use user::{NewUser, SetupAdmin, User, UserChanges, UserDraft, UserView};

/// A row owned by one of the repositories.
pub trait Record: Clone + Send + Sync + 'static {
    type Marker: Marker;
    /// Everything needed to insert a row except what the
    /// database assigns itself.
    type New: Send + Sync + 'static;

    fn id(&self) -> Id<Self::Marker>;

    /// Materializes a row from its insert payload, as the
    /// database would.
    fn build(id: Id<Self::Marker>, new: Self::New, created_at: DateTime<Utc>) -> Self;
}

/// Body returned by every delete endpoint.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}
