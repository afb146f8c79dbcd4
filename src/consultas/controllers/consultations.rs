use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::consultas::{App, Scope};
use crate::http::{Error, Guarded, MedicoOrAdmin, Result};
use crate::schema::{Consultation, ConsultationChanges, Deleted, NewConsultation};
use crate::types::id::{CenterId, ConsultationId};
use crate::types::ErrorKind;
use crate::util::validator::FieldErrors;

const NOT_FOUND: &str = "Consultation not found";
const NOT_YOURS: &str = "Consultation belongs to another doctor";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "centro_id", alias = "centroId", default)]
    pub center_id: Option<CenterId>,
}

/// Loads a consultation the caller is allowed to see.
async fn find_scoped(app: &App, scope: &Scope, id: ConsultationId) -> Result<Consultation> {
    let consultation = app
        .repos
        .consultations
        .find(id)
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    if !scope.permits(&consultation) {
        return Err(Error::forbidden(NOT_YOURS));
    }
    Ok(consultation)
}

#[tracing::instrument(skip_all, fields(role = %session.role))]
pub async fn create(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    form: web::Json<NewConsultation>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    form.validate()?;

    let draft = match Scope::of(&session)? {
        // Whatever the doctor sent, the consultation is theirs.
        Scope::Doctor {
            doctor_id,
            center_id,
        } => form.into_draft(doctor_id, center_id),
        Scope::All => {
            let (Some(doctor_id), Some(center_id)) = (form.doctor_id, form.center_id) else {
                let mut errors = FieldErrors::new();
                errors.check_required("doctor_id", form.doctor_id.as_ref());
                errors.check_required("centro_id", form.center_id.as_ref());
                errors.into_result()?;
                // At least one of the checks above has failed.
                return Err(Error::new(ErrorKind::Internal));
            };
            form.into_draft(doctor_id, center_id)
        }
    };

    let consultation = app.repos.consultations.create(draft).await?;
    tracing::info!(consultation.id = %consultation.id, "created consultation");
    Ok(HttpResponse::Created().json(consultation))
}

#[tracing::instrument(skip_all, fields(role = %session.role))]
pub async fn list(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let filter = Scope::of(&session)?.filter(query.center_id);
    let consultations = app.repos.consultations.find_matching(&filter).await?;
    Ok(HttpResponse::Ok().json(consultations))
}

#[tracing::instrument(skip(app, session))]
pub async fn get(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    id: web::Path<ConsultationId>,
) -> Result<HttpResponse> {
    let scope = Scope::of(&session)?;
    let consultation = find_scoped(&app, &scope, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(consultation))
}

#[tracing::instrument(skip(app, session, form))]
pub async fn update(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    id: web::Path<ConsultationId>,
    form: web::Json<ConsultationChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let scope = Scope::of(&session)?;
    let mut consultation = find_scoped(&app, &scope, id.into_inner()).await?;
    if scope != Scope::All && changes.reassigns(&consultation) {
        return Err(Error::forbidden("Doctors cannot reassign consultations"));
    }

    changes.apply(&mut consultation);
    let consultation = app.repos.consultations.update(&consultation).await?;
    let consultation = consultation.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(consultation))
}

#[tracing::instrument(skip(app, session))]
pub async fn delete(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    id: web::Path<ConsultationId>,
) -> Result<HttpResponse> {
    let scope = Scope::of(&session)?;
    let consultation = find_scoped(&app, &scope, id.into_inner()).await?;

    if !app.repos.consultations.delete(consultation.id).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "Consultation deleted",
    }))
}
