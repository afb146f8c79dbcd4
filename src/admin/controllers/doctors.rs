use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{centers_by_id, ensure_center, ensure_specialty, ensure_user, specialties_by_id};
use crate::admin::App;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::schema::{Deleted, Doctor, DoctorChanges, DoctorView, NewDoctor};
use crate::types::id::{DoctorId, UserId};

const NOT_FOUND: &str = "Doctor not found";
const LICENSE_TAKEN: &str = "A doctor with this license number already exists";
const USER_TAKEN: &str = "This user is already linked to another doctor";

/// A user account may sign in as at most one doctor.
async fn ensure_unlinked(app: &App, user_id: Option<UserId>, doctor: Option<DoctorId>) -> Result<()> {
    let Some(user_id) = user_id else { return Ok(()) };
    ensure_user(app, "usuario_id", Some(user_id)).await?;

    match app.repos.doctors.by_linked_user(user_id).await? {
        Some(other) if Some(other.id) != doctor => Err(Error::conflict(USER_TAKEN)),
        _ => Ok(()),
    }
}

async fn view(app: &App, doctor: Doctor) -> Result<DoctorView> {
    let specialty = app.repos.specialties.find(doctor.specialty_id).await?;
    let center = app.repos.centers.find(doctor.center_id).await?;
    Ok(DoctorView {
        doctor,
        specialty,
        center,
    })
}

#[tracing::instrument(skip_all)]
pub async fn create(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<NewDoctor>,
) -> Result<HttpResponse> {
    let draft = form.into_inner().into_draft()?;
    ensure_specialty(&app, "especialidad_id", draft.specialty_id).await?;
    ensure_center(&app, "centro_id", Some(draft.center_id)).await?;
    ensure_unlinked(&app, draft.linked_user_id, None).await?;

    if app.repos.doctors.by_license(&draft.license_number).await?.is_some() {
        return Err(Error::conflict(LICENSE_TAKEN));
    }

    let doctor = app.repos.doctors.create(draft).await?;
    tracing::info!(doctor.id = %doctor.id, "created doctor");
    Ok(HttpResponse::Created().json(doctor))
}

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, _admin: Guarded<AdminOnly>) -> Result<HttpResponse> {
    let doctors = app.repos.doctors.find_all().await?;
    let specialties = specialties_by_id(&app).await?;
    let centers = centers_by_id(&app).await?;

    let views = doctors
        .into_iter()
        .map(|doctor| DoctorView {
            specialty: specialties.get(&doctor.specialty_id).cloned(),
            center: centers.get(&doctor.center_id).cloned(),
            doctor,
        })
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(views))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn get(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<DoctorId>,
) -> Result<HttpResponse> {
    let doctor = app.repos.doctors.find(id.into_inner()).await?;
    let doctor = doctor.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(view(&app, doctor).await?))
}

#[tracing::instrument(skip(app, _admin, form))]
pub async fn update(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<DoctorId>,
    form: web::Json<DoctorChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let mut doctor = app
        .repos
        .doctors
        .find(id.into_inner())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    if let Some(license) = changes.license_number.as_deref() {
        if license != doctor.license_number {
            if let Some(other) = app.repos.doctors.by_license(license).await? {
                if other.id != doctor.id {
                    return Err(Error::conflict(LICENSE_TAKEN));
                }
            }
        }
    }
    if let Some(specialty_id) = changes.specialty_id {
        ensure_specialty(&app, "especialidad_id", specialty_id).await?;
    }
    ensure_center(&app, "centro_id", changes.center_id).await?;
    if let Some(linked_user_id) = changes.linked_user_id {
        ensure_unlinked(&app, linked_user_id, Some(doctor.id)).await?;
    }

    changes.apply(&mut doctor);
    let doctor = app.repos.doctors.update(&doctor).await?;
    let doctor = doctor.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(doctor))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn delete(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<DoctorId>,
) -> Result<HttpResponse> {
    if !app.repos.doctors.delete(id.into_inner()).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "Doctor deleted",
    }))
}
