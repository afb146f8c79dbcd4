use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{centers_by_id, ensure_center};
use crate::admin::App;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::schema::{Deleted, EmployeeChanges, EmployeeView, NewEmployee};
use crate::types::id::EmployeeId;

const NOT_FOUND: &str = "Employee not found";
const LICENSE_TAKEN: &str = "An employee with this license number already exists";

#[tracing::instrument(skip_all)]
pub async fn create(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<NewEmployee>,
) -> Result<HttpResponse> {
    let draft = form.into_inner().into_draft()?;
    ensure_center(&app, "centro_id", Some(draft.center_id)).await?;

    if app.repos.employees.by_license(&draft.license_number).await?.is_some() {
        return Err(Error::conflict(LICENSE_TAKEN));
    }

    let employee = app.repos.employees.create(draft).await?;
    Ok(HttpResponse::Created().json(employee))
}

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, _admin: Guarded<AdminOnly>) -> Result<HttpResponse> {
    let employees = app.repos.employees.find_all().await?;
    let centers = centers_by_id(&app).await?;

    let views = employees
        .into_iter()
        .map(|employee| EmployeeView {
            center: centers.get(&employee.center_id).cloned(),
            employee,
        })
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(views))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn get(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<EmployeeId>,
) -> Result<HttpResponse> {
    let employee = app.repos.employees.find(id.into_inner()).await?;
    let employee = employee.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    let center = app.repos.centers.find(employee.center_id).await?;
    Ok(HttpResponse::Ok().json(EmployeeView { employee, center }))
}

#[tracing::instrument(skip(app, _admin, form))]
pub async fn update(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<EmployeeId>,
    form: web::Json<EmployeeChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let mut employee = app
        .repos
        .employees
        .find(id.into_inner())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    if let Some(license) = changes.license_number.as_deref() {
        if license != employee.license_number {
            if let Some(other) = app.repos.employees.by_license(license).await? {
                if other.id != employee.id {
                    return Err(Error::conflict(LICENSE_TAKEN));
                }
            }
        }
    }
    ensure_center(&app, "centro_id", changes.center_id).await?;

    changes.apply(&mut employee);
    let employee = app.repos.employees.update(&employee).await?;
    let employee = employee.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(employee))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn delete(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<EmployeeId>,
) -> Result<HttpResponse> {
    if !app.repos.employees.delete(id.into_inner()).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "Employee deleted",
    }))
}
