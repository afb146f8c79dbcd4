use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::admin::App;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::schema::{CenterChanges, Deleted, NewCenter};
use crate::types::id::CenterId;

const NOT_FOUND: &str = "Center not found";

#[tracing::instrument(skip_all)]
pub async fn create(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<NewCenter>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    form.validate()?;

    let center = app.repos.centers.create(form).await?;
    tracing::info!(center.id = %center.id, "created center");
    Ok(HttpResponse::Created().json(center))
}

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, _admin: Guarded<AdminOnly>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(app.repos.centers.find_all().await?))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn get(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<CenterId>,
) -> Result<HttpResponse> {
    let center = app.repos.centers.find(id.into_inner()).await?;
    let center = center.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(center))
}

#[tracing::instrument(skip(app, _admin, form))]
pub async fn update(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<CenterId>,
    form: web::Json<CenterChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let mut center = app
        .repos
        .centers
        .find(id.into_inner())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    changes.apply(&mut center);
    let center = app.repos.centers.update(&center).await?;
    let center = center.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(center))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn delete(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<CenterId>,
) -> Result<HttpResponse> {
    if !app.repos.centers.delete(id.into_inner()).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "Center deleted",
    }))
}
