use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::admin::App;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::schema::{Deleted, NewSpecialty, SpecialtyChanges};
use crate::types::id::SpecialtyId;

const NOT_FOUND: &str = "Specialty not found";

#[tracing::instrument(skip_all)]
pub async fn create(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<NewSpecialty>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    form.validate()?;

    let specialty = app.repos.specialties.create(form).await?;
    Ok(HttpResponse::Created().json(specialty))
}

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, _admin: Guarded<AdminOnly>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(app.repos.specialties.find_all().await?))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn get(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<SpecialtyId>,
) -> Result<HttpResponse> {
    let specialty = app.repos.specialties.find(id.into_inner()).await?;
    let specialty = specialty.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(specialty))
}

#[tracing::instrument(skip(app, _admin, form))]
pub async fn update(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<SpecialtyId>,
    form: web::Json<SpecialtyChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let mut specialty = app
        .repos
        .specialties
        .find(id.into_inner())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    changes.apply(&mut specialty);
    let specialty = app.repos.specialties.update(&specialty).await?;
    let specialty = specialty.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(specialty))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn delete(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<SpecialtyId>,
) -> Result<HttpResponse> {
    if !app.repos.specialties.delete(id.into_inner()).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "Specialty deleted",
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::admin::controllers::test_support::{bearer, init_admin, keys};
    use crate::admin::App;
    use crate::types::Role;

    #[actix_web::test]
    async fn crud_cycle() {
        let keys = keys();
        let admin = bearer(&keys, Role::Admin);
        let app = init_admin!(App::in_memory(), keys);

        let req = test::TestRequest::post()
            .uri("/especialidades")
            .insert_header(admin.clone())
            .set_json(json!({ "nombre": "Cardiologia", "descripcion": "Corazon" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 201);
        let created: Value = test::read_body_json(res).await;
        let id = created["id"].as_u64().unwrap();

        let req = test::TestRequest::put()
            .uri(&format!("/especialidades/{id}"))
            .insert_header(admin.clone())
            .set_json(json!({ "descripcion": null }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["nombre"], "Cardiologia");
        assert_eq!(updated["descripcion"], json!(null));

        let req = test::TestRequest::get()
            .uri("/especialidades")
            .insert_header(admin.clone())
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/especialidades/{id}"))
            .insert_header(admin.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);

        let req = test::TestRequest::get()
            .uri(&format!("/especialidades/{id}"))
            .insert_header(admin)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn rejects_empty_name_and_non_admins() {
        let keys = keys();
        let admin = bearer(&keys, Role::Admin);
        let medico = bearer(&keys, Role::Medico);
        let app = init_admin!(App::in_memory(), keys);

        let req = test::TestRequest::post()
            .uri("/especialidades")
            .insert_header(admin)
            .set_json(json!({ "nombre": "" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 400);
        let body: Value = test::read_body_json(res).await;
        assert!(body["data"]["nombre"].is_array());

        let req = test::TestRequest::get()
            .uri("/especialidades")
            .insert_header(medico)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 403);
    }
}
