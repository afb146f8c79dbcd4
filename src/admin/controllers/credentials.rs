use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::admin::App;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::types::ErrorKind;
use crate::util::validator::FieldErrors;
use crate::util::Sensitive;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Sensitive<String>,
}

#[derive(Debug, Deserialize)]
pub struct ByEmail {
    #[serde(rename = "correo")]
    pub email: String,
}

/// Checks a username and password and answers with the identity
/// to embed into a session token.
#[tracing::instrument(skip_all)]
pub async fn validate(app: web::Data<App>, form: web::Json<Credentials>) -> Result<HttpResponse> {
    let form = form.into_inner();

    let mut errors = FieldErrors::new();
    errors.check_length("username", Some(form.username.as_str()), 1, 100);
    errors.check_length("password", Some(form.password.as_str()), 1, 128);
    errors.into_result()?;

    match app.credentials.verify(&form.username, &form.password).await? {
        Some(identity) => Ok(HttpResponse::Ok().json(identity)),
        None => Err(Error::new(ErrorKind::InvalidCredentials)),
    }
}

/// Looks an identity up by email. Used by the gateway for
/// third-party sign-in.
#[tracing::instrument(skip_all)]
pub async fn identify(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<ByEmail>,
) -> Result<HttpResponse> {
    match app.credentials.identify_by_email(&form.email).await? {
        Some(identity) => Ok(HttpResponse::Ok().json(identity)),
        None => Err(Error::not_found("No user is registered with this email")),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::admin::controllers::test_support::{bearer, init_admin, keys};
    use crate::admin::App;
    use crate::types::Role;

    #[actix_web::test]
    async fn identify_needs_admin_and_known_email() {
        let keys = keys();
        let admin = bearer(&keys, Role::Admin);
        let app = init_admin!(App::in_memory(), keys);

        let req = test::TestRequest::post()
            .uri("/setup/admin")
            .set_json(json!({
                "username": "root",
                "password": "root-password",
                "correo": "root@hospital.test",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 201);

        let req = test::TestRequest::post()
            .uri("/usuarios/identify")
            .set_json(json!({ "correo": "root@hospital.test" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 401);

        let req = test::TestRequest::post()
            .uri("/usuarios/identify")
            .insert_header(admin.clone())
            .set_json(json!({ "correo": "root@hospital.test" }))
            .to_request();
        let identity: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(identity["username"], "root");

        let req = test::TestRequest::post()
            .uri("/usuarios/identify")
            .insert_header(admin)
            .set_json(json!({ "correo": "nobody@hospital.test" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);
    }

    #[actix_web::test]
    async fn empty_credentials_are_a_validation_error() {
        let app = init_admin!(App::in_memory(), keys());

        let req = test::TestRequest::post()
            .uri("/usuarios/validate")
            .set_json(json!({ "username": "", "password": "" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }
}
