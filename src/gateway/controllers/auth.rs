use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::gateway::App;
use crate::http::{Result, Session};
use crate::types::id::{CenterId, DoctorId, UserId};
use crate::types::Role;
use crate::util::validator::{missing, FieldErrors};
use crate::util::Sensitive;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Sensitive<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginForm {
    /// Google Identity Services posts it as `credential`.
    #[serde(alias = "credential", default)]
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ValidatedSession<'a> {
    pub id: Option<UserId>,
    pub username: &'a str,
    pub role: Role,
    pub centro_id: Option<CenterId>,
    pub doctor_id: Option<DoctorId>,
    pub valid: bool,
}

#[tracing::instrument(skip_all)]
pub async fn login(app: web::Data<App>, form: web::Json<LoginForm>) -> Result<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim();

    let mut errors = FieldErrors::new();
    errors.check_length("username", Some(username), 1, 100);
    errors.check_length("password", Some(form.password.as_str()), 1, 128);
    errors.into_result()?;

    let token = app.auth.login(username, &form.password).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub async fn validate(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(ValidatedSession {
        id: session.user_id(),
        username: &session.username,
        role: session.role,
        centro_id: session.center_id,
        doctor_id: session.doctor_id,
        valid: true,
    })
}

#[tracing::instrument(skip_all)]
pub async fn google_login(
    app: web::Data<App>,
    form: web::Json<GoogleLoginForm>,
) -> Result<HttpResponse> {
    let id_token = form.id_token.trim();
    if id_token.is_empty() {
        return Err(missing("id_token").into());
    }

    let token = app.auth.google_login(id_token).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::{json, Value};

    use crate::auth::password;
    use crate::gateway::test_support::{init_gateway, local, upstreams};
    use crate::repo::AdminRepositories;
    use crate::schema::UserDraft;
    use crate::types::id::CenterId;
    use crate::types::Role;
    use crate::util::Sensitive;

    const CLOSED: &str = "http://127.0.0.1:9";

    async fn repos_with_user() -> AdminRepositories {
        let repos = AdminRepositories::in_memory();
        let hash = password::hash(Sensitive::new("clerk-password".to_string()))
            .await
            .unwrap();
        repos
            .users
            .create(UserDraft {
                username: "clerk".into(),
                password_hash: hash,
                role: Role::Empleado,
                center_id: Some(CenterId::new(2)),
                email: None,
            })
            .await
            .unwrap();
        repos
    }

    #[actix_web::test]
    async fn login_then_validate() {
        let repos = repos_with_user().await;
        let app = init_gateway!(local(repos, &upstreams(CLOSED, CLOSED)));

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "clerk", "password": "clerk-password" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);
        let body: Value = test::read_body_json(res).await;
        let token = body["token"].as_str().unwrap().to_string();

        let req = test::TestRequest::get()
            .uri("/api/auth/validate")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let session: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(session["username"], "clerk");
        assert_eq!(session["role"], "empleado");
        assert_eq!(session["centro_id"], 2);
        assert_eq!(session["doctor_id"], Value::Null);
        assert_eq!(session["valid"], true);
        assert!(session["id"].is_u64());
    }

    #[actix_web::test]
    async fn login_rejects_bad_input() {
        let repos = repos_with_user().await;
        let app = init_gateway!(local(repos, &upstreams(CLOSED, CLOSED)));

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "clerk", "password": "wrong-password" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 401);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "invalid_credentials");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "  " }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 400);
        let body: Value = test::read_body_json(res).await;
        assert!(body["data"]["username"].is_array());
        assert!(body["data"]["password"].is_array());
    }

    #[actix_web::test]
    async fn validate_rejects_missing_and_forged_tokens() {
        let app = init_gateway!(local(
            AdminRepositories::in_memory(),
            &upstreams(CLOSED, CLOSED)
        ));

        let req = test::TestRequest::get().uri("/api/auth/validate").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 401);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "missing_token");

        let req = test::TestRequest::get()
            .uri("/api/auth/validate")
            .insert_header(("Authorization", "Bearer not.a.token"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 401);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "invalid_token");
    }

    #[actix_web::test]
    async fn google_login_is_unavailable_when_not_configured() {
        let app = init_gateway!(local(
            AdminRepositories::in_memory(),
            &upstreams(CLOSED, CLOSED)
        ));

        let req = test::TestRequest::post()
            .uri("/api/auth/google-login")
            .set_json(json!({ "credential": "eyJ..." }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 503);

        let req = test::TestRequest::post()
            .uri("/api/auth/google-login")
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }
}
