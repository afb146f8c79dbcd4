use actix_web::{web, HttpResponse};
use validator::Validate;

use super::{centers_by_id, ensure_center};
use crate::admin::App;
use crate::auth::password;
use crate::http::error::ErrorStackContext;
use crate::http::{AdminOnly, Error, Guarded, Result};
use crate::schema::{Deleted, NewUser, User, UserChanges, UserDraft, UserView};
use crate::types::id::UserId;

const NOT_FOUND: &str = "User not found";
const USERNAME_TAKEN: &str = "Username is already taken";
const EMAIL_TAKEN: &str = "Email is already registered";

/// Fails with `conflict` if another user already has this
/// username or email.
async fn ensure_unique(app: &App, user: Option<UserId>, username: &str, email: Option<&str>) -> Result<()> {
    if let Some(other) = app.repos.users.by_username(username).await? {
        if Some(other.id) != user {
            return Err(Error::conflict(USERNAME_TAKEN));
        }
    }
    if let Some(email) = email {
        if let Some(other) = app.repos.users.by_email(email).await? {
            if Some(other.id) != user {
                return Err(Error::conflict(EMAIL_TAKEN));
            }
        }
    }
    Ok(())
}

/// Validates and stores a new user. Shared with the one-time
/// administrator setup.
pub(crate) async fn register(app: &App, form: NewUser) -> Result<User> {
    form.validate()?;
    ensure_unique(app, None, &form.username, form.email.as_deref()).await?;
    ensure_center(app, "centro_id", form.center_id).await?;

    let password_hash = password::hash(form.password).await.into_http_result()?;
    let user = app
        .repos
        .users
        .create(UserDraft {
            username: form.username,
            password_hash,
            role: form.role,
            center_id: form.center_id,
            email: form.email,
        })
        .await?;

    tracing::info!(user.id = %user.id, role = %user.role, "registered user");
    Ok(user)
}

#[tracing::instrument(skip_all)]
pub async fn create(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    form: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let user = register(&app, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, _admin: Guarded<AdminOnly>) -> Result<HttpResponse> {
    let users = app.repos.users.find_all().await?;
    let centers = centers_by_id(&app).await?;

    let views = users
        .into_iter()
        .map(|user| UserView {
            center: user.center_id.and_then(|id| centers.get(&id).cloned()),
            user,
        })
        .collect::<Vec<_>>();

    Ok(HttpResponse::Ok().json(views))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn get(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<UserId>,
) -> Result<HttpResponse> {
    let user = app.repos.users.find(id.into_inner()).await?;
    let user = user.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    let center = match user.center_id {
        Some(id) => app.repos.centers.find(id).await?,
        None => None,
    };
    Ok(HttpResponse::Ok().json(UserView { user, center }))
}

#[tracing::instrument(skip(app, _admin, form))]
pub async fn update(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<UserId>,
    form: web::Json<UserChanges>,
) -> Result<HttpResponse> {
    let changes = form.into_inner();
    changes.validate()?;

    let mut user = app
        .repos
        .users
        .find(id.into_inner())
        .await?
        .ok_or_else(|| Error::not_found(NOT_FOUND))?;

    let username = changes.username.as_deref().filter(|v| *v != user.username);
    let email = changes
        .email
        .as_ref()
        .and_then(Option::as_deref)
        .filter(|v| Some(*v) != user.email.as_deref());

    if username.is_some() || email.is_some() {
        let username = username.unwrap_or(&user.username);
        ensure_unique(&app, Some(user.id), username, email).await?;
    }
    ensure_center(&app, "centro_id", changes.center_id.flatten()).await?;

    if let Some(password) = changes.apply(&mut user) {
        user.password_hash = password::hash(password).await.into_http_result()?;
    }
    user.check_affiliation()?;

    let user = app.repos.users.update(&user).await?;
    let user = user.ok_or_else(|| Error::not_found(NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(user))
}

#[tracing::instrument(skip(app, _admin))]
pub async fn delete(
    app: web::Data<App>,
    _admin: Guarded<AdminOnly>,
    id: web::Path<UserId>,
) -> Result<HttpResponse> {
    if !app.repos.users.delete(id.into_inner()).await? {
        return Err(Error::not_found(NOT_FOUND));
    }
    Ok(HttpResponse::Ok().json(Deleted {
        message: "User deleted",
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
    async fn username_and_email_are_unique() {
        let keys = keys();
        let admin = bearer(&keys, Role::Admin);
        let app = init_admin!(App::in_memory(), keys);

        let first = json!({
            "username": "carla",
            "password": "carla-password",
            "role": "admin",
            "correo": "carla@hospital.test",
        });
        let req = test::TestRequest::post()
            .uri("/usuarios")
            .insert_header(admin.clone())
            .set_json(&first)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 201);
        let created: Value = test::read_body_json(res).await;
        assert!(created.get("password").is_none());
        assert!(created.get("password_hash").is_none());

        for duplicate in [
            json!({ "username": "carla", "password": "other-password", "role": "admin" }),
            json!({
                "username": "carla2",
                "password": "other-password",
                "role": "admin",
                "correo": "carla@hospital.test",
            }),
        ] {
            let req = test::TestRequest::post()
                .uri("/usuarios")
                .insert_header(admin.clone())
                .set_json(&duplicate)
                .to_request();
            let res = test::call_service(&app, req).await;
            assert_eq!(res.status().as_u16(), 409);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/usuarios/{}", created["id"]))
            .insert_header(admin)
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["username"], "carla");
        assert_eq!(fetched["correo"], "carla@hospital.test");
    }

    #[actix_web::test]
    async fn update_rehashes_password() {
        let keys = keys();
        let admin = bearer(&keys, Role::Admin);
        let app = init_admin!(App::in_memory(), keys);

        let req = test::TestRequest::post()
            .uri("/usuarios")
            .insert_header(admin.clone())
            .set_json(json!({
                "username": "pablo",
                "password": "first-password",
                "role": "admin",
            }))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;

        let req = test::TestRequest::put()
            .uri(&format!("/usuarios/{}", created["id"]))
            .insert_header(admin)
            .set_json(json!({ "password": "second-password" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 200);

        let req = test::TestRequest::post()
            .uri("/usuarios/validate")
            .set_json(json!({ "username": "pablo", "password": "second-password" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 200);

        let req = test::TestRequest::post()
            .uri("/usuarios/validate")
            .set_json(json!({ "username": "pablo", "password": "first-password" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 401);
    }
}
