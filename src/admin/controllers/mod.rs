use actix_web::web;
use std::collections::HashMap;

use super::App;
use crate::http::{Error, Result};
use crate::schema::{Center, Specialty};
use crate::types::id::{CenterId, SpecialtyId, UserId};
use crate::util::validator::single_error;

pub mod centers;
pub mod credentials;
pub mod doctors;
pub mod employees;
pub mod health;
pub mod setup;
pub mod specialties;
pub mod users;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::check))
        .route("/setup/admin", web::post().to(setup::create_initial_admin))
        .service(
            web::scope("/centros")
                .route("", web::post().to(centers::create))
                .route("", web::get().to(centers::list))
                .route("/{id}", web::get().to(centers::get))
                .route("/{id}", web::put().to(centers::update))
                .route("/{id}", web::delete().to(centers::delete)),
        )
        .service(
            web::scope("/especialidades")
                .route("", web::post().to(specialties::create))
                .route("", web::get().to(specialties::list))
                .route("/{id}", web::get().to(specialties::get))
                .route("/{id}", web::put().to(specialties::update))
                .route("/{id}", web::delete().to(specialties::delete)),
        )
        .service(
            web::scope("/empleados")
                .route("", web::post().to(employees::create))
                .route("", web::get().to(employees::list))
                .route("/{id}", web::get().to(employees::get))
                .route("/{id}", web::put().to(employees::update))
                .route("/{id}", web::delete().to(employees::delete)),
        )
        .service(
            web::scope("/medicos")
                .route("", web::post().to(doctors::create))
                .route("", web::get().to(doctors::list))
                .route("/{id}", web::get().to(doctors::get))
                .route("/{id}", web::put().to(doctors::update))
                .route("/{id}", web::delete().to(doctors::delete)),
        )
        .service(
            web::scope("/usuarios")
                .route("/validate", web::post().to(credentials::validate))
                .route("/identify", web::post().to(credentials::identify))
                .route("", web::post().to(users::create))
                .route("", web::get().to(users::list))
                .route("/{id}", web::get().to(users::get))
                .route("/{id}", web::put().to(users::update))
                .route("/{id}", web::delete().to(users::delete)),
        );
}

fn invalid_reference(field: &'static str, message: &'static str) -> Error {
    Error::from(single_error(field, "invalid_reference", message))
}

pub(crate) async fn ensure_center(app: &App, field: &'static str, id: Option<CenterId>) -> Result<()> {
    let Some(id) = id else { return Ok(()) };
    if app.repos.centers.find(id).await?.is_none() {
        return Err(invalid_reference(field, "Center does not exist"));
    }
    Ok(())
}

pub(crate) async fn ensure_specialty(app: &App, field: &'static str, id: SpecialtyId) -> Result<()> {
    if app.repos.specialties.find(id).await?.is_none() {
        return Err(invalid_reference(field, "Specialty does not exist"));
    }
    Ok(())
}

pub(crate) async fn ensure_user(app: &App, field: &'static str, id: Option<UserId>) -> Result<()> {
    let Some(id) = id else { return Ok(()) };
    if app.repos.users.find(id).await?.is_none() {
        return Err(invalid_reference(field, "User does not exist"));
    }
    Ok(())
}

pub(crate) async fn centers_by_id(app: &App) -> Result<HashMap<CenterId, Center>> {
    let centers = app.repos.centers.find_all().await?;
    Ok(centers.into_iter().map(|v| (v.id, v)).collect())
}

pub(crate) async fn specialties_by_id(app: &App) -> Result<HashMap<SpecialtyId, Specialty>> {
    let specialties = app.repos.specialties.find_all().await?;
    Ok(specialties.into_iter().map(|v| (v.id, v)).collect())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::auth::{auth_config, Identity, TokenKeys};
    use crate::types::id::UserId;
    use crate::types::Role;

    pub fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::new(&auth_config()))
    }

    pub fn bearer(keys: &TokenKeys, role: Role) -> (&'static str, String) {
        let token = keys
            .issue(&Identity {
                id: UserId::new(1),
                username: "tester".into(),
                role,
                center_id: None,
                doctor_id: None,
            })
            .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    /// Admin service wired the same way the server wires it.
    macro_rules! init_admin {
        ($app:expr, $keys:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($app))
                    .app_data(actix_web::web::Data::from($keys))
                    .app_data(crate::http::util::json_config())
                    .app_data(crate::http::util::path_config())
                    .app_data(crate::http::util::query_config())
                    .wrap(actix_web::middleware::from_fn(crate::http::util::request_timeout))
                    .configure(crate::admin::configure)
                    .default_service(actix_web::web::to(crate::http::util::not_found)),
            )
            .await
        };
    }

    pub(crate) use init_admin;
}
