use actix_web::web;

pub mod consultations;
pub mod health;
pub mod reports;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::check))
        .service(
            web::scope("/consultas")
                .route("", web::post().to(consultations::create))
                .route("", web::get().to(consultations::list))
                .route("/{id}", web::get().to(consultations::get))
                .route("/{id}", web::put().to(consultations::update))
                .route("/{id}", web::delete().to(consultations::delete)),
        )
        .route("/reportes/doctor/{doctor_id}", web::get().to(reports::by_doctor));
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::auth::{auth_config, Identity, TokenKeys};
    use crate::types::id::{CenterId, DoctorId, UserId};
    use crate::types::Role;

    pub fn keys() -> Arc<TokenKeys> {
        Arc::new(TokenKeys::new(&auth_config()))
    }

    pub fn admin(keys: &TokenKeys) -> (&'static str, String) {
        header(keys, Role::Admin, None, None)
    }

    pub fn doctor(keys: &TokenKeys, doctor_id: u64, center_id: u64) -> (&'static str, String) {
        header(
            keys,
            Role::Medico,
            Some(CenterId::new(center_id)),
            Some(DoctorId::new(doctor_id)),
        )
    }

    pub fn header(
        keys: &TokenKeys,
        role: Role,
        center_id: Option<CenterId>,
        doctor_id: Option<DoctorId>,
    ) -> (&'static str, String) {
        let token = keys
            .issue(&Identity {
                id: UserId::new(1),
                username: "tester".into(),
                role,
                center_id,
                doctor_id,
            })
            .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    /// Consultations service wired the same way the server wires it.
    macro_rules! init_consultas {
        ($app:expr, $keys:expr) => {
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::new($app))
                    .app_data(actix_web::web::Data::from($keys))
                    .app_data(crate::http::util::json_config())
                    .app_data(crate::http::util::path_config())
                    .app_data(crate::http::util::query_config())
                    .wrap(actix_web::middleware::from_fn(crate::http::util::request_timeout))
                    .configure(crate::consultas::configure)
                    .default_service(actix_web::web::to(crate::http::util::not_found)),
            )
            .await
        };
    }

    pub(crate) use init_consultas;
}
