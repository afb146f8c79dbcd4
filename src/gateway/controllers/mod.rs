use actix_web::web;

pub mod auth;
pub mod health;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::check)).service(
        web::scope("/api/auth")
            .route("/login", web::post().to(auth::login))
            .route("/validate", web::get().to(auth::validate))
            .route("/google-login", web::post().to(auth::google_login)),
    );
}
