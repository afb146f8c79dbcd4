//! Gateway: issues session tokens and forwards `/admin` and
//! `/consultas` traffic to the backend services.
use actix_web::middleware::DefaultHeaders;
use actix_web::{guard, web, HttpResponse};
use error_stack::{Result, ResultExt};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthService, GoogleTokenInfo, TokenKeys};
use crate::config;

pub mod controllers;
mod directory;
pub mod proxy;

pub use directory::AdminApiDirectory;
pub use proxy::{Proxy, Upstream};

#[derive(Debug, Error)]
#[error("Failed to set up the gateway")]
pub struct SetupError;

#[derive(Debug, Clone)]
pub struct App {
    pub auth: AuthService,
    pub proxy: Proxy,
}

impl App {
    #[must_use]
    pub fn new(auth: AuthService, proxy: Proxy) -> Self {
        Self { auth, proxy }
    }

    pub fn from_config(cfg: &config::Gateway) -> Result<Self, SetupError> {
        let keys = Arc::new(TokenKeys::new(&cfg.auth));
        let proxy = Proxy::new(&cfg.upstream).change_context(SetupError)?;
        let directory = AdminApiDirectory::new(
            proxy.client().clone(),
            cfg.upstream.admin_url.clone(),
            Arc::clone(&keys),
        );

        let mut auth = AuthService::new(keys, Arc::new(directory));
        match cfg.auth.google_client_id.clone() {
            Some(client_id) => {
                let verifier = GoogleTokenInfo::new(client_id, cfg.upstream.timeout())
                    .change_context(SetupError)?;
                auth = auth.with_google(Arc::new(verifier));
            }
            None => tracing::info!("Google sign-in is disabled"),
        }

        Ok(Self::new(auth, proxy))
    }
}

/// The dashboard is served from another origin.
#[must_use]
pub fn cors() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add((
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, PATCH, DELETE, OPTIONS",
        ))
        .add((
            "Access-Control-Allow-Headers",
            "Authorization, Content-Type, Accept, Origin, X-Requested-With",
        ))
        .add(("Access-Control-Max-Age", "86400"))
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // Preflights never reach the backends.
    cfg.service(
        web::resource("/{any:.*}")
            .guard(guard::Options())
            .to(preflight),
    )
    .configure(controllers::configure)
    .configure(proxy::configure);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::{App, Proxy};
    use crate::auth::{auth_config, AuthService, CredentialStore, TokenKeys};
    use crate::config;
    use crate::repo::AdminRepositories;

    pub fn upstreams(admin_url: &str, consultas_url: &str) -> config::Upstream {
        config::Upstream {
            admin_url: admin_url.parse().unwrap(),
            consultas_url: consultas_url.parse().unwrap(),
            ..Default::default()
        }
    }

    /// A gateway that checks passwords against `repos` directly.
    pub fn local(repos: AdminRepositories, upstream: &config::Upstream) -> App {
        let keys = Arc::new(TokenKeys::new(&auth_config()));
        let auth = AuthService::new(keys, Arc::new(CredentialStore::new(repos)));
        App::new(auth, Proxy::new(upstream).unwrap())
    }

    /// Gateway wired the same way the server wires it.
    macro_rules! init_gateway {
        ($app:expr) => {{
            let app: crate::gateway::App = $app;
            actix_web::test::init_service(
                actix_web::App::new()
                    .app_data(actix_web::web::Data::from(std::sync::Arc::clone(app.auth.keys())))
                    .app_data(actix_web::web::Data::new(app))
                    .app_data(crate::http::util::json_config())
                    .app_data(crate::http::util::path_config())
                    .app_data(crate::http::util::query_config())
                    .wrap(actix_web::middleware::from_fn(crate::http::util::request_timeout))
                    .wrap(crate::gateway::cors())
                    .configure(crate::gateway::configure)
                    .default_service(actix_web::web::to(crate::http::util::not_found)),
            )
            .await
        }};
    }

    pub(crate) use init_gateway;
}
