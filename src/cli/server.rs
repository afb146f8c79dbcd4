use actix_web::middleware::{from_fn, Condition};
use actix_web::{web, HttpServer};
use clap::Args;
use error_stack::{Result, ResultExt};
use std::net::IpAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing_actix_web::TracingLogger;

use crate::auth::TokenKeys;
use crate::http::util::{
    json_config, not_found, path_config, query_config, request_timeout, QuieterRootSpanBuilder,
    RequestTimeout,
};
use crate::{admin, config, consultas, gateway};

#[derive(Debug, Error)]
#[error("Failed to start server")]
pub struct StartServerError;

/// Expose one of the hospital HTTP services
#[derive(Debug, Args)]
pub struct ServerCommand {
    #[clap(long)]
    pub address: Option<IpAddr>,
    #[clap(long)]
    pub port: Option<u16>,
    #[clap(long)]
    pub workers: Option<NonZeroUsize>,
}

impl ServerCommand {
    fn override_config(&self, listen: &mut config::Listen) {
        // override server configurations if set by the cli
        if let Some(address) = self.address {
            listen.ip = address;
        }

        if let Some(port) = self.port {
            listen.port = port;
        }

        if let Some(workers) = self.workers {
            listen.workers = workers;
        }
    }
}

fn runtime(listen: &config::Listen) -> Result<tokio::runtime::Runtime, StartServerError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(listen.workers.get())
        .build()
        .change_context(StartServerError)
        .attach_printable("could not build tokio runtime")
}

pub fn run_gateway(args: &ServerCommand) -> Result<(), StartServerError> {
    let mut cfg = config::Gateway::load().change_context(StartServerError)?;
    args.override_config(&mut cfg.listen);

    runtime(&cfg.listen)?.block_on(async {
        let app = gateway::App::from_config(&cfg).change_context(StartServerError)?;
        let keys = Arc::clone(app.auth.keys());
        serve("gateway", &cfg.listen, keys, app, gateway::configure, true).await
    })
}

pub fn run_admin(args: &ServerCommand) -> Result<(), StartServerError> {
    let mut cfg = config::Admin::load().change_context(StartServerError)?;
    args.override_config(&mut cfg.listen);

    runtime(&cfg.listen)?.block_on(async {
        let app = admin::App::from_config(&cfg)
            .await
            .change_context(StartServerError)?;
        let keys = Arc::new(TokenKeys::new(&cfg.auth));
        serve("admin-api", &cfg.listen, keys, app, admin::configure, false).await
    })
}

pub fn run_consultas(args: &ServerCommand) -> Result<(), StartServerError> {
    let mut cfg = config::Consultas::load().change_context(StartServerError)?;
    args.override_config(&mut cfg.listen);

    runtime(&cfg.listen)?.block_on(async {
        let app = consultas::App::from_config(&cfg)
            .await
            .change_context(StartServerError)?;
        let keys = Arc::new(TokenKeys::new(&cfg.auth));
        serve("consultas-api", &cfg.listen, keys, app, consultas::configure, false).await
    })
}

/// Every service shares the same middleware stack and extractor
/// configuration; only the state and routes differ.
async fn serve<T>(
    name: &'static str,
    listen: &config::Listen,
    keys: Arc<TokenKeys>,
    state: T,
    routes: fn(&mut web::ServiceConfig),
    cors: bool,
) -> Result<(), StartServerError>
where
    T: Clone + Send + 'static,
{
    let timeout = RequestTimeout(listen.request_timeout());
    let server = HttpServer::new(move || {
        actix_web::App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::from(Arc::clone(&keys)))
            .app_data(web::Data::new(timeout))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            .wrap(from_fn(request_timeout))
            .wrap(Condition::new(cors, gateway::cors()))
            .wrap(TracingLogger::<QuieterRootSpanBuilder>::new())
            .configure(routes)
            .default_service(web::to(not_found))
    })
    .workers(listen.workers.get())
    .bind((listen.ip, listen.port))
    .change_context(StartServerError)
    .attach_printable_lazy(|| format!("could not bind to {}:{}", listen.ip, listen.port))?;

    tracing::info!(
        service = name,
        address = %listen.ip,
        port = listen.port,
        workers = listen.workers.get(),
        "listening for HTTP requests"
    );

    server.run().await.change_context(StartServerError)
}
