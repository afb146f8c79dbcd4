use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use error_stack::{Report, ResultExt};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::App;
use crate::config;
use crate::http::error::StdContext;
use crate::http::{Error, Result};
use crate::types::ErrorKind;

/// Headers that describe a single connection and must not be
/// forwarded.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Admin,
    Consultas,
}

impl Upstream {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Admin => "admin-api",
            Self::Consultas => "consultas-api",
        }
    }

    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Admin => "/admin",
            Self::Consultas => "/consultas",
        }
    }
}

#[derive(Debug, Error)]
#[error("could not build the upstream HTTP client")]
pub struct ClientError;

#[derive(Debug, Error)]
#[error("request to {0} failed")]
struct ForwardFailed(&'static str);

/// Forwards requests to the backend services over one shared
/// connection pool.
#[derive(Debug, Clone)]
pub struct Proxy {
    client: reqwest::Client,
    admin_url: Url,
    consultas_url: Url,
}

impl Proxy {
    pub fn new(cfg: &config::Upstream) -> error_stack::Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .change_context(ClientError)?;

        Ok(Self {
            client,
            admin_url: cfg.admin_url.clone(),
            consultas_url: cfg.consultas_url.clone(),
        })
    }

    #[must_use]
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    #[must_use]
    pub fn base_url(&self, upstream: Upstream) -> &Url {
        match upstream {
            Upstream::Admin => &self.admin_url,
            Upstream::Consultas => &self.consultas_url,
        }
    }

    /// `tail` is the request path without the service prefix.
    #[must_use]
    pub fn target(&self, upstream: Upstream, tail: &str, query: &str) -> String {
        let base = self.base_url(upstream).as_str().trim_end_matches('/');
        let mut target = format!("{base}/{}", tail.trim_start_matches('/'));
        if !query.is_empty() {
            target.push('?');
            target.push_str(query);
        }
        target
    }

    #[tracing::instrument(
        name = "proxy.forward",
        skip(self, req, body),
        fields(upstream = upstream.name(), path = %req.path()),
    )]
    pub async fn forward(
        &self,
        upstream: Upstream,
        req: &HttpRequest,
        body: web::Bytes,
    ) -> Result<HttpResponse> {
        // The matched `tail` is percent-decoded; forward the raw path instead.
        let tail = req
            .uri()
            .path()
            .strip_prefix(upstream.prefix())
            .unwrap_or_default();
        let target = self.target(upstream, tail, req.query_string());

        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .change_kind(ErrorKind::Internal)?;

        let mut outbound = self.client.request(method, &target).body(body);
        for (name, value) in req.headers() {
            if is_hop_by_hop(name.as_str()) || name == header::HOST || name == header::CONTENT_LENGTH
            {
                continue;
            }
            outbound = outbound.header(name.as_str(), value.as_bytes());
        }
        if let Some(peer) = req.peer_addr() {
            outbound = outbound.header("x-forwarded-for", peer.ip().to_string());
        }

        let response = outbound
            .send()
            .await
            .map_err(|e| upstream_error(upstream, e))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .change_kind(ErrorKind::Internal)?;
        tracing::debug!(%status, %target, "upstream answered");

        let mut reply = HttpResponse::build(status);
        for (name, value) in response.headers() {
            if is_hop_by_hop(name.as_str()) || name == reqwest::header::CONTENT_LENGTH {
                continue;
            }
            if let Ok(value) = header::HeaderValue::from_bytes(value.as_bytes()) {
                reply.append_header((name.as_str(), value));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| upstream_error(upstream, e))?;
        Ok(reply.body(body))
    }

    /// Whether the upstream answers its health check.
    pub async fn probe(&self, upstream: Upstream) -> bool {
        let url = self.target(upstream, "health", "");
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.status().is_success(),
            Err(error) => {
                tracing::warn!(upstream = upstream.name(), %error, "health probe failed");
                false
            }
        }
    }
}

fn upstream_error(upstream: Upstream, error: reqwest::Error) -> Error {
    let kind = if error.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::UpstreamUnavailable {
            service: upstream.name(),
        }
    };
    tracing::warn!(upstream = upstream.name(), %error, "upstream request failed");
    Error::from_report(
        kind,
        Report::new(error).change_context(ForwardFailed(upstream.name())),
    )
}

async fn admin(app: web::Data<App>, req: HttpRequest, body: web::Bytes) -> Result<HttpResponse> {
    app.proxy.forward(Upstream::Admin, &req, body).await
}

async fn consultas(
    app: web::Data<App>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    app.proxy.forward(Upstream::Consultas, &req, body).await
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(Upstream::Admin.prefix(), web::route().to(admin))
        .route("/admin/{tail:.*}", web::route().to(admin))
        .route(Upstream::Consultas.prefix(), web::route().to(consultas))
        .route("/consultas/{tail:.*}", web::route().to(consultas));
}

#[cfg(test)]
mod tests {
    use actix_web::dev::ServerHandle;
    use actix_web::test as actix_test;
    use actix_web::{web, HttpRequest, HttpResponse, HttpServer};
    use serde_json::{json, Value};

    use super::*;
    use crate::gateway::test_support::{init_gateway, local, upstreams};
    use crate::repo::AdminRepositories;

    async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        HttpResponse::Ok()
            .insert_header(("x-upstream", "echo"))
            .json(json!({
                "method": req.method().as_str(),
                "path": req.path(),
                "query": req.query_string(),
                "authorization": header("authorization"),
                "body": String::from_utf8_lossy(&body),
            }))
    }

    async fn gone() -> HttpResponse {
        HttpResponse::NotFound().json(json!({ "code": "not_found" }))
    }

    fn spawn_upstream() -> (String, ServerHandle) {
        let server = HttpServer::new(|| {
            actix_web::App::new()
                .route("/missing", web::get().to(gone))
                .default_service(web::to(echo))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn builds_targets_without_the_prefix() {
        let proxy = Proxy::new(&upstreams("http://admin:3000/", "http://consultas:4000")).unwrap();
        assert_eq!(
            proxy.target(Upstream::Admin, "centros/4", ""),
            "http://admin:3000/centros/4"
        );
        assert_eq!(
            proxy.target(Upstream::Consultas, "", "centro_id=2"),
            "http://consultas:4000/?centro_id=2"
        );
    }

    #[actix_web::test]
    async fn forwards_method_path_query_and_body() {
        let (url, handle) = spawn_upstream();
        let app = init_gateway!(local(AdminRepositories::in_memory(), &upstreams(&url, &url)));

        let req = actix_test::TestRequest::put()
            .uri("/admin/centros/3?full=1")
            .insert_header(("Authorization", "Bearer abc"))
            .set_json(json!({ "nombre": "Norte" }))
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 200);
        assert_eq!(res.headers().get("x-upstream").unwrap(), "echo");
        assert_eq!(res.headers().get("access-control-allow-origin").unwrap(), "*");

        let echoed: Value = actix_test::read_body_json(res).await;
        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["path"], "/centros/3");
        assert_eq!(echoed["query"], "full=1");
        assert_eq!(echoed["authorization"], "Bearer abc");
        assert_eq!(echoed["body"], r#"{"nombre":"Norte"}"#);

        let req = actix_test::TestRequest::get().uri("/consultas").to_request();
        let echoed: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(echoed["path"], "/");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn keeps_encoded_characters_in_the_path() {
        let (url, handle) = spawn_upstream();
        let app = init_gateway!(local(AdminRepositories::in_memory(), &upstreams(&url, &url)));

        let req = actix_test::TestRequest::get()
            .uri("/admin/centros/a%3Fb?x=1")
            .to_request();
        let echoed: Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(echoed["path"], "/centros/a%3Fb");
        assert_eq!(echoed["query"], "x=1");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn relays_upstream_errors_untouched() {
        let (url, handle) = spawn_upstream();
        let app = init_gateway!(local(AdminRepositories::in_memory(), &upstreams(&url, &url)));

        let req = actix_test::TestRequest::get().uri("/consultas/missing").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 404);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "not_found");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_upstream_is_unavailable() {
        // Nothing listens on the discard port.
        let closed = "http://127.0.0.1:9";
        let app = init_gateway!(local(
            AdminRepositories::in_memory(),
            &upstreams(closed, closed)
        ));

        let req = actix_test::TestRequest::get().uri("/consultas/1").to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 503);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["code"], "upstream_unavailable");
        assert_eq!(body["data"]["service"], "consultas-api");
    }

    #[actix_web::test]
    async fn answers_preflights_itself() {
        let closed = "http://127.0.0.1:9";
        let app = init_gateway!(local(
            AdminRepositories::in_memory(),
            &upstreams(closed, closed)
        ));

        let req = actix_test::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/admin/centros")
            .to_request();
        let res = actix_test::call_service(&app, req).await;
        assert_eq!(res.status().as_u16(), 204);
        assert!(res.headers().contains_key("access-control-allow-methods"));
    }
}
