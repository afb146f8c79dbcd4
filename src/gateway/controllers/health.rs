use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::gateway::{App, Upstream};

fn label(up: bool) -> &'static str {
    if up {
        "ok"
    } else {
        "unavailable"
    }
}

pub async fn check(app: web::Data<App>) -> HttpResponse {
    let (admin, consultas) = futures::join!(
        app.proxy.probe(Upstream::Admin),
        app.proxy.probe(Upstream::Consultas),
    );

    HttpResponse::Ok().json(json!({
        "status": if admin && consultas { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "admin_api": label(admin),
            "consultas_api": label(consultas),
        },
    }))
}
