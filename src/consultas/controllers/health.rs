use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::consultas::App;

pub async fn check(app: web::Data<App>) -> HttpResponse {
    let database = match app.pool.as_ref() {
        Some(pool) => match pool.ping().await {
            Ok(..) => "connected",
            Err(report) => {
                tracing::warn!(?report, "database health check failed");
                "disconnected"
            }
        },
        None => "in-memory",
    };

    let status = if database == "disconnected" { "degraded" } else { "ok" };
    HttpResponse::Ok().json(json!({
        "status": status,
        "service": "consultas-api",
        "database": database,
    }))
}
