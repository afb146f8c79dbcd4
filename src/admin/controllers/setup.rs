use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::users::register;
use crate::admin::App;
use crate::http::{Error, Result};
use crate::schema::{SetupAdmin, User};
use crate::util::validator::single_error;

#[derive(Debug, Serialize)]
struct Created {
    message: &'static str,
    user: User,
}

/// Creates the first administrator. Unauthenticated, so it only
/// works while there is no administrator at all. The body is parsed
/// after that check so a late caller always gets a conflict.
#[tracing::instrument(skip_all)]
pub async fn create_initial_admin(app: web::Data<App>, body: web::Bytes) -> Result<HttpResponse> {
    if app.repos.users.any_admin().await? {
        tracing::warn!("attempted to create another initial administrator");
        return Err(Error::conflict("An administrator already exists"));
    }

    let form: SetupAdmin = serde_json::from_slice(&body)
        .map_err(|e| Error::from(single_error("body", "malformed", e.to_string())))?;

    let user = register(&app, form.into_new_user()).await?;
    Ok(HttpResponse::Created().json(Created {
        message: "Administrator created",
        user,
    }))
}
