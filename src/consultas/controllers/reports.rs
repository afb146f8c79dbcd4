use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::consultas::{App, Scope};
use crate::http::{Error, Guarded, MedicoOrAdmin, Result};
use crate::schema::DoctorReport;
use crate::types::id::{CenterId, DoctorId};
use crate::util::serde_ext::{parse_date_bound, DayBound};
use crate::util::validator::single_error;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(rename = "centro_id", alias = "centroId", default)]
    pub center_id: Option<CenterId>,
}

fn date_bound(
    field: &'static str,
    value: Option<&str>,
    bound: DayBound,
) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match parse_date_bound(value, bound) {
        Some(parsed) => Ok(Some(parsed)),
        None => Err(single_error(
            field,
            "invalid_date",
            "Expected YYYY-MM-DD or an RFC 3339 timestamp",
        )
        .into()),
    }
}

/// Consultations of one doctor, optionally within a date range.
/// A bare `to` date covers the whole day.
#[tracing::instrument(skip(app, session))]
pub async fn by_doctor(
    app: web::Data<App>,
    session: Guarded<MedicoOrAdmin>,
    doctor_id: web::Path<DoctorId>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse> {
    let doctor_id = doctor_id.into_inner();
    let query = query.into_inner();

    let from = date_bound("from", query.from.as_deref(), DayBound::Start)?;
    let to = date_bound("to", query.to.as_deref(), DayBound::End)?;

    let scope = Scope::of(&session)?;
    if let Scope::Doctor { doctor_id: own, .. } = scope {
        if own != doctor_id {
            return Err(Error::forbidden("Doctors can only see their own report"));
        }
    }

    let mut filter = scope.filter(query.center_id);
    filter.doctor_id = Some(doctor_id);
    filter.from = from;
    filter.to = to;

    let consultations = app.repos.consultations.find_matching(&filter).await?;
    Ok(HttpResponse::Ok().json(DoctorReport {
        doctor_id,
        total: consultations.len(),
        consultations,
    }))
}
