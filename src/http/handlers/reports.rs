//! `/reports` routes.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::auth::Principal;
use crate::error::{AppError, Result};
use crate::http::server::AppState;
use crate::reports::{ShipmentReport, ShipmentStatistics};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportQuery {
    pub start_date: String,
    pub end_date: String,
}

/// `GET /reports/shipment-report?start_date=..&end_date=..`
pub async fn shipment_report(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ShipmentReport>> {
    let start = parse_timestamp("start_date", &query.start_date)?;
    let end = parse_timestamp("end_date", &query.end_date)?;
    let report = state.reports.shipment_report(principal.user_id, start, end).await?;
    Ok(Json(report))
}

/// `GET /reports/statistics`
pub async fn statistics(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ShipmentStatistics>> {
    Ok(Json(state.reports.user_statistics(principal.user_id).await?))
}

/// RFC 3339, or an ISO date-time without offset taken as UTC.
fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::Validation(format!("{field} is not a valid date-time: {raw}")))
}
