//! `/tracking` routes.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;

use super::json_body;
use crate::auth::Principal;
use crate::error::Result;
use crate::http::server::AppState;
use crate::shipments::{NewShipment, Shipment, StatusUpdate, TrackingDetails};

#[derive(Debug, Serialize)]
pub struct ShipmentList {
    pub shipments: Vec<Shipment>,
}

/// `GET /tracking/{tracking_number}`
pub async fn track_shipment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tracking_number): Path<String>,
) -> Result<Json<TrackingDetails>> {
    let details = state.shipments.track(principal.user_id, &tracking_number).await?;
    Ok(Json(details))
}

/// `GET /tracking/my-shipments`
pub async fn my_shipments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ShipmentList>> {
    let shipments = state.shipments.find_by_user(principal.user_id).await?;
    Ok(Json(ShipmentList { shipments }))
}

/// `POST /tracking/create`
pub async fn create_shipment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    payload: std::result::Result<Json<NewShipment>, JsonRejection>,
) -> Result<(StatusCode, Json<Shipment>)> {
    let request = json_body(payload)?;
    let shipment = state.shipments.create(principal.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(shipment)))
}

/// `PUT /tracking/{tracking_number}/status`
pub async fn update_status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(tracking_number): Path<String>,
    payload: std::result::Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<Shipment>> {
    let StatusUpdate { status } = json_body(payload)?;
    let shipment = state
        .shipments
        .update_owned_status(principal.user_id, &tracking_number, status)
        .await?;
    Ok(Json(shipment))
}
