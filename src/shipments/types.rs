//! Shipment and tracking event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::UserId;
use crate::error::AppError;

/// Store-assigned shipment identifier.
pub type ShipmentId = u64;

/// Store-assigned tracking event identifier.
pub type EventId = u64;

/// Delivery status of a shipment.
///
/// Any status may follow any other; only `Delivered` has a side effect
/// (stamping `delivered_at`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    InTransit,
    OutForDelivery,
    Delivered,
    Exception,
}

impl ShipmentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [ShipmentStatus; 5] = [
        ShipmentStatus::Pending,
        ShipmentStatus::InTransit,
        ShipmentStatus::OutForDelivery,
        ShipmentStatus::Delivered,
        ShipmentStatus::Exception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Exception => "EXCEPTION",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    /// Externally visible identifier. Unique and never changed.
    pub tracking_number: String,
    pub owner_id: UserId,
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub recipient_zip_code: String,
    pub status: ShipmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set on the first transition into `Delivered`, refreshed on later ones, never cleared.
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Shipment {
    /// Move to `status` at `now`.
    pub fn transition(&mut self, status: ShipmentStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
        if status == ShipmentStatus::Delivered {
            self.delivered_at = Some(now);
        }
    }
}

/// A point in a shipment's journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: EventId,
    pub shipment_id: ShipmentId,
    pub location: String,
    pub description: String,
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Recipient details submitted when creating a shipment.
///
/// Missing fields deserialize as empty so they are reported by `validate`
/// rather than by the JSON extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewShipment {
    pub recipient_name: String,
    pub recipient_address: String,
    pub recipient_city: String,
    pub recipient_state: String,
    pub recipient_zip_code: String,
}

impl NewShipment {
    /// Reject blank recipient fields.
    pub fn validate(&self) -> Result<(), AppError> {
        let fields = [
            ("recipient_name", &self.recipient_name),
            ("recipient_address", &self.recipient_address),
            ("recipient_city", &self.recipient_city),
            ("recipient_state", &self.recipient_state),
            ("recipient_zip_code", &self.recipient_zip_code),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(format!("{} required", missing.join(", "))))
        }
    }
}

/// Body of a status change request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ShipmentStatus,
}

/// A shipment with its events, most recent first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingDetails {
    pub shipment: Shipment,
    pub events: Vec<TrackingEvent>,
}
