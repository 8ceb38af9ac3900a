//! Report payloads.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shipments::{Shipment, ShipmentStatus};

/// Shipments per status. Every status is present, absent ones with zero.
pub type StatusCounts = BTreeMap<ShipmentStatus, u64>;

/// Counts over a set of shipments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentStatistics {
    pub total_shipments: u64,
    pub status_counts: StatusCounts,
}

/// Inclusive creation-time window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentReport {
    pub total_shipments: u64,
    pub status_counts: StatusCounts,
    /// Percentage of shipments delivered, 0.0 when there are none.
    pub delivery_rate: f64,
    pub period: ReportPeriod,
    pub shipments: Vec<Shipment>,
}
