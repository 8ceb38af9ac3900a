//! The portal's three cache regions.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::ReadThroughCache;
use crate::auth::UserId;
use crate::reports::ShipmentReport;
use crate::shipments::{Shipment, TrackingEvent};

/// Key of a cached report: owner plus the inclusive creation-time window.
pub type ReportKey = (UserId, DateTime<Utc>, DateTime<Utc>);

/// Shared handles to every cache region.
///
/// Cloning is cheap; all clones see the same entries.
#[derive(Clone)]
pub struct ShipmentCaches {
    /// Owner id -> that owner's shipments.
    pub user_shipments: Arc<ReadThroughCache<UserId, Vec<Shipment>>>,
    /// Tracking number -> events, most recent first.
    pub tracking_events: Arc<ReadThroughCache<String, Vec<TrackingEvent>>>,
    /// Closed historical windows; never invalidated.
    pub shipment_reports: Arc<ReadThroughCache<ReportKey, ShipmentReport>>,
}

impl ShipmentCaches {
    pub fn new() -> Self {
        Self {
            user_shipments: Arc::new(ReadThroughCache::new("user_shipments")),
            tracking_events: Arc::new(ReadThroughCache::new("tracking_events")),
            shipment_reports: Arc::new(ReadThroughCache::new("shipment_reports")),
        }
    }
}

impl Default for ShipmentCaches {
    fn default() -> Self {
        Self::new()
    }
}
