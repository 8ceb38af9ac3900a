//! Aggregate statistics over a user's shipments.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::types::{ReportPeriod, ShipmentReport, ShipmentStatistics, StatusCounts};
use crate::auth::UserId;
use crate::cache::ShipmentCaches;
use crate::error::{AppError, Result};
use crate::shipments::{Shipment, ShipmentStatus};
use crate::store::ShipmentStore;

/// Count `shipments` per status.
pub fn statistics(shipments: &[Shipment]) -> ShipmentStatistics {
    let mut status_counts: StatusCounts = ShipmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for shipment in shipments {
        *status_counts.entry(shipment.status).or_insert(0) += 1;
    }

    ShipmentStatistics {
        total_shipments: shipments.len() as u64,
        status_counts,
    }
}

/// Delivered shipments as a percentage of `stats.total_shipments`.
pub fn delivery_rate(stats: &ShipmentStatistics) -> f64 {
    if stats.total_shipments == 0 {
        return 0.0;
    }
    let delivered = stats
        .status_counts
        .get(&ShipmentStatus::Delivered)
        .copied()
        .unwrap_or(0);
    delivered as f64 / stats.total_shipments as f64 * 100.0
}

/// Builds reports from the store, caching windowed reports.
pub struct ReportEngine {
    store: Arc<dyn ShipmentStore>,
    caches: ShipmentCaches,
}

impl ReportEngine {
    pub fn new(store: Arc<dyn ShipmentStore>, caches: ShipmentCaches) -> Self {
        Self { store, caches }
    }

    /// Report over `owner`'s shipments created within `[start, end]`.
    ///
    /// Cached per `(owner, start, end)`; the entry is never invalidated.
    pub async fn shipment_report(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ShipmentReport> {
        if start > end {
            return Err(AppError::Validation("start_date must not be after end_date".into()));
        }

        let store = Arc::clone(&self.store);
        let report = self
            .caches
            .shipment_reports
            .get_or_try_insert_with((owner, start, end), || async move {
                let shipments = store.find_by_owner_between(owner, start, end).await?;
                let stats = statistics(&shipments);
                tracing::debug!(owner_id = owner, total = stats.total_shipments, "Report computed");
                Ok::<_, AppError>(ShipmentReport {
                    delivery_rate: delivery_rate(&stats),
                    total_shipments: stats.total_shipments,
                    status_counts: stats.status_counts,
                    period: ReportPeriod { start, end },
                    shipments,
                })
            })
            .await?;
        Ok(report)
    }

    /// Statistics over every shipment `owner` has. Not cached.
    pub async fn user_statistics(&self, owner: UserId) -> Result<ShipmentStatistics> {
        let shipments = self.store.find_by_owner(owner).await?;
        Ok(statistics(&shipments))
    }
}
