//! Shipment creation, lookup and status changes.

use std::sync::Arc;

use chrono::Utc;

use super::tracking_number::{RandomTrackingNumbers, TrackingNumberGenerator};
use super::types::{NewShipment, Shipment, ShipmentStatus, TrackingDetails, TrackingEvent};
use crate::auth::UserId;
use crate::cache::ShipmentCaches;
use crate::config::ShipmentConfig;
use crate::error::{AppError, Result};
use crate::observability::metrics;
use crate::store::{EventDraft, ShipmentDraft, ShipmentStore, StoreError};

/// Location of the event recorded when a shipment is created.
pub const ORIGIN_LOCATION: &str = "Origin Facility";
/// Description of the event recorded when a shipment is created.
pub const ORIGIN_DESCRIPTION: &str = "Shipment created and pending pickup";
/// Location of the events recorded on status changes.
pub const STATUS_UPDATE_LOCATION: &str = "Status Update";

/// Orchestrates the store and the cache regions for shipment operations.
///
/// Reads of a user's shipment list and of a shipment's events go through
/// the caches; every write invalidates the entries it makes stale before
/// returning.
pub struct ShipmentWorkflow {
    store: Arc<dyn ShipmentStore>,
    caches: ShipmentCaches,
    tracking_numbers: Arc<dyn TrackingNumberGenerator>,
    max_attempts: u32,
}

impl ShipmentWorkflow {
    pub fn new(store: Arc<dyn ShipmentStore>, caches: ShipmentCaches, config: &ShipmentConfig) -> Self {
        Self {
            store,
            caches,
            tracking_numbers: Arc::new(RandomTrackingNumbers::new(config.tracking_prefix.clone())),
            max_attempts: config.max_tracking_number_attempts.max(1),
        }
    }

    /// Replace the tracking number source.
    pub fn with_generator(mut self, generator: Arc<dyn TrackingNumberGenerator>) -> Self {
        self.tracking_numbers = generator;
        self
    }

    /// Create a `PENDING` shipment for `owner` together with its origin event.
    ///
    /// The shipment and the event are written as one unit. A tracking number
    /// clash is retried with a fresh number a bounded number of times.
    pub async fn create(&self, owner: UserId, request: NewShipment) -> Result<Shipment> {
        request.validate()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = Utc::now();
            let draft = ShipmentDraft {
                tracking_number: self.tracking_numbers.generate(),
                owner_id: owner,
                recipient_name: request.recipient_name.clone(),
                recipient_address: request.recipient_address.clone(),
                recipient_city: request.recipient_city.clone(),
                recipient_state: request.recipient_state.clone(),
                recipient_zip_code: request.recipient_zip_code.clone(),
                status: ShipmentStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            let origin = EventDraft::new(ORIGIN_LOCATION, ORIGIN_DESCRIPTION, now);

            match self.store.insert_shipment_with_event(draft, origin).await {
                Ok((shipment, _)) => {
                    self.caches.user_shipments.invalidate(&owner);
                    metrics::record_shipment_created();
                    tracing::info!(
                        tracking_number = %shipment.tracking_number,
                        owner_id = owner,
                        "Shipment created"
                    );
                    return Ok(shipment);
                }
                Err(StoreError::Conflict(detail)) if attempt < self.max_attempts => {
                    tracing::warn!(attempt, detail = %detail, "Tracking number taken, retrying");
                }
                Err(StoreError::Conflict(detail)) => {
                    return Err(AppError::Internal(format!(
                        "no unique tracking number after {attempt} attempts: {detail}"
                    )));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Shipment> {
        self.store
            .find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| AppError::NotFound(tracking_number.to_string()))
    }

    /// All shipments owned by `owner`. Cached per owner.
    pub async fn find_by_user(&self, owner: UserId) -> Result<Vec<Shipment>> {
        let store = Arc::clone(&self.store);
        let shipments = self
            .caches
            .user_shipments
            .get_or_try_insert_with(owner, || async move { store.find_by_owner(owner).await })
            .await?;
        Ok(shipments)
    }

    /// Move a shipment to `status` and record a tracking event for it.
    pub async fn update_status(&self, tracking_number: &str, status: ShipmentStatus) -> Result<Shipment> {
        let shipment = self.find_by_tracking_number(tracking_number).await?;
        self.apply_status(shipment, status).await
    }

    /// `update_status` on behalf of `requester`, who must own the shipment.
    pub async fn update_owned_status(
        &self,
        requester: UserId,
        tracking_number: &str,
        status: ShipmentStatus,
    ) -> Result<Shipment> {
        let shipment = self.find_by_tracking_number(tracking_number).await?;
        ensure_owner(requester, &shipment)?;
        self.apply_status(shipment, status).await
    }

    /// Events of a shipment, most recent first. Cached per tracking number.
    pub async fn list_events(&self, tracking_number: &str) -> Result<Vec<TrackingEvent>> {
        let shipment = self.find_by_tracking_number(tracking_number).await?;
        self.events_of(&shipment).await
    }

    /// Shipment and events for `requester`.
    ///
    /// Ownership is checked before any event is loaded.
    pub async fn track(&self, requester: UserId, tracking_number: &str) -> Result<TrackingDetails> {
        let shipment = self.find_by_tracking_number(tracking_number).await?;
        ensure_owner(requester, &shipment)?;
        let events = self.events_of(&shipment).await?;
        Ok(TrackingDetails { shipment, events })
    }

    async fn apply_status(&self, shipment: Shipment, status: ShipmentStatus) -> Result<Shipment> {
        let now = Utc::now();
        let event = EventDraft::new(STATUS_UPDATE_LOCATION, format!("Status changed to {status}"), now);
        let change = self
            .store
            .transition_with_event(shipment.id, status, now, event)
            .await?;
        let updated = change.shipment;

        self.caches.user_shipments.invalidate(&updated.owner_id);
        self.caches.tracking_events.invalidate(&updated.tracking_number);

        tracing::info!(
            tracking_number = %updated.tracking_number,
            from = %change.previous,
            to = %status,
            "Shipment status updated"
        );
        Ok(updated)
    }

    async fn events_of(&self, shipment: &Shipment) -> Result<Vec<TrackingEvent>> {
        let store = Arc::clone(&self.store);
        let shipment_id = shipment.id;
        let events = self
            .caches
            .tracking_events
            .get_or_try_insert_with(shipment.tracking_number.clone(), || async move {
                store.events_for(shipment_id).await
            })
            .await?;
        Ok(events)
    }
}

/// Fails with `Forbidden` unless `requester` owns `shipment`.
pub fn ensure_owner(requester: UserId, shipment: &Shipment) -> Result<()> {
    if shipment.owner_id == requester {
        Ok(())
    } else {
        tracing::warn!(
            tracking_number = %shipment.tracking_number,
            requester,
            "Access to foreign shipment denied"
        );
        Err(AppError::Forbidden)
    }
}
