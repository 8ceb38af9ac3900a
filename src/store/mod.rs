//! Durable storage seam.
//!
//! # Responsibilities
//! - Keyed lookups of shipments, tracking events and users
//! - Enforce uniqueness (tracking number, email)
//! - Group multi-row writes into a single all-or-nothing unit
//!
//! # Design Decisions
//! - Values come back fully materialized; callers never trigger loads by
//!   touching fields
//! - The workflow talks to `dyn ShipmentStore`, so a database-backed store
//!   can replace `MemoryStore` without touching the core

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::auth::{NewUser, User, UserId};
use crate::shipments::{Shipment, ShipmentId, ShipmentStatus, TrackingEvent};

pub use memory::MemoryStore;

/// Errors surfaced by a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The addressed record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A unique constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// Anything else: constraint failures, unavailable backend.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A shipment before the store has assigned it an id.
#[derive(Debug, Clone)]
pub struct ShipmentDraft {
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
}

/// A tracking event before it is attached to a shipment.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub location: String,
    pub description: String,
    pub event_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EventDraft {
    /// An event that happened and was recorded at `at`.
    pub fn new(location: impl Into<String>, description: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            location: location.into(),
            description: description.into(),
            event_time: at,
            created_at: at,
        }
    }
}

/// Outcome of `ShipmentStore::transition_with_event`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    /// Status the row held right before the transition.
    pub previous: ShipmentStatus,
    pub shipment: Shipment,
    pub event: TrackingEvent,
}

/// Shipment and tracking event persistence.
#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Insert a shipment together with its first event.
    ///
    /// Atomic: if the event cannot be written the shipment insert is rolled
    /// back and neither becomes visible. Fails with `Conflict` when the
    /// tracking number is already taken.
    async fn insert_shipment_with_event(
        &self,
        shipment: ShipmentDraft,
        event: EventDraft,
    ) -> StoreResult<(Shipment, TrackingEvent)>;

    /// Move a shipment to `status` and append an event, atomically.
    ///
    /// The transition is applied to the stored row, not to a caller's copy,
    /// so concurrent updates never undo each other's `delivered_at`.
    async fn transition_with_event(
        &self,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
        event: EventDraft,
    ) -> StoreResult<StatusChange>;

    async fn find_by_tracking_number(&self, tracking_number: &str) -> StoreResult<Option<Shipment>>;

    async fn find_by_owner(&self, owner: UserId) -> StoreResult<Vec<Shipment>>;

    /// Shipments of `owner` created within `[start, end]`, bounds inclusive.
    async fn find_by_owner_between(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Shipment>>;

    /// Events of a shipment, most recent `event_time` first.
    async fn events_for(&self, shipment_id: ShipmentId) -> StoreResult<Vec<TrackingEvent>>;
}

/// User account persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;
}
