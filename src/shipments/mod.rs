//! Shipment domain.
//!
//! # Data Flow
//! ```text
//! create:  validate → tracking number → store (shipment + origin event) → evict owner list
//! read:    cache region → (miss) store → fill region
//! update:  store (status + event) → evict owner list and event list
//! ```

pub mod tracking_number;
pub mod types;
pub mod workflow;

pub use tracking_number::{RandomTrackingNumbers, TrackingNumberGenerator};
pub use types::{
    EventId, NewShipment, Shipment, ShipmentId, ShipmentStatus, StatusUpdate, TrackingDetails,
    TrackingEvent,
};
pub use workflow::{ensure_owner, ShipmentWorkflow};
