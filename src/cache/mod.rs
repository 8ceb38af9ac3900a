//! Read-through caching for shipment reads.
//!
//! # Responsibilities
//! - Serve repeated reads without touching the store
//! - Collapse concurrent misses on one key into a single computation
//! - Explicit invalidation at the write sites that make an entry stale
//!
//! Entries live for the lifetime of the process; there is no TTL and no
//! size bound.

pub mod read_through;
pub mod regions;

pub use read_through::ReadThroughCache;
pub use regions::{ReportKey, ShipmentCaches};
