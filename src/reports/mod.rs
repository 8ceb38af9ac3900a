//! Shipment reports and statistics.

pub mod engine;
pub mod types;

pub use engine::{delivery_rate, statistics, ReportEngine};
pub use types::{ReportPeriod, ShipmentReport, ShipmentStatistics, StatusCounts};
