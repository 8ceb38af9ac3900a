//! Request middleware.

pub mod gate;
pub mod metrics;

pub use gate::{bearer_token, request_gate};
pub use metrics::track_requests;
