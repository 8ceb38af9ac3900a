//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming tracking/report request:
//!     → client_ip.rs (derive client key from X-Forwarded-For / peer)
//!     → rate_limit.rs (per-key token bucket decision)
//!     → http::middleware::gate (429 or continue to identity resolution)
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before authentication so floods never reach the store
//! - Buckets are created lazily and never evicted
//! - No trust in client input beyond the forwarded-for convention

pub mod client_ip;
pub mod clock;
pub mod headers;
pub mod rate_limit;

pub use client_ip::client_key;
pub use clock::{Clock, SystemClock};
pub use headers::with_security_headers;
pub use rate_limit::{RateLimitPolicy, TokenBucketLimiter};
