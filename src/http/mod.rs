//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (request ID, trace span, timeout, body limit, metrics)
//!     → middleware/gate.rs (tracking/report routes: rate limit, then bearer token)
//!     → handlers/* (extract, call workflow or report engine)
//!     → AppError or JSON body back to the client
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
