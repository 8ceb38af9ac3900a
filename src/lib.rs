//! Shipment tracking portal backend.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌────────────────────────────────────────────────────┐
//!                         │                  SHIPMENT PORTAL                   │
//!                         │                                                    │
//!   Client Request        │  ┌────────┐   ┌──────────────┐   ┌──────────────┐  │
//!   ──────────────────────┼─▶│  http  │──▶│ request gate │──▶│   handlers   │  │
//!                         │  │ server │   │ limit → auth │   └──────┬───────┘  │
//!                         │  └────────┘   └──────────────┘          │          │
//!                         │                                         ▼          │
//!                         │                     ┌─────────────────────────────┐│
//!                         │                     │ shipments workflow │ reports││
//!                         │                     └──────────┬──────────────────┘│
//!                         │                                │                   │
//!                         │                    ┌───────────▼───────┐           │
//!                         │                    │  cache regions    │           │
//!                         │                    │ (read-through)    │           │
//!                         │                    └───────────┬───────┘           │
//!                         │                                ▼                   │
//!                         │                    ┌───────────────────┐           │
//!                         │                    │ store (in-memory) │           │
//!                         │                    └───────────────────┘           │
//!                         │                                                    │
//!                         │  Cross-cutting: config · security · observability  │
//!                         │                 lifecycle · error                  │
//!                         └────────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod auth;
pub mod cache;
pub mod config;
pub mod http;
pub mod reports;
pub mod shipments;
pub mod store;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::PortalConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
