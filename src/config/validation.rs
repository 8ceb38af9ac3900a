//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, bucket sizes > 0)
//! - Validate addresses before the listener tries to bind them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PortalConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::PortalConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &PortalConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let rate_limit = &config.rate_limit;
    if rate_limit.capacity == 0 {
        errors.push(ValidationError::new("rate_limit.capacity", "must be greater than 0"));
    }
    if rate_limit.refill_tokens == 0 {
        errors.push(ValidationError::new("rate_limit.refill_tokens", "must be greater than 0"));
    }
    if rate_limit.refill_period_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.refill_period_secs",
            "must be greater than 0",
        ));
    }

    let prefix = &config.shipments.tracking_prefix;
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
        errors.push(ValidationError::new(
            "shipments.tracking_prefix",
            "must be non-empty uppercase ASCII letters or digits",
        ));
    }
    if config.shipments.max_tracking_number_attempts == 0 {
        errors.push(ValidationError::new(
            "shipments.max_tracking_number_attempts",
            "must be at least 1",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }
    if config.security.session_ttl_secs == 0 {
        errors.push(ValidationError::new("security.session_ttl_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
