//! Route handlers.
//!
//! Handlers stay thin: extract, call the workflow or engine, wrap the
//! result in JSON. Every failure is an `AppError`.

pub mod auth;
pub mod health;
pub mod reports;
pub mod tracking;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::{AppError, Result};

/// Unwrap a JSON body.
///
/// Malformed or mistyped JSON is a validation error. Anything else keeps
/// the rejection's own status: 413 for an oversized body, 415 for a
/// missing `Content-Type`.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload.map(|Json(value)| value).map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            AppError::Validation(rejection.body_text())
        }
        other => AppError::Body(other.status(), other.body_text()),
    })
}
