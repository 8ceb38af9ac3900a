//! Rate limiting and authentication in front of the tracking and report routes.
//!
//! Order matters: the client's bucket is charged first, so a client over
//! its limit is turned away without a token lookup or store access.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::client_key;

/// Charge the client's bucket, then resolve the bearer token.
///
/// On success the `Principal` is inserted into the request extensions for
/// handlers to pick up with `Extension<Principal>`.
pub async fn request_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    if state.rate_limit_enabled {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let key = client_key(request.headers(), peer);

        if !state.limiter.consume(&key) {
            metrics::record_rate_limited();
            tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
            return AppError::RateLimited.into_response();
        }
    }

    let principal = bearer_token(request.headers()).and_then(|token| state.identity.resolve(token).ok());
    match principal {
        Some(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => AppError::Unauthorized("Authentication required".to_string()).into_response(),
    }
}

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
