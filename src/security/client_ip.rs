//! Client identity used as the rate limit key.

use std::net::SocketAddr;

use axum::http::HeaderMap;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Key used when neither a forwarded chain nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the rate limit key for a request.
///
/// The first entry of `X-Forwarded-For` wins when present and non-empty,
/// otherwise the peer IP is used.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    match (forwarded, peer) {
        (Some(first), _) => first.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_CLIENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        Some("192.168.1.20:51234".parse().unwrap())
    }

    #[test]
    fn test_first_forwarded_entry_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1, 10.0.0.2"));
        assert_eq!(client_key(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn test_falls_back_to_peer_ip() {
        let headers = HeaderMap::new();
        assert_eq!(client_key(&headers, peer()), "192.168.1.20");
    }

    #[test]
    fn test_empty_forwarded_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(""));
        assert_eq!(client_key(&headers, peer()), "192.168.1.20");

        headers.insert(X_FORWARDED_FOR, HeaderValue::from_static(" , 10.0.0.1"));
        assert_eq!(client_key(&headers, peer()), "192.168.1.20");
    }

    #[test]
    fn test_unknown_without_any_source() {
        assert_eq!(client_key(&HeaderMap::new(), None), UNKNOWN_CLIENT);
    }
}
