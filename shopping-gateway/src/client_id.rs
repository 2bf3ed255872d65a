// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
use axum::http::HeaderMap;

/// Identifier shared by every caller that sends no forwarding headers.
pub const UNKNOWN_CLIENT: &str = "unknown";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Rate limiting key derived from proxy headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId {
    value: String,
    anonymous: bool,
}

impl ClientId {
    /// Resolve the caller from `X-Forwarded-For` (first hop), then
    /// `X-Real-IP`, falling back to [`UNKNOWN_CLIENT`].
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = || {
            headers
                .get(X_REAL_IP)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        match forwarded.or_else(real_ip) {
            Some(ip) => Self {
                value: ip.to_string(),
                anonymous: false,
            },
            None => Self {
                value: UNKNOWN_CLIENT.to_string(),
                anonymous: true,
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// True when the caller fell into the shared fallback bucket.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_forwarded_for_first_hop() {
        let id = ClientId::from_headers(&headers(&[(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.1, 10.0.0.2",
        )]));
        assert_eq!(id.as_str(), "203.0.113.7");
        assert!(!id.is_anonymous());
    }

    #[test]
    fn test_forwarded_for_wins_over_real_ip() {
        let id = ClientId::from_headers(&headers(&[
            ("x-forwarded-for", "203.0.113.7"),
            ("x-real-ip", "198.51.100.1"),
        ]));
        assert_eq!(id.as_str(), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let id = ClientId::from_headers(&headers(&[("x-real-ip", " 198.51.100.1 ")]));
        assert_eq!(id.as_str(), "198.51.100.1");
    }

    #[test]
    fn test_empty_forwarded_for_uses_real_ip() {
        let id = ClientId::from_headers(&headers(&[
            ("x-forwarded-for", ""),
            ("x-real-ip", "198.51.100.1"),
        ]));
        assert_eq!(id.as_str(), "198.51.100.1");
    }

    #[test]
    fn test_unknown_fallback() {
        let id = ClientId::from_headers(&HeaderMap::new());
        assert_eq!(id.as_str(), UNKNOWN_CLIENT);
        assert!(id.is_anonymous());
    }
}
