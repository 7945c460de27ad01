//! `X-API-Key` request authentication
//!
//! When no API key is configured every request is accepted (development
//! mode). Otherwise the header must be present (401 when missing) and
//! match the configured key (403 when wrong).

use crate::config::env_value;
use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Header carrying the client API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Outcome of an API key check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Header present and matching.
    Authenticated,
    /// No header supplied while a key is configured.
    Missing {
        reason: String,
    },
    /// Header supplied but wrong.
    Invalid {
        reason: String,
    },
    /// No key configured; the request is allowed unauthenticated.
    NotApplicable,
}

impl AuthOutcome {
    /// Returns true if the request is authenticated or auth is not applicable.
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthOutcome::Authenticated | AuthOutcome::NotApplicable)
    }
}

/// API key verifier
#[derive(Clone, Default)]
pub struct ApiKeyAuth {
    expected: Option<Zeroizing<String>>,
}

impl ApiKeyAuth {
    /// Require `key` on every request
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            expected: Some(Zeroizing::new(key.into())),
        }
    }

    /// Accept every request
    pub fn disabled() -> Self {
        Self { expected: None }
    }

    /// Read the expected key from an environment variable; disabled when unset
    pub fn from_env(var: &str) -> Self {
        match env_value(var) {
            Some(key) => Self::new(key),
            None => {
                tracing::warn!("{} is not set, API key authentication is disabled", var);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Check the request headers
    pub fn verify(&self, headers: &HeaderMap) -> AuthOutcome {
        let Some(expected) = &self.expected else {
            return AuthOutcome::NotApplicable;
        };

        let provided = match headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            Some(value) if !value.is_empty() => value,
            _ => {
                return AuthOutcome::Missing {
                    reason: "API key required. Provide X-API-Key header.".into(),
                }
            }
        };

        if bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
            AuthOutcome::Authenticated
        } else {
            AuthOutcome::Invalid {
                reason: "Invalid API key.".into(),
            }
        }
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    fn headers(key: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(key) = key {
            headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        }
        headers
    }

    #[test]
    fn test_disabled_allows_everything() {
        let auth = ApiKeyAuth::disabled();
        assert_eq!(auth.verify(&headers(None)), AuthOutcome::NotApplicable);
        assert!(auth.verify(&headers(Some("anything"))).is_allowed());
    }

    #[test]
    fn test_missing_key() {
        let auth = ApiKeyAuth::new("secret");
        let outcome = auth.verify(&headers(None));
        assert!(matches!(outcome, AuthOutcome::Missing { .. }));
        assert!(!outcome.is_allowed());
    }

    #[test]
    fn test_wrong_key() {
        let auth = ApiKeyAuth::new("secret");
        let outcome = auth.verify(&headers(Some("guess")));
        assert!(matches!(outcome, AuthOutcome::Invalid { .. }));
        assert!(!outcome.is_allowed());
    }

    #[test]
    fn test_correct_key() {
        let auth = ApiKeyAuth::new("secret");
        assert_eq!(auth.verify(&headers(Some("secret"))), AuthOutcome::Authenticated);
    }

    #[test]
    fn test_header_name_case_insensitive() {
        let auth = ApiKeyAuth::new("secret");
        let mut headers = HeaderMap::new();
        let name = HeaderName::from_bytes(b"X-API-Key").unwrap();
        headers.insert(name, HeaderValue::from_static("secret"));
        assert!(auth.verify(&headers).is_allowed());
    }

    #[test]
    fn test_debug_hides_key() {
        let debug = format!("{:?}", ApiKeyAuth::new("secret"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_key_prefix_and_extension_rejected() {
        let auth = ApiKeyAuth::new("secret");
        assert!(matches!(auth.verify(&headers(Some("secre"))), AuthOutcome::Invalid { .. }));
        assert!(matches!(auth.verify(&headers(Some("secret1"))), AuthOutcome::Invalid { .. }));
    }
}
