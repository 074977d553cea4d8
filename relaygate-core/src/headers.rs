//! HTTP header constants for RelayGate.
//!
//! This module centralizes all HTTP header names used throughout the codebase,
//! avoiding magic strings and ensuring consistency.

/// Origin header - the caller's origin, checked against the origin policy.
pub const ORIGIN: &str = "origin";

/// X-Forwarded-For header - contains the originating client IP.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Authorization header - carried through to the upstream as a Bearer token.
pub const AUTHORIZATION: &str = "authorization";

/// Content-Type header.
pub const CONTENT_TYPE: &str = "content-type";

/// X-Api-Key header (read by [`crate::auth::ApiKeyGuard`]).
pub const X_API_KEY: &str = "x-api-key";

/// X-Requested-With header (read by [`crate::auth::RequestedWithGuard`]).
pub const X_REQUESTED_WITH: &str = "x-requested-with";

/// Access-Control-Allow-Origin header.
pub const ACCESS_CONTROL_ALLOW_ORIGIN: &str = "access-control-allow-origin";

/// Access-Control-Allow-Methods header.
pub const ACCESS_CONTROL_ALLOW_METHODS: &str = "access-control-allow-methods";

/// Access-Control-Allow-Headers header.
pub const ACCESS_CONTROL_ALLOW_HEADERS: &str = "access-control-allow-headers";

/// Vary header.
pub const VARY: &str = "vary";

/// JSON media type used for outbound bodies and inbound responses.
pub const APPLICATION_JSON: &str = "application/json";

/// Prefix expected on forwarded `Authorization` values.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Normalizes an inbound `Authorization` value for the upstream.
///
/// Values already carrying the `Bearer ` prefix are kept; anything else is
/// prefixed. Empty values yield `None`.
///
/// # Example
///
/// ```
/// use relaygate_core::headers::bearer_authorization;
///
/// assert_eq!(bearer_authorization("abc").as_deref(), Some("Bearer abc"));
/// assert_eq!(bearer_authorization("Bearer abc").as_deref(), Some("Bearer abc"));
/// assert_eq!(bearer_authorization("  "), None);
/// ```
pub fn bearer_authorization(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else if value.starts_with(BEARER_PREFIX) {
        Some(value.to_string())
    } else {
        Some(format!("{BEARER_PREFIX}{value}"))
    }
}
