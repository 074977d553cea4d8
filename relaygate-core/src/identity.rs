//! Client identity for rate limiting.
//!
//! The identity is the first non-empty entry of `x-forwarded-for`, else the
//! connected peer address, else [`ANONYMOUS_CLIENT`].
//!
//! # Example
//!
//! ```
//! use relaygate_core::{InboundCall, identity::client_identity};
//! use hyper::Method;
//!
//! let call = InboundCall::new(Method::POST)
//!     .with_header("x-forwarded-for", "203.0.113.7, 10.0.0.2");
//! assert_eq!(client_identity(&call), "203.0.113.7");
//! ```

use crate::defaults::ANONYMOUS_CLIENT;
use crate::headers;
use crate::types::{InboundCall, RateLimitConfig};

/// Returns the identity of the caller.
pub fn client_identity(call: &InboundCall) -> String {
    call.header(headers::X_FORWARDED_FOR)
        .and_then(first_forwarded_entry)
        .or_else(|| call.remote_addr.map(|addr| addr.to_string()))
        .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
}

/// Returns the rate limiting key: the configured key function, else the client identity.
pub fn rate_limit_key(call: &InboundCall, config: &RateLimitConfig) -> String {
    match &config.key {
        Some(key) => key(call),
        None => client_identity(call),
    }
}

/// First non-empty entry of an `x-forwarded-for` chain (the originating client).
fn first_forwarded_entry(xff: &str) -> Option<String> {
    xff.split(',')
        .map(str::trim)
        .find(|entry| !entry.is_empty())
        .map(str::to_string)
}
