//! Default configuration values for RelayGate.
//!
//! This module centralizes all default values used throughout RelayGate,
//! ensuring consistency between production code and tests.

use std::time::Duration;

/// Marker that allows any origin, alone or inside an origin list.
pub const WILDCARD_ORIGIN: &str = "*";

/// Identity used for rate limiting when no client address is known.
pub const ANONYMOUS_CLIENT: &str = "anon";

/// Default `Access-Control-Allow-Methods` value for preflight responses.
pub const CORS_METHODS: &str = "POST,OPTIONS";

/// Default `Access-Control-Allow-Headers` value for preflight responses.
pub const CORS_HEADERS: &str = "Content-Type, Authorization";

/// Methods sent without a body or content type.
pub const BODYLESS_METHODS: &[&str] = &["GET", "HEAD"];

/// Default maximum requests per rate limit window.
pub const RATE_LIMIT_REQUESTS: u32 = 100;

/// Default rate limit window duration in seconds.
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Default rate limit window duration.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(RATE_LIMIT_WINDOW_SECS);

/// Default cleanup threshold (number of entries before triggering cleanup).
pub const RATE_LIMIT_CLEANUP_THRESHOLD: usize = 10_000;

/// Default cleanup interval in seconds.
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Default cleanup interval duration.
pub const RATE_LIMIT_CLEANUP_INTERVAL: Duration =
    Duration::from_secs(RATE_LIMIT_CLEANUP_INTERVAL_SECS);

/// Default upstream timeout in seconds.
pub const PROXY_TIMEOUT_SECS: u64 = 30;

/// Default upstream timeout duration.
pub const PROXY_TIMEOUT: Duration = Duration::from_secs(PROXY_TIMEOUT_SECS);

/// Default maximum inbound body size in megabytes.
pub const MAX_BODY_SIZE_MB: usize = 10;

/// Default maximum inbound body size in bytes.
pub const MAX_BODY_SIZE: usize = MAX_BODY_SIZE_MB * 1024 * 1024;

/// Default maximum concurrent connections.
pub const MAX_CONNECTIONS: usize = 10_000;

/// Default URL prefix routed to the pipeline.
pub const ROUTE_PREFIX: &str = "/api/proxy";
