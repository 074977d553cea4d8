//! Environment variable names used throughout RelayGate configuration

/// Upstream resolution
pub const BASE_URL: &str = "RELAYGATE_BASE_URL";

/// Origin policy and preflight lists
pub const ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const CORS_METHODS: &str = "CORS_METHODS";
pub const CORS_HEADERS: &str = "CORS_HEADERS";

/// Rate limiting configuration
pub const RATE_LIMIT_REQUESTS: &str = "RATE_LIMIT_REQUESTS";
pub const RATE_LIMIT_WINDOW_SECS: &str = "RATE_LIMIT_WINDOW_SECS";
pub const RATE_LIMIT_CLEANUP_THRESHOLD: &str = "RATE_LIMIT_CLEANUP_THRESHOLD";
pub const RATE_LIMIT_CLEANUP_INTERVAL_SECS: &str = "RATE_LIMIT_CLEANUP_INTERVAL_SECS";

/// Proxy behavior configuration
pub const PROXY_TIMEOUT_SECS: &str = "PROXY_TIMEOUT_SECS";
pub const MAX_BODY_SIZE_MB: &str = "MAX_BODY_SIZE_MB";
pub const MAX_CONNECTIONS: &str = "MAX_CONNECTIONS";

/// Built-in guards
pub const GATEWAY_API_KEYS: &str = "GATEWAY_API_KEYS";
pub const REQUIRE_XRW_HEADER: &str = "REQUIRE_XRW_HEADER";

/// Get all environment variable names for documentation/validation
pub fn all_env_vars() -> &'static [&'static str] {
    &[
        BASE_URL,
        ALLOWED_ORIGINS,
        CORS_METHODS,
        CORS_HEADERS,
        RATE_LIMIT_REQUESTS,
        RATE_LIMIT_WINDOW_SECS,
        RATE_LIMIT_CLEANUP_THRESHOLD,
        RATE_LIMIT_CLEANUP_INTERVAL_SECS,
        PROXY_TIMEOUT_SECS,
        MAX_BODY_SIZE_MB,
        MAX_CONNECTIONS,
        GATEWAY_API_KEYS,
        REQUIRE_XRW_HEADER,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_env_var_names_are_unique() {
        let names: HashSet<_> = all_env_vars().iter().collect();
        assert_eq!(names.len(), all_env_vars().len());
    }
}
