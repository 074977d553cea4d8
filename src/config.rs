//! Configuration management for RelayGate.
//!
//! This module handles loading and caching configuration from environment variables.
//! All configurations are computed once at first access and cached for the lifetime
//! of the application using `once_cell::sync::Lazy`.
//!
//! # Caching
//!
//! Configuration values are read from environment variables only once, at startup.
//! Invalid values fall back to defaults and log a warning.
//!
//! # Example
//!
//! ```
//! use relaygate::config;
//!
//! let proxy_config = config::get_proxy_config();
//! println!("Timeout: {:?}", proxy_config.timeout);
//!
//! let gateway = config::gateway_config().unwrap();
//! println!("Base URL: {:?}", gateway.base_url);
//! ```

use std::env::{self, VarError};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use tracing::warn;

use crate::env_vars;
use relaygate_core::{
    ApiKeyGuard, ApiKeys, ConfigError, CorsConfig, GatewayConfig, GatewayHooks, OriginPolicy,
    ProxyConfig, RateLimitCleanupConfig, RateLimitConfig, RequestedWithGuard, defaults,
};

// ============================================================================
// Cached Configuration (computed once at first access)
// ============================================================================

static RATE_LIMIT_CONFIG: Lazy<Option<RateLimitConfig>> =
    Lazy::new(|| compute_rate_limit_config(&process_env));
static RATE_LIMIT_CLEANUP_CONFIG: Lazy<RateLimitCleanupConfig> =
    Lazy::new(|| compute_rate_limit_cleanup_config(&process_env));
static PROXY_CONFIG: Lazy<ProxyConfig> = Lazy::new(|| compute_proxy_config(&process_env));
static BASE_URL: Lazy<Option<String>> = Lazy::new(|| compute_base_url(&process_env));
static ORIGIN_POLICY: Lazy<Option<OriginPolicy>> =
    Lazy::new(|| compute_origin_policy(&process_env));
static CORS_CONFIG: Lazy<CorsConfig> = Lazy::new(|| compute_cors_config(&process_env));
static API_KEYS: Lazy<ApiKeys> = Lazy::new(|| compute_api_keys(&process_env));
static REQUIRE_XRW_HEADER: Lazy<bool> = Lazy::new(|| compute_require_xrw(&process_env));
static MAX_CONNECTIONS: Lazy<usize> = Lazy::new(|| compute_max_connections(&process_env));

fn process_env(key: &str) -> Result<String, VarError> {
    env::var(key)
}

// ============================================================================
// Internal Helpers
// ============================================================================

/// Parses an environment variable with fallback to a default value.
///
/// Logs a warning if the value exists but cannot be parsed.
fn parse_env_var_or_default<T, F>(env_var: &F, var_name: &str, default: T) -> T
where
    T: FromStr + Copy,
    F: Fn(&str) -> Result<String, VarError>,
{
    match env_var(var_name) {
        Ok(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = var_name, value = %value, "Invalid env var value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Reads a variable, treating blank values as unset.
fn non_blank<F>(env_var: &F, var_name: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(var_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses a comma-separated string into a Vec of trimmed, non-empty strings.
fn parse_comma_separated(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Interprets common truthy spellings.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ============================================================================
// Public Configuration Getters
// ============================================================================

/// Returns the cached in-memory rate limiting configuration.
///
/// - `RATE_LIMIT_REQUESTS`: Max requests per window (default: 100, 0 = disabled)
/// - `RATE_LIMIT_WINDOW_SECS`: Window duration in seconds (default: 60)
///
/// `None` means the in-memory counter is disabled.
pub fn get_rate_limit_config() -> Option<&'static RateLimitConfig> {
    RATE_LIMIT_CONFIG.as_ref()
}

fn compute_rate_limit_config<F>(env_var: &F) -> Option<RateLimitConfig>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let max_requests = parse_env_var_or_default(
        env_var,
        env_vars::RATE_LIMIT_REQUESTS,
        defaults::RATE_LIMIT_REQUESTS,
    );
    if max_requests == 0 {
        return None;
    }

    let window_secs = parse_env_var_or_default(
        env_var,
        env_vars::RATE_LIMIT_WINDOW_SECS,
        defaults::RATE_LIMIT_WINDOW_SECS,
    );

    let config = RateLimitConfig::new(max_requests, Duration::from_secs(window_secs));
    if !config.is_valid() {
        warn!("Invalid rate limit configuration, using defaults");
        return Some(RateLimitConfig::new(
            defaults::RATE_LIMIT_REQUESTS,
            defaults::RATE_LIMIT_WINDOW,
        ));
    }

    Some(config)
}

/// Returns the cached rate limiter cleanup configuration.
///
/// - `RATE_LIMIT_CLEANUP_THRESHOLD`: Entry count before cleanup (default: 10000, 0 = disabled)
/// - `RATE_LIMIT_CLEANUP_INTERVAL_SECS`: Minimum interval between cleanups (default: 60)
pub fn get_rate_limit_cleanup_config() -> &'static RateLimitCleanupConfig {
    &RATE_LIMIT_CLEANUP_CONFIG
}

fn compute_rate_limit_cleanup_config<F>(env_var: &F) -> RateLimitCleanupConfig
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let threshold = parse_env_var_or_default(
        env_var,
        env_vars::RATE_LIMIT_CLEANUP_THRESHOLD,
        defaults::RATE_LIMIT_CLEANUP_THRESHOLD,
    );

    let interval_secs = parse_env_var_or_default(
        env_var,
        env_vars::RATE_LIMIT_CLEANUP_INTERVAL_SECS,
        defaults::RATE_LIMIT_CLEANUP_INTERVAL_SECS,
    );

    RateLimitCleanupConfig {
        threshold,
        interval: Duration::from_secs(interval_secs),
    }
}

/// Returns the cached proxy configuration.
///
/// - `PROXY_TIMEOUT_SECS`: Upstream request timeout (default: 30)
/// - `MAX_BODY_SIZE_MB`: Maximum inbound body size (default: 10, 0 = unlimited)
///
/// # Example
///
/// ```
/// use relaygate::config::get_proxy_config;
///
/// let config = get_proxy_config();
/// println!("Timeout: {:?}, Max body: {}", config.timeout, config.max_body_size_mb());
/// ```
pub fn get_proxy_config() -> &'static ProxyConfig {
    &PROXY_CONFIG
}

fn compute_proxy_config<F>(env_var: &F) -> ProxyConfig
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let timeout_secs = parse_env_var_or_default(
        env_var,
        env_vars::PROXY_TIMEOUT_SECS,
        defaults::PROXY_TIMEOUT_SECS,
    );

    let max_body_mb = parse_env_var_or_default(
        env_var,
        env_vars::MAX_BODY_SIZE_MB,
        defaults::MAX_BODY_SIZE_MB,
    );

    let config = ProxyConfig {
        timeout: Duration::from_secs(timeout_secs),
        max_body_size: ProxyConfig::mb_to_bytes(max_body_mb),
    };

    if !config.is_valid() {
        warn!("Invalid proxy configuration, using defaults");
        return ProxyConfig::default();
    }

    config
}

/// Returns the cached base URL for relative endpoints (`RELAYGATE_BASE_URL`).
pub fn get_base_url() -> Option<&'static str> {
    BASE_URL.as_deref()
}

fn compute_base_url<F>(env_var: &F) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    non_blank(env_var, env_vars::BASE_URL)
}

/// Returns the cached origin policy (`ALLOWED_ORIGINS`).
///
/// `None` allows every origin.
pub fn get_origin_policy() -> Option<&'static OriginPolicy> {
    ORIGIN_POLICY.as_ref()
}

fn compute_origin_policy<F>(env_var: &F) -> Option<OriginPolicy>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(env_vars::ALLOWED_ORIGINS)
        .ok()
        .and_then(|value| OriginPolicy::parse(&value))
}

/// Returns the cached preflight method and header lists.
///
/// - `CORS_METHODS` (default: `POST,OPTIONS`)
/// - `CORS_HEADERS` (default: `Content-Type, Authorization`)
pub fn get_cors_config() -> &'static CorsConfig {
    &CORS_CONFIG
}

fn compute_cors_config<F>(env_var: &F) -> CorsConfig
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let defaults = CorsConfig::default();
    let list = |var_name: &str, default: String| {
        non_blank(env_var, var_name)
            .map(|value| parse_comma_separated(&value).join(", "))
            .unwrap_or(default)
    };
    CorsConfig {
        methods: list(env_vars::CORS_METHODS, defaults.methods),
        headers: list(env_vars::CORS_HEADERS, defaults.headers),
    }
}

/// Returns the cached API keys (`GATEWAY_API_KEYS`); empty disables the key guard.
pub fn get_api_keys() -> &'static ApiKeys {
    &API_KEYS
}

fn compute_api_keys<F>(env_var: &F) -> ApiKeys
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(env_vars::GATEWAY_API_KEYS)
        .map(|value| ApiKeys::parse(&value))
        .unwrap_or_default()
}

/// Returns whether the `X-Requested-With` CSRF guard is enabled (`REQUIRE_XRW_HEADER`).
pub fn get_require_xrw_header() -> bool {
    *REQUIRE_XRW_HEADER
}

fn compute_require_xrw<F>(env_var: &F) -> bool
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(env_vars::REQUIRE_XRW_HEADER)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

/// Returns the cached maximum number of concurrent connections.
///
/// Configuration is read from `MAX_CONNECTIONS` environment variable on first access.
///
/// # Returns
///
/// - `0`: Unlimited connections (not recommended for production)
/// - `> 0`: Maximum number of concurrent connections
///
/// **Default**: `10000`
pub fn get_max_connections() -> usize {
    *MAX_CONNECTIONS
}

fn compute_max_connections<F>(env_var: &F) -> usize
where
    F: Fn(&str) -> Result<String, VarError>,
{
    parse_env_var_or_default(env_var, env_vars::MAX_CONNECTIONS, defaults::MAX_CONNECTIONS)
}

// ============================================================================
// Gateway configuration assembly
// ============================================================================

/// Built-in hooks enabled by the environment.
pub fn env_hooks() -> GatewayHooks {
    build_hooks(get_api_keys(), get_require_xrw_header())
}

fn build_hooks(api_keys: &ApiKeys, require_xrw: bool) -> GatewayHooks {
    let mut hooks = GatewayHooks::default();
    if !api_keys.is_empty() {
        hooks.auth = Some(Arc::new(ApiKeyGuard::new(api_keys.clone())));
    }
    if require_xrw {
        hooks.csrf = Some(Arc::new(RequestedWithGuard));
    }
    hooks
}

/// Assembles the pipeline configuration from the cached environment values.
///
/// # Errors
///
/// Returns [`ConfigError`] if the assembled configuration fails validation.
pub fn gateway_config() -> Result<GatewayConfig, ConfigError> {
    let mut builder = GatewayConfig::builder()
        .hooks(env_hooks())
        .cors(get_cors_config().clone())
        .rate_limit_cleanup(get_rate_limit_cleanup_config().clone())
        .proxy(get_proxy_config().clone());

    if let Some(base_url) = get_base_url() {
        builder = builder.base_url(base_url);
    }
    if let Some(origin) = get_origin_policy() {
        builder = builder.origin(origin.clone());
    }
    if let Some(rate_limit) = get_rate_limit_config() {
        builder = builder.rate_limit(rate_limit.clone());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Helper function to create a mock environment function for testing
    fn create_mock_env(
        vars: HashMap<&'static str, &'static str>,
    ) -> impl Fn(&str) -> Result<String, VarError> {
        move |key: &str| {
            vars.get(key)
                .map(|v| v.to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn env_with(
        pairs: &[(&'static str, &'static str)],
    ) -> impl Fn(&str) -> Result<String, VarError> {
        create_mock_env(pairs.iter().copied().collect())
    }

    // ===========================================
    // Rate limit tests
    // ===========================================

    #[test]
    fn test_rate_limit_defaults() {
        let config = compute_rate_limit_config(&env_with(&[])).unwrap();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_duration, Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_zero_requests_disables() {
        let env = env_with(&[(env_vars::RATE_LIMIT_REQUESTS, "0")]);
        assert!(compute_rate_limit_config(&env).is_none());
    }

    #[test]
    fn test_rate_limit_invalid_window_uses_defaults() {
        let env = env_with(&[
            (env_vars::RATE_LIMIT_REQUESTS, "5"),
            (env_vars::RATE_LIMIT_WINDOW_SECS, "0"),
        ]);
        let config = compute_rate_limit_config(&env).unwrap();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_duration, Duration::from_secs(60));
    }

    #[test]
    fn test_rate_limit_unparsable_value_falls_back() {
        let env = env_with(&[
            (env_vars::RATE_LIMIT_REQUESTS, "lots"),
            (env_vars::RATE_LIMIT_WINDOW_SECS, " 10 "),
        ]);
        let config = compute_rate_limit_config(&env).unwrap();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_duration, Duration::from_secs(10));
    }

    #[test]
    fn test_cleanup_config_from_env() {
        let env = env_with(&[
            (env_vars::RATE_LIMIT_CLEANUP_THRESHOLD, "0"),
            (env_vars::RATE_LIMIT_CLEANUP_INTERVAL_SECS, "5"),
        ]);
        let config = compute_rate_limit_cleanup_config(&env);
        assert!(!config.is_enabled());
        assert_eq!(config.interval, Duration::from_secs(5));
    }

    // ===========================================
    // Proxy tests
    // ===========================================

    #[test]
    fn test_proxy_config_from_env() {
        let env = env_with(&[
            (env_vars::PROXY_TIMEOUT_SECS, "5"),
            (env_vars::MAX_BODY_SIZE_MB, "0"),
        ]);
        let config = compute_proxy_config(&env);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_body_size, 0);
    }

    #[test]
    fn test_proxy_zero_timeout_uses_defaults() {
        let env = env_with(&[(env_vars::PROXY_TIMEOUT_SECS, "0")]);
        let config = compute_proxy_config(&env);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
    }

    // ===========================================
    // Origin and CORS tests
    // ===========================================

    #[test]
    fn test_origin_policy_unset_or_blank() {
        assert!(compute_origin_policy(&env_with(&[])).is_none());
        assert!(compute_origin_policy(&env_with(&[(env_vars::ALLOWED_ORIGINS, " ")])).is_none());
    }

    #[test]
    fn test_origin_policy_shapes() {
        let any = compute_origin_policy(&env_with(&[(env_vars::ALLOWED_ORIGINS, "*")]));
        assert!(matches!(any, Some(OriginPolicy::Any)));

        let list = compute_origin_policy(&env_with(&[(
            env_vars::ALLOWED_ORIGINS,
            "https://a.test,https://b.test",
        )]));
        assert!(matches!(list, Some(OriginPolicy::List(ref l)) if l.len() == 2));
    }

    #[test]
    fn test_cors_config_defaults_and_overrides() {
        assert_eq!(compute_cors_config(&env_with(&[])), CorsConfig::default());

        let env = env_with(&[(env_vars::CORS_METHODS, "GET,POST , OPTIONS")]);
        let config = compute_cors_config(&env);
        assert_eq!(config.methods, "GET, POST, OPTIONS");
        assert_eq!(config.headers, "Content-Type, Authorization");
    }

    #[test]
    fn test_base_url_blank_is_unset() {
        assert!(compute_base_url(&env_with(&[(env_vars::BASE_URL, "  ")])).is_none());
        assert_eq!(
            compute_base_url(&env_with(&[(env_vars::BASE_URL, "https://api.test")])).as_deref(),
            Some("https://api.test")
        );
    }

    // ===========================================
    // Guard tests
    // ===========================================

    #[test]
    fn test_api_keys_and_xrw_flag() {
        let env = env_with(&[
            (env_vars::GATEWAY_API_KEYS, "k1,k2"),
            (env_vars::REQUIRE_XRW_HEADER, "TRUE"),
        ]);
        assert_eq!(compute_api_keys(&env).len(), 2);
        assert!(compute_require_xrw(&env));
        assert!(!compute_require_xrw(&env_with(&[(env_vars::REQUIRE_XRW_HEADER, "no")])));
    }

    #[test]
    fn test_build_hooks_enables_guards() {
        let hooks = build_hooks(&ApiKeys::parse("k1"), true);
        assert!(hooks.auth.is_some());
        assert!(hooks.csrf.is_some());

        let hooks = build_hooks(&ApiKeys::new(), false);
        assert!(hooks.auth.is_none());
        assert!(hooks.csrf.is_none());
    }

    #[test]
    fn test_max_connections_from_env() {
        assert_eq!(compute_max_connections(&env_with(&[])), 10_000);
        assert_eq!(
            compute_max_connections(&env_with(&[(env_vars::MAX_CONNECTIONS, "0")])),
            0
        );
    }
}
