//! Gateway configuration.
//!
//! [`GatewayConfig`] gathers everything a [`GatewayPipeline`](crate::GatewayPipeline)
//! needs besides its transport. Build it with [`GatewayConfig::builder`]:
//!
//! ```
//! use relaygate_core::{GatewayConfig, OriginPolicy, RateLimitConfig};
//! use std::time::Duration;
//!
//! let config = GatewayConfig::builder()
//!     .base_url("https://api.example.com")
//!     .origin(OriginPolicy::Exact("https://app.example.com".into()))
//!     .rate_limit(RateLimitConfig::new(100, Duration::from_secs(60)))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
//! ```

use thiserror::Error;

use crate::hooks::GatewayHooks;
use crate::origin::OriginPolicy;
use crate::types::{CorsConfig, ProxyConfig, RateLimitCleanupConfig, RateLimitConfig};

/// Invalid configuration detected by [`GatewayConfigBuilder::build`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Rate limit must allow at least one request over a non-zero window")]
    InvalidRateLimit,
    #[error("Proxy timeout must be non-zero")]
    InvalidProxyTimeout,
}

/// Static configuration of one gateway pipeline.
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    pub hooks: GatewayHooks,
    /// `None` allows every origin
    pub origin: Option<OriginPolicy>,
    /// Prefix for relative endpoints
    pub base_url: Option<String>,
    pub cors: CorsConfig,
    /// `None` disables the in-memory counter
    pub rate_limit: Option<RateLimitConfig>,
    pub rate_limit_cleanup: RateLimitCleanupConfig,
    pub proxy: ProxyConfig,
}

impl GatewayConfig {
    /// Starts a builder with default values.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::default()
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
    config: GatewayConfig,
}

impl GatewayConfigBuilder {
    pub fn hooks(mut self, hooks: GatewayHooks) -> Self {
        self.config.hooks = hooks;
        self
    }

    pub fn origin(mut self, origin: OriginPolicy) -> Self {
        self.config.origin = Some(origin);
        self
    }

    /// Sets the base URL; blank values leave it unset.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.config.base_url = (!base_url.trim().is_empty()).then_some(base_url);
        self
    }

    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.config.cors = cors;
        self
    }

    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = Some(rate_limit);
        self
    }

    pub fn rate_limit_cleanup(mut self, cleanup: RateLimitCleanupConfig) -> Self {
        self.config.rate_limit_cleanup = cleanup;
        self
    }

    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = proxy;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the rate limit or proxy settings are invalid.
    pub fn build(self) -> Result<GatewayConfig, ConfigError> {
        if let Some(rate_limit) = &self.config.rate_limit
            && !rate_limit.is_valid()
        {
            return Err(ConfigError::InvalidRateLimit);
        }
        if !self.config.proxy.is_valid() {
            return Err(ConfigError::InvalidProxyTimeout);
        }
        Ok(self.config)
    }
}
