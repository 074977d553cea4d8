//! RelayGate Core - Reusable outbound request gateway components
//!
//! This crate provides the pipeline a web application places between its
//! browser-facing endpoint and third-party HTTP APIs:
//! - Pluggable auth, CSRF and validation guards
//! - Origin policy with CORS preflight handling
//! - Per-client fixed window rate limiting
//! - Request transformation, base URL resolution and payload masking
//! - Response decoding and shaping
//! - Structured gateway events
//!
//! # Overview
//!
//! `relaygate-core` is framework-agnostic. A host adapter converts each inbound
//! request into an [`InboundCall`], hands it to [`GatewayPipeline::handle`] and
//! writes the returned [`GatewayResponse`] back. Outbound HTTP goes through the
//! [`Forwarder`] trait; [`ReqwestForwarder`] is the default implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use relaygate_core::{
//!     GatewayConfig, GatewayHooks, GatewayPipeline, InboundCall, OriginPolicy,
//!     RateLimitConfig, ReqwestForwarder,
//! };
//! use hyper::Method;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut hooks = GatewayHooks::default();
//! hooks.validate = Some(Arc::new(|call: &InboundCall| call.header("x-session").is_some()));
//!
//! let config = GatewayConfig::builder()
//!     .hooks(hooks)
//!     .base_url("https://api.example.com")
//!     .origin(OriginPolicy::Exact("https://app.example.com".into()))
//!     .rate_limit(RateLimitConfig::new(100, Duration::from_secs(60)))
//!     .build()?;
//!
//! let forwarder = ReqwestForwarder::with_timeout(config.proxy.timeout)?;
//! let pipeline = GatewayPipeline::new(config, Arc::new(forwarder));
//!
//! let call = InboundCall::new(Method::POST)
//!     .with_header("origin", "https://app.example.com")
//!     .with_header("x-session", "s1")
//!     .with_json(&serde_json::json!({"method": "GET", "endpoint": "/todos/1"}));
//! let response = pipeline.handle(call).await;
//! println!("{} {:?}", response.status, response.body);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - The staged request pipeline
//! - [`config`] - Pipeline configuration and builder
//! - [`hooks`] - Hook traits and the [`GatewayHooks`] capability set
//! - [`origin`] - Origin policy and CORS headers
//! - [`rate_limiter`] - Fixed window rate limiting
//! - [`transform`] - Outbound request resolution
//! - [`forward`] - Outbound HTTP transport
//! - [`response`] - Upstream body decoding and shaping
//! - [`event`] - Structured gateway events
//! - [`auth`] - Built-in guards
//! - [`identity`] - Client identity extraction
//! - [`types`] - Core types
//! - [`error`] - Error types and result aliases
//! - [`headers`] - HTTP header constants

#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod defaults;
pub mod error;
pub mod event;
pub mod forward;
pub mod headers;
pub mod hooks;
pub mod identity;
pub mod origin;
pub mod pipeline;
pub mod rate_limiter;
pub mod response;
#[cfg(test)]
pub mod test_utils;
pub mod transform;
pub mod types;

// Re-export commonly used items at crate root
pub use auth::{ApiKeyGuard, ApiKeys, RequestedWithGuard};
pub use config::{ConfigError, GatewayConfig, GatewayConfigBuilder};
pub use error::{GatewayError, Result};
pub use event::{EventKind, EventLevel, GatewayEvent};
pub use forward::{Forwarder, OutboundCall, ReqwestForwarder, UpstreamResponse};
pub use hooks::{
    CallGuard, CorsDeniedFn, EventSink, Fallible, GatewayHooks, HookError, JsonHook, Monitor,
    RequestTransform,
};
pub use origin::OriginPolicy;
pub use pipeline::GatewayPipeline;
pub use response::ShapedBody;
pub use types::{
    CorsConfig, GatewayResponse, InboundCall, ProxyConfig, ProxyRequest, ProxyRequestPatch,
    RateLimitCleanupConfig, RateLimitConfig, RateLimiter, RateWindowState,
};
