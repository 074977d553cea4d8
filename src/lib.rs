//! RelayGate - An outbound request gateway for browser-facing applications
//!
//! Browser code posts `{method, endpoint, data}` to RelayGate; RelayGate checks
//! the caller, forwards the call to the third-party API and returns a shaped
//! JSON response.
//!
//! # Overview
//!
//! This crate is the standalone server around [`relaygate_core`]:
//! - Environment configuration cached at first access
//! - A hyper HTTP/1 host adapter with routing and body limits
//! - Connection limiting and graceful shutdown
//! - Structured logging with JSON support
//!
//! # Example
//!
//! ```rust,no_run
//! use relaygate::config;
//!
//! let gateway = config::gateway_config().expect("valid configuration");
//! println!("Rate limit: {:?}", gateway.rate_limit);
//! ```
//!
//! # Modules
//!
//! - [`config`] - Configuration management from environment variables
//! - [`env_vars`] - Environment variable constants
//! - [`request_handler`] - HTTP routing and conversion to pipeline calls
//! - [`connection`] - Connection limiting and tracking
//! - [`server`] - Startup info
//! - [`args`] - Command line argument parsing

#![forbid(unsafe_code)]

pub mod args;
pub mod config;
pub mod connection;
pub mod env_vars;
pub mod request_handler;
pub mod server;

// Re-export commonly used items at crate root
pub use config::{
    gateway_config, get_api_keys, get_base_url, get_cors_config, get_max_connections,
    get_origin_policy, get_proxy_config, get_rate_limit_cleanup_config, get_rate_limit_config,
    get_require_xrw_header,
};
pub use request_handler::{GatewayService, handle_request};
pub use relaygate_core::{
    GatewayConfig, GatewayError, GatewayHooks, GatewayPipeline, GatewayResponse, InboundCall,
    OriginPolicy, ProxyRequest, ReqwestForwarder,
};
