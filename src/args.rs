//! Command line argument parsing for RelayGate.
//!
//! This module defines the CLI interface using [`clap`] for argument parsing.
//! It provides configuration for the bind address, port, route prefix and
//! output verbosity.
//!
//! # Example
//!
//! ```no_run
//! use relaygate::args::Args;
//! use clap::Parser;
//!
//! let args = Args::parse();
//! if let Err(e) = args.validate() {
//!     eprintln!("Configuration error: {}", e);
//!     std::process::exit(1);
//! }
//! ```

use clap::Parser;
use relaygate_core::defaults::ROUTE_PREFIX;

/// Command line arguments for RelayGate.
///
/// # Example
///
/// ```
/// use relaygate::args::Args;
/// use clap::Parser;
///
/// let args = Args::try_parse_from(["relaygate", "-l", "8080"]).unwrap();
/// assert_eq!(args.bind, "0.0.0.0");
/// assert_eq!(args.route, "/api/proxy");
/// ```
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    long_about = "Outbound request gateway: browser code calls RelayGate, RelayGate calls third-party APIs\nwith origin checks, rate limiting and response shaping in between.\n\nExample usage:\n  relaygate --listen 8080\n  RELAYGATE_BASE_URL=https://api.example.com relaygate -l 8080 --route /proxy --verbose"
)]
#[command(
    after_help = "Environment variables:\n  RELAYGATE_BASE_URL     Base URL for relative endpoints\n  ALLOWED_ORIGINS        '*' or comma-separated allowed origins\n  RATE_LIMIT_REQUESTS    Max requests per window (default: 100, 0 = disabled)\n  RATE_LIMIT_WINDOW_SECS Rate limit window seconds (default: 60)\n  GATEWAY_API_KEYS       Comma-separated keys required in x-api-key\n  REQUIRE_XRW_HEADER     Require X-Requested-With (default: false)"
)]
pub struct Args {
    /// Address to bind to
    #[arg(
        long,
        short = 'b',
        help = "Bind address for listening",
        value_name = "ADDRESS",
        default_value = "0.0.0.0"
    )]
    pub bind: String,

    /// Port to listen on for incoming requests
    #[arg(
        long,
        short = 'l',
        help = "Listen port for incoming connections",
        value_name = "PORT"
    )]
    pub listen: u16,

    /// Path prefix routed to the gateway pipeline
    #[arg(
        long,
        short = 'r',
        help = "Route prefix handled by the gateway",
        value_name = "PATH",
        default_value = ROUTE_PREFIX
    )]
    pub route: String,

    /// Enable verbose output
    #[arg(
        long,
        short = 'v',
        help = "Show detailed configuration and startup information"
    )]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(
        long,
        short = 'q',
        help = "Suppress configuration output, show only essential messages",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output logs in JSON format (for structured logging)
    #[arg(long, help = "Output logs in JSON format for structured logging")]
    pub json_logs: bool,
}

impl Args {
    /// Validates the parsed command line arguments.
    ///
    /// - The port must be greater than 0
    /// - The bind address must be a valid IP address
    /// - The route must start with `/` and must not shadow `/health`
    ///
    /// # Example
    ///
    /// ```
    /// use relaygate::args::Args;
    /// use clap::Parser;
    ///
    /// let args = Args::try_parse_from(["relaygate", "-l", "8080", "-r", "proxy"]).unwrap();
    /// assert!(args.validate().is_err());
    ///
    /// let args = Args::try_parse_from(["relaygate", "-l", "8080"]).unwrap();
    /// assert!(args.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), String> {
        if self.listen == 0 {
            return Err("Port must be greater than 0".to_string());
        }

        if self.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("Invalid bind address: '{}'", self.bind));
        }

        if !self.route.starts_with('/') {
            return Err(format!("Route must start with '/': '{}'", self.route));
        }

        if self.route.trim_end_matches('/').is_empty() || self.route == "/health" {
            return Err(format!("Route '{}' would shadow other endpoints", self.route));
        }

        Ok(())
    }
}
