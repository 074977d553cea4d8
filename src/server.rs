//! Startup information for the RelayGate server.

use crate::{args::Args, config, env_vars};
use relaygate_core::OriginPolicy;
use std::env;

/// Print startup banner with configuration
pub fn print_startup_info(args: &Args) {
    if args.quiet {
        println!(
            "🚀 RelayGate v{} starting on port {}",
            env!("CARGO_PKG_VERSION"),
            args.listen
        );
        return;
    }

    println!("🛰️  {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("   {}", env!("CARGO_PKG_DESCRIPTION"));
    println!();
    println!("📡 Network Configuration:");
    println!("   Listen:         {}:{}", args.bind, args.listen);
    println!("   Route:          {}", args.route);
    println!(
        "   Base URL:       {}",
        config::get_base_url().unwrap_or("[NOT SET] (absolute endpoints only)")
    );
    println!();

    println!("⚡ Rate Limiting:");
    match config::get_rate_limit_config() {
        Some(rate_config) => println!(
            "   Max Requests:   {} per {} seconds",
            rate_config.max_requests,
            rate_config.window_duration.as_secs()
        ),
        None => println!("   Disabled"),
    }

    let proxy_config = config::get_proxy_config();
    println!("🔧 Proxy Configuration:");
    println!("   Timeout:        {} seconds", proxy_config.timeout.as_secs());
    println!("   Max Body Size:  {} MB", proxy_config.max_body_size_mb());

    print_security_config();

    if args.verbose {
        print_env_config();
    }

    println!();
    println!("🚀 Server starting...");
}

/// Human-readable summary of an origin policy.
fn describe_origin_policy(policy: Option<&OriginPolicy>) -> String {
    match policy {
        None => "Any (no policy configured)".to_string(),
        Some(OriginPolicy::Any) => "Any (*)".to_string(),
        Some(OriginPolicy::Exact(origin)) => origin.clone(),
        Some(OriginPolicy::List(origins)) => format!("{} allowed", origins.len()),
        Some(OriginPolicy::Predicate(_)) => "Custom".to_string(),
    }
}

/// Print security configuration summary
fn print_security_config() {
    let api_keys = config::get_api_keys();

    println!("🔒 Security Configuration:");
    println!(
        "   Origins:        {}",
        describe_origin_policy(config::get_origin_policy())
    );
    if api_keys.is_empty() {
        println!("   API Keys:       None configured");
    } else {
        println!("   API Keys:       {} configured", api_keys.len());
    }
    println!(
        "   CSRF Header:    {}",
        if config::get_require_xrw_header() {
            "required"
        } else {
            "not required"
        }
    );
}

/// Print environment variable configuration status (used in verbose mode)
fn print_env_config() {
    println!();
    println!("🔧 Environment Variables:");

    for &var_name in env_vars::all_env_vars() {
        match env::var(var_name) {
            Ok(value) => {
                let display_value = if var_name == env_vars::GATEWAY_API_KEYS {
                    "[CONFIGURED]".to_string()
                } else {
                    value
                };
                println!("   {:<34} = {}", var_name, display_value);
            }
            Err(_) => {
                println!("   {:<34} = [NOT SET]", var_name);
            }
        }
    }
}
