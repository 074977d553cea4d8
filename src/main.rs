use clap::Parser;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use relaygate::args::Args;
use relaygate::connection::{ConnectionLimiter, ConnectionTracker};
use relaygate::request_handler::{self, GatewayService};
use relaygate::{config, server};
use relaygate_core::{GatewayPipeline, ReqwestForwarder};

/// Time allowed for in-flight connections after Ctrl-C.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

fn init_tracing(args: &Args) {
    let default_level = if args.verbose {
        "relaygate=debug,relaygate_core=debug"
    } else if args.quiet {
        "relaygate=warn,relaygate_core=warn"
    } else {
        "relaygate=info,relaygate_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if args.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn build_pipeline() -> Result<GatewayPipeline, String> {
    let gateway_config =
        config::gateway_config().map_err(|err| format!("Invalid gateway configuration: {err}"))?;

    let client = reqwest::Client::builder()
        .timeout(gateway_config.proxy.timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|err| format!("Failed to build HTTP client: {err}"))?;

    Ok(GatewayPipeline::new(
        gateway_config,
        Arc::new(ReqwestForwarder::new(client)),
    ))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = args.validate() {
        eprintln!("❌ Configuration error: {err}");
        std::process::exit(1);
    }

    init_tracing(&args);
    server::print_startup_info(&args);

    let pipeline = match build_pipeline() {
        Ok(pipeline) => Arc::new(pipeline),
        Err(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
    };
    let service = Arc::new(GatewayService::new(pipeline, args.route.clone()));

    let bind_ip: IpAddr = match args.bind.parse() {
        Ok(ip) => ip,
        Err(_) => {
            eprintln!("❌ Invalid bind address: {}", args.bind);
            std::process::exit(1);
        }
    };
    let bind_addr = SocketAddr::from((bind_ip, args.listen));
    let listener = match TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("❌ Failed to bind to port {}: {}", args.listen, err);
            std::process::exit(1);
        }
    };

    info!(address = %bind_addr, route = %args.route, "RelayGate is running");

    let limiter = ConnectionLimiter::new(config::get_max_connections());
    let tracker = ConnectionTracker::new();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let (stream, addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(err) => {
                    warn!(error = %err, "Failed to accept connection");
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!(active = tracker.count(), "Shutdown signal received, draining connections");
                break;
            }
        };

        let admission = limiter.admit();
        if admission.is_rejected() {
            warn!(
                client = %addr,
                max_connections = limiter.max_connections(),
                "Connection limit reached, rejecting connection"
            );
            drop(stream);
            continue;
        }

        debug!(client = %addr, "New connection");

        let io = TokioIo::new(stream);
        let service = service.clone();
        let tracked = tracker.track();

        tokio::task::spawn(async move {
            let _admission = admission;
            let _tracked = tracked;
            let remote_ip = addr.ip();

            let handler = service_fn(move |req| {
                request_handler::handle_request(req, Some(remote_ip), service.clone())
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, handler).await {
                debug!(client = %addr, error = %err, "Connection error");
            }
        });
    }

    if tracker.wait_for_shutdown(SHUTDOWN_GRACE_PERIOD).await {
        info!("All connections closed");
    } else {
        error!(
            remaining = tracker.count(),
            "Shutdown grace period elapsed with open connections"
        );
    }
}
