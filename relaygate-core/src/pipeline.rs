//! The request pipeline.
//!
//! [`GatewayPipeline::handle`] runs every inbound call through a fixed,
//! strictly sequential series of stages:
//!
//! 1. Auth hook (401)
//! 2. CSRF hook (403)
//! 3. Preflight branch: `OPTIONS` calls are answered here
//! 4. Origin policy (403)
//! 5. In-memory rate counter, then the external rate limit hook (429)
//! 6. Validate hook (401)
//! 7. `request` event
//! 8. Body parsing and request resolution (400, or 500 if a hook fails)
//! 9. Forwarding (500 on transport failure)
//! 10. Response shaping, `response` event and monitor (500 if a hook fails)
//! 11. Final response: upstream failure status or 200
//!
//! The first failing stage ends the invocation. Failures in stages 7 to 10
//! additionally emit an `error` event.

use hyper::{HeaderMap, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};
use crate::event::GatewayEvent;
use crate::forward::{Forwarder, OutboundCall};
use crate::headers;
use crate::identity::{client_identity, rate_limit_key};
use crate::origin;
use crate::response::{ShapedBody, shape};
use crate::transform::resolve;
use crate::types::{GatewayResponse, InboundCall, ProxyRequest, RateLimiter};

/// Outcome of a successful forward, before the final status is chosen.
struct Relayed {
    method: String,
    endpoint: String,
    status: StatusCode,
    body: Value,
}

/// Outbound request gateway.
///
/// Cheap to share behind an `Arc`; each pipeline owns its own rate limit
/// state, so two pipelines never share counters.
pub struct GatewayPipeline {
    config: GatewayConfig,
    limiter: RateLimiter,
    forwarder: Arc<dyn Forwarder>,
}

impl GatewayPipeline {
    /// Creates a pipeline with a fresh rate limiter.
    pub fn new(config: GatewayConfig, forwarder: Arc<dyn Forwarder>) -> Self {
        Self {
            config,
            limiter: RateLimiter::new(),
            forwarder,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The pipeline's rate window store.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Processes one inbound call.
    pub async fn handle(&self, call: InboundCall) -> GatewayResponse {
        let hooks = &self.config.hooks;

        if let Some(auth) = &hooks.auth
            && !auth.check(&call).await
        {
            return denial(GatewayError::Unauthorized);
        }

        if let Some(csrf) = &hooks.csrf
            && !csrf.check(&call).await
        {
            return denial(GatewayError::Forbidden);
        }

        if call.is_preflight() {
            return origin::preflight_response(
                self.config.origin.as_ref(),
                &self.config.cors,
                hooks.on_cors_denied.as_ref(),
                &call,
            );
        }

        if let Err(err) = origin::check_origin(self.config.origin.as_ref(), &call) {
            debug!(error = %err, "Origin rejected");
            return origin::denial_response(&err, hooks.on_cors_denied.as_ref());
        }

        let cors = self.cors_headers(call.origin().unwrap_or_default());
        let client = client_identity(&call);

        let response = match self.admit(&call, &client).await {
            Ok(()) => self.relay(&call, &client).await,
            Err(err) => denial(err),
        };
        response.with_headers(cors)
    }

    /// Headers for responses produced after the origin guard passed.
    fn cors_headers(&self, origin: &str) -> HeaderMap {
        match self.config.origin {
            Some(_) => origin::allow_headers(origin),
            None => HeaderMap::new(),
        }
    }

    /// Rate limiting and validation stages.
    async fn admit(&self, call: &InboundCall, client: &str) -> Result<()> {
        let hooks = &self.config.hooks;

        if let Some(rate_limit) = &self.config.rate_limit {
            let key = rate_limit_key(call, rate_limit);
            if !self
                .limiter
                .check(&key, rate_limit, &self.config.rate_limit_cleanup)
                .await
            {
                debug!(key = %key, "Rate limit exceeded");
                return Err(GatewayError::RateLimitExceeded(key));
            }
        }

        if let Some(external) = &hooks.rate_limit
            && !external.check(call).await
        {
            debug!(client, "External rate limit exceeded");
            return Err(GatewayError::RateLimitExceeded(client.to_string()));
        }

        if let Some(validate) = &hooks.validate
            && !validate.check(call).await
        {
            return Err(GatewayError::ValidationFailed);
        }

        Ok(())
    }

    /// Event, resolution, forwarding and shaping stages.
    async fn relay(&self, call: &InboundCall, client: &str) -> GatewayResponse {
        let origin = call.origin();
        self.emit(GatewayEvent::request(client, call.method.as_str(), origin))
            .await;

        let started = Instant::now();
        match self.exchange(call, client, started).await {
            Ok(response) => response,
            Err(err) => {
                let status = err.status_code();
                self.emit(GatewayEvent::error(
                    client,
                    call.method.as_str(),
                    origin,
                    status.as_u16(),
                    elapsed_ms(started),
                    &err.to_string(),
                ))
                .await;
                failure(err)
            }
        }
    }

    /// Forwards the call, emits the response event and runs the monitor.
    async fn exchange(
        &self,
        call: &InboundCall,
        client: &str,
        started: Instant,
    ) -> Result<GatewayResponse> {
        let relayed = self.forward(call).await?;
        self.emit(GatewayEvent::response(
            client,
            &relayed.method,
            call.origin(),
            &relayed.endpoint,
            relayed.status.as_u16(),
            elapsed_ms(started),
            &relayed.body,
        ))
        .await;

        if let Some(monitor) = &self.config.hooks.monitor {
            monitor
                .observe(call, &relayed.body)
                .await
                .map_err(|err| GatewayError::hook_failed("monitor", err))?;
        }

        let status = if relayed.status.is_success() {
            StatusCode::OK
        } else {
            relayed.status
        };
        Ok(GatewayResponse::json(status, relayed.body))
    }

    async fn forward(&self, call: &InboundCall) -> Result<Relayed> {
        let raw = ProxyRequest::from_body(&call.body);
        let request = resolve(raw, self.config.base_url.as_deref(), &self.config.hooks).await?;
        let outbound = OutboundCall::from_request(&request, call.header(headers::AUTHORIZATION))?;

        let method = outbound.method.to_string();
        let upstream = self.forwarder.forward(outbound).await?;

        let transform = self.config.hooks.transform_response.as_deref();
        let body = shape(ShapedBody::decode(&upstream.body), transform).await?;

        Ok(Relayed {
            method,
            endpoint: request.endpoint,
            status: upstream.status,
            body,
        })
    }

    /// Renders the event through tracing, then hands it to the log hook.
    async fn emit(&self, event: GatewayEvent) {
        event.trace();
        if let Some(sink) = &self.config.hooks.log
            && let Err(err) = sink.emit(&event).await
        {
            warn!(error = %err, "Event sink failed");
        }
    }
}

/// Guard denial response.
fn denial(err: GatewayError) -> GatewayResponse {
    GatewayResponse::error(err.status_code(), &err.user_message())
}

/// Response for a failure after the guards.
fn failure(err: GatewayError) -> GatewayResponse {
    if err.is_malformed_call() {
        GatewayResponse::json(
            err.status_code(),
            json!({ "error": err.user_message(), "code": err.code() }),
        )
    } else {
        GatewayResponse::error(err.status_code(), &err.user_message())
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
