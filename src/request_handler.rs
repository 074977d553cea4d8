//! HTTP host adapter for the gateway pipeline.
//!
//! Routes hyper requests, enforces the inbound body limit, converts requests
//! into [`InboundCall`]s and writes [`GatewayResponse`]s back as JSON.
//!
//! # Routes
//!
//! - `<route>` and `<route>/...`: the gateway pipeline
//! - `GET /health`: `{"status":"ok"}`
//! - anything else: 404

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

use relaygate_core::headers::{APPLICATION_JSON, CONTENT_TYPE};
use relaygate_core::{GatewayPipeline, GatewayResponse, InboundCall};

/// Health check path.
pub const HEALTH_PATH: &str = "/health";

/// Shared state for every connection.
pub struct GatewayService {
    pub pipeline: Arc<GatewayPipeline>,
    /// Path prefix handled by the pipeline
    pub route: String,
}

impl GatewayService {
    pub fn new(pipeline: Arc<GatewayPipeline>, route: impl Into<String>) -> Self {
        let route = route.into();
        let route = route.trim_end_matches('/').to_string();
        Self { pipeline, route }
    }

    /// Returns true if `path` is the route or below it.
    pub fn is_gateway_path(&self, path: &str) -> bool {
        path.strip_prefix(self.route.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Handles one HTTP request.
pub async fn handle_request<B>(
    req: Request<B>,
    remote_addr: Option<IpAddr>,
    service: Arc<GatewayService>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let path = req.uri().path();

    if path == HEALTH_PATH && req.method() == Method::GET {
        return Ok(create_json_response(StatusCode::OK, &json!({"status": "ok"})));
    }

    if !service.is_gateway_path(path) {
        return Ok(create_error_response(StatusCode::NOT_FOUND, "Not Found"));
    }

    let max_body_size = service.pipeline.config().proxy.max_body_size;
    let (parts, body) = req.into_parts();
    let body_bytes = match body.collect().await {
        Ok(collected) => {
            let collected_bytes = collected.to_bytes();
            if max_body_size > 0 && collected_bytes.len() > max_body_size {
                return Ok(create_error_response(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Request body too large",
                ));
            }
            collected_bytes
        }
        Err(err) => {
            debug!(error = %err, "Failed to read request body");
            return Ok(create_error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ));
        }
    };

    let call = InboundCall {
        method: parts.method,
        headers: parts.headers,
        body: body_bytes,
        remote_addr,
    };

    let response = service.pipeline.handle(call).await;
    Ok(into_http_response(response))
}

/// Converts a pipeline response into a hyper response.
pub fn into_http_response(response: GatewayResponse) -> Response<Full<Bytes>> {
    let body = response.body_bytes();
    let mut builder = Response::builder().status(response.status);
    if response.body.is_some() {
        builder = builder.header(CONTENT_TYPE, APPLICATION_JSON);
    }
    let mut http = builder
        .body(Full::new(body))
        .unwrap_or_else(|_| fallback_response());
    http.headers_mut().extend(response.headers);
    http
}

/// Creates a JSON response with the given status.
pub fn create_json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    into_http_response(GatewayResponse::json(status, body.clone()))
}

/// Creates a standardized `{"error": message}` response.
pub fn create_error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    into_http_response(GatewayResponse::error(status, message))
}

fn fallback_response() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(
        br#"{"error":"Internal Server Error"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaygate_core::{
        Forwarder, GatewayConfig, OutboundCall, ProxyConfig, UpstreamResponse,
    };
    use std::time::Duration;

    struct EchoForwarder;

    #[async_trait::async_trait]
    impl Forwarder for EchoForwarder {
        async fn forward(&self, call: OutboundCall) -> relaygate_core::Result<UpstreamResponse> {
            Ok(UpstreamResponse {
                status: StatusCode::OK,
                body: Bytes::from(serde_json::to_vec(&json!({"url": call.url})).unwrap()),
            })
        }
    }

    fn service(max_body_size: usize) -> Arc<GatewayService> {
        let config = GatewayConfig::builder()
            .proxy(ProxyConfig {
                timeout: Duration::from_secs(5),
                max_body_size,
            })
            .build()
            .unwrap();
        let pipeline = GatewayPipeline::new(config, Arc::new(EchoForwarder));
        Arc::new(GatewayService::new(Arc::new(pipeline), "/api/proxy/"))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ===========================================
    // Routing tests
    // ===========================================

    #[test]
    fn test_gateway_path_matching() {
        let service = service(0);
        assert!(service.is_gateway_path("/api/proxy"));
        assert!(service.is_gateway_path("/api/proxy/"));
        assert!(service.is_gateway_path("/api/proxy/todos"));
        assert!(!service.is_gateway_path("/api/proxyx"));
        assert!(!service.is_gateway_path("/api"));
    }

    #[tokio::test]
    async fn test_health() {
        let response = handle_request(request(Method::GET, "/health", ""), None, service(0))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = handle_request(request(Method::POST, "/other", "{}"), None, service(0))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await, json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_gateway_route_reaches_pipeline() {
        let body = r#"{"method":"GET","endpoint":"https://x.test/a"}"#;
        let response = handle_request(request(Method::POST, "/api/proxy", body), None, service(0))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"url": "https://x.test/a"}));
    }

    #[tokio::test]
    async fn test_body_over_limit_is_413() {
        let service = service(16);
        let body = r#"{"method":"GET","endpoint":"https://x.test/a"}"#;
        let response = handle_request(request(Method::POST, "/api/proxy", body), None, service)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_preflight_has_no_body_or_content_type() {
        let response = handle_request(
            request(Method::OPTIONS, "/api/proxy", ""),
            None,
            service(0),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_TYPE).is_none());
    }
}
