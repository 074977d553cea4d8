//! Outbound HTTP forwarding.
//!
//! The pipeline talks to upstreams through the [`Forwarder`] trait so hosts
//! and tests can swap the transport. [`ReqwestForwarder`] is the production
//! implementation, backed by a shared pooled [`reqwest::Client`].

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::defaults::BODYLESS_METHODS;
use crate::error::{GatewayError, Result};
use crate::headers;
use crate::types::ProxyRequest;

/// Fully resolved outbound call.
#[derive(Clone, Debug, PartialEq)]
pub struct OutboundCall {
    pub method: Method,
    pub url: String,
    /// Normalized `Authorization` value (`Bearer ...`)
    pub authorization: Option<String>,
    /// Serialized JSON payload; `None` for `GET` and `HEAD`
    pub body: Option<Vec<u8>>,
}

impl OutboundCall {
    /// Builds the outbound call from a resolved request and the inbound
    /// `Authorization` header.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidMethod`] if the uppercased method is not
    /// a valid HTTP method token.
    pub fn from_request(request: &ProxyRequest, authorization: Option<&str>) -> Result<Self> {
        let name = request.method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(name.as_bytes())
            .map_err(|_| GatewayError::InvalidMethod(request.method.clone()))?;

        let body = if BODYLESS_METHODS.contains(&method.as_str()) {
            None
        } else {
            Some(serde_json::to_vec(&request.data).unwrap_or_default())
        };

        Ok(Self {
            method,
            url: request.endpoint.clone(),
            authorization: authorization.and_then(headers::bearer_authorization),
            body,
        })
    }
}

/// Raw upstream answer.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Performs one outbound call.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Sends `call` and returns the upstream status and body.
    ///
    /// Non-success statuses are returned as `Ok`; only transport failures are errors.
    async fn forward(&self, call: OutboundCall) -> Result<UpstreamResponse>;
}

/// [`Forwarder`] backed by reqwest with connection pooling.
#[derive(Clone, Debug)]
pub struct ReqwestForwarder {
    client: reqwest::Client,
}

impl ReqwestForwarder {
    /// Wraps an existing client; its timeouts apply as configured.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::HttpClientError`] if the client cannot be built.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(32)
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Forwarder for ReqwestForwarder {
    async fn forward(&self, call: OutboundCall) -> Result<UpstreamResponse> {
        debug!(method = %call.method, url = %call.url, "Forwarding request");

        let mut builder = self.client.request(call.method, &call.url);
        if let Some(authorization) = call.authorization {
            let value = HeaderValue::from_str(&authorization)
                .map_err(|err| GatewayError::InvalidHeader(format!("authorization: {err}")))?;
            builder = builder.header(headers::AUTHORIZATION, value);
        }
        if let Some(body) = call.body {
            builder = builder
                .header(headers::CONTENT_TYPE, headers::APPLICATION_JSON)
                .body(body);
        }

        let response = builder.send().await.map_err(map_send_error)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| GatewayError::BodyReadError(err.to_string()))?;

        Ok(UpstreamResponse { status, body })
    }
}

fn map_send_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::UpstreamTimeout(err.to_string())
    } else if err.is_connect() {
        GatewayError::UpstreamConnectionFailed(err.to_string())
    } else {
        GatewayError::HttpClientError(err)
    }
}
