//! Test utilities for RelayGate.
//!
//! Shared fixtures for unit tests: a recording [`Forwarder`] and call builders.
//! It is only compiled when running tests (`#[cfg(test)]`).

use async_trait::async_trait;
use bytes::Bytes;
use hyper::{Method, StatusCode};
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::error::{GatewayError, Result};
use crate::forward::{Forwarder, OutboundCall, UpstreamResponse};
use crate::types::InboundCall;

type FailureFn = Arc<dyn Fn() -> GatewayError + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Upstream(StatusCode, Bytes),
    Fail(FailureFn),
}

/// Fake upstream that records every outbound call and returns a fixed reply.
#[derive(Clone)]
pub struct RecordingForwarder {
    reply: Reply,
    calls: Arc<Mutex<Vec<OutboundCall>>>,
}

impl RecordingForwarder {
    /// Replies with raw bytes.
    pub fn with_bytes(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            reply: Reply::Upstream(status, body.into()),
            calls: Arc::default(),
        }
    }

    /// Replies with a serialized JSON body.
    pub fn with_json(status: StatusCode, body: Value) -> Self {
        Self::with_bytes(status, serde_json::to_vec(&body).unwrap_or_default())
    }

    /// Fails every call with the error built by `make`.
    pub fn failing<F>(make: F) -> Self
    where
        F: Fn() -> GatewayError + Send + Sync + 'static,
    {
        Self {
            reply: Reply::Fail(Arc::new(make)),
            calls: Arc::default(),
        }
    }

    /// Outbound calls seen so far.
    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, call: OutboundCall) -> Result<UpstreamResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        match &self.reply {
            Reply::Upstream(status, body) => Ok(UpstreamResponse {
                status: *status,
                body: body.clone(),
            }),
            Reply::Fail(make) => Err(make()),
        }
    }
}

/// `POST` call carrying `body` as JSON.
pub fn post_call(body: Value) -> InboundCall {
    InboundCall::new(Method::POST).with_json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_forwarder_records_calls() {
        let forwarder = RecordingForwarder::with_json(StatusCode::OK, json!({"ok": true}));
        let call = OutboundCall {
            method: Method::GET,
            url: "https://x.test".into(),
            authorization: None,
            body: None,
        };

        let resp = forwarder.forward(call.clone()).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, Bytes::from(r#"{"ok":true}"#));
        assert_eq!(forwarder.calls(), vec![call]);
    }

    #[tokio::test]
    async fn test_failing_forwarder() {
        let forwarder =
            RecordingForwarder::failing(|| GatewayError::UpstreamTimeout("slow".into()));
        let call = OutboundCall {
            method: Method::GET,
            url: "https://x.test".into(),
            authorization: None,
            body: None,
        };
        assert!(matches!(
            forwarder.forward(call).await,
            Err(GatewayError::UpstreamTimeout(_))
        ));
    }
}
