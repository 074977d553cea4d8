//! Structured gateway events.
//!
//! The pipeline emits one `request` event before forwarding, one `response`
//! event after shaping, and an `error` event when forwarding fails. Events are
//! never stored; they are rendered through `tracing` and handed to the
//! configured [`EventSink`](crate::hooks::EventSink), if any.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

/// Which point of the pipeline produced the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Request,
    Response,
    Error,
}

/// Severity attached to an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

/// One outward notification about a pipeline invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    /// Client identity used for rate limiting
    pub client: String,
    /// Inbound method for request events, outbound method afterwards
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GatewayEvent {
    fn new(
        kind: EventKind,
        level: EventLevel,
        client: &str,
        method: &str,
        origin: Option<&str>,
    ) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            level,
            client: client.to_string(),
            method: method.to_string(),
            origin: origin.map(str::to_string),
            endpoint: None,
            status: None,
            duration_ms: None,
            payload: None,
            error: None,
        }
    }

    /// Event emitted once every guard has passed.
    pub fn request(client: &str, method: &str, origin: Option<&str>) -> Self {
        Self::new(EventKind::Request, EventLevel::Info, client, method, origin)
    }

    /// Event emitted after the upstream response was shaped.
    ///
    /// Upstream failure statuses are reported at warn level.
    pub fn response(
        client: &str,
        method: &str,
        origin: Option<&str>,
        endpoint: &str,
        status: u16,
        duration_ms: u64,
        payload: &Value,
    ) -> Self {
        let level = if status >= 400 {
            EventLevel::Warn
        } else {
            EventLevel::Info
        };
        Self {
            endpoint: Some(endpoint.to_string()),
            status: Some(status),
            duration_ms: Some(duration_ms),
            payload: Some(payload.clone()),
            ..Self::new(EventKind::Response, level, client, method, origin)
        }
    }

    /// Event emitted when a call fails after the guards.
    ///
    /// Rejected calls (4xx) are reported at warn level, everything else at error level.
    pub fn error(
        client: &str,
        method: &str,
        origin: Option<&str>,
        status: u16,
        duration_ms: u64,
        error: &str,
    ) -> Self {
        let level = if status >= 500 {
            EventLevel::Error
        } else {
            EventLevel::Warn
        };
        Self {
            status: Some(status),
            duration_ms: Some(duration_ms),
            error: Some(error.to_string()),
            ..Self::new(EventKind::Error, level, client, method, origin)
        }
    }

    /// Renders the event as a `tracing` event at its level.
    pub fn trace(&self) {
        let kind = match self.kind {
            EventKind::Request => "request",
            EventKind::Response => "response",
            EventKind::Error => "error",
        };
        let origin = self.origin.as_deref().unwrap_or("-");
        let endpoint = self.endpoint.as_deref().unwrap_or("-");
        match self.level {
            EventLevel::Info => info!(
                kind,
                client = %self.client,
                method = %self.method,
                origin,
                endpoint,
                status = self.status,
                duration_ms = self.duration_ms,
                "gateway event"
            ),
            EventLevel::Warn => warn!(
                kind,
                client = %self.client,
                method = %self.method,
                origin,
                endpoint,
                status = self.status,
                duration_ms = self.duration_ms,
                error = self.error.as_deref(),
                "gateway event"
            ),
            EventLevel::Error => error!(
                kind,
                client = %self.client,
                method = %self.method,
                origin,
                status = self.status,
                duration_ms = self.duration_ms,
                error = self.error.as_deref().unwrap_or("-"),
                "gateway event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_event_fields() {
        let event = GatewayEvent::request("1.2.3.4", "POST", Some("https://a.test"));
        assert_eq!(event.kind, EventKind::Request);
        assert_eq!(event.level, EventLevel::Info);
        assert_eq!(event.origin.as_deref(), Some("https://a.test"));
        assert!(event.status.is_none());
    }

    #[test]
    fn test_response_event_level_follows_status() {
        let ok = GatewayEvent::response("c", "GET", None, "https://x.test", 200, 5, &json!({}));
        let failed =
            GatewayEvent::response("c", "GET", None, "https://x.test", 502, 5, &json!({}));
        assert_eq!(ok.level, EventLevel::Info);
        assert_eq!(failed.level, EventLevel::Warn);
        assert_eq!(failed.status, Some(502));
    }

    #[test]
    fn test_error_event_level_follows_status() {
        let rejected = GatewayEvent::error("c", "POST", None, 400, 1, "Missing method");
        let failed = GatewayEvent::error("c", "POST", None, 500, 1, "connection refused");
        assert_eq!(rejected.kind, EventKind::Error);
        assert_eq!(rejected.level, EventLevel::Warn);
        assert_eq!(failed.level, EventLevel::Error);
    }

    #[test]
    fn test_event_serialization_skips_empty_fields() {
        let event = GatewayEvent::error("anon", "GET", None, 500, 12, "connection refused");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "error");
        assert_eq!(value["level"], "error");
        assert_eq!(value["error"], "connection refused");
        assert!(value.get("origin").is_none());
        assert!(value.get("payload").is_none());
    }
}
