//! Pluggable hooks for the request pipeline.
//!
//! Every optional behavior of the pipeline (guards, transforms, sinks) is a
//! trait object stored in [`GatewayHooks`]. The traits are async so hooks can
//! call out to other services; plain closures implement them too, which makes
//! synchronous hooks a one-liner:
//!
//! ```
//! use relaygate_core::{GatewayHooks, InboundCall};
//! use std::sync::Arc;
//!
//! let mut hooks = GatewayHooks::default();
//! hooks.auth = Some(Arc::new(|call: &InboundCall| call.header("x-session").is_some()));
//! hooks.transform_response = Some(Arc::new(|body: serde_json::Value| body["data"].clone()));
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::event::GatewayEvent;
use crate::types::{InboundCall, ProxyRequest, ProxyRequestPatch};

/// Boxed error returned by fallible hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Pass/fail decision over an inbound call (auth, CSRF, validation, external rate limit).
#[async_trait]
pub trait CallGuard: Send + Sync {
    /// Returns `true` to let the call continue.
    async fn check(&self, call: &InboundCall) -> bool;
}

#[async_trait]
impl<F> CallGuard for F
where
    F: Fn(&InboundCall) -> bool + Send + Sync,
{
    async fn check(&self, call: &InboundCall) -> bool {
        self(call)
    }
}

/// Rewrites the outbound call description before validation.
///
/// An `Err` fails the call with a 500 and an `error` event.
#[async_trait]
pub trait RequestTransform: Send + Sync {
    /// Returns the fields to override; `None` fields keep their values.
    async fn transform(&self, request: &ProxyRequest) -> Result<ProxyRequestPatch, HookError>;
}

#[async_trait]
impl<F> RequestTransform for F
where
    F: Fn(&ProxyRequest) -> ProxyRequestPatch + Send + Sync,
{
    async fn transform(&self, request: &ProxyRequest) -> Result<ProxyRequestPatch, HookError> {
        Ok(self(request))
    }
}

/// Replaces a JSON value wholesale (sanitize, mask, response transform).
///
/// An `Err` fails the call with a 500 and an `error` event.
#[async_trait]
pub trait JsonHook: Send + Sync {
    /// Returns the replacement value.
    async fn apply(&self, value: Value) -> Result<Value, HookError>;
}

#[async_trait]
impl<F> JsonHook for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    async fn apply(&self, value: Value) -> Result<Value, HookError> {
        Ok(self(value))
    }
}

/// Receives every [`GatewayEvent`] the pipeline emits.
///
/// Failures are logged by the pipeline and otherwise ignored.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Consumes one event.
    async fn emit(&self, event: &GatewayEvent) -> Result<(), HookError>;
}

#[async_trait]
impl<F> EventSink for F
where
    F: Fn(&GatewayEvent) -> Result<(), HookError> + Send + Sync,
{
    async fn emit(&self, event: &GatewayEvent) -> Result<(), HookError> {
        self(event)
    }
}

/// Observes each successfully forwarded call and its shaped response.
///
/// An `Err` fails the call with a 500 and an `error` event.
#[async_trait]
pub trait Monitor: Send + Sync {
    /// Called after the response event.
    async fn observe(&self, call: &InboundCall, body: &Value) -> Result<(), HookError>;
}

#[async_trait]
impl<F> Monitor for F
where
    F: Fn(&InboundCall, &Value) + Send + Sync,
{
    async fn observe(&self, call: &InboundCall, body: &Value) -> Result<(), HookError> {
        self(call, body);
        Ok(())
    }
}

/// Adapter turning a closure that returns `Result` into a hook.
///
/// Plain closures cover infallible hooks; wrap fallible ones:
///
/// ```
/// use relaygate_core::{Fallible, GatewayHooks, HookError};
/// use serde_json::Value;
/// use std::sync::Arc;
///
/// let mut hooks = GatewayHooks::default();
/// hooks.sanitize = Some(Arc::new(Fallible(|v: Value| -> Result<Value, HookError> {
///     if v.get("script").is_some() {
///         return Err("script payloads are not allowed".into());
///     }
///     Ok(v)
/// })));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Fallible<F>(pub F);

#[async_trait]
impl<F> RequestTransform for Fallible<F>
where
    F: Fn(&ProxyRequest) -> Result<ProxyRequestPatch, HookError> + Send + Sync,
{
    async fn transform(&self, request: &ProxyRequest) -> Result<ProxyRequestPatch, HookError> {
        (self.0)(request)
    }
}

#[async_trait]
impl<F> JsonHook for Fallible<F>
where
    F: Fn(Value) -> Result<Value, HookError> + Send + Sync,
{
    async fn apply(&self, value: Value) -> Result<Value, HookError> {
        (self.0)(value)
    }
}

#[async_trait]
impl<F> Monitor for Fallible<F>
where
    F: Fn(&InboundCall, &Value) -> Result<(), HookError> + Send + Sync,
{
    async fn observe(&self, call: &InboundCall, body: &Value) -> Result<(), HookError> {
        (self.0)(call, body)
    }
}

/// Builds the body of an origin denial from the rejected origin.
pub type CorsDeniedFn = Arc<dyn Fn(&str) -> Value + Send + Sync>;

/// Optional capabilities threaded through the pipeline.
///
/// Each stage checks for presence and awaits the hook; absent hooks pass.
#[derive(Clone, Default)]
pub struct GatewayHooks {
    /// Stage 1: failure yields 401 `Unauthorized (auth)`
    pub auth: Option<Arc<dyn CallGuard>>,
    /// Stage 2: failure yields 403 `Forbidden (csrf/xss)`
    pub csrf: Option<Arc<dyn CallGuard>>,
    /// External limiter consulted after the in-memory counter; failure yields 429
    pub rate_limit: Option<Arc<dyn CallGuard>>,
    /// Stage 6: failure yields 401 `Unauthorized`
    pub validate: Option<Arc<dyn CallGuard>>,
    pub transform_request: Option<Arc<dyn RequestTransform>>,
    /// Applied to structured upstream bodies only
    pub transform_response: Option<Arc<dyn JsonHook>>,
    pub sanitize: Option<Arc<dyn JsonHook>>,
    /// Runs after `sanitize`
    pub mask_sensitive_data: Option<Arc<dyn JsonHook>>,
    pub log: Option<Arc<dyn EventSink>>,
    pub monitor: Option<Arc<dyn Monitor>>,
    pub on_cors_denied: Option<CorsDeniedFn>,
}

impl fmt::Debug for GatewayHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayHooks")
            .field("auth", &self.auth.is_some())
            .field("csrf", &self.csrf.is_some())
            .field("rate_limit", &self.rate_limit.is_some())
            .field("validate", &self.validate.is_some())
            .field("transform_request", &self.transform_request.is_some())
            .field("transform_response", &self.transform_response.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .field("mask_sensitive_data", &self.mask_sensitive_data.is_some())
            .field("log", &self.log.is_some())
            .field("monitor", &self.monitor.is_some())
            .field("on_cors_denied", &self.on_cors_denied.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Method;
    use serde_json::json;

    struct AsyncAllowList(Vec<&'static str>);

    #[async_trait]
    impl CallGuard for AsyncAllowList {
        async fn check(&self, call: &InboundCall) -> bool {
            tokio::task::yield_now().await;
            call.header("x-user")
                .is_some_and(|user| self.0.contains(&user))
        }
    }

    #[tokio::test]
    async fn test_closure_guard() {
        let guard: Arc<dyn CallGuard> =
            Arc::new(|call: &InboundCall| call.method == Method::POST);
        assert!(guard.check(&InboundCall::new(Method::POST)).await);
        assert!(!guard.check(&InboundCall::new(Method::GET)).await);
    }

    #[tokio::test]
    async fn test_async_guard() {
        let guard: Arc<dyn CallGuard> = Arc::new(AsyncAllowList(vec!["alice"]));
        let alice = InboundCall::new(Method::POST).with_header("x-user", "alice");
        let bob = InboundCall::new(Method::POST).with_header("x-user", "bob");
        assert!(guard.check(&alice).await);
        assert!(!guard.check(&bob).await);
    }

    #[tokio::test]
    async fn test_closure_json_hook() {
        let hook: Arc<dyn JsonHook> = Arc::new(|mut v: Value| {
            v["masked"] = json!(true);
            v
        });
        assert_eq!(hook.apply(json!({})).await.unwrap(), json!({"masked": true}));
    }

    #[tokio::test]
    async fn test_fallible_json_hook() {
        let hook: Arc<dyn JsonHook> = Arc::new(Fallible(|v: Value| -> Result<Value, HookError> {
            match v.get("reject") {
                Some(_) => Err("rejected payload".into()),
                None => Ok(v),
            }
        }));
        assert_eq!(hook.apply(json!({"a": 1})).await.unwrap(), json!({"a": 1}));

        let err = hook.apply(json!({"reject": true})).await.unwrap_err();
        assert_eq!(err.to_string(), "rejected payload");
    }

    #[tokio::test]
    async fn test_fallible_monitor() {
        let monitor: Arc<dyn Monitor> = Arc::new(Fallible(
            |_: &InboundCall, _: &Value| -> Result<(), HookError> { Err("store offline".into()) },
        ));
        let err = monitor
            .observe(&InboundCall::new(Method::POST), &json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "store offline");
    }

    #[tokio::test]
    async fn test_closure_request_transform() {
        let hook: Arc<dyn RequestTransform> = Arc::new(|req: &ProxyRequest| ProxyRequestPatch {
            endpoint: Some(format!("{}?v=2", req.endpoint)),
            ..Default::default()
        });
        let patch = hook
            .transform(&ProxyRequest::new("GET", "/a", json!({})))
            .await
            .unwrap();
        assert_eq!(patch.endpoint.as_deref(), Some("/a?v=2"));
        assert!(patch.method.is_none());
    }

    #[test]
    fn test_debug_lists_presence_only() {
        let mut hooks = GatewayHooks::default();
        hooks.auth = Some(Arc::new(|_: &InboundCall| true));
        let rendered = format!("{hooks:?}");
        assert!(rendered.contains("auth: true"));
        assert!(rendered.contains("csrf: false"));
    }
}
