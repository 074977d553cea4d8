//! Outbound request resolution.
//!
//! Turns the raw [`ProxyRequest`] from the inbound body into the final outbound
//! description: request transform hook, validation, base URL resolution, then
//! payload sanitizing and masking.

use crate::error::{GatewayError, Result};
use crate::hooks::GatewayHooks;
use crate::types::ProxyRequest;

/// Resolves the outbound call description.
///
/// # Errors
///
/// - [`GatewayError::MissingMethodOrEndpoint`] if either field is blank after the transform
/// - [`GatewayError::RelativeEndpointWithoutBaseUrl`] for a relative endpoint and no base URL
/// - [`GatewayError::HookFailed`] if the transform, sanitize or mask hook fails
pub async fn resolve(
    raw: ProxyRequest,
    base_url: Option<&str>,
    hooks: &GatewayHooks,
) -> Result<ProxyRequest> {
    let request = match &hooks.transform_request {
        Some(hook) => {
            let patch = hook
                .transform(&raw)
                .await
                .map_err(|err| GatewayError::hook_failed("transform_request", err))?;
            patch.apply(raw)
        }
        None => raw,
    };

    let method = request.method.trim();
    let endpoint = request.endpoint.trim();
    if method.is_empty() || endpoint.is_empty() {
        return Err(GatewayError::MissingMethodOrEndpoint);
    }

    let endpoint = if is_absolute_url(endpoint) {
        endpoint.to_string()
    } else {
        match base_url.map(str::trim).filter(|base| !base.is_empty()) {
            Some(base) => join_base_url(base, endpoint),
            None => {
                return Err(GatewayError::RelativeEndpointWithoutBaseUrl(
                    endpoint.to_string(),
                ));
            }
        }
    };

    let mut data = request.data;
    if let Some(sanitize) = &hooks.sanitize {
        data = sanitize
            .apply(data)
            .await
            .map_err(|err| GatewayError::hook_failed("sanitize", err))?;
    }
    if let Some(mask) = &hooks.mask_sensitive_data {
        data = mask
            .apply(data)
            .await
            .map_err(|err| GatewayError::hook_failed("mask_sensitive_data", err))?;
    }

    Ok(ProxyRequest {
        method: method.to_string(),
        endpoint,
        data,
    })
}

/// Returns true if `endpoint` starts with a URL scheme followed by `://`.
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`.
pub fn is_absolute_url(endpoint: &str) -> bool {
    let Some((scheme, _)) = endpoint.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Joins a base URL and a relative path with exactly one `/` between them.
///
/// ```
/// use relaygate_core::transform::join_base_url;
///
/// assert_eq!(join_base_url("https://api.test/", "/todos/1"), "https://api.test/todos/1");
/// assert_eq!(join_base_url("https://api.test", "todos/1"), "https://api.test/todos/1");
/// ```
pub fn join_base_url(base: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}
