//! Upstream response decoding and shaping.

use serde_json::{Value, json};

use crate::error::{GatewayError, Result};
use crate::hooks::JsonHook;

/// Decoded upstream body.
///
/// Decoding degrades from JSON to UTF-8 text to an opaque binary descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapedBody {
    Json(Value),
    Text(String),
    Binary { length: usize },
}

impl ShapedBody {
    /// Decodes raw upstream bytes. An empty body is `Text("")`.
    pub fn decode(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::Text(String::new());
        }
        if let Ok(value) = serde_json::from_slice::<Value>(bytes) {
            return Self::Json(value);
        }
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Binary {
                length: bytes.len(),
            },
        }
    }

    /// Returns true for JSON objects and arrays.
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Json(Value::Object(_) | Value::Array(_)))
    }

    /// Renders the body as the JSON value sent back to the caller.
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Binary { length } => json!({
                "message": "Unprocessable response (binary)",
                "length": length,
            }),
        }
    }
}

/// Applies the response transform to structured bodies and renders the result.
///
/// # Errors
///
/// Returns [`GatewayError::HookFailed`] if the transform fails.
pub async fn shape(body: ShapedBody, transform: Option<&dyn JsonHook>) -> Result<Value> {
    match transform {
        Some(hook) if body.is_structured() => hook
            .apply(body.into_value())
            .await
            .map_err(|err| GatewayError::hook_failed("transform_response", err)),
        _ => Ok(body.into_value()),
    }
}
