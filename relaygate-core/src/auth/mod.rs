//! Built-in call guards.
//!
//! - [`ApiKeyGuard`]: auth hook accepting calls whose `x-api-key` matches a configured key
//! - [`RequestedWithGuard`]: CSRF hook requiring an `X-Requested-With` header
//!
//! Both implement [`CallGuard`] and plug into
//! [`GatewayHooks::auth`](crate::GatewayHooks::auth) and
//! [`GatewayHooks::csrf`](crate::GatewayHooks::csrf).

pub mod constant_time;

use async_trait::async_trait;

use crate::headers;
use crate::hooks::CallGuard;
use crate::types::InboundCall;
use constant_time::constant_time_eq;

/// Stores accepted API keys.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    keys: Vec<String>,
}

impl ApiKeys {
    /// Creates a new empty key store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from individual keys; blank keys are dropped.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .map(|k: String| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Parses a comma-separated list of keys.
    pub fn parse(value: &str) -> Self {
        Self::from_keys(value.split(','))
    }

    /// Returns true if no keys are stored.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Checks a presented key against every stored key.
    /// Every entry is compared so the match position does not leak.
    pub fn verify(&self, presented: &str) -> bool {
        let mut found = false;
        for key in &self.keys {
            if constant_time_eq(key.as_bytes(), presented.as_bytes()) {
                found = true;
            }
        }
        found
    }
}

/// Auth guard over the `x-api-key` header.
#[derive(Debug, Clone)]
pub struct ApiKeyGuard {
    keys: ApiKeys,
}

impl ApiKeyGuard {
    pub fn new(keys: ApiKeys) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl CallGuard for ApiKeyGuard {
    async fn check(&self, call: &InboundCall) -> bool {
        call.header(headers::X_API_KEY)
            .is_some_and(|key| self.keys.verify(key.trim()))
    }
}

/// CSRF guard requiring a non-empty `X-Requested-With` header.
///
/// Browsers do not add the header to cross-site form posts, so its presence
/// marks a script-issued call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestedWithGuard;

#[async_trait]
impl CallGuard for RequestedWithGuard {
    async fn check(&self, call: &InboundCall) -> bool {
        call.header(headers::X_REQUESTED_WITH)
            .is_some_and(|value| !value.trim().is_empty())
    }
}
