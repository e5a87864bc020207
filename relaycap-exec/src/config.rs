//! Configuration types for the executor.

use relaycap_protocol::{DurationMs, Kind};
use serde::{Deserialize, Serialize};

/// Configuration for an [`Executor`](crate::Executor).
///
/// Missing fields take their default when deserializing, so a host can
/// override just the timeout from its own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// How long a call waits for a terminal event before it fails.
    pub timeout: DurationMs,
    /// Kind of published request events.
    pub request_kind: Kind,
    /// Kind of response events.
    pub response_kind: Kind,
    /// Kind of status notifications.
    pub notification_kind: Kind,
    /// Unit used when a `payment-required` amount tag omits one.
    pub default_payment_unit: String,
    /// Whether `execute_tool` consults and fills the execution cache.
    /// Has no effect unless a cache is attached.
    pub cache_results: bool,
}

impl ExecutorConfig {
    /// Set the call timeout.
    pub fn with_timeout(mut self, timeout: impl Into<DurationMs>) -> Self {
        self.timeout = timeout.into();
        self
    }

    /// Set the request, response and notification kinds.
    pub fn with_kinds(mut self, request: Kind, response: Kind, notification: Kind) -> Self {
        self.request_kind = request;
        self.response_kind = response;
        self.notification_kind = notification;
        self
    }

    /// Set the fallback payment unit.
    pub fn with_default_payment_unit(mut self, unit: impl Into<String>) -> Self {
        self.default_payment_unit = unit.into();
        self
    }

    /// Turn result caching for tool calls on or off.
    pub fn with_cache_results(mut self, enabled: bool) -> Self {
        self.cache_results = enabled;
        self
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: DurationMs::from_mins(5),
            request_kind: Kind::REQUEST,
            response_kind: Kind::RESPONSE,
            notification_kind: Kind::NOTIFICATION,
            default_payment_unit: "sats".into(),
            cache_results: false,
        }
    }
}
