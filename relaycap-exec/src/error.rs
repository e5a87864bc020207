//! Error type for capability executions.

use relaycap_protocol::{DurationMs, RequestError, SignerError, TransportError};
use thiserror::Error;

/// Why a capability execution did not produce a result.
///
/// The `Display` form is what lands in the identity's
/// [`ExecutionState::error`](relaycap_protocol::ExecutionState::error).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The request body is not a valid capability call.
    #[error("invalid request: {0}")]
    Request(#[from] RequestError),

    /// The request could not be signed.
    #[error("signing failed: {0}")]
    Signing(#[from] SignerError),

    /// The response subscription could not be opened.
    #[error("subscription failed: {0}")]
    Subscribe(#[source] TransportError),

    /// No relay accepted the request.
    #[error("publish failed: {0}")]
    Publish(#[source] TransportError),

    /// No terminal event arrived in time.
    #[error("capability execution timed out after {0}")]
    Timeout(DurationMs),

    /// The response body is not JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    /// The provider sent an `error` notification; this is its message.
    #[error("{0}")]
    Provider(String),

    /// The transport ended the subscription before a terminal event.
    #[error("subscription closed before a response arrived")]
    SubscriptionClosed,

    /// The call was cancelled by its caller or by executor shutdown.
    #[error("capability execution cancelled")]
    Cancelled,
}
