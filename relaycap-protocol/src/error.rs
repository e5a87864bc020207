//! Error types for the transport and signing seams and for request parsing.

use thiserror::Error;

/// Transport errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// No relay accepted the event.
    #[error("publish failed: {0}")]
    PublishFailed(String),

    /// The subscription could not be opened.
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    /// The transport has been shut down.
    #[error("transport closed")]
    Closed,

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Signing errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SignerError {
    /// The configured key material is unusable.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The signature could not be produced.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A request body that cannot become a [`CapabilityCall`](crate::CapabilityCall).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RequestError {
    /// The body has no `method` field.
    #[error("request has no method")]
    MissingMethod,

    /// The method is not one of `tools/call`, `resources/read`, `prompts/get`.
    #[error("unknown request method: {0}")]
    UnknownMethod(String),

    /// The method is known but its params do not fit.
    #[error("invalid params for {method}: {message}")]
    InvalidParams {
        /// The request method.
        method: String,
        /// What was wrong with the params.
        message: String,
    },

    /// The call could not be serialized into an event body.
    #[error("request encoding failed: {0}")]
    Encode(String),
}
