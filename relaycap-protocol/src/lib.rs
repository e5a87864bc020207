//! # relaycap-protocol: wire types and seams for capability execution
//!
//! Providers on a public event-relay network announce tools, resources and
//! prompts. Clients invoke them by publishing a signed request event and
//! waiting for a correlated response event. This crate defines everything
//! the execution layer needs to talk about that exchange, without choosing
//! a relay client or a key store.
//!
//! ## The Seams
//!
//! | Seam | Trait | What it does |
//! |------|-------|-------------|
//! | Transport | [`Transport`], [`Subscription`] | Publish events, open filtered subscriptions |
//! | Signing | [`Signer`] | Turn an [`UnsignedEvent`] into a content-addressed [`Event`] |
//!
//! ## The Data Model
//!
//! | Type | What it is |
//! |------|-----------|
//! | [`CapabilityCall`] | One `tools/call`, `resources/read` or `prompts/get` request body |
//! | [`CapabilityIdentity`] | `(type, name)` key for observable execution state |
//! | [`ExecutionState`] | What a UI shows for one capability |
//! | [`PaymentInfo`] | Invoice details from a `payment-required` notification |
//!
//! Both traits use `async-trait` so they stay object safe; the executor
//! holds them as `Arc<dyn Transport>` and `Arc<dyn Signer>`.

#![deny(missing_docs)]

pub mod capability;
pub mod duration;
pub mod error;
pub mod event;
pub mod execution;
pub mod filter;
pub mod id;
pub mod signer;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use capability::{
    CallToolParams, CapabilityCall, CapabilityIdentity, CapabilityMethod, CapabilityType,
    GetPromptParams, PromptSpec, ReadResourceParams, ResourceSpec, Target, ToolSpec,
};
pub use duration::DurationMs;
pub use error::{RequestError, SignerError, TransportError};
pub use event::{Event, Kind, Tag, UnsignedEvent};
pub use execution::{ExecutionState, ExecutionStatus, PaymentInfo};
pub use filter::Filter;
pub use id::{EventId, ExecutionId, PublicKey, SubscriptionId};
pub use signer::Signer;
pub use transport::{PublishAck, SubscribeOptions, Subscription, SubscriptionMessage, Transport};
