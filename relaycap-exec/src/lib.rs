#![deny(missing_docs)]
//! Capability execution over an event relay.
//!
//! [`Executor`] turns a [`CapabilityCall`](relaycap_protocol::CapabilityCall)
//! into a signed request event, subscribes to events that reference it,
//! publishes once the subscription has delivered EOSE, and resolves with the
//! provider's response. Along the way it keeps one observable
//! [`ExecutionState`](relaycap_protocol::ExecutionState) per capability
//! identity up to date, including the payment sub-protocol
//! (`payment-required` / `payment-accepted` notifications).
//!
//! Every call ends exactly once: with a result, a provider error, a
//! timeout, a transport failure or a cancellation. Its subscription is
//! stopped on every one of those paths.

pub mod config;
mod correlator;
pub mod error;
mod executor;
pub mod payment;
pub mod request;

pub use config::ExecutorConfig;
pub use correlator::extract_result;
pub use error::ExecutionError;
pub use executor::Executor;
pub use payment::{Notification, PaymentNotificationError};
pub use request::{
    RequestBuilder, SignerSlot, normalize_arguments, populate_uri_template, resource_from_template,
};
