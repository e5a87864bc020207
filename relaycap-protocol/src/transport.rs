//! The transport seam: publish events, open filtered subscriptions.
//!
//! Relay connection management, relay selection and retries all live behind
//! [`Transport`]. The executor only relies on the contract below.

use crate::error::TransportError;
use crate::event::Event;
use crate::filter::Filter;
use crate::id::{EventId, SubscriptionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Subscription options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeOptions {
    /// Close the subscription once stored events have been delivered.
    /// Request/response correlation always wants `false`.
    pub close_on_eose: bool,
}

/// One signal from an open subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionMessage {
    /// A matching event. May be a duplicate; order is not guaranteed.
    Event(Event),
    /// Stored events have all been delivered; only live events follow.
    Eose,
}

/// Acknowledgment of a published event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishAck {
    /// The published event.
    pub event_id: EventId,
    /// How many relays accepted it. At least one on success.
    pub accepted_by: usize,
}

/// An open subscription.
///
/// Emits [`SubscriptionMessage::Event`] repeatedly and
/// [`SubscriptionMessage::Eose`] once. The stream is unbounded until
/// [`stop`](Subscription::stop) is called.
#[async_trait]
pub trait Subscription: Send {
    /// Transport-assigned id.
    fn id(&self) -> &SubscriptionId;

    /// Wait for the next message. `None` once the subscription is stopped
    /// or the transport went away.
    async fn next(&mut self) -> Option<SubscriptionMessage>;

    /// Close the subscription. Idempotent.
    fn stop(&mut self);
}

/// Protocol seam for the event transport.
///
/// Implementations:
/// - a relay pool client (websocket connections to public relays)
/// - `MockTransport` (`test-utils` feature): in-process, records operations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish a signed event. Fails if no relay accepts it.
    async fn publish(&self, event: &Event) -> Result<PublishAck, TransportError>;

    /// Open a subscription for events matching `filter`.
    async fn subscribe(
        &self,
        filter: Filter,
        options: SubscribeOptions,
    ) -> Result<Box<dyn Subscription>, TransportError>;
}
