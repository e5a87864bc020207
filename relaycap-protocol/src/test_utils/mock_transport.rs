//! MockTransport: records every transport operation in order.

use crate::error::TransportError;
use crate::event::Event;
use crate::filter::Filter;
use crate::id::{EventId, SubscriptionId};
use crate::transport::{PublishAck, SubscribeOptions, Subscription, SubscriptionMessage, Transport};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};

/// A recorded transport operation.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOp {
    /// A subscription was opened.
    Subscribe {
        /// Assigned id.
        subscription: SubscriptionId,
        /// Requested filter.
        filter: Filter,
    },
    /// EOSE was delivered to a subscription.
    Eose {
        /// Receiving subscription.
        subscription: SubscriptionId,
    },
    /// An event was accepted for publishing.
    Publish {
        /// Published event.
        event_id: EventId,
    },
    /// A subscription was stopped.
    Stop {
        /// Stopped subscription.
        subscription: SubscriptionId,
    },
}

struct OpenSubscription {
    filter: Filter,
    sender: mpsc::UnboundedSender<SubscriptionMessage>,
    eose_sent: bool,
}

#[derive(Default)]
struct Behavior {
    publish_error: Option<String>,
    subscribe_error: Option<String>,
    withhold_eose: bool,
}

struct Inner {
    ops: Mutex<Vec<TransportOp>>,
    open: Mutex<HashMap<SubscriptionId, OpenSubscription>>,
    published: Mutex<Vec<Event>>,
    publish_count: watch::Sender<usize>,
    next_id: AtomicU64,
    behavior: Mutex<Behavior>,
}

impl Inner {
    fn record(&self, op: TransportOp) {
        self.ops.lock().unwrap().push(op);
    }
}

/// A transport double for tests.
///
/// Subscriptions receive EOSE immediately unless [`withhold_eose`] was
/// called. Events reach subscriptions only through [`inject`], which plays
/// the role of a provider publishing through a relay.
///
/// [`withhold_eose`]: MockTransport::withhold_eose
/// [`inject`]: MockTransport::inject
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    /// A transport that accepts everything.
    pub fn new() -> Self {
        let (publish_count, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                ops: Mutex::new(Vec::new()),
                open: Mutex::new(HashMap::new()),
                published: Mutex::new(Vec::new()),
                publish_count,
                next_id: AtomicU64::new(1),
                behavior: Mutex::new(Behavior::default()),
            }),
        }
    }

    /// Make every following publish fail with `message`.
    pub fn fail_publishes(&self, message: impl Into<String>) {
        self.inner.behavior.lock().unwrap().publish_error = Some(message.into());
    }

    /// Make every following subscribe fail with `message`.
    pub fn fail_subscriptions(&self, message: impl Into<String>) {
        self.inner.behavior.lock().unwrap().subscribe_error = Some(message.into());
    }

    /// Stop sending EOSE to new subscriptions until [`release_eose`](Self::release_eose).
    pub fn withhold_eose(&self) {
        self.inner.behavior.lock().unwrap().withhold_eose = true;
    }

    /// Send EOSE to every open subscription that has not had one.
    pub fn release_eose(&self) {
        self.inner.behavior.lock().unwrap().withhold_eose = false;
        let mut open = self.inner.open.lock().unwrap();
        for (id, sub) in open.iter_mut().filter(|(_, s)| !s.eose_sent) {
            sub.eose_sent = true;
            let _ = sub.sender.send(SubscriptionMessage::Eose);
            self.inner.record(TransportOp::Eose {
                subscription: id.clone(),
            });
        }
    }

    /// Deliver `event` to every open subscription whose filter matches.
    /// Returns how many subscriptions received it.
    pub fn inject(&self, event: Event) -> usize {
        let open = self.inner.open.lock().unwrap();
        let mut delivered = 0;
        for sub in open.values().filter(|sub| sub.filter.matches(&event)) {
            if sub
                .sender
                .send(SubscriptionMessage::Event(event.clone()))
                .is_ok()
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// End every open subscription's stream, as a relay dropping the
    /// connection would. Ended subscriptions still record `Stop` when the
    /// consumer stops them.
    pub fn end_subscriptions(&self) {
        let mut open = self.inner.open.lock().unwrap();
        for sub in open.values_mut() {
            let (closed, _) = mpsc::unbounded_channel();
            sub.sender = closed;
        }
    }

    /// All operations so far, in order.
    pub fn ops(&self) -> Vec<TransportOp> {
        self.inner.ops.lock().unwrap().clone()
    }

    /// Every event published so far.
    pub fn published(&self) -> Vec<Event> {
        self.inner.published.lock().unwrap().clone()
    }

    /// Number of subscriptions not yet stopped.
    pub fn open_subscriptions(&self) -> usize {
        self.inner.open.lock().unwrap().len()
    }

    /// Wait until at least `n` events have been published and return the
    /// `n`-th one (1-based).
    pub async fn wait_for_publish(&self, n: usize) -> Event {
        let mut count = self.inner.publish_count.subscribe();
        count
            .wait_for(|published| *published >= n)
            .await
            .expect("publish counter lives as long as the transport");
        self.published()[n - 1].clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn publish(&self, event: &Event) -> Result<PublishAck, TransportError> {
        if let Some(message) = self.inner.behavior.lock().unwrap().publish_error.clone() {
            return Err(TransportError::PublishFailed(message));
        }
        self.inner.record(TransportOp::Publish {
            event_id: event.id.clone(),
        });
        self.inner.published.lock().unwrap().push(event.clone());
        self.inner.publish_count.send_modify(|count| *count += 1);
        Ok(PublishAck {
            event_id: event.id.clone(),
            accepted_by: 1,
        })
    }

    async fn subscribe(
        &self,
        filter: Filter,
        _options: SubscribeOptions,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        let (withhold_eose, subscribe_error) = {
            let behavior = self.inner.behavior.lock().unwrap();
            (behavior.withhold_eose, behavior.subscribe_error.clone())
        };
        if let Some(message) = subscribe_error {
            return Err(TransportError::SubscribeFailed(message));
        }

        let n = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let id = SubscriptionId::new(format!("sub-{n}"));
        let (sender, receiver) = mpsc::unbounded_channel();

        self.inner.record(TransportOp::Subscribe {
            subscription: id.clone(),
            filter: filter.clone(),
        });
        let eose_sent = !withhold_eose;
        if eose_sent {
            let _ = sender.send(SubscriptionMessage::Eose);
            self.inner.record(TransportOp::Eose {
                subscription: id.clone(),
            });
        }
        self.inner.open.lock().unwrap().insert(
            id.clone(),
            OpenSubscription {
                filter,
                sender,
                eose_sent,
            },
        );

        Ok(Box::new(MockSubscription {
            id,
            receiver,
            inner: Arc::clone(&self.inner),
            stopped: false,
        }))
    }
}

struct MockSubscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<SubscriptionMessage>,
    inner: Arc<Inner>,
    stopped: bool,
}

#[async_trait]
impl Subscription for MockSubscription {
    fn id(&self) -> &SubscriptionId {
        &self.id
    }

    async fn next(&mut self) -> Option<SubscriptionMessage> {
        if self.stopped {
            return None;
        }
        self.receiver.recv().await
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.receiver.close();
        self.inner.open.lock().unwrap().remove(&self.id);
        self.inner.record(TransportOp::Stop {
            subscription: self.id.clone(),
        });
    }
}
