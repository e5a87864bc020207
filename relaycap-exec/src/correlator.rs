//! Request/response correlation for one execution.
//!
//! Order of operations: subscribe, wait for EOSE, publish, then wait for a
//! terminal event. The timer and the cancellation tokens are raced against
//! every suspension point, and the subscription is stopped on every exit,
//! including when the future is dropped.

use crate::config::ExecutorConfig;
use crate::error::ExecutionError;
use crate::payment::{self, Notification};
use relaycap_protocol::{
    CapabilityIdentity, Event, ExecutionId, Filter, SubscribeOptions, Subscription,
    SubscriptionMessage, Transport,
};
use relaycap_state_memory::StateCell;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Executions currently waiting for a terminal event.
#[derive(Default)]
pub(crate) struct PendingRegistry {
    pending: Mutex<HashMap<ExecutionId, Pending>>,
}

struct Pending {
    identity: CapabilityIdentity,
    cancel: CancellationToken,
}

impl PendingRegistry {
    fn lock(&self) -> MutexGuard<'_, HashMap<ExecutionId, Pending>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an execution; it stays registered until the guard drops.
    pub(crate) fn register(
        &self,
        id: ExecutionId,
        identity: CapabilityIdentity,
    ) -> PendingGuard<'_> {
        let cancel = CancellationToken::new();
        self.lock().insert(
            id.clone(),
            Pending {
                identity,
                cancel: cancel.clone(),
            },
        );
        PendingGuard {
            registry: self,
            id,
            cancel,
        }
    }

    pub(crate) fn cancel(&self, id: &ExecutionId) -> bool {
        match self.lock().get(id) {
            Some(pending) => {
                tracing::debug!(
                    execution_id = %id,
                    capability = %pending.identity,
                    "cancelling execution"
                );
                pending.cancel.cancel();
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_all(&self) -> usize {
        let pending = self.lock();
        for entry in pending.values() {
            entry.cancel.cancel();
        }
        pending.len()
    }

    pub(crate) fn ids(&self) -> Vec<ExecutionId> {
        let mut ids: Vec<_> = self.lock().keys().cloned().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }
}

/// Deregisters its execution on drop.
pub(crate) struct PendingGuard<'a> {
    registry: &'a PendingRegistry,
    id: ExecutionId,
    cancel: CancellationToken,
}

impl PendingGuard<'_> {
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

/// Stops the subscription on drop.
struct SubscriptionGuard(Box<dyn Subscription>);

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        tracing::debug!(subscription = %self.0.id(), "stopping response subscription");
        self.0.stop();
    }
}

/// One execution's correlation state.
pub(crate) struct Correlation<'a> {
    pub(crate) transport: &'a dyn Transport,
    pub(crate) config: &'a ExecutorConfig,
    pub(crate) cell: &'a StateCell,
    /// Cancelled by [`Executor::cancel`](crate::Executor::cancel) or shutdown.
    pub(crate) registry_cancel: &'a CancellationToken,
    /// Cancelled by the caller.
    pub(crate) caller_cancel: &'a CancellationToken,
}

impl Correlation<'_> {
    /// Run the exchange for the signed `request` to completion.
    pub(crate) async fn run(&self, request: &Event) -> Result<Value, ExecutionError> {
        let execution_id = &request.id;
        let filter = Filter::new()
            .kinds([self.config.response_kind, self.config.notification_kind])
            .referencing(execution_id.clone());
        tracing::debug!(
            execution_id = %execution_id,
            filter = ?filter,
            "opening response subscription"
        );

        let subscription = self
            .transport
            .subscribe(filter, SubscribeOptions { close_on_eose: false })
            .await
            .map_err(ExecutionError::Subscribe)?;
        let mut subscription = SubscriptionGuard(subscription);

        let deadline = tokio::time::sleep(self.config.timeout.to_std());
        tokio::pin!(deadline);
        let mut published = false;

        loop {
            let message = tokio::select! {
                biased;
                _ = self.registry_cancel.cancelled() => return Err(ExecutionError::Cancelled),
                _ = self.caller_cancel.cancelled() => return Err(ExecutionError::Cancelled),
                _ = &mut deadline => return Err(self.timed_out(execution_id)),
                message = subscription.0.next() => message,
            };

            match message {
                None => return Err(ExecutionError::SubscriptionClosed),
                Some(SubscriptionMessage::Eose) if published => {
                    tracing::debug!(execution_id = %execution_id, "ignoring repeated EOSE");
                }
                Some(SubscriptionMessage::Eose) => {
                    tracing::debug!(
                        execution_id = %execution_id,
                        "subscription ready, publishing request"
                    );
                    let ack = tokio::select! {
                        biased;
                        _ = self.registry_cancel.cancelled() => {
                            return Err(ExecutionError::Cancelled);
                        }
                        _ = self.caller_cancel.cancelled() => return Err(ExecutionError::Cancelled),
                        _ = &mut deadline => return Err(self.timed_out(execution_id)),
                        ack = self.transport.publish(request) => {
                            ack.map_err(ExecutionError::Publish)?
                        }
                    };
                    tracing::debug!(
                        execution_id = %execution_id,
                        accepted_by = ack.accepted_by,
                        "request published"
                    );
                    published = true;
                }
                Some(SubscriptionMessage::Event(event)) => {
                    if let Some(outcome) = self.handle(execution_id, &event) {
                        return outcome;
                    }
                }
            }
        }
    }

    /// `Some` when `event` ends the execution.
    fn handle(
        &self,
        execution_id: &ExecutionId,
        event: &Event,
    ) -> Option<Result<Value, ExecutionError>> {
        if !event.references(execution_id) {
            tracing::debug!(
                execution_id = %execution_id,
                event_id = %event.id,
                "ignoring uncorrelated event"
            );
            return None;
        }
        tracing::debug!(
            execution_id = %execution_id,
            event_id = %event.id,
            kind = %event.kind,
            "received event"
        );

        if event.kind == self.config.response_kind {
            return Some(extract_result(&event.content));
        }
        if event.kind != self.config.notification_kind {
            return None;
        }
        match payment::interpret(event, &self.config.default_payment_unit) {
            Notification::Error(message) => Some(Err(ExecutionError::Provider(message))),
            notification => {
                payment::apply(self.cell, execution_id, &notification);
                None
            }
        }
    }

    fn timed_out(&self, execution_id: &ExecutionId) -> ExecutionError {
        tracing::warn!(
            execution_id = %execution_id,
            capability = %self.cell.identity(),
            timeout = %self.config.timeout,
            "capability execution timed out"
        );
        ExecutionError::Timeout(self.config.timeout)
    }
}

/// The result carried by a response body: the first of `content`,
/// `contents` or `messages` that is present and not null, else the body.
pub fn extract_result(body: &str) -> Result<Value, ExecutionError> {
    let parsed: Value = serde_json::from_str(body).map_err(ExecutionError::MalformedResponse)?;
    let field = ["content", "contents", "messages"]
        .into_iter()
        .find_map(|name| parsed.get(name).filter(|value| !value.is_null()).cloned());
    Ok(field.unwrap_or(parsed))
}
