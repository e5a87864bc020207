//! Notification handling: provider errors and the payment sub-protocol.
//!
//! A notification carries its meaning in a `status` tag. Only `error` ends
//! a call; `payment-required` and `payment-accepted` move the identity's
//! state while the call stays open, and anything else is ignored.

use relaycap_protocol::event::tag;
use relaycap_protocol::{Event, ExecutionId, ExecutionState, PaymentInfo, PublicKey};
use relaycap_state_memory::StateCell;
use thiserror::Error;

/// Values of the `status` tag.
pub mod status {
    /// The provider failed the call; content is the message.
    pub const ERROR: &str = "error";
    /// The provider wants an invoice paid before responding.
    pub const PAYMENT_REQUIRED: &str = "payment-required";
    /// The invoice was paid; the response follows.
    pub const PAYMENT_ACCEPTED: &str = "payment-accepted";
}

/// What a notification means for its call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Terminal failure with the provider's message.
    Error(String),
    /// Payment requested.
    PaymentRequired(PaymentInfo),
    /// Payment settled.
    PaymentAccepted,
    /// Unknown status, no status, or an incomplete payment request.
    Ignored,
}

/// A `payment-required` notification that cannot be acted on.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentNotificationError {
    /// A required tag is absent.
    #[error("payment-required notification is missing the `{0}` tag")]
    MissingTag(&'static str),
}

/// Classify a notification event.
///
/// Incomplete `payment-required` notifications are logged and ignored.
pub fn interpret(event: &Event, default_unit: &str) -> Notification {
    match event.tag_value(tag::STATUS) {
        Some(status::ERROR) => Notification::Error(event.content.clone()),
        Some(status::PAYMENT_REQUIRED) => match payment_info(event, default_unit) {
            Ok(info) => Notification::PaymentRequired(info),
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "ignoring payment notification");
                Notification::Ignored
            }
        },
        Some(status::PAYMENT_ACCEPTED) => Notification::PaymentAccepted,
        other => {
            tracing::debug!(event_id = %event.id, status = ?other, "ignoring notification");
            Notification::Ignored
        }
    }
}

/// Extract [`PaymentInfo`] from a `payment-required` notification.
///
/// Needs `amount`, `invoice`, `e` and `p` tags. The unit is the third
/// element of the amount tag, or `default_unit`. The info is keyed by the
/// notification's own id.
pub fn payment_info(
    event: &Event,
    default_unit: &str,
) -> Result<PaymentInfo, PaymentNotificationError> {
    let amount = event
        .find_tag(tag::AMOUNT)
        .ok_or(PaymentNotificationError::MissingTag(tag::AMOUNT))?;
    let invoice = required(event, tag::INVOICE)?;
    required(event, tag::EVENT)?;
    let pubkey = required(event, tag::PUBKEY)?;

    Ok(PaymentInfo {
        amount: amount
            .value()
            .ok_or(PaymentNotificationError::MissingTag(tag::AMOUNT))?
            .to_owned(),
        unit: amount.get(2).unwrap_or(default_unit).to_owned(),
        invoice: invoice.to_owned(),
        event_id: event.id.clone(),
        pubkey: PublicKey::new(pubkey),
    })
}

fn required<'a>(
    event: &'a Event,
    name: &'static str,
) -> Result<&'a str, PaymentNotificationError> {
    event
        .tag_value(name)
        .ok_or(PaymentNotificationError::MissingTag(name))
}

/// Apply a non-terminal notification to `cell` on behalf of `execution`.
///
/// Returns `false` when the cell belongs to a newer execution and the
/// update was dropped.
pub fn apply(cell: &StateCell, execution: &ExecutionId, notification: &Notification) -> bool {
    let applied = match notification {
        Notification::PaymentRequired(info) => {
            cell.update_owned(execution, |state| state.require_payment(info.clone()))
        }
        Notification::PaymentAccepted => {
            cell.update_owned(execution, ExecutionState::accept_payment)
        }
        Notification::Error(_) | Notification::Ignored => return true,
    };
    if !applied {
        tracing::warn!(
            execution_id = %execution,
            capability = %cell.identity(),
            "dropping payment update from superseded execution"
        );
    }
    applied
}
