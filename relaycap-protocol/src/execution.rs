//! Observable execution state for one capability identity.
//!
//! The transition methods on [`ExecutionState`] are the only way the
//! executor changes a state, and each one keeps the field invariants:
//! `result` only in `success`, `error` only in `error`, `payment_info`
//! only in `payment-required`.

use crate::capability::{CapabilityIdentity, CapabilityType};
use crate::id::{EventId, ExecutionId, PublicKey};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a capability's most recent execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionStatus {
    /// Nothing running, nothing to show.
    #[default]
    Idle,
    /// Request in flight.
    Loading,
    /// Last execution produced a result.
    Success,
    /// Last execution failed.
    Error,
    /// The provider wants to be paid before it responds.
    PaymentRequired,
}

/// Invoice details carried by a `payment-required` notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    /// Amount as sent by the provider.
    pub amount: String,
    /// Unit of `amount`.
    pub unit: String,
    /// Payment request to settle.
    pub invoice: String,
    /// Id of the `payment-required` notification itself, not of the request.
    pub event_id: EventId,
    /// Counterparty public key.
    pub pubkey: PublicKey,
}

/// What a UI shows for one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    /// Current status.
    pub status: ExecutionStatus,
    /// Result payload, present only on success.
    pub result: Option<serde_json::Value>,
    /// Error message, present only on error.
    pub error: Option<String>,
    /// Tool/prompt name or resource URI.
    pub capability_name: String,
    /// Tool, resource or prompt.
    pub capability_type: CapabilityType,
    /// Present only while payment is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<PaymentInfo>,
    /// The execution currently allowed to write this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<ExecutionId>,
}

impl ExecutionState {
    /// A fresh, idle state.
    pub fn idle(identity: &CapabilityIdentity) -> Self {
        Self {
            status: ExecutionStatus::Idle,
            result: None,
            error: None,
            capability_name: identity.name.clone(),
            capability_type: identity.capability_type,
            payment_info: None,
            execution_id: None,
        }
    }

    /// The identity this state belongs to.
    pub fn identity(&self) -> CapabilityIdentity {
        CapabilityIdentity::new(self.capability_type, self.capability_name.clone())
    }

    /// Whether `id` is the execution that owns this state.
    pub fn is_owned_by(&self, id: &ExecutionId) -> bool {
        self.execution_id.as_ref() == Some(id)
    }

    /// Enter `loading`. When `owner` is given the execution takes ownership.
    pub fn begin(&mut self, owner: Option<ExecutionId>) {
        self.status = ExecutionStatus::Loading;
        self.result = None;
        self.error = None;
        self.payment_info = None;
        if owner.is_some() {
            self.execution_id = owner;
        }
    }

    /// Enter `success` with `result`.
    pub fn succeed(&mut self, result: serde_json::Value) {
        self.status = ExecutionStatus::Success;
        self.result = Some(result);
        self.error = None;
        self.payment_info = None;
    }

    /// Enter `error` with `message`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = ExecutionStatus::Error;
        self.result = None;
        self.error = Some(message.into());
        self.payment_info = None;
    }

    /// Enter `payment-required`, replacing any previous payment info.
    pub fn require_payment(&mut self, info: PaymentInfo) {
        self.status = ExecutionStatus::PaymentRequired;
        self.result = None;
        self.error = None;
        self.payment_info = Some(info);
    }

    /// Payment went through; back to `loading`.
    pub fn accept_payment(&mut self) {
        self.status = ExecutionStatus::Loading;
        self.payment_info = None;
    }

    /// Back to `idle`. The owner stays, so a late result still lands.
    pub fn reset(&mut self) {
        self.status = ExecutionStatus::Idle;
        self.result = None;
        self.error = None;
        self.payment_info = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> PaymentInfo {
        PaymentInfo {
            amount: "100".into(),
            unit: "sats".into(),
            invoice: "lnbc1".into(),
            event_id: EventId::new("n1"),
            pubkey: PublicKey::new("pk"),
        }
    }

    #[test]
    fn idle_state_wire_shape() {
        let state = ExecutionState::idle(&CapabilityIdentity::tool("add"));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "status": "idle",
                "result": null,
                "error": null,
                "capabilityName": "add",
                "capabilityType": "tool"
            })
        );
    }

    #[test]
    fn payment_required_serializes_kebab_case() {
        let mut state = ExecutionState::idle(&CapabilityIdentity::tool("add"));
        state.require_payment(info());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "payment-required");
        assert_eq!(json["paymentInfo"]["eventId"], "n1");
    }

    #[test]
    fn transitions_keep_field_invariants() {
        let mut state = ExecutionState::idle(&CapabilityIdentity::prompt("p"));
        state.begin(Some(EventId::new("x")));
        state.require_payment(info());
        state.accept_payment();
        assert_eq!(state.status, ExecutionStatus::Loading);
        assert!(state.payment_info.is_none());

        state.succeed(json!([1]));
        assert_eq!(state.result, Some(json!([1])));
        assert!(state.error.is_none());

        state.fail("boom");
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));

        state.reset();
        assert_eq!(state.status, ExecutionStatus::Idle);
        assert!(state.error.is_none());
        assert!(state.is_owned_by(&EventId::new("x")));
    }

    #[test]
    fn begin_without_owner_keeps_previous_owner() {
        let mut state = ExecutionState::idle(&CapabilityIdentity::tool("t"));
        state.begin(Some(EventId::new("a")));
        state.begin(None);
        assert!(state.is_owned_by(&EventId::new("a")));
    }
}
