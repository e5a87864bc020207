//! Acceptance tests for the protocol crate.
//!
//! Tests cover:
//! - Trait object safety (Box<dyn Trait> is Send + Sync)
//! - Wire shapes of request bodies and execution state

use relaycap_protocol::*;
use serde_json::json;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Object Safety
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn _assert_send_sync<T: Send + Sync>() {}
fn _assert_send<T: Send>() {}

#[test]
fn transport_is_object_safe_send_sync() {
    _assert_send_sync::<Box<dyn Transport>>();
    _assert_send_sync::<std::sync::Arc<dyn Transport>>();
}

#[test]
fn signer_is_object_safe_send_sync() {
    _assert_send_sync::<Box<dyn Signer>>();
    _assert_send_sync::<std::sync::Arc<dyn Signer>>();
}

#[test]
fn subscription_is_object_safe_send() {
    _assert_send::<Box<dyn Subscription>>();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[test]
fn resource_call_wire_shape() {
    let call = CapabilityCall::resource("file:///a");
    assert_eq!(
        serde_json::to_value(&call).unwrap(),
        json!({"method": "resources/read", "params": {"uri": "file:///a"}})
    );
}

#[test]
fn prompt_call_roundtrips_through_from_value() {
    let mut args = std::collections::BTreeMap::new();
    args.insert("who".to_string(), "world".to_string());
    let call = CapabilityCall::prompt("greet", args);
    let body = serde_json::to_value(&call).unwrap();
    assert_eq!(CapabilityCall::from_value(body).unwrap(), call);
}

#[test]
fn target_omits_missing_server() {
    let target = Target::new("pk");
    assert_eq!(serde_json::to_value(&target).unwrap(), json!({"provider": "pk"}));
    let target = target.with_server("srv");
    assert_eq!(target.server_id.as_deref(), Some("srv"));
}

#[test]
fn duration_ms_is_plain_integer() {
    let d: DurationMs = serde_json::from_str("1500").unwrap();
    assert_eq!(d.to_std(), std::time::Duration::from_millis(1500));
    assert_eq!(d.to_string(), "1500ms");
}

#[test]
fn typed_ids_convert() {
    let id = EventId::from("abc");
    assert_eq!(id.as_str(), "abc");
    let pk: PublicKey = String::from("pk").into();
    assert_eq!(pk.to_string(), "pk");
}
