//! The payment sub-protocol as a UI observes it through the state cell.

use relaycap_exec::Executor;
use relaycap_protocol::test_utils::{MockTransport, notification, payment_required, response};
use relaycap_protocol::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn payment_required_then_accepted_then_result() {
    let transport = MockTransport::new();
    let executor = Arc::new(Executor::new(Arc::new(transport.clone())));
    let identity = CapabilityIdentity::tool("paid-search");

    let task = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            executor
                .execute_tool(
                    &ToolSpec::new("paid-search"),
                    serde_json::Map::new(),
                    &Target::new("P"),
                )
                .await
        })
    };
    let request = transport.wait_for_publish(1).await;
    let mut states = executor.state(&identity).await.subscribe();

    let required = payment_required(&request.id, "100", "lnbc100n1");
    transport.inject(required.clone());
    let state = states
        .wait_for(|s| s.status == ExecutionStatus::PaymentRequired)
        .await
        .unwrap()
        .clone();
    assert_eq!(
        state.payment_info,
        Some(PaymentInfo {
            amount: "100".into(),
            unit: "sats".into(),
            invoice: "lnbc100n1".into(),
            event_id: required.id.clone(),
            pubkey: PublicKey::new("provider-pubkey"),
        })
    );
    assert!(!task.is_finished());

    // A duplicate replaces the info wholesale.
    transport.inject(payment_required(&request.id, "120", "lnbc120n1"));
    let state = states
        .wait_for(|s| s.payment_info.as_ref().is_some_and(|p| p.amount == "120"))
        .await
        .unwrap()
        .clone();
    assert_eq!(state.payment_info.unwrap().invoice, "lnbc120n1");

    transport.inject(notification(&request.id, "payment-accepted", vec![], ""));
    let state = states
        .wait_for(|s| s.status == ExecutionStatus::Loading)
        .await
        .unwrap()
        .clone();
    assert!(state.payment_info.is_none());
    assert_eq!(executor.in_flight(), vec![request.id.clone()]);

    transport.inject(response(
        &request.id,
        json!({"content": [{"type": "text", "text": "found"}]}),
    ));
    let result = task.await.unwrap().unwrap();
    assert_eq!(result, json!([{"type": "text", "text": "found"}]));
    assert_eq!(executor.state(&identity).await.snapshot().status, ExecutionStatus::Success);
    assert_eq!(transport.open_subscriptions(), 0);
}

#[tokio::test]
async fn malformed_payment_notification_is_not_fatal() {
    let transport = MockTransport::new();
    let executor = Arc::new(Executor::new(Arc::new(transport.clone())));
    let identity = CapabilityIdentity::tool("paid");

    let task = {
        let executor = Arc::clone(&executor);
        tokio::spawn(async move {
            executor
                .execute_tool(&ToolSpec::new("paid"), serde_json::Map::new(), &Target::new("P"))
                .await
        })
    };
    let request = transport.wait_for_publish(1).await;

    // No invoice tag.
    transport.inject(notification(
        &request.id,
        "payment-required",
        vec![Tag::new(["amount", "10"]), Tag::new(["p", "provider-pubkey"])],
        "",
    ));
    transport.inject(notification(&request.id, "processing", vec![], "working"));
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(!task.is_finished());
    let state = executor.state(&identity).await.snapshot();
    assert_eq!(state.status, ExecutionStatus::Loading);
    assert!(state.payment_info.is_none());

    transport.inject(response(&request.id, json!({"content": ["done"]})));
    assert_eq!(task.await.unwrap().unwrap(), json!(["done"]));
}
