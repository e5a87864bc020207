//! Composition: swapping implementations behind the seams.
//!
//! 1. **Transport swap**: an in-process provider behind the `Transport` trait
//! 2. **Signer swap**: a wrapping signer behind the `Signer` trait
//! 3. **Shared state**: two executors, one observable state store
//! 4. **Shared cache**: a result cached by one executor serves another
//!
//! Nothing here needs a relay.

use async_trait::async_trait;
use relaycap_cache::ExecutionCache;
use relaycap_exec::{Executor, ExecutorConfig};
use relaycap_protocol::test_utils::{MockTransport, response};
use relaycap_protocol::*;
use relaycap_signer::KeySigner;
use relaycap_state_memory::ExecutionStateStore;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A provider living inside the transport: every published `tools/call`
/// is answered with the sum of its numeric arguments.
#[derive(Clone, Default)]
struct AddingProvider {
    relay: MockTransport,
}

#[async_trait]
impl Transport for AddingProvider {
    async fn publish(&self, event: &Event) -> Result<PublishAck, TransportError> {
        let ack = self.relay.publish(event).await?;
        let call = CapabilityCall::from_value(
            serde_json::from_str(&event.content).map_err(|e| TransportError::Other(Box::new(e)))?,
        )
        .map_err(|e| TransportError::Other(Box::new(e)))?;
        let sum: f64 = match &call {
            CapabilityCall::CallTool(params) => {
                params.arguments.values().filter_map(Value::as_f64).sum()
            }
            _ => 0.0,
        };
        self.relay.inject(response(
            &event.id,
            json!({"content": [{"type": "text", "text": sum.to_string()}]}),
        ));
        Ok(ack)
    }

    async fn subscribe(
        &self,
        filter: Filter,
        options: SubscribeOptions,
    ) -> Result<Box<dyn Subscription>, TransportError> {
        self.relay.subscribe(filter, options).await
    }
}

/// Counts signatures on the way through.
struct CountingSigner {
    inner: KeySigner,
    signed: AtomicUsize,
}

#[async_trait]
impl Signer for CountingSigner {
    async fn public_key(&self) -> Result<PublicKey, SignerError> {
        self.inner.public_key().await
    }

    async fn sign(&self, unsigned: UnsignedEvent) -> Result<Event, SignerError> {
        self.signed.fetch_add(1, Ordering::SeqCst);
        self.inner.sign(unsigned).await
    }
}

fn add_args(a: i64, b: i64) -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("a".into(), json!(a));
    args.insert("b".into(), json!(b));
    args
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 1. Transport swap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn in_process_provider_answers_calls() {
    let provider = AddingProvider::default();
    let executor = Executor::new(Arc::new(provider.clone()));

    let result = executor
        .execute_tool(&ToolSpec::new("add"), add_args(1, 2), &Target::new("P"))
        .await
        .unwrap();

    assert_eq!(result, json!([{"type": "text", "text": "3"}]));
    assert_eq!(provider.relay.open_subscriptions(), 0);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 2. Signer swap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn custom_signer_signs_every_request() {
    let provider = AddingProvider::default();
    let signer = Arc::new(CountingSigner {
        inner: KeySigner::generate(),
        signed: AtomicUsize::new(0),
    });
    let executor = Executor::new(Arc::new(provider.clone()))
        .with_signer(Arc::clone(&signer) as Arc<dyn Signer>);

    for n in 0..3 {
        executor
            .execute_tool(&ToolSpec::new("add"), add_args(n, n), &Target::new("P"))
            .await
            .unwrap();
    }

    assert_eq!(signer.signed.load(Ordering::SeqCst), 3);
    let author = signer.public_key().await.unwrap();
    for request in provider.relay.published() {
        assert_eq!(request.pubkey, author);
        assert!(relaycap_signer::verify(&request).unwrap());
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 3. Shared state
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn executors_share_one_state_store() {
    let states = Arc::new(ExecutionStateStore::new());
    let first = Executor::new(Arc::new(AddingProvider::default()))
        .with_state_store(Arc::clone(&states));
    let second = Executor::new(Arc::new(AddingProvider::default()))
        .with_state_store(Arc::clone(&states));

    first
        .execute_tool(&ToolSpec::new("add"), add_args(1, 1), &Target::new("P"))
        .await
        .unwrap();
    second
        .execute_resource(&ResourceSpec::new("r", "file:///r"), &Target::new("Q"))
        .await
        .unwrap();

    assert_eq!(
        states.identities().await,
        vec![
            CapabilityIdentity::tool("add"),
            CapabilityIdentity::resource("file:///r"),
        ]
    );
    let add = states.snapshot(&CapabilityIdentity::tool("add")).await.unwrap();
    assert_eq!(add.result, Some(json!([{"type": "text", "text": "2"}])));
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 4. Shared cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[tokio::test]
async fn cached_result_serves_another_executor() {
    let cache = Arc::new(ExecutionCache::new());
    let config = ExecutorConfig::default().with_cache_results(true);
    let warm = AddingProvider::default();
    let cold = AddingProvider::default();

    Executor::new(Arc::new(warm.clone()))
        .with_cache(Arc::clone(&cache))
        .with_config(config.clone())
        .execute_tool(&ToolSpec::new("add"), add_args(20, 22), &Target::new("P"))
        .await
        .unwrap();

    let result = Executor::new(Arc::new(cold.clone()))
        .with_cache(Arc::clone(&cache))
        .with_config(config)
        .execute_tool(&ToolSpec::new("add"), add_args(20, 22), &Target::new("P"))
        .await
        .unwrap();

    assert_eq!(result, json!([{"type": "text", "text": "42"}]));
    assert_eq!(warm.relay.published().len(), 1);
    assert!(cold.relay.published().is_empty());
}
