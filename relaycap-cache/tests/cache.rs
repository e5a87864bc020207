use relaycap_cache::{CacheKey, ExecutionCache};
use relaycap_protocol::{CapabilityCall, Target};
use serde_json::{Map, Value, json};

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn add_call(a: i64, b: i64) -> CapabilityCall {
    CapabilityCall::tool("add", args(json!({"a": a, "b": b})))
}

// --- Key derivation ---

#[test]
fn identical_calls_share_a_key() {
    let target = Target::new("P").with_server("srv");
    assert_eq!(
        CacheKey::derive(&add_call(1, 2), &target),
        CacheKey::derive(&add_call(1, 2), &target)
    );
}

#[test]
fn argument_order_does_not_matter() {
    let target = Target::new("P");
    let mut forward = Map::new();
    forward.insert("a".into(), json!(1));
    forward.insert("b".into(), json!({"y": 2, "x": 3}));
    let mut backward = Map::new();
    backward.insert("b".into(), json!({"x": 3, "y": 2}));
    backward.insert("a".into(), json!(1));

    assert_eq!(
        CacheKey::derive(&CapabilityCall::tool("add", forward), &target),
        CacheKey::derive(&CapabilityCall::tool("add", backward), &target)
    );
}

#[test]
fn any_field_change_changes_the_key() {
    let base_target = Target::new("P").with_server("srv");
    let base = CacheKey::derive(&add_call(1, 2), &base_target);

    let other_name = CapabilityCall::tool("sum", args(json!({"a": 1, "b": 2})));
    assert_ne!(base, CacheKey::derive(&other_name, &base_target));
    assert_ne!(base, CacheKey::derive(&add_call(1, 3), &base_target));
    assert_ne!(
        base,
        CacheKey::derive(&add_call(1, 2), &Target::new("Q").with_server("srv"))
    );
    assert_ne!(
        base,
        CacheKey::derive(&add_call(1, 2), &Target::new("P").with_server("other"))
    );
    assert_ne!(base, CacheKey::derive(&add_call(1, 2), &Target::new("P")));
    assert_ne!(
        base,
        CacheKey::derive_with_id(&add_call(1, 2), Some("announcement-1"), &base_target)
    );
}

// --- Store / lookup ---

#[tokio::test]
async fn store_then_lookup_hits() {
    let cache = ExecutionCache::new();
    let target = Target::new("P");
    let result = json!([{"type": "text", "text": "3"}]);

    assert!(cache.lookup(&add_call(1, 2), &target).await.is_none());
    cache.store(&add_call(1, 2), &target, result.clone()).await;

    assert_eq!(cache.lookup(&add_call(1, 2), &target).await, Some(result));
    assert!(cache.lookup(&add_call(2, 1), &target).await.is_none());
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn store_overwrites_and_clear_empties() {
    let cache = ExecutionCache::new();
    let target = Target::new("P");
    cache.store(&add_call(1, 2), &target, json!(1)).await;
    cache.store(&add_call(1, 2), &target, json!(2)).await;
    assert_eq!(cache.lookup(&add_call(1, 2), &target).await, Some(json!(2)));

    cache.clear().await;
    assert!(cache.is_empty().await);
    assert!(cache.lookup(&add_call(1, 2), &target).await.is_none());
}

#[tokio::test]
async fn explicit_keys_with_capability_id() {
    let cache = ExecutionCache::new();
    let target = Target::new("P");
    let key = CacheKey::derive_with_id(&add_call(1, 2), Some("id-7"), &target);
    cache.insert(key.clone(), json!("cached")).await;

    assert_eq!(cache.get(&key).await, Some(json!("cached")));
    assert!(cache.lookup(&add_call(1, 2), &target).await.is_none());
}
