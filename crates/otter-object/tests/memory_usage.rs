//! Memory usage estimation: fixed costs, sampling, incremental runs and budgets

use otter_object::map_data::MapKey;
use otter_object::memory::{SIZE_EMPTY_STRUCT, SIZE_INT, SIZE_STRING};
use otter_object::{
    BudgetLimit, HostMap, HostValue, MemUsage, MemUsageConfig, MemUsageContext, ObjectError, Realm, Value, estimate,
};
use std::time::Duration;

fn bare_object(realm: &Realm) -> otter_object::ObjectRef {
    realm.create_object_with_proto(None)
}

fn run(value: &Value) -> MemUsage {
    estimate(value, &mut MemUsageContext::default()).unwrap()
}

fn budget_error(err: ObjectError) -> (BudgetLimit, MemUsage) {
    match err {
        ObjectError::MemoryBudgetExceeded { limit, partial } => (limit, partial),
        other => panic!("expected a budget error, got {other}"),
    }
}

// ============================================================================
// Fixed costs
// ============================================================================

#[test]
fn test_empty_object() {
    let realm = Realm::new();
    let usage = run(&Value::Object(bare_object(&realm)));
    assert_eq!(usage, MemUsage { total: 8, incremental: 8 });
}

#[test]
fn test_object_with_one_property() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    obj.set(&realm, &"test".into(), Value::int32(99)).unwrap();
    assert_eq!(run(&Value::Object(obj)).total, 36);
}

#[test]
fn test_prototype_link_costs_one_slot() {
    let realm = Realm::new();
    let usage = run(&Value::Object(realm.create_object()));
    assert_eq!(usage.total, 16);
}

#[test]
fn test_primitive_wrapper() {
    let realm = Realm::new();
    let wrapper = realm.to_object(&Value::int32(5)).unwrap();
    assert_eq!(run(&Value::Object(wrapper)).total, 24);
}

#[test]
fn test_primitives() {
    assert_eq!(run(&Value::from("abc")).total, 3 + SIZE_STRING);
    assert_eq!(run(&Value::undefined()).total, 0);
}

#[test]
fn test_map_entries_are_counted() {
    let realm = Realm::new();
    let map = realm.create_map();
    map.as_map().unwrap().set(MapKey(Value::from("a")), Value::int32(1));
    assert_eq!(run(&Value::Object(map)).total, 41);
}

#[test]
fn test_host_map_entries_are_counted() {
    let realm = Realm::new();
    let host = HostMap::from_entries([("a", HostValue::Int(1))]);
    let wrapper = realm.wrap_host_map(&host);
    assert_eq!(run(&Value::Object(wrapper)).total, 41);
}

#[test]
fn test_proxy_counts_target_and_handler() {
    let realm = Realm::new();
    let target = Value::Object(bare_object(&realm));
    let handler = Value::Object(bare_object(&realm));
    let proxy = realm.create_proxy(&target, &handler).unwrap();
    assert_eq!(run(&Value::Object(proxy)).total, 24);
}

#[test]
fn test_getters_are_not_invoked() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    let getter = realm.create_function("boom", 0, |_, _, _| panic!("getter must not run"));
    obj.define_property_or_throw(
        &realm,
        &"x".into(),
        otter_object::PartialDescriptor::accessor(Value::Object(getter), Value::undefined(), true, true),
    )
    .unwrap();
    assert!(run(&Value::Object(obj)).total > SIZE_EMPTY_STRUCT);
}

// ============================================================================
// Sampling
// ============================================================================

#[test]
fn test_large_objects_are_sampled() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    for i in 0..4 {
        obj.set(&realm, &format!("test{i}").into(), Value::int32(i)).unwrap();
    }
    let per_entry = 5 + SIZE_STRING + SIZE_INT;

    let exact = run(&Value::Object(obj.clone())).total;
    assert_eq!(exact, SIZE_EMPTY_STRUCT + 4 * per_entry);

    let mut cx = MemUsageContext::new(MemUsageConfig::new().sample_threshold(2));
    let sampled = estimate(&Value::Object(obj), &mut cx).unwrap();
    assert_eq!(sampled.total, 124);
}

// ============================================================================
// Incremental runs
// ============================================================================

#[test]
fn test_second_run_is_not_incremental() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    obj.set(&realm, &"test".into(), Value::int32(99)).unwrap();
    let value = Value::Object(obj.clone());
    let mut cx = MemUsageContext::default();

    let first = estimate(&value, &mut cx).unwrap();
    assert_eq!(first, MemUsage { total: 36, incremental: 36 });
    assert_eq!(cx.accounted_objects(), 1);

    let second = estimate(&value, &mut cx).unwrap();
    assert_eq!(second, MemUsage { total: 36, incremental: 0 });

    obj.set(&realm, &"nested".into(), Value::Object(bare_object(&realm))).unwrap();
    let third = estimate(&value, &mut cx).unwrap();
    assert_eq!(third.total, 36 + (6 + SIZE_STRING) + SIZE_EMPTY_STRUCT);
    assert_eq!(third.incremental, SIZE_EMPTY_STRUCT);

    cx.reset();
    let fourth = estimate(&value, &mut cx).unwrap();
    assert_eq!(fourth.incremental, fourth.total);
}

#[test]
fn test_dead_objects_leave_the_accounted_set() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    let mut cx = MemUsageContext::default();
    estimate(&Value::Object(obj.clone()), &mut cx).unwrap();
    assert_eq!(cx.accounted_objects(), 1);

    drop(obj);
    assert_eq!(cx.accounted_objects(), 0);
}

// ============================================================================
// Budgets
// ============================================================================

#[test]
fn test_size_budget() {
    let realm = Realm::new();
    let obj = bare_object(&realm);
    obj.set(&realm, &"test".into(), Value::int32(99)).unwrap();
    let mut cx = MemUsageContext::new(MemUsageConfig::new().max_bytes(10));

    let err = estimate(&Value::Object(obj), &mut cx).unwrap_err();
    assert!(err.is_budget_exceeded());
    assert_eq!(err.name(), "RangeError");
    let (limit, partial) = budget_error(err);
    assert_eq!(limit, BudgetLimit::Size);
    assert_eq!(partial.total, 36);
    assert_eq!(cx.accounted_objects(), 0);
}

#[test]
fn test_size_budget_stops_walk_early() {
    let realm = Realm::new();
    let outer = bare_object(&realm);
    for i in 0..8 {
        let inner = bare_object(&realm);
        inner.set(&realm, &"payload".into(), Value::from("x".repeat(64))).unwrap();
        outer.set(&realm, &format!("k{i}").into(), Value::Object(inner)).unwrap();
    }
    let mut cx = MemUsageContext::new(MemUsageConfig::new().max_bytes(100));

    let (limit, partial) = budget_error(estimate(&Value::Object(outer.clone()), &mut cx).unwrap_err());
    assert_eq!(limit, BudgetLimit::Size);
    let full = run(&Value::Object(outer)).total;
    assert!(partial.total > 100);
    assert!(partial.total < full);
}

#[test]
fn test_time_budget() {
    let realm = Realm::new();
    let mut cx = MemUsageContext::new(MemUsageConfig::new().time_budget(Duration::ZERO));
    let err = estimate(&Value::Object(bare_object(&realm)), &mut cx).unwrap_err();
    let (limit, partial) = budget_error(err);
    assert_eq!(limit, BudgetLimit::Time);
    assert_eq!(partial.total, 0);
}

#[test]
fn test_depth_budget() {
    let realm = Realm::new();
    let mut head = bare_object(&realm);
    for _ in 0..5 {
        let next = bare_object(&realm);
        next.set(&realm, &"n".into(), Value::Object(head)).unwrap();
        head = next;
    }
    let mut cx = MemUsageContext::new(MemUsageConfig::new().max_depth(3));
    let (limit, _) = budget_error(estimate(&Value::Object(head.clone()), &mut cx).unwrap_err());
    assert_eq!(limit, BudgetLimit::Depth);

    let mut roomy = MemUsageContext::new(MemUsageConfig::new().max_depth(6));
    assert!(estimate(&Value::Object(head), &mut roomy).is_ok());
}

#[test]
fn test_budget_error_message() {
    let realm = Realm::new();
    let mut cx = MemUsageContext::new(MemUsageConfig::new().max_bytes(1));
    let err = estimate(&Value::Object(bare_object(&realm)), &mut cx).unwrap_err();
    assert_eq!(err.to_string(), "memory budget exceeded (size): 8 bytes accounted");
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_json_drives_estimation() {
    let config = MemUsageConfig::from_json(r#"{"sample_threshold": 2, "max_depth": 10}"#).unwrap();
    assert_eq!(config.max_bytes, None);

    let realm = Realm::new();
    let obj = bare_object(&realm);
    for i in 0..4 {
        obj.set(&realm, &format!("test{i}").into(), Value::int32(i)).unwrap();
    }
    let mut cx = MemUsageContext::new(config);
    assert_eq!(cx.config().max_depth, 10);
    assert_eq!(estimate(&Value::Object(obj), &mut cx).unwrap().total, 124);
}
