//! Property Access Benchmarks
//!
//! Ordinary get/set, proxy forwarding, export and memory estimation.

use criterion::{Criterion, criterion_group, criterion_main};
use otter_object::{MemUsageConfig, MemUsageContext, ObjectRef, PropertyKey, Realm, Value, estimate, reflect};
use std::hint::black_box;

fn populated(realm: &Realm, count: i32) -> ObjectRef {
    let obj = realm.create_object();
    for i in 0..count {
        let key = PropertyKey::string(&format!("prop{}", i));
        let _ = obj.set(realm, &key, Value::int32(i));
    }
    obj
}

/// Benchmark: ordinary object set/get
fn bench_ordinary_access(c: &mut Criterion) {
    let realm = Realm::new();

    c.bench_function("ordinary_set_50_props", |b| {
        b.iter(|| black_box(populated(&realm, 50)));
    });

    c.bench_function("ordinary_get_50_props", |b| {
        let obj = populated(&realm, 50);
        let keys: Vec<PropertyKey> = (0..50).map(|i| PropertyKey::string(&format!("prop{}", i))).collect();

        b.iter(|| {
            let mut sum = 0.0;
            for key in &keys {
                if let Ok(v) = obj.get(&realm, key) {
                    sum += v.as_number().unwrap_or(0.0);
                }
            }
            black_box(sum)
        });
    });

    c.bench_function("own_keys_mixed_100", |b| {
        let obj = realm.create_object();
        for i in 0..50 {
            let _ = obj.set(&realm, &PropertyKey::Index(99 - i), Value::int32(0));
            let _ = obj.set(&realm, &PropertyKey::string(&format!("k{}", i)), Value::int32(0));
        }
        b.iter(|| black_box(obj.own_keys(&realm).map(|keys| keys.len())));
    });
}

/// Benchmark: proxy without traps vs. proxy with a get trap
fn bench_proxy_access(c: &mut Criterion) {
    let realm = Realm::new();
    let target = Value::Object(populated(&realm, 20));

    c.bench_function("proxy_forwarding_get", |b| {
        let proxy = realm.create_proxy(&target, &Value::Object(realm.create_object())).unwrap();
        let key = PropertyKey::string("prop10");
        b.iter(|| black_box(proxy.get(&realm, &key).ok()));
    });

    c.bench_function("proxy_trap_get", |b| {
        let handler = realm.create_object();
        let trap = realm.create_function("get", 3, |_, _, _| Ok(Value::int32(1)));
        let _ = handler.set(&realm, &"get".into(), Value::Object(trap));
        let proxy = realm.create_proxy(&target, &Value::Object(handler)).unwrap();
        let key = PropertyKey::string("prop10");
        b.iter(|| black_box(proxy.get(&realm, &key).ok()));
    });

    c.bench_function("reflect_own_keys_through_proxy", |b| {
        let proxy = Value::Object(realm.create_proxy(&target, &Value::Object(realm.create_object())).unwrap());
        b.iter(|| black_box(reflect::own_keys(&realm, &proxy).map(|keys| keys.len())));
    });
}

/// Benchmark: export and memory estimation over a nested graph
fn bench_graph_walks(c: &mut Criterion) {
    let realm = Realm::new();
    let root = realm.create_object();
    for i in 0..20 {
        let _ = root.set(&realm, &PropertyKey::string(&format!("child{}", i)), Value::Object(populated(&realm, 20)));
    }
    let root = Value::Object(root);

    c.bench_function("export_nested_20x20", |b| {
        b.iter(|| black_box(realm.export(&root).is_ok()));
    });

    c.bench_function("estimate_nested_20x20", |b| {
        b.iter(|| {
            let mut cx = MemUsageContext::default();
            black_box(estimate(&root, &mut cx).ok())
        });
    });

    c.bench_function("estimate_nested_sampled", |b| {
        b.iter(|| {
            let mut cx = MemUsageContext::new(MemUsageConfig::new().sample_threshold(4));
            black_box(estimate(&root, &mut cx).ok())
        });
    });
}

criterion_group!(benches, bench_ordinary_access, bench_proxy_access, bench_graph_walks);
criterion_main!(benches);
