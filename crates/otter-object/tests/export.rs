//! Export of live objects to host values and host-declared shapes

use otter_object::map_data::MapKey;
use otter_object::{
    ExportContext, FromJs, HostArray, HostMap, HostValue, ObjectError, ObjectRef, ObjectResult, PropertyKey,
    Realm, Value,
};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Iterable object that yields `from, from - 1, ..., 1`
fn countdown_method(realm: &Realm, from: i32) -> Value {
    Value::Object(realm.create_function("[Symbol.iterator]", 0, move |realm, _, _| {
        let remaining = Rc::new(Cell::new(from));
        let iterator = realm.create_object();
        let next = realm.create_function("next", 0, move |realm, _, _| {
            let current = remaining.get();
            if current == 0 {
                return Ok(realm.create_iter_result(Value::undefined(), true));
            }
            remaining.set(current - 1);
            Ok(realm.create_iter_result(Value::int32(current), false))
        });
        iterator.set(realm, &"next".into(), Value::Object(next))?;
        Ok(Value::Object(iterator))
    }))
}

/// `@@iterator` that walks its receiver from the last index down
fn reverse_iterator_method(realm: &Realm) -> Value {
    Value::Object(realm.create_function("reverseIterator", 0, |realm, this, _| {
        let source = realm.to_object(this)?;
        let remaining = Cell::new(realm.length_of_array_like(&source)?);
        let iterator = realm.create_object();
        let next = realm.create_function("next", 0, move |realm, _, _| {
            let index = remaining.get();
            if index == 0 {
                return Ok(realm.create_iter_result(Value::undefined(), true));
            }
            remaining.set(index - 1);
            let value = source.get(realm, &PropertyKey::from_number((index - 1) as f64))?;
            Ok(realm.create_iter_result(value, false))
        });
        iterator.set(realm, &"next".into(), Value::Object(next))?;
        Ok(Value::Object(iterator))
    }))
}

fn ints(realm: &Realm, values: &[i32]) -> Value {
    Value::Object(realm.create_array(values.iter().copied().map(Value::int32).collect()))
}

// ============================================================================
// Untyped export
// ============================================================================

#[test]
fn test_export_plain_object() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("name", "otter").unwrap();
    obj.set("age", 7).unwrap();
    obj.set("tags", ints(&realm, &[1, 2])).unwrap();

    let exported = obj.export().unwrap();
    let map = exported.as_map().unwrap();
    assert_eq!(map.keys(), vec!["name", "age", "tags"]);
    assert_eq!(map.get("name").unwrap().as_str(), Some("otter"));
    assert_eq!(map.get("age").unwrap().as_i64(), Some(7));
    assert_eq!(map.get("tags").unwrap().as_array().unwrap().len(), 2);
}

#[test]
fn test_export_cyclic_object_keeps_identity() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("self", obj.value()).unwrap();

    let exported = obj.export().unwrap();
    let map = exported.as_map().unwrap();
    let inner = map.get("self").unwrap();
    assert!(HostMap::ptr_eq(map, inner.as_map().unwrap()));
}

#[test]
fn test_export_cyclic_array_keeps_identity() {
    let realm = Realm::new();
    let arr = realm.create_array(Vec::new());
    arr.set(&realm, &PropertyKey::Index(0), Value::Object(arr.clone())).unwrap();

    let exported = realm.export(&Value::Object(arr)).unwrap();
    let items = exported.as_array().unwrap();
    assert!(HostArray::ptr_eq(items, items.get(0).unwrap().as_array().unwrap()));
}

#[test]
fn test_export_shared_reference_is_shared() {
    let realm = Realm::new();
    let shared = realm.new_object();
    let holder = realm.new_object();
    holder.set("a", shared.value()).unwrap();
    holder.set("b", shared.value()).unwrap();

    let exported = holder.export().unwrap();
    let map = exported.as_map().unwrap();
    assert_eq!(map.get("a").unwrap(), map.get("b").unwrap());
}

#[test]
fn test_export_map_as_pairs() {
    let realm = Realm::new();
    let map = realm.create_map();
    map.as_map().unwrap().set(MapKey(Value::from("k")), Value::int32(1));

    let exported = realm.export(&Value::Object(map)).unwrap();
    let pairs = exported.as_array().unwrap();
    assert_eq!(pairs.len(), 1);
    let pair = pairs.get(0).unwrap();
    let pair = pair.as_array().unwrap();
    assert_eq!(pair.get(0).unwrap().as_str(), Some("k"));
    assert_eq!(pair.get(1).unwrap().as_i64(), Some(1));
}

// ============================================================================
// Host maps
// ============================================================================

#[test]
fn test_wrapped_host_map_aliases_on_export() {
    let realm = Realm::new();
    let host = HostMap::from_entries([("a", HostValue::Int(1))]);
    let value = realm.to_value(&HostValue::Map(host.clone()));

    let exported = realm.export(&value).unwrap();
    assert!(HostMap::ptr_eq(exported.as_map().unwrap(), &host));

    let mut dest = HostMap::new();
    realm.export_to(&value, &mut dest).unwrap();
    assert!(HostMap::ptr_eq(&dest, &host));
}

#[test]
fn test_nested_host_map_keeps_one_wrapper() {
    let realm = Realm::new();
    let inner = HostMap::from_entries([("x", HostValue::Int(1))]);
    let outer = HostMap::from_entries([("m", HostValue::Map(inner.clone()))]);
    let wrapper = realm.wrap_host_map(&outer);

    let first = wrapper.get(&realm, &"m".into()).unwrap();
    let second = wrapper.get(&realm, &"m".into()).unwrap();
    assert!(Value::same_value(&first, &second));

    first.as_object().unwrap().set(&realm, &"tag".into(), Value::int32(2)).unwrap();
    assert_eq!(inner.get("tag").unwrap().as_i64(), Some(2));
    assert!(ObjectRef::ptr_eq(&wrapper, &realm.wrap_host_map(&outer)));
}

#[test]
fn test_script_writes_reach_host_map() {
    let realm = Realm::new();
    let host = HostMap::new();
    let wrapper = otter_object::Object::new(&realm, realm.wrap_host_map(&host));

    wrapper.set("count", 3).unwrap();
    assert_eq!(host.get("count").unwrap().as_i64(), Some(3));
    assert!(wrapper.delete("count").unwrap());
    assert!(host.is_empty());
}

#[test]
fn test_host_map_rejects_accessors() {
    let realm = Realm::new();
    let host = HostMap::new();
    let wrapper = otter_object::Object::new(&realm, realm.wrap_host_map(&host));
    let getter = realm.new_function("get", 0, |_, _, _| Ok(Value::int32(1)));

    let err = wrapper
        .define_accessor_property("x", Some(&getter), None, otter_object::Flag::True, otter_object::Flag::True)
        .unwrap_err();
    assert_eq!(err.name(), "TypeError");
    assert!(!host.contains_key("x"));
}

#[test]
fn test_export_to_host_map_from_plain_object() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("a", 1).unwrap();
    obj.set("b", "x").unwrap();

    let mut dest = HostMap::new();
    obj.export_to(&mut dest).unwrap();
    assert_eq!(dest.keys(), vec!["a", "b"]);
    assert_eq!(dest.get("b").unwrap().as_str(), Some("x"));
}

// ============================================================================
// Typed maps
// ============================================================================

#[derive(Debug, Default)]
struct Registry(Vec<(String, i32)>);

impl FromJs for Registry {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let entries = cx.map_entries(value, "Registry")?;
        let mut out = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            out.push((String::from_js(cx, &key)?, i32::from_js(cx, &item)?));
        }
        Ok(Self(out))
    }
}

#[test]
fn test_custom_map_destination() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("one", 1).unwrap();
    obj.set("two", 2).unwrap();

    let mut registry = Registry::default();
    obj.export_to(&mut registry).unwrap();
    assert_eq!(registry.0, vec![("one".to_string(), 1), ("two".to_string(), 2)]);
}

#[test]
fn test_std_maps_from_map_object() {
    let realm = Realm::new();
    let map = realm.create_map();
    let data = map.as_map().unwrap();
    data.set(MapKey(Value::from("b")), Value::int32(2));
    data.set(MapKey(Value::from("a")), Value::int32(1));
    let value = Value::Object(map);

    let mut ordered: BTreeMap<String, i64> = BTreeMap::new();
    realm.export_to(&value, &mut ordered).unwrap();
    assert_eq!(ordered.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);

    let mut hashed: HashMap<String, u8> = HashMap::new();
    realm.export_to(&value, &mut hashed).unwrap();
    assert_eq!(hashed.get("b"), Some(&2));
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_sequence_from_custom_iterator() {
    let realm = Realm::new();
    let obj = realm.create_object();
    obj.set(&realm, &realm.iterator_key(), countdown_method(&realm, 3)).unwrap();

    let mut dest: Vec<i32> = Vec::new();
    realm.export_to(&Value::Object(obj), &mut dest).unwrap();
    assert_eq!(dest, vec![3, 2, 1]);
}

#[test]
fn test_sequence_from_array_like() {
    let realm = Realm::new();
    let obj = realm.create_object();
    obj.set(&realm, &"length".into(), Value::int32(3)).unwrap();
    for (index, item) in [1, 2, 3].into_iter().enumerate() {
        obj.set(&realm, &PropertyKey::Index(index as u32), Value::int32(item)).unwrap();
    }

    let mut dest: Vec<i32> = Vec::new();
    realm.export_to(&Value::Object(obj), &mut dest).unwrap();
    assert_eq!(dest, vec![1, 2, 3]);
}

#[test]
fn test_sequence_iterator_wins_over_length() {
    let realm = Realm::new();
    let arr = realm.create_array(vec![Value::int32(1), Value::int32(2), Value::int32(3)]);
    arr.set(&realm, &realm.iterator_key(), countdown_method(&realm, 2)).unwrap();

    let mut dest: Vec<i32> = Vec::new();
    realm.export_to(&Value::Object(arr), &mut dest).unwrap();
    assert_eq!(dest, vec![2, 1]);
}

#[test]
fn test_sequence_through_proxy_get_trap() {
    let realm = Realm::new();
    let target = ints(&realm, &[1, 2, 3]);
    let handler = realm.create_object();
    let iterator_key = realm.iterator_key();
    let countdown = countdown_method(&realm, 3);
    let get = realm.create_function("get", 3, move |realm, _, args| {
        let key = args[1].to_property_key();
        if key == iterator_key {
            return Ok(countdown.clone());
        }
        match args[0].as_object() {
            Some(target) => target.get(realm, &key),
            None => Ok(Value::undefined()),
        }
    });
    handler.set(&realm, &"get".into(), Value::Object(get)).unwrap();
    let proxy = realm.create_proxy(&target, &Value::Object(handler)).unwrap();

    let mut dest: Vec<i32> = Vec::new();
    realm.export_to(&Value::Object(proxy), &mut dest).unwrap();
    assert_eq!(dest, vec![3, 2, 1]);
}

#[test]
fn test_sequence_through_forwarding_proxy_uses_target_iterator() {
    let realm = Realm::new();
    let arr = realm.create_array(vec![Value::int32(1), Value::int32(2), Value::int32(3)]);
    arr.set(&realm, &realm.iterator_key(), reverse_iterator_method(&realm)).unwrap();
    let proxy = realm
        .create_proxy(&Value::Object(arr), &Value::Object(realm.create_object()))
        .unwrap();

    let mut dest: Vec<i32> = Vec::new();
    realm.export_to(&Value::Object(proxy), &mut dest).unwrap();
    assert_eq!(dest, vec![3, 2, 1]);
}

#[test]
fn test_not_iterable_leaves_destination_empty() {
    let realm = Realm::new();
    let mut dest = vec![9, 9];
    let err = realm.export_to(&Value::Object(realm.create_object()), &mut dest).unwrap_err();

    assert!(matches!(err, ObjectError::NotIterable { .. }));
    assert!(err.to_string().contains("not an array or iterable"));
    assert!(dest.is_empty());
}

#[test]
fn test_nullish_source_gives_empty_sequence() {
    let realm = Realm::new();
    let mut dest = vec![1];
    realm.export_to(&Value::null(), &mut dest).unwrap();
    assert!(dest.is_empty());
}

#[test]
fn test_fixed_array_lengths_mismatch() {
    let realm = Realm::new();
    let mut exact = [0i32; 3];
    realm.export_to(&ints(&realm, &[4, 5, 6]), &mut exact).unwrap();
    assert_eq!(exact, [4, 5, 6]);

    let mut short = [0i32; 3];
    let err = realm.export_to(&ints(&realm, &[1, 2]), &mut short).unwrap_err();
    assert!(err.to_string().contains("lengths mismatch"));

    let map = realm.create_map();
    let data = map.as_map().unwrap();
    data.set(MapKey(Value::from("a")), Value::int32(1));
    data.set(MapKey(Value::from("b")), Value::int32(2));
    let mut pairs: [Value; 3] = Default::default();
    let err = realm.export_to(&Value::Object(map), &mut pairs).unwrap_err();
    assert!(matches!(err, ObjectError::ShapeMismatch { have: 2, need: 3, .. }));

    let array_like = realm.create_object();
    array_like.set(&realm, &"length".into(), Value::int32(4)).unwrap();
    let err = realm.export_to(&Value::Object(array_like), &mut short).unwrap_err();
    assert!(err.to_string().contains("lengths mismatch"));
}

#[test]
fn test_element_conversion_errors() {
    let realm = Realm::new();
    let mut dest: Vec<u8> = Vec::new();
    let err = realm.export_to(&ints(&realm, &[1, 300]), &mut dest).unwrap_err();
    assert_eq!(err.name(), "RangeError");
    assert!(dest.is_empty());
}

// ============================================================================
// Shared records
// ============================================================================

#[derive(Debug, Default)]
struct Link {
    label: String,
    next: Option<Rc<RefCell<Link>>>,
}

impl FromJs for Link {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.record(value, |r| {
            Ok(Link {
                label: r.field_or_default("label")?,
                next: r.field("next")?,
            })
        })
    }
}

#[test]
fn test_shared_record_cycle_closes() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("label", "loop").unwrap();
    obj.set("next", obj.value()).unwrap();

    let mut link: Rc<RefCell<Link>> = Rc::default();
    obj.export_to(&mut link).unwrap();

    let next = link.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&next, &link));
    let next_next = next.borrow().next.clone().unwrap();
    assert!(Rc::ptr_eq(&next_next, &link));
    assert_eq!(link.borrow().label, "loop");

    // Break the cycle so the test does not leak.
    link.borrow_mut().next = None;
}

#[derive(Debug, Default)]
struct Tree {
    children: Vec<Tree>,
}

impl FromJs for Tree {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.record(value, |r| {
            Ok(Tree {
                children: r.field_or_default("children")?,
            })
        })
    }
}

#[test]
fn test_plain_record_cycle_is_rejected() {
    let realm = Realm::new();
    let obj = realm.new_object();
    let children = realm.new_array(Vec::new());
    children.set(PropertyKey::Index(0), obj.value()).unwrap();
    obj.set("children", children).unwrap();

    let mut tree = Tree::default();
    let err = obj.export_to(&mut tree).unwrap_err();
    assert!(matches!(err, ObjectError::CircularReference { .. }));
    assert_eq!(err.to_string(), "circular reference while converting to Tree");
}

#[test]
fn test_self_referencing_object_into_hash_map() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("o", obj.value()).unwrap();

    let mut dest: HashMap<String, HostValue> = HashMap::new();
    obj.export_to(&mut dest).unwrap();

    let inner = dest["o"].as_map().unwrap().clone();
    let again = inner.get("o").unwrap();
    assert!(HostMap::ptr_eq(again.as_map().unwrap(), &inner));
    inner.remove("o");
}

#[derive(Debug, Default)]
struct Nested(HashMap<String, Rc<RefCell<Nested>>>);

impl FromJs for Nested {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        HashMap::from_js(cx, value).map(Nested)
    }
}

#[test]
fn test_recursive_map_type_closes_cycle() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("o", obj.value()).unwrap();

    let mut nested: Rc<RefCell<Nested>> = Rc::default();
    obj.export_to(&mut nested).unwrap();

    let inner = nested.borrow().0["o"].clone();
    assert!(Rc::ptr_eq(&inner, &nested));
    nested.borrow_mut().0.clear();
}

#[derive(Debug, Default)]
struct Listed(Vec<Rc<RefCell<Listed>>>);

impl FromJs for Listed {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        Vec::from_js(cx, value).map(Listed)
    }
}

#[test]
fn test_array_containing_itself_closes_cycle() {
    let realm = Realm::new();
    let arr = realm.create_array(Vec::new());
    arr.set(&realm, &PropertyKey::Index(0), Value::Object(arr.clone())).unwrap();

    let mut listed: Rc<RefCell<Listed>> = Rc::default();
    realm.export_to(&Value::Object(arr), &mut listed).unwrap();

    assert_eq!(listed.borrow().0.len(), 1);
    let first = listed.borrow().0[0].clone();
    assert!(Rc::ptr_eq(&first, &listed));
    listed.borrow_mut().0.clear();
}

#[derive(Debug, Default)]
struct Loose {
    s: HostValue,
    s1: Option<Rc<RefCell<Loose>>>,
}

impl FromJs for Loose {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.record(value, |r| {
            Ok(Loose {
                s: r.field("S")?,
                s1: r.field("S1")?,
            })
        })
    }
}

impl Loose {
    fn unlink(this: &Rc<RefCell<Loose>>) {
        let mut inner = this.borrow_mut();
        if let Some(map) = inner.s.as_map() {
            map.remove("S");
            map.remove("S1");
        }
        inner.s1 = None;
    }
}

fn self_linked(realm: &Realm) -> otter_object::Object {
    let obj = realm.new_object();
    obj.set("S", obj.value()).unwrap();
    obj.set("S1", obj.value()).unwrap();
    obj
}

#[test]
fn test_untyped_field_and_shared_self_link() {
    let realm = Realm::new();
    let obj = self_linked(&realm);

    let mut loose: Rc<RefCell<Loose>> = Rc::default();
    obj.export_to(&mut loose).unwrap();

    let map = loose.borrow().s.as_map().unwrap().clone();
    assert!(HostMap::ptr_eq(map.get("S").unwrap().as_map().unwrap(), &map));
    assert!(HostMap::ptr_eq(map.get("S1").unwrap().as_map().unwrap(), &map));
    let link = loose.borrow().s1.clone().unwrap();
    assert!(Rc::ptr_eq(&link, &loose));
    Loose::unlink(&loose);
}

#[derive(Debug, Default)]
struct Twins {
    s: Option<Rc<RefCell<Loose>>>,
    s1: Option<Rc<RefCell<Loose>>>,
}

impl FromJs for Twins {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.record(value, |r| {
            Ok(Twins {
                s: r.field("S")?,
                s1: r.field("S1")?,
            })
        })
    }
}

#[test]
fn test_two_fields_sharing_one_source() {
    let realm = Realm::new();
    let shared = self_linked(&realm);
    let holder = realm.new_object();
    holder.set("S", shared.value()).unwrap();
    holder.set("S1", shared.value()).unwrap();

    let mut outer: Rc<RefCell<Loose>> = Rc::default();
    holder.export_to(&mut outer).unwrap();
    let inner = outer.borrow().s1.clone().unwrap();
    assert!(!Rc::ptr_eq(&inner, &outer));
    let inner_link = inner.borrow().s1.clone().unwrap();
    assert!(Rc::ptr_eq(&inner_link, &inner));
    assert!(HostMap::ptr_eq(
        outer.borrow().s.as_map().unwrap(),
        inner.borrow().s.as_map().unwrap()
    ));
    Loose::unlink(&inner);

    let mut twins = Twins::default();
    holder.export_to(&mut twins).unwrap();
    let (s, s1) = (twins.s.clone().unwrap(), twins.s1.clone().unwrap());
    assert!(Rc::ptr_eq(&s, &s1));
    assert!(Rc::ptr_eq(s.borrow().s1.as_ref().unwrap(), &s));
    Loose::unlink(&s);
}

// ============================================================================
// JSON and functions
// ============================================================================

#[test]
fn test_export_to_json() {
    let realm = Realm::new();
    let obj = realm.new_object();
    obj.set("a", 1).unwrap();
    obj.set("b", realm.new_array(vec![HostValue::Bool(true), HostValue::Null])).unwrap();
    obj.set("c", "x").unwrap();

    let mut json = serde_json::Value::Null;
    obj.export_to(&mut json).unwrap();
    assert_eq!(json, json!({"a": 1, "b": [true, null], "c": "x"}));
}

#[test]
fn test_host_function_call() {
    let realm = Realm::new();
    let double = realm.new_function("double", 1, |_, _, args| {
        Ok(Value::number(args.first().and_then(Value::as_number).unwrap_or(0.0) * 2.0))
    });

    let func = double.as_function().unwrap();
    let result = func.call(&realm, &[HostValue::Int(21)]).unwrap();
    assert_eq!(result.as_f64(), Some(42.0));

    let exported = double.export().unwrap();
    assert!(matches!(exported, HostValue::Function(_)));
    assert!(realm.new_object().as_function().is_none());
}

#[test]
fn test_to_value_copies_host_arrays() {
    let realm = Realm::new();
    let items = HostArray::from_vec(vec![HostValue::Int(1), HostValue::from("two")]);
    let value = realm.to_value(&HostValue::Array(items));
    let arr: &ObjectRef = value.as_object().unwrap();

    assert!(arr.is_array().unwrap());
    assert_eq!(realm.length_of_array_like(arr).unwrap(), 2);
    assert_eq!(arr.get(&realm, &PropertyKey::Index(1)).unwrap().to_string(), "two");
}
