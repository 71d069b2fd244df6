//! Own-key ordering: indices ascending, then strings, then symbols, each in
//! insertion order.

use otter_object::reflect;
use otter_object::{JsString, PropertyKey, Realm, Symbol, Value};

fn mixed_keys() -> (Vec<PropertyKey>, Symbol, Symbol) {
    let sym1 = Symbol::new(Some("sym1"));
    let sym2 = Symbol::new(Some("sym2"));
    let keys = vec![
        PropertyKey::Symbol(sym2.clone()),
        PropertyKey::string("4294967294"),
        PropertyKey::string("2"),
        PropertyKey::string("1"),
        PropertyKey::string("0"),
        PropertyKey::string("02"),
        PropertyKey::string("4294967295"),
        PropertyKey::string("01"),
        PropertyKey::string("00"),
        PropertyKey::Symbol(sym1.clone()),
    ];
    (keys, sym1, sym2)
}

fn assert_canonical_order(keys: &[PropertyKey], sym1: &Symbol, sym2: &Symbol) {
    let names: Vec<String> = keys[..8].iter().map(ToString::to_string).collect();
    assert_eq!(
        names,
        vec!["0", "1", "2", "4294967294", "02", "4294967295", "01", "00"]
    );
    assert_eq!(keys[8], PropertyKey::Symbol(sym2.clone()));
    assert_eq!(keys[9], PropertyKey::Symbol(sym1.clone()));
    assert_eq!(keys.len(), 10);
}

#[test]
fn test_ordinary_object_key_order() {
    let realm = Realm::new();
    let obj = realm.create_object();
    let (keys, sym1, sym2) = mixed_keys();
    for key in &keys {
        obj.set(&realm, key, Value::int32(0)).unwrap();
    }

    let own = reflect::own_keys(&realm, &Value::Object(obj)).unwrap();
    assert_canonical_order(&own, &sym1, &sym2);
}

#[test]
fn test_index_boundary() {
    assert_eq!(PropertyKey::string("4294967294"), PropertyKey::Index(4294967294));
    assert!(matches!(PropertyKey::string("4294967295"), PropertyKey::String(_)));
    assert!(matches!(PropertyKey::string("01"), PropertyKey::String(_)));
    assert_eq!(PropertyKey::index(u32::MAX).to_string(), "4294967295");
}

#[test]
fn test_proxy_without_own_keys_trap_forwards_order() {
    let realm = Realm::new();
    let target = realm.create_object();
    let (keys, sym1, sym2) = mixed_keys();
    for key in &keys {
        target.set(&realm, key, Value::int32(0)).unwrap();
    }
    let handler = realm.create_object();
    let proxy = realm
        .create_proxy(&Value::Object(target), &Value::Object(handler))
        .unwrap();

    let own = reflect::own_keys(&realm, &Value::Object(proxy)).unwrap();
    assert_canonical_order(&own, &sym1, &sym2);
}

#[test]
fn test_own_keys_array_holds_strings_and_symbols() {
    let realm = Realm::new();
    let obj = realm.create_object();
    let sym = Symbol::new(Some("s"));
    obj.set(&realm, &PropertyKey::Symbol(sym.clone()), Value::int32(1)).unwrap();
    obj.set(&realm, &"b".into(), Value::int32(1)).unwrap();
    obj.set(&realm, &PropertyKey::Index(3), Value::int32(1)).unwrap();

    let array = reflect::own_keys_array(&realm, &Value::Object(obj)).unwrap();
    let array = array.as_object().unwrap();
    assert_eq!(realm.length_of_array_like(array).unwrap(), 3);
    assert_eq!(array.get(&realm, &PropertyKey::Index(0)).unwrap().to_string(), "3");
    assert_eq!(array.get(&realm, &PropertyKey::Index(1)).unwrap().to_string(), "b");
    assert_eq!(
        array.get(&realm, &PropertyKey::Index(2)).unwrap().as_symbol(),
        Some(&sym)
    );
}

#[test]
fn test_delete_and_reinsert_moves_string_to_end() {
    let realm = Realm::new();
    let obj = realm.create_object();
    for name in ["a", "b", "c"] {
        obj.set(&realm, &name.into(), Value::int32(1)).unwrap();
    }
    assert!(obj.delete(&realm, &"a".into()).unwrap());
    obj.set(&realm, &"a".into(), Value::int32(2)).unwrap();

    let names: Vec<String> = obj
        .own_keys(&realm)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["b", "c", "a"]);
}

#[test]
fn test_array_indices_precede_length() {
    let realm = Realm::new();
    let arr = realm.create_array(vec![Value::int32(1), Value::int32(2)]);
    let names: Vec<String> = arr
        .own_keys(&realm)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["0", "1", "length"]);
}

#[test]
fn test_variant_built_keys_on_array() {
    let realm = Realm::new();
    let arr = realm.create_array(vec![Value::int32(1), Value::int32(2)]);

    assert!(arr.set(&realm, &PropertyKey::Index(u32::MAX), Value::int32(7)).unwrap());
    assert_eq!(realm.length_of_array_like(&arr).unwrap(), 2);
    assert_eq!(arr.get(&realm, &PropertyKey::string("4294967295")).unwrap().as_number(), Some(7.0));

    let spelled = PropertyKey::String(JsString::new("5"));
    assert!(arr.set(&realm, &spelled, Value::int32(9)).unwrap());
    assert_eq!(realm.length_of_array_like(&arr).unwrap(), 6);
    assert_eq!(arr.get(&realm, &PropertyKey::Index(5)).unwrap().as_number(), Some(9.0));

    let names: Vec<String> = arr
        .own_keys(&realm)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(names, vec!["0", "1", "5", "length", "4294967295"]);
}
