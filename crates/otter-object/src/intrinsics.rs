//! Built-in functions the object model itself depends on: array and map
//! iteration (used by export), the `Map` methods, and `%IteratorPrototype%`.

use crate::error::{ObjectError, ObjectResult};
use crate::map_data::{MapData, MapKey};
use crate::object::ObjectRef;
use crate::property::{PartialDescriptor, PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::realm::{Realm, native_function};
use crate::value::Value;
use std::cell::Cell;
use std::rc::Rc;

/// Install the intrinsic methods on a freshly created realm
pub(crate) fn install(realm: &Realm) {
    let iterator_key = realm.iterator_key();

    let iter_self = builtin(realm, "[Symbol.iterator]", 0, |_, this, _| Ok(this.clone()));
    method(realm.iterator_prototype(), iterator_key.clone(), iter_self);

    let values = Value::Object(realm.array_values().clone());
    realm
        .array_prototype()
        .store_property(PropertyKey::string("values"), PropertyDescriptor::data_with_attrs(values.clone(), PropertyAttributes::builtin()));
    realm
        .array_prototype()
        .store_property(iterator_key.clone(), PropertyDescriptor::data_with_attrs(values, PropertyAttributes::builtin()));

    let map_proto = realm.map_prototype();
    method(map_proto, "get".into(), builtin(realm, "get", 1, map_get));
    method(map_proto, "set".into(), builtin(realm, "set", 2, map_set));
    method(map_proto, "has".into(), builtin(realm, "has", 1, map_has));
    method(map_proto, "delete".into(), builtin(realm, "delete", 1, map_delete));
    method(map_proto, "clear".into(), builtin(realm, "clear", 0, map_clear));
    let entries = builtin(realm, "entries", 0, map_entries);
    method(map_proto, "entries".into(), entries.clone());
    method(map_proto, iterator_key, entries);

    let size = builtin(realm, "get size", 0, map_size);
    map_proto.store_property(
        PropertyKey::string("size"),
        PropertyDescriptor::accessor(Some(size), None, false, true),
    );
    map_proto.store_property(
        PropertyKey::Symbol(realm.symbols().to_string_tag.clone()),
        PropertyDescriptor::data_with_attrs(Value::from("Map"), PropertyAttributes::new(false, false, true)),
    );
}

fn builtin(
    realm: &Realm,
    name: &str,
    length: u32,
    func: impl Fn(&Realm, &Value, &[Value]) -> ObjectResult<Value> + 'static,
) -> Value {
    Value::Object(native_function(realm.function_prototype(), name, length, Rc::new(func)))
}

fn method(target: &ObjectRef, key: PropertyKey, func: Value) {
    target.store_property(key, PropertyDescriptor::data_with_attrs(func, PropertyAttributes::builtin()));
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

// ============================================================================
// Array iteration
// ============================================================================

/// `Array.prototype.values` / `Array.prototype[@@iterator]`.
///
/// Works on any array-like receiver: each step re-reads `length`, so the
/// iterator observes elements pushed during iteration.
pub(crate) fn array_values(realm: &Realm, this: &Value, _args: &[Value]) -> ObjectResult<Value> {
    let target = realm.to_object(this)?;
    let position: Rc<Cell<Option<u64>>> = Rc::new(Cell::new(Some(0)));

    let next = realm.create_function("next", 0, move |realm, _, _| {
        let Some(index) = position.get() else {
            return Ok(realm.create_iter_result(Value::undefined(), true));
        };
        if index >= realm.length_of_array_like(&target)? {
            position.set(None);
            return Ok(realm.create_iter_result(Value::undefined(), true));
        }
        position.set(Some(index + 1));
        let value = target.get(realm, &PropertyKey::from_number(index as f64))?;
        Ok(realm.create_iter_result(value, false))
    });

    let iterator = realm.create_object_with_proto(Some(realm.iterator_prototype().clone()));
    iterator.define_property_or_throw(
        realm,
        &PropertyKey::string("next"),
        PartialDescriptor::data(Value::Object(next), PropertyAttributes::builtin()),
    )?;
    Ok(Value::Object(iterator))
}

// ============================================================================
// Map
// ============================================================================

fn this_map<'a>(this: &'a Value, method: &str) -> ObjectResult<&'a MapData> {
    this.as_object()
        .and_then(|obj| obj.as_map())
        .ok_or_else(|| {
            ObjectError::type_error(format!(
                "Method Map.prototype.{method} called on incompatible receiver {this}"
            ))
        })
}

fn map_get(_: &Realm, this: &Value, args: &[Value]) -> ObjectResult<Value> {
    let map = this_map(this, "get")?;
    Ok(map.get(&MapKey(arg(args, 0))).unwrap_or_default())
}

fn map_set(_: &Realm, this: &Value, args: &[Value]) -> ObjectResult<Value> {
    let map = this_map(this, "set")?;
    map.set(MapKey(arg(args, 0)), arg(args, 1));
    Ok(this.clone())
}

fn map_has(_: &Realm, this: &Value, args: &[Value]) -> ObjectResult<Value> {
    let map = this_map(this, "has")?;
    Ok(Value::boolean(map.has(&MapKey(arg(args, 0)))))
}

fn map_delete(_: &Realm, this: &Value, args: &[Value]) -> ObjectResult<Value> {
    let map = this_map(this, "delete")?;
    Ok(Value::boolean(map.delete(&MapKey(arg(args, 0)))))
}

fn map_clear(_: &Realm, this: &Value, _args: &[Value]) -> ObjectResult<Value> {
    this_map(this, "clear")?.clear();
    Ok(Value::undefined())
}

fn map_size(_: &Realm, this: &Value, _args: &[Value]) -> ObjectResult<Value> {
    let map = this_map(this, "size")?;
    Ok(Value::number(map.size() as f64))
}

/// `Map.prototype.entries` / `Map.prototype[@@iterator]`
fn map_entries(realm: &Realm, this: &Value, _args: &[Value]) -> ObjectResult<Value> {
    this_map(this, "entries")?;
    let source = this.clone();
    let cursor: Rc<Cell<Option<usize>>> = Rc::new(Cell::new(Some(0)));

    let next = realm.create_function("next", 0, move |realm, _, _| {
        let map = this_map(&source, "entries")?;
        let entry = cursor.get().and_then(|position| map.next_entry(position));
        match entry {
            Some((position, key, value)) => {
                cursor.set(Some(position));
                let pair = realm.create_array(vec![key, value]);
                Ok(realm.create_iter_result(Value::Object(pair), false))
            }
            None => {
                cursor.set(None);
                Ok(realm.create_iter_result(Value::undefined(), true))
            }
        }
    });

    let iterator = realm.create_object_with_proto(Some(realm.iterator_prototype().clone()));
    iterator.define_property_or_throw(
        realm,
        &PropertyKey::string("next"),
        PartialDescriptor::data(Value::Object(next), PropertyAttributes::builtin()),
    )?;
    Ok(Value::Object(iterator))
}
