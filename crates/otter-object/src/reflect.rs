//! `Reflect.*` and the descriptor object conversions.
//!
//! Every function here is a thin wrapper over the internal methods on
//! [`ObjectRef`]; the boolean-returning ones use the same checks as the
//! throwing `Object.*` paths in [`crate::object_api`].

use crate::error::{ObjectError, ObjectResult};
use crate::object::ObjectRef;
use crate::property::{PartialDescriptor, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;
use crate::value::Value;

pub(crate) fn object_arg<'a>(value: &'a Value, function: &str) -> ObjectResult<&'a ObjectRef> {
    value
        .as_object()
        .ok_or_else(|| ObjectError::type_error(format!("{function} called on non-object")))
}

// ============================================================================
// Descriptor objects
// ============================================================================

/// ToPropertyDescriptor
pub fn to_property_descriptor(realm: &Realm, value: &Value) -> ObjectResult<PartialDescriptor> {
    let Value::Object(obj) = value else {
        return Err(ObjectError::type_error(format!(
            "Property description must be an object: {value}"
        )));
    };

    let field = |name: &str| -> ObjectResult<Option<Value>> {
        let key = PropertyKey::string(name);
        if obj.has_property(realm, &key)? {
            Ok(Some(obj.get(realm, &key)?))
        } else {
            Ok(None)
        }
    };

    let mut desc = PartialDescriptor {
        enumerable: field("enumerable")?.map(|v| v.to_boolean()),
        configurable: field("configurable")?.map(|v| v.to_boolean()),
        value: field("value")?,
        writable: field("writable")?.map(|v| v.to_boolean()),
        ..PartialDescriptor::default()
    };
    if let Some(getter) = field("get")? {
        if !getter.is_undefined() && !getter.is_callable() {
            return Err(ObjectError::type_error(format!("Getter must be a function: {getter}")));
        }
        desc.get = Some(getter);
    }
    if let Some(setter) = field("set")? {
        if !setter.is_undefined() && !setter.is_callable() {
            return Err(ObjectError::type_error(format!("Setter must be a function: {setter}")));
        }
        desc.set = Some(setter);
    }
    if desc.is_accessor() && desc.is_data() {
        return Err(ObjectError::type_error(
            "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
        ));
    }
    Ok(desc)
}

/// FromPropertyDescriptor: an object with one property per present field
pub fn from_property_descriptor(realm: &Realm, desc: &PartialDescriptor) -> ObjectRef {
    let obj = realm.create_object();
    let put = |name: &str, value: Value| {
        obj.store_property(PropertyKey::string(name), PropertyDescriptor::data(value));
    };
    if let Some(value) = &desc.value {
        put("value", value.clone());
    }
    if let Some(writable) = desc.writable {
        put("writable", Value::boolean(writable));
    }
    if let Some(getter) = &desc.get {
        put("get", getter.clone());
    }
    if let Some(setter) = &desc.set {
        put("set", setter.clone());
    }
    if let Some(enumerable) = desc.enumerable {
        put("enumerable", Value::boolean(enumerable));
    }
    if let Some(configurable) = desc.configurable {
        put("configurable", Value::boolean(configurable));
    }
    obj
}

/// FromPropertyDescriptor for a complete descriptor, or `undefined`
pub fn descriptor_to_value(realm: &Realm, desc: Option<PropertyDescriptor>) -> Value {
    match desc {
        Some(desc) => Value::Object(from_property_descriptor(realm, &PartialDescriptor::from(desc))),
        None => Value::undefined(),
    }
}

// ============================================================================
// Reflect
// ============================================================================

/// `Reflect.ownKeys`
pub fn own_keys(realm: &Realm, target: &Value) -> ObjectResult<Vec<PropertyKey>> {
    object_arg(target, "Reflect.ownKeys")?.own_keys(realm)
}

/// `Reflect.ownKeys`, as an array of strings and symbols
pub fn own_keys_array(realm: &Realm, target: &Value) -> ObjectResult<Value> {
    let keys = own_keys(realm, target)?;
    let values = keys.iter().map(PropertyKey::to_value).collect();
    Ok(Value::Object(realm.create_array(values)))
}

/// `Reflect.get`
pub fn get(realm: &Realm, target: &Value, key: &PropertyKey, receiver: Option<&Value>) -> ObjectResult<Value> {
    let obj = object_arg(target, "Reflect.get")?;
    obj.get_with_receiver(realm, key, receiver.unwrap_or(target))
}

/// `Reflect.set`: `false` instead of a `TypeError` when the write is rejected
pub fn set(realm: &Realm, target: &Value, key: &PropertyKey, value: Value, receiver: Option<&Value>) -> ObjectResult<bool> {
    let obj = object_arg(target, "Reflect.set")?;
    obj.set_with(realm, key, value, receiver.unwrap_or(target), crate::object::OnFailure::ReturnFalse)
}

/// `Reflect.has`
pub fn has(realm: &Realm, target: &Value, key: &PropertyKey) -> ObjectResult<bool> {
    object_arg(target, "Reflect.has")?.has_property(realm, key)
}

/// `Reflect.defineProperty`
pub fn define_property(realm: &Realm, target: &Value, key: &PropertyKey, attributes: &Value) -> ObjectResult<bool> {
    let obj = object_arg(target, "Reflect.defineProperty")?;
    let desc = to_property_descriptor(realm, attributes)?;
    obj.define_own_property(realm, key, desc)
}

/// `Reflect.deleteProperty`
pub fn delete_property(realm: &Realm, target: &Value, key: &PropertyKey) -> ObjectResult<bool> {
    object_arg(target, "Reflect.deleteProperty")?.delete(realm, key)
}

/// `Reflect.getOwnPropertyDescriptor`
pub fn get_own_property_descriptor(realm: &Realm, target: &Value, key: &PropertyKey) -> ObjectResult<Value> {
    let desc = object_arg(target, "Reflect.getOwnPropertyDescriptor")?.get_own_property(realm, key)?;
    Ok(descriptor_to_value(realm, desc))
}

/// `Reflect.getPrototypeOf`
pub fn get_prototype_of(realm: &Realm, target: &Value) -> ObjectResult<Value> {
    let proto = object_arg(target, "Reflect.getPrototypeOf")?.get_prototype_of(realm)?;
    Ok(proto.map_or(Value::null(), Value::Object))
}

/// `Reflect.setPrototypeOf`
pub fn set_prototype_of(realm: &Realm, target: &Value, proto: &Value) -> ObjectResult<bool> {
    let obj = object_arg(target, "Reflect.setPrototypeOf")?;
    let proto = match proto {
        Value::Object(p) => Some(p.clone()),
        Value::Null => None,
        other => {
            return Err(ObjectError::type_error(format!(
                "Object prototype may only be an Object or null: {other}"
            )));
        }
    };
    obj.set_prototype_of(realm, proto)
}

/// `Reflect.isExtensible`
pub fn is_extensible(realm: &Realm, target: &Value) -> ObjectResult<bool> {
    object_arg(target, "Reflect.isExtensible")?.is_extensible(realm)
}

/// `Reflect.preventExtensions`
pub fn prevent_extensions(realm: &Realm, target: &Value) -> ObjectResult<bool> {
    object_arg(target, "Reflect.preventExtensions")?.prevent_extensions(realm)
}

/// `Reflect.apply`
pub fn apply(realm: &Realm, target: &Value, this: &Value, arguments: &Value) -> ObjectResult<Value> {
    if !target.is_callable() {
        return Err(ObjectError::type_error(format!(
            "Function.prototype.apply was called on {target}, which is not a function"
        )));
    }
    let list = object_arg(arguments, "CreateListFromArrayLike")?;
    let length = realm.length_of_array_like(list)?;
    let mut args = Vec::with_capacity(length as usize);
    for index in 0..length {
        args.push(list.get(realm, &PropertyKey::from_number(index as f64))?);
    }
    realm.call(target, this, &args)
}
