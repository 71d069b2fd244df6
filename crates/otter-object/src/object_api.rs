//! `Object.*` static functions that touch descriptors and extensibility.
//!
//! These are the throwing counterparts of [`crate::reflect`]: a rejected
//! definition or write surfaces as a `TypeError` instead of `false`.

use crate::error::ObjectResult;
use crate::object::{IntegrityLevel, OnFailure};
use crate::property::PropertyKey;
use crate::realm::Realm;
use crate::reflect::{descriptor_to_value, object_arg, to_property_descriptor};
use crate::value::Value;

/// `Object.defineProperty`
pub fn define_property(realm: &Realm, target: &Value, key: &PropertyKey, attributes: &Value) -> ObjectResult<Value> {
    let obj = object_arg(target, "Object.defineProperty")?;
    let desc = to_property_descriptor(realm, attributes)?;
    obj.define_property_or_throw(realm, key, desc)?;
    Ok(target.clone())
}

/// `Object.defineProperties`.
///
/// Descriptors are read from every enumerable own property of `properties`
/// first; only then are they applied, in key order. A key whose
/// `[[GetOwnProperty]]` comes back empty (for instance a proxy trap returning
/// `undefined`) is skipped.
pub fn define_properties(realm: &Realm, target: &Value, properties: &Value) -> ObjectResult<Value> {
    let obj = object_arg(target, "Object.defineProperties")?;
    let props = realm.to_object(properties)?;

    let mut descriptors = Vec::new();
    for key in props.own_keys(realm)? {
        let Some(prop) = props.get_own_property(realm, &key)? else {
            continue;
        };
        if !prop.enumerable() {
            continue;
        }
        let desc_obj = props.get(realm, &key)?;
        descriptors.push((key, to_property_descriptor(realm, &desc_obj)?));
    }

    for (key, desc) in descriptors {
        obj.define_property_or_throw(realm, &key, desc)?;
    }
    Ok(target.clone())
}

/// `Object.assign`.
///
/// Each source's keys are snapshotted before copying starts; each key is
/// then re-checked for presence and enumerability right before it is read,
/// so getters that reshape the source are observed key by key.
pub fn assign(realm: &Realm, target: &Value, sources: &[Value]) -> ObjectResult<Value> {
    let to = realm.to_object(target)?;
    let receiver = Value::Object(to.clone());

    for source in sources {
        if source.is_nullish() {
            continue;
        }
        let from = realm.to_object(source)?;
        let keys = from.own_keys(realm)?;
        for key in keys {
            let Some(desc) = from.get_own_property(realm, &key)? else {
                continue;
            };
            if !desc.enumerable() {
                continue;
            }
            let value = from.get(realm, &key)?;
            to.set_with(realm, &key, value, &receiver, OnFailure::Throw)?;
        }
    }
    Ok(receiver)
}

/// `Object.preventExtensions`
pub fn prevent_extensions(realm: &Realm, target: &Value) -> ObjectResult<Value> {
    if let Value::Object(obj) = target {
        obj.prevent_extensions_or_throw(realm)?;
    }
    Ok(target.clone())
}

/// `Object.getOwnPropertyDescriptor`
pub fn get_own_property_descriptor(realm: &Realm, target: &Value, key: &PropertyKey) -> ObjectResult<Value> {
    let obj = realm.to_object(target)?;
    let desc = obj.get_own_property(realm, key)?;
    Ok(descriptor_to_value(realm, desc))
}

/// `Object.keys`, as property keys
pub fn keys(realm: &Realm, target: &Value) -> ObjectResult<Vec<PropertyKey>> {
    realm.to_object(target)?.enumerable_own_keys(realm)
}

/// `Object.freeze`
pub fn freeze(realm: &Realm, target: &Value) -> ObjectResult<Value> {
    set_level(realm, target, IntegrityLevel::Frozen)
}

/// `Object.seal`
pub fn seal(realm: &Realm, target: &Value) -> ObjectResult<Value> {
    set_level(realm, target, IntegrityLevel::Sealed)
}

fn set_level(realm: &Realm, target: &Value, level: IntegrityLevel) -> ObjectResult<Value> {
    if let Value::Object(obj) = target
        && !obj.set_integrity_level(realm, level)?
    {
        return Err(crate::error::ObjectError::type_error(format!(
            "Cannot {} {target}",
            match level {
                IntegrityLevel::Frozen => "freeze",
                IntegrityLevel::Sealed => "seal",
            }
        )));
    }
    Ok(target.clone())
}

/// `Object.isFrozen`
pub fn is_frozen(realm: &Realm, target: &Value) -> ObjectResult<bool> {
    match target {
        Value::Object(obj) => obj.test_integrity_level(realm, IntegrityLevel::Frozen),
        _ => Ok(true),
    }
}

/// `Object.isSealed`
pub fn is_sealed(realm: &Realm, target: &Value) -> ObjectResult<bool> {
    match target {
        Value::Object(obj) => obj.test_integrity_level(realm, IntegrityLevel::Sealed),
        _ => Ok(true),
    }
}
