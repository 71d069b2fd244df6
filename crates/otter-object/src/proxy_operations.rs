//! Proxy internal methods.
//!
//! Each operation looks up its trap on the handler. A missing trap
//! (`undefined` or `null`) forwards the operation unchanged to the target,
//! which may itself be a proxy. A present trap is called with the handler as
//! `this` and `(target, ...args)`, and its result is validated against the
//! target so a proxy can never report something the target contradicts.

use crate::error::{ObjectError, ObjectResult};
use crate::object::{ObjectRef, Rejection, Verdict, validate_and_apply};
use crate::property::{PartialDescriptor, PropertyDescriptor, PropertyKey};
use crate::proxy::JsProxy;
use crate::realm::Realm;
use crate::reflect::{from_property_descriptor, to_property_descriptor};
use crate::value::Value;
use rustc_hash::FxHashSet;
use tracing::trace;

/// Invoke a trap on a proxy handler
///
/// Returns:
/// - `Ok(Some(value))` if the trap exists and was called successfully
/// - `Ok(None)` if the trap doesn't exist (caller should forward to the target)
/// - `Err(...)` if the proxy is revoked, the trap isn't callable, or it threw
fn invoke_trap(realm: &Realm, proxy: &JsProxy, trap_name: &'static str, args: &[Value]) -> ObjectResult<Option<Value>> {
    let handler = proxy.handler().map_err(|_| {
        ObjectError::type_error(format!(
            "Cannot perform '{trap_name}' on a proxy that has been revoked"
        ))
    })?;
    let trap = handler.get(realm, &PropertyKey::string(trap_name))?;

    if trap.is_nullish() {
        trace!(target: "otter::proxy", trap = trap_name, "no trap, forwarding to target");
        return Ok(None);
    }
    if !trap.is_callable() {
        return Err(ObjectError::type_error(format!(
            "Proxy handler's '{trap_name}' trap must be a function"
        )));
    }

    trace!(target: "otter::proxy", trap = trap_name, "invoking trap");
    realm.call(&trap, &Value::Object(handler), args).map(Some)
}

fn same_prototype(a: &Option<ObjectRef>, b: &Option<ObjectRef>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => ObjectRef::ptr_eq(a, b),
        _ => false,
    }
}

fn prototype_value(proto: &Option<ObjectRef>) -> Value {
    proto.clone().map_or(Value::null(), Value::Object)
}

// ============================================================================
// [[GetPrototypeOf]] / [[SetPrototypeOf]]
// ============================================================================

/// `[[GetPrototypeOf]]` of a proxy
pub(crate) fn proxy_get_prototype_of(realm: &Realm, proxy: &JsProxy) -> ObjectResult<Option<ObjectRef>> {
    let target = proxy.target()?;
    let Some(result) = invoke_trap(realm, proxy, "getPrototypeOf", &[Value::Object(target.clone())])? else {
        return target.get_prototype_of(realm);
    };

    let proto = match result {
        Value::Object(obj) => Some(obj),
        Value::Null => None,
        _ => {
            return Err(ObjectError::type_error(
                "'getPrototypeOf' on proxy: trap returned neither object nor null",
            ));
        }
    };

    if target.is_extensible(realm)? {
        return Ok(proto);
    }
    if !same_prototype(&proto, &target.get_prototype_of(realm)?) {
        return Err(ObjectError::type_error(
            "'getPrototypeOf' on proxy: proxy target is non-extensible but the trap did not return its actual prototype",
        ));
    }
    Ok(proto)
}

/// `[[SetPrototypeOf]]` of a proxy
pub(crate) fn proxy_set_prototype_of(realm: &Realm, proxy: &JsProxy, proto: Option<ObjectRef>) -> ObjectResult<Verdict> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), prototype_value(&proto)];
    let Some(result) = invoke_trap(realm, proxy, "setPrototypeOf", &args)? else {
        return target.try_set_prototype_of(realm, proto);
    };

    if !result.to_boolean() {
        return Ok(Err(Rejection::TrapFalsish("setPrototypeOf")));
    }
    if target.is_extensible(realm)? {
        return Ok(Ok(()));
    }
    if !same_prototype(&proto, &target.get_prototype_of(realm)?) {
        return Err(ObjectError::type_error(
            "'setPrototypeOf' on proxy: trap returned truish for setting a new prototype on the non-extensible proxy target",
        ));
    }
    Ok(Ok(()))
}

// ============================================================================
// [[IsExtensible]] / [[PreventExtensions]]
// ============================================================================

/// `[[IsExtensible]]` of a proxy
pub(crate) fn proxy_is_extensible(realm: &Realm, proxy: &JsProxy) -> ObjectResult<bool> {
    let target = proxy.target()?;
    let Some(result) = invoke_trap(realm, proxy, "isExtensible", &[Value::Object(target.clone())])? else {
        return target.is_extensible(realm);
    };

    let reported = result.to_boolean();
    let actual = target.is_extensible(realm)?;
    if reported != actual {
        return Err(ObjectError::type_error(format!(
            "'isExtensible' on proxy: trap result does not reflect extensibility of proxy target (which is '{actual}')"
        )));
    }
    Ok(reported)
}

/// `[[PreventExtensions]]` of a proxy
pub(crate) fn proxy_prevent_extensions(realm: &Realm, proxy: &JsProxy) -> ObjectResult<Verdict> {
    let target = proxy.target()?;
    let Some(result) = invoke_trap(realm, proxy, "preventExtensions", &[Value::Object(target.clone())])? else {
        return target.try_prevent_extensions(realm);
    };

    if !result.to_boolean() {
        return Ok(Err(Rejection::TrapFalsish("preventExtensions")));
    }
    if target.is_extensible(realm)? {
        return Err(ObjectError::type_error(
            "'preventExtensions' on proxy: trap returned truish but the proxy target is extensible",
        ));
    }
    Ok(Ok(()))
}

// ============================================================================
// [[GetOwnProperty]] / [[DefineOwnProperty]]
// ============================================================================

/// `[[GetOwnProperty]]` of a proxy.
///
/// A trap returning `undefined` reports the property as absent, which is
/// allowed unless the target has it as non-configurable or is non-extensible.
pub(crate) fn proxy_get_own_property(
    realm: &Realm,
    proxy: &JsProxy,
    key: &PropertyKey,
) -> ObjectResult<Option<PropertyDescriptor>> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), key.to_value()];
    let Some(result) = invoke_trap(realm, proxy, "getOwnPropertyDescriptor", &args)? else {
        return target.get_own_property(realm, key);
    };

    if !result.is_object() && !result.is_undefined() {
        return Err(ObjectError::type_error(format!(
            "'getOwnPropertyDescriptor' on proxy: trap returned neither object nor undefined for property '{key}'"
        )));
    }
    let target_desc = target.get_own_property(realm, key)?;

    if result.is_undefined() {
        let Some(target_desc) = target_desc else {
            return Ok(None);
        };
        if !target_desc.configurable() {
            return Err(ObjectError::type_error(format!(
                "'getOwnPropertyDescriptor' on proxy: trap returned undefined for property '{key}' which is non-configurable in the proxy target"
            )));
        }
        if !target.is_extensible(realm)? {
            return Err(ObjectError::type_error(format!(
                "'getOwnPropertyDescriptor' on proxy: trap returned undefined for property '{key}' which exists in the non-extensible proxy target"
            )));
        }
        return Ok(None);
    }

    let extensible = target.is_extensible(realm)?;
    let reported = to_property_descriptor(realm, &result)?;
    let explicit_non_writable = reported.writable == Some(false);
    let complete = reported.complete();

    if validate_and_apply(extensible, PartialDescriptor::from(complete.clone()), target_desc.as_ref()).is_err() {
        return Err(ObjectError::type_error(format!(
            "'getOwnPropertyDescriptor' on proxy: trap returned descriptor for property '{key}' that is incompatible with the existing property in the proxy target"
        )));
    }
    if !complete.configurable() {
        match &target_desc {
            Some(td) if !td.configurable() => {
                if explicit_non_writable && td.writable() {
                    return Err(ObjectError::type_error(format!(
                        "'getOwnPropertyDescriptor' on proxy: trap reported non-configurable and writable for property '{key}' which is non-configurable, non-writable in the proxy target"
                    )));
                }
            }
            _ => {
                return Err(ObjectError::type_error(format!(
                    "'getOwnPropertyDescriptor' on proxy: trap reported non-configurability for property '{key}' which is either non-existent or configurable in the proxy target"
                )));
            }
        }
    }
    Ok(Some(complete))
}

/// `[[DefineOwnProperty]]` of a proxy
pub(crate) fn proxy_define_own_property(
    realm: &Realm,
    proxy: &JsProxy,
    key: &PropertyKey,
    desc: PartialDescriptor,
) -> ObjectResult<Verdict> {
    let target = proxy.target()?;
    let desc_obj = from_property_descriptor(realm, &desc);
    let args = [Value::Object(target.clone()), key.to_value(), Value::Object(desc_obj)];
    let Some(result) = invoke_trap(realm, proxy, "defineProperty", &args)? else {
        return target.try_define_own_property(realm, key, desc);
    };

    if !result.to_boolean() {
        return Ok(Err(Rejection::TrapFalsish("defineProperty")));
    }

    let target_desc = target.get_own_property(realm, key)?;
    let extensible = target.is_extensible(realm)?;
    let setting_non_configurable = desc.configurable == Some(false);

    match target_desc {
        None => {
            if !extensible {
                return Err(ObjectError::type_error(format!(
                    "'defineProperty' on proxy: trap returned truish for adding property '{key}' to the non-extensible proxy target"
                )));
            }
            if setting_non_configurable {
                return Err(ObjectError::type_error(format!(
                    "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which is either non-existent or configurable in the proxy target"
                )));
            }
        }
        Some(td) => {
            let writable_to_read_only = !td.is_accessor() && !td.configurable() && td.writable() && desc.writable == Some(false);
            if validate_and_apply(extensible, desc, Some(&td)).is_err() {
                return Err(ObjectError::type_error(format!(
                    "'defineProperty' on proxy: trap returned truish for adding property '{key}' that is incompatible with the existing property in the proxy target"
                )));
            }
            if setting_non_configurable && td.configurable() {
                return Err(ObjectError::type_error(format!(
                    "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which is either non-existent or configurable in the proxy target"
                )));
            }
            if writable_to_read_only {
                return Err(ObjectError::type_error(format!(
                    "'defineProperty' on proxy: trap returned truish for defining non-configurable property '{key}' which cannot be non-writable, unless there exists a corresponding non-configurable, non-writable own property of the target object"
                )));
            }
        }
    }
    Ok(Ok(()))
}

// ============================================================================
// [[HasProperty]] / [[Get]] / [[Set]] / [[Delete]]
// ============================================================================

/// `[[HasProperty]]` of a proxy
pub(crate) fn proxy_has(realm: &Realm, proxy: &JsProxy, key: &PropertyKey) -> ObjectResult<bool> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), key.to_value()];
    let Some(result) = invoke_trap(realm, proxy, "has", &args)? else {
        return target.has_property(realm, key);
    };

    let present = result.to_boolean();
    if !present && let Some(td) = target.get_own_property(realm, key)? {
        if !td.configurable() {
            return Err(ObjectError::type_error(format!(
                "'has' on proxy: trap returned falsish for property '{key}' which exists in the proxy target as non-configurable"
            )));
        }
        if !target.is_extensible(realm)? {
            return Err(ObjectError::type_error(format!(
                "'has' on proxy: trap returned falsish for property '{key}' but the proxy target is not extensible"
            )));
        }
    }
    Ok(present)
}

/// `[[Get]]` of a proxy
pub(crate) fn proxy_get(realm: &Realm, proxy: &JsProxy, key: &PropertyKey, receiver: &Value) -> ObjectResult<Value> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), key.to_value(), receiver.clone()];
    let Some(result) = invoke_trap(realm, proxy, "get", &args)? else {
        return target.get_with_receiver(realm, key, receiver);
    };

    match target.get_own_property(realm, key)? {
        Some(PropertyDescriptor::Data { value, attributes })
            if !attributes.configurable && !attributes.writable && !Value::same_value(&result, &value) =>
        {
            Err(ObjectError::type_error(format!(
                "'get' on proxy: property '{key}' is a read-only and non-configurable data property on the proxy target but the proxy did not return its actual value"
            )))
        }
        Some(PropertyDescriptor::Accessor { get: None, attributes, .. })
            if !attributes.configurable && !result.is_undefined() =>
        {
            Err(ObjectError::type_error(format!(
                "'get' on proxy: property '{key}' is a non-configurable accessor property on the proxy target and does not have a getter function, but the trap did not return 'undefined'"
            )))
        }
        _ => Ok(result),
    }
}

/// `[[Set]]` of a proxy
pub(crate) fn proxy_set(
    realm: &Realm,
    proxy: &JsProxy,
    key: &PropertyKey,
    value: Value,
    receiver: &Value,
) -> ObjectResult<Verdict> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), key.to_value(), value.clone(), receiver.clone()];
    let Some(result) = invoke_trap(realm, proxy, "set", &args)? else {
        return target.try_set(realm, key, value, receiver);
    };

    if !result.to_boolean() {
        return Ok(Err(Rejection::TrapFalsish("set")));
    }

    match target.get_own_property(realm, key)? {
        Some(PropertyDescriptor::Data { value: target_value, attributes })
            if !attributes.configurable && !attributes.writable && !Value::same_value(&value, &target_value) =>
        {
            Err(ObjectError::type_error(format!(
                "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable and non-writable data property with a different value"
            )))
        }
        Some(PropertyDescriptor::Accessor { set: None, attributes, .. }) if !attributes.configurable => {
            Err(ObjectError::type_error(format!(
                "'set' on proxy: trap returned truish for property '{key}' which exists in the proxy target as a non-configurable and writable accessor property without a setter"
            )))
        }
        _ => Ok(Ok(())),
    }
}

/// `[[Delete]]` of a proxy
pub(crate) fn proxy_delete(realm: &Realm, proxy: &JsProxy, key: &PropertyKey) -> ObjectResult<Verdict> {
    let target = proxy.target()?;
    let args = [Value::Object(target.clone()), key.to_value()];
    let Some(result) = invoke_trap(realm, proxy, "deleteProperty", &args)? else {
        return target.try_delete(realm, key);
    };

    if !result.to_boolean() {
        return Ok(Err(Rejection::TrapFalsish("deleteProperty")));
    }

    let Some(td) = target.get_own_property(realm, key)? else {
        return Ok(Ok(()));
    };
    if !td.configurable() {
        return Err(ObjectError::type_error(format!(
            "'deleteProperty' on proxy: trap returned truish for property '{key}' which is non-configurable in the proxy target"
        )));
    }
    if !target.is_extensible(realm)? {
        return Err(ObjectError::type_error(format!(
            "'deleteProperty' on proxy: trap returned truish for property '{key}' but the proxy target is non-extensible"
        )));
    }
    Ok(Ok(()))
}

// ============================================================================
// [[OwnPropertyKeys]]
// ============================================================================

/// `[[OwnPropertyKeys]]` of a proxy
pub(crate) fn proxy_own_keys(realm: &Realm, proxy: &JsProxy) -> ObjectResult<Vec<PropertyKey>> {
    let target = proxy.target()?;
    let Some(result) = invoke_trap(realm, proxy, "ownKeys", &[Value::Object(target.clone())])? else {
        return target.own_keys(realm);
    };

    let keys = property_keys_from_array_like(realm, &result)?;
    let mut unchecked: FxHashSet<PropertyKey> = FxHashSet::default();
    for key in &keys {
        if !unchecked.insert(key.clone()) {
            return Err(ObjectError::type_error(format!(
                "'ownKeys' on proxy: trap returned duplicate entries ('{key}')"
            )));
        }
    }

    let extensible = target.is_extensible(realm)?;
    let mut configurable_keys = Vec::new();
    let mut non_configurable_keys = Vec::new();
    for key in target.own_keys(realm)? {
        match target.get_own_property(realm, &key)? {
            Some(desc) if !desc.configurable() => non_configurable_keys.push(key),
            _ => configurable_keys.push(key),
        }
    }

    if extensible && non_configurable_keys.is_empty() {
        return Ok(keys);
    }
    for key in &non_configurable_keys {
        if !unchecked.remove(key) {
            return Err(ObjectError::type_error(format!(
                "'ownKeys' on proxy: trap result did not include '{key}'"
            )));
        }
    }
    if extensible {
        return Ok(keys);
    }
    for key in &configurable_keys {
        if !unchecked.remove(key) {
            return Err(ObjectError::type_error(format!(
                "'ownKeys' on proxy: trap result did not include '{key}'"
            )));
        }
    }
    if !unchecked.is_empty() {
        return Err(ObjectError::type_error(
            "'ownKeys' on proxy: trap returned extra keys but proxy target is non-extensible",
        ));
    }
    Ok(keys)
}

/// CreateListFromArrayLike restricted to strings and symbols
fn property_keys_from_array_like(realm: &Realm, list: &Value) -> ObjectResult<Vec<PropertyKey>> {
    let Value::Object(list) = list else {
        return Err(ObjectError::type_error(format!(
            "CreateListFromArrayLike called on non-object ({list})"
        )));
    };
    let length = realm.length_of_array_like(list)?;
    let mut keys = Vec::with_capacity(length as usize);
    for index in 0..length {
        let element = list.get(realm, &PropertyKey::from_number(index as f64))?;
        match element {
            Value::String(s) => keys.push(PropertyKey::from(s)),
            Value::Symbol(sym) => keys.push(PropertyKey::Symbol(sym)),
            other => {
                return Err(ObjectError::type_error(format!(
                    "{other} is not a valid property name"
                )));
            }
        }
    }
    Ok(keys)
}

// ============================================================================
// [[Call]]
// ============================================================================

/// `[[Call]]` of a proxy over a callable target
pub(crate) fn proxy_call(realm: &Realm, proxy: &JsProxy, this: &Value, args: &[Value]) -> ObjectResult<Value> {
    let target = proxy.target()?;
    let arg_array = realm.create_array(args.to_vec());
    let trap_args = [Value::Object(target.clone()), this.clone(), Value::Object(arg_array)];
    match invoke_trap(realm, proxy, "apply", &trap_args)? {
        Some(result) => Ok(result),
        None => target.call(realm, this, args),
    }
}
