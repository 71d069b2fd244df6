//! Objects and their internal methods
//!
//! Every object is a [`JsObject`] behind an [`ObjectRef`] handle. The
//! internal methods (`[[Get]]`, `[[Set]]`, `[[DefineOwnProperty]]`, ...) live
//! on `ObjectRef` and dispatch on [`ObjectKind`]: proxies forward to
//! `proxy_operations`, arrays and host maps override the few methods they
//! specialise, everything else takes the ordinary path.
//!
//! Operations that can be rejected exist in two flavours sharing one
//! implementation: a boolean one (the `Reflect.*` behaviour) and an
//! `*_or_throw` one (the `Object.*` / strict-mode behaviour). The shared core
//! returns a [`Verdict`] and [`OnFailure`] decides how a rejection surfaces.

use crate::array;
use crate::error::{ObjectError, ObjectResult};
use crate::gc::GcRef;
use crate::host;
use crate::host_value::HostMap;
use crate::map_data::MapData;
use crate::object_cell::ObjectCell;
use crate::property::{PartialDescriptor, PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::property_map::PropertyMap;
use crate::proxy::JsProxy;
use crate::proxy_operations as proxy_ops;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Shared handle to an object
pub type ObjectRef = GcRef<JsObject>;

/// Signature of host-native functions: `(realm, this, args)`
pub type NativeFn = Rc<dyn Fn(&Realm, &Value, &[Value]) -> ObjectResult<Value>>;

/// A callable backed by a Rust closure
pub struct NativeFunction {
    pub(crate) name: JsString,
    pub(crate) length: u32,
    pub(crate) func: NativeFn,
}

impl NativeFunction {
    /// Function name
    pub fn name(&self) -> &JsString {
        &self.name
    }

    /// Declared parameter count
    pub fn length(&self) -> u32 {
        self.length
    }
}

/// What an object is, beyond its property table
pub enum ObjectKind {
    /// Plain object
    Ordinary,
    /// Array exotic object
    Array,
    /// Native function
    Function(NativeFunction),
    /// Proxy exotic object
    Proxy(JsProxy),
    /// Boolean/Number/String/Symbol/BigInt wrapper
    Primitive(Value),
    /// `Map` instance
    Map(MapData),
    /// Host map exposed without copying
    HostMap(HostMap),
}

impl fmt::Debug for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ordinary => f.write_str("Ordinary"),
            Self::Array => f.write_str("Array"),
            Self::Function(func) => write!(f, "Function({})", func.name),
            Self::Proxy(proxy) => write!(f, "{proxy:?}"),
            Self::Primitive(value) => write!(f, "Primitive({value:?})"),
            Self::Map(map) => write!(f, "Map(size={})", map.size()),
            Self::HostMap(map) => write!(f, "HostMap(len={})", map.len()),
        }
    }
}

pub(crate) struct ObjectData {
    prototype: Option<ObjectRef>,
    extensible: bool,
    properties: PropertyMap,
}

/// A heap object
pub struct JsObject {
    data: ObjectCell<ObjectData>,
    kind: ObjectKind,
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("JsObject")
            .field("kind", &self.kind)
            .field("properties", &data.properties.len())
            .field("extensible", &data.extensible)
            .finish()
    }
}

/// Why an operation was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Non-writable data property or accessor without setter
    ReadOnly,
    /// New property on a non-extensible object
    NotExtensible,
    /// Change forbidden by a non-configurable property
    NonConfigurable,
    /// `[[Set]]` reached a data property with a primitive receiver
    NotAnObject,
    /// `[[SetPrototypeOf]]` would create a cycle
    PrototypeCycle,
    /// Host maps only hold plain data properties
    HostObject,
    /// A proxy trap reported failure
    TrapFalsish(&'static str),
}

impl Rejection {
    /// The error this rejection becomes on a throwing path
    pub fn into_error(self, key: Option<&PropertyKey>) -> ObjectError {
        let key_text = key.map(ToString::to_string).unwrap_or_default();
        match self {
            Self::ReadOnly => ObjectError::ReadOnlyProperty { key: key_text },
            Self::NotExtensible if key.is_none() => {
                ObjectError::type_error("Object is not extensible")
            }
            Self::NotExtensible => ObjectError::NotExtensible { key: key_text },
            Self::NonConfigurable => ObjectError::NonConfigurable { key: key_text },
            Self::NotAnObject => ObjectError::type_error(format!(
                "Cannot create property '{key_text}' on a primitive receiver"
            )),
            Self::PrototypeCycle => ObjectError::type_error("Cyclic __proto__ value"),
            Self::HostObject => {
                ObjectError::type_error("Host map objects only support plain data properties")
            }
            Self::TrapFalsish(trap) => match key {
                Some(key) => ObjectError::type_error(format!(
                    "'{trap}' on proxy: trap returned falsish for property '{key}'"
                )),
                None => ObjectError::type_error(format!("'{trap}' on proxy: trap returned falsish")),
            },
        }
    }
}

/// Outcome of an operation that may be rejected without an abrupt completion
pub type Verdict = Result<(), Rejection>;

/// How a rejection is reported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnFailure {
    /// Return `false` (`Reflect.*`)
    ReturnFalse,
    /// Return a `TypeError` (`Object.*`, strict assignment)
    Throw,
}

impl OnFailure {
    /// Turn a verdict into the caller-facing result
    pub fn resolve(self, verdict: Verdict, key: Option<&PropertyKey>) -> ObjectResult<bool> {
        match (verdict, self) {
            (Ok(()), _) => Ok(true),
            (Err(_), Self::ReturnFalse) => Ok(false),
            (Err(rejection), Self::Throw) => Err(rejection.into_error(key)),
        }
    }
}

/// Integrity level for `Object.seal` / `Object.freeze`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntegrityLevel {
    /// No additions, no deletions, no reconfiguration
    Sealed,
    /// Sealed, and data properties are read-only
    Frozen,
}

impl JsObject {
    /// Allocate an object
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> ObjectRef {
        GcRef::new(Self {
            data: ObjectCell::new(ObjectData {
                prototype,
                extensible: true,
                properties: PropertyMap::new(),
            }),
            kind,
        })
    }

    /// The object's kind
    #[inline]
    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// `Object.prototype.toString` tag
    pub fn class_name(&self) -> &'static str {
        match &self.kind {
            ObjectKind::Ordinary | ObjectKind::HostMap(_) => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::Function(_) => "Function",
            ObjectKind::Proxy(proxy) if proxy.is_callable() => "Function",
            ObjectKind::Proxy(_) => "Object",
            ObjectKind::Map(_) => "Map",
            ObjectKind::Primitive(Value::Boolean(_)) => "Boolean",
            ObjectKind::Primitive(Value::String(_)) => "String",
            ObjectKind::Primitive(Value::Symbol(_)) => "Symbol",
            ObjectKind::Primitive(Value::BigInt(_)) => "BigInt",
            ObjectKind::Primitive(_) => "Number",
        }
    }

    /// Has a `[[Call]]` internal method
    pub fn is_callable(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(_) => true,
            ObjectKind::Proxy(proxy) => proxy.is_callable(),
            _ => false,
        }
    }

    /// Is an array exotic object (not looking through proxies)
    #[inline]
    pub fn is_array_exotic(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    /// Proxy data, for proxies
    pub fn as_proxy(&self) -> Option<&JsProxy> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Map data, for `Map` instances
    pub fn as_map(&self) -> Option<&MapData> {
        match &self.kind {
            ObjectKind::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Wrapped host map, for host map objects
    pub fn as_host_map(&self) -> Option<&HostMap> {
        match &self.kind {
            ObjectKind::HostMap(map) => Some(map),
            _ => None,
        }
    }

    /// Number of own properties in storage
    pub fn property_count(&self) -> usize {
        self.data.borrow().properties.len()
    }

    /// Prototype as stored, without proxy traps
    pub fn raw_prototype(&self) -> Option<ObjectRef> {
        self.data.borrow().prototype.clone()
    }

    /// Extensible flag as stored, without proxy traps
    pub fn raw_extensible(&self) -> bool {
        self.data.borrow().extensible
    }

    /// Own property as stored, without traps or exotic behaviour
    pub fn own_property_raw(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.data.borrow().properties.get(key).cloned()
    }

    /// Read the property table. `f` must not call back into the engine.
    pub fn with_properties<R>(&self, f: impl FnOnce(&PropertyMap) -> R) -> R {
        self.data.with(|data| f(&data.properties))
    }

    /// Store a property, bypassing validation
    pub(crate) fn store_property(&self, key: PropertyKey, desc: PropertyDescriptor) {
        self.data.borrow_mut().properties.insert(key, desc);
    }

    /// Update a stored property in place
    pub(crate) fn update_property(&self, key: &PropertyKey, f: impl FnOnce(&mut PropertyDescriptor)) {
        if let Some(desc) = self.data.borrow_mut().properties.get_mut(key) {
            f(desc);
        }
    }

    /// Remove a property if it is configurable; false if it is not
    pub(crate) fn remove_configurable(&self, key: &PropertyKey) -> bool {
        let mut data = self.data.borrow_mut();
        match data.properties.get(key) {
            None => true,
            Some(desc) if desc.configurable() => {
                data.properties.remove(key);
                true
            }
            Some(_) => false,
        }
    }

    /// OrdinaryDefineOwnProperty
    pub(crate) fn ordinary_define_own_property(&self, key: &PropertyKey, desc: PartialDescriptor) -> Verdict {
        let mut data = self.data.borrow_mut();
        let next = validate_and_apply(data.extensible, desc, data.properties.get(key))?;
        data.properties.insert(key.clone(), next);
        Ok(())
    }

    fn ordinary_set_prototype_of(&self, proto: Option<ObjectRef>) -> Verdict {
        let mut data = self.data.borrow_mut();
        let unchanged = match (&data.prototype, &proto) {
            (None, None) => true,
            (Some(a), Some(b)) => ObjectRef::ptr_eq(a, b),
            _ => false,
        };
        if unchanged {
            return Ok(());
        }
        if !data.extensible {
            return Err(Rejection::NotExtensible);
        }
        let mut cursor = proto.clone();
        while let Some(p) = cursor {
            if std::ptr::eq(p.as_ptr(), self) {
                return Err(Rejection::PrototypeCycle);
            }
            if p.as_proxy().is_some() {
                break;
            }
            cursor = p.raw_prototype();
        }
        data.prototype = proto;
        Ok(())
    }
}

impl GcRef<JsObject> {
    // ========================================================================
    // [[GetPrototypeOf]] / [[SetPrototypeOf]]
    // ========================================================================

    /// `[[GetPrototypeOf]]`
    pub fn get_prototype_of(&self, realm: &Realm) -> ObjectResult<Option<ObjectRef>> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_get_prototype_of(realm, proxy),
            _ => Ok(self.raw_prototype()),
        }
    }

    /// `[[SetPrototypeOf]]`, reporting rejection as `false`
    pub fn set_prototype_of(&self, realm: &Realm, proto: Option<ObjectRef>) -> ObjectResult<bool> {
        let verdict = self.try_set_prototype_of(realm, proto)?;
        OnFailure::ReturnFalse.resolve(verdict, None)
    }

    pub(crate) fn try_set_prototype_of(&self, realm: &Realm, proto: Option<ObjectRef>) -> ObjectResult<Verdict> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_set_prototype_of(realm, proxy, proto),
            _ => Ok(self.ordinary_set_prototype_of(proto)),
        }
    }

    // ========================================================================
    // [[IsExtensible]] / [[PreventExtensions]]
    // ========================================================================

    /// `[[IsExtensible]]`
    pub fn is_extensible(&self, realm: &Realm) -> ObjectResult<bool> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_is_extensible(realm, proxy),
            _ => Ok(self.raw_extensible()),
        }
    }

    /// `[[PreventExtensions]]`, reporting rejection as `false`
    pub fn prevent_extensions(&self, realm: &Realm) -> ObjectResult<bool> {
        let verdict = self.try_prevent_extensions(realm)?;
        OnFailure::ReturnFalse.resolve(verdict, None)
    }

    /// `[[PreventExtensions]]`, reporting rejection as a `TypeError`
    pub fn prevent_extensions_or_throw(&self, realm: &Realm) -> ObjectResult<()> {
        let verdict = self.try_prevent_extensions(realm)?;
        OnFailure::Throw.resolve(verdict, None).map(drop)
    }

    pub(crate) fn try_prevent_extensions(&self, realm: &Realm) -> ObjectResult<Verdict> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_prevent_extensions(realm, proxy),
            ObjectKind::HostMap(_) => Ok(Err(Rejection::HostObject)),
            _ => {
                self.data.borrow_mut().extensible = false;
                Ok(Ok(()))
            }
        }
    }

    // ========================================================================
    // [[GetOwnProperty]] / [[DefineOwnProperty]]
    // ========================================================================

    /// `[[GetOwnProperty]]`
    pub fn get_own_property(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<Option<PropertyDescriptor>> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_get_own_property(realm, proxy, key),
            ObjectKind::HostMap(map) => Ok(host::host_map_get_own_property(realm, map, key)),
            _ => Ok(self.own_property_raw(key)),
        }
    }

    /// `[[DefineOwnProperty]]`, reporting rejection as `false`
    pub fn define_own_property(&self, realm: &Realm, key: &PropertyKey, desc: PartialDescriptor) -> ObjectResult<bool> {
        let verdict = self.try_define_own_property(realm, key, desc)?;
        OnFailure::ReturnFalse.resolve(verdict, Some(key))
    }

    /// DefinePropertyOrThrow
    pub fn define_property_or_throw(&self, realm: &Realm, key: &PropertyKey, desc: PartialDescriptor) -> ObjectResult<()> {
        let verdict = self.try_define_own_property(realm, key, desc)?;
        OnFailure::Throw.resolve(verdict, Some(key)).map(drop)
    }

    pub(crate) fn try_define_own_property(
        &self,
        realm: &Realm,
        key: &PropertyKey,
        desc: PartialDescriptor,
    ) -> ObjectResult<Verdict> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_define_own_property(realm, proxy, key, desc),
            ObjectKind::Array => array::array_define_own_property(self, key, desc),
            ObjectKind::HostMap(map) => host::host_map_define_own_property(realm, map, key, desc),
            _ => Ok(self.ordinary_define_own_property(key, desc)),
        }
    }

    /// CreateDataProperty, reporting rejection as `false`
    pub fn create_data_property(&self, realm: &Realm, key: &PropertyKey, value: Value) -> ObjectResult<bool> {
        self.define_own_property(realm, key, PartialDescriptor::data(value, PropertyAttributes::data()))
    }

    // ========================================================================
    // [[HasProperty]] / [[Get]] / [[Set]] / [[Delete]]
    // ========================================================================

    /// `[[HasProperty]]`
    pub fn has_property(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<bool> {
        let mut current = self.clone();
        loop {
            if let ObjectKind::Proxy(proxy) = current.kind() {
                return proxy_ops::proxy_has(realm, proxy, key);
            }
            if current.get_own_property(realm, key)?.is_some() {
                return Ok(true);
            }
            match current.get_prototype_of(realm)? {
                Some(proto) => current = proto,
                None => return Ok(false),
            }
        }
    }

    /// HasOwnProperty
    pub fn has_own_property(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<bool> {
        Ok(self.get_own_property(realm, key)?.is_some())
    }

    /// `[[Get]]` with this object as the receiver
    pub fn get(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<Value> {
        self.get_with_receiver(realm, key, &Value::Object(self.clone()))
    }

    /// `[[Get]]`
    pub fn get_with_receiver(&self, realm: &Realm, key: &PropertyKey, receiver: &Value) -> ObjectResult<Value> {
        let mut current = self.clone();
        loop {
            if let ObjectKind::Proxy(proxy) = current.kind() {
                return proxy_ops::proxy_get(realm, proxy, key, receiver);
            }
            match current.get_own_property(realm, key)? {
                Some(PropertyDescriptor::Data { value, .. }) => return Ok(value),
                Some(PropertyDescriptor::Accessor { get, .. }) => {
                    return match get {
                        Some(getter) => realm.call(&getter, receiver, &[]),
                        None => Ok(Value::undefined()),
                    };
                }
                None => match current.get_prototype_of(realm)? {
                    Some(proto) => current = proto,
                    None => return Ok(Value::undefined()),
                },
            }
        }
    }

    /// `[[Set]]` with this object as the receiver, reporting rejection as `false`
    pub fn set(&self, realm: &Realm, key: &PropertyKey, value: Value) -> ObjectResult<bool> {
        self.set_with(realm, key, value, &Value::Object(self.clone()), OnFailure::ReturnFalse)
    }

    /// `[[Set]]` with this object as the receiver, as a strict-mode assignment
    pub fn set_or_throw(&self, realm: &Realm, key: &PropertyKey, value: Value) -> ObjectResult<()> {
        self.set_with(realm, key, value, &Value::Object(self.clone()), OnFailure::Throw)
            .map(drop)
    }

    /// `[[Set]]`
    pub fn set_with(
        &self,
        realm: &Realm,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
        on_failure: OnFailure,
    ) -> ObjectResult<bool> {
        let verdict = self.try_set(realm, key, value, receiver)?;
        on_failure.resolve(verdict, Some(key))
    }

    pub(crate) fn try_set(&self, realm: &Realm, key: &PropertyKey, value: Value, receiver: &Value) -> ObjectResult<Verdict> {
        // Own writable data property on a plain receiver: update in place.
        if matches!(self.kind, ObjectKind::Ordinary)
            && receiver.as_object().is_some_and(|r| ObjectRef::ptr_eq(r, self))
        {
            let mut data = self.data.borrow_mut();
            if let Some(PropertyDescriptor::Data { value: slot, attributes }) = data.properties.get_mut(key)
                && attributes.writable
            {
                *slot = value;
                return Ok(Ok(()));
            }
        }

        let mut current = self.clone();
        let own = loop {
            if let ObjectKind::Proxy(proxy) = current.kind() {
                return proxy_ops::proxy_set(realm, proxy, key, value, receiver);
            }
            if let Some(desc) = current.get_own_property(realm, key)? {
                break desc;
            }
            match current.get_prototype_of(realm)? {
                Some(proto) => current = proto,
                None => break PropertyDescriptor::data(Value::undefined()),
            }
        };
        ordinary_set_with_own_descriptor(realm, key, value, receiver, own)
    }

    /// `[[Delete]]`, reporting a non-configurable property as `false`
    pub fn delete(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<bool> {
        let verdict = self.try_delete(realm, key)?;
        OnFailure::ReturnFalse.resolve(verdict, Some(key))
    }

    /// `[[Delete]]` as a strict-mode `delete`
    pub fn delete_or_throw(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<()> {
        let verdict = self.try_delete(realm, key)?;
        match verdict {
            Ok(()) => Ok(()),
            Err(_) => Err(ObjectError::type_error(format!(
                "Cannot delete property '{key}' of {}",
                Value::Object(self.clone())
            ))),
        }
    }

    pub(crate) fn try_delete(&self, realm: &Realm, key: &PropertyKey) -> ObjectResult<Verdict> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_delete(realm, proxy, key),
            ObjectKind::HostMap(map) => {
                host::host_map_delete(map, key);
                Ok(Ok(()))
            }
            _ => {
                if self.remove_configurable(key) {
                    Ok(Ok(()))
                } else {
                    Ok(Err(Rejection::NonConfigurable))
                }
            }
        }
    }

    // ========================================================================
    // [[OwnPropertyKeys]] and friends
    // ========================================================================

    /// `[[OwnPropertyKeys]]`
    pub fn own_keys(&self, realm: &Realm) -> ObjectResult<Vec<PropertyKey>> {
        match &self.kind {
            ObjectKind::Proxy(proxy) => proxy_ops::proxy_own_keys(realm, proxy),
            ObjectKind::HostMap(map) => Ok(host::host_map_own_keys(map)),
            _ => Ok(self.with_properties(PropertyMap::keys)),
        }
    }

    /// Own enumerable string-keyed properties, in order (`Object.keys`)
    pub fn enumerable_own_keys(&self, realm: &Realm) -> ObjectResult<Vec<PropertyKey>> {
        let mut keys = Vec::new();
        for key in self.own_keys(realm)? {
            if key.is_symbol() {
                continue;
            }
            if let Some(desc) = self.get_own_property(realm, &key)?
                && desc.enumerable()
            {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// IsArray, looking through proxies
    pub fn is_array(&self) -> ObjectResult<bool> {
        match &self.kind {
            ObjectKind::Array => Ok(true),
            ObjectKind::Proxy(proxy) => proxy.target()?.is_array(),
            _ => Ok(false),
        }
    }

    /// `[[Call]]`
    pub fn call(&self, realm: &Realm, this: &Value, args: &[Value]) -> ObjectResult<Value> {
        match &self.kind {
            ObjectKind::Function(func) => (func.func)(realm, this, args),
            ObjectKind::Proxy(proxy) if proxy.is_callable() => proxy_ops::proxy_call(realm, proxy, this, args),
            _ => Err(ObjectError::type_error(format!(
                "{} is not a function",
                Value::Object(self.clone())
            ))),
        }
    }

    // ========================================================================
    // Integrity levels
    // ========================================================================

    /// SetIntegrityLevel
    pub fn set_integrity_level(&self, realm: &Realm, level: IntegrityLevel) -> ObjectResult<bool> {
        if !self.prevent_extensions(realm)? {
            return Ok(false);
        }
        for key in self.own_keys(realm)? {
            let desc = match level {
                IntegrityLevel::Sealed => PartialDescriptor {
                    configurable: Some(false),
                    ..PartialDescriptor::default()
                },
                IntegrityLevel::Frozen => match self.get_own_property(realm, &key)? {
                    None => continue,
                    Some(current) if current.is_accessor() => PartialDescriptor {
                        configurable: Some(false),
                        ..PartialDescriptor::default()
                    },
                    Some(_) => PartialDescriptor {
                        configurable: Some(false),
                        writable: Some(false),
                        ..PartialDescriptor::default()
                    },
                },
            };
            self.define_property_or_throw(realm, &key, desc)?;
        }
        Ok(true)
    }

    /// TestIntegrityLevel
    pub fn test_integrity_level(&self, realm: &Realm, level: IntegrityLevel) -> ObjectResult<bool> {
        if self.is_extensible(realm)? {
            return Ok(false);
        }
        for key in self.own_keys(realm)? {
            if let Some(desc) = self.get_own_property(realm, &key)? {
                if desc.configurable() {
                    return Ok(false);
                }
                if level == IntegrityLevel::Frozen && desc.writable() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// OrdinarySetWithOwnDescriptor, once the owning descriptor has been found
fn ordinary_set_with_own_descriptor(
    realm: &Realm,
    key: &PropertyKey,
    value: Value,
    receiver: &Value,
    own: PropertyDescriptor,
) -> ObjectResult<Verdict> {
    match own {
        PropertyDescriptor::Data { attributes, .. } => {
            if !attributes.writable {
                return Ok(Err(Rejection::ReadOnly));
            }
            let Value::Object(target) = receiver else {
                return Ok(Err(Rejection::NotAnObject));
            };
            match target.get_own_property(realm, key)? {
                Some(existing) => {
                    if existing.is_accessor() || !existing.writable() {
                        return Ok(Err(Rejection::ReadOnly));
                    }
                    target.try_define_own_property(realm, key, PartialDescriptor::value_only(value))
                }
                None => target.try_define_own_property(
                    realm,
                    key,
                    PartialDescriptor::data(value, PropertyAttributes::data()),
                ),
            }
        }
        PropertyDescriptor::Accessor { set, .. } => match set {
            Some(setter) => {
                realm.call(&setter, receiver, &[value])?;
                Ok(Ok(()))
            }
            None => Ok(Err(Rejection::ReadOnly)),
        },
    }
}

/// ValidateAndApplyPropertyDescriptor.
///
/// Returns the descriptor to store, or why `desc` may not be applied over
/// `current`. Pure; also used as IsCompatiblePropertyDescriptor by proxies.
pub fn validate_and_apply(
    extensible: bool,
    desc: PartialDescriptor,
    current: Option<&PropertyDescriptor>,
) -> Result<PropertyDescriptor, Rejection> {
    let Some(current) = current else {
        if !extensible {
            return Err(Rejection::NotExtensible);
        }
        return Ok(desc.complete());
    };
    if desc.is_empty() {
        return Ok(current.clone());
    }

    let attrs = current.attributes();
    if !attrs.configurable {
        if desc.configurable == Some(true) {
            return Err(Rejection::NonConfigurable);
        }
        if desc.enumerable.is_some_and(|e| e != attrs.enumerable) {
            return Err(Rejection::NonConfigurable);
        }
        if !desc.is_generic() && desc.is_accessor() != current.is_accessor() {
            return Err(Rejection::NonConfigurable);
        }
        match current {
            PropertyDescriptor::Accessor { get, set, .. } => {
                if desc.get.as_ref().is_some_and(|g| !same_function(g, get.as_ref())) {
                    return Err(Rejection::NonConfigurable);
                }
                if desc.set.as_ref().is_some_and(|s| !same_function(s, set.as_ref())) {
                    return Err(Rejection::NonConfigurable);
                }
            }
            PropertyDescriptor::Data { value, attributes } => {
                if !attributes.writable {
                    if desc.writable == Some(true) {
                        return Err(Rejection::NonConfigurable);
                    }
                    if desc.value.as_ref().is_some_and(|v| !Value::same_value(v, value)) {
                        return Err(Rejection::NonConfigurable);
                    }
                }
            }
        }
    }

    let enumerable = desc.enumerable.unwrap_or(attrs.enumerable);
    let configurable = desc.configurable.unwrap_or(attrs.configurable);
    let next = match current {
        PropertyDescriptor::Data { .. } if desc.is_accessor() => {
            PropertyDescriptor::accessor(desc.get, desc.set, enumerable, configurable)
        }
        PropertyDescriptor::Accessor { .. } if desc.is_data() => PropertyDescriptor::Data {
            value: desc.value.unwrap_or_default(),
            attributes: PropertyAttributes::new(desc.writable.unwrap_or(false), enumerable, configurable),
        },
        PropertyDescriptor::Data { value, attributes } => PropertyDescriptor::Data {
            value: desc.value.unwrap_or_else(|| value.clone()),
            attributes: PropertyAttributes::new(
                desc.writable.unwrap_or(attributes.writable),
                enumerable,
                configurable,
            ),
        },
        PropertyDescriptor::Accessor { get, set, .. } => PropertyDescriptor::accessor(
            desc.get.or_else(|| get.clone()),
            desc.set.or_else(|| set.clone()),
            enumerable,
            configurable,
        ),
    };
    Ok(next)
}

fn same_function(candidate: &Value, current: Option<&Value>) -> bool {
    match current {
        Some(current) => Value::same_value(candidate, current),
        None => candidate.is_undefined(),
    }
}
