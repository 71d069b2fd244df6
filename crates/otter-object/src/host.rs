//! Host embedding surface.
//!
//! [`Object`] is a realm-bound handle for host code: convenience accessors
//! routed through the internal methods, the `DefineDataProperty` /
//! `DefineAccessorProperty` helpers with tri-state flags, and export.
//!
//! Host maps handed to [`Realm::to_value`] are wrapped, not copied: the
//! wrapper object reads and writes the host map directly. A realm hands out
//! one wrapper per host map for as long as that wrapper is alive.

use crate::error::{ObjectError, ObjectResult};
use crate::export::FromJs;
use crate::gc::WeakRef;
use crate::host_value::{HostFunction, HostMap, HostValue};
use crate::object::{JsObject, ObjectKind, ObjectRef, Rejection, Verdict};
use crate::property::{PartialDescriptor, PropertyDescriptor, PropertyKey};
use crate::realm::Realm;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::fmt;

// ============================================================================
// Host map objects
// ============================================================================

fn host_key(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::Symbol(_) => None,
        other => Some(other.to_string()),
    }
}

pub(crate) fn host_map_get_own_property(realm: &Realm, map: &HostMap, key: &PropertyKey) -> Option<PropertyDescriptor> {
    let value = map.get(&host_key(key)?)?;
    Some(PropertyDescriptor::data(realm.to_value(&value)))
}

/// Host maps only hold enumerable, writable, configurable data entries
pub(crate) fn host_map_define_own_property(
    realm: &Realm,
    map: &HostMap,
    key: &PropertyKey,
    desc: PartialDescriptor,
) -> ObjectResult<Verdict> {
    let Some(name) = host_key(key) else {
        return Ok(Err(Rejection::HostObject));
    };
    let restricted = [desc.writable, desc.enumerable, desc.configurable]
        .iter()
        .any(|flag| *flag == Some(false));
    if desc.is_accessor() || restricted {
        return Ok(Err(Rejection::HostObject));
    }

    match desc.value {
        Some(value) => {
            let exported = realm.export(&value)?;
            map.insert(name, exported);
        }
        None if !map.contains_key(&name) => {
            map.insert(name, HostValue::Undefined);
        }
        None => {}
    }
    Ok(Ok(()))
}

pub(crate) fn host_map_delete(map: &HostMap, key: &PropertyKey) {
    if let Some(name) = host_key(key) {
        map.remove(&name);
    }
}

/// Entries in insertion order, with index-like names as index keys
pub(crate) fn host_map_own_keys(map: &HostMap) -> Vec<PropertyKey> {
    map.keys().iter().map(|name| PropertyKey::string(name)).collect()
}

/// Live wrapper objects of a realm, keyed by host map address
#[derive(Debug)]
pub(crate) struct HostWrappers {
    live: FxHashMap<usize, WeakRef<JsObject>>,
    prune_at: usize,
}

impl Default for HostWrappers {
    fn default() -> Self {
        Self {
            live: FxHashMap::default(),
            prune_at: 32,
        }
    }
}

impl HostWrappers {
    fn get(&self, map: &HostMap) -> Option<ObjectRef> {
        self.live.get(&map.addr()).and_then(WeakRef::upgrade)
    }

    fn insert(&mut self, map: &HostMap, wrapper: &ObjectRef) {
        if self.live.len() >= self.prune_at {
            self.live.retain(|_, weak| !weak.is_dead());
            self.prune_at = (self.live.len() * 2).max(32);
        }
        self.live.insert(map.addr(), wrapper.downgrade());
    }
}

// ============================================================================
// Realm entry points
// ============================================================================

impl Realm {
    /// Empty extensible object
    pub fn new_object(&self) -> Object {
        Object::new(self, self.create_object())
    }

    /// Array holding the converted `items`
    pub fn new_array(&self, items: Vec<HostValue>) -> Object {
        let elements = items.iter().map(|item| self.to_value(item)).collect();
        Object::new(self, self.create_array(elements))
    }

    /// Native function
    pub fn new_function<F>(&self, name: &str, length: u32, func: F) -> Object
    where
        F: Fn(&Realm, &Value, &[Value]) -> ObjectResult<Value> + 'static,
    {
        Object::new(self, self.create_function(name, length, func))
    }

    /// `new Proxy(target, handler)`
    pub fn new_proxy(&self, target: &Object, handler: &Object) -> ObjectResult<Object> {
        let proxy = self.create_proxy(&target.value(), &handler.value())?;
        Ok(Object::new(self, proxy))
    }

    /// Host value to script value.
    ///
    /// Host maps become wrapper objects aliasing the map. Host arrays are
    /// copied into fresh arrays; shared and cyclic arrays keep their shape.
    pub fn to_value(&self, value: &HostValue) -> Value {
        let mut arrays = FxHashMap::default();
        self.to_value_inner(value, &mut arrays)
    }

    fn to_value_inner(&self, value: &HostValue, arrays: &mut FxHashMap<usize, ObjectRef>) -> Value {
        match value {
            HostValue::Undefined => Value::undefined(),
            HostValue::Null => Value::null(),
            HostValue::Bool(b) => Value::boolean(*b),
            HostValue::Int(n) => match i32::try_from(*n) {
                Ok(n) => Value::int32(n),
                Err(_) => Value::number(*n as f64),
            },
            HostValue::Float(n) => Value::number(*n),
            HostValue::String(s) => Value::string(s.as_str()),
            HostValue::BigInt(n) => Value::bigint(n.clone()),
            HostValue::Symbol(sym) => Value::symbol(sym.clone()),
            HostValue::Map(map) => Value::Object(self.wrap_host_map(map)),
            HostValue::Function(func) => Value::Object(func.object().clone()),
            HostValue::Array(arr) => {
                if let Some(existing) = arrays.get(&arr.addr()) {
                    return Value::Object(existing.clone());
                }
                let target = self.create_array(Vec::new());
                arrays.insert(arr.addr(), target.clone());
                for (index, item) in (0u32..).zip(arr.to_vec()) {
                    let element = self.to_value_inner(&item, arrays);
                    target.store_property(PropertyKey::Index(index), PropertyDescriptor::data(element));
                }
                let length = u32::try_from(arr.len()).unwrap_or(PropertyKey::MAX_INDEX);
                target.store_property(crate::array::length_key(), crate::array::length_descriptor(length));
                Value::Object(target)
            }
        }
    }

    /// Object view over a host map; the same map yields the same object
    /// while that object is alive
    pub fn wrap_host_map(&self, map: &HostMap) -> ObjectRef {
        let mut wrappers = self.host_wrappers().borrow_mut();
        if let Some(existing) = wrappers.get(map) {
            return existing;
        }
        let wrapper = JsObject::new(ObjectKind::HostMap(map.clone()), Some(self.object_prototype().clone()));
        wrappers.insert(map, &wrapper);
        wrapper
    }
}

// ============================================================================
// Object handle
// ============================================================================

/// Tri-state attribute flag: set, cleared, or left as is (defaulting to
/// `false` on a new property)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flag {
    /// Attribute present and `true`
    True,
    /// Attribute present and `false`
    False,
    /// Attribute absent from the descriptor
    #[default]
    NotSet,
}

impl Flag {
    fn to_option(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::NotSet => None,
        }
    }
}

impl From<bool> for Flag {
    fn from(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }
}

/// Realm-bound object handle for host code
#[derive(Clone)]
pub struct Object {
    realm: Realm,
    object: ObjectRef,
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.object).finish()
    }
}

impl Object {
    /// Bind `object` to `realm`
    pub fn new(realm: &Realm, object: ObjectRef) -> Self {
        Self {
            realm: realm.clone(),
            object,
        }
    }

    /// The underlying object
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The object as a script value
    pub fn value(&self) -> Value {
        Value::Object(self.object.clone())
    }

    /// The realm this handle is bound to
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// `[[Get]]`
    pub fn get(&self, key: impl Into<PropertyKey>) -> ObjectResult<Value> {
        self.object.get(&self.realm, &key.into())
    }

    /// `[[Set]]`, throwing when the write is rejected
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> ObjectResult<()> {
        self.object.set_or_throw(&self.realm, &key.into(), value.into())
    }

    /// `[[Delete]]`
    pub fn delete(&self, key: impl Into<PropertyKey>) -> ObjectResult<bool> {
        self.object.delete(&self.realm, &key.into())
    }

    /// Enumerable own string keys
    pub fn keys(&self) -> ObjectResult<Vec<String>> {
        let keys = self.object.enumerable_own_keys(&self.realm)?;
        Ok(keys.iter().map(ToString::to_string).collect())
    }

    /// DefinePropertyOrThrow with a data descriptor
    pub fn define_data_property(
        &self,
        key: impl Into<PropertyKey>,
        value: impl Into<Value>,
        writable: Flag,
        enumerable: Flag,
        configurable: Flag,
    ) -> ObjectResult<()> {
        let desc = PartialDescriptor {
            value: Some(value.into()),
            writable: writable.to_option(),
            enumerable: enumerable.to_option(),
            configurable: configurable.to_option(),
            ..PartialDescriptor::default()
        };
        self.object.define_property_or_throw(&self.realm, &key.into(), desc)
    }

    /// DefinePropertyOrThrow with an accessor descriptor; `None` leaves the
    /// getter or setter out of the descriptor
    pub fn define_accessor_property(
        &self,
        key: impl Into<PropertyKey>,
        getter: Option<&Object>,
        setter: Option<&Object>,
        enumerable: Flag,
        configurable: Flag,
    ) -> ObjectResult<()> {
        let accessor = |func: Option<&Object>, role: &str| -> ObjectResult<Option<Value>> {
            match func {
                Some(func) if !func.object.is_callable() => Err(ObjectError::type_error(format!(
                    "{role} must be a function: {}",
                    func.value()
                ))),
                Some(func) => Ok(Some(func.value())),
                None => Ok(None),
            }
        };
        let mut desc = PartialDescriptor {
            get: accessor(getter, "Getter")?,
            set: accessor(setter, "Setter")?,
            enumerable: enumerable.to_option(),
            configurable: configurable.to_option(),
            ..PartialDescriptor::default()
        };
        if desc.get.is_none() && desc.set.is_none() {
            desc.get = Some(Value::undefined());
        }
        self.object.define_property_or_throw(&self.realm, &key.into(), desc)
    }

    /// Export to a host value
    pub fn export(&self) -> ObjectResult<HostValue> {
        self.realm.export(&self.value())
    }

    /// Export into a caller-declared shape
    pub fn export_to<T: FromJs>(&self, dest: &mut T) -> ObjectResult<()> {
        self.realm.export_to(&self.value(), dest)
    }

    /// Callable handle, for function objects
    pub fn as_function(&self) -> Option<HostFunction> {
        self.object.is_callable().then(|| HostFunction(self.object.clone()))
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj.object)
    }
}
