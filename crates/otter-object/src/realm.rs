//! Realm: intrinsic prototypes and object allocation
//!
//! A `Realm` owns the intrinsic prototypes every new object links to, the
//! well-known symbols and the symbol registry. It is a cheap, clonable handle.
//! All internal methods take the realm because accessors, traps and native
//! functions run through it.

use crate::array;
use crate::error::{ObjectError, ObjectResult};
use crate::host::HostWrappers;
use crate::intrinsics;
use crate::map_data::MapData;
use crate::object::{JsObject, NativeFunction, ObjectKind, ObjectRef};
use crate::property::{PropertyAttributes, PropertyDescriptor, PropertyKey};
use crate::proxy::JsProxy;
use crate::string::JsString;
use crate::symbol::{Symbol, SymbolRegistry, WellKnownSymbols};
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

struct RealmInner {
    object_prototype: ObjectRef,
    function_prototype: ObjectRef,
    array_prototype: ObjectRef,
    iterator_prototype: ObjectRef,
    map_prototype: ObjectRef,
    array_values: ObjectRef,
    symbols: WellKnownSymbols,
    registry: SymbolRegistry,
    host_wrappers: RefCell<HostWrappers>,
}

/// Handle to a realm
#[derive(Clone)]
pub struct Realm(Rc<RealmInner>);

impl fmt::Debug for Realm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Realm({:#x})", Rc::as_ptr(&self.0) as usize)
    }
}

impl Default for Realm {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate a native function object linked to `function_prototype`
pub(crate) fn native_function(
    function_prototype: &ObjectRef,
    name: &str,
    length: u32,
    func: crate::object::NativeFn,
) -> ObjectRef {
    let obj = JsObject::new(
        ObjectKind::Function(NativeFunction {
            name: JsString::new(name),
            length,
            func,
        }),
        Some(function_prototype.clone()),
    );
    let attrs = PropertyAttributes::new(false, false, true);
    obj.store_property(
        PropertyKey::string("length"),
        PropertyDescriptor::data_with_attrs(Value::from_u32(length), attrs),
    );
    obj.store_property(
        PropertyKey::string("name"),
        PropertyDescriptor::data_with_attrs(Value::string(name), attrs),
    );
    obj
}

impl Realm {
    /// Create a realm with fresh intrinsics
    pub fn new() -> Self {
        let symbols = WellKnownSymbols::new();
        let object_prototype = JsObject::new(ObjectKind::Ordinary, None);
        let function_prototype = JsObject::new(ObjectKind::Ordinary, Some(object_prototype.clone()));
        let array_prototype = JsObject::new(ObjectKind::Array, Some(object_prototype.clone()));
        array_prototype.store_property(array::length_key(), array::length_descriptor(0));
        let iterator_prototype = JsObject::new(ObjectKind::Ordinary, Some(object_prototype.clone()));
        let map_prototype = JsObject::new(ObjectKind::Ordinary, Some(object_prototype.clone()));
        let array_values = native_function(&function_prototype, "values", 0, Rc::new(intrinsics::array_values));

        let realm = Self(Rc::new(RealmInner {
            object_prototype,
            function_prototype,
            array_prototype,
            iterator_prototype,
            map_prototype,
            array_values,
            symbols,
            registry: SymbolRegistry::new(),
            host_wrappers: RefCell::new(HostWrappers::default()),
        }));
        intrinsics::install(&realm);
        realm
    }

    pub(crate) fn host_wrappers(&self) -> &RefCell<HostWrappers> {
        &self.0.host_wrappers
    }

    /// `%Object.prototype%`
    pub fn object_prototype(&self) -> &ObjectRef {
        &self.0.object_prototype
    }

    /// `%Function.prototype%`
    pub fn function_prototype(&self) -> &ObjectRef {
        &self.0.function_prototype
    }

    /// `%Array.prototype%`
    pub fn array_prototype(&self) -> &ObjectRef {
        &self.0.array_prototype
    }

    /// `%IteratorPrototype%`
    pub fn iterator_prototype(&self) -> &ObjectRef {
        &self.0.iterator_prototype
    }

    /// `%Map.prototype%`
    pub fn map_prototype(&self) -> &ObjectRef {
        &self.0.map_prototype
    }

    /// `%Array.prototype.values%`, also installed as `@@iterator`
    pub fn array_values(&self) -> &ObjectRef {
        &self.0.array_values
    }

    /// Whether `method` is this realm's intrinsic array iterator
    pub fn is_intrinsic_array_iterator(&self, method: &Value) -> bool {
        method
            .as_object()
            .is_some_and(|m| ObjectRef::ptr_eq(m, &self.0.array_values))
    }

    /// Well-known symbols
    pub fn symbols(&self) -> &WellKnownSymbols {
        &self.0.symbols
    }

    /// `Symbol.for(key)`
    pub fn symbol_for(&self, key: &str) -> Symbol {
        self.0.registry.for_key(key)
    }

    /// `Symbol.keyFor(sym)`
    pub fn symbol_key_for(&self, symbol: &Symbol) -> Option<JsString> {
        self.0.registry.key_for(symbol)
    }

    /// `@@iterator` as a property key
    pub fn iterator_key(&self) -> PropertyKey {
        PropertyKey::Symbol(self.0.symbols.iterator.clone())
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Ordinary object inheriting from `%Object.prototype%`
    pub fn create_object(&self) -> ObjectRef {
        self.create_object_with_proto(Some(self.0.object_prototype.clone()))
    }

    /// Ordinary object with an explicit prototype
    pub fn create_object_with_proto(&self, prototype: Option<ObjectRef>) -> ObjectRef {
        JsObject::new(ObjectKind::Ordinary, prototype)
    }

    /// Array holding `elements`
    pub fn create_array(&self, elements: Vec<Value>) -> ObjectRef {
        let arr = JsObject::new(ObjectKind::Array, Some(self.0.array_prototype.clone()));
        let length = u32::try_from(elements.len()).unwrap_or(u32::MAX);
        for (index, value) in (0..length).zip(elements) {
            arr.store_property(PropertyKey::Index(index), PropertyDescriptor::data(value));
        }
        arr.store_property(array::length_key(), array::length_descriptor(length));
        arr
    }

    /// Native function
    pub fn create_function<F>(&self, name: &str, length: u32, func: F) -> ObjectRef
    where
        F: Fn(&Realm, &Value, &[Value]) -> ObjectResult<Value> + 'static,
    {
        native_function(&self.0.function_prototype, name, length, Rc::new(func))
    }

    /// `new Proxy(target, handler)`
    pub fn create_proxy(&self, target: &Value, handler: &Value) -> ObjectResult<ObjectRef> {
        let (Value::Object(target), Value::Object(handler)) = (target, handler) else {
            return Err(ObjectError::type_error(
                "Cannot create proxy with a non-object as target or handler",
            ));
        };
        Ok(JsObject::new(
            ObjectKind::Proxy(JsProxy::new(target.clone(), handler.clone())),
            None,
        ))
    }

    /// `Proxy.revocable(target, handler)`: the proxy and its revoke function
    pub fn create_revocable_proxy(&self, target: &Value, handler: &Value) -> ObjectResult<(ObjectRef, ObjectRef)> {
        let proxy = self.create_proxy(target, handler)?;
        let weak = proxy.downgrade();
        let revoke = self.create_function("", 0, move |_, _, _| {
            if let Some(proxy) = weak.upgrade()
                && let Some(state) = proxy.as_proxy()
            {
                state.revoke();
            }
            Ok(Value::undefined())
        });
        Ok((proxy, revoke))
    }

    /// Empty `Map`
    pub fn create_map(&self) -> ObjectRef {
        JsObject::new(ObjectKind::Map(MapData::new()), Some(self.0.map_prototype.clone()))
    }

    /// `{ value, done }`
    pub fn create_iter_result(&self, value: Value, done: bool) -> Value {
        let result = self.create_object();
        result.store_property(PropertyKey::string("value"), PropertyDescriptor::data(value));
        result.store_property(PropertyKey::string("done"), PropertyDescriptor::data(Value::boolean(done)));
        Value::Object(result)
    }

    /// ToObject
    pub fn to_object(&self, value: &Value) -> ObjectResult<ObjectRef> {
        match value {
            Value::Object(obj) => Ok(obj.clone()),
            Value::Undefined | Value::Null => Err(ObjectError::type_error(format!(
                "Cannot convert {value} to object"
            ))),
            primitive => {
                let wrapper = JsObject::new(
                    ObjectKind::Primitive(primitive.clone()),
                    Some(self.0.object_prototype.clone()),
                );
                if let Value::String(s) = primitive {
                    let read_only = PropertyAttributes::new(false, true, false);
                    let mut count = 0u32;
                    for (index, ch) in (0u32..).zip(s.as_str().chars()) {
                        wrapper.store_property(
                            PropertyKey::Index(index),
                            PropertyDescriptor::data_with_attrs(Value::string(ch.to_string()), read_only),
                        );
                        count = index + 1;
                    }
                    wrapper.store_property(
                        PropertyKey::string("length"),
                        PropertyDescriptor::data_with_attrs(Value::from_u32(count), PropertyAttributes::frozen()),
                    );
                }
                Ok(wrapper)
            }
        }
    }

    // ========================================================================
    // Calls and protocols
    // ========================================================================

    /// Call `func` with `this` and `args`
    pub fn call(&self, func: &Value, this: &Value, args: &[Value]) -> ObjectResult<Value> {
        match func {
            Value::Object(obj) => obj.call(self, this, args),
            other => Err(ObjectError::type_error(format!("{other} is not a function"))),
        }
    }

    /// LengthOfArrayLike
    pub fn length_of_array_like(&self, obj: &ObjectRef) -> ObjectResult<u64> {
        let length = obj.get(self, &PropertyKey::string("length"))?;
        Ok(to_length(&length))
    }
}

/// ToLength, for values that need no user code to convert
pub fn to_length(value: &Value) -> u64 {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    let number = match value {
        Value::Int32(n) => *n as f64,
        Value::Number(n) => *n,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => s.as_str().trim().parse::<f64>().unwrap_or(0.0),
        Value::Object(obj) => match obj.kind() {
            ObjectKind::Primitive(inner) => return to_length(inner),
            _ => 0.0,
        },
        _ => 0.0,
    };
    if number.is_nan() || number <= 0.0 {
        return 0;
    }
    number.trunc().min(MAX_SAFE_INTEGER) as u64
}
