//! Host-side values produced by export.
//!
//! Containers are shared handles: exporting a graph with cycles or shared
//! sub-objects yields containers that alias the same way, compared with
//! `ptr_eq`. Equality on [`HostValue`] compares primitives by value and
//! containers by identity, so it never recurses into a cycle.

use crate::error::{ObjectError, ObjectResult};
use crate::object::ObjectRef;
use crate::realm::Realm;
use crate::symbol::Symbol;
use crate::value::Value;
use indexmap::IndexMap;
use num_bigint::BigInt;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A value on the host side of the embedding boundary
#[derive(Clone, Default)]
pub enum HostValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Integral number
    Int(i64),
    /// Number with no exact `i64` form (fractional, `-0`, `NaN`, infinite
    /// or out of range) when produced by export
    Float(f64),
    /// String
    String(String),
    /// BigInt
    BigInt(BigInt),
    /// Symbol, passed through unchanged
    Symbol(Symbol),
    /// Sequence
    Array(HostArray),
    /// String-keyed map
    Map(HostMap),
    /// Callable script function
    Function(HostFunction),
}

impl HostValue {
    /// Integer, for `Int` (and integral `Float`)
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    /// Number, for `Int` and `Float`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String contents
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Map handle
    pub fn as_map(&self) -> Option<&HostMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Array handle
    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            Self::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Is `undefined`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Convert to JSON. Cycles are an error; shared (acyclic) containers are
    /// written out once per reference.
    pub fn to_json(&self) -> ObjectResult<serde_json::Value> {
        let mut path = FxHashSet::default();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut FxHashSet<usize>) -> ObjectResult<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match self {
            Self::Undefined | Self::Null | Self::Function(_) | Self::Symbol(_) => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::String(s) => Json::String(s.clone()),
            Self::BigInt(n) => Json::String(n.to_string()),
            Self::Array(arr) => {
                if !path.insert(arr.addr()) {
                    return Err(ObjectError::CircularReference { target: "JSON".into() });
                }
                let items = arr
                    .to_vec()
                    .iter()
                    .map(|item| item.to_json_inner(path))
                    .collect::<ObjectResult<Vec<_>>>()?;
                path.remove(&arr.addr());
                Json::Array(items)
            }
            Self::Map(map) => {
                if !path.insert(map.addr()) {
                    return Err(ObjectError::CircularReference { target: "JSON".into() });
                }
                let mut out = serde_json::Map::new();
                for (key, value) in map.entries() {
                    out.insert(key, value.to_json_inner(path)?);
                }
                path.remove(&map.addr());
                Json::Object(out)
            }
        })
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => HostArray::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => HostMap::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => ObjectRef::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("Undefined"),
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Float(n) => write!(f, "Float({n})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::BigInt(n) => write!(f, "BigInt({n})"),
            Self::Symbol(sym) => write!(f, "Symbol({sym})"),
            Self::Array(arr) => write!(f, "{arr:?}"),
            Self::Map(map) => write!(f, "{map:?}"),
            Self::Function(func) => write!(f, "Function({:?})", func.0),
        }
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<HostMap> for HostValue {
    fn from(map: HostMap) -> Self {
        Self::Map(map)
    }
}

impl From<HostArray> for HostValue {
    fn from(arr: HostArray) -> Self {
        Self::Array(arr)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(items: Vec<HostValue>) -> Self {
        Self::Array(HostArray::from_vec(items))
    }
}

/// Shared, insertion-ordered, string-keyed host map
#[derive(Clone, Default)]
pub struct HostMap(Rc<RefCell<IndexMap<String, HostValue>>>);

impl HostMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries
    pub fn from_entries<K: Into<String>>(entries: impl IntoIterator<Item = (K, HostValue)>) -> Self {
        Self(Rc::new(RefCell::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )))
    }

    /// Entry under `key`
    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.0.borrow().get(key).cloned()
    }

    /// Insert or replace
    pub fn insert(&self, key: impl Into<String>, value: HostValue) -> Option<HostValue> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    /// Remove an entry, keeping the order of the rest
    pub fn remove(&self, key: &str) -> Option<HostValue> {
        self.0.borrow_mut().shift_remove(key)
    }

    /// Whether `key` is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in order
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries in order
    pub fn entries(&self) -> Vec<(String, HostValue)> {
        self.0
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Identity comparison
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Identity address
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl fmt::Debug for HostMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostMap({:#x}, len={})", self.addr(), self.len())
    }
}

/// Shared host sequence
#[derive(Clone, Default)]
pub struct HostArray(Rc<RefCell<Vec<HostValue>>>);

impl HostArray {
    /// Create an empty array
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a vector
    pub fn from_vec(items: Vec<HostValue>) -> Self {
        Self(Rc::new(RefCell::new(items)))
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<HostValue> {
        self.0.borrow().get(index).cloned()
    }

    /// Append
    pub fn push(&self, value: HostValue) {
        self.0.borrow_mut().push(value);
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the elements
    pub fn to_vec(&self) -> Vec<HostValue> {
        self.0.borrow().clone()
    }

    /// Identity comparison
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Identity address
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostArray({:#x}, len={})", self.addr(), self.len())
    }
}

/// Handle to a script function, callable from the host
#[derive(Clone)]
pub struct HostFunction(pub(crate) ObjectRef);

impl HostFunction {
    /// The function object
    pub fn object(&self) -> &ObjectRef {
        &self.0
    }

    /// Call with `this = undefined`, converting arguments and result
    pub fn call(&self, realm: &Realm, args: &[HostValue]) -> ObjectResult<HostValue> {
        let args: SmallVec<[Value; 4]> = args.iter().map(|arg| realm.to_value(arg)).collect();
        let result = self.0.call(realm, &Value::undefined(), &args)?;
        realm.export(&result)
    }
}
