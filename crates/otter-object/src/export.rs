//! Export of live object graphs to host values and host-declared shapes.
//!
//! [`ExportContext`] carries the per-call identity bookkeeping: containers
//! produced for a source object are remembered per destination type before
//! they are populated, so shared and cyclic references come out shared and
//! cyclic. Destinations that cannot alias (plain records, `Vec`, fixed
//! arrays, maps) are guarded instead: re-entering the same source while it
//! is still being converted is a [`ObjectError::CircularReference`].

use crate::error::{ObjectError, ObjectResult};
use crate::host_value::{HostArray, HostFunction, HostMap, HostValue};
use crate::object::{ObjectKind, ObjectRef};
use crate::property::PropertyKey;
use crate::realm::Realm;
use crate::value::Value;
use indexmap::IndexMap;
use num_traits::{NumCast, ToPrimitive};
use rustc_hash::{FxHashMap, FxHashSet};
use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use tracing::trace;

type IdentityKey = (usize, TypeId);

/// Identity bookkeeping for one export call
pub struct ExportContext {
    realm: Realm,
    // The source handle is held so its address cannot be reused mid-call.
    built: FxHashMap<IdentityKey, (ObjectRef, Box<dyn Any>)>,
    in_progress: FxHashSet<IdentityKey>,
}

impl ExportContext {
    /// Fresh context
    pub fn new(realm: &Realm) -> Self {
        Self {
            realm: realm.clone(),
            built: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    /// The realm getters, traps and iterators run in
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Destination of type `T` already produced for `obj` in this call
    pub fn lookup<T: Clone + 'static>(&self, obj: &ObjectRef) -> Option<T> {
        let (_, built) = self.built.get(&(obj.addr(), TypeId::of::<T>()))?;
        let hit = built.downcast_ref::<T>().cloned();
        if hit.is_some() {
            trace!(target: "otter::export", addr = obj.addr(), ty = type_name::<T>(), "identity hit");
        }
        hit
    }

    /// Record the destination produced for `obj`; call before populating it
    pub fn remember<T: Clone + 'static>(&mut self, obj: &ObjectRef, dest: T) {
        self.built
            .insert((obj.addr(), TypeId::of::<T>()), (obj.clone(), Box::new(dest)));
    }

    /// Run `build` with `value` marked as in progress for destination `T`
    pub fn enter<T: 'static, R>(
        &mut self,
        value: &Value,
        build: impl FnOnce(&mut Self) -> ObjectResult<R>,
    ) -> ObjectResult<R> {
        let Some(obj) = value.as_object() else {
            return build(self);
        };
        let key = (obj.addr(), TypeId::of::<T>());
        if !self.in_progress.insert(key) {
            return Err(ObjectError::CircularReference {
                target: short_type_name(type_name::<T>()),
            });
        }
        let result = build(self);
        self.in_progress.remove(&key);
        result
    }

    /// Read a record: `build` pulls named fields through `[[Get]]`
    pub fn record<T: 'static>(
        &mut self,
        value: &Value,
        build: impl FnOnce(&mut RecordReader<'_>) -> ObjectResult<T>,
    ) -> ObjectResult<T> {
        let Value::Object(obj) = value else {
            return Err(ObjectError::conversion(value, short_type_name(type_name::<T>())));
        };
        let object = obj.clone();
        self.enter::<T, _>(value, |cx| build(&mut RecordReader { cx, object }))
    }

    // ========================================================================
    // Source protocols
    // ========================================================================

    /// Elements of a sequence source.
    ///
    /// Native arrays that still use the intrinsic iterator are read by
    /// index. Otherwise a callable `@@iterator` wins over `length`, and the
    /// iterator is drained eagerly.
    pub fn sequence_values(&mut self, value: &Value, target: &str) -> ObjectResult<Vec<Value>> {
        let not_iterable = || ObjectError::NotIterable {
            value: value.to_string(),
            target: target.to_string(),
        };
        let Value::Object(obj) = value else {
            return Err(not_iterable());
        };
        let realm = self.realm.clone();

        let method = obj.get(&realm, &realm.iterator_key())?;
        if obj.is_array_exotic() && realm.is_intrinsic_array_iterator(&method) {
            return index_values(&realm, obj);
        }
        if method.is_callable() {
            return iterate(&realm, value, &method);
        }
        if !method.is_nullish() {
            return Err(ObjectError::type_error(format!("{method} is not a function")));
        }
        if obj.has_property(&realm, &PropertyKey::string("length"))? {
            return index_values(&realm, obj);
        }
        Err(not_iterable())
    }

    /// Entries of a map source: `Map` entries, host map entries, or the
    /// enumerable own string-keyed properties of any other object
    pub fn map_entries(&mut self, value: &Value, target: &str) -> ObjectResult<Vec<(Value, Value)>> {
        let Value::Object(obj) = value else {
            return Err(ObjectError::conversion(value, target));
        };
        let realm = self.realm.clone();
        if let Some(map) = obj.as_map() {
            return Ok(map.entries());
        }
        if let Some(map) = obj.as_host_map() {
            return Ok(map
                .entries()
                .into_iter()
                .map(|(key, item)| (Value::string(key), realm.to_value(&item)))
                .collect());
        }
        let mut entries = Vec::new();
        for key in obj.enumerable_own_keys(&realm)? {
            let item = obj.get(&realm, &key)?;
            entries.push((key.to_value(), item));
        }
        Ok(entries)
    }

    // ========================================================================
    // Untyped export
    // ========================================================================

    /// Export to a [`HostValue`], preserving sharing and cycles
    pub fn export_value(&mut self, value: &Value) -> ObjectResult<HostValue> {
        let obj = match value {
            Value::Undefined => return Ok(HostValue::Undefined),
            Value::Null => return Ok(HostValue::Null),
            Value::Boolean(b) => return Ok(HostValue::Bool(*b)),
            Value::Int32(n) => return Ok(HostValue::Int((*n).into())),
            Value::Number(n) => return Ok(export_number(*n)),
            Value::String(s) => return Ok(HostValue::String(s.as_str().to_string())),
            Value::Symbol(sym) => return Ok(HostValue::Symbol(sym.clone())),
            Value::BigInt(n) => return Ok(HostValue::BigInt((**n).clone())),
            Value::Object(obj) => obj,
        };
        if let Some(hit) = self.lookup::<HostValue>(obj) {
            return Ok(hit);
        }
        let realm = self.realm.clone();

        match obj.kind() {
            ObjectKind::HostMap(map) => return Ok(HostValue::Map(map.clone())),
            ObjectKind::Primitive(inner) => return self.export_value(inner),
            ObjectKind::Map(data) => {
                let pairs = HostArray::new();
                self.remember(obj, HostValue::Array(pairs.clone()));
                for (key, item) in data.entries() {
                    let pair = vec![self.export_value(&key)?, self.export_value(&item)?];
                    pairs.push(HostValue::from(pair));
                }
                return Ok(HostValue::Array(pairs));
            }
            _ => {}
        }

        if obj.is_callable() {
            return Ok(HostValue::Function(HostFunction(obj.clone())));
        }

        if obj.is_array()? {
            let items = HostArray::new();
            self.remember(obj, HostValue::Array(items.clone()));
            let length = realm.length_of_array_like(obj)?;
            for index in 0..length {
                let item = obj.get(&realm, &PropertyKey::from_number(index as f64))?;
                items.push(self.export_value(&item)?);
            }
            return Ok(HostValue::Array(items));
        }

        let fields = HostMap::new();
        self.remember(obj, HostValue::Map(fields.clone()));
        for key in obj.enumerable_own_keys(&realm)? {
            let item = obj.get(&realm, &key)?;
            fields.insert(key.to_string(), self.export_value(&item)?);
        }
        Ok(HostValue::Map(fields))
    }

    fn number(&self, value: &Value, target: &str) -> ObjectResult<f64> {
        match value {
            Value::Int32(n) => Ok(<f64 as From<i32>>::from(*n)),
            Value::Number(n) => Ok(*n),
            Value::Boolean(b) => Ok(<f64 as From<u8>>::from(<u8 as From<bool>>::from(*b))),
            Value::String(s) => {
                let text = s.as_str().trim();
                if text.is_empty() {
                    return Ok(0.0);
                }
                text.parse().map_err(|_| ObjectError::conversion(value, target))
            }
            Value::BigInt(n) => n.to_f64().ok_or_else(|| ObjectError::conversion(value, target)),
            Value::Object(obj) => match obj.kind() {
                ObjectKind::Primitive(inner) => self.number(inner, target),
                _ => Err(ObjectError::conversion(value, target)),
            },
            _ => Err(ObjectError::conversion(value, target)),
        }
    }
}

/// Integral numbers with an exact `i64` form export as `Int`
fn export_number(n: f64) -> HostValue {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    let exact = n.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&n) && !(n == 0.0 && n.is_sign_negative());
    if exact { HostValue::Int(n as i64) } else { HostValue::Float(n) }
}

fn index_values(realm: &Realm, obj: &ObjectRef) -> ObjectResult<Vec<Value>> {
    let length = realm.length_of_array_like(obj)?;
    let mut values = Vec::with_capacity(length.min(1 << 16) as usize);
    for index in 0..length {
        values.push(obj.get(realm, &PropertyKey::from_number(index as f64))?);
    }
    Ok(values)
}

fn iterate(realm: &Realm, source: &Value, method: &Value) -> ObjectResult<Vec<Value>> {
    let iterator = realm.call(method, source, &[])?;
    let Value::Object(iter_obj) = &iterator else {
        return Err(ObjectError::type_error(format!("Result of the Symbol.iterator method is not an object: {iterator}")));
    };
    let next = iter_obj.get(realm, &PropertyKey::string("next"))?;

    let mut values = Vec::new();
    loop {
        let step = realm.call(&next, &iterator, &[])?;
        let Value::Object(step) = step else {
            return Err(ObjectError::type_error(format!("Iterator result {step} is not an object")));
        };
        if step.get(realm, &PropertyKey::string("done"))?.to_boolean() {
            return Ok(values);
        }
        values.push(step.get(realm, &PropertyKey::string("value"))?);
    }
}

/// Reads named fields of a source object for a record destination
pub struct RecordReader<'a> {
    cx: &'a mut ExportContext,
    object: ObjectRef,
}

impl RecordReader<'_> {
    /// Convert the field `name`
    pub fn field<T: FromJs>(&mut self, name: &str) -> ObjectResult<T> {
        let value = self.object.get(&self.cx.realm, &PropertyKey::string(name))?;
        T::from_js(self.cx, &value)
    }

    /// Convert the field `name`, or `T::default()` when it is `undefined`
    pub fn field_or_default<T: FromJs + Default>(&mut self, name: &str) -> ObjectResult<T> {
        let value = self.object.get(&self.cx.realm, &PropertyKey::string(name))?;
        if value.is_undefined() {
            return Ok(T::default());
        }
        T::from_js(self.cx, &value)
    }

    /// The source object
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The export context, for custom conversions
    pub fn context(&mut self) -> &mut ExportContext {
        self.cx
    }
}

// ============================================================================
// Destination shapes
// ============================================================================

/// A host type that script values can be exported into
pub trait FromJs: Sized + 'static {
    /// Build a fresh destination
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self>;

    /// Convert into an existing destination
    fn from_js_into(cx: &mut ExportContext, value: &Value, dest: &mut Self) -> ObjectResult<()> {
        *dest = Self::from_js(cx, value)?;
        Ok(())
    }

    /// Name used in conversion errors
    fn type_label() -> String {
        short_type_name(type_name::<Self>())
    }
}

/// `alloc::vec::Vec<i32>` -> `Vec<i32>`
fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            out.push_str(token.rsplit("::").next().unwrap_or_default());
            token.clear();
            out.push(ch);
        }
    }
    out.push_str(token.rsplit("::").next().unwrap_or_default());
    out
}

impl FromJs for Value {
    fn from_js(_cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        Ok(value.clone())
    }
}

impl FromJs for HostValue {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.export_value(value)
    }
}

impl FromJs for bool {
    fn from_js(_cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        Ok(value.to_boolean())
    }
}

macro_rules! impl_from_js_int {
    ($($ty:ty),*) => {
        $(
            impl FromJs for $ty {
                fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
                    let number = cx.number(value, stringify!($ty))?;
                    if !number.is_finite() {
                        return Err(ObjectError::conversion(value, stringify!($ty)));
                    }
                    <$ty as NumCast>::from(number.trunc()).ok_or_else(|| {
                        ObjectError::range_error(format!("{value} is out of range for {}", stringify!($ty)))
                    })
                }

                fn type_label() -> String {
                    stringify!($ty).to_string()
                }
            }
        )*
    };
}

impl_from_js_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromJs for f64 {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.number(value, "f64")
    }
}

impl FromJs for f32 {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        Ok(cx.number(value, "f32")? as f32)
    }
}

impl FromJs for String {
    fn from_js(_cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        match value {
            Value::Symbol(_) => Err(ObjectError::conversion(value, "String")),
            Value::String(s) => Ok(s.as_str().to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: FromJs> FromJs for Option<T> {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        if value.is_nullish() {
            return Ok(None);
        }
        T::from_js(cx, value).map(Some)
    }

    fn type_label() -> String {
        format!("Option<{}>", T::type_label())
    }
}

impl<T: FromJs> FromJs for Box<T> {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        T::from_js(cx, value).map(Box::new)
    }

    fn type_label() -> String {
        T::type_label()
    }
}

/// Shared destination: one `Rc` per source object, registered before it is
/// populated so cycles close on the same `Rc`
impl<T: FromJs + Default> FromJs for Rc<RefCell<T>> {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let Value::Object(obj) = value else {
            return Ok(Rc::new(RefCell::new(T::from_js(cx, value)?)));
        };
        if let Some(shared) = cx.lookup::<Self>(obj) {
            return Ok(shared);
        }
        let shared = Rc::new(RefCell::new(T::default()));
        cx.remember(obj, shared.clone());
        let built = T::from_js(cx, value)?;
        *shared.borrow_mut() = built;
        Ok(shared)
    }

    fn type_label() -> String {
        T::type_label()
    }
}

impl<T: FromJs> FromJs for Vec<T> {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let mut items = Vec::new();
        Self::from_js_into(cx, value, &mut items)?;
        Ok(items)
    }

    /// Clears `dest` first; on failure it stays empty
    fn from_js_into(cx: &mut ExportContext, value: &Value, dest: &mut Self) -> ObjectResult<()> {
        dest.clear();
        if value.is_nullish() {
            return Ok(());
        }
        let target = Self::type_label();
        let items = cx.enter::<Self, _>(value, |cx| {
            let values = cx.sequence_values(value, &target)?;
            values.iter().map(|item| T::from_js(cx, item)).collect::<ObjectResult<Vec<T>>>()
        })?;
        *dest = items;
        Ok(())
    }

    fn type_label() -> String {
        format!("Vec<{}>", T::type_label())
    }
}

impl<T: FromJs, const N: usize> FromJs for [T; N] {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let target = Self::type_label();
        let mismatch = |have: usize| ObjectError::ShapeMismatch {
            value: value.to_string(),
            target: target.clone(),
            have,
            need: N,
        };
        cx.enter::<Self, _>(value, |cx| {
            let values = cx.sequence_values(value, &target)?;
            if values.len() != N {
                return Err(mismatch(values.len()));
            }
            let items = values
                .iter()
                .map(|item| T::from_js(cx, item))
                .collect::<ObjectResult<Vec<T>>>()?;
            items.try_into().map_err(|items: Vec<T>| mismatch(items.len()))
        })
    }

    fn type_label() -> String {
        format!("[{}; {N}]", T::type_label())
    }
}

fn collect_entries<K: FromJs, V: FromJs>(
    cx: &mut ExportContext,
    value: &Value,
    target: &str,
) -> ObjectResult<Vec<(K, V)>> {
    if value.is_nullish() {
        return Ok(Vec::new());
    }
    let entries = cx.map_entries(value, target)?;
    entries
        .iter()
        .map(|(key, item)| -> ObjectResult<(K, V)> { Ok((K::from_js(cx, key)?, V::from_js(cx, item)?)) })
        .collect()
}

impl<K, V, S> FromJs for HashMap<K, V, S>
where
    K: FromJs + Eq + Hash,
    V: FromJs,
    S: BuildHasher + Default + 'static,
{
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let target = Self::type_label();
        cx.enter::<Self, _>(value, |cx| {
            Ok(collect_entries::<K, V>(cx, value, &target)?.into_iter().collect())
        })
    }

    fn type_label() -> String {
        format!("HashMap<{}, {}>", K::type_label(), V::type_label())
    }
}

impl<K: FromJs + Ord, V: FromJs> FromJs for BTreeMap<K, V> {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let target = Self::type_label();
        cx.enter::<Self, _>(value, |cx| {
            Ok(collect_entries::<K, V>(cx, value, &target)?.into_iter().collect())
        })
    }

    fn type_label() -> String {
        format!("BTreeMap<{}, {}>", K::type_label(), V::type_label())
    }
}

impl<K, V, S> FromJs for IndexMap<K, V, S>
where
    K: FromJs + Eq + Hash,
    V: FromJs,
    S: BuildHasher + Default + 'static,
{
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        let target = Self::type_label();
        cx.enter::<Self, _>(value, |cx| {
            Ok(collect_entries::<K, V>(cx, value, &target)?.into_iter().collect())
        })
    }

    fn type_label() -> String {
        format!("IndexMap<{}, {}>", K::type_label(), V::type_label())
    }
}

/// Wrapped host maps come back as the same map; other objects are exported
impl FromJs for HostMap {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        if let Some(obj) = value.as_object()
            && obj.as_map().is_some()
        {
            let entries = cx.map_entries(value, "HostMap")?;
            let map = HostMap::new();
            for (key, item) in entries {
                let key = String::from_js(cx, &key)?;
                map.insert(key, cx.export_value(&item)?);
            }
            return Ok(map);
        }
        match cx.export_value(value)? {
            HostValue::Map(map) => Ok(map),
            _ => Err(ObjectError::conversion(value, "HostMap")),
        }
    }
}

impl FromJs for HostArray {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        if let Some(obj) = value.as_object()
            && (obj.is_array()? || obj.as_map().is_some())
            && let HostValue::Array(items) = cx.export_value(value)?
        {
            return Ok(items);
        }
        let values = cx.sequence_values(value, "HostArray")?;
        let items = HostArray::new();
        for item in &values {
            items.push(cx.export_value(item)?);
        }
        Ok(items)
    }
}

impl FromJs for serde_json::Value {
    fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
        cx.export_value(value)?.to_json()
    }

    fn type_label() -> String {
        "serde_json::Value".to_string()
    }
}

// ============================================================================
// Realm entry points
// ============================================================================

impl Realm {
    /// Export `value` to a host value
    pub fn export(&self, value: &Value) -> ObjectResult<HostValue> {
        ExportContext::new(self).export_value(value)
    }

    /// Export `value` into `dest`, whose type selects the conversion
    pub fn export_to<T: FromJs>(&self, value: &Value, dest: &mut T) -> ObjectResult<()> {
        trace!(target: "otter::export", ty = type_name::<T>(), "export_to");
        let mut cx = ExportContext::new(self);
        T::from_js_into(&mut cx, value, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("alloc::vec::Vec<i32>"), "Vec<i32>");
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, u8>"),
            "HashMap<String, u8>"
        );
        assert_eq!(short_type_name("[i32; 3]"), "[i32; 3]");
    }

    #[test]
    fn test_integer_range_is_checked() {
        let realm = Realm::new();
        let mut byte = 0u8;
        realm.export_to(&Value::int32(200), &mut byte).unwrap();
        assert_eq!(byte, 200);
        let err = realm.export_to(&Value::int32(300), &mut byte).unwrap_err();
        assert_eq!(err.name(), "RangeError");
    }

    #[test]
    fn test_numbers_truncate() {
        let realm = Realm::new();
        let mut n = 0i64;
        realm.export_to(&Value::number(-2.75), &mut n).unwrap();
        assert_eq!(n, -2);
    }

    #[test]
    fn test_primitives_export() {
        let realm = Realm::new();
        assert_eq!(realm.export(&Value::int32(5)).unwrap(), HostValue::Int(5));
        assert_eq!(realm.export(&Value::number(0.5)).unwrap(), HostValue::Float(0.5));
        assert_eq!(realm.export(&Value::from("hi")).unwrap(), HostValue::from("hi"));
        assert_eq!(realm.export(&Value::null()).unwrap(), HostValue::Null);
    }

    #[test]
    fn test_integral_numbers_export_as_int() {
        let realm = Realm::new();
        assert_eq!(realm.export(&Value::number(2f64.powi(40))).unwrap(), HostValue::Int(1 << 40));
        assert_eq!(realm.export(&Value::number(-3.0)).unwrap(), HostValue::Int(-3));
        assert_eq!(realm.export(&Value::number(1e300)).unwrap(), HostValue::Float(1e300));
        assert!(matches!(realm.export(&Value::number(-0.0)).unwrap(), HostValue::Float(z) if z.is_sign_negative()));
        assert!(matches!(realm.export(&Value::number(f64::NAN)).unwrap(), HostValue::Float(n) if n.is_nan()));
        assert!(matches!(realm.export(&Value::number(f64::INFINITY)).unwrap(), HostValue::Float(_)));
    }

    #[test]
    fn test_map_exports_as_pairs() {
        let realm = Realm::new();
        let map = realm.create_map();
        map.as_map()
            .unwrap()
            .set(crate::map_data::MapKey(Value::from("k")), Value::int32(1));
        let exported = realm.export(&Value::Object(map)).unwrap();
        let pairs = exported.as_array().unwrap().to_vec();
        assert_eq!(pairs.len(), 1);
        let pair = pairs[0].as_array().unwrap().to_vec();
        assert_eq!(pair, vec![HostValue::from("k"), HostValue::Int(1)]);
    }

    #[test]
    fn test_non_shared_cycle_is_an_error() {
        #[derive(Debug)]
        struct Node {
            next: Option<Box<Node>>,
        }

        impl FromJs for Node {
            fn from_js(cx: &mut ExportContext, value: &Value) -> ObjectResult<Self> {
                cx.record(value, |r| Ok(Node { next: r.field("next")? }))
            }
        }

        let realm = Realm::new();
        let obj = realm.create_object();
        obj.set(&realm, &"next".into(), Value::Object(obj.clone())).unwrap();
        let err = Node::from_js(&mut ExportContext::new(&realm), &Value::Object(obj)).unwrap_err();
        assert!(matches!(err, ObjectError::CircularReference { .. }));
    }
}
