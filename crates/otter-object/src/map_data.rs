//! Backing storage for `Map` instances.
//!
//! Entries live in insertion order in a `Vec`; deletion leaves a tombstone
//! so cursors held by live iterators stay valid and still see entries
//! appended later. A hash index keyed by SameValueZero gives O(1) lookup.

use crate::object_cell::ObjectCell;
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};

/// A `Value` hashed and compared with SameValueZero
#[derive(Clone, Debug)]
pub struct MapKey(pub Value);

impl MapKey {
    /// The wrapped value
    pub fn value(&self) -> &Value {
        &self.0
    }
}

const TAG_UNDEFINED: u8 = 0;
const TAG_NULL: u8 = 1;
const TAG_BOOL: u8 = 2;
const TAG_NUMBER: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_SYMBOL: u8 = 5;
const TAG_BIGINT: u8 = 6;
const TAG_OBJECT: u8 = 7;

/// -0 and +0 hash alike; every NaN hashes as the canonical NaN
fn normalize_float_bits(n: f64) -> u64 {
    if n == 0.0 {
        0
    } else if n.is_nan() {
        0x7FF8_0000_0000_0000
    } else {
        n.to_bits()
    }
}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Value::Undefined => TAG_UNDEFINED.hash(state),
            Value::Null => TAG_NULL.hash(state),
            Value::Boolean(b) => {
                TAG_BOOL.hash(state);
                b.hash(state);
            }
            Value::Int32(n) => {
                TAG_NUMBER.hash(state);
                normalize_float_bits(*n as f64).hash(state);
            }
            Value::Number(n) => {
                TAG_NUMBER.hash(state);
                normalize_float_bits(*n).hash(state);
            }
            Value::String(s) => {
                TAG_STRING.hash(state);
                s.as_str().hash(state);
            }
            Value::Symbol(sym) => {
                TAG_SYMBOL.hash(state);
                sym.hash(state);
            }
            Value::BigInt(n) => {
                TAG_BIGINT.hash(state);
                n.hash(state);
            }
            Value::Object(obj) => {
                TAG_OBJECT.hash(state);
                obj.addr().hash(state);
            }
        }
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        Value::same_value_zero(&self.0, &other.0)
    }
}

impl Eq for MapKey {}

struct MapDataInner {
    entries: Vec<Option<(MapKey, Value)>>,
    index: FxHashMap<MapKey, usize>,
    size: usize,
}

/// Internal storage for a `Map`
pub struct MapData {
    inner: ObjectCell<MapDataInner>,
}

impl Default for MapData {
    fn default() -> Self {
        Self::new()
    }
}

impl MapData {
    /// Create an empty map
    pub fn new() -> Self {
        Self {
            inner: ObjectCell::new(MapDataInner {
                entries: Vec::new(),
                index: FxHashMap::default(),
                size: 0,
            }),
        }
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        self.inner.borrow().size
    }

    /// Value stored under `key`
    pub fn get(&self, key: &MapKey) -> Option<Value> {
        let inner = self.inner.borrow();
        if let Some(&idx) = inner.index.get(key)
            && let Some(Some((_, v))) = inner.entries.get(idx)
        {
            return Some(v.clone());
        }
        None
    }

    /// Whether `key` is present
    pub fn has(&self, key: &MapKey) -> bool {
        self.inner.borrow().index.contains_key(key)
    }

    /// Insert or update; an update keeps the entry's position.
    /// Returns `true` if the key already existed.
    pub fn set(&self, key: MapKey, value: Value) -> bool {
        // -0 is normalised to +0 on insertion.
        let key = match key.0 {
            Value::Number(n) if n == 0.0 => MapKey(Value::int32(0)),
            _ => key,
        };
        let mut inner = self.inner.borrow_mut();
        if let Some(&idx) = inner.index.get(&key) {
            inner.entries[idx] = Some((key, value));
            true
        } else {
            let idx = inner.entries.len();
            inner.index.insert(key.clone(), idx);
            inner.entries.push(Some((key, value)));
            inner.size += 1;
            false
        }
    }

    /// Remove `key`; returns `true` if it existed
    pub fn delete(&self, key: &MapKey) -> bool {
        let mut inner = self.inner.borrow_mut();
        if let Some(idx) = inner.index.remove(key) {
            inner.entries[idx] = None;
            inner.size -= 1;
            true
        } else {
            false
        }
    }

    /// Remove every entry; iterators in progress finish
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.iter_mut().for_each(|entry| *entry = None);
        inner.index.clear();
        inner.size = 0;
    }

    /// First live entry at or after `position`, with the position after it
    pub fn next_entry(&self, position: usize) -> Option<(usize, Value, Value)> {
        let inner = self.inner.borrow();
        inner
            .entries
            .iter()
            .enumerate()
            .skip(position)
            .find_map(|(idx, entry)| {
                entry
                    .as_ref()
                    .map(|(k, v)| (idx + 1, k.value().clone(), v.clone()))
            })
    }

    /// Snapshot of live entries; no borrow outlives the call
    pub fn entries(&self) -> Vec<(Value, Value)> {
        let inner = self.inner.borrow();
        inner
            .entries
            .iter()
            .flatten()
            .map(|(k, v)| (k.value().clone(), v.clone()))
            .collect()
    }
}

impl std::fmt::Debug for MapData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MapData(size={})", self.size())
    }
}
