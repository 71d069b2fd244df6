//! Property keys and descriptors

use crate::string::JsString;
use crate::symbol::Symbol;
use crate::value::{Value, number_to_string};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Property key
///
/// The constructors produce canonical keys: a string that spells an array
/// index (`"0"`, `"42"`, but not `"01"` or `"4294967295"`) becomes `Index`.
/// Keys built from the variants directly are canonicalised where they are
/// compared, hashed or stored, so `String("5")` and `Index(5)` name the
/// same property and `Index(u32::MAX)` is the string key `"4294967295"`.
#[derive(Clone, Debug)]
pub enum PropertyKey {
    /// Canonical array index in `0..=MAX_INDEX`
    Index(u32),
    /// Any other string key
    String(JsString),
    /// Symbol key, compared by identity
    Symbol(Symbol),
}

impl PropertyKey {
    /// Largest canonical array index (2^32 - 2)
    pub const MAX_INDEX: u32 = u32::MAX - 1;

    /// Key from a string, canonicalising index spellings
    pub fn string(s: &str) -> Self {
        match parse_index(s) {
            Some(index) => Self::Index(index),
            None => Self::String(JsString::new(s)),
        }
    }

    /// Key from an index; `u32::MAX` is not an index and becomes a string key
    pub fn index(index: u32) -> Self {
        if index <= Self::MAX_INDEX {
            Self::Index(index)
        } else {
            Self::String(JsString::new(itoa::Buffer::new().format(index)))
        }
    }

    /// Key from a symbol
    pub fn symbol(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }

    /// Key from a number, as ToPropertyKey would produce it
    pub fn from_number(n: f64) -> Self {
        if n.fract() == 0.0 && n >= 0.0 && n <= Self::MAX_INDEX as f64 {
            Self::Index(n as u32)
        } else {
            Self::String(JsString::from(number_to_string(n)))
        }
    }

    /// Canonical form of this key
    pub fn canonical(&self) -> Cow<'_, Self> {
        match self {
            Self::Index(i) if *i > Self::MAX_INDEX => Cow::Owned(Self::index(*i)),
            Self::String(s) => match parse_index(s.as_str()) {
                Some(index) => Cow::Owned(Self::Index(index)),
                None => Cow::Borrowed(self),
            },
            _ => Cow::Borrowed(self),
        }
    }

    /// Owned canonical form of this key
    pub fn into_canonical(self) -> Self {
        match self {
            Self::Index(i) => Self::index(i),
            Self::String(s) => Self::from(s),
            symbol => symbol,
        }
    }

    /// The index, for keys naming a canonical array index (always
    /// `<= MAX_INDEX`)
    #[inline]
    pub fn as_index(&self) -> Option<u32> {
        match self.canonical().as_ref() {
            Self::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this is a symbol key
    #[inline]
    pub fn is_symbol(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }

    /// Whether this is the string key `name`
    pub fn is_named(&self, name: &str) -> bool {
        matches!(self, Self::String(s) if s.as_str() == name)
    }

    /// The key as a script value: a string, or the symbol itself
    pub fn to_value(&self) -> Value {
        match self {
            Self::Index(i) => Value::String(JsString::new(itoa::Buffer::new().format(*i))),
            Self::String(s) => Value::String(s.clone()),
            Self::Symbol(sym) => Value::Symbol(sym.clone()),
        }
    }
}

fn parse_index(s: &str) -> Option<u32> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() > 10 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if bytes.len() > 1 && bytes[0] == b'0' {
        return None;
    }
    let n: u64 = s.parse().ok()?;
    u32::try_from(n).ok().filter(|&i| i <= PropertyKey::MAX_INDEX)
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        match (self.canonical().as_ref(), other.canonical().as_ref()) {
            (Self::Index(a), Self::Index(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for PropertyKey {}

impl Hash for PropertyKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.canonical().as_ref() {
            Self::Index(i) => {
                state.write_u8(0);
                i.hash(state);
            }
            Self::String(s) => {
                state.write_u8(1);
                s.hash(state);
            }
            Self::Symbol(sym) => {
                state.write_u8(2);
                sym.hash(state);
            }
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::String(s) => f.write_str(s.as_str()),
            Self::Symbol(sym) => write!(f, "{sym}"),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        Self::string(&s)
    }
}

impl From<JsString> for PropertyKey {
    fn from(s: JsString) -> Self {
        match parse_index(s.as_str()) {
            Some(index) => Self::Index(index),
            None => Self::String(s),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        Self::index(index)
    }
}

impl From<Symbol> for PropertyKey {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

/// Property attributes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyAttributes {
    /// Value can be changed (data properties only)
    pub writable: bool,
    /// Shows up in enumeration
    pub enumerable: bool,
    /// Can be deleted or redefined
    pub configurable: bool,
}

impl PropertyAttributes {
    /// Default data property attributes
    pub const fn data() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Non-writable, non-enumerable, non-configurable
    pub const fn frozen() -> Self {
        Self {
            writable: false,
            enumerable: false,
            configurable: false,
        }
    }

    /// Attributes of built-in methods: writable, configurable, not enumerable
    pub const fn builtin() -> Self {
        Self {
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Build from individual flags
    pub const fn new(writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            writable,
            enumerable,
            configurable,
        }
    }
}

/// Complete property descriptor
#[derive(Clone, Debug)]
pub enum PropertyDescriptor {
    /// Data property
    Data {
        /// The value
        value: Value,
        /// Attributes
        attributes: PropertyAttributes,
    },
    /// Accessor property. `writable` in `attributes` is ignored.
    Accessor {
        /// Getter function
        get: Option<Value>,
        /// Setter function
        set: Option<Value>,
        /// Attributes
        attributes: PropertyAttributes,
    },
}

impl PropertyDescriptor {
    /// Create a data property
    pub fn data(value: Value) -> Self {
        Self::Data {
            value,
            attributes: PropertyAttributes::data(),
        }
    }

    /// Create a data property with specific attributes
    pub fn data_with_attrs(value: Value, attributes: PropertyAttributes) -> Self {
        Self::Data { value, attributes }
    }

    /// Create an accessor property; `undefined` functions count as absent
    pub fn accessor(get: Option<Value>, set: Option<Value>, enumerable: bool, configurable: bool) -> Self {
        Self::Accessor {
            get: get.filter(|f| !f.is_undefined()),
            set: set.filter(|f| !f.is_undefined()),
            attributes: PropertyAttributes::new(false, enumerable, configurable),
        }
    }

    /// Get the value (for data properties)
    pub fn value(&self) -> Option<&Value> {
        match self {
            Self::Data { value, .. } => Some(value),
            Self::Accessor { .. } => None,
        }
    }

    /// Attributes
    pub fn attributes(&self) -> PropertyAttributes {
        match self {
            Self::Data { attributes, .. } | Self::Accessor { attributes, .. } => *attributes,
        }
    }

    /// Enumerable flag
    #[inline]
    pub fn enumerable(&self) -> bool {
        self.attributes().enumerable
    }

    /// Configurable flag
    #[inline]
    pub fn configurable(&self) -> bool {
        self.attributes().configurable
    }

    /// Writable flag; always false for accessors
    pub fn writable(&self) -> bool {
        match self {
            Self::Data { attributes, .. } => attributes.writable,
            Self::Accessor { .. } => false,
        }
    }

    /// Is an accessor property
    #[inline]
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor { .. })
    }

    /// Getter (for accessor properties)
    pub fn getter(&self) -> Option<&Value> {
        match self {
            Self::Accessor { get, .. } => get.as_ref(),
            Self::Data { .. } => None,
        }
    }

    /// Setter (for accessor properties)
    pub fn setter(&self) -> Option<&Value> {
        match self {
            Self::Accessor { set, .. } => set.as_ref(),
            Self::Data { .. } => None,
        }
    }
}

/// A property descriptor whose fields may be absent, as passed to
/// `[[DefineOwnProperty]]`. `get`/`set` present as `undefined` mean
/// "explicitly no function", which differs from absent.
#[derive(Clone, Debug, Default)]
pub struct PartialDescriptor {
    /// `[[Value]]`
    pub value: Option<Value>,
    /// `[[Writable]]`
    pub writable: Option<bool>,
    /// `[[Get]]`
    pub get: Option<Value>,
    /// `[[Set]]`
    pub set: Option<Value>,
    /// `[[Enumerable]]`
    pub enumerable: Option<bool>,
    /// `[[Configurable]]`
    pub configurable: Option<bool>,
}

impl PartialDescriptor {
    /// Fully specified data descriptor
    pub fn data(value: Value, attributes: PropertyAttributes) -> Self {
        Self {
            value: Some(value),
            writable: Some(attributes.writable),
            enumerable: Some(attributes.enumerable),
            configurable: Some(attributes.configurable),
            ..Self::default()
        }
    }

    /// Fully specified accessor descriptor
    pub fn accessor(get: Value, set: Value, enumerable: bool, configurable: bool) -> Self {
        Self {
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Self::default()
        }
    }

    /// Descriptor carrying only a value, used when updating an existing property
    pub fn value_only(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    /// IsAccessorDescriptor
    #[inline]
    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// IsDataDescriptor
    #[inline]
    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// IsGenericDescriptor
    #[inline]
    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    /// No fields present
    pub fn is_empty(&self) -> bool {
        self.is_generic() && self.enumerable.is_none() && self.configurable.is_none()
    }

    /// CompletePropertyDescriptor
    pub fn complete(self) -> PropertyDescriptor {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor() {
            PropertyDescriptor::accessor(self.get, self.set, enumerable, configurable)
        } else {
            PropertyDescriptor::Data {
                value: self.value.unwrap_or_default(),
                attributes: PropertyAttributes::new(
                    self.writable.unwrap_or(false),
                    enumerable,
                    configurable,
                ),
            }
        }
    }
}

impl From<PropertyDescriptor> for PartialDescriptor {
    fn from(desc: PropertyDescriptor) -> Self {
        match desc {
            PropertyDescriptor::Data { value, attributes } => Self::data(value, attributes),
            PropertyDescriptor::Accessor {
                get,
                set,
                attributes,
            } => Self::accessor(
                get.unwrap_or_default(),
                set.unwrap_or_default(),
                attributes.enumerable,
                attributes.configurable,
            ),
        }
    }
}
