//! Script values
//!
//! Primitives are stored inline; objects are shared [`ObjectRef`] handles.
//! Integral numbers that fit in `i32` are usually kept as [`Value::Int32`],
//! but every numeric consumer goes through [`Value::as_number`], so the two
//! numeric variants are interchangeable.

use crate::object::{ObjectKind, ObjectRef};
use crate::property::PropertyKey;
use crate::string::JsString;
use crate::symbol::Symbol;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use std::fmt;
use std::rc::Rc;

/// A script value
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Boolean(bool),
    /// Number primitive known to be an `i32`
    Int32(i32),
    /// Number primitive
    Number(f64),
    /// String primitive
    String(JsString),
    /// Symbol primitive
    Symbol(Symbol),
    /// BigInt primitive
    BigInt(Rc<BigInt>),
    /// Object reference
    Object(ObjectRef),
}

impl Value {
    /// `undefined`
    #[inline]
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// `null`
    #[inline]
    pub const fn null() -> Self {
        Self::Null
    }

    /// Boolean value
    #[inline]
    pub const fn boolean(b: bool) -> Self {
        Self::Boolean(b)
    }

    /// Int32 number
    #[inline]
    pub const fn int32(n: i32) -> Self {
        Self::Int32(n)
    }

    /// Number value; integral values in `i32` range are stored as `Int32`
    pub fn number(n: f64) -> Self {
        if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 && !is_negative_zero(n)
        {
            Self::Int32(n as i32)
        } else {
            Self::Number(n)
        }
    }

    /// Number value from an unsigned length or index
    pub fn from_u32(n: u32) -> Self {
        match i32::try_from(n) {
            Ok(i) => Self::Int32(i),
            Err(_) => Self::Number(n as f64),
        }
    }

    /// String value
    pub fn string(s: impl Into<JsString>) -> Self {
        Self::String(s.into())
    }

    /// Symbol value
    pub fn symbol(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }

    /// BigInt value
    pub fn bigint(n: BigInt) -> Self {
        Self::BigInt(Rc::new(n))
    }

    /// Object value
    pub fn object(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }

    /// Is `undefined`
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Is `null`
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Is `undefined` or `null`
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Is an object
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Is a number
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int32(_) | Self::Number(_))
    }

    /// Is a string
    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Is a callable object
    pub fn is_callable(&self) -> bool {
        self.as_object().is_some_and(|obj| obj.is_callable())
    }

    /// Object reference, if this is an object
    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Numeric value, if this is a number
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int32(n) => Some(*n as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// String contents, if this is a string
    #[inline]
    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Symbol, if this is a symbol
    #[inline]
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(sym) => Some(sym),
            _ => None,
        }
    }

    /// Boolean, if this is a boolean
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// ToBoolean
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(b) => *b,
            Self::Int32(n) => *n != 0,
            Self::Number(n) => !(*n == 0.0 || n.is_nan()),
            Self::String(s) => !s.is_empty(),
            Self::BigInt(n) => !n.is_zero(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }

    /// ToPropertyKey for values that need no user code to convert
    pub fn to_property_key(&self) -> PropertyKey {
        match self {
            Self::String(s) => PropertyKey::from(s.clone()),
            Self::Symbol(sym) => PropertyKey::Symbol(sym.clone()),
            Self::Int32(n) => PropertyKey::from_number(*n as f64),
            Self::Number(n) => PropertyKey::from_number(*n),
            other => PropertyKey::string(&other.to_string()),
        }
    }

    /// The `typeof` operator
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Int32(_) | Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::BigInt(_) => "bigint",
            Self::Object(obj) if obj.is_callable() => "function",
            Self::Object(_) => "object",
        }
    }

    /// SameValue
    pub fn same_value(a: &Value, b: &Value) -> bool {
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => {
                if x.is_nan() && y.is_nan() {
                    return true;
                }
                x == y && is_negative_zero(x) == is_negative_zero(y)
            }
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => Self::same_non_number(a, b),
        }
    }

    /// SameValueZero: SameValue, except `+0` and `-0` are equal
    pub fn same_value_zero(a: &Value, b: &Value) -> bool {
        match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => (x.is_nan() && y.is_nan()) || x == y,
            (Some(_), None) | (None, Some(_)) => false,
            (None, None) => Self::same_non_number(a, b),
        }
    }

    fn same_non_number(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(x), Self::Boolean(y)) => x == y,
            (Self::String(x), Self::String(y)) => x == y,
            (Self::Symbol(x), Self::Symbol(y)) => x == y,
            (Self::BigInt(x), Self::BigInt(y)) => x == y,
            (Self::Object(x), Self::Object(y)) => ObjectRef::ptr_eq(x, y),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Int32(n) => write!(f, "{n}"),
            Self::Number(n) => f.write_str(&number_to_string(*n)),
            Self::String(s) => f.write_str(s.as_str()),
            Self::Symbol(sym) => write!(f, "{sym}"),
            Self::BigInt(n) => write!(f, "{n}"),
            Self::Object(obj) => match obj.kind() {
                ObjectKind::Primitive(inner) => write!(f, "{inner}"),
                _ => write!(f, "[object {}]", obj.class_name()),
            },
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int32(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::from_u32(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(i) => Self::Int32(i),
            Err(_) => Self::Number(n as f64),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(JsString::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(JsString::from(s))
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Self::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Self::Symbol(sym)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

/// Whether `n` is `-0`
#[inline]
pub fn is_negative_zero(n: f64) -> bool {
    n == 0.0 && n.is_sign_negative()
}

/// Number::toString for radix 10.
///
/// Integral values below 1e21 print in full; other finite values use the
/// shortest round-trip representation, with a signed exponent.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e21 {
        if let Some(i) = n.to_i64() {
            return itoa::Buffer::new().format(i).to_string();
        }
        return format!("{n:.0}");
    }
    let mut buffer = ryu::Buffer::new();
    let repr = buffer.format_finite(n);
    match repr.find('e') {
        Some(pos) if !repr[pos + 1..].starts_with('-') => {
            format!("{}e+{}", &repr[..pos], &repr[pos + 1..])
        }
        _ => repr.to_string(),
    }
}
