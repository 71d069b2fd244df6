//! Immutable string values

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

/// An immutable, cheaply clonable string
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl JsString {
    /// Create a string
    pub fn new(s: &str) -> Self {
        Self(Rc::from(s))
    }

    /// The empty string
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Borrow as `&str`
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the UTF-8 encoding, in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the string is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }

    /// Number of Unicode scalar values
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self(Rc::from(s))
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
