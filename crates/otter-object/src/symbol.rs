//! Symbols, well-known symbols and the `Symbol.for` registry

use crate::string::JsString;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

#[derive(Debug)]
struct SymbolData {
    description: Option<JsString>,
}

/// A symbol value. Two symbols are equal only if they are the same symbol;
/// the description plays no part in equality.
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

impl Symbol {
    /// Create a fresh, unique symbol
    pub fn new(description: Option<&str>) -> Self {
        Self(Rc::new(SymbolData {
            description: description.map(JsString::new),
        }))
    }

    /// The description given at creation
    pub fn description(&self) -> Option<&JsString> {
        self.0.description.as_ref()
    }

    /// Identity address
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.description {
            Some(desc) => write!(f, "Symbol({desc})"),
            None => f.write_str("Symbol()"),
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Well-known symbols used by the object model
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    /// `Symbol.iterator`
    pub iterator: Symbol,
    /// `Symbol.toStringTag`
    pub to_string_tag: Symbol,
}

impl WellKnownSymbols {
    pub(crate) fn new() -> Self {
        Self {
            iterator: Symbol::new(Some("Symbol.iterator")),
            to_string_tag: Symbol::new(Some("Symbol.toStringTag")),
        }
    }
}

/// Per-realm registry backing `Symbol.for()` / `Symbol.keyFor()`
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    map: RefCell<FxHashMap<JsString, Symbol>>,
}

impl SymbolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// `Symbol.for(key)`: the registered symbol for `key`, created on first use
    pub fn for_key(&self, key: &str) -> Symbol {
        if let Some(sym) = self.map.borrow().get(key) {
            return sym.clone();
        }
        let sym = Symbol::new(Some(key));
        self.map.borrow_mut().insert(JsString::new(key), sym.clone());
        sym
    }

    /// `Symbol.keyFor(sym)`
    pub fn key_for(&self, symbol: &Symbol) -> Option<JsString> {
        self.map
            .borrow()
            .iter()
            .find(|(_, registered)| *registered == symbol)
            .map(|(key, _)| key.clone())
    }
}
