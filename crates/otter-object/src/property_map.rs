//! Own-property storage with the ordinary key order.
//!
//! Iteration yields index keys ascending, then string keys in insertion
//! order, then symbol keys in insertion order. Replacing the descriptor of an
//! existing key keeps its position; removing a key and adding it again moves
//! it to the end of its group.

use crate::property::{PropertyDescriptor, PropertyKey};
use crate::string::JsString;
use crate::symbol::Symbol;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::collections::BTreeMap;

/// Ordered own-property table
#[derive(Debug, Default)]
pub struct PropertyMap {
    indices: BTreeMap<u32, PropertyDescriptor>,
    strings: IndexMap<JsString, PropertyDescriptor, FxBuildHasher>,
    symbols: IndexMap<Symbol, PropertyDescriptor, FxBuildHasher>,
}

impl PropertyMap {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of own properties
    pub fn len(&self) -> usize {
        self.indices.len() + self.strings.len() + self.symbols.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a descriptor
    pub fn get(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        match key.canonical().as_ref() {
            PropertyKey::Index(i) => self.indices.get(i),
            PropertyKey::String(s) => self.strings.get(s),
            PropertyKey::Symbol(sym) => self.symbols.get(sym),
        }
    }

    /// Look up a descriptor for in-place update
    pub fn get_mut(&mut self, key: &PropertyKey) -> Option<&mut PropertyDescriptor> {
        match key.canonical().as_ref() {
            PropertyKey::Index(i) => self.indices.get_mut(i),
            PropertyKey::String(s) => self.strings.get_mut(s),
            PropertyKey::Symbol(sym) => self.symbols.get_mut(sym),
        }
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, keeping the position of an existing key
    pub fn insert(&mut self, key: PropertyKey, desc: PropertyDescriptor) -> Option<PropertyDescriptor> {
        match key.into_canonical() {
            PropertyKey::Index(i) => self.indices.insert(i, desc),
            PropertyKey::String(s) => self.strings.insert(s, desc),
            PropertyKey::Symbol(sym) => self.symbols.insert(sym, desc),
        }
    }

    /// Remove a key
    pub fn remove(&mut self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        match key.canonical().as_ref() {
            PropertyKey::Index(i) => self.indices.remove(i),
            PropertyKey::String(s) => self.strings.shift_remove(s),
            PropertyKey::Symbol(sym) => self.symbols.shift_remove(sym),
        }
    }

    /// All keys in order
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut keys = Vec::with_capacity(self.len());
        keys.extend(self.indices.keys().map(|&i| PropertyKey::Index(i)));
        keys.extend(self.strings.keys().cloned().map(PropertyKey::String));
        keys.extend(self.symbols.keys().cloned().map(PropertyKey::Symbol));
        keys
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &PropertyDescriptor)> {
        self.indices
            .iter()
            .map(|(&i, d)| (PropertyKey::Index(i), d))
            .chain(self.strings.iter().map(|(s, d)| (PropertyKey::String(s.clone()), d)))
            .chain(self.symbols.iter().map(|(s, d)| (PropertyKey::Symbol(s.clone()), d)))
    }

    /// Index keys `>= start`, highest first
    pub fn indices_from(&self, start: u32) -> Vec<u32> {
        self.indices.range(start..).rev().map(|(&i, _)| i).collect()
    }

    /// Descriptors only, in order
    pub fn descriptors_mut(&mut self) -> impl Iterator<Item = &mut PropertyDescriptor> {
        self.indices
            .values_mut()
            .chain(self.strings.values_mut())
            .chain(self.symbols.values_mut())
    }
}
