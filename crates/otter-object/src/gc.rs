//! Shared, identity-comparable handles for heap objects.
//!
//! Objects reference each other freely (prototype links, property values,
//! proxy targets), so ownership is shared. `GcRef` compares and hashes by
//! address; structural equality is never used for objects. Reclaiming
//! unreachable cycles belongs to the host collector, not to this crate.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};

/// Shared handle to a heap value, compared by identity
pub struct GcRef<T>(Rc<T>);

impl<T> GcRef<T> {
    /// Allocate a new value
    pub fn new(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Raw pointer to the allocation
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        Rc::as_ptr(&self.0)
    }

    /// Address used as the identity key in visited maps
    #[inline]
    pub fn addr(&self) -> usize {
        self.as_ptr() as usize
    }

    /// Identity comparison
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// Create a non-owning handle
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef(Rc::downgrade(&self.0))
    }
}

impl<T> Clone for GcRef<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> Deref for GcRef<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> PartialEq for GcRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for GcRef<T> {}

impl<T> Hash for GcRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl<T> fmt::Debug for GcRef<T> {
    // Never recurse into the pointee: object graphs may be cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcRef({:#x})", self.addr())
    }
}

/// Non-owning handle, used for bookkeeping that must not keep objects alive
pub struct WeakRef<T>(Weak<T>);

impl<T> WeakRef<T> {
    /// Upgrade if the value is still alive
    pub fn upgrade(&self) -> Option<GcRef<T>> {
        self.0.upgrade().map(GcRef)
    }

    /// Whether the value has been dropped
    pub fn is_dead(&self) -> bool {
        self.0.strong_count() == 0
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeakRef({:#x})", self.0.as_ptr() as usize)
    }
}
