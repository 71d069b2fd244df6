//! Thread-confined interior mutability for object storage.
//!
//! `ObjectCell<T>` wraps `RefCell<T>`. Getters, setters, proxy traps and
//! native functions may re-enter the engine and touch the same object, so a
//! borrow must never be held across a call into any of them. Callers copy
//! what they need out of the cell, drop the guard, and only then call out.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;

/// Interior mutability wrapper for single-threaded object storage
pub struct ObjectCell<T> {
    value: RefCell<T>,
}

impl<T> ObjectCell<T> {
    /// Create a new cell
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
        }
    }

    /// Borrow immutably. Panics if an exclusive borrow is active.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, T> {
        self.value.borrow()
    }

    /// Borrow mutably. Panics if any borrow is active.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.value.borrow_mut()
    }

    /// Run `f` with shared access and return its result
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Run `f` with exclusive access and return its result
    #[inline]
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.borrow_mut())
    }
}

impl<T: Default> Default for ObjectCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObjectCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.try_borrow() {
            Ok(value) => f.debug_struct("ObjectCell").field("value", &*value).finish(),
            Err(_) => f
                .debug_struct("ObjectCell")
                .field("value", &"<borrowed>")
                .finish(),
        }
    }
}
