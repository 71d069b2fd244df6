//! Proxy exotic objects
//!
//! A proxy pairs a target with a handler whose function-valued properties
//! ("traps") intercept the internal methods. The trap dispatch and invariant
//! checks live in [`crate::proxy_operations`].

use crate::error::{ObjectError, ObjectResult};
use crate::object::ObjectRef;
use std::cell::Cell;
use std::fmt;

/// Proxy state: target and handler are fixed at creation
pub struct JsProxy {
    target: ObjectRef,
    handler: ObjectRef,
    callable: bool,
    revoked: Cell<bool>,
}

impl fmt::Debug for JsProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_revoked() {
            write!(f, "Proxy {{ <revoked> }}")
        } else {
            write!(f, "Proxy {{ target: {:?} }}", self.target)
        }
    }
}

impl JsProxy {
    pub(crate) fn new(target: ObjectRef, handler: ObjectRef) -> Self {
        let callable = target.is_callable();
        Self {
            target,
            handler,
            callable,
            revoked: Cell::new(false),
        }
    }

    /// Target, or a `TypeError` once revoked
    pub fn target(&self) -> ObjectResult<ObjectRef> {
        self.check_live("access the target of")?;
        Ok(self.target.clone())
    }

    /// Handler, or a `TypeError` once revoked
    pub fn handler(&self) -> ObjectResult<ObjectRef> {
        self.check_live("access the handler of")?;
        Ok(self.handler.clone())
    }

    /// Target without the revocation check, for read-only graph walks
    pub fn target_raw(&self) -> &ObjectRef {
        &self.target
    }

    /// Handler without the revocation check, for read-only graph walks
    pub fn handler_raw(&self) -> &ObjectRef {
        &self.handler
    }

    /// Whether the proxy was created over a callable target
    #[inline]
    pub fn is_callable(&self) -> bool {
        self.callable
    }

    /// Whether `revoke` has been called
    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked.get()
    }

    /// Revoke; every later operation throws a `TypeError`
    pub fn revoke(&self) {
        self.revoked.set(true);
    }

    pub(crate) fn check_live(&self, operation: &str) -> ObjectResult<()> {
        if self.is_revoked() {
            return Err(ObjectError::type_error(format!(
                "Cannot {operation} a proxy that has been revoked"
            )));
        }
        Ok(())
    }
}
