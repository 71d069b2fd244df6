//! Object model error types

use crate::memory::{BudgetLimit, MemUsage};
use crate::value::Value;
use thiserror::Error;

/// Errors produced by object operations, export and memory accounting.
///
/// `Display` renders the bare message; [`ObjectError::name`] gives the
/// ECMAScript error constructor the condition surfaces as in script.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Write rejected by a non-writable data property or a setterless accessor
    #[error("Cannot assign to read only property '{key}'")]
    ReadOnlyProperty {
        /// Rendered property key
        key: String,
    },

    /// New property on a non-extensible object
    #[error("Cannot add property {key}, object is not extensible")]
    NotExtensible {
        /// Rendered property key
        key: String,
    },

    /// Redefinition rejected by a non-configurable property
    #[error("Cannot redefine property: {key}")]
    NonConfigurable {
        /// Rendered property key
        key: String,
    },

    /// Generic type error
    #[error("{0}")]
    TypeError(String),

    /// Generic range error
    #[error("{0}")]
    RangeError(String),

    /// A value thrown by a native function
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// Fixed-length destination does not match the source length
    #[error("cannot convert {value} to {target}: lengths mismatch (have {have}, need {need})")]
    ShapeMismatch {
        /// Rendered source value
        value: String,
        /// Destination type
        target: String,
        /// Source length
        have: usize,
        /// Destination length
        need: usize,
    },

    /// Source exposes neither the iterable protocol nor an array-like shape
    #[error("cannot convert {value} to {target}: not an array or iterable")]
    NotIterable {
        /// Rendered source value
        value: String,
        /// Destination type
        target: String,
    },

    /// Source value has no representation in the destination type
    #[error("cannot convert {value} to {target}")]
    Conversion {
        /// Rendered source value
        value: String,
        /// Destination type
        target: String,
    },

    /// A non-shareable destination was re-entered while still being built
    #[error("circular reference while converting to {target}")]
    CircularReference {
        /// Destination type
        target: String,
    },

    /// Memory estimation stopped early; `partial` is the usage seen so far
    #[error("memory budget exceeded ({limit}): {} bytes accounted", .partial.total)]
    MemoryBudgetExceeded {
        /// Which budget ran out
        limit: BudgetLimit,
        /// Best-effort usage up to the point of cancellation
        partial: MemUsage,
    },

    /// Configuration could not be loaded
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ObjectError {
    /// Create a type error
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError(message.into())
    }

    /// Create a range error
    pub fn range_error(message: impl Into<String>) -> Self {
        Self::RangeError(message.into())
    }

    /// Create a conversion error
    pub fn conversion(value: impl ToString, target: impl Into<String>) -> Self {
        Self::Conversion {
            value: value.to_string(),
            target: target.into(),
        }
    }

    /// Name of the ECMAScript error constructor for this condition
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReadOnlyProperty { .. }
            | Self::NotExtensible { .. }
            | Self::NonConfigurable { .. }
            | Self::TypeError(_)
            | Self::ShapeMismatch { .. }
            | Self::NotIterable { .. }
            | Self::Conversion { .. }
            | Self::CircularReference { .. } => "TypeError",
            Self::RangeError(_) | Self::MemoryBudgetExceeded { .. } => "RangeError",
            Self::Thrown(_) | Self::InvalidConfig(_) => "Error",
        }
    }

    /// Whether this is the soft budget condition of the memory accountant
    pub fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::MemoryBudgetExceeded { .. })
    }
}

/// Result type for object operations
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_only_message_is_verbatim() {
        let err = ObjectError::ReadOnlyProperty {
            key: "accessor_ro".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot assign to read only property 'accessor_ro'"
        );
        assert_eq!(err.name(), "TypeError");
    }

    #[test]
    fn test_shape_mismatch_mentions_lengths() {
        let err = ObjectError::ShapeMismatch {
            value: "1,2".into(),
            target: "[i64; 3]".into(),
            have: 2,
            need: 3,
        };
        assert!(err.to_string().contains("lengths mismatch"));
    }
}
