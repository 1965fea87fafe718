//! Error types for Horizon Gadget core.

use std::fmt;

use crate::variant::VariantType;

/// Errors produced while invoking a [`Callable`](crate::Callable).
///
/// These are recoverable data errors. Passing the wrong number of
/// arguments to [`Callable::call`](crate::Callable::call) is a contract
/// violation and asserts instead; [`Callable::invoke`](crate::Callable::invoke)
/// reports it as [`CallError::ArgumentCount`] for marshallers that validate
/// before calling.
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// The number of arguments does not match the declared count.
    ArgumentCount {
        /// Declared argument count.
        expected: usize,
        /// Supplied argument count.
        got: usize,
    },
    /// An argument could not be converted to its declared type.
    ArgumentType {
        /// Zero-based position of the argument.
        index: usize,
        /// Declared type.
        expected: VariantType,
        /// Type of the supplied value.
        got: VariantType,
    },
    /// A dynamic target produced a value that cannot be converted to the
    /// declared return type.
    ReturnType {
        /// Declared return type.
        expected: VariantType,
        /// Type actually produced.
        got: VariantType,
    },
    /// The object a method slot was bound to has been dropped.
    ReceiverDropped,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArgumentCount { expected, got } => {
                write!(f, "expected {expected} arguments, got {got}")
            }
            Self::ArgumentType {
                index,
                expected,
                got,
            } => {
                write!(f, "argument {index}: cannot convert {got} to {expected}")
            }
            Self::ReturnType { expected, got } => {
                write!(f, "return value: cannot convert {got} to {expected}")
            }
            Self::ReceiverDropped => write!(f, "the bound receiver no longer exists"),
        }
    }
}

impl std::error::Error for CallError {}

/// Result type for callable invocation.
pub type CallResult<T> = Result<T, CallError>;

/// Errors produced by property access on a scriptable object.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// No property with this id or name exists.
    NotFound {
        /// The name or id that was looked up.
        name: String,
    },
    /// The id resolves to a method, a constant or a dynamic property, which
    /// cannot be read or written by id.
    NotAccessible {
        /// The property name.
        name: String,
        /// What the name actually denotes.
        kind: &'static str,
    },
    /// Attempted to write a property without a setter.
    ReadOnly {
        /// The property name.
        name: String,
    },
    /// Attempted to read a property without a getter.
    WriteOnly {
        /// The property name.
        name: String,
    },
    /// The value cannot be coerced to the declared property type.
    TypeMismatch {
        /// The property name.
        name: String,
        /// Declared type.
        expected: VariantType,
        /// Type of the supplied value.
        got: VariantType,
    },
    /// The getter or setter failed.
    Call(CallError),
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "property '{name}' not found"),
            Self::NotAccessible { name, kind } => {
                write!(f, "'{name}' is a {kind} and cannot be accessed as a property")
            }
            Self::ReadOnly { name } => write!(f, "property '{name}' is read-only"),
            Self::WriteOnly { name } => write!(f, "property '{name}' is write-only"),
            Self::TypeMismatch {
                name,
                expected,
                got,
            } => {
                write!(
                    f,
                    "property '{name}' expects {expected}, cannot convert {got}"
                )
            }
            Self::Call(err) => write!(f, "property accessor failed: {err}"),
        }
    }
}

impl std::error::Error for PropertyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Call(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CallError> for PropertyError {
    fn from(err: CallError) -> Self {
        Self::Call(err)
    }
}

/// Result type for property access.
pub type PropertyResult<T> = Result<T, PropertyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_error_display() {
        let err = CallError::ArgumentType {
            index: 2,
            expected: VariantType::Double,
            got: VariantType::String,
        };
        assert_eq!(err.to_string(), "argument 2: cannot convert STRING to DOUBLE");
    }

    #[test]
    fn test_property_error_source() {
        use std::error::Error;

        let err = PropertyError::from(CallError::ReceiverDropped);
        assert!(err.source().is_some());
        assert!(PropertyError::ReadOnly { name: "x".into() }.source().is_none());
    }
}
