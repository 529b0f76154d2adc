//! Type errors.
//!
//! Types are carried as printed strings so the error stays meaningful
//! after the pool that produced it is gone.

use std::fmt;

/// Error from unification, reference resolution or the type syntax.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeError {
    /// The base kinds of two types have no common category.
    Mismatch {
        /// The expected type (left side of the unification).
        expected: String,
        /// The type found (right side).
        found: String,
    },

    /// Two parameter lists differ in length or keys.
    ShapeMismatch { expected: String, found: String },

    /// A type still carrying a selector or reference reached unification.
    Unresolved { ty: String },

    /// No declared type for a named reference.
    UnknownRef { name: String },

    /// A selector path does not name a sibling parameter.
    UnknownSelector { path: String },

    /// Malformed type syntax.
    Syntax {
        /// Byte offset into the parsed text.
        pos: usize,
        message: String,
    },

    /// Type-edit recursion exceeded a sane depth.
    ///
    /// This is an internal consistency violation, not a user error.
    DepthExceeded { depth: usize },
}

impl TypeError {
    pub(crate) fn syntax(pos: usize, message: impl Into<String>) -> Self {
        TypeError::Syntax {
            pos,
            message: message.into(),
        }
    }

    /// Whether this error comes from reference or selector resolution.
    pub fn is_reference_error(&self) -> bool {
        matches!(self, Self::UnknownRef { .. } | Self::UnknownSelector { .. })
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::ShapeMismatch { expected, found } => {
                write!(f, "parameter lists differ: expected {expected}, found {found}")
            }
            Self::Unresolved { ty } => {
                write!(f, "cannot unify unresolved type {ty}")
            }
            Self::UnknownRef { name } => write!(f, "unknown type reference @{name}"),
            Self::UnknownSelector { path } => write!(f, "unresolvable selector .{path}"),
            Self::Syntax { pos, message } => {
                write!(f, "invalid type syntax at {pos}: {message}")
            }
            Self::DepthExceeded { depth } => {
                write!(f, "type recursion exceeded depth {depth}")
            }
        }
    }
}

impl std::error::Error for TypeError {}
