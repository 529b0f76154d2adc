//! Resolution and evaluation errors.
//!
//! Every error carries a typed [`EvalErrorKind`] and, where known, the
//! [`Span`] of the expression that failed. Each kind maps to a stable
//! error code:
//!
//! | range   | category                                   |
//! |---------|--------------------------------------------|
//! | `E1xxx` | symbol lookup                              |
//! | `E2xxx` | call argument layout                       |
//! | `E3xxx` | unification and reference resolution       |
//! | `E4xxx` | errors raised by a spec while evaluating   |
//! | `E5xxx` | malformed source text                      |
//! | `E9xxx` | internal consistency violations            |

use std::fmt;

use quill_types::TypeError;

use crate::{Lit, Span};

/// Result of resolution or evaluation.
pub type EvalResult<T = Lit> = Result<T, EvalError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EvalErrorKind {
    // Lookup
    SymbolNotFound {
        name: String,
    },

    // Layout
    MissingParam {
        index: usize,
        ty: String,
    },
    DuplicateTag {
        name: String,
    },
    UnknownTag {
        name: String,
    },
    UnexpectedArg {
        index: usize,
    },
    TagRunArity {
        arity: usize,
        got: usize,
    },
    MixedArgs,

    // Types
    Type(TypeError),
    UnresolvableCall {
        ty: String,
    },

    // Spec
    Spec {
        spec: String,
        message: String,
    },

    // Source
    Syntax {
        message: String,
    },

    // Internal
    DepthExceeded {
        depth: usize,
    },
    Internal {
        message: String,
    },
}

impl EvalErrorKind {
    /// Stable error code of this kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SymbolNotFound { .. } => "E1001",
            Self::MissingParam { .. } => "E2001",
            Self::DuplicateTag { .. } => "E2002",
            Self::UnknownTag { .. } => "E2003",
            Self::UnexpectedArg { .. } => "E2004",
            Self::TagRunArity { .. } => "E2005",
            Self::MixedArgs => "E2006",
            Self::Type(err) => match err {
                TypeError::Mismatch { .. } => "E3001",
                TypeError::ShapeMismatch { .. } => "E3002",
                TypeError::Unresolved { .. } => "E3003",
                TypeError::UnknownRef { .. } => "E3101",
                TypeError::UnknownSelector { .. } => "E3102",
                TypeError::Syntax { .. } => "E5002",
                TypeError::DepthExceeded { .. } => "E9002",
            },
            Self::UnresolvableCall { .. } => "E3010",
            Self::Spec { .. } => "E4001",
            Self::Syntax { .. } => "E5001",
            Self::DepthExceeded { .. } => "E9002",
            Self::Internal { .. } => "E9001",
        }
    }

    /// Whether this kind reports a defect rather than a user error.
    pub fn is_internal(&self) -> bool {
        self.code().starts_with("E9")
    }
}

impl fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymbolNotFound { name } => write!(f, "symbol not found: {name}"),

            Self::MissingParam { index, ty } => {
                write!(f, "missing argument for parameter {index} of type {ty}")
            }
            Self::DuplicateTag { name } => write!(f, "duplicate argument for tag {name}"),
            Self::UnknownTag { name } => write!(f, "no parameter matches tag {name}"),
            Self::UnexpectedArg { index } => write!(f, "unexpected argument at position {index}"),
            Self::TagRunArity { arity, got } => {
                write!(f, "expected a multiple of {arity} arguments, got {got}")
            }
            Self::MixedArgs => write!(f, "cannot mix tagged and positional arguments"),

            Self::Type(err) => write!(f, "{err}"),
            Self::UnresolvableCall { ty } => write!(f, "cannot call a value of type {ty}"),

            Self::Spec { spec, message } => write!(f, "{spec}: {message}"),

            Self::Syntax { message } => write!(f, "syntax error: {message}"),

            Self::DepthExceeded { depth } => {
                write!(f, "maximum nesting depth exceeded (limit: {depth})")
            }
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

/// Resolution or evaluation error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: EvalErrorKind,
    /// Source location of the failing expression.
    pub span: Option<Span>,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind) -> Self {
        EvalError { kind, span: None }
    }

    /// Attach `span` unless a more precise one is already set.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    #[inline]
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

// Factories

pub fn symbol_not_found(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::SymbolNotFound {
        name: name.to_string(),
    })
}

pub fn missing_param(index: usize, ty: String) -> EvalError {
    EvalError::new(EvalErrorKind::MissingParam { index, ty })
}

pub fn duplicate_tag(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::DuplicateTag {
        name: name.to_string(),
    })
}

pub fn unknown_tag(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::UnknownTag {
        name: name.to_string(),
    })
}

pub fn unexpected_arg(index: usize) -> EvalError {
    EvalError::new(EvalErrorKind::UnexpectedArg { index })
}

pub fn unresolvable_call(ty: String) -> EvalError {
    EvalError::new(EvalErrorKind::UnresolvableCall { ty })
}

pub fn spec_error(spec: &str, message: impl Into<String>) -> EvalError {
    EvalError::new(EvalErrorKind::Spec {
        spec: spec.to_string(),
        message: message.into(),
    })
}

pub fn syntax(message: impl Into<String>, span: Span) -> EvalError {
    EvalError::new(EvalErrorKind::Syntax {
        message: message.into(),
    })
    .at(span)
}

pub fn internal(message: impl Into<String>) -> EvalError {
    let message = message.into();
    tracing::error!(%message, "internal error");
    EvalError::new(EvalErrorKind::Internal { message })
}

impl From<TypeError> for EvalError {
    fn from(err: TypeError) -> Self {
        EvalError::new(EvalErrorKind::Type(err))
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for EvalError {}
