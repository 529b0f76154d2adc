//! Resolver and evaluator for Quill expressions.
//!
//! - [`read`]: source text to an [`Exp`] tree
//! - [`Program`]: resolves a tree against an environment chain, then
//!   evaluates it to a [`Lit`]
//! - [`Spec`]: the contract every callable implements, with the standard
//!   catalog in [`Builtins`]
//! - [`layout`]: places call arguments into parameter slots
//!
//! ```text
//! let mut prog = Program::default();
//! let mut exp = prog.read("(add 1 2 3)")?;
//! let val = prog.run(&mut exp)?;   // 6, typed <num>
//! ```

mod builtins;
mod config;
mod dispatch;
mod env;
mod error;
mod exp;
mod layout;
mod program;
mod read;
mod span;
mod spec;
mod value;

pub use builtins::{
    Apd, Arith, ArithOp, Builtins, Cat, Cmp, CmpOp, Con, ErrSpec, FnSpec, FuncSpec, If, Let,
    Logic, Mut, Not, TagSpec, With,
};
pub use config::Config;
pub use dispatch::{select, Shape};
pub use env::{typed_sym, DotEnv, Env, EnvId, FuncEnv, LetEnv};
pub use error::{EvalError, EvalErrorKind, EvalResult};
pub use exp::{Call, Exp, Sym, SymState, Tag, Tupl};
pub use layout::layout;
pub use program::Program;
pub use read::{read, read_nested};
pub use span::Span;
pub use spec::{Spec, SpecRef};
pub use value::{Lit, Val};
