//! Type values and the unification engine for Quill.
//!
//! - [`Kind`]: bitset of type categories and markers
//! - [`Type`] and [`Body`]: small type values whose bodies live in a
//!   [`Pool`] and may form cycles
//! - [`Sys`]: the type-system context that binds, updates, instantiates
//!   and unifies types
//!
//! Types print and parse in a compact textual syntax, e.g.
//! `<form@add num@ tupl?|num _>` or `<rec x:int y:int>`.

mod error;
mod kind;
mod pool;
mod stack;
mod syntax;
mod sys;
mod ty;
mod unify;

pub use error::TypeError;
pub use kind::Kind;
pub use pool::Pool;
pub use stack::ensure_sufficient_stack;
pub use sys::{Resolver, Sys};
pub use ty::{Body, BodyId, Const, Param, Type};

// Type is copied around freely during unification; keep it small.
#[cfg(target_pointer_width = "64")]
const _: () = assert!(std::mem::size_of::<Type>() == 32);
