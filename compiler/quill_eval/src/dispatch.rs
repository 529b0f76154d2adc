//! Dynamic dispatch on the head of a call.
//!
//! A call whose head is not a spec name routes to a spec by the shape of
//! its head value: `(1 2 3)` adds, `("a" "b")` concatenates, `(x:1 y:2)`
//! builds a dict. The head stays in the argument list as the first
//! argument, except for spec values, which are the callee themselves.

use quill_types::{Kind, Pool};

use crate::error::{internal, unresolvable_call};
use crate::{Builtins, EvalResult, Exp, SpecRef, Val};

/// Coarse shape of a head value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Typ,
    Spec,
    Num,
    Char,
    List,
    Keyr,
    Tag,
}

impl Shape {
    /// The shape of a value of kind `kind`, if it has one.
    pub fn of(kind: Kind) -> Option<Shape> {
        let base = kind.base();
        if base.is_empty() {
            return None;
        }
        let shape = if base == Kind::TYP {
            Shape::Typ
        } else if Kind::SPEC.contains(base) {
            Shape::Spec
        } else if Kind::NUM.contains(base) {
            Shape::Num
        } else if Kind::CHAR.contains(base) {
            Shape::Char
        } else if base == Kind::LIST {
            Shape::List
        } else if Kind::KEYR.contains(base) {
            Shape::Keyr
        } else if base == Kind::TAG {
            Shape::Tag
        } else {
            return None;
        };
        Some(shape)
    }

    /// The built-in spec this shape routes to; `None` for spec values,
    /// which are called directly.
    pub fn target(self) -> Option<&'static str> {
        match self {
            Shape::Typ => Some("con"),
            Shape::Spec => None,
            Shape::Num => Some("add"),
            Shape::Char => Some("cat"),
            Shape::List => Some("apd"),
            Shape::Keyr => Some("mut"),
            Shape::Tag => Some("tag"),
        }
    }
}

/// Select the spec for a call with the resolved `head`. Returns the spec
/// and whether the head is consumed as the callee.
pub fn select(builtins: &Builtins, pool: &Pool, head: &Exp) -> EvalResult<(SpecRef, bool)> {
    let shape = match head {
        Exp::Lit(lit, _) => {
            if let Val::Spec(spec) = &lit.val {
                return Ok((spec.clone(), true));
            }
            Shape::of(lit.ty.kind)
        }
        Exp::Tag(_) => Some(Shape::Tag),
        Exp::Sym(_) | Exp::Call(_) | Exp::Tupl(_) => None,
    };
    let unresolvable = || unresolvable_call(pool.format_type(&head.ty(pool))).at(head.span());

    let shape = shape.ok_or_else(unresolvable)?;
    let name = shape.target().ok_or_else(unresolvable)?;
    let spec = builtins
        .get(name)
        .ok_or_else(|| internal(format!("dispatch target {name} is not registered")))?;
    tracing::debug!(?shape, spec = name, "dispatch");
    Ok((spec, false))
}
