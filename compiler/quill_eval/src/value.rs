//! Literal values.
//!
//! A [`Lit`] pairs a runtime [`Val`] with its resolved [`Type`]. This is
//! the small value layer specs work against: a zero predicate, an absent
//! predicate, assignment with conversion, and keyed or indexed access.

#![allow(clippy::format_push_string)] // Literal printing prioritizes clarity over allocation

use std::cmp::Ordering;
use std::rc::Rc;

use quill_types::{Kind, Pool, Type};

use crate::error::spec_error;
use crate::{EvalResult, SpecRef};

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Str(Box<str>),
    List(Vec<Lit>),
    /// Ordered key/value pairs.
    Dict(Vec<(Box<str>, Lit)>),
    Typ(Type),
    Spec(SpecRef),
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Null, Val::Null) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Real(a), Val::Real(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::List(a), Val::List(b)) => a == b,
            (Val::Dict(a), Val::Dict(b)) => a == b,
            (Val::Typ(a), Val::Typ(b)) => a == b,
            (Val::Spec(a), Val::Spec(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

/// A typed literal value.
#[derive(Clone, Debug, PartialEq)]
pub struct Lit {
    pub ty: Type,
    pub val: Val,
}

impl Lit {
    pub fn new(ty: Type, val: Val) -> Self {
        Lit { ty, val }
    }

    /// The absent value, typed as an optional of anything.
    pub fn null() -> Self {
        Lit::new(Type::VOID.optional(), Val::Null)
    }

    pub fn bool(b: bool) -> Self {
        Lit::new(Type::BOOL, Val::Bool(b))
    }

    pub fn int(i: i64) -> Self {
        Lit::new(Type::INT, Val::Int(i))
    }

    pub fn real(r: f64) -> Self {
        Lit::new(Type::REAL, Val::Real(r))
    }

    /// A number literal as written in source: typed `num` whatever its
    /// representation.
    pub fn num(val: Val) -> Self {
        Lit::new(Type::NUM, val)
    }

    pub fn str(s: &str) -> Self {
        Lit::new(Type::STR, Val::Str(s.into()))
    }

    pub fn typ(t: Type) -> Self {
        Lit::new(Type::TYP, Val::Typ(t))
    }

    /// A spec value typed by its signature.
    pub fn spec(spec: SpecRef, sig: Type) -> Self {
        Lit::new(sig, Val::Spec(spec))
    }

    pub fn is_null(&self) -> bool {
        matches!(self.val, Val::Null)
    }

    /// Whether this is the zero value of its kind.
    pub fn is_zero(&self) -> bool {
        match &self.val {
            Val::Null => true,
            Val::Bool(b) => !b,
            Val::Int(i) => *i == 0,
            Val::Real(r) => *r == 0.0,
            Val::Str(s) => s.is_empty(),
            Val::List(items) => items.is_empty(),
            Val::Dict(entries) => entries.is_empty(),
            Val::Typ(t) => t.is_void(),
            Val::Spec(_) => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.val {
            Val::Int(i) => Some(i),
            #[allow(clippy::cast_possible_truncation)]
            Val::Real(r) => Some(r as i64),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self.val {
            #[allow(clippy::cast_precision_loss)]
            Val::Int(i) => Some(i as f64),
            Val::Real(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.val {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_spec(&self) -> Option<&SpecRef> {
        match &self.val {
            Val::Spec(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_typ(&self) -> Option<&Type> {
        match &self.val {
            Val::Typ(t) => Some(t),
            _ => None,
        }
    }

    /// The zero value of `ty`.
    pub fn zero_of(ty: &Type) -> Lit {
        let base = ty.kind.base();
        let val = if ty.is_optional() || base.is_empty() {
            Val::Null
        } else if base == Kind::BOOL {
            Val::Bool(false)
        } else if base == Kind::REAL {
            Val::Real(0.0)
        } else if Kind::NUM.contains(base) {
            Val::Int(0)
        } else if Kind::CHAR.contains(base) {
            Val::Str("".into())
        } else if base == Kind::LIST || base == Kind::TUPL {
            Val::List(Vec::new())
        } else if Kind::KEYR.contains(base) {
            Val::Dict(Vec::new())
        } else if base == Kind::TYP {
            Val::Typ(Type::VOID)
        } else {
            Val::Null
        };
        Lit::new(ty.clone(), val)
    }

    /// Assign `other` to this literal, converting to this literal's type.
    pub fn assign(&mut self, other: Lit) -> EvalResult<()> {
        let base = self.ty.kind.base();
        let fail = |from: &Val| {
            spec_error(
                "assign",
                format!(
                    "cannot assign {} to {}",
                    val_kind(from),
                    base.name().unwrap_or("_")
                ),
            )
        };
        let val = match other.val {
            Val::Null if self.ty.is_optional() || base.is_empty() => Val::Null,
            val if base.is_empty() || base == Kind::ANY => val,
            val if base == Kind::BOOL => Val::Bool(!Lit::new(Type::VOID, val).is_zero()),
            val if base == Kind::REAL => match val {
                #[allow(clippy::cast_precision_loss)]
                Val::Int(i) => Val::Real(i as f64),
                Val::Real(r) => Val::Real(r),
                Val::Str(ref s) => Val::Real(s.trim().parse().map_err(|_| fail(&val))?),
                other => return Err(fail(&other)),
            },
            val if Kind::NUM.contains(base) => match val {
                Val::Int(i) => Val::Int(i),
                Val::Bool(b) => Val::Int(i64::from(b)),
                #[allow(clippy::cast_possible_truncation)]
                Val::Real(r) if base != Kind::NUM => Val::Int(r as i64),
                Val::Real(r) => Val::Real(r),
                Val::Str(ref s) => Val::Int(s.trim().parse().map_err(|_| fail(&val))?),
                other => return Err(fail(&other)),
            },
            val if Kind::CHAR.contains(base) => match val {
                Val::Str(s) => Val::Str(s),
                Val::Int(i) => Val::Str(i.to_string().into()),
                Val::Real(r) => Val::Str(format!("{r:?}").into()),
                Val::Bool(b) => Val::Str(b.to_string().into()),
                other => return Err(fail(&other)),
            },
            Val::List(items) if base == Kind::LIST || base == Kind::TUPL => Val::List(items),
            Val::Dict(entries) if Kind::KEYR.contains(base) => Val::Dict(entries),
            Val::Typ(t) if base == Kind::TYP => Val::Typ(t),
            Val::Spec(s) if Kind::SPEC.contains(base) => Val::Spec(s),
            other => return Err(fail(&other)),
        };
        self.val = val;
        Ok(())
    }

    /// Set `key` of a keyed literal, replacing an existing entry.
    pub fn set_key(&mut self, key: &str, val: Lit) -> EvalResult<()> {
        let Val::Dict(entries) = &mut self.val else {
            return Err(spec_error(
                "set",
                format!("cannot set key {key} on {}", val_kind(&self.val)),
            ));
        };
        match entries.iter_mut().find(|(k, _)| &**k == key) {
            Some((_, slot)) => *slot = val,
            None => entries.push((key.into(), val)),
        }
        Ok(())
    }

    /// Set index `idx` of an indexed literal. Negative indices count from
    /// the end.
    pub fn set_idx(&mut self, idx: i64, val: Lit) -> EvalResult<()> {
        let Val::List(items) = &mut self.val else {
            return Err(spec_error(
                "set",
                format!("cannot set index {idx} on {}", val_kind(&self.val)),
            ));
        };
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
        let at = if idx < 0 { len + idx } else { idx };
        match usize::try_from(at).ok().and_then(|at| items.get_mut(at)) {
            Some(slot) => {
                *slot = val;
                Ok(())
            }
            None => Err(spec_error("set", format!("index {idx} out of bounds"))),
        }
    }

    /// Entries of a keyed literal in insertion order.
    pub fn iter_keys(&self) -> impl Iterator<Item = (&str, &Lit)> {
        let entries: &[(Box<str>, Lit)] = match &self.val {
            Val::Dict(entries) => entries,
            _ => &[],
        };
        entries.iter().map(|(k, v)| (&**k, v))
    }

    /// Items of an indexed literal.
    pub fn iter_idx(&self) -> impl Iterator<Item = &Lit> {
        let items: &[Lit] = match &self.val {
            Val::List(items) => items,
            _ => &[],
        };
        items.iter()
    }

    /// The entry under `key`, compared case-insensitively.
    pub fn key(&self, key: &str) -> Option<&Lit> {
        self.iter_keys()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Value equality; numbers compare across representations.
    pub fn equals(&self, other: &Lit) -> bool {
        match (&self.val, &other.val) {
            (Val::Int(_) | Val::Real(_), Val::Int(_) | Val::Real(_)) => {
                self.compare(other) == Some(Ordering::Equal)
            }
            (Val::List(a), Val::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
            }
            (Val::Dict(a), Val::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.equals(vb))
            }
            (a, b) => a == b,
        }
    }

    /// Ordering of numbers, strings and booleans.
    pub fn compare(&self, other: &Lit) -> Option<Ordering> {
        match (&self.val, &other.val) {
            (Val::Int(a), Val::Int(b)) => Some(a.cmp(b)),
            (Val::Int(_) | Val::Real(_), Val::Int(_) | Val::Real(_)) => {
                self.as_real()?.partial_cmp(&other.as_real()?)
            }
            (Val::Str(a), Val::Str(b)) => Some(a.cmp(b)),
            (Val::Bool(a), Val::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Print this literal in source syntax.
    pub fn to_text(&self, pool: &Pool) -> String {
        let mut buf = String::new();
        self.write(pool, &mut buf);
        buf
    }

    fn write(&self, pool: &Pool, buf: &mut String) {
        match &self.val {
            Val::Null => buf.push_str("null"),
            Val::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
            Val::Int(i) => buf.push_str(&i.to_string()),
            Val::Real(r) => buf.push_str(&format!("{r:?}")),
            Val::Str(s) => {
                buf.push('"');
                for c in s.chars() {
                    match c {
                        '"' => buf.push_str("\\\""),
                        '\\' => buf.push_str("\\\\"),
                        '\n' => buf.push_str("\\n"),
                        '\t' => buf.push_str("\\t"),
                        c => buf.push(c),
                    }
                }
                buf.push('"');
            }
            Val::List(items) => {
                buf.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(' ');
                    }
                    item.write(pool, buf);
                }
                buf.push(']');
            }
            Val::Dict(entries) => {
                buf.push('{');
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        buf.push(' ');
                    }
                    buf.push_str(k);
                    buf.push(':');
                    v.write(pool, buf);
                }
                buf.push('}');
            }
            Val::Typ(t) => buf.push_str(&pool.format_type(t)),
            Val::Spec(_) => buf.push_str(&pool.format_type(&self.ty)),
        }
    }
}

fn val_kind(val: &Val) -> &'static str {
    match val {
        Val::Null => "null",
        Val::Bool(_) => "bool",
        Val::Int(_) => "int",
        Val::Real(_) => "real",
        Val::Str(_) => "str",
        Val::List(_) => "list",
        Val::Dict(_) => "dict",
        Val::Typ(_) => "typ",
        Val::Spec(_) => "spec",
    }
}

#[cfg(test)]
mod tests;
