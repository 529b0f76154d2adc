//! Type values.
//!
//! A [`Type`] is a small value record: kind bits, a variable id, an
//! optional name and an optional handle to a [`Body`] stored in a
//! [`Pool`](crate::Pool). Bodies are addressed by identity, which is what
//! lets a parameter list contain a type pointing back at its own body.

use std::fmt;

use crate::Kind;

/// Handle to a body stored in a [`Pool`](crate::Pool).
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BodyId(u32);

impl BodyId {
    #[inline]
    pub(crate) const fn new(index: u32) -> Self {
        BodyId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyId({})", self.0)
    }
}

/// A type value.
///
/// `id == 0` means concrete or unbound. A positive id with the `VAR` kind
/// marker is a type variable; a positive id without it is a placeholder
/// bound through the [`Sys`](crate::Sys) binding map.
///
/// The derived equality compares body handles, not bodies. Use
/// [`Pool::type_eq`](crate::Pool::type_eq) for structural equality.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Type {
    pub kind: Kind,
    pub id: u32,
    pub name: Option<Box<str>>,
    pub body: Option<BodyId>,
}

impl Type {
    /// The unconstrained type `_`.
    pub const VOID: Type = Type::of(Kind::empty());
    pub const ANY: Type = Type::of(Kind::ANY);
    pub const BOOL: Type = Type::of(Kind::BOOL);
    pub const INT: Type = Type::of(Kind::INT);
    pub const REAL: Type = Type::of(Kind::REAL);
    pub const NUM: Type = Type::of(Kind::NUM);
    pub const STR: Type = Type::of(Kind::STR);
    pub const CHAR: Type = Type::of(Kind::CHAR);
    pub const LIST: Type = Type::of(Kind::LIST);
    pub const DICT: Type = Type::of(Kind::DICT);
    pub const TYP: Type = Type::of(Kind::TYP);
    pub const TAG: Type = Type::of(Kind::TAG);

    /// A body-less, unnamed type of the given kind.
    #[inline]
    pub const fn of(kind: Kind) -> Self {
        Type {
            kind,
            id: 0,
            name: None,
            body: None,
        }
    }

    /// A fresh anonymous type variable. [`Sys::bind`](crate::Sys::bind)
    /// assigns its id.
    #[inline]
    pub const fn var() -> Self {
        Type::of(Kind::VAR)
    }

    /// A type variable constrained to `kind`.
    #[inline]
    pub const fn var_of(kind: Kind) -> Self {
        Type::of(kind.union(Kind::VAR))
    }

    /// A named reference to a declared type.
    pub fn reference(name: &str) -> Self {
        Type {
            kind: Kind::REF,
            id: 0,
            name: Some(name.into()),
            body: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: BodyId) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// This type with the optional marker set.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.kind |= Kind::NONE;
        self
    }

    /// This type with the optional marker removed.
    #[must_use]
    pub fn definite(mut self) -> Self {
        self.kind.remove(Kind::NONE);
        self
    }

    #[inline]
    pub fn is_var(&self) -> bool {
        self.kind.is_var()
    }

    #[inline]
    pub fn is_optional(&self) -> bool {
        self.kind.is_optional()
    }

    /// Whether this is the unconstrained type: empty base, no id, no body.
    #[inline]
    pub fn is_void(&self) -> bool {
        self.kind.base().is_empty() && self.id == 0 && self.body.is_none()
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// One named entry of a parameter list.
///
/// Unnamed parameters have an empty name and key.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Param {
    pub name: Box<str>,
    pub key: Box<str>,
    pub ty: Type,
}

impl Param {
    pub fn new(name: &str, ty: Type) -> Self {
        Param {
            name: name.into(),
            key: name.to_lowercase().into(),
            ty,
        }
    }

    pub fn unnamed(ty: Type) -> Self {
        Param::new("", ty)
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

/// One named integer constant of an enum or bitset.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Const {
    pub name: Box<str>,
    pub key: Box<str>,
    pub val: i64,
}

impl Const {
    pub fn new(name: &str, val: i64) -> Self {
        Const {
            name: name.into(),
            key: name.to_lowercase().into(),
            val,
        }
    }
}

/// Extra data carried by a type.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Body {
    /// A single wrapped type (`list|int`, `tupl?|num`).
    Elem(Type),
    /// A path resolved against the nearest enclosing parameter list.
    Sel(Box<str>),
    /// An ordered set of alternatives.
    Alt(Vec<Type>),
    /// Parameters of a record, tuple, form or function.
    Params(Vec<Param>),
    /// Constants of an enum or bitset.
    Consts(Vec<Const>),
}
