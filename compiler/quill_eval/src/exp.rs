//! Expression tree.
//!
//! The reader builds literals, symbols, tags, tuple groups and unresolved
//! calls. Resolution fills in each call's signature, spec, argument slots
//! and environment in place, and marks each symbol with the environment
//! that resolved it.

use std::fmt;

use quill_types::{Pool, Type};

use crate::{EnvId, Lit, Span, SpecRef};

/// An expression node.
#[derive(Clone, Debug)]
pub enum Exp {
    Lit(Lit, Span),
    Sym(Sym),
    Tag(Tag),
    Tupl(Tupl),
    Call(Box<Call>),
}

impl Exp {
    /// The result type of this expression.
    pub fn ty(&self, pool: &Pool) -> Type {
        match self {
            Exp::Lit(lit, _) => lit.ty.clone(),
            Exp::Sym(sym) => sym.ty.clone(),
            Exp::Tag(_) => Type::TAG,
            Exp::Tupl(tupl) => tupl.ty.clone(),
            Exp::Call(call) => pool.result_of(&call.sig),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Exp::Lit(_, span) => *span,
            Exp::Sym(sym) => sym.span,
            Exp::Tag(tag) => tag.span,
            Exp::Tupl(tupl) => tupl.span,
            Exp::Call(call) => call.span,
        }
    }

    /// The tag name if this is a tag.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Exp::Tag(tag) => Some(&tag.name),
            _ => None,
        }
    }

    pub fn as_lit(&self) -> Option<&Lit> {
        match self {
            Exp::Lit(lit, _) => Some(lit),
            _ => None,
        }
    }

    /// Whether this node needs no further resolution.
    pub fn is_resolved(&self) -> bool {
        match self {
            Exp::Lit(..) => true,
            Exp::Sym(sym) => sym.state != SymState::Unresolved,
            Exp::Tag(tag) => tag.exp.as_deref().map_or(true, Exp::is_resolved),
            Exp::Tupl(tupl) => tupl.items.iter().all(Exp::is_resolved),
            Exp::Call(call) => call.env.is_some(),
        }
    }
}

/// Resolution state of a symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymState {
    Unresolved,
    /// Resolved by environment `env` under `key`.
    Resolved { env: EnvId, key: Box<str> },
}

/// A named reference.
#[derive(Clone, Debug)]
pub struct Sym {
    pub name: Box<str>,
    pub span: Span,
    /// Type as reported by the resolving environment.
    pub ty: Type,
    pub state: SymState,
}

impl Sym {
    pub fn new(name: &str, span: Span) -> Self {
        Sym {
            name: name.into(),
            span,
            ty: Type::VOID,
            state: SymState::Unresolved,
        }
    }

    /// Lookup key: the name with its case folded.
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A `name:exp` tag. A tag without an expression is a flag.
#[derive(Clone, Debug)]
pub struct Tag {
    pub name: Box<str>,
    pub span: Span,
    pub exp: Option<Box<Exp>>,
}

impl Tag {
    pub fn new(name: &str, span: Span, exp: Option<Exp>) -> Self {
        Tag {
            name: name.into(),
            span,
            exp: exp.map(Box::new),
        }
    }
}

/// A group of arguments laid out into one variadic parameter.
#[derive(Clone, Debug)]
pub struct Tupl {
    pub ty: Type,
    pub span: Span,
    pub items: Vec<Exp>,
}

/// A call of a spec.
#[derive(Clone)]
pub struct Call {
    pub span: Span,
    /// Instantiated signature, set during resolution.
    pub sig: Type,
    pub spec: Option<SpecRef>,
    /// Raw arguments with the head first before resolution; one slot per
    /// declared parameter after it.
    pub args: Vec<Option<Exp>>,
    /// Environment the call was resolved in or introduced.
    pub env: Option<EnvId>,
}

impl Call {
    pub fn new(span: Span, raw: Vec<Exp>) -> Self {
        Call {
            span,
            sig: Type::VOID,
            spec: None,
            args: raw.into_iter().map(Some).collect(),
            env: None,
        }
    }

    /// The argument in slot `idx`.
    pub fn arg(&self, idx: usize) -> Option<&Exp> {
        self.args.get(idx).and_then(Option::as_ref)
    }

    /// Slot `idx` as a sequence: the items of a group, a single argument,
    /// or nothing.
    pub fn items(&self, idx: usize) -> &[Exp] {
        match self.arg(idx) {
            None => &[],
            Some(Exp::Tupl(tupl)) => &tupl.items,
            Some(arg) => std::slice::from_ref(arg),
        }
    }

    pub fn items_mut(&mut self, idx: usize) -> &mut [Exp] {
        match self.args.get_mut(idx).and_then(Option::as_mut) {
            None => &mut [],
            Some(Exp::Tupl(tupl)) => &mut tupl.items,
            Some(arg) => std::slice::from_mut(arg),
        }
    }

    /// Name of the resolved spec, or `?`.
    pub fn spec_name(&self) -> &str {
        self.spec.as_ref().map_or("?", |s| s.name())
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("span", &self.span)
            .field("spec", &self.spec_name())
            .field("sig", &self.sig)
            .field("args", &self.args)
            .field("env", &self.env)
            .finish()
    }
}
