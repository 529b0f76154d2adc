//! Lexical environment chain.
//!
//! Environments live in the [`Program`]'s arena, addressed by [`EnvId`],
//! and link to their parent. Children are always created after their
//! parent, so a parent never refers to a child.
//!
//! Lookup has two phases. At resolve time an environment answers with an
//! expression: a literal for constants, or a symbol annotated with its type
//! and the environment that owns it. At eval time it answers with the
//! literal value held in its current frame.
//!
//! Frames are pushed per evaluation of the scope (one per function call,
//! `let` or `with` body), so the same resolved tree can be evaluated
//! recursively.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use quill_types::{Param, Type};

use crate::error::{duplicate_tag, internal, spec_error, symbol_not_found};
use crate::{EvalResult, Exp, Lit, Program, Spec, SpecRef, Sym, SymState, Val};

/// Handle to an environment in a [`Program`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnvId(u32);

impl EnvId {
    /// The root environment.
    pub const ROOT: EnvId = EnvId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        EnvId(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EnvId({})", self.0)
    }
}

/// A lexical scope that can resolve symbols.
pub trait Env: fmt::Debug {
    /// The enclosing scope; `None` for the root.
    fn parent(&self) -> Option<EnvId>;

    /// Look up `key` on behalf of `sym`.
    ///
    /// `Ok(None)` forwards the lookup to the parent. With `eval` set the
    /// answer must be a literal.
    fn lookup(&self, prog: &mut Program, sym: &Sym, key: &str, eval: bool)
        -> EvalResult<Option<Exp>>;

    /// The key to forward to the parent after a miss.
    fn forward_key<'k>(&self, key: &'k str) -> &'k str {
        key
    }

    /// Enter a new evaluation frame.
    fn push_frame(&self) -> EvalResult<()> {
        Err(internal(format!("{self:?} has no frames")))
    }

    /// Leave the current evaluation frame.
    fn pop_frame(&self) {}

    /// Set slot `idx` of the current frame.
    fn set_slot(&self, idx: usize, val: Lit) -> EvalResult<()> {
        let _ = (idx, val);
        Err(internal(format!("{self:?} has no frames")))
    }
}

/// A symbol resolved by `env` under `key`.
pub fn typed_sym(sym: &Sym, env: EnvId, key: &str, ty: Type) -> Exp {
    Exp::Sym(Sym {
        name: sym.name.clone(),
        span: sym.span,
        ty,
        state: SymState::Resolved {
            env,
            key: key.into(),
        },
    })
}

/// Slot frames shared by the local scopes.
#[derive(Debug, Default)]
struct Frames {
    stack: RefCell<Vec<Vec<Option<Lit>>>>,
}

impl Frames {
    fn push(&self, len: usize) {
        self.stack.borrow_mut().push(vec![None; len]);
    }

    fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    fn set(&self, idx: usize, val: Lit) -> EvalResult<()> {
        let mut stack = self.stack.borrow_mut();
        let Some(frame) = stack.last_mut() else {
            return Err(internal("set slot outside of a frame"));
        };
        if idx >= frame.len() {
            frame.resize(idx + 1, None);
        }
        frame[idx] = Some(val);
        Ok(())
    }

    fn get(&self, idx: usize) -> Option<Lit> {
        self.stack
            .borrow()
            .last()
            .and_then(|frame| frame.get(idx))
            .and_then(Clone::clone)
    }
}

/// A named local binding.
#[derive(Debug)]
struct Binding {
    key: Box<str>,
    ty: Type,
    /// Bindings to literals are inlined at resolve time.
    konst: Option<Lit>,
}

/// Scope of named local bindings (`let`).
#[derive(Debug)]
pub struct LetEnv {
    id: EnvId,
    parent: EnvId,
    bindings: RefCell<Vec<Binding>>,
    frames: Frames,
}

impl LetEnv {
    pub fn new(id: EnvId, parent: EnvId) -> Self {
        LetEnv {
            id,
            parent,
            bindings: RefCell::default(),
            frames: Frames::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// Add a binding and return its slot. Keys are unique per scope.
    pub fn define(&self, key: &str, ty: Type, konst: Option<Lit>) -> EvalResult<usize> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.iter().any(|b| &*b.key == key) {
            return Err(duplicate_tag(key));
        }
        bindings.push(Binding {
            key: key.into(),
            ty,
            konst,
        });
        Ok(bindings.len() - 1)
    }
}

impl Env for LetEnv {
    fn parent(&self) -> Option<EnvId> {
        Some(self.parent)
    }

    fn lookup(
        &self,
        prog: &mut Program,
        sym: &Sym,
        key: &str,
        eval: bool,
    ) -> EvalResult<Option<Exp>> {
        let bindings = self.bindings.borrow();
        let Some(idx) = bindings.iter().position(|b| &*b.key == key) else {
            return Ok(None);
        };
        let binding = &bindings[idx];
        if let Some(lit) = &binding.konst {
            return Ok(Some(Exp::Lit(lit.clone(), sym.span)));
        }
        if !eval {
            let ty = prog.sys.update(&binding.ty)?;
            return Ok(Some(typed_sym(sym, self.id, key, ty)));
        }
        match self.frames.get(idx) {
            Some(lit) => Ok(Some(Exp::Lit(lit, sym.span))),
            None => Err(spec_error("let", format!("{} is used before it is set", sym.name))),
        }
    }

    fn push_frame(&self) -> EvalResult<()> {
        self.frames.push(self.bindings.borrow().len());
        Ok(())
    }

    fn pop_frame(&self) {
        self.frames.pop();
    }

    fn set_slot(&self, idx: usize, val: Lit) -> EvalResult<()> {
        self.frames.set(idx, val)
    }
}

/// Scope projecting `.name` symbols into a literal (`with`).
///
/// A symbol with more leading dots skips one dot scope per extra dot, so
/// `..name` projects into the enclosing dot scope.
#[derive(Debug)]
pub struct DotEnv {
    id: EnvId,
    parent: EnvId,
    dot: Type,
    frames: Frames,
}

impl DotEnv {
    pub fn new(id: EnvId, parent: EnvId, dot: Type) -> Self {
        DotEnv {
            id,
            parent,
            dot,
            frames: Frames::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// Type of `path` inside the dot type. Paths into values without a
    /// parameter list are unconstrained.
    fn path_type(&self, prog: &mut Program, sym: &Sym, path: &str) -> EvalResult<Type> {
        let mut cur = prog.sys.update(&self.dot)?;
        for seg in path.split('.').filter(|s| !s.is_empty()) {
            let pool = &prog.sys.pool;
            let next = if let Some(el) = pool.elem(&cur) {
                el.clone()
            } else if pool.params(&cur).is_empty() {
                Type::VOID
            } else {
                let params = pool.params(&cur);
                params
                    .iter()
                    .position(|p| *p.key == *seg)
                    .or_else(|| seg.parse::<usize>().ok().filter(|&i| i < params.len()))
                    .map(|i| params[i].ty.clone())
                    .ok_or_else(|| symbol_not_found(&sym.name))?
            };
            cur = prog.sys.update(&next)?;
        }
        Ok(cur)
    }
}

/// Project `path` into `lit` by key or index.
fn project(lit: Lit, path: &str, sym: &Sym) -> EvalResult<Lit> {
    let mut cur = lit;
    for seg in path.split('.').filter(|s| !s.is_empty()) {
        let next = match &cur.val {
            Val::Dict(_) => cur.key(seg).cloned(),
            Val::List(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i).cloned()),
            _ => None,
        };
        cur = next.ok_or_else(|| {
            spec_error("with", format!("{} has no field {seg}", sym.name))
        })?;
    }
    Ok(cur)
}

impl Env for DotEnv {
    fn parent(&self) -> Option<EnvId> {
        Some(self.parent)
    }

    fn lookup(
        &self,
        prog: &mut Program,
        sym: &Sym,
        key: &str,
        eval: bool,
    ) -> EvalResult<Option<Exp>> {
        let Some(path) = key.strip_prefix('.') else {
            return Ok(None);
        };
        if path.starts_with('.') {
            return Ok(None);
        }
        if !eval {
            let ty = self.path_type(prog, sym, path)?;
            return Ok(Some(typed_sym(sym, self.id, key, ty)));
        }
        let dot = self
            .frames
            .get(0)
            .ok_or_else(|| internal("dot scope evaluated outside of its frame"))?;
        Ok(Some(Exp::Lit(project(dot, path, sym)?, sym.span)))
    }

    fn forward_key<'k>(&self, key: &'k str) -> &'k str {
        if key.starts_with("..") {
            &key[1..]
        } else {
            key
        }
    }

    fn push_frame(&self) -> EvalResult<()> {
        self.frames.push(1);
        Ok(())
    }

    fn pop_frame(&self) {
        self.frames.pop();
    }

    fn set_slot(&self, idx: usize, val: Lit) -> EvalResult<()> {
        self.frames.set(idx, val)
    }
}

/// Scope of a function literal: its parameters and the self-recursion
/// symbol `recur`.
#[derive(Debug)]
pub struct FuncEnv {
    id: EnvId,
    parent: EnvId,
    params: RefCell<Vec<Param>>,
    recur: RefCell<Option<Weak<dyn Spec>>>,
    frames: Frames,
}

impl FuncEnv {
    /// The self-recursion symbol.
    pub const RECUR: &'static str = "recur";

    pub fn new(id: EnvId, parent: EnvId) -> Self {
        FuncEnv {
            id,
            parent,
            params: RefCell::default(),
            recur: RefCell::default(),
            frames: Frames::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> EnvId {
        self.id
    }

    pub fn set_params(&self, params: Vec<Param>) {
        *self.params.borrow_mut() = params;
    }

    /// The spec `recur` refers to. Held weakly: the spec owns this scope.
    pub fn set_recur(&self, spec: &SpecRef) {
        *self.recur.borrow_mut() = Some(Rc::downgrade(spec));
    }
}

impl Env for FuncEnv {
    fn parent(&self) -> Option<EnvId> {
        Some(self.parent)
    }

    fn lookup(
        &self,
        prog: &mut Program,
        sym: &Sym,
        key: &str,
        eval: bool,
    ) -> EvalResult<Option<Exp>> {
        if key == Self::RECUR {
            let spec = self.recur.borrow().as_ref().and_then(Weak::upgrade);
            if let Some(spec) = spec {
                let sig = spec.sig(&mut prog.sys)?;
                return Ok(Some(Exp::Lit(Lit::spec(spec, sig), sym.span)));
            }
        }
        let params = self.params.borrow();
        let Some(idx) = params.iter().position(|p| &*p.key == key) else {
            return Ok(None);
        };
        if !eval {
            let ty = prog.sys.update(&params[idx].ty)?;
            return Ok(Some(typed_sym(sym, self.id, key, ty)));
        }
        match self.frames.get(idx) {
            Some(lit) => Ok(Some(Exp::Lit(lit, sym.span))),
            None => Err(spec_error(
                "fn",
                format!("{} is not bound outside of a call", sym.name),
            )),
        }
    }

    fn push_frame(&self) -> EvalResult<()> {
        self.frames.push(self.params.borrow().len());
        Ok(())
    }

    fn pop_frame(&self) {
        self.frames.pop();
    }

    fn set_slot(&self, idx: usize, val: Lit) -> EvalResult<()> {
        self.frames.set(idx, val)
    }
}
