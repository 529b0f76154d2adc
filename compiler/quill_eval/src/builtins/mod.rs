//! Built-in specs and the root environment that holds them.
//!
//! Each spec documents when it evaluates its arguments. Unless stated
//! otherwise arguments are evaluated eagerly, left to right:
//!
//! - `add sub mul div`: fold numbers left to right
//! - `cat`: concatenate strings
//! - `apd`: append items to a list
//! - `mut`: set keys of a dict or record from tags
//! - `con`: construct a value of a type
//! - `tag`: build a dict from tags
//! - `if`: the condition, then only the chosen branch
//! - `and or`: left to right, stopping at the first deciding value
//! - `not eq lt gt`: boolean tests
//! - `let`: the bindings in order, then the body
//! - `with`: the value, then the body with `.name` projecting into it
//! - `fn`: a function literal; `recur` calls it from its own body
//! - `err`: the message parts, then fails

mod arith;
mod data;
mod logic;
mod scope;

use std::rc::Rc;

use quill_types::{Kind, Type};
use rustc_hash::FxHashMap;

use crate::{Env, EnvId, EvalResult, Exp, Lit, Program, SpecRef, Sym};

pub use arith::{Arith, ArithOp};
pub use data::{Apd, Cat, Con, Mut, TagSpec};
pub use logic::{Cmp, CmpOp, If, Logic, Not};
pub use scope::{ErrSpec, FnSpec, FuncSpec, Let, With};

/// Name to spec table. As the root environment it also answers kind
/// names (`int`, `list`, `_`) and declared type names with type literals.
#[derive(Debug, Default)]
pub struct Builtins {
    specs: FxHashMap<Box<str>, SpecRef>,
}

impl Builtins {
    /// An empty table.
    pub fn new() -> Self {
        Builtins::default()
    }

    /// The standard catalog.
    pub fn std() -> Self {
        let mut b = Builtins::new();
        for op in [ArithOp::Add, ArithOp::Sub, ArithOp::Mul, ArithOp::Div] {
            b.register(Rc::new(Arith(op)));
        }
        b.register(Rc::new(Cat));
        b.register(Rc::new(Apd));
        b.register(Rc::new(Mut));
        b.register(Rc::new(Con));
        b.register(Rc::new(TagSpec));
        b.register(Rc::new(If));
        b.register(Rc::new(Logic::And));
        b.register(Rc::new(Logic::Or));
        b.register(Rc::new(Not));
        for op in [CmpOp::Eq, CmpOp::Lt, CmpOp::Gt] {
            b.register(Rc::new(Cmp(op)));
        }
        b.register(Rc::new(Let));
        b.register(Rc::new(With));
        b.register(Rc::new(FnSpec));
        b.register(Rc::new(ErrSpec));
        b
    }

    /// Register `spec` under its name, replacing any earlier entry.
    pub fn register(&mut self, spec: SpecRef) {
        self.specs.insert(spec.name().to_lowercase().into(), spec);
    }

    pub fn get(&self, name: &str) -> Option<SpecRef> {
        self.specs.get(name).cloned()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(|k| &**k).collect();
        names.sort_unstable();
        names
    }
}

impl Env for Builtins {
    fn parent(&self) -> Option<EnvId> {
        None
    }

    fn lookup(
        &self,
        prog: &mut Program,
        sym: &Sym,
        key: &str,
        _eval: bool,
    ) -> EvalResult<Option<Exp>> {
        if let Some(spec) = self.get(key) {
            let sig = spec.sig(&mut prog.sys)?;
            return Ok(Some(Exp::Lit(Lit::spec(spec, sig), sym.span)));
        }
        if let Some(kind) = Kind::from_kind_name(key) {
            return Ok(Some(Exp::Lit(Lit::typ(Type::of(kind)), sym.span)));
        }
        match prog.sys.resolve_ref(&sym.name) {
            Ok(ty) => Ok(Some(Exp::Lit(Lit::typ(ty), sym.span))),
            Err(_) => Ok(None),
        }
    }
}
