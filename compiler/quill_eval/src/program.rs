//! The resolver and evaluator.
//!
//! A [`Program`] owns the type-system context and the environment arena.
//! Every expression goes through two passes, always in this order:
//!
//! 1. **resolve** annotates the tree in place: symbols are looked up and
//!    marked with their environment, calls get a spec, an instantiated
//!    signature, laid-out argument slots and an environment.
//! 2. **eval** walks the resolved tree and produces a literal.
//!
//! Evaluating a call that was never resolved is an internal error, and
//! resolving a call whose environment is already set only recomputes its
//! types.

use std::rc::Rc;

use quill_types::{ensure_sufficient_stack, Sys, Type};

use crate::dispatch::select;
use crate::error::internal;
use crate::layout::layout;
use crate::{
    Builtins, Call, Config, Env, EnvId, EvalError, EvalErrorKind, EvalResult, Exp, Lit, Sym,
    SymState, Val,
};

/// A type-system context with its environment chain.
pub struct Program {
    pub sys: Sys,
    envs: Vec<Rc<dyn Env>>,
    builtins: Rc<Builtins>,
    config: Config,
    depth: usize,
}

impl Default for Program {
    fn default() -> Self {
        Program::new(Builtins::std())
    }
}

impl Program {
    /// A program whose root environment is `builtins`.
    pub fn new(builtins: Builtins) -> Self {
        Program::with_config(builtins, Config::default())
    }

    pub fn with_config(builtins: Builtins, config: Config) -> Self {
        let builtins = Rc::new(builtins);
        let root: Rc<dyn Env> = builtins.clone();
        Program {
            sys: Sys::new(),
            envs: vec![root],
            builtins,
            config,
            depth: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// The root environment.
    #[inline]
    pub fn root(&self) -> EnvId {
        EnvId::ROOT
    }

    /// Add an environment built by `make` from its id.
    pub fn add_env<E: Env + 'static>(&mut self, make: impl FnOnce(EnvId) -> E) -> Rc<E> {
        let id = EnvId::from_index(self.envs.len());
        let env = Rc::new(make(id));
        tracing::debug!(?id, parent = ?env.parent(), "environment created");
        self.envs.push(env.clone());
        env
    }

    /// The environment `id`.
    pub fn env(&self, id: EnvId) -> EvalResult<Rc<dyn Env>> {
        self.envs
            .get(id.index())
            .cloned()
            .ok_or_else(|| internal(format!("unknown environment {id:?}")))
    }

    /// Read a single expression from `src`.
    pub fn read(&mut self, src: &str) -> EvalResult<Exp> {
        crate::read::read_nested(&mut self.sys, src, self.config.max_depth)
    }

    /// Resolve then evaluate `exp` in the root environment.
    pub fn run(&mut self, exp: &mut Exp) -> EvalResult<Lit> {
        self.resolve(EnvId::ROOT, exp, &Type::VOID)?;
        self.eval(EnvId::ROOT, exp)
    }

    fn enter(&mut self) -> EvalResult<()> {
        if self.depth >= self.config.max_depth {
            return Err(EvalError::new(EvalErrorKind::DepthExceeded {
                depth: self.config.max_depth,
            }));
        }
        self.depth += 1;
        Ok(())
    }

    // Resolution

    /// Resolve `exp` in `env`, expecting a result compatible with `hint`.
    #[tracing::instrument(level = "trace", skip_all, fields(span = %exp.span()))]
    pub fn resolve(&mut self, env: EnvId, exp: &mut Exp, hint: &Type) -> EvalResult<()> {
        let span = exp.span();
        self.enter()?;
        let res = ensure_sufficient_stack(|| self.resolve_node(env, exp, hint));
        self.depth -= 1;
        if let Some(rep) = res.map_err(|e| e.at(span))? {
            *exp = rep;
        }
        Ok(())
    }

    /// Resolve one node, returning a replacement for it if any.
    fn resolve_node(&mut self, env: EnvId, exp: &mut Exp, hint: &Type) -> EvalResult<Option<Exp>> {
        match exp {
            Exp::Lit(..) => Ok(None),
            Exp::Sym(sym) => {
                if sym.state != SymState::Unresolved {
                    return Ok(None);
                }
                self.lookup(env, sym, false).map(Some)
            }
            Exp::Tag(tag) => {
                if let Some(inner) = tag.exp.as_deref_mut() {
                    self.resolve(env, inner, &Type::VOID)?;
                }
                Ok(None)
            }
            Exp::Tupl(tupl) => {
                // Items unify with the element type one by one. A variable
                // element narrows as items bind it; a concrete one does not.
                let el = self.sys.pool.elem(&tupl.ty).cloned().unwrap_or_default();
                for item in &mut tupl.items {
                    let hint = self.sys.update(&el)?;
                    self.resolve(env, item, &hint)?;
                    let ty = item.ty(&self.sys.pool);
                    self.sys
                        .unify(&hint, &ty)
                        .map_err(|e| EvalError::from(e).at(item.span()))?;
                }
                let el = self.sys.update(&el)?;
                let mut ty = self.sys.pool.wrap(tupl.ty.kind, el);
                ty.name = tupl.ty.name.take();
                tupl.ty = ty;
                Ok(None)
            }
            Exp::Call(call) => self.resolve_call(env, call, hint),
        }
    }

    /// Look `sym` up through the chain starting at `env`.
    pub fn lookup(&mut self, env: EnvId, sym: &Sym, eval: bool) -> EvalResult<Exp> {
        let mut key = sym.key();
        let mut cur = Some(env);
        while let Some(id) = cur {
            let scope = self.env(id)?;
            if let Some(found) = scope.lookup(self, sym, &key, eval)? {
                tracing::trace!(name = %sym.name, env = ?id, "symbol found");
                return Ok(found);
            }
            key = scope.forward_key(&key).to_string();
            cur = scope.parent();
        }
        Err(crate::error::symbol_not_found(&sym.name).at(sym.span))
    }

    /// Resolve a call: select its spec, instantiate the signature, lay out
    /// the arguments and hand over to the spec.
    pub fn resolve_call(
        &mut self,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        if call.env.is_some() {
            call.sig = self.sys.update(&call.sig)?;
            self.resolve_result(call, hint)?;
            return Ok(None);
        }

        let spec = match call.spec.clone() {
            Some(spec) => spec,
            None => self.select_spec(env, call)?,
        };
        let tmpl = spec.sig(&mut self.sys)?;
        call.sig = self.sys.instantiate(&tmpl)?;
        let raw: Vec<Exp> = call.args.drain(..).flatten().collect();
        call.args = layout(&self.sys.pool, &call.sig, raw)?;
        tracing::debug!(
            spec = spec.name(),
            sig = %self.sys.pool.format_type(&call.sig),
            "resolve call"
        );

        let rep = spec.resolve(self, env, call, hint)?;
        if call.env.is_none() {
            call.env = Some(env);
        }
        Ok(rep)
    }

    /// Pick the spec for `call` from its head and drop the head if the
    /// spec consumes it.
    fn select_spec(&mut self, env: EnvId, call: &mut Call) -> EvalResult<crate::SpecRef> {
        let Some(Some(head)) = call.args.first_mut() else {
            return Err(internal("call without a head"));
        };
        self.resolve(env, head, &Type::VOID)?;
        let (spec, consume) = select(&self.builtins, &self.sys.pool, head)?;
        tracing::debug!(spec = spec.name(), consume, "spec selected");
        if consume {
            call.args.remove(0);
        }
        call.spec = Some(spec.clone());
        Ok(spec)
    }

    /// Resolve every argument slot in declared order against its parameter.
    pub fn resolve_args(&mut self, env: EnvId, call: &mut Call) -> EvalResult<()> {
        if call.env.is_none() {
            call.env = Some(env);
        }
        for idx in 0..call.args.len() {
            self.resolve_arg(env, call, idx)?;
        }
        Ok(())
    }

    /// Resolve argument slot `idx` with its parameter as hint and unify the
    /// two. Returns the unified parameter type.
    pub fn resolve_arg(&mut self, env: EnvId, call: &mut Call, idx: usize) -> EvalResult<Type> {
        let hint = self.param(call, idx)?;
        let Some(arg) = call.args.get_mut(idx).and_then(Option::as_mut) else {
            return Ok(hint);
        };
        self.resolve(env, arg, &hint)?;
        self.unify_arg(call, idx)
    }

    /// The current type of parameter `idx` of a call.
    pub fn param(&mut self, call: &Call, idx: usize) -> EvalResult<Type> {
        let ty = self
            .sys
            .pool
            .params(&call.sig)
            .get(idx)
            .map(|p| p.ty.clone())
            .unwrap_or_default();
        Ok(self.sys.update(&ty)?)
    }

    /// Unify argument `idx` with its parameter and record the result in
    /// the signature.
    pub fn unify_arg(&mut self, call: &mut Call, idx: usize) -> EvalResult<Type> {
        let param = self.param(call, idx)?;
        let Some(arg) = call.arg(idx) else {
            return Ok(param);
        };
        let (ty, span) = (arg.ty(&self.sys.pool), arg.span());
        let res = self
            .sys
            .unify(&param, &ty)
            .map_err(|e| EvalError::from(e).at(span))?;
        self.sys.pool.set_param(&call.sig, idx, res.clone());
        Ok(res)
    }

    /// Unify the result type of `call` with `ty`.
    pub fn unify_result(&mut self, call: &mut Call, ty: &Type) -> EvalResult<Type> {
        let res = self.sys.pool.result_of(&call.sig);
        let res = self
            .sys
            .unify(&res, ty)
            .map_err(|e| EvalError::from(e).at(call.span))?;
        self.sys.pool.set_result(&call.sig, res.clone());
        Ok(res)
    }

    /// Unify the result with the caller's `hint` and re-substitute the
    /// whole signature.
    pub fn resolve_result(&mut self, call: &mut Call, hint: &Type) -> EvalResult<Type> {
        let res = if *hint == Type::VOID {
            let res = self.sys.pool.result_of(&call.sig);
            self.sys.update(&res)?
        } else {
            self.unify_result(call, hint)?
        };
        call.sig = self.sys.update(&call.sig)?;
        Ok(res)
    }

    // Evaluation

    /// Evaluate a resolved expression.
    #[tracing::instrument(level = "trace", skip_all, fields(span = %exp.span()))]
    pub fn eval(&mut self, env: EnvId, exp: &Exp) -> EvalResult<Lit> {
        self.enter()?;
        let res = ensure_sufficient_stack(|| self.eval_node(env, exp));
        self.depth -= 1;
        res.map_err(|e| e.at(exp.span()))
    }

    fn eval_node(&mut self, env: EnvId, exp: &Exp) -> EvalResult<Lit> {
        match exp {
            Exp::Lit(lit, _) => Ok(lit.clone()),
            Exp::Sym(sym) => {
                let SymState::Resolved { env: owner, key } = &sym.state else {
                    return Err(internal(format!(
                        "symbol {} evaluated before resolution",
                        sym.name
                    )));
                };
                let scope = self.env(*owner)?;
                match scope.lookup(self, sym, key, true)? {
                    Some(Exp::Lit(lit, _)) => Ok(lit),
                    Some(other) => Err(internal(format!(
                        "lookup of {} produced {other:?} instead of a value",
                        sym.name
                    ))),
                    None => Err(internal(format!("{} vanished from its environment", sym.name))),
                }
            }
            Exp::Tag(tag) => match tag.exp.as_deref() {
                Some(inner) => self.eval(env, inner),
                None => Ok(Lit::bool(true)),
            },
            Exp::Tupl(tupl) => {
                let items = tupl
                    .items
                    .iter()
                    .map(|item| self.eval(env, item))
                    .collect::<EvalResult<Vec<_>>>()?;
                Ok(Lit::new(tupl.ty.clone(), Val::List(items)))
            }
            Exp::Call(call) => {
                let (Some(spec), Some(call_env)) = (call.spec.as_ref(), call.env) else {
                    return Err(internal(format!(
                        "call of {} evaluated before resolution",
                        call.spec_name()
                    )));
                };
                let spec = spec.clone();
                spec.eval(self, call_env, call)
            }
        }
    }

    /// Evaluate argument slot `idx`; `None` for an empty slot.
    pub fn eval_arg(&mut self, env: EnvId, call: &Call, idx: usize) -> EvalResult<Option<Lit>> {
        call.arg(idx).map(|arg| self.eval(env, arg)).transpose()
    }

    /// Evaluate argument slot `idx`, which must be filled.
    pub fn eval_req(&mut self, env: EnvId, call: &Call, idx: usize) -> EvalResult<Lit> {
        self.eval_arg(env, call, idx)?
            .ok_or_else(|| internal(format!("{}: empty slot {idx}", call.spec_name())))
    }

    /// Evaluate the items of slot `idx` in order.
    pub fn eval_items(&mut self, env: EnvId, call: &Call, idx: usize) -> EvalResult<Vec<Lit>> {
        call.items(idx).iter().map(|item| self.eval(env, item)).collect()
    }

    /// Run `f` inside a fresh frame of `env`.
    pub fn with_frame<T>(
        &mut self,
        env: EnvId,
        f: impl FnOnce(&mut Self) -> EvalResult<T>,
    ) -> EvalResult<T> {
        let scope = self.env(env)?;
        scope.push_frame()?;
        let res = f(self);
        scope.pop_frame();
        res
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
