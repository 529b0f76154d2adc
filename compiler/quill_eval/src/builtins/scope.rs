//! Forms that introduce scopes, and `err`.

use std::cell::RefCell;
use std::rc::Rc;

use quill_types::{Kind, Param, Sys, Type, TypeError};

use crate::error::{internal, spec_error};
use crate::{
    Call, DotEnv, Env, EnvId, EvalResult, Exp, FuncEnv, LetEnv, Lit, Program, Spec, SpecRef, Val,
};

/// The mutable argument slot `idx` of a laid-out call.
fn slot_mut(call: &mut Call, idx: usize) -> EvalResult<&mut Exp> {
    let spec = call.spec_name().to_string();
    call.args
        .get_mut(idx)
        .and_then(Option::as_mut)
        .ok_or_else(|| internal(format!("{spec}: empty slot {idx}")))
}

/// Resolve the body in slot `idx` inside `scope` and make its type the
/// result type of the call.
fn resolve_body(
    prog: &mut Program,
    scope: EnvId,
    call: &mut Call,
    idx: usize,
    hint: &Type,
) -> EvalResult<()> {
    let body = slot_mut(call, idx)?;
    prog.resolve(scope, body, hint)?;
    let ty = prog.unify_arg(call, idx)?;
    prog.unify_result(call, &ty)?;
    prog.resolve_result(call, hint)?;
    Ok(())
}

/// `(let x:1 y:(add x 1) body)`.
///
/// Bindings are resolved and evaluated in order; each sees the ones
/// before it. Bindings to literals are inlined.
#[derive(Clone, Copy, Debug)]
pub struct Let;

impl Spec for Let {
    fn name(&self) -> &str {
        "let"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@let tupl|tag any _>")
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        let scope = prog.add_env(|id| LetEnv::new(id, env));
        call.env = Some(scope.id());

        for item in call.items_mut(0) {
            let Exp::Tag(tag) = item else {
                return Err(internal("let: untagged binding"));
            };
            let (ty, konst) = match tag.exp.as_deref_mut() {
                Some(val) => {
                    prog.resolve(scope.id(), val, &Type::VOID)?;
                    (val.ty(&prog.sys.pool), val.as_lit().cloned())
                }
                None => (Type::BOOL, Some(Lit::bool(true))),
            };
            scope
                .define(&tag.name.to_lowercase(), ty, konst)
                .map_err(|e| e.at(tag.span))?;
        }

        resolve_body(prog, scope.id(), call, 1, hint)?;
        Ok(None)
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        prog.with_frame(env, |prog| {
            let scope = prog.env(env)?;
            for (slot, item) in call.items(0).iter().enumerate() {
                let val = prog.eval(env, item)?;
                scope.set_slot(slot, val)?;
            }
            prog.eval_req(env, call, 1)
        })
    }
}

/// `(with val body)`: evaluates `body` with `.name` projecting into `val`.
#[derive(Clone, Copy, Debug)]
pub struct With;

impl Spec for With {
    fn name(&self) -> &str {
        "with"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@with any any _>")
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        let dot = prog.resolve_arg(env, call, 0)?;
        let scope = prog.add_env(|id| DotEnv::new(id, env, dot));
        call.env = Some(scope.id());
        resolve_body(prog, scope.id(), call, 1, hint)?;
        Ok(None)
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let dot = prog.eval_req(env, call, 0)?;
        prog.with_frame(env, |prog| {
            prog.env(env)?.set_slot(0, dot)?;
            prog.eval_req(env, call, 1)
        })
    }
}

/// `(fn a:int b body)`: a function literal.
///
/// Parameters are tags whose value is a type; a bare tag has a fresh
/// variable type. The body is resolved once when the literal is, so the
/// signature carries whatever the body inferred. The call node resolves
/// to the function value itself.
#[derive(Clone, Copy, Debug)]
pub struct FnSpec;

impl Spec for FnSpec {
    fn name(&self) -> &str {
        "fn"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@fn tupl?|tag any _>")
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        _hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        let scope = prog.add_env(|id| FuncEnv::new(id, env));
        call.env = Some(scope.id());

        let mut params = Vec::new();
        for item in call.items_mut(0) {
            let Exp::Tag(tag) = item else {
                return Err(internal("fn: untagged parameter"));
            };
            let ty = match tag.exp.as_deref_mut() {
                Some(exp) => {
                    prog.resolve(env, exp, &Type::VOID)?;
                    let Some(ty) = exp.as_lit().and_then(Lit::as_typ) else {
                        return Err(spec_error("fn", format!("parameter {} needs a type", tag.name))
                            .at(exp.span()));
                    };
                    let ty = ty.clone();
                    prog.sys.instantiate(&ty)?
                }
                None => Type::VOID,
            };
            let ty = if ty.is_void() {
                prog.sys.bind(Type::var())
            } else {
                ty
            };
            params.push(Param::new(&tag.name, ty));
        }
        scope.set_params(params.clone());

        let res = prog.sys.bind(Type::var());
        params.push(Param::unnamed(res.clone()));
        let sig = prog.sys.pool.with_params(Kind::FUNC, params);

        let func = Rc::new(FuncSpec {
            sig: RefCell::new(sig),
            env: scope.clone(),
            body: RefCell::new(None),
        });
        let spec: SpecRef = func.clone();
        scope.set_recur(&spec);

        let mut body = call
            .args
            .get_mut(1)
            .and_then(Option::take)
            .ok_or_else(|| internal("fn: missing body"))?;
        prog.resolve(scope.id(), &mut body, &res)?;
        let ty = body.ty(&prog.sys.pool);
        prog.sys
            .unify(&res, &ty)
            .map_err(|e| crate::EvalError::from(e).at(body.span()))?;

        let sig = prog.sys.update(&func.sig.borrow())?;
        tracing::debug!(sig = %prog.sys.pool.format_type(&sig), "function literal");
        *func.sig.borrow_mut() = sig.clone();
        *func.body.borrow_mut() = Some(body);

        Ok(Some(Exp::Lit(Lit::spec(spec, sig), call.span)))
    }

    fn eval(&self, _prog: &mut Program, _env: EnvId, call: &Call) -> EvalResult<Lit> {
        Err(internal(format!(
            "fn literal at {} was not replaced by its value",
            call.span
        )))
    }
}

/// A function value created by `fn`.
#[derive(Debug)]
pub struct FuncSpec {
    sig: RefCell<Type>,
    env: Rc<FuncEnv>,
    body: RefCell<Option<Exp>>,
}

impl Spec for FuncSpec {
    fn name(&self) -> &str {
        "fn"
    }

    fn sig(&self, _sys: &mut Sys) -> Result<Type, TypeError> {
        Ok(self.sig.borrow().clone())
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let args = (0..call.args.len())
            .map(|idx| prog.eval_arg(env, call, idx))
            .collect::<EvalResult<Vec<_>>>()?;

        let body = self.body.borrow();
        let Some(body) = body.as_ref() else {
            return Err(internal("function called before its body was resolved"));
        };
        let scope = self.env.id();
        prog.with_frame(scope, |prog| {
            for (slot, arg) in args.into_iter().enumerate() {
                self.env.set_slot(slot, arg.unwrap_or_else(Lit::null))?;
            }
            prog.eval(scope, body)
        })
    }
}

/// `(err "message" ...)`: fails with the message parts joined by spaces.
#[derive(Clone, Copy, Debug)]
pub struct ErrSpec;

impl Spec for ErrSpec {
    fn name(&self) -> &str {
        "err"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@err tupl?|any _>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let parts = prog.eval_items(env, call, 0)?;
        let message = parts
            .iter()
            .map(|p| match &p.val {
                Val::Str(s) => s.to_string(),
                _ => p.to_text(&prog.sys.pool),
            })
            .collect::<Vec<_>>()
            .join(" ");
        Err(spec_error("err", message).at(call.span))
    }
}
