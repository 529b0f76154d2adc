//! Forms that build and change values.

use quill_types::{Kind, Sys, Type, TypeError};

use crate::error::{internal, spec_error};
use crate::{Call, EnvId, EvalResult, Exp, Lit, Program, Spec, Val};

/// The string of a `char` literal.
fn text<'a>(spec: &str, lit: &'a Lit) -> EvalResult<&'a str> {
    lit.as_str()
        .ok_or_else(|| spec_error(spec, "expected a string"))
}

/// `(cat "a" "b")`: concatenates strings.
#[derive(Clone, Copy, Debug)]
pub struct Cat;

impl Spec for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@cat char tupl?|char str>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let first = prog.eval_req(env, call, 0)?;
        let mut out = text("cat", &first)?.to_string();
        for item in prog.eval_items(env, call, 1)? {
            out.push_str(text("cat", &item)?);
        }
        Ok(Lit::str(&out))
    }
}

/// `(apd [1 2] 3 4)`: a copy of the list with the items appended.
#[derive(Clone, Copy, Debug)]
pub struct Apd;

impl Spec for Apd {
    fn name(&self) -> &str {
        "apd"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@apd list|@1 tupl?|@1 list|@1>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let list = prog.eval_req(env, call, 0)?;
        let Val::List(mut items) = list.val else {
            return Err(spec_error("apd", "expected a list"));
        };
        items.extend(prog.eval_items(env, call, 1)?);
        let ty = prog.sys.pool.result_of(&call.sig);
        Ok(Lit::new(ty, Val::List(items)))
    }
}

/// `(mut {a:1} a:2 b:3)`: a copy of a keyed value with the tagged keys set.
#[derive(Clone, Copy, Debug)]
pub struct Mut;

impl Spec for Mut {
    fn name(&self) -> &str {
        "mut"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@mut keyr@1 tupl?|tag @1>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let mut target = prog.eval_req(env, call, 0)?;
        for item in call.items(1) {
            let Exp::Tag(tag) = item else {
                return Err(internal("mut: untagged argument"));
            };
            let val = prog.eval(env, item)?;
            target
                .set_key(&tag.name, val)
                .map_err(|e| e.at(tag.span))?;
        }
        Ok(target)
    }
}

/// `(tag x:1 y:2)`: a dict of the tagged values. A head tag dispatches
/// here, so `(x:1 y:2)` is the same call.
#[derive(Clone, Copy, Debug)]
pub struct TagSpec;

impl Spec for TagSpec {
    fn name(&self) -> &str {
        "tag"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@tag tupl|tag dict>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let mut dict = Lit::new(Type::DICT, Val::Dict(Vec::new()));
        for item in call.items(0) {
            let Some(name) = item.tag_name() else {
                return Err(internal("tag: untagged argument"));
            };
            let val = prog.eval(env, item)?;
            dict.set_key(name, val)?;
        }
        Ok(dict)
    }
}

/// `(con int "12")` or `(<list|int> 1 2)`: a value of the given type.
///
/// Without arguments the result is the zero value. A list type collects
/// its arguments converted to the element type; any other type converts
/// its single argument.
#[derive(Clone, Copy, Debug)]
pub struct Con;

impl Spec for Con {
    fn name(&self) -> &str {
        "con"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@con typ tupl?|any any>")
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        prog.resolve_args(env, call)?;
        if let Some(target) = call.arg(0).and_then(Exp::as_lit).and_then(Lit::as_typ) {
            let target = target.clone();
            prog.unify_result(call, &target)?;
        }
        prog.resolve_result(call, hint)?;
        Ok(None)
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let target = prog.eval_req(env, call, 0)?;
        let Val::Typ(ty) = target.val else {
            return Err(spec_error("con", "expected a type"));
        };
        let mut args = prog.eval_items(env, call, 1)?;

        let base = ty.kind.base();
        if base == Kind::LIST || base == Kind::TUPL {
            let el = prog.sys.pool.elem(&ty).cloned().unwrap_or_default();
            let items = args
                .into_iter()
                .map(|arg| {
                    let mut item = Lit::zero_of(&el);
                    item.assign(arg)?;
                    Ok(item)
                })
                .collect::<EvalResult<Vec<_>>>()?;
            return Ok(Lit::new(ty, Val::List(items)));
        }

        let mut out = Lit::zero_of(&ty);
        match args.len() {
            0 => {}
            1 => {
                if let Some(arg) = args.pop() {
                    out.assign(arg)?;
                }
            }
            n => {
                return Err(spec_error(
                    "con",
                    format!("expected one argument, got {n}"),
                ))
            }
        }
        Ok(out)
    }
}
