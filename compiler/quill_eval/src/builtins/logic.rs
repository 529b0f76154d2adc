//! Conditionals, boolean connectives and comparisons.

use std::cmp::Ordering;

use quill_types::{Sys, Type, TypeError};

use crate::error::spec_error;
use crate::{Call, EnvId, EvalResult, Exp, Lit, Program, Spec};

/// `(if cond then else?)`.
///
/// Evaluates the condition, then only the chosen branch. A false
/// condition without an else branch yields `null`, so the result is
/// optional then. Both branches share the result type.
#[derive(Clone, Copy, Debug)]
pub struct If;

impl Spec for If {
    fn name(&self) -> &str {
        "if"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@if any @1 ?@1 @1>")
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        prog.resolve_args(env, call)?;
        if call.arg(2).is_none() {
            let res = prog.sys.pool.result_of(&call.sig);
            let res = prog.sys.update(&res)?;
            prog.sys.pool.set_result(&call.sig, res.optional());
        }
        prog.resolve_result(call, hint)?;
        Ok(None)
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let cond = prog.eval_req(env, call, 0)?;
        if cond.is_zero() {
            Ok(prog.eval_arg(env, call, 2)?.unwrap_or_else(Lit::null))
        } else {
            prog.eval_req(env, call, 1)
        }
    }
}

/// `(and a b ...)` and `(or a b ...)`.
///
/// Evaluate left to right and stop at the first argument that decides
/// the result: a zero value for `and`, a non-zero value for `or`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Logic {
    And,
    Or,
}

impl Spec for Logic {
    fn name(&self) -> &str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse(match self {
            Logic::And => "<form@and tupl?|any bool>",
            Logic::Or => "<form@or tupl?|any bool>",
        })
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let decider = *self == Logic::Or;
        for item in call.items(0) {
            if prog.eval(env, item)?.is_zero() != decider {
                return Ok(Lit::bool(decider));
            }
        }
        Ok(Lit::bool(!decider))
    }
}

/// `(not x)`: whether `x` is a zero value.
#[derive(Clone, Copy, Debug)]
pub struct Not;

impl Spec for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse("<form@not any bool>")
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        Ok(Lit::bool(prog.eval_req(env, call, 0)?.is_zero()))
    }
}

/// Comparison operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Lt,
    Gt,
}

/// `(eq a b ...)`, `(lt a b ...)`, `(gt a b ...)`.
///
/// All arguments are evaluated first. `eq` holds when every argument
/// equals the first; `lt` and `gt` compare each adjacent pair.
#[derive(Clone, Copy, Debug)]
pub struct Cmp(pub CmpOp);

impl Spec for Cmp {
    fn name(&self) -> &str {
        match self.0 {
            CmpOp::Eq => "eq",
            CmpOp::Lt => "lt",
            CmpOp::Gt => "gt",
        }
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse(match self.0 {
            CmpOp::Eq => "<form@eq any tupl|any bool>",
            CmpOp::Lt => "<form@lt any tupl|any bool>",
            CmpOp::Gt => "<form@gt any tupl|any bool>",
        })
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let mut vals = vec![prog.eval_req(env, call, 0)?];
        vals.extend(prog.eval_items(env, call, 1)?);

        let holds = match self.0 {
            CmpOp::Eq => vals.iter().skip(1).all(|v| vals[0].equals(v)),
            CmpOp::Lt | CmpOp::Gt => {
                let want = if self.0 == CmpOp::Lt {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let mut holds = true;
                for pair in vals.windows(2) {
                    let ord = pair[0].compare(&pair[1]).ok_or_else(|| {
                        spec_error(self.name(), "values are not comparable")
                    })?;
                    holds &= ord == want;
                }
                holds
            }
        };
        Ok(Lit::bool(holds))
    }
}
