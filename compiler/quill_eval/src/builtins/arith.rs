//! Arithmetic forms.

use quill_types::{Sys, Type, TypeError};

use crate::error::spec_error;
use crate::{Call, EnvId, EvalResult, Exp, Lit, Program, Spec, Val};

/// Arithmetic operator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        }
    }

    fn sig(self) -> &'static str {
        match self {
            ArithOp::Add => "<form@add num@ tupl?|num _>",
            ArithOp::Sub => "<form@sub num@ tupl?|num _>",
            ArithOp::Mul => "<form@mul num@ tupl?|num _>",
            ArithOp::Div => "<form@div num@ tupl?|num _>",
        }
    }

    /// Apply to two numbers. Integers stay integers unless either side is
    /// real; integer overflow and division by zero are errors.
    pub fn apply(self, a: &Lit, b: &Lit) -> EvalResult<Lit> {
        let name = self.name();
        if let (Val::Int(x), Val::Int(y)) = (&a.val, &b.val) {
            let (x, y) = (*x, *y);
            let res = match self {
                ArithOp::Add => x.checked_add(y),
                ArithOp::Sub => x.checked_sub(y),
                ArithOp::Mul => x.checked_mul(y),
                ArithOp::Div if y == 0 => return Err(spec_error(name, "division by zero")),
                ArithOp::Div => x.checked_div(y),
            };
            return res
                .map(Lit::int)
                .ok_or_else(|| spec_error(name, "integer overflow"));
        }
        let (Some(x), Some(y)) = (a.as_real(), b.as_real()) else {
            return Err(spec_error(name, "expected numbers"));
        };
        let res = match self {
            ArithOp::Add => x + y,
            ArithOp::Sub => x - y,
            ArithOp::Mul => x * y,
            ArithOp::Div if y == 0.0 => return Err(spec_error(name, "division by zero")),
            ArithOp::Div => x / y,
        };
        Ok(Lit::real(res))
    }
}

/// `(add 1 2 3)`: folds its arguments with the operator, left to right.
/// The result has the type of the first argument.
#[derive(Clone, Copy, Debug)]
pub struct Arith(pub ArithOp);

impl Spec for Arith {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError> {
        sys.parse(self.0.sig())
    }

    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        prog.resolve_args(env, call)?;
        let first = prog.param(call, 0)?;
        prog.unify_result(call, &first)?;
        prog.resolve_result(call, hint)?;
        Ok(None)
    }

    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit> {
        let mut acc = prog.eval_req(env, call, 0)?;
        for item in call.items(1) {
            let rhs = prog.eval(env, item)?;
            acc = self.0.apply(&acc, &rhs).map_err(|e| e.at(item.span()))?;
        }
        Ok(acc)
    }
}
