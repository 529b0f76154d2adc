//! The spec contract.
//!
//! A spec is a named, typed operation. Built-in forms and user function
//! literals both plug into the resolver through this trait.

use std::fmt;
use std::rc::Rc;

use quill_types::{Sys, Type, TypeError};

use crate::{Call, EnvId, EvalResult, Exp, Lit, Program};

/// Shared handle to a spec.
pub type SpecRef = Rc<dyn Spec>;

/// A named, typed operation.
pub trait Spec {
    fn name(&self) -> &str;

    /// The declared signature template. Callers instantiate it per call.
    fn sig(&self, sys: &mut Sys) -> Result<Type, TypeError>;

    /// Resolve a laid-out call.
    ///
    /// The default resolves every argument in declared order against its
    /// parameter, then unifies the result with `hint`. Returning `Some`
    /// replaces the call node with the returned expression.
    fn resolve(
        &self,
        prog: &mut Program,
        env: EnvId,
        call: &mut Call,
        hint: &Type,
    ) -> EvalResult<Option<Exp>> {
        prog.resolve_args(env, call)?;
        prog.resolve_result(call, hint)?;
        Ok(None)
    }

    /// Evaluate a resolved call. `env` is the environment the call was
    /// resolved with.
    fn eval(&self, prog: &mut Program, env: EnvId, call: &Call) -> EvalResult<Lit>;
}

impl fmt::Debug for dyn Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Spec({})", self.name())
    }
}
