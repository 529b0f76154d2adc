//! Call argument layout.
//!
//! Matches a flat argument list to the parameter slots of an instantiated
//! signature, producing exactly one slot per declared parameter (the
//! result excluded). Two shapes are supported:
//!
//! - **form** signatures take arguments in declared order. A parameter of
//!   kind `tupl` with an element type is variadic: it consumes the longest
//!   run of following arguments that are tags (element kind `tag`) or
//!   non-tags (anything else), grouped into one [`Tupl`] node.
//! - **func** signatures take either all tagged arguments, matched to
//!   parameters by key, or all positional ones. A trailing `list`
//!   parameter collects excess positional arguments.
//!
//! Optional parameters without an argument get an empty slot.

use quill_types::{Kind, Param, Pool, Type};

use crate::error::{duplicate_tag, missing_param, unexpected_arg, unknown_tag};
use crate::{EvalError, EvalErrorKind, EvalResult, Exp, Lit, Span, Tupl};

/// Lay out `args` against `sig`.
pub fn layout(pool: &Pool, sig: &Type, args: Vec<Exp>) -> EvalResult<Vec<Option<Exp>>> {
    let params = pool.args_of(sig);
    let slots = if sig.kind.base().contains(Kind::FUNC) {
        layout_func(pool, params, args)?
    } else {
        layout_form(pool, params, args)?
    };
    debug_assert_eq!(slots.len(), params.len());
    Ok(slots)
}

fn missing(pool: &Pool, idx: usize, p: &Param) -> EvalError {
    missing_param(idx, pool.format_type(&p.ty))
}

/// The element type of a variadic form parameter.
fn variadic_elem<'p>(pool: &'p Pool, ty: &Type) -> Option<&'p Type> {
    if ty.kind.base() == Kind::TUPL {
        pool.elem(ty)
    } else {
        None
    }
}

fn group(ty: &Type, items: Vec<Exp>) -> Exp {
    let span = items
        .iter()
        .map(Exp::span)
        .reduce(Span::merge)
        .unwrap_or_default();
    Exp::Tupl(Tupl {
        ty: ty.clone().definite(),
        span,
        items,
    })
}

fn layout_form(pool: &Pool, params: &[Param], args: Vec<Exp>) -> EvalResult<Vec<Option<Exp>>> {
    let mut out = Vec::with_capacity(params.len());
    let mut args = args.into_iter().peekable();
    let mut consumed = 0;

    for (idx, p) in params.iter().enumerate() {
        if let Some(el) = variadic_elem(pool, &p.ty) {
            let tags = el.kind.base() == Kind::TAG;
            let mut run = Vec::new();
            while let Some(arg) = args.next_if(|a| a.tag_name().is_some() == tags) {
                run.push(arg);
            }
            consumed += run.len();

            let arity = pool.params(el).len().max(1);
            if tags && run.len() % arity != 0 {
                return Err(EvalError::new(EvalErrorKind::TagRunArity {
                    arity,
                    got: run.len(),
                }));
            }
            if run.is_empty() {
                if !p.ty.is_optional() {
                    return Err(missing(pool, idx, p));
                }
                out.push(None);
            } else {
                out.push(Some(group(&p.ty, run)));
            }
            continue;
        }

        match args.next() {
            Some(arg) => {
                consumed += 1;
                out.push(Some(arg));
            }
            None if p.ty.is_optional() => out.push(None),
            None => return Err(missing(pool, idx, p)),
        }
    }

    if let Some(extra) = args.next() {
        return Err(unexpected_arg(consumed).at(extra.span()));
    }
    Ok(out)
}

fn layout_func(pool: &Pool, params: &[Param], args: Vec<Exp>) -> EvalResult<Vec<Option<Exp>>> {
    let mut out: Vec<Option<Exp>> = vec![None; params.len()];
    let tagged = args.iter().filter(|a| a.tag_name().is_some()).count();

    if tagged > 0 {
        if tagged < args.len() {
            let span = args.first().map(Exp::span).unwrap_or_default();
            return Err(EvalError::new(EvalErrorKind::MixedArgs).at(span));
        }
        for arg in args {
            let Exp::Tag(tag) = arg else { continue };
            let key = tag.name.to_lowercase();
            let idx = params
                .iter()
                .position(|p| *p.key == *key)
                .ok_or_else(|| unknown_tag(&tag.name).at(tag.span))?;
            if out[idx].is_some() {
                return Err(duplicate_tag(&tag.name).at(tag.span));
            }
            // A bare tag is a flag.
            let val = match tag.exp {
                Some(exp) => *exp,
                None => Exp::Lit(Lit::bool(true), tag.span),
            };
            out[idx] = Some(val);
        }
    } else {
        let rest = params
            .last()
            .filter(|p| p.ty.kind.base() == Kind::LIST)
            .map(|p| &p.ty);
        let fixed = params.len() - usize::from(rest.is_some());

        let mut args = args.into_iter();
        for slot in out.iter_mut().take(fixed) {
            match args.next() {
                Some(arg) => *slot = Some(arg),
                None => break,
            }
        }
        let excess: Vec<Exp> = args.collect();
        match rest {
            Some(ty) if !excess.is_empty() => out[fixed] = Some(group(ty, excess)),
            None => {
                if let Some(extra) = excess.first() {
                    return Err(unexpected_arg(fixed).at(extra.span()));
                }
            }
            Some(_) => {}
        }
    }

    for (idx, p) in params.iter().enumerate() {
        if out[idx].is_none() && !p.ty.is_optional() {
            return Err(missing(pool, idx, p));
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
