//! Unification.
//!
//! `unify(t, h)` computes the most specific type consistent with both
//! sides and rebinds every variable id of either side to that result, so a
//! constraint found anywhere propagates to every occurrence.
//!
//! Base kinds are compared with the `VAR`, `NONE` and `SOME` markers
//! stripped:
//! - an empty base adopts the other side
//! - an `alt` body narrows to the first alternative, in declaration
//!   order, that unifies with the other side; two `alt` sides keep every
//!   compatible pair
//! - equal bases unify their bodies
//! - differing bases intersect, and an empty intersection is a mismatch
//!
//! Types still carrying a selector or reference do not unify.

use rustc_hash::FxHashSet;

use crate::sys::MAX_DEPTH;
use crate::{ensure_sufficient_stack, Body, BodyId, Kind, Param, Sys, Type, TypeError};

/// Body pairs currently being unified, to stop on cyclic types.
type History = FxHashSet<(BodyId, BodyId)>;

impl Sys {
    /// Unify `t` with the hint `h`, returning the unified type.
    pub fn unify(&mut self, t: &Type, h: &Type) -> Result<Type, TypeError> {
        let mut hist = History::default();
        self.unify_in(t, h, &mut hist, 0)
    }

    fn unify_in(
        &mut self,
        t: &Type,
        h: &Type,
        hist: &mut History,
        depth: usize,
    ) -> Result<Type, TypeError> {
        if depth > MAX_DEPTH {
            return Err(TypeError::DepthExceeded { depth });
        }
        let a = self.update(t)?;
        let b = self.update(h)?;
        for side in [&a, &b] {
            if side.kind.is_unresolved() {
                return Err(TypeError::Unresolved {
                    ty: self.pool.format_type(side),
                });
            }
        }

        let shape = ensure_sufficient_stack(|| self.unify_shape(&a, &b, hist, depth))?;
        let res = self.finish(&a, &b, shape)?;
        tracing::trace!(
            t = %self.pool.format_type(&a),
            h = %self.pool.format_type(&b),
            res = %self.pool.format_type(&res),
            "unified"
        );

        for id in [t.id, h.id, a.id, b.id] {
            if id > 0 {
                self.rebind(id, res.clone());
            }
        }
        Ok(res)
    }

    /// Kind and body of the result, before markers, names and ids.
    fn unify_shape(
        &mut self,
        a: &Type,
        b: &Type,
        hist: &mut History,
        depth: usize,
    ) -> Result<Type, TypeError> {
        let (ka, kb) = (a.kind.base(), b.kind.base());
        if ka.is_empty() {
            return Ok(b.clone());
        }
        if kb.is_empty() {
            return Ok(a.clone());
        }

        let alt_a = matches!(self.pool.body_of(a), Some(Body::Alt(_)));
        let alt_b = matches!(self.pool.body_of(b), Some(Body::Alt(_)));
        if alt_a || alt_b {
            return self.narrow(a, b, alt_a, alt_b, hist, depth);
        }

        let kind = ka & kb;
        if kind.is_empty() {
            return Err(self.mismatch(a, b));
        }
        let body = match (a.body, b.body) {
            (None, None) => None,
            (Some(x), None) => Some(x),
            (None, Some(y)) => Some(y),
            (Some(x), Some(y)) => Some(self.unify_bodies(a, b, x, y, hist, depth)?),
        };
        Ok(Type {
            kind,
            id: 0,
            name: None,
            body,
        })
    }

    fn unify_bodies(
        &mut self,
        a: &Type,
        b: &Type,
        x: BodyId,
        y: BodyId,
        hist: &mut History,
        depth: usize,
    ) -> Result<BodyId, TypeError> {
        if x == y || !hist.insert((x, y)) {
            return Ok(x);
        }
        let res = self.unify_body_pair(a, b, x, y, hist, depth);
        hist.remove(&(x, y));
        res
    }

    fn unify_body_pair(
        &mut self,
        a: &Type,
        b: &Type,
        x: BodyId,
        y: BodyId,
        hist: &mut History,
        depth: usize,
    ) -> Result<BodyId, TypeError> {
        match (self.pool.body(x).clone(), self.pool.body(y).clone()) {
            (Body::Elem(ex), Body::Elem(ey)) => {
                let el = self.unify_in(&ex, &ey, hist, depth + 1)?;
                Ok(self.pool.alloc(Body::Elem(el)))
            }
            (Body::Params(px), Body::Params(py)) => {
                let same_keys =
                    px.len() == py.len() && px.iter().zip(&py).all(|(p, q)| p.key == q.key);
                if !same_keys {
                    return Err(TypeError::ShapeMismatch {
                        expected: self.pool.format_type(a),
                        found: self.pool.format_type(b),
                    });
                }
                let mut params = Vec::with_capacity(px.len());
                for (p, q) in px.iter().zip(&py) {
                    let ty = self.unify_in(&p.ty, &q.ty, hist, depth + 1)?;
                    params.push(Param { ty, ..p.clone() });
                }
                Ok(self.pool.alloc(Body::Params(params)))
            }
            (bx, by) if bx == by => Ok(x),
            _ => Err(self.mismatch(a, b)),
        }
    }

    /// Unify where at least one side is an alternative.
    fn narrow(
        &mut self,
        a: &Type,
        b: &Type,
        alt_a: bool,
        alt_b: bool,
        hist: &mut History,
        depth: usize,
    ) -> Result<Type, TypeError> {
        if alt_a && alt_b {
            return self.narrow_pairs(a, b, hist, depth);
        }
        let (alt, other) = if alt_a { (a, b) } else { (b, a) };
        for x in self.pool.alts(alt).to_vec() {
            // Keep the argument order so names and markers merge as usual.
            let (l, r) = if alt_a { (&x, other) } else { (other, &x) };
            if let Ok(res) = self.probe(|sys| sys.unify_in(l, r, hist, depth + 1)) {
                return Ok(res);
            }
        }
        Err(self.mismatch(a, b))
    }

    /// Both sides are alternatives: keep the result of every compatible
    /// pair. A single match is committed; several form a new alternative
    /// ordered by kind, which later hints narrow further.
    fn narrow_pairs(
        &mut self,
        a: &Type,
        b: &Type,
        hist: &mut History,
        depth: usize,
    ) -> Result<Type, TypeError> {
        let xs = self.pool.alts(a).to_vec();
        let ys = self.pool.alts(b).to_vec();
        let mut found: Vec<(Type, &Type, &Type)> = Vec::new();
        for x in &xs {
            for y in &ys {
                let Ok(res) = self.trial(|sys| sys.unify_in(x, y, hist, depth + 1)) else {
                    continue;
                };
                if !found.iter().any(|(t, _, _)| self.pool.type_eq(t, &res)) {
                    found.push((res, x, y));
                }
            }
        }
        found.sort_by_cached_key(|(t, _, _)| (t.kind.bits(), self.pool.format_type(t)));

        if found.is_empty() {
            return Err(self.mismatch(a, b));
        }
        if found.len() == 1 {
            let (x, y) = (found[0].1, found[0].2);
            return self.unify_in(x, y, hist, depth + 1);
        }
        let alts = found.into_iter().map(|(t, _, _)| t).collect();
        Ok(Type {
            kind: Kind::ALT,
            id: 0,
            name: None,
            body: Some(self.pool.alloc(Body::Alt(alts))),
        })
    }

    /// Merge names, markers and ids into the unified shape.
    fn finish(&mut self, a: &Type, b: &Type, shape: Type) -> Result<Type, TypeError> {
        let name = match (&a.name, &b.name) {
            (Some(x), Some(y)) if x != y => return Err(self.mismatch(a, b)),
            (Some(x), _) | (None, Some(x)) => Some(x.clone()),
            (None, None) => shape.name.clone(),
        };

        let mut kind = shape.kind.base();
        if a.is_optional() && b.is_optional() {
            kind |= Kind::NONE;
        }
        if a.kind.contains(Kind::SOME) || b.kind.contains(Kind::SOME) {
            kind |= Kind::SOME;
        }
        let mut res = Type {
            kind,
            id: 0,
            name,
            body: shape.body,
        };

        if a.is_var() && b.is_var() {
            res.kind |= Kind::VAR;
            res.id = if a.id > 0 { a.id } else { b.id };
        }
        // An alternative nobody narrowed yet stays open for later hints.
        if matches!(self.pool.body_of(&res), Some(Body::Alt(_))) {
            res.kind |= Kind::VAR;
            if res.id == 0 {
                res.id = [a.id, b.id]
                    .into_iter()
                    .find(|&id| id > 0)
                    .unwrap_or_else(|| self.fresh_id());
            }
        }
        Ok(res)
    }

    fn mismatch(&self, a: &Type, b: &Type) -> TypeError {
        TypeError::Mismatch {
            expected: self.pool.format_type(a),
            found: self.pool.format_type(b),
        }
    }
}
