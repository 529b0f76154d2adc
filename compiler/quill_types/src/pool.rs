//! Body arena and structural equality.
//!
//! Every [`Body`] lives in a [`Pool`] and is addressed by a [`BodyId`].
//! Bodies can be reserved first and filled later, which is how
//! self-referential types are built:
//!
//! ```ignore
//! let mut pool = Pool::new();
//! let id = pool.reserve();
//! let node = Type::of(Kind::REC).with_name("Node").with_body(id);
//! pool.fill(id, Body::Params(vec![
//!     Param::new("val", Type::INT),
//!     Param::new("next", node.clone().optional()),
//! ]));
//! ```

use rustc_hash::FxHashSet;

use crate::{Body, BodyId, Kind, Param, Type};

/// Arena of type bodies.
#[derive(Clone, Debug, Default)]
pub struct Pool {
    bodies: Vec<Body>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bodies allocated so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Store a body and return its handle.
    pub fn alloc(&mut self, body: Body) -> BodyId {
        let id = BodyId::new(u32::try_from(self.bodies.len()).unwrap_or(u32::MAX));
        self.bodies.push(body);
        id
    }

    /// Reserve a body slot to be filled later with [`Pool::fill`].
    pub fn reserve(&mut self) -> BodyId {
        self.alloc(Body::Params(Vec::new()))
    }

    /// Replace the body stored under `id`.
    pub fn fill(&mut self, id: BodyId, body: Body) {
        if let Some(slot) = self.bodies.get_mut(id.index()) {
            *slot = body;
        } else {
            tracing::error!(?id, "fill of a body that was never allocated");
        }
    }

    /// The body stored under `id`.
    #[inline]
    pub fn body(&self, id: BodyId) -> &Body {
        &self.bodies[id.index()]
    }

    /// The body of `ty`, if any.
    #[inline]
    pub fn body_of(&self, ty: &Type) -> Option<&Body> {
        ty.body.map(|id| self.body(id))
    }

    /// The wrapped element of an `Elem` body.
    pub fn elem(&self, ty: &Type) -> Option<&Type> {
        match self.body_of(ty) {
            Some(Body::Elem(el)) => Some(el),
            _ => None,
        }
    }

    /// The parameter list of a `Params` body, or an empty slice.
    pub fn params(&self, ty: &Type) -> &[Param] {
        match self.body_of(ty) {
            Some(Body::Params(ps)) => ps,
            _ => &[],
        }
    }

    /// The alternatives of an `Alt` body, or an empty slice.
    pub fn alts(&self, ty: &Type) -> &[Type] {
        match self.body_of(ty) {
            Some(Body::Alt(alts)) => alts,
            _ => &[],
        }
    }

    /// The declared parameters of a spec signature, without the result.
    pub fn args_of(&self, sig: &Type) -> &[Param] {
        let ps = self.params(sig);
        &ps[..ps.len().saturating_sub(1)]
    }

    /// The result type of a spec signature: its last parameter.
    pub fn result_of(&self, sig: &Type) -> Type {
        self.params(sig)
            .last()
            .map_or(Type::VOID, |p| p.ty.clone())
    }

    /// Overwrite the type of parameter `idx` in place.
    ///
    /// Only used on signatures owned by a single call site, i.e. on the
    /// fresh copy produced by instantiation.
    pub fn set_param(&mut self, sig: &Type, idx: usize, ty: Type) {
        let Some(id) = sig.body else { return };
        if let Some(Body::Params(ps)) = self.bodies.get_mut(id.index()) {
            if let Some(p) = ps.get_mut(idx) {
                p.ty = ty;
            }
        }
    }

    /// Overwrite the result type of a spec signature in place.
    pub fn set_result(&mut self, sig: &Type, ty: Type) {
        let n = self.params(sig).len();
        if n > 0 {
            self.set_param(sig, n - 1, ty);
        }
    }

    /// A type wrapping `el` as its element.
    pub fn wrap(&mut self, kind: Kind, el: Type) -> Type {
        let body = self.alloc(Body::Elem(el));
        Type::of(kind).with_body(body)
    }

    /// A `list|el` type.
    pub fn list(&mut self, el: Type) -> Type {
        self.wrap(Kind::LIST, el)
    }

    /// A type with a parameter list body.
    pub fn with_params(&mut self, kind: Kind, params: Vec<Param>) -> Type {
        let body = self.alloc(Body::Params(params));
        Type::of(kind).with_body(body)
    }

    /// Structural equality.
    ///
    /// Kind, id and name must be identical and bodies must be both absent
    /// or recursively equal. Body pairs already under comparison count as
    /// equal, which makes this terminate on self-referential types.
    pub fn type_eq(&self, a: &Type, b: &Type) -> bool {
        let mut hist = FxHashSet::default();
        self.type_eq_in(a, b, &mut hist)
    }

    fn type_eq_in(&self, a: &Type, b: &Type, hist: &mut FxHashSet<(BodyId, BodyId)>) -> bool {
        if a.kind != b.kind || a.id != b.id || a.name != b.name {
            return false;
        }
        match (a.body, b.body) {
            (None, None) => true,
            (Some(x), Some(y)) => {
                if x == y || !hist.insert((x, y)) {
                    return true;
                }
                self.body_eq_in(self.body(x), self.body(y), hist)
            }
            _ => false,
        }
    }

    fn body_eq_in(&self, x: &Body, y: &Body, hist: &mut FxHashSet<(BodyId, BodyId)>) -> bool {
        match (x, y) {
            (Body::Elem(a), Body::Elem(b)) => self.type_eq_in(a, b, hist),
            (Body::Sel(a), Body::Sel(b)) => a == b,
            (Body::Consts(a), Body::Consts(b)) => a == b,
            (Body::Alt(a), Body::Alt(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|(a, b)| self.type_eq_in(a, b, hist))
            }
            (Body::Params(a), Body::Params(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(a, b)| {
                        a.name == b.name && a.key == b.key && self.type_eq_in(&a.ty, &b.ty, hist)
                    })
            }
            _ => false,
        }
    }

    /// Whether `ty` or anything reachable from it carries one of `kinds`.
    pub fn reaches(&self, ty: &Type, kinds: Kind) -> bool {
        let mut seen = FxHashSet::default();
        self.reaches_in(ty, kinds, &mut seen)
    }

    fn reaches_in(&self, ty: &Type, kinds: Kind, seen: &mut FxHashSet<BodyId>) -> bool {
        if ty.kind.intersects(kinds) {
            return true;
        }
        let Some(id) = ty.body else { return false };
        if !seen.insert(id) {
            return false;
        }
        match self.body(id) {
            Body::Elem(el) => self.reaches_in(el, kinds, seen),
            Body::Alt(alts) => alts.iter().any(|t| self.reaches_in(t, kinds, seen)),
            Body::Params(ps) => ps.iter().any(|p| self.reaches_in(&p.ty, kinds, seen)),
            Body::Sel(_) | Body::Consts(_) => false,
        }
    }
}

#[cfg(test)]
mod tests;
