//! Type-system context.
//!
//! A [`Sys`] owns the body [`Pool`], the variable binding map and the
//! declared names of one top-level resolution. Variable ids come from a
//! counter that only increases; bindings are added or overwritten, never
//! removed.
//!
//! # Usage
//!
//! ```ignore
//! let mut sys = Sys::new();
//! let tmpl = sys.parse("<func ?@1 list|?@1 ?@1>")?;
//! let sig = sys.instantiate(&tmpl)?;
//! let first = sys.pool.params(&sig)[0].ty.clone();
//! sys.unify(&first, &Type::INT)?;
//! let sig = sys.update(&sig)?; // <func int list|int int>
//! ```

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ensure_sufficient_stack, Body, BodyId, Kind, Pool, Type, TypeError};

/// Nesting limit of a single type edit. Exceeding it means a type graph
/// is malformed, e.g. a selector that selects itself.
pub(crate) const MAX_DEPTH: usize = 256;

/// Fallback name resolution consulted after the declared names.
pub type Resolver = Box<dyn Fn(&str) -> Option<Type>>;

/// Type-system context.
pub struct Sys {
    pub pool: Pool,
    next_id: u32,
    bindings: FxHashMap<u32, Type>,
    declared: FxHashMap<Box<str>, Type>,
    resolver: Option<Resolver>,
}

impl Default for Sys {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Sys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sys")
            .field("bodies", &self.pool.len())
            .field("next_id", &self.next_id)
            .field("bindings", &self.bindings.len())
            .field("declared", &self.declared.len())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

/// State of one instantiation call.
#[derive(Default)]
struct Inst {
    /// Template variable id to fresh id.
    ids: FxHashMap<u32, u32>,
    /// Template body to copied body.
    bodies: FxHashMap<BodyId, BodyId>,
    /// Enclosing template types with parameter lists, innermost last.
    scopes: Vec<Type>,
}

impl Sys {
    pub fn new() -> Self {
        Sys {
            pool: Pool::new(),
            next_id: 1,
            bindings: FxHashMap::default(),
            declared: FxHashMap::default(),
            resolver: None,
        }
    }

    /// Parse a type into this context's pool.
    ///
    /// Fresh ids handed out afterwards never collide with ids spelled out
    /// in the parsed text.
    pub fn parse(&mut self, src: &str) -> Result<Type, TypeError> {
        let ty = self.pool.parse_type(src)?;
        let mut seen = FxHashSet::default();
        let max = self.max_id(&ty, &mut seen);
        if max >= self.next_id {
            self.next_id = max.saturating_add(1);
        }
        Ok(ty)
    }

    fn max_id(&self, ty: &Type, seen: &mut FxHashSet<BodyId>) -> u32 {
        let Some(id) = ty.body else { return ty.id };
        if !seen.insert(id) {
            return ty.id;
        }
        let inner = match self.pool.body(id) {
            Body::Elem(el) => self.max_id(el, seen),
            Body::Alt(alts) => alts.iter().map(|t| self.max_id(t, seen)).max().unwrap_or(0),
            Body::Params(ps) => ps.iter().map(|p| self.max_id(&p.ty, seen)).max().unwrap_or(0),
            Body::Sel(_) | Body::Consts(_) => 0,
        };
        ty.id.max(inner)
    }

    /// Next value of the id counter.
    pub fn fresh_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Record `t` under its id, assigning a fresh id if it has none.
    pub fn bind(&mut self, mut t: Type) -> Type {
        if t.id == 0 {
            t.id = self.fresh_id();
        }
        self.bindings.insert(t.id, t.clone());
        t
    }

    /// Point `id` at `ty`, overwriting any earlier binding.
    pub(crate) fn rebind(&mut self, id: u32, ty: Type) {
        self.bindings.insert(id, ty);
    }

    /// The type currently bound to `id`.
    pub fn get(&self, id: u32) -> Option<&Type> {
        self.bindings.get(&id)
    }

    /// Declare a named type for `@name` references.
    pub fn declare(&mut self, name: &str, ty: Type) {
        self.declared.insert(name.into(), ty);
    }

    /// Install a resolver for names that were not declared.
    pub fn set_resolver(&mut self, f: impl Fn(&str) -> Option<Type> + 'static) {
        self.resolver = Some(Box::new(f));
    }

    /// Resolve a reference name to its declared type.
    pub fn resolve_ref(&self, name: &str) -> Result<Type, TypeError> {
        self.declared
            .get(name)
            .cloned()
            .or_else(|| self.resolver.as_ref().and_then(|f| f(name)))
            .ok_or_else(|| TypeError::UnknownRef {
                name: name.to_string(),
            })
    }

    /// The binding of `t` if it is not `t` itself.
    fn bound(&self, t: &Type) -> Option<&Type> {
        if t.id == 0 {
            return None;
        }
        self.bindings.get(&t.id).filter(|b| *b != t)
    }

    /// Replace the head of `t` by its binding or declaration until it is
    /// neither a bound id nor a reference.
    fn substitute(&self, t: &Type) -> Result<Type, TypeError> {
        let mut cur = t.clone();
        for _ in 0..MAX_DEPTH {
            if cur.kind.contains(Kind::REF) {
                let mut next = self.resolve_ref(cur.name().unwrap_or_default())?;
                if cur.is_optional() {
                    next = next.optional();
                }
                cur = next;
                continue;
            }
            match self.bound(&cur) {
                Some(next) => cur = next.clone(),
                None => return Ok(cur),
            }
        }
        Err(TypeError::DepthExceeded { depth: MAX_DEPTH })
    }

    /// A copy of `t` with every bound variable replaced by its binding and
    /// every reference replaced by its declaration.
    ///
    /// Returns `t` itself when there is nothing to replace, so updating an
    /// updated type is a no-op. Selectors are left in place.
    pub fn update(&mut self, t: &Type) -> Result<Type, TypeError> {
        if !self.needs_update(t) {
            return Ok(t.clone());
        }
        let mut memo = FxHashMap::default();
        self.update_in(t, &mut memo, 0)
    }

    fn update_in(
        &mut self,
        t: &Type,
        memo: &mut FxHashMap<BodyId, BodyId>,
        depth: usize,
    ) -> Result<Type, TypeError> {
        if depth > MAX_DEPTH {
            return Err(TypeError::DepthExceeded { depth });
        }
        let mut t = self.substitute(t)?;
        let Some(old) = t.body else { return Ok(t) };
        if let Some(&new) = memo.get(&old) {
            t.body = Some(new);
            return Ok(t);
        }
        if !self.needs_update(&t) {
            return Ok(t);
        }

        let new = self.pool.reserve();
        memo.insert(old, new);
        let body = self.pool.body(old).clone();
        let body = self.map_body(body, &mut |sys, ty| {
            ensure_sufficient_stack(|| sys.update_in(ty, memo, depth + 1))
        })?;
        self.pool.fill(new, body);
        t.body = Some(new);
        Ok(t)
    }

    fn needs_update(&self, t: &Type) -> bool {
        let mut seen = FxHashSet::default();
        self.needs_update_in(t, &mut seen)
    }

    fn needs_update_in(&self, t: &Type, seen: &mut FxHashSet<BodyId>) -> bool {
        if t.kind.contains(Kind::REF) || self.bound(t).is_some() {
            return true;
        }
        let Some(id) = t.body else { return false };
        if !seen.insert(id) {
            return false;
        }
        match self.pool.body(id) {
            Body::Elem(el) => self.needs_update_in(el, seen),
            Body::Alt(alts) => alts.iter().any(|t| self.needs_update_in(t, seen)),
            Body::Params(ps) => ps.iter().any(|p| self.needs_update_in(&p.ty, seen)),
            Body::Sel(_) | Body::Consts(_) => false,
        }
    }

    /// Apply `f` to every type directly contained in `body`.
    pub(crate) fn map_body(
        &mut self,
        body: Body,
        f: &mut dyn FnMut(&mut Sys, &Type) -> Result<Type, TypeError>,
    ) -> Result<Body, TypeError> {
        Ok(match body {
            Body::Elem(el) => Body::Elem(f(self, &el)?),
            Body::Alt(alts) => Body::Alt(
                alts.iter()
                    .map(|t| f(self, t))
                    .collect::<Result<_, _>>()?,
            ),
            Body::Params(ps) => Body::Params(
                ps.into_iter()
                    .map(|mut p| {
                        p.ty = f(self, &p.ty)?;
                        Ok(p)
                    })
                    .collect::<Result<_, TypeError>>()?,
            ),
            body @ (Body::Sel(_) | Body::Consts(_)) => body,
        })
    }

    /// A fresh copy of a generic template.
    ///
    /// Every variable gets a fresh id; repeated ids within the template map
    /// to the same fresh id, and an anonymous `@` always gets its own.
    /// References are resolved, and selectors are replaced by the sibling
    /// parameter they select in the nearest enclosing record or spec
    /// parameter list. Bindings of this context are not consulted: the
    /// template is copied as written.
    pub fn instantiate(&mut self, t: &Type) -> Result<Type, TypeError> {
        let mut inst = Inst::default();
        let ty = ensure_sufficient_stack(|| self.inst_in(t, &mut inst, 0))?;
        tracing::trace!(vars = inst.ids.len(), "instantiated template");
        Ok(ty)
    }

    fn inst_in(&mut self, t: &Type, inst: &mut Inst, depth: usize) -> Result<Type, TypeError> {
        if depth > MAX_DEPTH {
            return Err(TypeError::DepthExceeded { depth });
        }
        if t.kind.contains(Kind::SEL) {
            return self.select(t, inst, depth);
        }
        if t.kind.contains(Kind::REF) {
            let mut decl = self.resolve_ref(t.name().unwrap_or_default())?;
            if t.is_optional() {
                decl = decl.optional();
            }
            if !self.pool.reaches(&decl, Kind::VAR | Kind::SEL | Kind::REF) {
                return Ok(decl);
            }
            return self.inst_in(&decl, inst, depth + 1);
        }

        let mut out = t.clone();
        if t.is_var() {
            out.id = if t.id == 0 {
                self.fresh_id()
            } else {
                *inst.ids.entry(t.id).or_insert_with(|| self.fresh_id())
            };
        }

        if let Some(old) = t.body {
            if let Some(&new) = inst.bodies.get(&old) {
                out.body = Some(new);
            } else {
                let new = self.pool.reserve();
                inst.bodies.insert(old, new);
                let body = self.pool.body(old).clone();
                let scoped = matches!(body, Body::Params(_))
                    && t.kind.base().intersects(Kind::REC | Kind::SPEC);
                if scoped {
                    inst.scopes.push(t.clone());
                }
                let body = self.map_body(body, &mut |sys, ty| {
                    ensure_sufficient_stack(|| sys.inst_in(ty, inst, depth + 1))
                });
                if scoped {
                    inst.scopes.pop();
                }
                self.pool.fill(new, body?);
                out.body = Some(new);
            }
        }

        if out.is_var() {
            self.bindings.insert(out.id, out.clone());
        }
        Ok(out)
    }

    /// Resolve a selector against the innermost enclosing parameter list.
    ///
    /// A path segment matches a parameter key, its name or its index.
    fn select(&mut self, sel: &Type, inst: &mut Inst, depth: usize) -> Result<Type, TypeError> {
        let path: Box<str> = match self.pool.body_of(sel) {
            Some(Body::Sel(path)) => path.clone(),
            _ => "".into(),
        };
        let unknown = || TypeError::UnknownSelector {
            path: path.to_string(),
        };

        let mut cur = inst.scopes.last().cloned().ok_or_else(unknown)?;
        for seg in path.split('.') {
            let key = seg.to_lowercase();
            let params = self.pool.params(&cur);
            let idx = params
                .iter()
                .position(|p| &*p.key == key.as_str() || &*p.name == seg)
                .or_else(|| seg.parse::<usize>().ok().filter(|&i| i < params.len()))
                .ok_or_else(unknown)?;
            cur = params[idx].ty.clone();
        }

        let mut out = self.inst_in(&cur, inst, depth + 1)?;
        if sel.is_optional() {
            out = out.optional();
        }
        Ok(out)
    }

    /// The unbound variables, references and selectors reachable from `t`
    /// after updating it.
    pub fn free(&mut self, t: &Type) -> Result<Vec<Type>, TypeError> {
        let t = self.update(t)?;
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.free_in(&t, &mut out, &mut seen);
        Ok(out)
    }

    fn free_in(&self, t: &Type, out: &mut Vec<Type>, seen: &mut FxHashSet<BodyId>) {
        if t.kind.intersects(Kind::VAR | Kind::REF | Kind::SEL) && !out.contains(t) {
            out.push(t.clone());
        }
        let Some(id) = t.body else { return };
        if !seen.insert(id) {
            return;
        }
        match self.pool.body(id) {
            Body::Elem(el) => self.free_in(el, out, seen),
            Body::Alt(alts) => alts.iter().for_each(|t| self.free_in(t, out, seen)),
            Body::Params(ps) => ps.iter().for_each(|p| self.free_in(&p.ty, out, seen)),
            Body::Sel(_) | Body::Consts(_) => {}
        }
    }

    /// Run a trial edit, restoring the bindings if it fails.
    ///
    /// The id counter and the pool keep whatever the trial allocated.
    pub fn probe<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TypeError>,
    ) -> Result<T, TypeError> {
        let saved = self.bindings.clone();
        let res = f(self);
        if res.is_err() {
            self.bindings = saved;
        }
        res
    }

    /// Run a trial edit and always restore the bindings.
    pub(crate) fn trial<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, TypeError>,
    ) -> Result<T, TypeError> {
        let saved = self.bindings.clone();
        let res = f(self);
        self.bindings = saved;
        res
    }
}

#[cfg(test)]
mod tests;
