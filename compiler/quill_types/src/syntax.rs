//! Textual type syntax.
//!
//! ```text
//! type   := '<' head item* '>' | head
//! head   := '.' path '?'?
//!         | kind? ('?' | '!')? ('@' (name | id)?)? ('|' type)?
//! item   := (name ':')? type        parameters
//!         | name (':' int)?         constants of enum and bits
//!         | type                    alternatives of alt
//! ```
//!
//! A printed head is always in the order kind name, optionality suffix,
//! `@` part, element. An empty kind prints as `_` unless a suffix follows.
//! Top-level types are always bracketed; nested types only when they carry
//! a parameter, constant or alternative list.

#![allow(clippy::format_push_string)] // Type printing prioritizes clarity over allocation

use rustc_hash::FxHashSet;

use crate::sys::MAX_DEPTH;
use crate::{ensure_sufficient_stack, Body, BodyId, Const, Kind, Param, Pool, Type, TypeError};

impl Pool {
    /// Parse a type from its textual syntax.
    pub fn parse_type(&mut self, src: &str) -> Result<Type, TypeError> {
        let mut p = Parser {
            src: src.as_bytes(),
            pos: 0,
            depth: 0,
            pool: self,
        };
        p.skip_ws();
        let ty = p.parse_type()?;
        p.skip_ws();
        if p.pos < p.src.len() {
            return Err(TypeError::syntax(p.pos, "unexpected trailing input"));
        }
        Ok(ty)
    }

    /// Print a type in canonical syntax.
    pub fn format_type(&self, ty: &Type) -> String {
        let mut buf = String::new();
        let mut stack = FxHashSet::default();
        self.write_type(ty, &mut buf, true, &mut stack);
        buf
    }

    fn write_type(&self, ty: &Type, buf: &mut String, top: bool, stack: &mut FxHashSet<BodyId>) {
        // A body already being printed further up is a cycle: print the
        // head alone.
        let entered = match ty.body {
            Some(id) => stack.insert(id),
            None => true,
        };
        let body = if entered { self.body_of(ty) } else { None };
        let listed = matches!(body, Some(Body::Params(_) | Body::Consts(_) | Body::Alt(_)));
        let bracket = top || listed;

        if bracket {
            buf.push('<');
        }
        self.write_head(ty, body, buf, stack);
        match body {
            Some(Body::Params(ps)) => {
                for p in ps {
                    buf.push(' ');
                    if p.is_named() {
                        buf.push_str(&p.name);
                        buf.push(':');
                    }
                    self.write_type(&p.ty, buf, false, stack);
                }
            }
            Some(Body::Consts(cs)) => {
                for c in cs {
                    buf.push_str(&format!(" {}:{}", c.name, c.val));
                }
            }
            Some(Body::Alt(alts)) => {
                for alt in alts {
                    buf.push(' ');
                    self.write_type(alt, buf, false, stack);
                }
            }
            _ => {}
        }
        if bracket {
            buf.push('>');
        }

        if entered {
            if let Some(id) = ty.body {
                stack.remove(&id);
            }
        }
    }

    fn write_head(
        &self,
        ty: &Type,
        body: Option<&Body>,
        buf: &mut String,
        stack: &mut FxHashSet<BodyId>,
    ) {
        if ty.kind.contains(Kind::SEL) {
            buf.push('.');
            if let Some(Body::Sel(path)) = body {
                buf.push_str(path);
            }
            if ty.kind.is_optional() {
                buf.push('?');
            }
            return;
        }

        let mut head = String::new();
        let named = ty.kind.difference(Kind::REF).write_name(&mut head);
        let suffix = if ty.kind.is_optional() {
            Some('?')
        } else if ty.kind.contains(Kind::SOME) {
            Some('!')
        } else {
            None
        };
        let at = if let Some(name) = ty.name() {
            Some(format!("@{name}"))
        } else if ty.id > 0 {
            Some(format!("@{}", ty.id))
        } else if ty.kind.is_var() {
            Some("@".to_string())
        } else {
            None
        };

        if !named && suffix.is_none() && at.is_none() {
            head.push('_');
        }
        if let Some(c) = suffix {
            head.push(c);
        }
        if let Some(at) = at {
            head.push_str(&at);
        }
        buf.push_str(&head);

        if let Some(Body::Elem(el)) = body {
            buf.push('|');
            self.write_type(el, buf, false, stack);
        }
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
    depth: usize,
    pool: &'a mut Pool,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, f: impl Fn(u8) -> bool) -> &'a str {
        let src: &'a [u8] = self.src;
        let start = self.pos;
        while self.peek().is_some_and(&f) {
            self.pos += 1;
        }
        // Only ASCII bytes are accepted by every caller's predicate.
        std::str::from_utf8(&src[start..self.pos]).unwrap_or_default()
    }

    fn parse_type(&mut self) -> Result<Type, TypeError> {
        if self.depth >= MAX_DEPTH {
            return Err(TypeError::syntax(self.pos, "type nested too deeply"));
        }
        self.depth += 1;
        let res = ensure_sufficient_stack(|| self.parse_type_node());
        self.depth -= 1;
        res
    }

    fn parse_type_node(&mut self) -> Result<Type, TypeError> {
        if !self.eat(b'<') {
            return self.parse_head();
        }
        self.skip_ws();
        let mut ty = self.parse_head()?;
        self.skip_ws();

        let base = ty.kind.base();
        let mut params = Vec::new();
        let mut consts = Vec::new();
        let mut alts = Vec::new();
        while !self.eat(b'>') {
            if self.peek().is_none() {
                return Err(TypeError::syntax(self.pos, "unclosed '<'"));
            }
            if ty.body.is_some() {
                return Err(TypeError::syntax(self.pos, "type already has a body"));
            }
            if base == Kind::ALT {
                alts.push(self.parse_type()?);
            } else if base == Kind::ENUM || base == Kind::BITS {
                consts.push(self.parse_const(base, consts.len())?);
            } else {
                params.push(self.parse_param()?);
            }
            self.skip_ws();
        }

        let body = if !alts.is_empty() {
            Some(Body::Alt(alts))
        } else if !consts.is_empty() {
            Some(Body::Consts(consts))
        } else if !params.is_empty() {
            Some(Body::Params(params))
        } else {
            None
        };
        if let Some(body) = body {
            ty.body = Some(self.pool.alloc(body));
        }
        Ok(ty)
    }

    fn parse_head(&mut self) -> Result<Type, TypeError> {
        let start = self.pos;
        if self.eat(b'.') {
            let path = self
                .take_while(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'.')
                .to_string();
            if path.is_empty() {
                return Err(TypeError::syntax(start, "empty selector path"));
            }
            let mut kind = Kind::SEL;
            if self.eat(b'?') {
                kind |= Kind::NONE;
            }
            let body = self.pool.alloc(Body::Sel(path.into()));
            return Ok(Type::of(kind).with_body(body));
        }

        let name = self.take_while(|c| c.is_ascii_alphabetic() || c == b'_' || c == b'+');
        let mut kind = if name.is_empty() {
            Kind::empty()
        } else {
            let name = name.to_string();
            Kind::from_kind_name(&name)
                .ok_or_else(|| TypeError::syntax(start, format!("unknown kind {name:?}")))?
        };
        let mut ty = Type::default();

        if self.eat(b'?') {
            kind |= Kind::NONE;
        } else if self.eat(b'!') {
            kind |= Kind::SOME;
        }

        let mut suffixed = kind.markers() != Kind::empty();
        if self.eat(b'@') {
            suffixed = true;
            let at = self
                .take_while(|c| c.is_ascii_alphanumeric() || c == b'_')
                .to_string();
            if at.is_empty() {
                kind |= Kind::VAR;
            } else if at.bytes().all(|c| c.is_ascii_digit()) {
                kind |= Kind::VAR;
                ty.id = at
                    .parse()
                    .map_err(|_| TypeError::syntax(start, "variable id out of range"))?;
            } else {
                if kind.base().is_empty() {
                    kind |= Kind::REF;
                }
                ty.name = Some(at.into());
            }
        }

        if name.is_empty() && !suffixed {
            return Err(TypeError::syntax(start, "expected a type"));
        }

        ty.kind = kind;
        if self.eat(b'|') {
            let el = self.parse_type()?;
            ty.body = Some(self.pool.alloc(Body::Elem(el)));
        }
        Ok(ty)
    }

    fn parse_param(&mut self) -> Result<Param, TypeError> {
        let start = self.pos;
        let name = self
            .take_while(|c| c.is_ascii_alphanumeric() || c == b'_')
            .to_string();
        if !name.is_empty() && self.eat(b':') {
            let ty = self.parse_type()?;
            return Ok(Param::new(&name, ty));
        }
        self.pos = start;
        Ok(Param::unnamed(self.parse_type()?))
    }

    fn parse_const(&mut self, base: Kind, idx: usize) -> Result<Const, TypeError> {
        let start = self.pos;
        let name = self
            .take_while(|c| c.is_ascii_alphanumeric() || c == b'_')
            .to_string();
        if name.is_empty() {
            return Err(TypeError::syntax(start, "expected a constant name"));
        }
        let val = if self.eat(b':') {
            let num_start = self.pos;
            let neg = self.eat(b'-');
            let digits = self.take_while(|c| c.is_ascii_digit()).to_string();
            let val: i64 = digits
                .parse()
                .map_err(|_| TypeError::syntax(num_start, "expected an integer constant"))?;
            if neg {
                -val
            } else {
                val
            }
        } else {
            let idx = i64::try_from(idx).unwrap_or(i64::MAX);
            if base == Kind::BITS {
                1_i64.checked_shl(u32::try_from(idx).unwrap_or(u32::MAX)).unwrap_or(0)
            } else {
                idx + 1
            }
        };
        Ok(Const::new(&name, val))
    }
}
