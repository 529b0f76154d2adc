//! S-expression reader.
//!
//! ```text
//! exp   := call | tag | list | dict | type | string | number | symbol
//! call  := '(' exp+ ')'
//! tag   := symbol ':' exp?          a bare `name:` is a flag
//! list  := '[' const* ']'
//! dict  := '{' (symbol ':' const)* '}'
//! type  := '<' type-syntax '>'
//! ```
//!
//! `true`, `false` and `null` read as literals and `;` starts a comment.
//! Nesting deeper than the configured depth is a syntax error.
//! Number literals are typed `num` whatever their representation. List
//! and dict literals take their element type from their items when all
//! items agree, `any` otherwise.

use quill_types::{ensure_sufficient_stack, Kind, Sys, Type};

use crate::error::syntax;
use crate::{Call, Config, EvalError, EvalResult, Exp, Lit, Span, Sym, Tag, Val};

/// Read exactly one expression from `src`.
pub fn read(sys: &mut Sys, src: &str) -> EvalResult<Exp> {
    read_nested(sys, src, Config::DEFAULT_MAX_DEPTH)
}

/// Read exactly one expression nested at most `max_depth` levels deep.
pub fn read_nested(sys: &mut Sys, src: &str, max_depth: usize) -> EvalResult<Exp> {
    let mut r = Reader {
        src,
        pos: 0,
        depth: 0,
        max_depth,
        sys,
    };
    r.skip_ws();
    if r.peek().is_none() {
        return Err(syntax("expected an expression", r.here()));
    }
    let exp = r.exp()?;
    r.skip_ws();
    if r.peek().is_some() {
        return Err(syntax("unexpected input after the expression", r.here()));
    }
    Ok(exp)
}

struct Reader<'s, 'y> {
    src: &'s str,
    pos: usize,
    depth: usize,
    max_depth: usize,
    sys: &'y mut Sys,
}

fn is_sym_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'.'
}

fn is_sym_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.'
}

fn is_delim(c: u8) -> bool {
    c.is_ascii_whitespace() || matches!(c, b')' | b']' | b'}' | b';')
}

impl Reader<'_, '_> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, off: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + off).copied()
    }

    fn here(&self) -> Span {
        Span::from_range(self.pos..self.pos)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::from_range(start..self.pos)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c == b';' {
                while self.peek().is_some_and(|c| c != b'\n') {
                    self.pos += 1;
                }
            } else if c.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn exp(&mut self) -> EvalResult<Exp> {
        if self.depth >= self.max_depth {
            return Err(syntax(
                format!("expression nested deeper than {}", self.max_depth),
                self.here(),
            ));
        }
        self.depth += 1;
        let res = ensure_sufficient_stack(|| self.exp_node());
        self.depth -= 1;
        res
    }

    fn exp_node(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        match self.peek() {
            Some(b'(') => self.call(),
            Some(b'[') => self.list(),
            Some(b'{') => self.dict(),
            Some(b'<') => self.typ(),
            Some(b'"') => self.string(),
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(b'-') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
            Some(c) if is_sym_start(c) => self.symbol(),
            Some(c) => {
                self.pos += 1;
                Err(syntax(
                    format!("unexpected character {:?}", char::from(c)),
                    self.span_from(start),
                ))
            }
            None => Err(syntax("unexpected end of input", self.here())),
        }
    }

    /// Expressions up to the closing delimiter, which is consumed.
    fn seq(&mut self, close: u8, open_at: usize) -> EvalResult<Vec<Exp>> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(b')' | b']' | b'}') => {
                    return Err(syntax("mismatched closing delimiter", self.here()));
                }
                Some(_) => items.push(self.exp()?),
                None => {
                    return Err(syntax(
                        format!("unclosed {:?}", char::from(self.src.as_bytes()[open_at])),
                        Span::from_range(open_at..self.pos),
                    ))
                }
            }
        }
    }

    fn call(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        let raw = self.seq(b')', start)?;
        let span = self.span_from(start);
        if raw.is_empty() {
            return Err(syntax("empty call", span));
        }
        Ok(Exp::Call(Box::new(Call::new(span, raw))))
    }

    /// A constant item of a list or dict literal.
    fn constant(exp: Exp) -> EvalResult<Lit> {
        match exp {
            Exp::Lit(lit, _) => Ok(lit),
            other => Err(syntax("collection literals hold constants only", other.span())),
        }
    }

    /// The element type shared by `items`, or `any`.
    fn elem_type<'a>(&self, mut tys: impl Iterator<Item = &'a Type>) -> Type {
        let Some(first) = tys.next() else {
            return Type::VOID;
        };
        if tys.all(|t| self.sys.pool.type_eq(t, first)) {
            first.clone()
        } else {
            Type::ANY
        }
    }

    fn list(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        let items = self
            .seq(b']', start)?
            .into_iter()
            .map(Self::constant)
            .collect::<EvalResult<Vec<_>>>()?;
        let el = self.elem_type(items.iter().map(|l| &l.ty));
        let ty = self.sys.pool.list(el);
        Ok(Exp::Lit(Lit::new(ty, Val::List(items)), self.span_from(start)))
    }

    fn dict(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        let mut entries = Vec::new();
        for item in self.seq(b'}', start)? {
            let Exp::Tag(tag) = item else {
                return Err(syntax("dict entries must be tagged", item.span()));
            };
            let val = match tag.exp {
                Some(exp) => Self::constant(*exp)?,
                None => Lit::bool(true),
            };
            entries.push((tag.name, val));
        }
        let el = self.elem_type(entries.iter().map(|(_, l)| &l.ty));
        let ty = self.sys.pool.wrap(Kind::DICT, el);
        Ok(Exp::Lit(Lit::new(ty, Val::Dict(entries)), self.span_from(start)))
    }

    fn typ(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                b'<' => depth += 1,
                b'>' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        let span = self.span_from(start);
        if depth != 0 {
            return Err(syntax("unclosed type literal", span));
        }
        let text = &self.src[start..self.pos];
        let ty = self
            .sys
            .parse(text)
            .map_err(|e| EvalError::from(e).at(span))?;
        Ok(Exp::Lit(Lit::typ(ty), span))
    }

    fn string(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        let mut chars = self.src[self.pos..].char_indices();
        loop {
            let Some((off, c)) = chars.next() else {
                self.pos = self.src.len();
                return Err(syntax("unclosed string", self.span_from(start)));
            };
            match c {
                '"' => {
                    self.pos += off + 1;
                    break;
                }
                '\\' => {
                    let esc = chars.next().map(|(_, e)| e);
                    out.push(match esc {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(e @ ('"' | '\\')) => e,
                        other => {
                            self.pos += off;
                            return Err(syntax(
                                format!("unknown escape {other:?}"),
                                self.span_from(start),
                            ));
                        }
                    });
                }
                c => out.push(c),
            }
        }
        Ok(Exp::Lit(Lit::str(&out), self.span_from(start)))
    }

    fn number(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        let mut real = false;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => {}
                b'.' | b'e' | b'E' => real = true,
                b'+' | b'-' if matches!(self.src.as_bytes()[self.pos - 1], b'e' | b'E') => {}
                _ => break,
            }
            self.pos += 1;
        }
        let span = self.span_from(start);
        if self.peek().is_some_and(|c| !is_delim(c)) {
            return Err(syntax("malformed number", span));
        }
        let text = &self.src[start..self.pos];
        let val = if real {
            text.parse().map(Val::Real).ok()
        } else {
            text.parse().map(Val::Int).ok()
        };
        let val = val.ok_or_else(|| syntax(format!("malformed number {text:?}"), span))?;
        Ok(Exp::Lit(Lit::num(val), span))
    }

    fn symbol(&mut self) -> EvalResult<Exp> {
        let start = self.pos;
        while self.peek().is_some_and(is_sym_char) {
            self.pos += 1;
        }
        let name = &self.src[start..self.pos];

        if self.peek() == Some(b':') {
            self.pos += 1;
            let flag = self.peek().map_or(true, is_delim);
            let exp = if flag { None } else { Some(self.exp()?) };
            return Ok(Exp::Tag(Tag::new(name, self.span_from(start), exp)));
        }

        let span = self.span_from(start);
        Ok(match name {
            "true" => Exp::Lit(Lit::bool(true), span),
            "false" => Exp::Lit(Lit::bool(false), span),
            "null" => Exp::Lit(Lit::null(), span),
            _ => Exp::Sym(Sym::new(name, span)),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]
mod tests;
