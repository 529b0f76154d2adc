//! End-to-end checks through the public API: read, resolve, evaluate.

#![allow(clippy::unwrap_used, reason = "tests use unwrap to panic on unexpected state")]

use pretty_assertions::assert_eq;
use quill_eval::{layout, EnvId, EvalErrorKind, Exp, Lit, Program, Span, Tag, Val};
use quill_types::{Sys, Type};

fn resolve(prog: &mut Program, src: &str) -> Exp {
    let mut exp = prog.read(src).unwrap();
    prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap();
    exp
}

fn result_type(prog: &Program, exp: &Exp) -> String {
    prog.sys.pool.format_type(&exp.ty(&prog.sys.pool))
}

#[test]
fn variadic_add() {
    let mut prog = Program::default();
    let exp = resolve(&mut prog, "(add 1 2 3)");
    assert_eq!(result_type(&prog, &exp), "<num>");

    let Exp::Call(call) = &exp else {
        panic!("expected a call");
    };
    let add = prog.sys.parse("<form@add num@ tupl?|num _>").unwrap();
    assert_eq!(call.spec_name(), "add");
    assert_eq!(
        prog.sys.pool.params(&call.sig).len(),
        prog.sys.pool.params(&add).len()
    );

    let val = prog.eval(EnvId::ROOT, &exp).unwrap();
    assert_eq!(val.val, Val::Int(6));
}

#[test]
fn conditional_unifies_branches() {
    let mut prog = Program::default();
    let exp = resolve(&mut prog, "(if true 1 2)");
    assert_eq!(result_type(&prog, &exp), "<num>");
    assert_eq!(prog.eval(EnvId::ROOT, &exp).unwrap().val, Val::Int(1));
}

#[test]
fn positional_and_tagged_layouts_agree() {
    let mut sys = Sys::new();
    let sig = sys.parse("<func a:int b:int int>").unwrap();
    let int = |i| Exp::Lit(Lit::int(i), Span::DUMMY);
    let tag = |name, i| Exp::Tag(Tag::new(name, Span::DUMMY, Some(int(i))));
    let ints = |slots: Vec<Option<Exp>>| -> Vec<Option<i64>> {
        slots
            .iter()
            .map(|s| s.as_ref().and_then(Exp::as_lit).and_then(Lit::as_int))
            .collect()
    };

    let positional = layout(&sys.pool, &sig, vec![int(1), int(2)]).unwrap();
    let tagged = layout(&sys.pool, &sig, vec![tag("b", 2), tag("a", 1)]).unwrap();
    assert_eq!(ints(positional), vec![Some(1), Some(2)]);
    assert_eq!(ints(tagged), vec![Some(1), Some(2)]);
}

#[test]
fn instantiated_variables_propagate() {
    let mut sys = Sys::new();
    let tmpl = sys.parse("<func ?@1 list|?@1 ?@1>").unwrap();
    let sig = sys.instantiate(&tmpl).unwrap();

    let first = sys.pool.params(&sig)[0].ty.clone();
    sys.unify(&first, &Type::INT).unwrap();
    let sig = sys.update(&sig).unwrap();

    let second = sys.pool.params(&sig)[1].ty.clone();
    assert_eq!(sys.pool.format_type(&second), "<list|int>");
    assert_eq!(sys.pool.format_type(&sys.pool.result_of(&sig)), "<int>");
    // The template keeps its variables.
    assert_eq!(sys.pool.format_type(&tmpl), "<func ?@1 list|?@1 ?@1>");
}

#[test]
fn undeclared_symbols_fail_lookup() {
    for src in ["missing", "(add 1 missing)", "(let x:1 (with {a:1} (add x missing)))"] {
        let mut prog = Program::default();
        let mut exp = prog.read(src).unwrap();
        let err = prog.run(&mut exp).unwrap_err();
        assert!(
            matches!(&err.kind, EvalErrorKind::SymbolNotFound { name } if name == "missing"),
            "{src}: {err:?}"
        );
        assert!(err.span.is_some());
    }
}

#[test]
fn literals_resolve_idempotently() {
    let mut prog = Program::default();
    let mut exp = prog.read("[1 2]").unwrap();
    let before = result_type(&prog, &exp);
    for _ in 0..3 {
        prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap();
    }
    assert_eq!(result_type(&prog, &exp), before);
    let val = prog.eval(EnvId::ROOT, &exp).unwrap();
    assert_eq!(val.to_text(&prog.sys.pool), "[1 2]");
}

#[test]
fn a_small_program() {
    let src = r#"
        ; sum of squares, with a label
        (let sq:(fn n:int (mul n n))
             total:(add (sq 3) (sq 4))
          (with {label:"total"}
            (cat .label "=" (con str total))))
    "#;
    let mut prog = Program::default();
    let mut exp = prog.read(src).unwrap();
    let val = prog.run(&mut exp).unwrap();
    assert_eq!(val.as_str(), Some("total=25"));
    assert_eq!(result_type(&prog, &exp), "<str>");
}
