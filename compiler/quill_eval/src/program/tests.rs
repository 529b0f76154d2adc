use super::*;
use crate::{Span, Tag};
use pretty_assertions::assert_eq;

fn resolved(prog: &mut Program, src: &str) -> Exp {
    let mut exp = prog.read(src).unwrap();
    prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap();
    exp
}

fn type_of(prog: &Program, exp: &Exp) -> String {
    prog.sys.pool.format_type(&exp.ty(&prog.sys.pool))
}

#[test]
fn literals_resolve_to_themselves() {
    let mut prog = Program::default();
    let mut exp = Exp::Lit(Lit::str("hi"), Span::new(0, 4));
    for _ in 0..2 {
        prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap();
        let Exp::Lit(lit, span) = &exp else {
            panic!("literal was replaced by {exp:?}");
        };
        assert_eq!(lit, &Lit::str("hi"));
        assert_eq!(*span, Span::new(0, 4));
    }
}

#[test]
fn resolving_twice_keeps_the_call() {
    let mut prog = Program::default();
    let mut exp = resolved(&mut prog, "(add 1 2)");
    let before = type_of(&prog, &exp);
    prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap();
    assert_eq!(type_of(&prog, &exp), before);
    assert_eq!(prog.eval(EnvId::ROOT, &exp).unwrap().as_int(), Some(3));
}

#[test]
fn unresolved_nodes_fail_to_evaluate() {
    let mut prog = Program::default();
    let exp = prog.read("(add 1 2)").unwrap();
    let err = prog.eval(EnvId::ROOT, &exp).unwrap_err();
    assert!(err.kind.is_internal());
    assert_eq!(err.code(), "E9001");

    let exp = prog.read("x").unwrap();
    assert_eq!(prog.eval(EnvId::ROOT, &exp).unwrap_err().code(), "E9001");
}

#[test]
fn hints_narrow_results() {
    let mut prog = Program::default();
    let mut exp = prog.read("(add 1 2)").unwrap();
    prog.resolve(EnvId::ROOT, &mut exp, &Type::INT).unwrap();
    assert_eq!(type_of(&prog, &exp), "<int>");

    let mut exp = prog.read("(add 1 2)").unwrap();
    let err = prog.resolve(EnvId::ROOT, &mut exp, &Type::STR).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Type(_)), "{err:?}");
    assert_eq!(err.span, Some(Span::new(0, 9)));
}

#[test]
fn undeclared_symbols_carry_their_span() {
    let mut prog = Program::default();
    let mut exp = prog.read("(add 1 nope)").unwrap();
    let err = prog.resolve(EnvId::ROOT, &mut exp, &Type::VOID).unwrap_err();
    assert_eq!(err.code(), "E1001");
    assert_eq!(err.span, Some(Span::new(7, 11)));
}

#[test]
fn tuple_groups_unify_their_items() {
    let mut prog = Program::default();
    let exp = resolved(&mut prog, "(add 1 2 3)");
    let Exp::Call(call) = &exp else {
        panic!("expected a call");
    };
    let Some(group @ Exp::Tupl(_)) = call.arg(1) else {
        panic!("expected a group, got {:?}", call.arg(1));
    };
    assert_eq!(type_of(&prog, group), "<tupl|num>");
}

#[test]
fn tags_evaluate_to_their_value() {
    let mut prog = Program::default();
    let mut flag = Exp::Tag(Tag::new("x", Span::DUMMY, None));
    prog.resolve(EnvId::ROOT, &mut flag, &Type::VOID).unwrap();
    assert_eq!(prog.eval(EnvId::ROOT, &flag).unwrap(), Lit::bool(true));

    let mut tag = Exp::Tag(Tag::new("x", Span::DUMMY, Some(Exp::Lit(Lit::int(2), Span::DUMMY))));
    prog.resolve(EnvId::ROOT, &mut tag, &Type::VOID).unwrap();
    assert_eq!(prog.eval(EnvId::ROOT, &tag).unwrap(), Lit::int(2));
}

#[test]
fn depth_limit_stops_runaway_nesting() {
    let src = format!("{}1{}", "(add ".repeat(40), ")".repeat(40));
    let mut prog = Program::with_config(Builtins::std(), Config::default().with_max_depth(16));
    // The program's own reader stops at the same depth.
    assert!(matches!(prog.read(&src).unwrap_err().kind, EvalErrorKind::Syntax { .. }));
    let mut exp = crate::read(&mut prog.sys, &src).unwrap();
    let err = prog.run(&mut exp).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DepthExceeded { depth: 16 });

    let mut prog = Program::default();
    let mut exp = prog.read(&src).unwrap();
    assert_eq!(prog.run(&mut exp).unwrap().as_int(), Some(1));
}

#[test]
fn runaway_recursion_is_caught() {
    let mut prog = Program::with_config(Builtins::std(), Config::default().with_max_depth(64));
    let mut exp = prog.read("(let f:(fn n:int (recur n)) (f 1))").unwrap();
    let err = prog.run(&mut exp).unwrap_err();
    assert_eq!(err.code(), "E9002");
}

#[test]
fn environments_chain_to_the_root() {
    let mut prog = Program::default();
    let outer = prog.add_env(ForwardEnv);
    assert_eq!(outer.0.index(), 1);
    assert_eq!(prog.env(outer.0).unwrap().parent(), Some(EnvId::ROOT));
    assert!(prog.env(EnvId::from_index(9)).is_err());
}

/// Minimal scope that forwards every lookup.
#[derive(Debug)]
struct ForwardEnv(EnvId);

impl Env for ForwardEnv {
    fn parent(&self) -> Option<EnvId> {
        Some(EnvId::ROOT)
    }

    fn lookup(&self, _: &mut Program, _: &Sym, _: &str, _: bool) -> EvalResult<Option<Exp>> {
        Ok(None)
    }
}
