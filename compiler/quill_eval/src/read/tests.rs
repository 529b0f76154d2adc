use super::*;
use crate::EvalErrorKind;
use pretty_assertions::assert_eq;

fn read_ok(src: &str) -> (Sys, Exp) {
    let mut sys = Sys::new();
    let exp = read(&mut sys, src).unwrap();
    (sys, exp)
}

fn read_err(src: &str) -> EvalErrorKind {
    read(&mut Sys::new(), src).unwrap_err().kind
}

fn lit(exp: &Exp) -> &Lit {
    exp.as_lit().unwrap()
}

#[test]
fn atoms() {
    let (_, exp) = read_ok("42");
    assert_eq!(lit(&exp).val, Val::Int(42));
    assert_eq!(lit(&exp).ty, Type::NUM);

    let (_, exp) = read_ok("-2.5");
    assert_eq!(lit(&exp).val, Val::Real(-2.5));

    let (_, exp) = read_ok("1e3");
    assert_eq!(lit(&exp).val, Val::Real(1000.0));

    let (_, exp) = read_ok(r#""a\"b\n""#);
    assert_eq!(lit(&exp).as_str(), Some("a\"b\n"));

    let (_, exp) = read_ok("null");
    assert!(lit(&exp).is_null());

    let (_, exp) = read_ok("false");
    assert_eq!(lit(&exp).val, Val::Bool(false));
}

#[test]
fn symbols_keep_their_spelling() {
    let (_, exp) = read_ok("  ..Name.x ");
    let Exp::Sym(sym) = exp else {
        panic!("expected a symbol, got {exp:?}");
    };
    assert_eq!(&*sym.name, "..Name.x");
    assert_eq!(sym.key(), "..name.x");
    assert_eq!(sym.span, Span::new(2, 10));
}

#[test]
fn calls_and_tags() {
    let (_, exp) = read_ok("(add x:1 flag: (mul 2 3)) ; trailing comment");
    let Exp::Call(call) = exp else {
        panic!("expected a call");
    };
    assert_eq!(call.span, Span::new(0, 25));
    assert_eq!(call.args.len(), 4);

    let Some(Exp::Tag(x)) = &call.args[1] else {
        panic!("expected a tag");
    };
    assert_eq!(&*x.name, "x");
    assert!(x.exp.is_some());

    let Some(Exp::Tag(flag)) = &call.args[2] else {
        panic!("expected a tag");
    };
    assert!(flag.exp.is_none());

    assert!(matches!(call.args[3], Some(Exp::Call(_))));
}

#[test]
fn flag_before_closing_paren() {
    let (_, exp) = read_ok("(f a:)");
    let Exp::Call(call) = exp else {
        panic!("expected a call");
    };
    let Some(Exp::Tag(tag)) = &call.args[1] else {
        panic!("expected a tag");
    };
    assert!(tag.exp.is_none());
}

#[test]
fn type_literals_nest() {
    let (sys, exp) = read_ok("<list|<rec x:int>>");
    let ty = lit(&exp).as_typ().unwrap();
    assert_eq!(sys.pool.format_type(ty), "<list|<rec x:int>>");
}

#[test]
fn collection_literals() {
    let (sys, exp) = read_ok("[1 2 3]");
    assert_eq!(sys.pool.format_type(&lit(&exp).ty), "<list|num>");
    assert_eq!(lit(&exp).iter_idx().count(), 3);

    let (sys, exp) = read_ok(r#"[1 "a"]"#);
    assert_eq!(sys.pool.format_type(&lit(&exp).ty), "<list|any>");

    let (sys, exp) = read_ok("{a:1 b:2}");
    assert_eq!(sys.pool.format_type(&lit(&exp).ty), "<dict|num>");
    assert_eq!(lit(&exp).key("B").and_then(Lit::as_int), Some(2));
}

#[test]
fn collection_items_must_be_constants() {
    assert!(matches!(read_err("[1 x]"), EvalErrorKind::Syntax { .. }));
    assert!(matches!(read_err("{a:(add 1 2)}"), EvalErrorKind::Syntax { .. }));
    assert!(matches!(read_err("{1}"), EvalErrorKind::Syntax { .. }));
}

#[test]
fn malformed_input() {
    for src in ["", "()", "(add 1", "(add 1]", "\"open", "1 2", "12ab", "#", "<list|int"] {
        let err = read(&mut Sys::new(), src).unwrap_err();
        assert_eq!(err.code(), "E5001", "{src:?}: {err:?}");
        assert!(err.span.is_some());
    }
}

#[test]
fn bad_type_syntax_keeps_its_code() {
    let err = read(&mut Sys::new(), "<blob>").unwrap_err();
    assert_eq!(err.code(), "E5002");
    assert_eq!(err.span, Some(Span::new(0, 6)));
}

#[test]
fn nesting_is_limited() {
    let err = read(&mut Sys::new(), &"(".repeat(200_000)).unwrap_err();
    assert_eq!(err.code(), "E5001");

    let src = "(a (b (c d)))";
    assert!(read_nested(&mut Sys::new(), src, 4).is_ok());
    let err = read_nested(&mut Sys::new(), src, 3).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::Syntax { .. }));

    let deep_type = format!("<{}int>", "list|".repeat(200_000));
    assert_eq!(read(&mut Sys::new(), &deep_type).unwrap_err().code(), "E5002");
}
