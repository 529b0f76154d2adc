use super::*;
use pretty_assertions::assert_eq;

#[test]
fn zero_values() {
    assert!(Lit::null().is_zero());
    assert!(Lit::int(0).is_zero());
    assert!(!Lit::int(3).is_zero());
    assert!(Lit::str("").is_zero());
    assert!(!Lit::bool(true).is_zero());
    assert!(Lit::zero_of(&Type::REAL).is_zero());
    assert_eq!(Lit::zero_of(&Type::INT.optional()).val, Val::Null);
    assert_eq!(Lit::zero_of(&Type::STR).val, Val::Str("".into()));
}

#[test]
fn assign_converts_to_the_target_type() {
    let mut lit = Lit::zero_of(&Type::INT);
    lit.assign(Lit::real(2.9)).unwrap_or_default();
    assert_eq!(lit.val, Val::Int(2));

    let mut lit = Lit::zero_of(&Type::REAL);
    lit.assign(Lit::int(4)).unwrap_or_default();
    assert_eq!(lit.val, Val::Real(4.0));

    let mut lit = Lit::zero_of(&Type::STR);
    lit.assign(Lit::int(12)).unwrap_or_default();
    assert_eq!(lit.as_str(), Some("12"));

    let mut lit = Lit::zero_of(&Type::BOOL);
    lit.assign(Lit::str("x")).unwrap_or_default();
    assert_eq!(lit.val, Val::Bool(true));
}

#[test]
fn assign_rejects_incompatible_values() {
    let mut lit = Lit::zero_of(&Type::INT);
    let err = lit.assign(Lit::str("abc"));
    assert!(matches!(
        err.map_err(|e| e.kind),
        Err(crate::EvalErrorKind::Spec { .. })
    ));
    let mut lit = Lit::zero_of(&Type::INT);
    assert!(lit.assign(Lit::null()).is_err());
}

#[test]
fn keyed_access() {
    let mut lit = Lit::new(Type::DICT, Val::Dict(Vec::new()));
    lit.set_key("a", Lit::int(1)).unwrap_or_default();
    lit.set_key("b", Lit::int(2)).unwrap_or_default();
    lit.set_key("a", Lit::int(3)).unwrap_or_default();

    let keys: Vec<_> = lit.iter_keys().map(|(k, v)| (k, v.as_int())).collect();
    assert_eq!(keys, vec![("a", Some(3)), ("b", Some(2))]);
    assert_eq!(lit.key("B").and_then(Lit::as_int), Some(2));
    assert!(Lit::int(1).set_key("a", Lit::null()).is_err());
}

#[test]
fn indexed_access() {
    let mut lit = Lit::new(Type::LIST, Val::List(vec![Lit::int(1), Lit::int(2)]));
    lit.set_idx(-1, Lit::int(9)).unwrap_or_default();
    let items: Vec<_> = lit.iter_idx().filter_map(Lit::as_int).collect();
    assert_eq!(items, vec![1, 9]);
    assert!(lit.set_idx(2, Lit::int(0)).is_err());
    assert_eq!(Lit::int(1).iter_idx().count(), 0);
}

#[test]
fn numbers_compare_across_representations() {
    assert!(Lit::int(2).equals(&Lit::real(2.0)));
    assert_eq!(Lit::int(1).compare(&Lit::real(1.5)), Some(Ordering::Less));
    assert_eq!(Lit::str("a").compare(&Lit::int(1)), None);
}

#[test]
fn prints_source_syntax() {
    let mut pool = Pool::new();
    let list = Lit::new(
        Type::LIST,
        Val::List(vec![Lit::int(1), Lit::real(2.5), Lit::str("a\"b")]),
    );
    assert_eq!(list.to_text(&pool), r#"[1 2.5 "a\"b"]"#);

    let dict = Lit::new(
        Type::DICT,
        Val::Dict(vec![("x".into(), Lit::bool(true)), ("y".into(), Lit::null())]),
    );
    assert_eq!(dict.to_text(&pool), "{x:true y:null}");

    let t = pool.list(Type::INT);
    assert_eq!(Lit::typ(t).to_text(&pool), "<list|int>");
}
