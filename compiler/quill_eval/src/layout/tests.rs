use super::*;
use crate::Tag;
use pretty_assertions::assert_eq;
use quill_types::Sys;

fn int(i: i64) -> Exp {
    Exp::Lit(Lit::int(i), Span::DUMMY)
}

fn tag(name: &str, i: i64) -> Exp {
    Exp::Tag(Tag::new(name, Span::DUMMY, Some(int(i))))
}

/// Integer literal of a slot, `-1` for a group and `None` for an empty
/// slot.
fn shape(slots: &[Option<Exp>]) -> Vec<Option<i64>> {
    slots
        .iter()
        .map(|s| match s {
            Some(Exp::Lit(lit, _)) => lit.as_int(),
            Some(_) => Some(-1),
            None => None,
        })
        .collect()
}

fn sig(sys: &mut Sys, src: &str) -> Type {
    sys.parse(src).unwrap()
}

#[test]
fn form_groups_variadic_runs() {
    let mut sys = Sys::new();
    let add = sig(&mut sys, "<form@add num@ tupl?|num _>");

    let slots = layout(&sys.pool, &add, vec![int(1), int(2), int(3)]).unwrap();
    assert_eq!(slots.len(), 2);
    let Some(Exp::Tupl(group)) = &slots[1] else {
        panic!("expected a group, got {:?}", slots[1]);
    };
    assert_eq!(group.items.len(), 2);

    let slots = layout(&sys.pool, &add, vec![int(1)]).unwrap();
    assert_eq!(shape(&slots), vec![Some(1), None]);
}

#[test]
fn form_missing_parameter_names_its_index() {
    let mut sys = Sys::new();
    let add = sig(&mut sys, "<form@add num@ tupl?|num _>");
    let err = layout(&sys.pool, &add, vec![]).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::MissingParam {
            index: 0,
            ty: "<num@>".into()
        }
    );
}

#[test]
fn form_optional_slots_stay_empty() {
    let mut sys = Sys::new();
    let cond = sig(&mut sys, "<form@if any @1 ?@1 @1>");
    let slots = layout(&sys.pool, &cond, vec![int(1), int(2)]).unwrap();
    assert_eq!(shape(&slots), vec![Some(1), Some(2), None]);
}

#[test]
fn form_rejects_trailing_arguments() {
    let mut sys = Sys::new();
    let not = sig(&mut sys, "<form@not any bool>");
    let err = layout(&sys.pool, &not, vec![int(1), int(2)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::UnexpectedArg { index: 1 });
}

#[test]
fn form_tag_runs_stop_at_the_first_non_tag() {
    let mut sys = Sys::new();
    let bind = sig(&mut sys, "<form@let tupl|tag any _>");
    let slots = layout(&sys.pool, &bind, vec![tag("a", 1), tag("b", 2), int(3)]).unwrap();
    assert_eq!(shape(&slots), vec![Some(-1), Some(3)]);

    let err = layout(&sys.pool, &bind, vec![int(3)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MissingParam { index: 0, .. }));
}

#[test]
fn form_tag_runs_respect_element_arity() {
    let mut sys = Sys::new();
    let pairs = sig(&mut sys, "<form@pairs tupl|<tag tag tag> _>");
    assert!(layout(&sys.pool, &pairs, vec![tag("a", 1), tag("b", 2)]).is_ok());
    let err = layout(&sys.pool, &pairs, vec![tag("a", 1), tag("b", 2), tag("c", 3)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::TagRunArity { arity: 2, got: 3 });
}

#[test]
fn func_positional_and_tagged_agree() {
    let mut sys = Sys::new();
    let f = sig(&mut sys, "<func a:int b:int int>");

    let positional = layout(&sys.pool, &f, vec![int(1), int(2)]).unwrap();
    let tagged = layout(&sys.pool, &f, vec![tag("b", 2), tag("a", 1)]).unwrap();
    assert_eq!(shape(&positional), vec![Some(1), Some(2)]);
    assert_eq!(shape(&tagged), shape(&positional));
}

#[test]
fn func_tag_errors() {
    let mut sys = Sys::new();
    let f = sig(&mut sys, "<func a:int b:int int>");

    let err = layout(&sys.pool, &f, vec![tag("a", 1), tag("a", 2)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::DuplicateTag { name: "a".into() });

    let err = layout(&sys.pool, &f, vec![tag("c", 1)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::UnknownTag { name: "c".into() });

    let err = layout(&sys.pool, &f, vec![tag("a", 1), int(2)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::MixedArgs);

    let err = layout(&sys.pool, &f, vec![tag("a", 1)]).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::MissingParam { index: 1, .. }));
}

#[test]
fn func_trailing_list_collects_excess() {
    let mut sys = Sys::new();
    let f = sig(&mut sys, "<func a:int rest:list?|int int>");

    let slots = layout(&sys.pool, &f, vec![int(1), int(2), int(3)]).unwrap();
    assert_eq!(shape(&slots), vec![Some(1), Some(-1)]);

    let slots = layout(&sys.pool, &f, vec![int(1)]).unwrap();
    assert_eq!(shape(&slots), vec![Some(1), None]);

    let g = sig(&mut sys, "<func a:int int>");
    let err = layout(&sys.pool, &g, vec![int(1), int(2)]).unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::UnexpectedArg { index: 1 });
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accepted_form_calls_have_one_slot_per_parameter(n in 1usize..12) {
            let mut sys = Sys::new();
            let add = sig(&mut sys, "<form@add num@ tupl?|num _>");
            let args = (0..n).map(|i| int(i64::try_from(i).unwrap())).collect();
            let slots = layout(&sys.pool, &add, args).unwrap();
            prop_assert_eq!(slots.len(), sys.pool.args_of(&add).len());
        }

        #[test]
        fn missing_required_parameters_are_named(given in 0usize..3) {
            let mut sys = Sys::new();
            let f = sig(&mut sys, "<form@f int str bool real _>");
            let args = (0..given).map(|i| int(i64::try_from(i).unwrap())).collect();
            let err = layout(&sys.pool, &f, args).unwrap_err();
            prop_assert!(
                matches!(err.kind, EvalErrorKind::MissingParam { index, .. } if index == given),
                "expected MissingParam error at index {}", given
            );
        }
    }
}
