use super::*;
use pretty_assertions::assert_eq;

fn parse(sys: &mut Sys, src: &str) -> Type {
    match sys.parse(src) {
        Ok(ty) => ty,
        Err(err) => panic!("bad type {src:?}: {err}"),
    }
}

fn var_ids(sys: &Sys, ty: &Type) -> Vec<u32> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    sys.free_in(ty, &mut out, &mut seen);
    out.into_iter().filter(|t| t.is_var()).map(|t| t.id).collect()
}

#[test]
fn bind_assigns_fresh_ids() {
    let mut sys = Sys::new();
    let a = sys.bind(Type::var());
    let b = sys.bind(Type::var());
    assert!(a.id > 0);
    assert_ne!(a.id, b.id);
    assert_eq!(sys.get(a.id), Some(&a));
    assert_eq!(sys.get(999), None);
}

#[test]
fn bind_keeps_existing_id() {
    let mut sys = Sys::new();
    let t = sys.bind(Type::INT.with_id(42));
    assert_eq!(t.id, 42);
    assert_eq!(sys.get(42), Some(&t));
}

#[test]
fn parse_moves_counter_past_spelled_ids() {
    let mut sys = Sys::new();
    parse(&mut sys, "<list|@7>");
    assert_eq!(sys.fresh_id(), 8);
}

#[test]
fn update_substitutes_bound_variables() {
    let mut sys = Sys::new();
    let ty = parse(&mut sys, "<list|@1>");
    sys.bind(Type::INT.with_id(1));
    // id 1 now names a non-variable placeholder; the element is replaced
    let ty = match sys.update(&ty) {
        Ok(ty) => ty,
        Err(err) => panic!("{err}"),
    };
    assert_eq!(sys.pool.format_type(&ty), "<list|int@1>");
}

#[test]
fn update_is_idempotent() {
    let mut sys = Sys::new();
    let ty = parse(&mut sys, "<rec a:@1 b:list|@2>");
    sys.bindings.insert(1, Type::STR);
    sys.bindings.insert(2, Type::INT);

    let once = sys.update(&ty).unwrap_or_default();
    assert_eq!(sys.pool.format_type(&once), "<rec a:str b:list|int>");

    let bodies = sys.pool.len();
    let twice = sys.update(&once).unwrap_or_default();
    assert_eq!(twice, once);
    assert_eq!(sys.pool.len(), bodies);
}

#[test]
fn update_leaves_unbound_variables() {
    let mut sys = Sys::new();
    let ty = parse(&mut sys, "<list|@3>");
    let updated = sys.update(&ty).unwrap_or_default();
    assert_eq!(updated, ty);
}

#[test]
fn update_resolves_references_and_keeps_optional() {
    let mut sys = Sys::new();
    let point = parse(&mut sys, "<rec@Point x:int y:int>");
    sys.declare("Point", point);

    let ty = parse(&mut sys, "<list|?@Point>");
    let ty = sys.update(&ty).unwrap_or_default();
    let el = sys.pool.elem(&ty).cloned().unwrap_or_default();
    assert!(el.is_optional());
    assert_eq!(el.name(), Some("Point"));
    assert_eq!(sys.pool.params(&el).len(), 2);
}

#[test]
fn update_of_unknown_reference_fails() {
    let mut sys = Sys::new();
    let ty = parse(&mut sys, "<list|@Missing>");
    assert_eq!(
        sys.update(&ty),
        Err(TypeError::UnknownRef {
            name: "Missing".into()
        })
    );
}

#[test]
fn fallback_resolver_is_consulted() {
    let mut sys = Sys::new();
    sys.set_resolver(|name| (name == "Age").then_some(Type::INT.with_name("Age")));
    let ty = parse(&mut sys, "@Age");
    let ty = sys.update(&ty).unwrap_or_default();
    assert_eq!(ty.kind, Kind::INT);
    assert_eq!(ty.name(), Some("Age"));
}

#[test]
fn self_referential_declaration_updates_to_a_cycle() {
    let mut sys = Sys::new();
    let node = parse(&mut sys, "<rec@Node val:int next:?@Node>");
    sys.declare("Node", node.clone());

    let ty = sys.update(&node).unwrap_or_default();
    let next = sys.pool.params(&ty)[1].ty.clone();
    assert_eq!(next.body, ty.body);
    assert!(next.is_optional());
    assert_eq!(sys.pool.format_type(&ty), "<rec@Node val:int next:rec?@Node>");
}

#[test]
fn instantiation_is_fresh_across_calls() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<func ?@1 list|?@1 ?@1>");
    let a = sys.instantiate(&tmpl).unwrap_or_default();
    let b = sys.instantiate(&tmpl).unwrap_or_default();

    let ids_a = var_ids(&sys, &a);
    let ids_b = var_ids(&sys, &b);
    assert_eq!(ids_a.len(), 1);
    assert_eq!(ids_b.len(), 1);
    assert_ne!(ids_a, ids_b);
    assert_ne!(ids_a[0], 1);
}

#[test]
fn instantiation_is_consistent_within_a_call() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<func @1 @2 list|@1 @2>");
    let sig = sys.instantiate(&tmpl).unwrap_or_default();
    let ps = sys.pool.params(&sig).to_vec();

    let el = sys.pool.elem(&ps[2].ty).cloned().unwrap_or_default();
    assert_eq!(ps[0].ty.id, el.id);
    assert_eq!(ps[1].ty.id, ps[3].ty.id);
    assert_ne!(ps[0].ty.id, ps[1].ty.id);
}

#[test]
fn anonymous_variables_are_distinct() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<form num@ num@ _>");
    let sig = sys.instantiate(&tmpl).unwrap_or_default();
    let ps = sys.pool.params(&sig);
    assert!(ps[0].ty.id > 0);
    assert_ne!(ps[0].ty.id, ps[1].ty.id);
}

#[test]
fn instantiation_copies_bodies() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<rec a:list|int>");
    let copy = sys.instantiate(&tmpl).unwrap_or_default();
    assert_ne!(copy.body, tmpl.body);
    assert!(sys.pool.type_eq(&copy, &tmpl));
}

#[test]
fn selectors_pick_sibling_parameters() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<form@fst list|@1 .0>");
    let sig = sys.instantiate(&tmpl).unwrap_or_default();
    let ps = sys.pool.params(&sig).to_vec();

    assert!(!ps[1].ty.kind.contains(Kind::SEL));
    assert!(sys.pool.type_eq(&ps[0].ty, &ps[1].ty));
}

#[test]
fn selectors_match_names_and_paths() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<rec pos:<rec x:int y:real> y:.pos.y? first:.Pos>");
    let ty = sys.instantiate(&tmpl).unwrap_or_default();
    let ps = sys.pool.params(&ty).to_vec();

    assert_eq!(ps[1].ty.kind, Kind::REAL | Kind::NONE);
    assert_eq!(sys.pool.params(&ps[2].ty).len(), 2);
}

#[test]
fn unknown_selector_names_its_path() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<rec a:int b:.c>");
    assert_eq!(
        sys.instantiate(&tmpl),
        Err(TypeError::UnknownSelector { path: "c".into() })
    );
}

#[test]
fn selector_cycles_hit_the_depth_limit() {
    let mut sys = Sys::new();
    let tmpl = parse(&mut sys, "<rec a:.a>");
    assert!(matches!(
        sys.instantiate(&tmpl),
        Err(TypeError::DepthExceeded { .. })
    ));
}

#[test]
fn free_lists_unbound_variables() {
    let mut sys = Sys::new();
    let ty = parse(&mut sys, "<func @1 @2 list|@1>");
    sys.bindings.insert(2, Type::INT);

    let free = sys.free(&ty).unwrap_or_default();
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].id, 1);
}

#[test]
fn probe_rolls_back_on_failure() {
    let mut sys = Sys::new();
    let res: Result<(), TypeError> = sys.probe(|sys| {
        sys.bind(Type::INT.with_id(5));
        Err(TypeError::UnknownRef { name: "x".into() })
    });
    assert!(res.is_err());
    assert_eq!(sys.get(5), None);

    let res: Result<(), TypeError> = sys.probe(|sys| {
        sys.bind(Type::INT.with_id(5));
        Ok(())
    });
    assert!(res.is_ok());
    assert!(sys.get(5).is_some());
}
