use super::*;
use crate::Const;

/// Builds `<rec@Node val:int next:rec?@Node>` with `next` pointing back at
/// the record body itself.
fn node(pool: &mut Pool) -> Type {
    let id = pool.reserve();
    let node = Type::of(Kind::REC).with_name("Node").with_body(id);
    pool.fill(
        id,
        Body::Params(vec![
            Param::new("val", Type::INT),
            Param::new("next", node.clone().optional()),
        ]),
    );
    node
}

#[test]
fn cyclic_types_compare_equal() {
    let mut pool = Pool::new();
    let a = node(&mut pool);
    let b = node(&mut pool);

    assert_ne!(a.body, b.body);
    assert!(pool.type_eq(&a, &b));
    assert!(pool.type_eq(&b, &a));
}

#[test]
fn cyclic_types_with_different_fields_differ() {
    let mut pool = Pool::new();
    let a = node(&mut pool);

    let id = pool.reserve();
    let other = Type::of(Kind::REC).with_name("Node").with_body(id);
    pool.fill(
        id,
        Body::Params(vec![
            Param::new("val", Type::STR),
            Param::new("next", other.clone().optional()),
        ]),
    );

    assert!(!pool.type_eq(&a, &other));
}

#[test]
fn equality_checks_kind_id_and_name() {
    let pool = Pool::new();
    assert!(pool.type_eq(&Type::INT, &Type::INT));
    assert!(!pool.type_eq(&Type::INT, &Type::REAL));
    assert!(!pool.type_eq(&Type::INT, &Type::INT.with_id(3)));
    assert!(!pool.type_eq(&Type::INT, &Type::INT.with_name("Age")));
    assert!(!pool.type_eq(&Type::INT, &Type::INT.optional()));
}

#[test]
fn element_bodies_compare_structurally() {
    let mut pool = Pool::new();
    let a = pool.list(Type::INT);
    let b = pool.list(Type::INT);
    let c = pool.list(Type::STR);
    let bare = Type::LIST;

    assert!(pool.type_eq(&a, &b));
    assert!(!pool.type_eq(&a, &c));
    assert!(!pool.type_eq(&a, &bare));
}

#[test]
fn constant_bodies_compare_by_value() {
    let mut pool = Pool::new();
    let a = pool.alloc(Body::Consts(vec![Const::new("Red", 1), Const::new("Blue", 2)]));
    let b = pool.alloc(Body::Consts(vec![Const::new("Red", 1), Const::new("Blue", 2)]));
    let c = pool.alloc(Body::Consts(vec![Const::new("Red", 1)]));
    let ty = |id| Type::of(Kind::ENUM).with_body(id);

    assert!(pool.type_eq(&ty(a), &ty(b)));
    assert!(!pool.type_eq(&ty(a), &ty(c)));
}

#[test]
fn signature_accessors() {
    let mut pool = Pool::new();
    let sig = pool.with_params(
        Kind::FUNC,
        vec![
            Param::new("a", Type::INT),
            Param::new("b", Type::INT),
            Param::unnamed(Type::VOID),
        ],
    );

    assert_eq!(pool.args_of(&sig).len(), 2);
    assert!(pool.result_of(&sig).is_void());

    pool.set_result(&sig, Type::INT);
    assert!(pool.type_eq(&pool.result_of(&sig), &Type::INT));
}

#[test]
fn reaches_finds_nested_variables_in_cycles() {
    let mut pool = Pool::new();
    let n = node(&mut pool);
    assert!(!pool.reaches(&n, Kind::VAR));

    let inner = pool.list(Type::var().with_id(4));
    let outer = pool.list(inner);
    assert!(pool.reaches(&outer, Kind::VAR));
}
