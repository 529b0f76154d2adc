use super::*;
use pretty_assertions::assert_eq;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[test]
fn options_pick_one_source() {
    let opts = parse_options(&args(&["main.ql"])).unwrap();
    assert_eq!(opts.source, Source::File("main.ql".into()));
    assert_eq!(opts.config, Config::default());

    let opts = parse_options(&args(&["--max-depth=32", "-e", "(add 1 2)"])).unwrap();
    assert_eq!(opts.source, Source::Inline("(add 1 2)".into()));
    assert_eq!(opts.config.max_depth, 32);

    assert_eq!(parse_options(&args(&["-"])).unwrap().source, Source::Stdin);
}

#[test]
fn option_errors() {
    assert_eq!(parse_options(&[]).unwrap_err(), "missing input");
    assert!(parse_options(&args(&["a.ql", "b.ql"])).is_err());
    assert!(parse_options(&args(&["-e"])).is_err());
    assert!(parse_options(&args(&["--max-depth=lots", "a.ql"])).is_err());
    assert!(parse_options(&args(&["--fast", "a.ql"])).is_err());
}

#[test]
fn eval_prints_type_and_value() {
    assert_eq!(eval_source("(add 1 2 3)", Config::default()).unwrap(), "<num> 6");
    assert_eq!(
        eval_source(r#"(cat "a" "b")"#, Config::default()).unwrap(),
        r#"<str> "ab""#
    );
}

#[test]
fn check_does_not_evaluate() {
    let out = check_source(r#"(if true 1 (err "never"))"#, Config::default()).unwrap();
    assert_eq!(out, "<num>");
    let out = check_source(r#"(err "only at eval")"#, Config::default()).unwrap();
    assert_eq!(out, "<_>");
}

#[test]
fn types_print_canonically() {
    assert_eq!(canonical_type("  < list|int >").unwrap(), "<list|int>");
    assert_eq!(canonical_type("<int").unwrap_err().code(), "E5002");
}

#[test]
fn errors_point_at_the_source() {
    let src = "(add 1\n  missing)";
    let err = eval_source(src, Config::default()).unwrap_err();
    assert_eq!(
        render_error("main.ql", src, &err),
        "error[E1001]: symbol not found: missing\n  --> main.ql:2:3"
    );

    let err = canonical_type("blob").unwrap_err();
    let text = render_error("<type>", "blob", &err);
    assert!(text.starts_with("error[E5002]: "));
    assert!(!text.contains("-->"), "{text}");
}
