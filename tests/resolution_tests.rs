//! Integration tests for path lookup, error reporting and cycle detection.

use std::rc::Rc;
use supercfg::{Cfg, CfgOptions, ErrorCode, MemoryProvider, Value};

const NESTED: &str = r#"
[class1::name1]
a = [1, 2]
b = [true, class1::name1/a]

[class2::name2]
x = [0, 'x', 44.3]
y = class2::name2/x
inner = [1, 0.1, class1::name1/b]
z = [0, [class2::name2/inner, ['x', 44.3]]]
"#;

#[test]
fn test_reference_equals_target() {
    let cfg = Cfg::from_text(NESTED).unwrap();
    assert_eq!(
        cfg.get("class2::name2/x").unwrap(),
        cfg.get("class2::name2/y").unwrap()
    );
}

#[test]
fn test_deeply_nested_references() {
    let cfg = Cfg::from_text(NESTED).unwrap();
    let expected = Value::List(vec![
        Value::Int(0),
        Value::List(vec![
            Value::List(vec![
                Value::Int(1),
                Value::Float(0.1),
                Value::List(vec![Value::Bool(true), Value::from(vec![1i64, 2])]),
            ]),
            Value::List(vec![Value::from("x"), Value::Float(44.3)]),
        ]),
    ]);
    assert_eq!(cfg.get("class2::name2/z").unwrap(), expected);

    let section = cfg.section("class2::name2").unwrap();
    assert_eq!(section.fields().unwrap()["z"], expected);
    assert_eq!(section.get("z/1/0/2/1/0").unwrap(), Value::Int(1));
}

#[test]
fn test_path_through_section_valued_field() {
    let cfg = Cfg::from_text(
        "[model::enc]\ndepth = 4\n[model::top]\nencoder = model::enc\nalias = model::top/encoder/depth",
    )
    .unwrap();
    assert_eq!(cfg.get("model::top/encoder/depth").unwrap(), Value::Int(4));
    assert_eq!(cfg.get("model::top/alias").unwrap(), Value::Int(4));
    let encoder = cfg.get("model::top/encoder").unwrap();
    assert_eq!(encoder.as_section().unwrap().id(), "model::enc");
    assert!(encoder.as_section().unwrap().is_resolved());
}

#[test]
fn test_lookup_errors() {
    let cfg = Cfg::from_text("[a::1]\nx = 3\nl = [1]\nr = zz::top/x").unwrap();

    assert_eq!(cfg.get("a::1/nope").unwrap_err().code, ErrorCode::UnknownField);
    assert_eq!(cfg.get("a::9").unwrap_err().code, ErrorCode::UnknownSection);
    assert_eq!(cfg.get("a1/x").unwrap_err().code, ErrorCode::MalformedIdentifier);
    assert_eq!(cfg.get("a::1/x/y").unwrap_err().code, ErrorCode::IllegalPath);
    assert_eq!(cfg.get("a::1/l/one").unwrap_err().code, ErrorCode::IllegalPath);
    assert_eq!(cfg.get("a::1/l/5").unwrap_err().code, ErrorCode::UnknownField);

    let err = cfg.get("a::1/r").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownSection);
    assert_eq!(err.key.as_deref(), Some("r"));
    assert_eq!(err.section.as_deref(), Some("zz::top"));
}

#[test]
fn test_get_or_distinguishes_none_from_missing() {
    let cfg = Cfg::from_text("[a::1]\nempty = None\nx = 1").unwrap();
    let section = cfg.section("a::1").unwrap();
    assert_eq!(section.get_or("empty", Value::Int(7)).unwrap(), Value::Null);
    assert_eq!(section.get_or("missing", Value::Int(7)).unwrap(), Value::Int(7));
    assert_eq!(section.get_or("x", Value::Int(7)).unwrap(), Value::Int(1));
    assert!(section.contains("empty").unwrap());
    assert!(!section.contains("missing").unwrap());
}

#[test]
fn test_intra_section_references() {
    let cfg = Cfg::from_text("[s::1]\nb = s::1/a\na = 5\nc = s::1/b").unwrap();
    let fields = cfg.section("s::1").unwrap().fields().unwrap().clone();
    assert_eq!(fields["a"], Value::Int(5));
    assert_eq!(fields["b"], Value::Int(5));
    assert_eq!(fields["c"], Value::Int(5));
}

#[test]
fn test_parent_cycle() {
    let cfg = Cfg::from_text("[a::1(a::2)]\n[a::2(a::1)]\n[a::3(a::3)]").unwrap();
    let err = cfg.section("a::1").unwrap().fields().unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
    assert!(err.message.contains("a::1 -> a::2 -> a::1"), "{}", err);

    let err = cfg.section("a::3").unwrap().fields().unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
}

#[test]
fn test_reference_cycle() {
    let cfg = Cfg::from_text("[a::1]\nx = b::1/y\n[b::1]\ny = a::1/x").unwrap();
    let err = cfg.get("a::1/x").unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
    assert!(err.message.contains("a::1/x -> b::1/y -> a::1/x"), "{}", err);

    let err = Cfg::from_text("[a::1]\nx = a::1/x").unwrap().get("a::1/x").unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
}

#[test]
fn test_self_nesting_cycle() {
    let cfg = Cfg::from_text("[a::1]\nme = a::1").unwrap();
    let err = cfg.section("a::1").unwrap().fields().unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
}

#[test]
fn test_cross_file_cycle() {
    let provider = MemoryProvider::new()
        .with_file("c/a.cfg", "[a::1]\nx = b::1/y@b")
        .with_file("c/b.cfg", "[b::1]\ny = a::1/x@a");
    let cfg = Cfg::load_with("c/a.cfg", CfgOptions::new().with_provider(provider)).unwrap();
    let err = cfg.get("a::1/x").unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicReference);
}

#[test]
fn test_each_file_parsed_once() {
    let provider = Rc::new(
        MemoryProvider::new()
            .with_file("conf/main.cfg", "[m::1]\na = s::1/v@shared\nb = t::1/w@other\n")
            .with_file("conf/other.cfg", "[t::1(s::1@shared)]\nw = s::1/v@shared\n")
            .with_file("conf/shared.cfg", "[s::1]\nv = 'shared'\n"),
    );
    let options = CfgOptions::new().with_shared_provider(Rc::clone(&provider));
    let cfg = Cfg::load_with("conf/main.cfg", options).unwrap();

    cfg.resolve_all().unwrap();
    assert_eq!(cfg.get("m::1/a").unwrap(), Value::from("shared"));
    assert_eq!(cfg.get("m::1/b").unwrap(), Value::from("shared"));
    assert_eq!(cfg.get("m::1/b").unwrap(), Value::from("shared"));

    assert_eq!(provider.reads(), 3);
    assert_eq!(cfg.parsed_files(), 3);

    let again = cfg.clone();
    again.resolve_all().unwrap();
    assert_eq!(provider.reads(), 3);
}

#[test]
fn test_section_outlives_configuration() {
    let section = {
        let cfg = Cfg::from_text("[a::1]\nx = 1").unwrap();
        cfg.section("a::1").unwrap()
    };
    assert_eq!(section.id(), "a::1");
    assert_eq!(section.fields().unwrap_err().code, ErrorCode::Detached);
}
