//! Integration tests for section inheritance and cross-file references.
//!
//! Fixtures are written to a temporary directory and loaded from disk, so
//! sibling lookup runs against real paths.

use std::fs;
use std::path::Path;
use supercfg::{Cfg, ErrorCode, Value};
use tempfile::TempDir;

/// Write `files` (relative name, content) below `dir`.
fn write_files(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(path, content).expect("write fixture");
    }
}

const COMMON: &str = r#"
[Base::conf]
field1 = [1, 'b', 'c']
field2 = 'base value'
"#;

const SOMETHING: &str = r#"
[A::conf(Base::conf@common)]
field2 = "field1 is inherited, field2 is overwritten"

[B::conf(A::conf)]

[X::base]
field1 = {a: 1, b: 3e10}
field2 = true

[X::bla(base)]
field2 = false

[Y::knock_knock]
derived1 = X::bla/field1

[Q::waw]
derived1 = A::conf/field1
"#;

fn something() -> (TempDir, Cfg) {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[("common.cfg", COMMON), ("something.cfg", SOMETHING)],
    );
    let cfg = Cfg::load(temp.path().join("something.cfg")).unwrap();
    (temp, cfg)
}

#[test]
fn test_cross_file_inheritance() {
    let (_temp, cfg) = something();

    let a = cfg.section("A::conf").unwrap();
    assert_eq!(a.get("field1/2").unwrap(), Value::from("c"));
    assert_eq!(
        a.get("field2").unwrap(),
        Value::from("field1 is inherited, field2 is overwritten")
    );

    let b = cfg.section("B::conf").unwrap();
    assert_eq!(b.get("field1/0").unwrap(), Value::Int(1));
    assert_eq!(b.get("field2").unwrap(), a.get("field2").unwrap());
    assert_eq!(cfg.parsed_files(), 2);
}

#[test]
fn test_in_file_inheritance() {
    let (_temp, cfg) = something();
    let bla = cfg.section("X::bla").unwrap();
    assert_eq!(bla.get("field1/b").unwrap(), Value::Int(30_000_000_000));
    assert_eq!(bla.get("field2").unwrap(), Value::Bool(false));
}

#[test]
fn test_field_references() {
    let (_temp, cfg) = something();
    assert_eq!(
        cfg.get("Y::knock_knock/derived1/b").unwrap(),
        Value::Int(30_000_000_000)
    );
    assert_eq!(cfg.get("Q::waw/derived1/2").unwrap(), Value::from("c"));
}

#[test]
fn test_maps_merge_through_parent_chain() {
    let cfg = Cfg::from_text(
        r#"
[m::root]
opts = {'lr': 0.1, 'sched': {'kind': 'step', 'gamma': 0.5}}
tags = [1, 2]

[m::mid(root)]
opts = {'sched': {'gamma': 0.9}}

[m::leaf(mid)]
opts = {'wd': 0.01}
tags = [3]
"#,
    )
    .unwrap();

    let leaf = cfg.section("m::leaf").unwrap();
    assert_eq!(leaf.get("opts/lr").unwrap(), Value::Float(0.1));
    assert_eq!(leaf.get("opts/wd").unwrap(), Value::Float(0.01));
    assert_eq!(leaf.get("opts/sched/kind").unwrap(), Value::from("step"));
    assert_eq!(leaf.get("opts/sched/gamma").unwrap(), Value::Float(0.9));
    assert_eq!(leaf.get("tags").unwrap(), Value::from(vec![3i64]));

    let keys: Vec<String> = leaf.fields().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["opts", "tags"]);

    // The parent itself is untouched by its children.
    let root = cfg.section("m::root").unwrap();
    assert!(root.get("opts/wd").is_err());
    assert_eq!(root.get("opts/sched/gamma").unwrap(), Value::Float(0.5));
}

#[test]
fn test_own_field_wins_over_inherited_reference() {
    let cfg = Cfg::from_text(
        "[p::base]\nx = q::src/v\n[p::child(base)]\nx = 2\n[q::src]\nv = 1",
    )
    .unwrap();
    assert_eq!(cfg.get("p::child/x").unwrap(), Value::Int(2));
    assert_eq!(cfg.get("p::base/x").unwrap(), Value::Int(1));
}

#[test]
fn test_siblings_resolve_relative_to_referring_file() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[
            ("conf/a.cfg", "[a::1]\nv = b::1/w@sub/b\n"),
            ("conf/sub/b.cfg", "[b::1(c::base@c)]\n"),
            ("conf/sub/c.cfg", "[c::base]\nw = 'from c'\n"),
            ("conf/c.cfg", "[c::base]\nw = 'wrong c'\n"),
        ],
    );
    let cfg = Cfg::load(temp.path().join("conf/a.cfg")).unwrap();
    assert_eq!(cfg.get("a::1/v").unwrap(), Value::from("from c"));
    assert_eq!(cfg.parsed_files(), 3);
}

#[test]
fn test_missing_sibling_fails_lazily() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[(
            "a.cfg",
            "[a::1]\nok = 1\nbad = b::1/x@missing\n[a::2(a::0@gone)]\n",
        )],
    );
    let cfg = Cfg::load(temp.path().join("a.cfg")).unwrap();
    let section = cfg.section("a::1").unwrap();
    assert_eq!(section.get("ok").unwrap(), Value::Int(1));

    let err = section.get("bad").unwrap_err();
    assert_eq!(err.code, ErrorCode::FileNotFound);
    assert_eq!(err.key.as_deref(), Some("bad"));
    assert!(err.file.unwrap().ends_with("missing.cfg"));

    let err = cfg.section("a::2").unwrap().fields().unwrap_err();
    assert_eq!(err.code, ErrorCode::FileNotFound);
}

#[test]
fn test_sibling_keeps_origin_extension() {
    let temp = TempDir::new().unwrap();
    write_files(
        temp.path(),
        &[
            ("main.ini", "[a::1]\nv = b::1/x@other\n"),
            ("other.ini", "[b::1]\nx = 'ini sibling'\n"),
            ("other.cfg", "[b::1]\nx = 'cfg sibling'\n"),
        ],
    );
    let cfg = Cfg::load(temp.path().join("main.ini")).unwrap();
    assert_eq!(cfg.get("a::1/v").unwrap(), Value::from("ini sibling"));
}

#[test]
fn test_parent_must_be_section() {
    let cfg = Cfg::from_text("[a::0]\nx = 1\n[a::1(a::0/x)]\n").unwrap();
    let err = cfg.section("a::1").unwrap().fields().unwrap_err();
    assert_eq!(err.code, ErrorCode::UnresolvableReference);
    assert_eq!(err.section.as_deref(), Some("a::1"));
}

#[test]
fn test_missing_parent_section() {
    let cfg = Cfg::from_text("[a::1(nope)]\nx = 1\n").unwrap();
    let err = cfg.get("a::1/x").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnknownSection);
    assert_eq!(err.section.as_deref(), Some("a::nope"));
}
