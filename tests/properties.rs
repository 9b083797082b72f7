use indexmap::IndexMap;
use yini_cfg::ast::{Color, Coord};
use yini_cfg::{
    decode, encode, validate, Compiler, Document, Evaluator, Strategy, ValidationKind, Value, ValueKind,
    YiniError,
};

fn compile(source: &str) -> Document {
    Compiler::new().compile(source).expect("Failed to compile")
}

#[test]
fn precedence_folds_to_seven() {
    let doc = compile("[A]\nval = 1 + 2 * 3\n");
    assert_eq!(doc.get("A", "val").unwrap().kind, ValueKind::Integer(7));
}

#[test]
fn dyna_paths_agree() {
    let mut ctx = IndexMap::new();
    ctx.insert("Base".to_string(), Value::int(10));
    let evaluator = Evaluator::new();

    let tree = evaluator.evaluate("Base * 10 + 5", &ctx, Strategy::TreeWalk).unwrap();
    let vm = evaluator.evaluate("Base * 10 + 5", &ctx, Strategy::Bytecode).unwrap();
    assert_eq!(tree, Value::int(105));
    assert_eq!(vm, tree);
}

#[test]
fn child_inherits_parent() {
    let doc = compile("[Parent]\nval = 1\n[Child] : Parent\nval2 = 2\n");
    let child = doc.section("Child").unwrap();
    assert_eq!(child.get("val").and_then(Value::as_i32), Some(1));
    assert_eq!(child.get("val2").and_then(Value::as_i32), Some(2));
    assert_eq!(child.properties.len(), 2);
}

#[test]
fn mutual_parents_are_circular() {
    let err = Compiler::new().compile("[A] : B\nx = 1\n[B] : A\ny = 2\n").unwrap_err();
    assert!(matches!(err, YiniError::CompileError { code: Some(302), .. }), "{}", err);
}

#[test]
fn macros_and_cross_references() {
    let doc = compile("[#define]\nbase = 100\n[A]\nval = 10\n[B]\nm = @base + 50\nx = @{A.val} * 2\n");
    assert_eq!(doc.get("B", "m").and_then(Value::as_i32), Some(150));
    assert_eq!(doc.get("B", "x").and_then(Value::as_i32), Some(20));
}

#[test]
fn schema_default_required_and_range() {
    let schema = "[#schema]\n[Settings]\nvolume = ?, int, =100\n[#end_schema]\n";
    let mut doc = compile(&format!("[Settings]\nname = \"x\"\n{}", schema));
    validate(&mut doc).unwrap();
    assert_eq!(doc.get("Settings", "volume").and_then(Value::as_i32), Some(100));

    let mut doc = compile("[Settings]\nname = \"x\"\n[#schema]\n[Settings]\nid = !, int\n[#end_schema]\n");
    let err = validate(&mut doc).unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationKind::MissingProperty));

    let mut doc = compile("[Settings]\nlevel = 5\n[#schema]\n[Settings]\nlevel = !, int, min=10\n[#end_schema]\n");
    let err = validate(&mut doc).unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationKind::RangeError));
}

#[test]
fn typed_literals() {
    let doc = compile("[T]\nc = #FF0000\np = Coord(10, 20)\n");
    assert_eq!(doc.get("T", "c").unwrap().kind, ValueKind::Color(Color::rgba(255, 0, 0, 255)));
    match doc.get("T", "p").unwrap().kind {
        ValueKind::Coord(Coord { x, y, is_3d, .. }) => {
            assert!(!is_3d);
            assert_eq!((x, y), (10.0, 20.0));
        }
        ref other => panic!("Expected Coord, got {:?}", other),
    }
}

#[test]
fn registry_keeps_order() {
    let doc = compile("[R]\n+= 1\n+= 2\n");
    let values: Vec<_> = doc.section("R").unwrap().registry.iter().filter_map(Value::as_i32).collect();
    assert_eq!(values, vec![1, 2]);
}

#[test]
fn resolution_is_idempotent() {
    let compiler = Compiler::new();
    let mut doc = compiler
        .compile("[#define]\nk = 2\n[A]\nx = @k * 3\n[B] : A\ny = @{A.x} + 1\n+= @k\n")
        .unwrap();
    let before = doc.clone();
    compiler.resolve_document(&mut doc).unwrap();
    assert_eq!(doc, before);
}

#[test]
fn compiled_document_survives_binary() {
    let doc = compile(
        "[#define]\nk = 2\n[A]\nx = @k * 3\ns = \"text\"\nm = {a: 1,}\nst = {a: 1}\nd = Dyna(k + 1)\n+= Path(\"p\")\n",
    );
    let decoded = decode(&encode(&doc).unwrap()).unwrap();
    assert_eq!(decoded, doc);
    assert_eq!(decoded.macros, doc.macros);
}
