#[cfg(test)]
use super::*;
#[cfg(test)]
use crate::ast::{
    BinaryOp, Color, EmptyBehavior, ReferenceKind, Requirement, UnaryOp, ValueKind,
};

fn parse(input: &str) -> Document {
    let mut parser = Parser::new(input).expect("Failed to create parser");
    parser.parse_document().expect("Failed to parse document")
}

fn value_of(input: &str) -> ValueKind {
    let doc = parse(&format!("[S]\nv = {}\n", input));
    doc.get("S", "v").expect("missing property").kind.clone()
}

#[test]
fn test_parser_basic_document() {
    let input = r#"
[Parent]
val = 1

[Child] : Parent, Other
val2 = "two"
"#;
    let doc = parse(input);

    assert_eq!(doc.sections.len(), 2);
    let child = doc.section("Child").unwrap();
    assert_eq!(child.parents, vec!["Parent".to_string(), "Other".to_string()]);
    assert_eq!(child.get("val2").unwrap().as_str(), Some("two"));
    assert_eq!(child.span.line, 5);
}

#[test]
fn test_precedence_builds_nested_binary() {
    match value_of("1 + 2 * 3") {
        ValueKind::Binary(left, BinaryOp::Add, right) => {
            assert_eq!(left.kind, ValueKind::Integer(1));
            match &right.kind {
                ValueKind::Binary(l, BinaryOp::Mul, r) => {
                    assert_eq!(l.kind, ValueKind::Integer(2));
                    assert_eq!(r.kind, ValueKind::Integer(3));
                }
                other => panic!("Expected multiplication, got {:?}", other),
            }
        }
        other => panic!("Expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_subtraction_is_left_associative() {
    match value_of("10 - 3 - 2") {
        ValueKind::Binary(left, BinaryOp::Sub, right) => {
            assert!(matches!(left.kind, ValueKind::Binary(_, BinaryOp::Sub, _)));
            assert_eq!(right.kind, ValueKind::Integer(2));
        }
        other => panic!("Expected subtraction, got {:?}", other),
    }
}

#[test]
fn test_unary_minus() {
    match value_of("-5") {
        ValueKind::Unary(UnaryOp::Neg, inner) => assert_eq!(inner.kind, ValueKind::Integer(5)),
        other => panic!("Expected negation, got {:?}", other),
    }
}

#[test]
fn test_float_and_int_literals() {
    assert_eq!(value_of("42"), ValueKind::Integer(42));
    assert_eq!(value_of("2.5"), ValueKind::Float(2.5));
    assert_eq!(value_of("true"), ValueKind::Boolean(true));
}

#[test]
fn test_integer_out_of_range() {
    let err = Parser::new("[S]\nv = 99999999999\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(211));
}

#[test]
fn test_smallest_integer_literal() {
    assert_eq!(value_of("-2147483648"), ValueKind::Integer(i32::MIN));
    let err = Parser::new("[S]\nv = 2147483648\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(211));
    let err = Parser::new("[S]\nv = -2147483649\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(211));
}

#[test]
fn test_hex_colors() {
    assert_eq!(value_of("#FF0000"), ValueKind::Color(Color::rgba(255, 0, 0, 255)));
    assert_eq!(value_of("#00FF00"), ValueKind::Color(Color::rgb(0, 255, 0)));
    assert_eq!(value_of("#123456"), ValueKind::Color(Color::rgb(0x12, 0x34, 0x56)));
    assert_eq!(value_of("#1a2b3c"), ValueKind::Color(Color::rgb(0x1a, 0x2b, 0x3c)));
    assert_eq!(value_of("#FFF"), ValueKind::Color(Color::rgb(255, 255, 255)));
}

#[test]
fn test_invalid_hex_color() {
    let err = Parser::new("[S]\nv = #GG0000\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(212));
}

#[test]
fn test_constructors() {
    match value_of("Coord(10, 20)") {
        ValueKind::Coord(c) => {
            assert!(!c.is_3d);
            assert_eq!((c.x, c.y), (10.0, 20.0));
        }
        other => panic!("Expected coord, got {:?}", other),
    }
    match value_of("Coord(1.5, -2, 3)") {
        ValueKind::Coord(c) => {
            assert!(c.is_3d);
            assert_eq!((c.x, c.y, c.z), (1.5, -2.0, 3.0));
        }
        other => panic!("Expected coord, got {:?}", other),
    }
    assert_eq!(value_of("Color(1, 2, 3)"), ValueKind::Color(Color::rgba(1, 2, 3, 255)));
    assert_eq!(value_of("Color(1, 2, 3, 4)"), ValueKind::Color(Color::rgba(1, 2, 3, 4)));
    assert_eq!(value_of("Path(\"assets/hero.png\")"), ValueKind::Path("assets/hero.png".into()));
    assert!(matches!(value_of("List(1, 2)"), ValueKind::List(items) if items.len() == 2));
    assert!(matches!(value_of("Array(1)"), ValueKind::Array(items) if items.len() == 1));
    assert!(matches!(value_of("Set(1, 2, 3)"), ValueKind::Set(items) if items.len() == 3));
}

#[test]
fn test_constructor_errors() {
    let bad = ["Color(1, 2)", "Color(300, 0, 0)", "Coord(\"x\", 1)", "Path(1)", "Widget(1)"];
    for input in bad {
        let src = format!("[S]\nv = {}\n", input);
        let result = Parser::new(&src).unwrap().parse_document();
        assert!(
            matches!(result, Err(YiniError::ParseError { .. })),
            "{} should fail to parse",
            input
        );
    }
}

#[test]
fn test_dyna_keeps_expression_text() {
    assert_eq!(value_of("Dyna(Base * 10 + 5)"), ValueKind::Dyna("Base * 10 + 5".into()));
    assert_eq!(value_of("Dyna( (a + b) )"), ValueKind::Dyna("(a + b)".into()));
}

#[test]
fn test_dyna_syntax_is_checked() {
    let err = Parser::new("[S]\nv = Dyna(1 + )\n").unwrap().parse_document().unwrap_err();
    assert!(matches!(err, YiniError::ParseError { .. }));
}

#[test]
fn test_containers() {
    assert!(matches!(value_of("[1, 2, 3]"), ValueKind::Array(items) if items.len() == 3));
    assert!(matches!(value_of("[1, 2,]"), ValueKind::Array(items) if items.len() == 2));
    assert!(matches!(value_of("[]"), ValueKind::Array(items) if items.is_empty()));
    assert!(matches!(value_of("(1, 2)"), ValueKind::Set(items) if items.len() == 2));
    assert!(matches!(value_of("()"), ValueKind::Set(items) if items.is_empty()));
    assert_eq!(value_of("(7)"), ValueKind::Integer(7));
}

#[test]
fn test_map_versus_struct() {
    match value_of("{x: 1, y: 2,}") {
        ValueKind::Map(entries) => assert_eq!(entries.len(), 2),
        other => panic!("Expected map, got {:?}", other),
    }
    match value_of("{x: 1, y: 2}") {
        ValueKind::Struct(fields) => {
            let keys: Vec<_> = fields.keys().cloned().collect();
            assert_eq!(keys, vec!["x", "y"]);
        }
        other => panic!("Expected struct, got {:?}", other),
    }
    assert!(matches!(value_of("{}"), ValueKind::Map(entries) if entries.is_empty()));
}

#[test]
fn test_references() {
    match value_of("@base") {
        ValueKind::Reference(r) => {
            assert_eq!(r.kind, ReferenceKind::Macro);
            assert_eq!(r.target, "base");
        }
        other => panic!("Expected macro reference, got {:?}", other),
    }
    match value_of("@{Player.hp}") {
        ValueKind::Reference(r) => {
            assert_eq!(r.kind, ReferenceKind::CrossSection);
            assert_eq!(r.section_key(), Some(("Player", "hp")));
        }
        other => panic!("Expected cross-section reference, got {:?}", other),
    }
    match value_of("${HOME}") {
        ValueKind::Reference(r) => assert_eq!(r.kind, ReferenceKind::Environment),
        other => panic!("Expected environment reference, got {:?}", other),
    }
    match value_of("%{menu.title}") {
        ValueKind::Reference(r) => {
            assert_eq!(r.kind, ReferenceKind::Localization);
            assert_eq!(r.target, "menu.title");
        }
        other => panic!("Expected localization reference, got {:?}", other),
    }
}

#[test]
fn test_modulo_after_operand_is_not_localization() {
    assert!(matches!(value_of("10 % 3"), ValueKind::Binary(_, BinaryOp::Mod, _)));
}

#[test]
fn test_dotted_identifier_is_unquoted_string() {
    assert_eq!(value_of("schema.yini"), ValueKind::String("schema.yini".into()));
    assert_eq!(value_of("plain"), ValueKind::String("plain".into()));
}

#[test]
fn test_registry_keeps_order() {
    let doc = parse("[Items]\n+= 1\n+= 2\n");
    let items = &doc.section("Items").unwrap().registry;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].kind, ValueKind::Integer(1));
    assert_eq!(items[1].kind, ValueKind::Integer(2));
}

#[test]
fn test_redeclared_section_merges() {
    let input = r#"
[A]
x = 1
y = 1
+= "first"
[A]
y = 2
+= "second"
"#;
    let doc = parse(input);
    let a = doc.section("A").unwrap();
    assert_eq!(a.get("x").unwrap().as_i32(), Some(1));
    assert_eq!(a.get("y").unwrap().as_i32(), Some(2));
    assert_eq!(a.registry.len(), 2);
}

#[test]
fn test_special_sections() {
    let input = r#"
[#define]
base = 100
[#include]
+= "common.yini"
"#;
    let doc = parse(input);
    assert!(doc.section("#define").unwrap().is_special());
    assert_eq!(doc.section("#include").unwrap().registry.len(), 1);
}

#[test]
fn test_unknown_special_section() {
    let err = Parser::new("[#bogus]\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(206));
}

#[test]
fn test_schema_mode_until_end_marker() {
    let input = r#"
[#schema]
[Config]
req = !, int, min=10, max=20
opt = ?, float, =1.5
vals = !, array[int]
quiet = ?, string, ~
loud = ?, e, string
[#end_schema]
[Config]
req = 15
"#;
    let doc = parse(input);

    let schema = doc.schemas.get("Config").expect("schema section");
    let data = doc.section("Config").expect("data section");
    assert_eq!(data.get("req").unwrap().as_i32(), Some(15));

    let def = |key: &str| match &schema.get(key).unwrap().kind {
        ValueKind::Schema(def) => def.as_ref().clone(),
        other => panic!("Expected schema definition, got {:?}", other),
    };

    let req = def("req");
    assert_eq!(req.requirement, Requirement::Required);
    assert_eq!(req.type_name.as_deref(), Some("int"));
    assert_eq!(req.min.unwrap().as_i32(), Some(10));
    assert_eq!(req.max.unwrap().as_i32(), Some(20));

    let opt = def("opt");
    assert_eq!(opt.requirement, Requirement::Optional);
    assert_eq!(opt.empty_behavior, EmptyBehavior::Default);
    assert_eq!(opt.default.unwrap().kind, ValueKind::Float(1.5));

    assert_eq!(def("vals").type_name.as_deref(), Some("array[int]"));
    assert_eq!(def("quiet").empty_behavior, EmptyBehavior::Ignore);
    assert_eq!(def("loud").empty_behavior, EmptyBehavior::Error);
}

#[test]
fn test_schema_type_followed_by_section_header() {
    let input = "[#schema]\n[Config]\nvals = !, array\n[Other]\nx = !, int\n";
    let doc = parse(input);
    let schema = doc.schemas.get("Config").unwrap();
    match &schema.get("vals").unwrap().kind {
        ValueKind::Schema(def) => assert_eq!(def.type_name.as_deref(), Some("array")),
        other => panic!("Expected schema definition, got {:?}", other),
    }
    assert!(doc.schemas.contains_key("Other"));
}

#[test]
fn test_schema_marker_takes_no_body() {
    let err = Parser::new("[#schema]\nx = 1\n").unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(206));
}

#[test]
fn test_top_level_property_is_error() {
    let err = Parser::new("x = 1\n").unwrap().parse_document().unwrap_err();
    match err {
        YiniError::ParseError { code, span, .. } => {
            assert_eq!(code, Some(205));
            assert_eq!((span.line, span.column), (1, 1));
        }
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_missing_equals_reports_position() {
    let err = Parser::new("[S]\nkey 1\n").unwrap().parse_document().unwrap_err();
    match err {
        YiniError::ParseError { span, found, .. } => {
            assert_eq!((span.line, span.column), (2, 5));
            assert_eq!(found, "number 1");
        }
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_key_spans_recorded() {
    let doc = parse("[S]\n  alpha = 1\n");
    let span = &doc.section("S").unwrap().key_spans["alpha"];
    assert_eq!((span.line, span.column), (2, 3));
}

#[test]
fn test_standalone_expression_rejects_trailing_tokens() {
    assert!(Parser::parse_standalone_expression("a * 2").is_ok());
    assert!(Parser::parse_standalone_expression("a 2").is_err());
}

#[test]
fn test_deep_nesting_is_rejected() {
    let depth = 10_000;
    let source = format!("[S]\nv = {}1{}\n", "[".repeat(depth), "]".repeat(depth));
    let err = Parser::new(&source).unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(217));

    let source = format!("[S]\nv = {}1\n", "-".repeat(depth));
    let err = Parser::new(&source).unwrap().parse_document().unwrap_err();
    assert_eq!(err.code(), Some(217));

    let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
    assert_eq!(Parser::parse_standalone_expression(&source).unwrap_err().code(), Some(217));
}

#[test]
fn test_nesting_below_limit_parses() {
    let depth = MAX_NESTING / 2;
    let source = format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
    let mut value = Parser::parse_standalone_expression(&source).unwrap();
    for _ in 0..depth {
        value = match value.kind {
            ValueKind::Array(mut items) => items.remove(0),
            other => panic!("Expected array, got {:?}", other),
        };
    }
    assert_eq!(value.kind, ValueKind::Integer(1));
}
