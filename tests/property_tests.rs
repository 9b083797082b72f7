use indexmap::IndexMap;
use proptest::prelude::*;
use yini_cfg::ast::{Color, Coord, Reference, ReferenceKind};
use yini_cfg::eval::Strategy as Mode;
use yini_cfg::{decode, encode, Compiler, Document, Evaluator, Section, Value, ValueKind};

/// Arithmetic over integer and float literals plus three bound variables.
fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i32..100).prop_map(|n| n.to_string()),
        (0u16..100).prop_map(|n| format!("{}.5", n)),
        Just("a".to_string()),
        Just("b".to_string()),
        Just("c".to_string()),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")], inner.clone())
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("({})", e)),
            inner.prop_map(|e| format!("-({})", e)),
        ]
    })
}

fn context() -> IndexMap<String, Value> {
    let mut ctx = IndexMap::new();
    ctx.insert("a".to_string(), Value::int(3));
    ctx.insert("b".to_string(), Value::int(-7));
    ctx.insert("c".to_string(), Value::float(2.5));
    ctx
}

proptest! {
    /// Tree-walk and bytecode agree on every expression: same value, or
    /// the same error code.
    #[test]
    fn tree_walk_matches_bytecode(expr in expression()) {
        let ctx = context();
        let evaluator = Evaluator::new();
        let tree = evaluator.evaluate(&expr, &ctx, Mode::TreeWalk);
        let vm = evaluator.evaluate(&expr, &ctx, Mode::Bytecode);

        match (tree, vm) {
            (Ok(t), Ok(v)) => prop_assert_eq!(t, v, "{}", expr),
            (Err(t), Err(v)) => prop_assert_eq!(t.code(), v.code(), "{}", expr),
            (t, v) => prop_assert!(false, "{}: tree {:?} vs vm {:?}", expr, t, v),
        }
    }

    /// Constant expressions fold at compile time to what the evaluator
    /// computes at runtime.
    #[test]
    fn folding_matches_evaluation(expr in expression()) {
        let constant = expr.replace('a', "3").replace('b', "(-7)").replace('c', "2.5");
        let evaluated = Evaluator::new().evaluate(&constant, &IndexMap::<String, Value>::new(), Mode::TreeWalk);
        let compiled = Compiler::new().compile(&format!("[E]\nv = {}\n", constant));

        match (evaluated, compiled) {
            (Ok(value), Ok(doc)) => prop_assert_eq!(doc.get("E", "v"), Some(&value)),
            (Err(e), Err(c)) => prop_assert_eq!(e.code(), c.code()),
            (e, c) => prop_assert!(false, "{}: eval {:?} vs compile {:?}", constant, e, c.map(|d| d.get("E", "v").cloned())),
        }
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::int),
        (-1.0e6f32..1.0e6).prop_map(Value::float),
        any::<bool>().prop_map(Value::boolean),
        "\\PC{0,12}".prop_map(|s: String| Value::string(s)),
        any::<[u8; 4]>().prop_map(|[r, g, b, a]| Value::bare(ValueKind::Color(Color::rgba(r, g, b, a)))),
        (-100.0f32..100.0, -100.0f32..100.0).prop_map(|(x, y)| Value::bare(ValueKind::Coord(Coord::new_2d(x, y)))),
        "[a-z/]{1,10}".prop_map(|p| Value::bare(ValueKind::Path(p))),
        "[a-z]{1,6}\\.[a-z]{1,6}".prop_map(|t| Value::bare(ValueKind::Reference(Reference::new(ReferenceKind::CrossSection, t)))),
        "[a-z]{1,6} \\* 2".prop_map(|e| Value::bare(ValueKind::Dyna(e))),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| Value::bare(ValueKind::Array(v))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| Value::bare(ValueKind::List(v))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(|v| Value::bare(ValueKind::Set(v))),
            prop::collection::vec(("[a-z]{1,5}", inner.clone()), 0..4)
                .prop_map(|e| Value::bare(ValueKind::Map(e.into_iter().collect()))),
            prop::collection::vec(("[a-z]{1,5}", inner), 1..4)
                .prop_map(|e| Value::bare(ValueKind::Struct(e.into_iter().collect()))),
        ]
    })
}

fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(
        ("[A-Z][a-z]{0,5}", prop::collection::vec(("[a-z]{1,5}", value()), 0..4), prop::collection::vec(value(), 0..3)),
        0..4,
    )
    .prop_map(|sections| {
        let mut doc = Document::new();
        for (name, properties, registry) in sections {
            let mut section = Section::new(name);
            for (key, value) in properties {
                section.set(key, value);
            }
            section.registry = registry;
            doc.insert_section(section);
        }
        doc
    })
}

proptest! {
    #[test]
    fn binary_round_trip(doc in document()) {
        let bytes = encode(&doc).unwrap();
        prop_assert_eq!(decode(&bytes).unwrap(), doc);
    }
}
