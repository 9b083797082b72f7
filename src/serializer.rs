use std::fmt::{self, Write};

use crate::ast::{
    BinaryOp, Document, EmptyBehavior, ReferenceKind, Requirement, SchemaDefinition, Section, Value,
    ValueKind,
};
use crate::compiler::DEFINE;

/// Re-emits `doc` as YINI source that parses back to the same document.
///
/// Macros with no `[#define]` section of their own get one up front. Schema
/// sections come last, between `[#schema]` and `[#end_schema]`.
pub fn to_yini_string(doc: &Document) -> String {
    let mut out = String::new();

    if !doc.macros.is_empty() && !doc.sections.contains_key(DEFINE) {
        out.push_str("[#define]\n");
        for (name, value) in &doc.macros {
            let _ = writeln!(out, "{} = {}", name, value);
        }
        out.push('\n');
    }

    for section in doc.sections.values() {
        write_section(&mut out, section);
        out.push('\n');
    }

    if !doc.schemas.is_empty() {
        out.push_str("[#schema]\n");
        for schema in doc.schemas.values() {
            write_section(&mut out, schema);
        }
        out.push_str("[#end_schema]\n");
    }

    out.trim_end().to_string()
}

fn write_section(out: &mut String, section: &Section) {
    let _ = write!(out, "[{}]", section.name);
    if !section.parents.is_empty() {
        let _ = write!(out, " : {}", section.parents.join(", "));
    }
    out.push('\n');

    for (key, value) in &section.properties {
        let _ = writeln!(out, "{} = {}", key, value);
    }
    for value in &section.registry {
        let _ = writeln!(out, "+= {}", value);
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_yini_string(self))
    }
}

/// YINI source form of the value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Integer(i) => write!(f, "{}", i),
            ValueKind::Float(x) => write_float(f, *x),
            ValueKind::Boolean(b) => write!(f, "{}", b),
            ValueKind::String(s) => write_quoted(f, s),
            ValueKind::Array(items) => {
                f.write_str("[")?;
                write_list(f, items)?;
                f.write_str("]")
            }
            ValueKind::List(items) => {
                f.write_str("List(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            ValueKind::Set(items) => {
                f.write_str("Set(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            // Trailing comma marks a map; an empty struct has no text form
            // of its own and reads back as a map.
            ValueKind::Map(entries) => {
                f.write_str("{")?;
                for (key, value) in entries {
                    write!(f, "{}: {}, ", key, value)?;
                }
                f.write_str("}")
            }
            ValueKind::Struct(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            ValueKind::Color(c) if c.a == 255 => write!(f, "#{:02X}{:02X}{:02X}", c.r, c.g, c.b),
            ValueKind::Color(c) => write!(f, "Color({}, {}, {}, {})", c.r, c.g, c.b, c.a),
            ValueKind::Coord(c) => {
                f.write_str("Coord(")?;
                write_float(f, c.x)?;
                f.write_str(", ")?;
                write_float(f, c.y)?;
                if c.is_3d {
                    f.write_str(", ")?;
                    write_float(f, c.z)?;
                }
                f.write_str(")")
            }
            ValueKind::Path(p) => {
                f.write_str("Path(")?;
                write_quoted(f, p)?;
                f.write_str(")")
            }
            ValueKind::Reference(r) => match r.kind {
                ReferenceKind::Environment => write!(f, "${{{}}}", r.target),
                ReferenceKind::CrossSection => write!(f, "@{{{}}}", r.target),
                ReferenceKind::Macro => write!(f, "@{}", r.target),
                ReferenceKind::Localization => write!(f, "%{{{}}}", r.target),
            },
            ValueKind::Dyna(expression) => write!(f, "Dyna({})", expression),
            ValueKind::Binary(left, op, right) => {
                write_operand(f, left, Some(*op), false)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, Some(*op), true)
            }
            ValueKind::Unary(_, operand) => {
                f.write_str("-")?;
                write_operand(f, operand, None, true)
            }
            ValueKind::Schema(def) => write_schema(f, def),
        }
    }
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add | BinaryOp::Sub => 1,
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 2,
    }
}

/// Parenthesizes a binary operand that would otherwise regroup. `None`
/// means the parent is unary minus, which binds tighter than any operator.
fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Value, parent: Option<BinaryOp>, right: bool) -> fmt::Result {
    let wrap = match (&operand.kind, parent) {
        (ValueKind::Binary(_, child, _), Some(parent)) => {
            let (child, parent) = (precedence(*child), precedence(parent));
            child < parent || (right && child == parent)
        }
        (ValueKind::Binary(..), None) => true,
        _ => false,
    };
    if wrap {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Floats always carry a `.` so they read back as floats.
fn write_float(f: &mut fmt::Formatter<'_>, x: f32) -> fmt::Result {
    let text = x.to_string();
    if text.contains('.') || !x.is_finite() {
        f.write_str(&text)
    } else {
        write!(f, "{}.0", text)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

fn write_schema(f: &mut fmt::Formatter<'_>, def: &SchemaDefinition) -> fmt::Result {
    let mut parts = vec![match def.requirement {
        Requirement::Required => "!".to_string(),
        Requirement::Optional => "?".to_string(),
    }];
    if let Some(type_name) = &def.type_name {
        parts.push(type_name.clone());
    }
    if let Some(default) = &def.default {
        parts.push(format!("={}", default));
    }
    // `=default` switches to Default behavior, so Ignore only needs a marker
    // after one.
    match def.empty_behavior {
        EmptyBehavior::Ignore if def.default.is_some() => parts.push("~".into()),
        EmptyBehavior::Ignore => {}
        EmptyBehavior::Error => parts.push("e".into()),
        EmptyBehavior::Default => {}
    }
    if let Some(min) = &def.min {
        parts.push(format!("min={}", min));
    }
    if let Some(max) = &def.max {
        parts.push(format!("max={}", max));
    }
    f.write_str(&parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::Compiler;

    fn reparse(value: &Value) -> Value {
        Parser::parse_standalone_expression(&value.to_string()).expect("Failed to reparse")
    }

    #[test]
    fn test_scalar_forms() {
        assert_eq!(Value::int(-3).to_string(), "-3");
        assert_eq!(Value::float(2.0).to_string(), "2.0");
        assert_eq!(Value::float(0.25).to_string(), "0.25");
        assert_eq!(Value::string("say \"hi\"\n").to_string(), r#""say \"hi\"\n""#);
    }

    #[test]
    fn test_expressions_keep_grouping() {
        for source in ["(1 + 2) * 3", "1 - (2 - 3)", "-(a + b)", "1 + 2 * 3", "a / b % c"] {
            let parsed = Parser::parse_standalone_expression(source).unwrap();
            assert_eq!(reparse(&parsed), parsed, "{} printed as {}", source, parsed);
        }
        let parsed = Parser::parse_standalone_expression("(1 + 2) * 3").unwrap();
        assert_eq!(parsed.to_string(), "(1 + 2) * 3");
    }

    #[test]
    fn test_compiled_document_round_trips_through_text() {
        let source = r#"
[#define]
n = 3
[Base]
tint = #FF8800
glass = Color(10, 20, 30, 40)
at = Coord(-1, 2.5, 3)
file = Path("a\\b.png")
[Hero] : Base
stats = {hp: 10, mp: 3}
bag = {potion: @n,}
tags = Set("x")
list = List()
dyn = Dyna(n * 2 + 1)
+= 1
+= "two"
[#schema]
[Hero]
hp = !, int, =5, min=0, max=@n * 100
names = ?, array[string], ~
[#end_schema]
"#;
        let compiler = Compiler::new();
        let doc = compiler.compile(source).unwrap();
        let text = to_yini_string(&doc);
        let again = compiler.compile(&text).unwrap_or_else(|e| panic!("{}\n---\n{}", e, text));
        assert_eq!(again, doc);
    }

    #[test]
    fn test_smallest_integer_reads_back() {
        assert_eq!(reparse(&Value::int(i32::MIN)), Value::int(i32::MIN));

        let compiler = Compiler::new();
        let doc = compiler.compile("[A]\nx = -2147483647 - 1\n").unwrap();
        let text = to_yini_string(&doc);
        assert!(text.contains("x = -2147483648"), "{}", text);
        assert_eq!(compiler.compile(&text).unwrap(), doc);
    }

    #[test]
    fn test_macros_without_define_section() {
        let mut doc = Document::new();
        doc.macros.insert("speed".into(), Value::int(4));
        let text = to_yini_string(&doc);
        assert!(text.starts_with("[#define]\nspeed = 4"));
    }
}
