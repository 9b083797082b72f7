// Author: Dustin Pilgrim
// License: MIT

use std::path::Path;

use serde_json::json;

use crate::ast::{Document, EmptyBehavior, Requirement, Section, Value, ValueKind};
use crate::compiler::Compiler;
use crate::YiniError;

/// Export a YINI document to JSON.
///
/// Plain values map directly:
/// - Integers, floats, booleans, strings → JSON scalars
/// - Array, List, Set → JSON arrays
/// - Map, Struct → JSON objects (key order kept)
///
/// Typed literals keep their type as a single-key object:
/// `{"color": [r, g, b, a]}`, `{"coord": [x, y, z?]}`, `{"path": "..."}`,
/// `{"dyna": "expr"}`. Anything still unresolved (references, expressions)
/// is exported as `{"unresolved": "<YINI text>"}`, schema definitions as
/// `{"schema": {...}}`.
///
/// # Examples
/// ```
/// use yini_cfg::{Compiler, export::export_document_to_json};
///
/// let doc = Compiler::new().compile("[Window]\nwidth = 640\n").unwrap();
/// let json = export_document_to_json(&doc).unwrap();
/// assert!(json.contains("\"width\": 640"));
/// ```
pub fn export_document_to_json(doc: &Document) -> Result<String, YiniError> {
    serde_json::to_string_pretty(&document_to_json(doc)).map_err(|e| YiniError::FormatError {
        message: format!("Failed to serialize JSON: {}", e),
        offset: 0,
        code: Some(610),
    })
}

/// The JSON tree behind [`export_document_to_json`].
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    let mut top = serde_json::Map::new();

    if !doc.macros.is_empty() {
        top.insert("macros".into(), entries_to_json(doc.macros.iter()));
    }

    let sections = doc
        .sections
        .values()
        .map(|s| (s.name.clone(), section_to_json(s)))
        .collect::<serde_json::Map<_, _>>();
    top.insert("sections".into(), serde_json::Value::Object(sections));

    if !doc.schemas.is_empty() {
        let schemas = doc
            .schemas
            .values()
            .map(|s| (s.name.clone(), entries_to_json(s.properties.iter())))
            .collect::<serde_json::Map<_, _>>();
        top.insert("schemas".into(), serde_json::Value::Object(schemas));
    }

    serde_json::Value::Object(top)
}

fn section_to_json(section: &Section) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    if !section.parents.is_empty() {
        out.insert("parents".into(), json!(section.parents));
    }
    out.insert("properties".into(), entries_to_json(section.properties.iter()));
    if !section.registry.is_empty() {
        out.insert(
            "registry".into(),
            json!(section.registry.iter().map(value_to_json).collect::<Vec<_>>()),
        );
    }
    serde_json::Value::Object(out)
}

fn entries_to_json<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> serde_json::Value {
    serde_json::Value::Object(entries.map(|(k, v)| (k.clone(), value_to_json(v))).collect())
}

pub fn value_to_json(v: &Value) -> serde_json::Value {
    match &v.kind {
        ValueKind::Integer(i) => json!(i),
        ValueKind::Float(f) => json!(f),
        ValueKind::Boolean(b) => json!(b),
        ValueKind::String(s) => json!(s),
        ValueKind::Array(items) | ValueKind::List(items) | ValueKind::Set(items) => {
            json!(items.iter().map(value_to_json).collect::<Vec<_>>())
        }
        ValueKind::Map(entries) | ValueKind::Struct(entries) => entries_to_json(entries.iter()),
        ValueKind::Color(c) => json!({ "color": [c.r, c.g, c.b, c.a] }),
        ValueKind::Coord(c) if c.is_3d => json!({ "coord": [c.x, c.y, c.z] }),
        ValueKind::Coord(c) => json!({ "coord": [c.x, c.y] }),
        ValueKind::Path(p) => json!({ "path": p }),
        ValueKind::Dyna(expr) => json!({ "dyna": expr }),
        ValueKind::Reference(_) | ValueKind::Binary(..) | ValueKind::Unary(..) => {
            json!({ "unresolved": v.to_string() })
        }
        ValueKind::Schema(def) => json!({
            "schema": {
                "required": def.requirement == Requirement::Required,
                "type": def.type_name,
                "default": def.default.as_ref().map(value_to_json),
                "on_empty": match def.empty_behavior {
                    EmptyBehavior::Default => "default",
                    EmptyBehavior::Ignore => "ignore",
                    EmptyBehavior::Error => "error",
                },
                "min": def.min.as_ref().map(value_to_json),
                "max": def.max.as_ref().map(value_to_json),
            }
        }),
    }
}

/// Compile a YINI file (includes and all) and export it as JSON.
///
/// # Errors
/// Returns error if the file or one of its includes is missing, or if
/// compilation fails.
pub fn export_yini_file(path: impl AsRef<Path>) -> Result<String, YiniError> {
    let doc = Compiler::new().compile_file(&path.as_ref().to_string_lossy())?;
    export_document_to_json(&doc)
}
