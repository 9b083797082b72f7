use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::ast::{Document, EmptyBehavior, Requirement, SchemaDefinition, Section, Value, ValueKind};
use crate::error::ValidationKind;
use crate::YiniError;

type KindCheck = fn(&ValueKind) -> bool;

/// Scalar and container type names a schema may declare.
static TYPE_CHECKS: Lazy<HashMap<&'static str, KindCheck>> = Lazy::new(|| {
    let mut checks: HashMap<&'static str, KindCheck> = HashMap::new();
    checks.insert("int", |k| matches!(k, ValueKind::Integer(_)));
    checks.insert("float", |k| matches!(k, ValueKind::Float(_) | ValueKind::Integer(_)));
    checks.insert("bool", |k| matches!(k, ValueKind::Boolean(_)));
    checks.insert("string", |k| matches!(k, ValueKind::String(_)));
    checks.insert("color", |k| matches!(k, ValueKind::Color(_)));
    checks.insert("coord", |k| matches!(k, ValueKind::Coord(_)));
    checks.insert("path", |k| matches!(k, ValueKind::Path(_)));
    checks.insert("array", |k| matches!(k, ValueKind::Array(_)));
    checks.insert("list", |k| matches!(k, ValueKind::List(_)));
    checks.insert("set", |k| matches!(k, ValueKind::Set(_)));
    checks.insert("map", |k| matches!(k, ValueKind::Map(_)));
    checks.insert("struct", |k| matches!(k, ValueKind::Struct(_)));
    checks.insert("dyna", |k| matches!(k, ValueKind::Dyna(_)));
    checks
});

/// Checks every data section that has a schema section of the same name.
///
/// Missing properties that carry a default get a copy of it; nothing else
/// in the document is changed. The first violation aborts validation.
pub fn validate(doc: &mut Document) -> Result<(), YiniError> {
    for (name, schema) in &doc.schemas {
        let Some(data) = doc.sections.get_mut(name) else {
            let required = schema
                .properties
                .values()
                .filter_map(definition)
                .any(|def| def.requirement == Requirement::Required);
            if required {
                return Err(YiniError::ValidationError {
                    kind: ValidationKind::MissingSection,
                    message: format!("Missing required section: [{}]", name),
                    section: name.clone(),
                    property: None,
                    code: Some(401),
                });
            }
            continue;
        };

        validate_section(data, schema)?;
    }
    Ok(())
}

fn definition(value: &Value) -> Option<&SchemaDefinition> {
    match &value.kind {
        ValueKind::Schema(def) => Some(def),
        _ => None,
    }
}

fn validate_section(data: &mut Section, schema: &Section) -> Result<(), YiniError> {
    for (key, value) in &schema.properties {
        let Some(def) = definition(value) else {
            continue;
        };

        match data.properties.get(key) {
            Some(present) => {
                check_type(&data.name, key, present, def.type_name.as_deref())?;
                check_range(&data.name, key, present, def)?;
            }
            None => fill_missing(data, key, def)?,
        }
    }
    Ok(())
}

fn fill_missing(data: &mut Section, key: &str, def: &SchemaDefinition) -> Result<(), YiniError> {
    let missing = |message: String| YiniError::ValidationError {
        kind: ValidationKind::MissingProperty,
        message,
        section: data.name.clone(),
        property: Some(key.to_string()),
        code: Some(402),
    };

    match (def.requirement, &def.default, def.empty_behavior) {
        (Requirement::Required, Some(default), _) | (Requirement::Optional, Some(default), EmptyBehavior::Default) => {
            tracing::trace!(section = %data.name, key, "filling default");
            let value = default.clone();
            data.properties.insert(key.to_string(), value);
            Ok(())
        }
        (Requirement::Required, None, _) => Err(missing(format!(
            "Missing required property: {} in [{}]",
            key, data.name
        ))),
        (Requirement::Optional, _, EmptyBehavior::Error) => Err(missing(format!(
            "Property {} in [{}] is missing and may not be empty",
            key, data.name
        ))),
        _ => Ok(()),
    }
}

fn check_type(section: &str, key: &str, value: &Value, expected: Option<&str>) -> Result<(), YiniError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let valid = if let Some(check) = TYPE_CHECKS.get(expected) {
        check(&value.kind)
    } else if let Some((container, inner)) = parameterized(expected) {
        let items = match (container, &value.kind) {
            ("array", ValueKind::Array(items))
            | ("list", ValueKind::List(items))
            | ("set", ValueKind::Set(items)) => Some(items),
            _ => None,
        };
        match items {
            Some(items) => {
                let element_key = format!("{}[]", key);
                for item in items {
                    check_type(section, &element_key, item, Some(inner))?;
                }
                true
            }
            None => false,
        }
    } else {
        tracing::warn!(section, key, type_name = expected, "unknown schema type, accepting any value");
        true
    };

    if valid {
        Ok(())
    } else {
        Err(YiniError::ValidationError {
            kind: ValidationKind::TypeMismatch,
            message: format!("Property {} expected type {}, got {}", key, expected, value.type_name()),
            section: section.to_string(),
            property: Some(key.to_string()),
            code: Some(403),
        })
    }
}

/// `array[int]` -> `("array", "int")`
fn parameterized(type_name: &str) -> Option<(&str, &str)> {
    let (container, rest) = type_name.split_once('[')?;
    let inner = rest.strip_suffix(']')?;
    matches!(container, "array" | "list" | "set").then_some((container, inner))
}

fn check_range(section: &str, key: &str, value: &Value, def: &SchemaDefinition) -> Result<(), YiniError> {
    // Ranges only constrain numbers.
    let Some(actual) = value.as_number() else {
        return Ok(());
    };

    let out_of_range = |message: String| YiniError::ValidationError {
        kind: ValidationKind::RangeError,
        message,
        section: section.to_string(),
        property: Some(key.to_string()),
        code: Some(404),
    };

    if let Some(min) = def.min.as_ref().and_then(Value::as_number) {
        if actual < min {
            return Err(out_of_range(format!("Property {} value {} is less than min {}", key, actual, min)));
        }
    }
    if let Some(max) = def.max.as_ref().and_then(Value::as_number) {
        if actual > max {
            return Err(out_of_range(format!("Property {} value {} is greater than max {}", key, actual, max)));
        }
    }
    Ok(())
}
