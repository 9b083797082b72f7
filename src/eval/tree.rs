use indexmap::IndexMap;

use super::EvalContext;
use crate::ast::{Value, ValueKind};
use crate::{ops, YiniError};

/// Walks a parsed expression against `ctx`. Bare identifiers parse as
/// strings; each one is tried as a variable first.
pub(super) fn eval(node: &Value, ctx: &dyn EvalContext) -> Result<Value, YiniError> {
    let kind = match &node.kind {
        ValueKind::String(name) => {
            return Ok(ctx.resolve_variable(name).unwrap_or_else(|| node.clone()));
        }
        ValueKind::Reference(reference) => return ctx.resolve_reference(reference),
        ValueKind::Binary(left, op, right) => {
            let left = eval(left, ctx)?;
            let right = eval(right, ctx)?;
            return ops::binary(&left, *op, &right, &node.span);
        }
        ValueKind::Unary(op, operand) => {
            let operand = eval(operand, ctx)?;
            return ops::unary(*op, &operand, &node.span);
        }
        ValueKind::Array(items) => ValueKind::Array(eval_all(items, ctx)?),
        ValueKind::List(items) => ValueKind::List(eval_all(items, ctx)?),
        ValueKind::Set(items) => ValueKind::Set(eval_all(items, ctx)?),
        ValueKind::Map(entries) => ValueKind::Map(eval_entries(entries, ctx)?),
        ValueKind::Struct(fields) => ValueKind::Struct(eval_entries(fields, ctx)?),
        ValueKind::Schema(_) => {
            return Err(YiniError::evaluation("Schema definitions cannot be evaluated", &node.span, 505));
        }
        ValueKind::Integer(_)
        | ValueKind::Float(_)
        | ValueKind::Boolean(_)
        | ValueKind::Color(_)
        | ValueKind::Coord(_)
        | ValueKind::Path(_)
        | ValueKind::Dyna(_) => return Ok(node.clone()),
    };
    Ok(Value::new(kind, node.span.clone()))
}

fn eval_all(items: &[Value], ctx: &dyn EvalContext) -> Result<Vec<Value>, YiniError> {
    items.iter().map(|item| eval(item, ctx)).collect()
}

fn eval_entries(entries: &IndexMap<String, Value>, ctx: &dyn EvalContext) -> Result<IndexMap<String, Value>, YiniError> {
    entries
        .iter()
        .map(|(key, value)| Ok((key.clone(), eval(value, ctx)?)))
        .collect()
}
