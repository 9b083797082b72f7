//! Arithmetic shared by compile-time folding, the tree-walking evaluator and
//! the bytecode VM, so all three agree on promotion and failure.

use crate::ast::{BinaryOp, Span, UnaryOp, Value, ValueKind};
use crate::YiniError;

/// Applies `op` to two concrete operands.
///
/// * int ⊕ int stays int (checked; overflow is an error)
/// * any float operand promotes both sides to float
/// * `+` concatenates when either side is a string
/// * division or modulo by zero is an error for ints and floats alike
pub fn binary(left: &Value, op: BinaryOp, right: &Value, span: &Span) -> Result<Value, YiniError> {
    let kind = match (&left.kind, &right.kind) {
        (ValueKind::Integer(l), ValueKind::Integer(r)) => ValueKind::Integer(int_op(*l, op, *r, span)?),
        (ValueKind::String(_), _) | (_, ValueKind::String(_)) if op == BinaryOp::Add => {
            match (concat_text(left), concat_text(right)) {
                (Some(l), Some(r)) => ValueKind::String(l + &r),
                _ => return Err(mismatch(left, op, right, span)),
            }
        }
        _ => match (numeric(left), numeric(right)) {
            (Some(l), Some(r)) => ValueKind::Float(float_op(l, op, r, span)?),
            _ => return Err(mismatch(left, op, right, span)),
        },
    };
    Ok(Value::new(kind, span.clone()))
}

pub fn unary(op: UnaryOp, operand: &Value, span: &Span) -> Result<Value, YiniError> {
    let kind = match (op, &operand.kind) {
        (UnaryOp::Neg, ValueKind::Integer(i)) => ValueKind::Integer(
            i.checked_neg()
                .ok_or_else(|| YiniError::evaluation(format!("Integer overflow negating {}", i), span, 503))?,
        ),
        (UnaryOp::Neg, ValueKind::Float(f)) => ValueKind::Float(-f),
        _ => {
            return Err(YiniError::evaluation(
                format!("Cannot negate a value of type {}", operand.type_name()),
                span,
                504,
            ));
        }
    };
    Ok(Value::new(kind, span.clone()))
}

fn int_op(l: i32, op: BinaryOp, r: i32, span: &Span) -> Result<i32, YiniError> {
    if r == 0 && matches!(op, BinaryOp::Div | BinaryOp::Mod) {
        return Err(division_by_zero(span));
    }
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Mod => l.checked_rem(r),
    };
    result.ok_or_else(|| {
        YiniError::evaluation(
            format!("Integer overflow in {} {} {}", l, op.symbol(), r),
            span,
            503,
        )
    })
}

fn float_op(l: f32, op: BinaryOp, r: f32, span: &Span) -> Result<f32, YiniError> {
    if r == 0.0 && matches!(op, BinaryOp::Div | BinaryOp::Mod) {
        return Err(division_by_zero(span));
    }
    Ok(match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Mod => l % r,
    })
}

fn numeric(value: &Value) -> Option<f32> {
    match value.kind {
        ValueKind::Integer(i) => Some(i as f32),
        ValueKind::Float(f) => Some(f),
        _ => None,
    }
}

fn concat_text(value: &Value) -> Option<String> {
    match &value.kind {
        ValueKind::String(s) => Some(s.clone()),
        ValueKind::Integer(i) => Some(i.to_string()),
        ValueKind::Float(f) => Some(f.to_string()),
        ValueKind::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

fn division_by_zero(span: &Span) -> YiniError {
    YiniError::EvaluationError {
        message: "Division by zero".into(),
        span: Some(span.clone()),
        hint: Some("Check the divisor of '/' and '%'".into()),
        code: Some(502),
    }
}

fn mismatch(left: &Value, op: BinaryOp, right: &Value, span: &Span) -> YiniError {
    YiniError::evaluation(
        format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        span,
        501,
    )
}
