use indexmap::IndexMap;

use super::bytecode::{OpCode, Program};
use super::EvalContext;
use crate::ast::{UnaryOp, Value, ValueKind};
use crate::{ops, YiniError};

/// Stack machine over a [`Program`]. Arithmetic goes through the same
/// helpers as the tree-walker, so both agree value for value.
pub(super) fn run(program: &Program, ctx: &dyn EvalContext) -> Result<Value, YiniError> {
    let code = &program.code;
    let mut stack: Vec<Value> = Vec::with_capacity(16);
    let mut pc = 0;

    loop {
        let at = pc;
        let byte = *code.get(pc).ok_or_else(|| corrupt("ran past the end of the program", at))?;
        let op = OpCode::try_from(byte).map_err(|b| corrupt(&format!("unknown opcode {}", b), at))?;
        pc += 1;

        let arg = if op.has_operand() {
            let bytes = code.get(pc..pc + 2).ok_or_else(|| corrupt("truncated operand", at))?;
            pc += 2;
            u16::from_le_bytes([bytes[0], bytes[1]]) as usize
        } else {
            0
        };

        match op {
            OpCode::Halt => break,
            OpCode::PushInt | OpCode::PushFloat | OpCode::PushString | OpCode::PushBool | OpCode::PushConst => {
                stack.push(constant(program, arg, at)?.clone());
            }
            OpCode::PushVar => {
                let name = constant(program, arg, at)?;
                let value = match &name.kind {
                    ValueKind::String(s) => ctx.resolve_variable(s).unwrap_or_else(|| name.clone()),
                    _ => name.clone(),
                };
                stack.push(value);
            }
            OpCode::PushRef => match &constant(program, arg, at)?.kind {
                ValueKind::Reference(reference) => stack.push(ctx.resolve_reference(reference)?),
                _ => return Err(corrupt("PushRef operand is not a reference", at)),
            },
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                let right = pop(&mut stack, at)?;
                let left = pop(&mut stack, at)?;
                let bin = op.binary().ok_or_else(|| corrupt("not a binary opcode", at))?;
                stack.push(ops::binary(&left, bin, &right, &program.span_at(at))?);
            }
            OpCode::Neg => {
                let operand = pop(&mut stack, at)?;
                stack.push(ops::unary(UnaryOp::Neg, &operand, &program.span_at(at))?);
            }
            OpCode::MakeArray | OpCode::MakeList | OpCode::MakeSet => {
                let items = pop_n(&mut stack, arg, at)?;
                let kind = match op {
                    OpCode::MakeArray => ValueKind::Array(items),
                    OpCode::MakeList => ValueKind::List(items),
                    _ => ValueKind::Set(items),
                };
                stack.push(Value::new(kind, program.span_at(at)));
            }
            OpCode::MakeMap | OpCode::MakeStruct => {
                let flat = pop_n(&mut stack, arg * 2, at)?;
                let mut entries = IndexMap::with_capacity(arg);
                let mut iter = flat.into_iter();
                while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
                    match key.kind {
                        ValueKind::String(key) => {
                            entries.insert(key, value);
                        }
                        _ => return Err(corrupt("map key is not a string", at)),
                    }
                }
                let kind = if op == OpCode::MakeMap {
                    ValueKind::Map(entries)
                } else {
                    ValueKind::Struct(entries)
                };
                stack.push(Value::new(kind, program.span_at(at)));
            }
        }
    }

    let result = pop(&mut stack, pc)?;
    if !stack.is_empty() {
        return Err(corrupt("values left on the stack", pc));
    }
    Ok(result)
}

fn constant(program: &Program, index: usize, at: usize) -> Result<&Value, YiniError> {
    program
        .constants
        .get(index)
        .ok_or_else(|| corrupt(&format!("constant {} out of range", index), at))
}

fn pop(stack: &mut Vec<Value>, at: usize) -> Result<Value, YiniError> {
    stack.pop().ok_or_else(|| corrupt("stack underflow", at))
}

fn pop_n(stack: &mut Vec<Value>, count: usize, at: usize) -> Result<Vec<Value>, YiniError> {
    if stack.len() < count {
        return Err(corrupt("stack underflow", at));
    }
    Ok(stack.split_off(stack.len() - count))
}

fn corrupt(detail: &str, offset: usize) -> YiniError {
    YiniError::EvaluationError {
        message: format!("Invalid bytecode at offset {}: {}", offset, detail),
        span: None,
        hint: None,
        code: Some(508),
    }
}
