use crate::ast::{BinaryOp, Span, UnaryOp, Value, ValueKind};
use crate::YiniError;

/// One-byte instructions. Push and make instructions carry a little-endian
/// `u16` operand: a constant-pool index for pushes, an element count for
/// container builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Halt = 0,
    PushInt = 1,
    PushFloat = 2,
    PushString = 3,
    PushBool = 4,
    /// Looks the constant up as a variable, falling back to the string.
    PushVar = 5,
    /// Colors, coords, paths and nested Dyna values.
    PushConst = 6,
    PushRef = 7,
    Add = 10,
    Sub = 11,
    Mul = 12,
    Div = 13,
    Mod = 14,
    Neg = 15,
    MakeArray = 20,
    MakeList = 21,
    MakeSet = 22,
    /// Pops `count` key/value pairs; keys were pushed with `PushString`.
    MakeMap = 23,
    MakeStruct = 24,
}

impl OpCode {
    pub fn has_operand(self) -> bool {
        !matches!(
            self,
            OpCode::Halt | OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod | OpCode::Neg
        )
    }

    pub(super) fn binary(self) -> Option<BinaryOp> {
        match self {
            OpCode::Add => Some(BinaryOp::Add),
            OpCode::Sub => Some(BinaryOp::Sub),
            OpCode::Mul => Some(BinaryOp::Mul),
            OpCode::Div => Some(BinaryOp::Div),
            OpCode::Mod => Some(BinaryOp::Mod),
            _ => None,
        }
    }
}

impl From<BinaryOp> for OpCode {
    fn from(op: BinaryOp) -> Self {
        match op {
            BinaryOp::Add => OpCode::Add,
            BinaryOp::Sub => OpCode::Sub,
            BinaryOp::Mul => OpCode::Mul,
            BinaryOp::Div => OpCode::Div,
            BinaryOp::Mod => OpCode::Mod,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Ok(match byte {
            0 => OpCode::Halt,
            1 => OpCode::PushInt,
            2 => OpCode::PushFloat,
            3 => OpCode::PushString,
            4 => OpCode::PushBool,
            5 => OpCode::PushVar,
            6 => OpCode::PushConst,
            7 => OpCode::PushRef,
            10 => OpCode::Add,
            11 => OpCode::Sub,
            12 => OpCode::Mul,
            13 => OpCode::Div,
            14 => OpCode::Mod,
            15 => OpCode::Neg,
            20 => OpCode::MakeArray,
            21 => OpCode::MakeList,
            22 => OpCode::MakeSet,
            23 => OpCode::MakeMap,
            24 => OpCode::MakeStruct,
            other => return Err(other),
        })
    }
}

/// A lowered expression: constant pool, instruction stream, and the source
/// span of each value-producing instruction for error reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub constants: Vec<Value>,
    pub code: Vec<u8>,
    spans: Vec<(usize, Span)>,
}

impl Program {
    /// Lowers a parsed expression. Every node the tree-walker accepts has
    /// an encoding, so the two stay interchangeable.
    pub fn lower(ast: &Value) -> Result<Self, YiniError> {
        let mut program = Program::default();
        program.emit_node(ast)?;
        program.code.push(OpCode::Halt as u8);
        Ok(program)
    }

    /// Span recorded for the instruction at `offset`.
    pub(super) fn span_at(&self, offset: usize) -> Span {
        self.spans
            .binary_search_by_key(&offset, |(at, _)| *at)
            .map(|i| self.spans[i].1.clone())
            .unwrap_or_default()
    }

    fn emit_node(&mut self, node: &Value) -> Result<(), YiniError> {
        match &node.kind {
            ValueKind::Integer(_) => self.emit_push(OpCode::PushInt, node.clone()),
            ValueKind::Float(_) => self.emit_push(OpCode::PushFloat, node.clone()),
            ValueKind::Boolean(_) => self.emit_push(OpCode::PushBool, node.clone()),
            ValueKind::String(_) => self.emit_push(OpCode::PushVar, node.clone()),
            ValueKind::Reference(_) => self.emit_push(OpCode::PushRef, node.clone()),
            ValueKind::Color(_) | ValueKind::Coord(_) | ValueKind::Path(_) | ValueKind::Dyna(_) => {
                self.emit_push(OpCode::PushConst, node.clone())
            }
            ValueKind::Binary(left, op, right) => {
                self.emit_node(left)?;
                self.emit_node(right)?;
                self.emit_op(OpCode::from(*op), &node.span);
                Ok(())
            }
            ValueKind::Unary(UnaryOp::Neg, operand) => {
                self.emit_node(operand)?;
                self.emit_op(OpCode::Neg, &node.span);
                Ok(())
            }
            ValueKind::Array(items) => self.emit_items(OpCode::MakeArray, items, &node.span),
            ValueKind::List(items) => self.emit_items(OpCode::MakeList, items, &node.span),
            ValueKind::Set(items) => self.emit_items(OpCode::MakeSet, items, &node.span),
            ValueKind::Map(entries) | ValueKind::Struct(entries) => {
                let op = if matches!(node.kind, ValueKind::Map(_)) {
                    OpCode::MakeMap
                } else {
                    OpCode::MakeStruct
                };
                for (key, value) in entries {
                    self.emit_push(OpCode::PushString, Value::new(ValueKind::String(key.clone()), node.span.clone()))?;
                    self.emit_node(value)?;
                }
                let count = operand(entries.len(), &node.span)?;
                self.emit_with_operand(op, count, &node.span);
                Ok(())
            }
            ValueKind::Schema(_) => Err(YiniError::evaluation(
                "Schema definitions cannot be evaluated",
                &node.span,
                505,
            )),
        }
    }

    fn emit_push(&mut self, op: OpCode, constant: Value) -> Result<(), YiniError> {
        let index = operand(self.constants.len(), &constant.span)?;
        let span = constant.span.clone();
        self.constants.push(constant);
        self.emit_with_operand(op, index, &span);
        Ok(())
    }

    fn emit_items(&mut self, op: OpCode, items: &[Value], span: &Span) -> Result<(), YiniError> {
        for item in items {
            self.emit_node(item)?;
        }
        let count = operand(items.len(), span)?;
        self.emit_with_operand(op, count, span);
        Ok(())
    }

    fn emit_op(&mut self, op: OpCode, span: &Span) {
        self.spans.push((self.code.len(), span.clone()));
        self.code.push(op as u8);
    }

    fn emit_with_operand(&mut self, op: OpCode, value: u16, span: &Span) {
        self.emit_op(op, span);
        self.code.extend_from_slice(&value.to_le_bytes());
    }
}

fn operand(value: usize, span: &Span) -> Result<u16, YiniError> {
    u16::try_from(value).map_err(|_| YiniError::evaluation("Expression is too large to compile", span, 507))
}
