use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{Document, Reference, ReferenceKind, Value, ValueKind};
use crate::parser::Parser;
use crate::YiniError;

mod bytecode;
mod tree;
mod vm;

pub use bytecode::{OpCode, Program};

/// Runtime values a Dyna expression can see.
pub trait EvalContext {
    /// Bare identifiers. `None` makes the identifier a literal string.
    fn resolve_variable(&self, name: &str) -> Option<Value>;
    fn resolve_reference(&self, reference: &Reference) -> Result<Value, YiniError>;
}

/// Plain variables; references are not available.
impl EvalContext for IndexMap<String, Value> {
    fn resolve_variable(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn resolve_reference(&self, reference: &Reference) -> Result<Value, YiniError> {
        Err(unresolved(reference))
    }
}

/// A compiled document as context: identifiers name macros, `Section.key`
/// identifiers and `@{Section.key}` read properties, `@name` reads macros.
impl EvalContext for Document {
    fn resolve_variable(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.macros.get(name) {
            return Some(value.clone());
        }
        let (section, key) = name.split_once('.')?;
        self.get(section, key).cloned()
    }

    fn resolve_reference(&self, reference: &Reference) -> Result<Value, YiniError> {
        let found = match reference.kind {
            ReferenceKind::Macro => self.macros.get(&reference.target),
            ReferenceKind::CrossSection => reference
                .section_key()
                .and_then(|(section, key)| self.get(section, key)),
            _ => None,
        };
        found.cloned().ok_or_else(|| unresolved(reference))
    }
}

fn unresolved(reference: &Reference) -> YiniError {
    YiniError::EvaluationError {
        message: format!("Cannot resolve {:?} reference '{}'", reference.kind, reference.target),
        span: None,
        hint: Some("Provide the value through the evaluation context".into()),
        code: Some(506),
    }
}

/// How [`Evaluator::evaluate`] runs an expression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Parse and walk the expression on every call.
    TreeWalk,
    /// Lower once to bytecode, cache by expression text, run on the VM.
    #[default]
    Bytecode,
}

/// Evaluates Dyna expressions. Compiled programs are cached per instance,
/// keyed by expression text; the cache is behind a mutex so one evaluator
/// can serve several threads.
#[derive(Debug, Default)]
pub struct Evaluator {
    cache: Mutex<HashMap<String, Arc<Program>>>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(&self, expression: &str, ctx: &dyn EvalContext, strategy: Strategy) -> Result<Value, YiniError> {
        match strategy {
            Strategy::TreeWalk => self.evaluate_tree(expression, ctx),
            Strategy::Bytecode => self.evaluate_bytecode(expression, ctx),
        }
    }

    /// Evaluates a `Dyna` value; any other value is returned as is.
    pub fn evaluate_dyna(&self, value: &Value, ctx: &dyn EvalContext, strategy: Strategy) -> Result<Value, YiniError> {
        match &value.kind {
            ValueKind::Dyna(expression) => self.evaluate(expression, ctx, strategy),
            _ => Ok(value.clone()),
        }
    }

    pub fn evaluate_tree(&self, expression: &str, ctx: &dyn EvalContext) -> Result<Value, YiniError> {
        let ast = Parser::parse_standalone_expression(expression)?;
        tree::eval(&ast, ctx)
    }

    pub fn evaluate_bytecode(&self, expression: &str, ctx: &dyn EvalContext) -> Result<Value, YiniError> {
        let program = self.program(expression)?;
        vm::run(&program, ctx)
    }

    /// The cached program for `expression`, compiling it on a miss.
    pub fn program(&self, expression: &str) -> Result<Arc<Program>, YiniError> {
        if let Some(program) = self.lock().get(expression) {
            return Ok(Arc::clone(program));
        }

        tracing::debug!(expression, "bytecode cache miss");
        let ast = Parser::parse_standalone_expression(expression)?;
        let program = Arc::new(Program::lower(&ast)?);
        self.lock().insert(expression.to_string(), Arc::clone(&program));
        Ok(program)
    }

    pub fn cached_programs(&self) -> usize {
        self.lock().len()
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Program>>> {
        // The cache holds no invariant a panic could break.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
