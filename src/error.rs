use std::fmt;

use thiserror::Error;

use crate::ast::Span;

/// Which schema rule a [`YiniError::ValidationError`] tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    MissingSection,
    MissingProperty,
    TypeMismatch,
    RangeError,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValidationKind::MissingSection => "missing section",
            ValidationKind::MissingProperty => "missing property",
            ValidationKind::TypeMismatch => "type mismatch",
            ValidationKind::RangeError => "range violation",
        };
        f.write_str(name)
    }
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map_or(String::new(), |h| format!(" Hint: {}", h))
}

fn code_suffix(code: &Option<u32>) -> String {
    code.map_or(String::new(), |c| format!(" Code: {}", c))
}

fn at_suffix(span: &Option<Span>) -> String {
    span.as_ref().map_or(String::new(), |s| format!(" at {}", s))
}

/// The main error type for YINI lexing, parsing, compiling, validation,
/// evaluation and the binary codec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum YiniError {
    /// Raised for characters the lexer cannot start a token with, and for
    /// unterminated strings or block comments.
    #[error("[YINI] Lex Error at {span}: {message} '{character}'{}{}", hint_suffix(.hint), code_suffix(.code))]
    LexError {
        character: char,
        message: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("[YINI] Parse Error at {span}: {message}, found {found}{}{}", hint_suffix(.hint), code_suffix(.code))]
    ParseError {
        message: String,
        found: String,
        span: Span,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Undefined macros, unresolved references and inheritance/reference cycles.
    #[error("[YINI] Compile Error{}: {message}{}{}", at_suffix(.span), hint_suffix(.hint), code_suffix(.code))]
    CompileError {
        message: String,
        span: Option<Span>,
        hint: Option<String>,
        code: Option<u32>,
    },
    /// Arithmetic type mismatches, division by zero and overflow, raised both
    /// while folding at compile time and while evaluating Dyna expressions.
    #[error("[YINI] Evaluation Error{}: {message}{}{}", at_suffix(.span), hint_suffix(.hint), code_suffix(.code))]
    EvaluationError {
        message: String,
        span: Option<Span>,
        hint: Option<String>,
        code: Option<u32>,
    },
    #[error("[YINI] Validation Error ({kind}) in [{section}]: {message}{}", code_suffix(.code))]
    ValidationError {
        kind: ValidationKind,
        message: String,
        section: String,
        property: Option<String>,
        code: Option<u32>,
    },
    #[error("[YINI] Format Error at byte {offset}: {message}{}", code_suffix(.code))]
    FormatError {
        message: String,
        offset: usize,
        code: Option<u32>,
    },
    #[error("[YINI] File Error '{path}': {message}{}{}", hint_suffix(.hint), code_suffix(.code))]
    FileError {
        message: String,
        path: String,
        hint: Option<String>,
        code: Option<u32>,
    },
}

impl YiniError {
    pub(crate) fn compile(message: impl Into<String>, span: &Span, code: u32) -> Self {
        YiniError::CompileError {
            message: message.into(),
            span: Some(span.clone()),
            hint: None,
            code: Some(code),
        }
    }

    pub(crate) fn evaluation(message: impl Into<String>, span: &Span, code: u32) -> Self {
        YiniError::EvaluationError {
            message: message.into(),
            span: Some(span.clone()),
            hint: None,
            code: Some(code),
        }
    }

    pub(crate) fn format(message: impl Into<String>, offset: usize, code: u32) -> Self {
        YiniError::FormatError {
            message: message.into(),
            offset,
            code: Some(code),
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            YiniError::LexError { code, .. }
            | YiniError::ParseError { code, .. }
            | YiniError::CompileError { code, .. }
            | YiniError::EvaluationError { code, .. }
            | YiniError::ValidationError { code, .. }
            | YiniError::FormatError { code, .. }
            | YiniError::FileError { code, .. } => *code,
        }
    }

    /// Source position of the failure, when the error has one.
    pub fn span(&self) -> Option<&Span> {
        match self {
            YiniError::LexError { span, .. } | YiniError::ParseError { span, .. } => Some(span),
            YiniError::CompileError { span, .. } | YiniError::EvaluationError { span, .. } => {
                span.as_ref()
            }
            _ => None,
        }
    }

    pub fn validation_kind(&self) -> Option<ValidationKind> {
        match self {
            YiniError::ValidationError { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
