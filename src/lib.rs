pub mod ast;
pub mod batch;
pub mod codec;
pub mod compiler;
pub mod error;
pub mod eval;
pub mod export;
pub mod inspect;
pub mod lexer;
pub mod ops;
pub mod parser;
pub mod patch;
pub mod resolver;
pub mod serializer;
pub mod validator;

pub use ast::{Document, Section, Span, Value, ValueKind};
pub use codec::{decode, encode};
pub use compiler::{CompileOptions, Compiler, FileLoader, FsLoader, MemoryLoader};
pub use error::{ValidationKind, YiniError};
pub use eval::{EvalContext, Evaluator, Strategy};
pub use patch::apply_patch;
pub use resolver::{Environment, Localizer, MissingEnvPolicy, ProcessEnv};
pub use serializer::to_yini_string;
pub use validator::validate;
