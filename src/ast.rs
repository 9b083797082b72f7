use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Where a token or value came from. `file` is shared between every span of
/// one compile so cloning a span never copies the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file: Option<Arc<str>>,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(file: Option<Arc<str>>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => write!(f, "{}:{}", self.line, self.column),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// `${NAME}`
    Environment,
    /// `@{Section.Key}`
    CrossSection,
    /// `@name`
    Macro,
    /// `%{key}`
    Localization,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub target: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, target: impl Into<String>) -> Self {
        Self { kind, target: target.into() }
    }

    /// Splits a cross-section target into `(section, key)`.
    pub fn section_key(&self) -> Option<(&str, &str)> {
        self.target.split_once('.')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub is_3d: bool,
}

impl Coord {
    pub fn new_2d(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0, is_3d: false }
    }

    pub fn new_3d(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, is_3d: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    /// `!`
    Required,
    /// `?`
    Optional,
}

/// What validation does when an optional property is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmptyBehavior {
    /// `~`
    Ignore,
    /// `e`
    Error,
    /// `=value`
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    pub requirement: Requirement,
    pub type_name: Option<String>,
    pub default: Option<Value>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub empty_behavior: EmptyBehavior,
}

impl Default for SchemaDefinition {
    fn default() -> Self {
        Self {
            requirement: Requirement::Optional,
            type_name: None,
            default: None,
            min: None,
            max: None,
            empty_behavior: EmptyBehavior::Ignore,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Integer(i32),
    Float(f32),
    Boolean(bool),
    String(String),
    Array(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// Fixed-key record; kept apart from `Map` through every stage.
    Struct(IndexMap<String, Value>),
    Color(Color),
    Coord(Coord),
    Path(String),
    Reference(Reference),
    /// Expression text evaluated later against a runtime context.
    Dyna(String),
    Binary(Box<Value>, BinaryOp, Box<Value>),
    Unary(UnaryOp, Box<Value>),
    Schema(Box<SchemaDefinition>),
}

/// A node of the value tree. Equality compares structure only, never spans.
#[derive(Debug, Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub span: Span,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Value {
    pub fn new(kind: ValueKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A value with no source position, for values built by code.
    pub fn bare(kind: ValueKind) -> Self {
        Self { kind, span: Span::default() }
    }

    pub fn int(v: i32) -> Self {
        Self::bare(ValueKind::Integer(v))
    }

    pub fn float(v: f32) -> Self {
        Self::bare(ValueKind::Float(v))
    }

    pub fn boolean(v: bool) -> Self {
        Self::bare(ValueKind::Boolean(v))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self::bare(ValueKind::String(v.into()))
    }

    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Integer(_) => "int",
            ValueKind::Float(_) => "float",
            ValueKind::Boolean(_) => "bool",
            ValueKind::String(_) => "string",
            ValueKind::Array(_) => "array",
            ValueKind::List(_) => "list",
            ValueKind::Set(_) => "set",
            ValueKind::Map(_) => "map",
            ValueKind::Struct(_) => "struct",
            ValueKind::Color(_) => "color",
            ValueKind::Coord(_) => "coord",
            ValueKind::Path(_) => "path",
            ValueKind::Reference(_) => "reference",
            ValueKind::Dyna(_) => "dyna",
            ValueKind::Binary(..) => "binary expression",
            ValueKind::Unary(..) => "unary expression",
            ValueKind::Schema(_) => "schema",
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self.kind {
            ValueKind::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Numeric value widened to `f64`; integers and floats only.
    pub fn as_number(&self) -> Option<f64> {
        match self.kind {
            ValueKind::Integer(i) => Some(i as f64),
            ValueKind::Float(f) => Some(f as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// True when the tree holds no references or unfolded expressions.
    /// Dyna nodes count as resolved.
    pub fn is_resolved(&self) -> bool {
        match &self.kind {
            ValueKind::Reference(_) | ValueKind::Binary(..) | ValueKind::Unary(..) => false,
            ValueKind::Array(items) | ValueKind::List(items) | ValueKind::Set(items) => {
                items.iter().all(Value::is_resolved)
            }
            ValueKind::Map(entries) | ValueKind::Struct(entries) => {
                entries.values().all(Value::is_resolved)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Section {
    pub name: String,
    pub parents: Vec<String>,
    pub properties: IndexMap<String, Value>,
    /// Values appended with `+=`, in declaration order.
    pub registry: Vec<Value>,
    pub span: Span,
    pub key_spans: IndexMap<String, Span>,
}

impl PartialEq for Section {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parents == other.parents
            && self.properties == other.properties
            && self.registry == other.registry
    }
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// `#define`, `#include` and other `#` headers.
    pub fn is_special(&self) -> bool {
        self.name.starts_with('#')
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.properties.insert(key.into(), value);
    }

    /// Folds a re-declaration of the same section into this one: incoming
    /// properties win, registry entries are appended, parents accumulate.
    pub fn merge_from(&mut self, other: Section) {
        for (key, value) in other.properties {
            self.properties.insert(key, value);
        }
        for (key, span) in other.key_spans {
            self.key_spans.insert(key, span);
        }
        self.registry.extend(other.registry);
        for parent in other.parents {
            if !self.parents.contains(&parent) {
                self.parents.push(parent);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sections: IndexMap<String, Section>,
    pub macros: IndexMap<String, Value>,
    pub schemas: IndexMap<String, Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.get_mut(name)
    }

    /// Looks up `section.key`.
    pub fn get(&self, section: &str, key: &str) -> Option<&Value> {
        self.sections.get(section).and_then(|s| s.properties.get(key))
    }

    /// Adds `section`, merging into an existing section of the same name.
    pub fn insert_section(&mut self, section: Section) {
        match self.sections.get_mut(&section.name) {
            Some(existing) => existing.merge_from(section),
            None => {
                self.sections.insert(section.name.clone(), section);
            }
        }
    }

    pub fn insert_schema(&mut self, schema: Section) {
        match self.schemas.get_mut(&schema.name) {
            Some(existing) => existing.merge_from(schema),
            None => {
                self.schemas.insert(schema.name.clone(), schema);
            }
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.sections.values().all(|s| {
            s.properties.values().all(Value::is_resolved) && s.registry.iter().all(Value::is_resolved)
        })
    }
}
