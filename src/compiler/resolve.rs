use std::collections::HashSet;

use indexmap::IndexMap;

use super::{Compiler, DEFINE};
use crate::ast::{Document, Reference, ReferenceKind, Span, Value, ValueKind};
use crate::{ops, resolver, YiniError};

/// State for resolving one document. Sections and macros each get a
/// resolved set and a currently-resolving set; meeting a name that is
/// still resolving means a cycle.
pub(super) struct Resolution<'a> {
    compiler: &'a Compiler,
    doc: &'a mut Document,
    resolved: HashSet<String>,
    resolving: HashSet<String>,
    macros_resolved: HashSet<String>,
    macros_resolving: HashSet<String>,
}

impl<'a> Resolution<'a> {
    pub(super) fn new(compiler: &'a Compiler, doc: &'a mut Document) -> Self {
        Self {
            compiler,
            doc,
            resolved: HashSet::new(),
            resolving: HashSet::new(),
            macros_resolved: HashSet::new(),
            macros_resolving: HashSet::new(),
        }
    }

    pub(super) fn run(mut self) -> Result<(), YiniError> {
        if let Some(define) = self.doc.sections.get(DEFINE) {
            let defines = define.properties.clone();
            self.doc.macros.extend(defines);
        }

        let macro_names: Vec<String> = self.doc.macros.keys().cloned().collect();
        for name in &macro_names {
            self.resolve_macro(name, &Span::default())?;
        }

        let section_names: Vec<String> = self
            .doc
            .sections
            .keys()
            .filter(|name| !name.starts_with('#'))
            .cloned()
            .collect();
        for name in &section_names {
            self.resolve_section(name)?;
        }

        // Defaults and bounds may use macros or point at data sections.
        let mut schemas = std::mem::take(&mut self.doc.schemas);
        for schema in schemas.values_mut() {
            let properties = std::mem::take(&mut schema.properties);
            schema.properties = self.resolve_map(properties)?;
        }
        self.doc.schemas = schemas;

        tracing::debug!(
            sections = section_names.len(),
            macros = macro_names.len(),
            "document resolved"
        );
        Ok(())
    }

    fn resolve_section(&mut self, name: &str) -> Result<(), YiniError> {
        if self.resolved.contains(name) {
            return Ok(());
        }

        let Some(section) = self.doc.sections.get(name) else {
            return Err(YiniError::CompileError {
                message: format!("Section '{}' not found", name),
                span: None,
                hint: None,
                code: Some(303),
            });
        };

        if self.resolving.contains(name) {
            return Err(YiniError::CompileError {
                message: format!("Circular inheritance detected: {}", name),
                span: Some(section.span.clone()),
                hint: Some("A section cannot inherit from itself, directly or through its parents".into()),
                code: Some(302),
            });
        }

        let parents = section.parents.clone();
        let section_span = section.span.clone();
        self.resolving.insert(name.to_string());
        tracing::trace!(section = name, "resolving section");

        for parent in &parents {
            if !self.doc.sections.contains_key(parent) {
                return Err(YiniError::CompileError {
                    message: format!("Parent section '{}' of '{}' not found", parent, name),
                    span: Some(section_span),
                    hint: Some("Declare the parent section or fix its name".into()),
                    code: Some(303),
                });
            }
            self.resolve_section(parent)?;

            // Earlier parents fill first, so they win over later ones.
            let inherited = self.doc.sections[parent.as_str()].properties.clone();
            if let Some(child) = self.doc.sections.get_mut(name) {
                for (key, value) in inherited {
                    if !child.properties.contains_key(&key) {
                        child.properties.insert(key, value);
                    }
                }
            }
        }

        let (properties, registry) = match self.doc.sections.get_mut(name) {
            Some(section) => (
                std::mem::take(&mut section.properties),
                std::mem::take(&mut section.registry),
            ),
            None => return Ok(()),
        };
        let properties = self.resolve_map(properties)?;
        let registry = self.resolve_list(registry)?;
        if let Some(section) = self.doc.sections.get_mut(name) {
            section.properties = properties;
            section.registry = registry;
        }

        self.resolving.remove(name);
        self.resolved.insert(name.to_string());
        Ok(())
    }

    fn resolve_value(&mut self, value: Value) -> Result<Value, YiniError> {
        let Value { kind, span } = value;
        let kind = match kind {
            ValueKind::Reference(reference) => return self.resolve_reference(&reference, &span),
            ValueKind::Binary(left, op, right) => {
                let left = self.resolve_value(*left)?;
                let right = self.resolve_value(*right)?;
                return ops::binary(&left, op, &right, &span);
            }
            ValueKind::Unary(op, operand) => {
                let operand = self.resolve_value(*operand)?;
                return ops::unary(op, &operand, &span);
            }
            ValueKind::Array(items) => ValueKind::Array(self.resolve_list(items)?),
            ValueKind::List(items) => ValueKind::List(self.resolve_list(items)?),
            ValueKind::Set(items) => ValueKind::Set(self.resolve_list(items)?),
            ValueKind::Map(entries) => ValueKind::Map(self.resolve_map(entries)?),
            ValueKind::Struct(fields) => ValueKind::Struct(self.resolve_map(fields)?),
            ValueKind::Schema(mut def) => {
                def.default = self.resolve_optional(def.default.take())?;
                def.min = self.resolve_optional(def.min.take())?;
                def.max = self.resolve_optional(def.max.take())?;
                ValueKind::Schema(def)
            }
            // Dyna text is evaluated later, never here.
            other => other,
        };
        Ok(Value::new(kind, span))
    }

    fn resolve_list(&mut self, items: Vec<Value>) -> Result<Vec<Value>, YiniError> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(self.resolve_value(item)?);
        }
        Ok(out)
    }

    fn resolve_map(&mut self, entries: IndexMap<String, Value>) -> Result<IndexMap<String, Value>, YiniError> {
        let mut out = IndexMap::with_capacity(entries.len());
        for (key, value) in entries {
            out.insert(key, self.resolve_value(value)?);
        }
        Ok(out)
    }

    fn resolve_optional(&mut self, value: Option<Value>) -> Result<Option<Value>, YiniError> {
        value.map(|v| self.resolve_value(v)).transpose()
    }

    fn resolve_reference(&mut self, reference: &Reference, span: &Span) -> Result<Value, YiniError> {
        match reference.kind {
            ReferenceKind::Macro => self.resolve_macro(&reference.target, span),
            ReferenceKind::Environment => resolver::resolve_env(
                self.compiler.environment.as_ref(),
                &reference.target,
                self.compiler.options.missing_env,
                span,
            ),
            ReferenceKind::Localization => Ok(resolver::resolve_localization(
                self.compiler.localizer.as_ref(),
                &reference.target,
                span,
            )),
            ReferenceKind::CrossSection => self.resolve_cross_section(reference, span),
        }
    }

    fn resolve_cross_section(&mut self, reference: &Reference, span: &Span) -> Result<Value, YiniError> {
        let Some((section, key)) = reference.section_key() else {
            return Err(YiniError::CompileError {
                message: format!("Invalid section reference '{}'", reference.target),
                span: Some(span.clone()),
                hint: Some("Use @{Section.Key}".into()),
                code: Some(307),
            });
        };

        if self.resolving.contains(section) {
            return Err(YiniError::CompileError {
                message: format!("Circular reference through section '{}'", section),
                span: Some(span.clone()),
                hint: Some("Section references must not loop back to a section that is still being resolved".into()),
                code: Some(304),
            });
        }
        if !self.doc.sections.contains_key(section) {
            return Err(YiniError::compile(
                format!("Reference not found: {}", reference.target),
                span,
                307,
            ));
        }

        self.resolve_section(section)?;
        match self.doc.get(section, key) {
            Some(value) => Ok(Value::new(value.kind.clone(), span.clone())),
            None => Err(YiniError::compile(
                format!("Reference not found: {}", reference.target),
                span,
                307,
            )),
        }
    }

    /// Macros resolve on first use; the result is written back to the macro
    /// table and to the `[#define]` section.
    fn resolve_macro(&mut self, name: &str, span: &Span) -> Result<Value, YiniError> {
        if self.macros_resolved.contains(name) {
            if let Some(value) = self.doc.macros.get(name) {
                return Ok(Value::new(value.kind.clone(), span.clone()));
            }
        }
        if self.macros_resolving.contains(name) {
            return Err(YiniError::compile(format!("Circular macro definition: @{}", name), span, 304));
        }

        let Some(raw) = self.doc.macros.get(name).cloned() else {
            return Err(YiniError::CompileError {
                message: format!("Undefined macro: @{}", name),
                span: Some(span.clone()),
                hint: Some("Define it in a [#define] section".into()),
                code: Some(308),
            });
        };

        self.macros_resolving.insert(name.to_string());
        let resolved = self.resolve_value(raw)?;
        self.macros_resolving.remove(name);
        self.macros_resolved.insert(name.to_string());

        self.doc.macros.insert(name.to_string(), resolved.clone());
        if let Some(define) = self.doc.sections.get_mut(DEFINE) {
            if define.properties.contains_key(name) {
                define.properties.insert(name.to_string(), resolved.clone());
            }
        }
        Ok(Value::new(resolved.kind, span.clone()))
    }
}
