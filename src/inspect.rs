//! Position lookups over a parsed or compiled document, for hover and
//! completion features in an editor. Lines and columns are 1-based, like
//! every [`Span`] the parser records. `file` is the name the source was
//! compiled under (`None` for [`Compiler::compile`] without a file name);
//! sections merged in from includes only match their own file.
//!
//! [`Compiler::compile`]: crate::Compiler::compile

use serde::Serialize;

use crate::ast::{Document, Section, Span, ValueKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverInfo {
    pub section: String,
    /// `None` when the section header itself is hovered.
    pub key: Option<String>,
    pub type_name: Option<&'static str>,
    /// YINI text of the value, or the header line for a section.
    pub detail: String,
    /// The matching schema rule, if the section has one for this key.
    pub schema: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Section,
    Property,
    Macro,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completion {
    /// Text to insert.
    pub label: String,
    pub kind: CompletionKind,
    pub detail: String,
}

/// The section of `file` whose header is the closest one at or above
/// `line`.
pub fn section_at<'d>(doc: &'d Document, file: Option<&str>, line: usize) -> Option<&'d Section> {
    doc.sections
        .values()
        .filter(|s| s.span.file.as_deref() == file && s.span.line > 0 && s.span.line <= line)
        .max_by_key(|s| s.span.line)
}

fn covers(span: &Span, text: &str, line: usize, column: usize) -> bool {
    span.line == line && column >= span.column && column < span.column + text.chars().count()
}

pub fn hover(doc: &Document, file: Option<&str>, line: usize, column: usize) -> Option<HoverInfo> {
    let section = section_at(doc, file, line)?;
    let schema = doc.schemas.get(&section.name);

    if covers(&section.span, &section.name, line, column) {
        let mut detail = format!("[{}]", section.name);
        if !section.parents.is_empty() {
            detail.push_str(&format!(" : {}", section.parents.join(", ")));
        }
        return Some(HoverInfo {
            section: section.name.clone(),
            key: None,
            type_name: None,
            detail,
            schema: None,
            span: section.span.clone(),
        });
    }

    let (key, span) = section
        .key_spans
        .iter()
        .find(|(key, span)| span.file.as_deref() == file && covers(span, key, line, column))?;
    let value = section.get(key)?;
    Some(HoverInfo {
        section: section.name.clone(),
        key: Some(key.clone()),
        type_name: Some(value.type_name()),
        detail: value.to_string(),
        schema: schema.and_then(|s| s.get(key)).map(|rule| rule.to_string()),
        span: span.clone(),
    })
}

/// Candidates for the text being typed at `line`.
///
/// A `prefix` of the form `@{Section.` lists that section's keys; anything
/// else lists macros (`@name`), section names and the schema keys the
/// current section has not set yet, filtered by `prefix`.
pub fn completions(doc: &Document, file: Option<&str>, line: usize, prefix: &str) -> Vec<Completion> {
    if let Some((section, _)) = prefix.strip_prefix("@{").and_then(|rest| rest.split_once('.')) {
        let Some(target) = doc.section(section) else {
            return Vec::new();
        };
        return target
            .properties
            .iter()
            .map(|(key, value)| Completion {
                label: format!("@{{{}.{}}}", section, key),
                kind: CompletionKind::Property,
                detail: value.type_name().to_string(),
            })
            .filter(|c| c.label.starts_with(prefix))
            .collect();
    }

    let mut out = Vec::new();

    for (name, value) in &doc.macros {
        out.push(Completion {
            label: format!("@{}", name),
            kind: CompletionKind::Macro,
            detail: value.to_string(),
        });
    }

    for section in doc.sections.values().filter(|s| !s.is_special()) {
        out.push(Completion {
            label: section.name.clone(),
            kind: CompletionKind::Section,
            detail: format!("{} properties", section.properties.len()),
        });
    }

    if let Some(current) = section_at(doc, file, line)
        && let Some(schema) = doc.schemas.get(&current.name)
    {
        for (key, rule) in &schema.properties {
            if current.properties.contains_key(key) {
                continue;
            }
            let detail = match &rule.kind {
                ValueKind::Schema(def) => def.type_name.clone().unwrap_or_else(|| rule.to_string()),
                _ => rule.to_string(),
            };
            out.push(Completion {
                label: key.clone(),
                kind: CompletionKind::Property,
                detail,
            });
        }
    }

    out.retain(|c| c.label.starts_with(prefix));
    out
}
