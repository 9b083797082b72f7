// Author: Dustin Pilgrim
// License: MIT

use std::env;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ast::{Span, Value, ValueKind};
use crate::YiniError;

/// Source of `${NAME}` values.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

/// Fixed variables, handy for tests and sandboxed compiles.
impl Environment for IndexMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Source of `%{key}` strings.
pub trait Localizer {
    fn get_string(&self, key: &str) -> Option<String>;
}

/// Knows no strings, so every key resolves to itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLocalizer;

impl Localizer for NoLocalizer {
    fn get_string(&self, _key: &str) -> Option<String> {
        None
    }
}

impl Localizer for IndexMap<String, String> {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// What `${NAME}` becomes when `NAME` is not set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingEnvPolicy {
    #[default]
    EmptyString,
    Error,
}

/// `${NAME}` resolver
pub fn resolve_env(
    env: &dyn Environment,
    name: &str,
    policy: MissingEnvPolicy,
    span: &Span,
) -> Result<Value, YiniError> {
    match env.var(name) {
        Some(value) => Ok(Value::new(ValueKind::String(value), span.clone())),
        None => match policy {
            MissingEnvPolicy::EmptyString => {
                tracing::debug!(name, "environment variable not set, using empty string");
                Ok(Value::new(ValueKind::String(String::new()), span.clone()))
            }
            MissingEnvPolicy::Error => Err(YiniError::CompileError {
                message: format!("Environment variable '{}' is not set", name),
                span: Some(span.clone()),
                hint: Some("Set the variable or use MissingEnvPolicy::EmptyString".into()),
                code: Some(305),
            }),
        },
    }
}

/// `%{key}` resolver; an unknown key stands for itself.
pub fn resolve_localization(localizer: &dyn Localizer, key: &str, span: &Span) -> Value {
    let text = localizer.get_string(key).unwrap_or_else(|| key.to_string());
    Value::new(ValueKind::String(text), span.clone())
}

// -- Tests --

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> IndexMap<String, String> {
        let mut vars = IndexMap::new();
        vars.insert("YINI_HOME".to_string(), "/opt/yini".to_string());
        vars
    }

    #[test]
    fn test_env_expansion() {
        let value = resolve_env(&vars(), "YINI_HOME", MissingEnvPolicy::Error, &Span::default()).unwrap();
        assert_eq!(value.as_str(), Some("/opt/yini"));
    }

    #[test]
    fn test_env_missing_empty_string() {
        let value = resolve_env(&vars(), "NOPE", MissingEnvPolicy::EmptyString, &Span::default()).unwrap();
        assert_eq!(value.as_str(), Some(""));
    }

    #[test]
    fn test_env_missing_error() {
        let err = resolve_env(&vars(), "NOPE", MissingEnvPolicy::Error, &Span::default()).unwrap_err();
        match err {
            YiniError::CompileError { code, .. } => assert_eq!(code, Some(305)),
            _ => panic!("Expected CompileError for missing env var"),
        }
    }

    #[test]
    fn test_process_env() {
        unsafe {
            std::env::set_var("YINI_RESOLVER_TEST", "hello_world");
        }
        assert_eq!(ProcessEnv.var("YINI_RESOLVER_TEST").as_deref(), Some("hello_world"));
    }

    #[test]
    fn test_localization_falls_back_to_key() {
        let mut strings = IndexMap::new();
        strings.insert("menu.title".to_string(), "Main Menu".to_string());
        assert_eq!(resolve_localization(&strings, "menu.title", &Span::default()).as_str(), Some("Main Menu"));
        assert_eq!(resolve_localization(&NoLocalizer, "menu.quit", &Span::default()).as_str(), Some("menu.quit"));
    }
}
