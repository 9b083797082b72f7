// Author: Dustin Pilgrim
// License: MIT

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ast::{Document, ValueKind};
use crate::parser::Parser;
use crate::resolver::{Environment, Localizer, MissingEnvPolicy, NoLocalizer, ProcessEnv};
use crate::YiniError;

mod loader;
mod resolve;

pub use loader::{FileLoader, FsLoader, MemoryLoader};

pub(crate) const DEFINE: &str = "#define";
pub(crate) const INCLUDE: &str = "#include";

/// Knobs for one compile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// What `${NAME}` becomes when `NAME` is unset.
    pub missing_env: MissingEnvPolicy,
    /// Stamped into every span of the root source.
    pub file_name: Option<String>,
}

/// Turns YINI source into a resolved [`Document`]: expands includes,
/// gathers and resolves macros, applies section inheritance, resolves
/// references and folds arithmetic. Dyna values are left as they are.
///
/// A `Compiler` holds no per-compile state, so one instance can compile
/// any number of sources.
///
/// # Example
/// ```
/// use yini_cfg::Compiler;
///
/// let doc = Compiler::new().compile("[A]\nval = 1 + 2 * 3\n").unwrap();
/// assert_eq!(doc.get("A", "val").and_then(|v| v.as_i32()), Some(7));
/// ```
pub struct Compiler {
    loader: Arc<dyn FileLoader + Send + Sync>,
    localizer: Arc<dyn Localizer + Send + Sync>,
    environment: Arc<dyn Environment + Send + Sync>,
    options: CompileOptions,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Filesystem includes relative to the working directory, the process
    /// environment and no localization strings.
    pub fn new() -> Self {
        Self {
            loader: Arc::new(FsLoader::default()),
            localizer: Arc::new(NoLocalizer),
            environment: Arc::new(ProcessEnv),
            options: CompileOptions::default(),
        }
    }

    pub fn with_loader<L: FileLoader + Send + Sync + 'static>(mut self, loader: L) -> Self {
        self.loader = Arc::new(loader);
        self
    }

    /// Shares one loader between several compilers.
    pub fn with_shared_loader(mut self, loader: Arc<dyn FileLoader + Send + Sync>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_localizer<L: Localizer + Send + Sync + 'static>(mut self, localizer: L) -> Self {
        self.localizer = Arc::new(localizer);
        self
    }

    pub fn with_environment<E: Environment + Send + Sync + 'static>(mut self, environment: E) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles source text. Includes are looked up relative to the
    /// directory of `options.file_name`, if set.
    pub fn compile(&self, source: &str) -> Result<Document, YiniError> {
        let file = self.options.file_name.clone();
        let mut loaded = HashSet::new();
        if let Some(file) = &file {
            loaded.insert(normalize_path(Path::new(file)));
        }

        let mut doc = self.parse_and_merge(source, file.as_deref(), &mut loaded)?;
        self.resolve_document(&mut doc)?;
        Ok(doc)
    }

    /// Loads `path` through the loader and compiles it.
    pub fn compile_file(&self, path: &str) -> Result<Document, YiniError> {
        if !self.loader.exists(path) {
            return Err(YiniError::FileError {
                message: "File not found".into(),
                path: path.to_string(),
                hint: Some("Check the path passed to compile_file".into()),
                code: Some(301),
            });
        }
        let source = self.loader.load(path)?;

        let mut loaded = HashSet::new();
        loaded.insert(normalize_path(Path::new(path)));
        let mut doc = self.parse_and_merge(&source, Some(path), &mut loaded)?;
        self.resolve_document(&mut doc)?;
        Ok(doc)
    }

    /// Resolves a parsed (or decoded, or patched) document in place.
    /// Running it over an already resolved document changes nothing.
    pub fn resolve_document(&self, doc: &mut Document) -> Result<(), YiniError> {
        resolve::Resolution::new(self, doc).run()
    }

    fn parse_and_merge(
        &self,
        source: &str,
        file: Option<&str>,
        loaded: &mut HashSet<String>,
    ) -> Result<Document, YiniError> {
        let mut parser = Parser::with_file(source, file.map(Arc::from))?;
        let current = parser.parse_document()?;

        let Some(include) = current.section(INCLUDE) else {
            return Ok(current);
        };

        let base_dir = file
            .and_then(|f| Path::new(f).parent())
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut merged = Document::new();
        for entry in &include.registry {
            let name = match &entry.kind {
                ValueKind::String(s) | ValueKind::Path(s) => s.as_str(),
                _ => {
                    return Err(YiniError::CompileError {
                        message: format!("Include entries must be paths, found {}", entry.type_name()),
                        span: Some(entry.span.clone()),
                        hint: Some("Write += \"file.yini\" or += Path(\"file.yini\")".into()),
                        code: Some(306),
                    });
                }
            };

            let full_path = if name.starts_with("~/") || Path::new(name).is_absolute() {
                normalize_path(Path::new(name))
            } else {
                normalize_path(&base_dir.join(name))
            };

            if !loaded.insert(full_path.clone()) {
                tracing::debug!(path = %full_path, "include already loaded, skipping");
                continue;
            }
            if !self.loader.exists(&full_path) {
                return Err(YiniError::FileError {
                    message: "Include file not found".into(),
                    path: full_path,
                    hint: Some("Include paths are relative to the including file".into()),
                    code: Some(301),
                });
            }

            tracing::debug!(path = %full_path, "loading include");
            let text = self.loader.load(&full_path)?;
            let included = self.parse_and_merge(&text, Some(&full_path), loaded)?;
            merge_documents(&mut merged, included);
        }

        merge_documents(&mut merged, current);
        Ok(merged)
    }
}

/// Collapses `.` and `..` without touching the filesystem, so one file
/// reached through two spellings (`sub/../a.yini`, `a.yini`) has one key in
/// the loaded set.
fn normalize_path(path: &Path) -> String {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().to_string()
}

/// Folds `source` into `target`; on key collisions `source` wins.
fn merge_documents(target: &mut Document, source: Document) {
    for (_, section) in source.sections {
        target.insert_section(section);
    }
    for (name, value) in source.macros {
        target.macros.insert(name, value);
    }
    for (_, schema) in source.schemas {
        target.insert_schema(schema);
    }
}
