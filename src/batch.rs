use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crate::ast::Document;
use crate::compiler::{CompileOptions, Compiler, FileLoader};
use crate::YiniError;

/// A failed file from [`compile_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub path: String,
    pub error: YiniError,
}

/// Append-only error collection shared by the workers of one batch.
#[derive(Debug, Default)]
pub struct ErrorSink {
    errors: Mutex<Vec<BatchError>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, path: impl Into<String>, error: YiniError) {
        let path = path.into();
        tracing::debug!(path = %path, code = ?error.code(), "batch compile failed");
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(BatchError { path, error });
    }

    pub fn len(&self) -> usize {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Everything collected so far, in arrival order.
    pub fn snapshot(&self) -> Vec<BatchError> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn into_errors(self) -> Vec<BatchError> {
        self.errors.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Compiles every path in `paths` on scoped worker threads.
///
/// Each file gets its own [`Compiler`] and [`Document`]; only the loader
/// and `sink` are shared. Successful documents come back in input order,
/// failures land in `sink`.
pub fn compile_all(
    loader: Arc<dyn FileLoader + Send + Sync>,
    paths: &[String],
    options: &CompileOptions,
    sink: &ErrorSink,
) -> Vec<(String, Document)> {
    if paths.is_empty() {
        return Vec::new();
    }

    let workers = thread::available_parallelism().map_or(1, |n| n.get()).min(paths.len());
    let chunk_size = paths.len().div_ceil(workers);
    tracing::debug!(files = paths.len(), workers, "starting batch compile");

    let chunks: Vec<Vec<Option<Document>>> = thread::scope(|scope| {
        let handles: Vec<_> = paths
            .chunks(chunk_size)
            .map(|chunk| {
                let compiler = Compiler::new()
                    .with_shared_loader(Arc::clone(&loader))
                    .with_options(options.clone());
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| match compiler.compile_file(path) {
                            Ok(doc) => Some(doc),
                            Err(error) => {
                                sink.push(path.clone(), error);
                                None
                            }
                        })
                        .collect::<Vec<Option<Document>>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(paths.chunks(chunk_size))
            .map(|(handle, chunk)| {
                handle.join().unwrap_or_else(|_| {
                    for path in chunk {
                        sink.push(
                            path.clone(),
                            YiniError::CompileError {
                                message: "Worker thread panicked".into(),
                                span: None,
                                hint: None,
                                code: None,
                            },
                        );
                    }
                    vec![None; chunk.len()]
                })
            })
            .collect()
    });

    paths
        .iter()
        .cloned()
        .zip(chunks.into_iter().flatten())
        .filter_map(|(path, doc)| doc.map(|doc| (path, doc)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::MemoryLoader;

    fn loader(count: usize) -> Arc<dyn FileLoader + Send + Sync> {
        let mut files = MemoryLoader::new();
        files.insert("shared.yini", "[#define]\nscale = 3\n");
        for i in 0..count {
            files.insert(
                format!("level{}.yini", i),
                format!("[#include]\n+= \"shared.yini\"\n[Level]\nid = {}\nsize = @scale * {}\n", i, i),
            );
        }
        files.insert("broken.yini", "[Level]\nsize = @missing\n");
        Arc::new(files)
    }

    #[test]
    fn test_compile_all_keeps_order() {
        let paths: Vec<String> = (0..12).map(|i| format!("level{}.yini", i)).collect();
        let sink = ErrorSink::new();
        let docs = compile_all(loader(12), &paths, &CompileOptions::default(), &sink);

        assert!(sink.is_empty());
        assert_eq!(docs.len(), 12);
        for (i, (path, doc)) in docs.iter().enumerate() {
            assert_eq!(path, &paths[i]);
            assert_eq!(doc.get("Level", "id").and_then(|v| v.as_i32()), Some(i as i32));
            assert_eq!(doc.get("Level", "size").and_then(|v| v.as_i32()), Some(3 * i as i32));
        }
    }

    #[test]
    fn test_failures_go_to_sink() {
        let paths = vec![
            "level0.yini".to_string(),
            "broken.yini".to_string(),
            "absent.yini".to_string(),
            "level1.yini".to_string(),
        ];
        let sink = ErrorSink::new();
        let docs = compile_all(loader(2), &paths, &CompileOptions::default(), &sink);

        let ok: Vec<_> = docs.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(ok, vec!["level0.yini", "level1.yini"]);

        let mut errors = sink.into_errors();
        errors.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "absent.yini");
        assert_eq!(errors[0].error.code(), Some(301));
        assert_eq!(errors[1].path, "broken.yini");
        assert_eq!(errors[1].error.code(), Some(308));
    }

    #[test]
    fn test_empty_batch() {
        let sink = ErrorSink::new();
        assert!(compile_all(loader(0), &[], &CompileOptions::default(), &sink).is_empty());
    }
}
