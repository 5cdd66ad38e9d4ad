//! Java source parser built on tree-sitter.
//!
//! [`JavaParser::parse`] reads a file, looks it up in the [`ParseCache`] by
//! content hash and only runs the grammar on a miss. The cached artifact is
//! the extracted [`ParsedJavaFile`], not the syntax tree.

use crate::cache::{content_hash, ParseCache};
use crate::ParserMetrics;
use ir::{JavaClass, ParsedJavaFile};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

mod extract;

pub use extract::extract_classes;

#[cfg(test)]
mod tests;

#[derive(Debug, Error)]
pub enum JavaParseError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("java grammar unavailable: {0}")]
    Grammar(String),
    #[error("syntax error in {path} at line {line}")]
    Syntax { path: String, line: usize },
}

/// Runs tree-sitter-java over `content`. A tree containing error or missing
/// nodes is rejected.
pub fn parse_tree(path: &str, content: &str) -> Result<Tree, JavaParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(tree_sitter_java::language())
        .map_err(|e| JavaParseError::Grammar(format!("{e:?}")))?;
    let tree = parser.parse(content, None).ok_or_else(|| JavaParseError::Syntax {
        path: path.to_string(),
        line: 1,
    })?;
    if let Some(node) = extract::first_error(tree.root_node()) {
        return Err(JavaParseError::Syntax {
            path: path.to_string(),
            line: node.start_position().row + 1,
        });
    }
    Ok(tree)
}

pub struct JavaParser {
    cache: Arc<dyn ParseCache>,
    files_parsed: AtomicUsize,
    cache_hits: AtomicUsize,
    parse_errors: AtomicUsize,
}

impl JavaParser {
    pub fn new(cache: Arc<dyn ParseCache>) -> Self {
        Self {
            cache,
            files_parsed: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            parse_errors: AtomicUsize::new(0),
        }
    }

    /// Parses one file from disk.
    pub fn parse(&self, path: &Path) -> Result<ParsedJavaFile, JavaParseError> {
        let key = path.to_string_lossy().into_owned();
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(source) => {
                self.parse_errors.fetch_add(1, Ordering::Relaxed);
                return Err(JavaParseError::Io { path: key, source });
            }
        };
        self.parse_source(&key, &content)
    }

    /// Parses already loaded content; `path` is the cache key and the file
    /// path recorded on every extracted class.
    pub fn parse_source(&self, path: &str, content: &str) -> Result<ParsedJavaFile, JavaParseError> {
        let hash = content_hash(content.as_bytes());
        if let Some(hit) = self.cache.get(path, &hash) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(file = %path, "Parse cache hit");
            return Ok(hit);
        }
        let tree = match parse_tree(path, content) {
            Ok(t) => t,
            Err(e) => {
                self.parse_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.files_parsed.fetch_add(1, Ordering::Relaxed);
        let mut parsed = extract_classes(tree.root_node(), content, path);
        parsed.content_hash = hash.clone();
        debug!(file = %path, classes = parsed.classes.len(), "Java file parsed");
        self.cache.put(path, &hash, parsed.clone());
        Ok(parsed)
    }

    /// Parses every file in parallel. Results keep the input order; failed
    /// files are logged and contribute nothing.
    pub fn parse_all(&self, paths: &[PathBuf]) -> Vec<ParsedJavaFile> {
        paths
            .par_iter()
            .map(|p| match self.parse(p) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!(file = %p.display(), error = %e, "Skipping unparsable Java file");
                    None
                }
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn metrics(&self) -> ParserMetrics {
        ParserMetrics {
            files_parsed: self.files_parsed.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
        }
    }
}

/// Flattens parsed files into their classes, preserving file order.
pub fn classes_of(files: &[ParsedJavaFile]) -> Vec<JavaClass> {
    files.iter().flat_map(|f| f.classes.iter().cloned()).collect()
}
