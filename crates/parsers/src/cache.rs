//! Hash-keyed cache of parsed Java files.
//!
//! The parser only depends on [`ParseCache`]; where entries live is up to
//! the implementation. [`MemoryParseCache`] lasts one run, [`FileParseCache`]
//! is persisted as JSON between runs.

use anyhow::{Context, Result};
use ir::ParsedJavaFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Lookup contract used by the parser. Implementations must be usable from
/// several parsing threads at once.
pub trait ParseCache: Send + Sync {
    fn get(&self, path: &str, content_hash: &str) -> Option<ParsedJavaFile>;
    fn put(&self, path: &str, content_hash: &str, artifact: ParsedJavaFile);
}

/// Hex blake3 digest of file content.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct MemoryParseCache {
    entries: RwLock<HashMap<(String, String), ParsedJavaFile>>,
}

impl MemoryParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        read_lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ParseCache for MemoryParseCache {
    fn get(&self, path: &str, content_hash: &str) -> Option<ParsedJavaFile> {
        read_lock(&self.entries)
            .get(&(path.to_string(), content_hash.to_string()))
            .cloned()
    }

    fn put(&self, path: &str, content_hash: &str, artifact: ParsedJavaFile) {
        write_lock(&self.entries).insert((path.to_string(), content_hash.to_string()), artifact);
    }
}

#[derive(Default, Serialize, Deserialize)]
struct CacheData {
    files: HashMap<String, ParsedJavaFile>,
}

/// Cache persisted as a single JSON document. One entry per path: a new hash
/// for the same path replaces the old artifact.
pub struct FileParseCache {
    path: PathBuf,
    data: RwLock<CacheData>,
}

impl FileParseCache {
    /// Loads the cache from disk; a missing or corrupted file yields an
    /// empty cache.
    pub fn load(path: &Path) -> Self {
        let data = fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str::<CacheData>(&s).ok())
            .unwrap_or_default();
        debug!(cache = %path.display(), entries = data.files.len(), "Parse cache loaded");
        Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
        }
    }

    pub fn len(&self) -> usize {
        read_lock(&self.data).files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops entries whose path does not satisfy `keep`.
    pub fn retain<F>(&self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        write_lock(&self.data).files.retain(|k, _| keep(k));
    }

    pub fn clear(&self) {
        write_lock(&self.data).files.clear();
    }

    /// Persists the cache. The document is written next to the target and
    /// renamed over it so readers never observe a partial file.
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let body = serde_json::to_string(&*read_lock(&self.data))
            .context("failed to serialize parse cache")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl ParseCache for FileParseCache {
    fn get(&self, path: &str, content_hash: &str) -> Option<ParsedJavaFile> {
        read_lock(&self.data)
            .files
            .get(path)
            .filter(|f| f.content_hash == content_hash)
            .cloned()
    }

    fn put(&self, path: &str, content_hash: &str, mut artifact: ParsedJavaFile) {
        artifact.content_hash = content_hash.to_string();
        write_lock(&self.data)
            .files
            .insert(path.to_string(), artifact);
    }
}
