//! Descriptor of a file handed over by the collector.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Immutable record of a collected source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the project root, `path` itself when outside of it.
    pub relative_path: PathBuf,
    pub filename: String,
    /// Lowercase extension including the leading dot (`.java`).
    pub extension: String,
    pub size: u64,
    /// Modification time in seconds since the unix epoch.
    pub modified_time: u64,
}

impl SourceFile {
    /// Builds a descriptor reading size and modification time from disk.
    pub fn from_path(path: &Path, root: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let modified_time = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        let mut file = Self::new(path.to_path_buf(), meta.len(), modified_time);
        if let Ok(rel) = path.strip_prefix(root) {
            file.relative_path = rel.to_path_buf();
        }
        Ok(file)
    }

    /// Creates a descriptor from already known attributes.
    ///
    /// # Example
    /// ```
    /// use ir::SourceFile;
    /// let f = SourceFile::new("src/UserMapper.XML".into(), 10, 0);
    /// assert_eq!(f.extension, ".xml");
    /// assert_eq!(f.filename, "UserMapper.XML");
    /// ```
    pub fn new(path: PathBuf, size: u64, modified_time: u64) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        Self {
            relative_path: path.clone(),
            path,
            filename,
            extension,
            size,
            modified_time,
        }
    }

    pub fn is_java(&self) -> bool {
        self.extension == ".java"
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        self.filename
            .rsplit_once('.')
            .map_or(self.filename.as_str(), |(stem, _)| stem)
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}
