//! Result files shared between `analyze` and `list`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SOURCE_FILES: &str = "source_files.json";
pub const JAVA_PARSE_RESULTS: &str = "java_parse_results.json";
pub const SQL_EXTRACTION_RESULTS: &str = "sql_extraction_results.json";
pub const CALL_GRAPH: &str = "call_graph.json";
pub const TABLE_ACCESS_INFO: &str = "table_access_info.json";

/// Directory of JSON result documents.
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `name` through a temporary file renamed into place, so a
    /// failed run never leaves a truncated document behind.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!(".{name}.tmp"));
        let body = serde_json::to_vec_pretty(value)
            .with_context(|| format!("failed to serialize {name}"))?;
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &target)
            .with_context(|| format!("failed to replace {}", target.display()))?;
        debug!(file = %target.display(), "Result saved");
        Ok(())
    }

    /// `None` when the document does not exist yet.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let value = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(Some(value))
    }
}
