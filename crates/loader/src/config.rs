//! Analysis configuration, read from JSON, YAML or TOML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 20;
const WORK_DIR: &str = ".dbscope";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported configuration format '{0}' (expected .json, .yaml, .yml or .toml)")]
    UnsupportedFormat(String),
    #[error("invalid exclude_files pattern '{0}'")]
    InvalidPattern(String),
}

/// A mapper convention declared in the configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StrategyConfig {
    pub name: String,
    pub layer: String,
    /// Filename suffixes, compared case-insensitively (`Repo.xml`).
    #[serde(default)]
    pub suffixes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTable {
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

fn default_source_file_types() -> Vec<String> {
    vec![".java".into(), ".xml".into()]
}

fn default_exclude_dirs() -> Vec<String> {
    ["target", "build", ".git", "node_modules", "test"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Configuration {
    pub target_project: PathBuf,
    #[serde(default = "default_source_file_types")]
    pub source_file_types: Vec<String>,
    /// Name of the SQL extraction strategy (`mybatis`, `mybatis_ccs` or a
    /// custom one).
    #[serde(default)]
    pub sql_wrapping_type: Option<String>,
    #[serde(default)]
    pub custom_strategies: Vec<StrategyConfig>,
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,
    /// Glob patterns matched against paths relative to the project root.
    #[serde(default)]
    pub exclude_files: Vec<String>,
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    #[serde(default)]
    pub access_tables: Vec<AccessTable>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(ext)),
        }
    }
}

impl Configuration {
    pub fn new(target_project: impl Into<PathBuf>) -> Self {
        Self {
            target_project: target_project.into(),
            source_file_types: default_source_file_types(),
            sql_wrapping_type: None,
            custom_strategies: Vec::new(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: Vec::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            access_tables: Vec::new(),
            cache_dir: None,
            output_dir: None,
        }
    }

    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        Ok(match format {
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Toml => toml::from_str(content)?,
        })
    }

    /// Reads the file, picking the format from its extension. Relative
    /// paths inside are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content, format)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_relative(base);
        debug!(config = %path.display(), target = %config.target_project.display(), "Configuration loaded");
        Ok(config)
    }

    fn resolve_relative(&mut self, base: &Path) {
        let join = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };
        self.target_project = join(&self.target_project);
        self.cache_dir = self.cache_dir.as_deref().map(join);
        self.output_dir = self.output_dir.as_deref().map(join);
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(|| self.target_project.join(WORK_DIR).join("cache"))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.target_project.join(WORK_DIR).join("results"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn json_defaults_fill_missing_fields() {
        let config =
            Configuration::parse(r#"{"target_project": "/srv/shop"}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config, Configuration::new("/srv/shop"));
        assert_eq!(config.cache_dir(), PathBuf::from("/srv/shop/.dbscope/cache"));
        assert_eq!(config.output_dir(), PathBuf::from("/srv/shop/.dbscope/results"));
    }

    #[test]
    fn yaml_and_toml_carry_strategies_and_tables() {
        let yaml = "target_project: shop\nsql_wrapping_type: repo\ncustom_strategies:\n  - name: repo\n    layer: repository\n    suffixes: [Repo.xml]\naccess_tables:\n  - table_name: USERS\n    columns: [email]\n";
        let config = Configuration::parse(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.sql_wrapping_type.as_deref(), Some("repo"));
        assert_eq!(config.custom_strategies[0].suffixes, vec!["Repo.xml"]);
        assert_eq!(config.access_tables[0].columns, vec!["email"]);

        let toml = "target_project = \"shop\"\nmax_call_depth = 5\nexclude_files = [\"**/*Test.java\"]\n";
        let config = Configuration::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.max_call_depth, 5);
        assert_eq!(config.exclude_files, vec!["**/*Test.java"]);
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"target_project": "project", "output_dir": "out", "sql_wrapping_type": "mybatis"}"#,
        )
        .unwrap();
        let config = Configuration::load(&path).unwrap();
        assert_eq!(config.target_project, dir.path().join("project"));
        assert_eq!(config.output_dir(), dir.path().join("out"));
        assert_eq!(config.cache_dir(), dir.path().join("project/.dbscope/cache"));
    }

    #[test]
    fn load_reports_format_and_io_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Configuration::load(&dir.path().join("config.ini")),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"
        ));
        assert!(matches!(
            Configuration::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io { .. })
        ));
        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "sql_wrapping_type: mybatis\n").unwrap();
        assert!(matches!(Configuration::load(&bad), Err(ConfigError::Yaml(_))));
    }
}
