//! Mapper conventions as plain values.
//!
//! A strategy is a file predicate (lowercase filename suffixes on `.xml`
//! files) plus the layer label its statements are reported under. Every
//! strategy shares the same extraction code.

use crate::error::ConfigurationError;
use ir::SourceFile;
use loader::StrategyConfig;
use serde::Serialize;

pub const MYBATIS: &str = "mybatis";
pub const MYBATIS_CCS: &str = "mybatis_ccs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlStrategy {
    pub name: String,
    pub layer: String,
    suffixes: Vec<String>,
}

impl SqlStrategy {
    /// Suffixes are matched case-insensitively; `.xml` is appended when
    /// missing.
    pub fn new<I, S>(name: &str, layer: &str, suffixes: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let suffixes: Vec<String> = suffixes
            .into_iter()
            .map(|s| s.as_ref().trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .map(|s| if s.ends_with(".xml") { s } else { format!("{s}.xml") })
            .collect();
        if name.trim().is_empty() || layer.trim().is_empty() || suffixes.is_empty() {
            return Err(ConfigurationError::InvalidStrategy(name.to_string()));
        }
        Ok(Self {
            name: name.trim().to_string(),
            layer: layer.trim().to_string(),
            suffixes,
        })
    }

    /// `*Mapper.xml` files, statements reported under `mapper`.
    pub fn mybatis() -> Self {
        Self {
            name: MYBATIS.into(),
            layer: "mapper".into(),
            suffixes: vec!["mapper.xml".into()],
        }
    }

    /// `*DQM.xml` files of the CCS layout, reported under `dqm`.
    pub fn mybatis_ccs() -> Self {
        Self {
            name: MYBATIS_CCS.into(),
            layer: "dqm".into(),
            suffixes: vec!["dqm.xml".into()],
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn matches(&self, file: &SourceFile) -> bool {
        if file.extension != ".xml" {
            return false;
        }
        let name = file.filename.to_lowercase();
        self.suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    pub fn select_files<'a>(&self, files: &'a [SourceFile]) -> Vec<&'a SourceFile> {
        files.iter().filter(|f| self.matches(f)).collect()
    }
}

/// Builds the strategy named by the configuration. Custom strategies take
/// precedence over the built-in ones; names compare case-insensitively.
pub fn create_strategy(
    name: Option<&str>,
    customs: &[StrategyConfig],
) -> Result<SqlStrategy, ConfigurationError> {
    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(ConfigurationError::MissingStrategy)?;
    if let Some(custom) = customs.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
        return SqlStrategy::new(&custom.name, &custom.layer, &custom.suffixes);
    }
    match name.to_lowercase().as_str() {
        MYBATIS => Ok(SqlStrategy::mybatis()),
        MYBATIS_CCS => Ok(SqlStrategy::mybatis_ccs()),
        _ => Err(ConfigurationError::UnknownStrategy(name.to_string())),
    }
}
