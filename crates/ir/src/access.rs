//! Aggregated table access facts produced by the analyzer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::sql::{ColumnUsage, QueryType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct ColumnAccess {
    /// Lowercase column name.
    pub name: String,
    pub usage: ColumnUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Which files, through which layer, touch `table_name` with `query_type`.
pub struct TableAccessInfo {
    pub table_name: String,
    pub columns: Vec<ColumnAccess>,
    pub access_files: BTreeSet<String>,
    pub layer: String,
    pub query_type: QueryType,
    /// Access files grouped by normalized layer (controller, service, ...).
    #[serde(default)]
    pub layer_files: BTreeMap<String, BTreeSet<String>>,
    /// Endpoints (`GET /api/users`) from which the statements are reachable.
    #[serde(default)]
    pub entry_points: BTreeSet<String>,
    /// Qualified ids of the statements merged into this record.
    #[serde(default)]
    pub statements: BTreeSet<String>,
}

/// Grouping key for [`TableAccessInfo`].
pub type AccessKey = (String, String, QueryType);

impl TableAccessInfo {
    pub fn new(table_name: impl Into<String>, layer: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            table_name: table_name.into(),
            columns: Vec::new(),
            access_files: BTreeSet::new(),
            layer: layer.into(),
            query_type,
            layer_files: BTreeMap::new(),
            entry_points: BTreeSet::new(),
            statements: BTreeSet::new(),
        }
    }

    pub fn key(&self) -> AccessKey {
        (self.table_name.clone(), self.layer.clone(), self.query_type)
    }

    /// Adds a column, normalizing its name and merging the usage with any
    /// previous occurrence. Columns stay sorted by name.
    ///
    /// # Example
    /// ```
    /// use ir::{ColumnUsage, QueryType, TableAccessInfo};
    /// let mut t = TableAccessInfo::new("users", "mapper", QueryType::Update);
    /// t.add_column("EMAIL", ColumnUsage::Write);
    /// t.add_column("email", ColumnUsage::Read);
    /// assert_eq!(t.columns.len(), 1);
    /// assert_eq!(t.columns[0].usage, ColumnUsage::ReadWrite);
    /// ```
    pub fn add_column(&mut self, name: &str, usage: ColumnUsage) {
        let name = name.to_lowercase();
        match self.columns.binary_search_by(|c| c.name.cmp(&name)) {
            Ok(pos) => {
                let merged = self.columns[pos].usage.merge(usage);
                self.columns[pos].usage = merged;
            }
            Err(pos) => self.columns.insert(pos, ColumnAccess { name, usage }),
        }
    }

    /// Folds `other` (same key) into `self`.
    pub fn merge(&mut self, other: TableAccessInfo) {
        for col in other.columns {
            self.add_column(&col.name, col.usage);
        }
        self.access_files.extend(other.access_files);
        for (layer, files) in other.layer_files {
            self.layer_files.entry(layer).or_default().extend(files);
        }
        self.entry_points.extend(other.entry_points);
        self.statements.extend(other.statements);
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}
