//! SQL statements extracted from persistence mappers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Insert => "insert",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
        }
    }

    pub const ALL: [QueryType; 4] = [
        QueryType::Select,
        QueryType::Insert,
        QueryType::Update,
        QueryType::Delete,
    ];
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "select" => Ok(QueryType::Select),
            "insert" => Ok(QueryType::Insert),
            "update" => Ok(QueryType::Update),
            "delete" => Ok(QueryType::Delete),
            other => Err(format!("unknown query type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnUsage {
    Read,
    Write,
    ReadWrite,
}

impl ColumnUsage {
    /// Combines two usages of the same column.
    ///
    /// # Example
    /// ```
    /// use ir::ColumnUsage;
    /// assert_eq!(ColumnUsage::Read.merge(ColumnUsage::Write), ColumnUsage::ReadWrite);
    /// assert_eq!(ColumnUsage::Read.merge(ColumnUsage::Read), ColumnUsage::Read);
    /// ```
    pub fn merge(self, other: ColumnUsage) -> ColumnUsage {
        if self == other {
            self
        } else {
            ColumnUsage::ReadWrite
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A column referenced by a statement.
pub struct ColumnRef {
    pub name: String,
    pub usage: ColumnUsage,
    /// Table the column was attributed to, when the statement names several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement id, unique within its mapper file.
    pub id: String,
    #[serde(default)]
    pub namespace: String,
    pub query_type: QueryType,
    /// Statement body with dynamic tags flattened, as written.
    pub sql: String,
    #[serde(default)]
    pub parameter_type: Option<String>,
    #[serde(default)]
    pub result_type: Option<String>,
    #[serde(default)]
    pub tables: Vec<String>,
    #[serde(default)]
    pub columns: Vec<ColumnRef>,
    pub file_path: String,
    /// Signature of the Java method that owns the statement, once known.
    #[serde(default)]
    pub owner: Option<String>,
}

impl SqlStatement {
    /// `namespace.id`, or the bare id when no namespace is declared.
    pub fn qualified_id(&self) -> String {
        if self.namespace.is_empty() {
            self.id.clone()
        } else {
            format!("{}.{}", self.namespace, self.id)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Statements extracted from one mapper file.
pub struct SqlExtractionResult {
    pub file_path: String,
    pub namespace: String,
    pub layer: String,
    pub statements: Vec<SqlStatement>,
}
