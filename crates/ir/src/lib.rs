//! Data model shared by every dbscope crate.
//!
//! Two independently extracted models live here: the *code structure*
//! ([`java`]: classes, methods, call sites) and the *SQL text* ([`sql`]:
//! mapper statements with their tables and columns). The analyzer reconciles
//! them into [`TableAccessInfo`] records, while [`graph`] holds the
//! endpoint and call tree views of the code structure. Everything is plain
//! data and round-trips through `serde`.

pub mod access;
pub mod graph;
pub mod java;
pub mod source;
pub mod sql;

pub use access::{AccessKey, ColumnAccess, TableAccessInfo};
pub use graph::{CallGraphSummary, CallTree, Endpoint};
pub use java::{
    erase_type, Annotation, CallSite, JavaClass, JavaField, JavaMethod, Parameter, ParsedJavaFile,
};
pub use source::SourceFile;
pub use sql::{ColumnRef, ColumnUsage, QueryType, SqlExtractionResult, SqlStatement};

#[cfg(test)]
mod tests;
