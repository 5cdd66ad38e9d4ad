//! Source readers, one module per input language.
//!
//! - [`java`]: Java classes, methods and call sites (tree-sitter).
//! - [`mybatis`]: SQL statements of MyBatis mapper XML files.

pub mod java;
pub use java::{classes_of, extract_classes, parse_tree, JavaParseError, JavaParser};

pub mod mybatis;
pub use mybatis::{MapperParser, ParsedMapper};
