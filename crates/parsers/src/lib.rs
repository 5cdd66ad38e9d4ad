//! Converters of Java sources and persistence mappers to the data model
//! used by the engine.

use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParserMetrics {
    pub files_parsed: usize,
    pub cache_hits: usize,
    pub parse_errors: usize,
}

pub mod cache;
pub mod languages;

pub use cache::{content_hash, FileParseCache, MemoryParseCache, ParseCache};
pub use languages::*;
