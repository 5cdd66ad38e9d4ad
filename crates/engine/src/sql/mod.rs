//! SQL extraction: mapper conventions, text heuristics and the extractor
//! that ties them together.

pub mod extractor;
pub mod strategy;
pub mod tables;

pub use extractor::{classify, ExtractionMetrics, ExtractionOutput, SqlExtractor};
pub use strategy::{create_strategy, SqlStrategy, MYBATIS, MYBATIS_CCS};
pub use tables::{analyze_sql, normalize_sql, SqlShape};
