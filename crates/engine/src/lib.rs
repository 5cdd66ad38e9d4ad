//! Analysis engine: SQL extraction, call graph and the table access
//! correlation that joins them.
//!
//! [`analyze`] runs the whole pipeline over an already collected file list:
//! parse Java sources (through the parse cache), build the call graph,
//! extract SQL with the configured strategy and aggregate table access.
//! Per-file and per-statement failures are counted in [`RunSummary`]; only
//! a configuration error aborts the run.

use ir::{
    CallGraphSummary, ParsedJavaFile, SourceFile, SqlExtractionResult, TableAccessInfo,
};
use loader::Configuration;
use parsers::{JavaParser, ParseCache};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub mod analyzer;
pub mod callgraph;
pub mod error;
pub mod layer;
pub mod sql;

pub use analyzer::{DBAccessAnalyzer, TableFilter};
pub use callgraph::{CallGraph, CallGraphBuilder, MethodNode};
pub use error::{ConfigurationError, ExtractionError};
pub use sql::{create_strategy, SqlExtractor, SqlStrategy};

/// Processed and skipped counts of one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub java_files: usize,
    pub parsed_files: usize,
    pub cache_hits: usize,
    pub parse_errors: usize,
    pub sql_files: usize,
    pub sql_statements: usize,
    pub skipped_statements: usize,
    pub unreadable_files: usize,
    pub call_graph_nodes: usize,
    pub call_graph_edges: usize,
    pub endpoints: usize,
    pub table_access_records: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub summary: RunSummary,
    pub java_files: Vec<ParsedJavaFile>,
    pub sql_results: Vec<SqlExtractionResult>,
    pub call_graph: CallGraphSummary,
    pub table_access: Vec<TableAccessInfo>,
}

/// Runs the full analysis. The strategy is resolved before any file is
/// touched, so a [`ConfigurationError`] leaves no partial work behind.
pub fn analyze(
    config: &Configuration,
    files: &[SourceFile],
    cache: Arc<dyn ParseCache>,
) -> anyhow::Result<AnalysisReport> {
    let start = Instant::now();
    let strategy = create_strategy(config.sql_wrapping_type.as_deref(), &config.custom_strategies)?;
    info!(strategy = %strategy.name, files = files.len(), "Analysis started");

    let java_paths: Vec<PathBuf> = files
        .iter()
        .filter(|f| f.is_java())
        .map(|f| f.path.clone())
        .collect();
    let parser = JavaParser::new(cache);
    let java_files = parser.parse_all(&java_paths);
    let metrics = parser.metrics();

    let mut builder = CallGraphBuilder::new();
    for file in &java_files {
        builder.add_file(file.clone());
    }
    let graph = builder.build();

    let extraction = SqlExtractor::new(strategy).extract(files);
    let mut sql_results = extraction.results;

    let filter = TableFilter::new(
        config
            .access_tables
            .iter()
            .map(|t| (t.table_name.as_str(), t.columns.as_slice())),
    );
    let analyzer = DBAccessAnalyzer::new(&graph, config.max_call_depth).with_filter(filter);
    analyzer.assign_owners(&mut sql_results);
    let table_access = analyzer.analyze(&sql_results);
    let call_graph = graph.summary(config.max_call_depth);

    let summary = RunSummary {
        java_files: java_paths.len(),
        parsed_files: java_files.len(),
        cache_hits: metrics.cache_hits,
        parse_errors: metrics.parse_errors,
        sql_files: extraction.metrics.files,
        sql_statements: extraction.metrics.statements,
        skipped_statements: extraction.metrics.skipped_statements,
        unreadable_files: extraction.metrics.unreadable_files,
        call_graph_nodes: call_graph.node_count,
        call_graph_edges: call_graph.edge_count,
        endpoints: call_graph.endpoints.len(),
        table_access_records: table_access.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        parsed = summary.parsed_files,
        parse_errors = summary.parse_errors,
        statements = summary.sql_statements,
        skipped = summary.skipped_statements,
        records = summary.table_access_records,
        "Analysis finished"
    );

    Ok(AnalysisReport {
        summary,
        java_files,
        sql_results,
        call_graph,
        table_access,
    })
}
