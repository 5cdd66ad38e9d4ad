use super::strategy::SqlStrategy;
use super::tables::analyze_sql;
use crate::error::ExtractionError;
use ir::{SourceFile, SqlExtractionResult, SqlStatement};
use parsers::MapperParser;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractionMetrics {
    pub files: usize,
    pub statements: usize,
    pub skipped_statements: usize,
    pub unreadable_files: usize,
}

#[derive(Debug, Default, Clone)]
pub struct ExtractionOutput {
    pub results: Vec<SqlExtractionResult>,
    pub metrics: ExtractionMetrics,
}

impl ExtractionOutput {
    pub fn statements(&self) -> impl Iterator<Item = &SqlStatement> {
        self.results.iter().flat_map(|r| r.statements.iter())
    }
}

/// Fills `tables` and `columns` of a statement from its SQL text.
pub fn classify(statement: &mut SqlStatement) -> Result<(), ExtractionError> {
    let shape = analyze_sql(&statement.sql);
    if shape.tables.is_empty() {
        return Err(ExtractionError::NoTable {
            statement: statement.qualified_id(),
        });
    }
    statement.tables = shape.tables;
    statement.columns = shape.columns;
    Ok(())
}

/// Runs one strategy over the collected files.
pub struct SqlExtractor {
    strategy: SqlStrategy,
    parser: MapperParser,
}

impl SqlExtractor {
    pub fn new(strategy: SqlStrategy) -> Self {
        Self {
            strategy,
            parser: MapperParser::new(),
        }
    }

    pub fn strategy(&self) -> &SqlStrategy {
        &self.strategy
    }

    /// Statements of one mapper text with tables and columns filled in, and
    /// the number of statements dropped because no table was found.
    pub fn extract_str(&self, file_path: &str, content: &str) -> (SqlExtractionResult, usize) {
        let mapper = self.parser.parse_str(file_path, content);
        let mut skipped = 0;
        let mut statements = Vec::with_capacity(mapper.statements.len());
        for mut stmt in mapper.statements {
            match classify(&mut stmt) {
                Ok(()) => statements.push(stmt),
                Err(e) => {
                    skipped += 1;
                    warn!(file = %file_path, statement = %stmt.id, error = %e, "Skipping SQL statement");
                }
            }
        }
        let result = SqlExtractionResult {
            file_path: file_path.to_string(),
            namespace: mapper.namespace,
            layer: self.strategy.layer.clone(),
            statements,
        };
        (result, skipped)
    }

    /// Selects the strategy's files and extracts them in parallel. Output
    /// order follows the input order.
    pub fn extract(&self, files: &[SourceFile]) -> ExtractionOutput {
        let selected = self.strategy.select_files(files);
        if selected.is_empty() {
            warn!(strategy = %self.strategy.name, "No mapper files matched the strategy");
        }
        let per_file: Vec<Option<(SqlExtractionResult, usize)>> = selected
            .par_iter()
            .map(|f| match self.parser.read(&f.path) {
                Ok(content) => Some(self.extract_str(&f.path_string(), &content)),
                Err(e) => {
                    warn!(file = %f.path.display(), error = %e, "Unreadable mapper file");
                    None
                }
            })
            .collect();

        let mut out = ExtractionOutput::default();
        for entry in per_file {
            match entry {
                Some((result, skipped)) => {
                    debug!(file = %result.file_path, statements = result.statements.len(), "SQL extracted");
                    out.metrics.files += 1;
                    out.metrics.statements += result.statements.len();
                    out.metrics.skipped_statements += skipped;
                    out.results.push(result);
                }
                None => out.metrics.unreadable_files += 1,
            }
        }
        info!(
            strategy = %self.strategy.name,
            files = out.metrics.files,
            statements = out.metrics.statements,
            skipped = out.metrics.skipped_statements,
            "SQL extraction finished"
        );
        out
    }
}
