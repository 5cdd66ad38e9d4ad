//! `dbscope analyze`: collect, parse, extract, correlate and persist.

use anyhow::{Context, Result};
use engine::AnalysisReport;
use loader::{collect_source_files, Configuration};
use parsers::{FileParseCache, MemoryParseCache, ParseCache};
use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use tracing::{error, info};

use crate::args::AnalyzeArgs;
use crate::output::Format;
use crate::persistence::{
    ResultStore, CALL_GRAPH, JAVA_PARSE_RESULTS, SOURCE_FILES, SQL_EXTRACTION_RESULTS,
    TABLE_ACCESS_INFO,
};
use crate::{init_logging, ui};

const PARSE_CACHE_FILE: &str = "java_parse_cache.json";
const STEPS: usize = 4;

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    init_logging(args.verbose);
    if args.format == Format::Text {
        ui::print_header();
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .build_global()
    {
        error!("Failed to build global thread pool: {e}");
    }

    let config = Configuration::load(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    info!(target = %config.target_project.display(), "Analysis requested");

    ui::print_step(1, STEPS, "Collecting source files");
    let files = collect_source_files(&config)?;
    ui::print_done(&format!("{} source files", files.len()));

    ui::print_step(2, STEPS, "Parsing Java, building the call graph and extracting SQL");
    let file_cache = (!args.no_cache)
        .then(|| Arc::new(FileParseCache::load(&config.cache_dir().join(PARSE_CACHE_FILE))));
    let cache: Arc<dyn ParseCache> = match &file_cache {
        Some(c) => c.clone() as Arc<dyn ParseCache>,
        None => Arc::new(MemoryParseCache::new()),
    };
    let report = engine::analyze(&config, &files, cache)?;
    if let Some(c) = &file_cache {
        let present: HashSet<String> = files.iter().map(|f| f.path_string()).collect();
        c.retain(|path| present.contains(path));
        c.save()?;
    }
    ui::print_done(&format!(
        "{} Java files, {} endpoints, {} SQL statements",
        report.summary.parsed_files, report.summary.endpoints, report.summary.sql_statements
    ));

    ui::print_step(3, STEPS, "Saving results");
    let store = ResultStore::new(config.output_dir());
    save_results(&store, &files, &report)?;
    ui::print_done(&format!("results written to {}", store.dir().display()));

    ui::print_step(4, STEPS, "Done");
    let mut out = io::stdout();
    reporters::write_summary(&mut out, &report.summary, args.format.into())?;
    Ok(())
}

/// Writes the five result documents `list` reads back.
pub fn save_results(
    store: &ResultStore,
    files: &[ir::SourceFile],
    report: &AnalysisReport,
) -> Result<()> {
    store.save(SOURCE_FILES, files)?;
    store.save(JAVA_PARSE_RESULTS, &report.java_files)?;
    store.save(SQL_EXTRACTION_RESULTS, &report.sql_results)?;
    store.save(CALL_GRAPH, &report.call_graph)?;
    store.save(TABLE_ACCESS_INFO, &report.table_access)?;
    Ok(())
}
