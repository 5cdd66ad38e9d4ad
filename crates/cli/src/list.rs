//! `dbscope list`: renders what the last `analyze` persisted.

use anyhow::{bail, Context, Result};
use ir::{CallGraphSummary, SourceFile, TableAccessInfo};
use loader::Configuration;
use std::io;

use crate::args::ListArgs;
use crate::init_logging;
use crate::persistence::{ResultStore, CALL_GRAPH, SOURCE_FILES, TABLE_ACCESS_INFO};

fn require<T>(value: Option<T>, name: &str, store: &ResultStore) -> Result<T> {
    match value {
        Some(v) => Ok(v),
        None => bail!(
            "{name} not found in {}; run `dbscope analyze` first",
            store.dir().display()
        ),
    }
}

pub fn run_list(args: ListArgs) -> Result<()> {
    init_logging(args.verbose);
    let config = Configuration::load(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    let store = ResultStore::new(config.output_dir());
    let fmt = args.format.into();
    let mut out = io::stdout();

    if args.all {
        let files: Vec<SourceFile> = require(store.load(SOURCE_FILES)?, SOURCE_FILES, &store)?;
        reporters::write_source_files(&mut out, &files, fmt)?;
    } else if args.db {
        let records: Vec<TableAccessInfo> =
            require(store.load(TABLE_ACCESS_INFO)?, TABLE_ACCESS_INFO, &store)?;
        reporters::write_table_access(&mut out, &records, fmt)?;
    } else if args.endpoint {
        let graph: CallGraphSummary = require(store.load(CALL_GRAPH)?, CALL_GRAPH, &store)?;
        reporters::write_endpoints(&mut out, &graph.endpoints, fmt)?;
    } else if let Some(target) = &args.callgraph {
        let graph: CallGraphSummary = require(store.load(CALL_GRAPH)?, CALL_GRAPH, &store)?;
        let signature = graph
            .endpoints
            .iter()
            .find(|e| e.method_signature == *target || e.label() == *target)
            .map(|e| e.method_signature.clone())
            .unwrap_or_else(|| target.clone());
        match graph.call_trees.get(&signature) {
            Some(tree) => reporters::write_call_tree(&mut out, tree, fmt)?,
            None => bail!("endpoint not found: {target}"),
        }
    }
    Ok(())
}
