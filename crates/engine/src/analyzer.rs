//! Reconciles extracted SQL with the call graph into table access records.

use crate::callgraph::CallGraph;
use crate::layer::classify_layer;
use ir::{SqlExtractionResult, SqlStatement, TableAccessInfo};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::RwLock;
use tracing::{debug, info};

/// Table filter taken from the configuration. An empty column list keeps
/// every column of the table.
#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    tables: HashMap<String, BTreeSet<String>>,
}

impl TableFilter {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [String])>) -> Self {
        let tables = entries
            .into_iter()
            .map(|(table, columns)| {
                (
                    table.to_lowercase(),
                    columns.iter().map(|c| c.to_lowercase()).collect(),
                )
            })
            .collect();
        Self { tables }
    }

    fn allows_table(&self, table: &str) -> bool {
        self.tables.is_empty() || self.tables.contains_key(table)
    }

    fn allows_column(&self, table: &str, column: &str) -> bool {
        match self.tables.get(table) {
            Some(columns) if !columns.is_empty() => columns.contains(&column.to_lowercase()),
            _ => true,
        }
    }
}

pub struct DBAccessAnalyzer<'g> {
    graph: &'g CallGraph,
    max_call_depth: usize,
    filter: TableFilter,
    // (namespace, id) -> owning nodes; filled by the first lookup
    owners: RwLock<HashMap<(String, String), Vec<usize>>>,
}

impl<'g> DBAccessAnalyzer<'g> {
    pub fn new(graph: &'g CallGraph, max_call_depth: usize) -> Self {
        Self {
            graph,
            max_call_depth,
            filter: TableFilter::default(),
            owners: RwLock::default(),
        }
    }

    pub fn with_filter(mut self, filter: TableFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Method nodes that issue `stmt`, tried in order: the mapper interface
    /// named by the namespace, a class with the namespace's simple name, DAO
    /// classes holding the namespace in a string constant, and finally any
    /// method quoting the fully qualified statement id. Results are kept per
    /// (namespace, id) for the lifetime of the analyzer.
    pub fn owners_of(&self, stmt: &SqlStatement) -> Vec<usize> {
        let key = (stmt.namespace.clone(), stmt.id.clone());
        if let Some(found) = self
            .owners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&key)
        {
            return found.clone();
        }
        let found = self.lookup_owners(stmt);
        self.owners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, found.clone());
        found
    }

    fn lookup_owners(&self, stmt: &SqlStatement) -> Vec<usize> {
        let ns = stmt.namespace.as_str();
        if ns.is_empty() {
            return Vec::new();
        }
        let graph = self.graph;

        if let Some(ci) = graph.class_index(ns) {
            let found = graph.class_methods(ci, &stmt.id);
            if !found.is_empty() {
                return found;
            }
        }
        let simple = ns.rsplit('.').next().unwrap_or(ns);
        let found: Vec<usize> = graph
            .classes_named(simple)
            .iter()
            .flat_map(|&ci| graph.class_methods(ci, &stmt.id))
            .collect();
        if !found.is_empty() {
            return found;
        }

        let qualified = stmt.qualified_id();
        let dotted = format!(".{}", stmt.id);
        let mut found = Vec::new();
        for (ci, class) in graph.classes().iter().enumerate() {
            let holds_namespace = class
                .fields
                .iter()
                .any(|f| f.string_value.as_deref() == Some(ns));
            if !holds_namespace {
                continue;
            }
            for &n in graph.class_nodes(ci) {
                let quotes = graph
                    .method(n)
                    .string_literals
                    .iter()
                    .any(|l| *l == stmt.id || *l == dotted || *l == qualified);
                if quotes {
                    found.push(n);
                }
            }
        }
        if !found.is_empty() {
            return found;
        }

        (0..graph.node_count())
            .filter(|&n| graph.method(n).string_literals.contains(&qualified))
            .collect()
    }

    /// Writes the signature of the first owning method into each statement.
    pub fn assign_owners(&self, results: &mut [SqlExtractionResult]) {
        for stmt in results.iter_mut().flat_map(|r| r.statements.iter_mut()) {
            stmt.owner = self
                .owners_of(stmt)
                .first()
                .map(|&n| self.graph.node(n).signature.clone());
        }
    }

    /// One record per (table, layer, query type), sorted by that key.
    pub fn analyze(&self, results: &[SqlExtractionResult]) -> Vec<TableAccessInfo> {
        let work: Vec<(&str, &SqlStatement)> = results
            .iter()
            .flat_map(|r| r.statements.iter().map(move |s| (r.layer.as_str(), s)))
            .collect();
        let partial: Vec<Vec<TableAccessInfo>> = work
            .par_iter()
            .map(|(layer, stmt)| self.records_for(layer, stmt))
            .collect();

        let mut merged: BTreeMap<_, TableAccessInfo> = BTreeMap::new();
        for info in partial.into_iter().flatten() {
            match merged.get_mut(&info.key()) {
                Some(existing) => existing.merge(info),
                None => {
                    merged.insert(info.key(), info);
                }
            }
        }
        info!(
            statements = work.len(),
            records = merged.len(),
            "Table access analysis finished"
        );
        merged.into_values().collect()
    }

    fn records_for(&self, layer: &str, stmt: &SqlStatement) -> Vec<TableAccessInfo> {
        let owners = self.owners_of(stmt);
        if owners.is_empty() {
            debug!(statement = %stmt.qualified_id(), "No owning method found");
        }
        let mut seen = HashSet::new();
        let reaching: Vec<usize> = owners
            .iter()
            .flat_map(|&o| self.graph.reaching_nodes(o, self.max_call_depth))
            .filter(|n| seen.insert(*n))
            .collect();

        let mut files = BTreeSet::from([stmt.file_path.clone()]);
        files.extend(reaching.iter().map(|&n| self.graph.node(n).file_path.clone()));
        let mut layer_files: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for file in &files {
            layer_files
                .entry(classify_layer(file).to_string())
                .or_default()
                .insert(file.clone());
        }
        let entry_points: BTreeSet<String> = self
            .graph
            .endpoints_among(&reaching)
            .iter()
            .map(|e| e.label())
            .collect();

        stmt.tables
            .iter()
            .filter(|t| self.filter.allows_table(t))
            .map(|table| {
                let mut info = TableAccessInfo::new(table.clone(), layer, stmt.query_type);
                for col in &stmt.columns {
                    let applies = col.table.as_deref().map_or(true, |t| t == table);
                    if applies && self.filter.allows_column(table, &col.name) {
                        info.add_column(&col.name, col.usage);
                    }
                }
                info.access_files = files.clone();
                info.layer_files = layer_files.clone();
                info.entry_points = entry_points.clone();
                info.statements.insert(stmt.qualified_id());
                info
            })
            .collect()
    }
}
