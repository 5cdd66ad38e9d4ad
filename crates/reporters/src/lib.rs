//! Formatters for analysis results in text and JSON.
//! Text is meant for terminals, JSON for the downstream tooling.

use engine::RunSummary;
use ir::{CallTree, ColumnUsage, Endpoint, SourceFile, TableAccessInfo};
use serde::Serialize;
use std::io::{self, Write};

const RULE: &str =
    "    ──────────────────────────────────────────────────────────────────────────────";

/// Column usage colored with simple ANSI codes.
fn color_usage(usage: ColumnUsage) -> String {
    let (code, text) = match usage {
        ColumnUsage::Read => ("\x1b[32m", "R"),
        ColumnUsage::Write => ("\x1b[31m", "W"),
        ColumnUsage::ReadWrite => ("\x1b[33m", "RW"),
    };
    format!("{code}{text}\x1b[0m")
}

fn simple_box(title: &str) -> String {
    let width = title.chars().count() + 2;
    format!(
        "╭{}╮\n│ {} │\n╰{}╯\n",
        "─".repeat(width),
        title,
        "─".repeat(width)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Supported output formats.
pub enum Format {
    /// Human-readable output in plain text.
    Text,
    /// JSON structure for integrations.
    Json,
}

#[derive(Serialize)]
struct Listing<'a, T: Serialize> {
    items: &'a [T],
    total: usize,
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// Processed and skipped counts of a run.
///
/// # Example
/// ```
/// use engine::RunSummary;
/// use reporters::{write_summary, Format};
/// let mut buf = Vec::new();
/// write_summary(&mut buf, &RunSummary::default(), Format::Text).unwrap();
/// assert!(String::from_utf8(buf).unwrap().contains("Analysis Status"));
/// ```
pub fn write_summary<W: Write>(out: &mut W, summary: &RunSummary, fmt: Format) -> io::Result<()> {
    if fmt == Format::Json {
        return write_json(out, summary);
    }
    write!(out, "{}", simple_box("Analysis Status"))?;
    writeln!(out)?;
    writeln!(out, "    Metric                    Value")?;
    writeln!(out, "{RULE}")?;
    let rows = [
        ("Java files", summary.java_files),
        ("Parsed", summary.parsed_files),
        ("Cache hits", summary.cache_hits),
        ("Parse errors", summary.parse_errors),
        ("Mapper files", summary.sql_files),
        ("SQL statements", summary.sql_statements),
        ("Skipped statements", summary.skipped_statements),
        ("Unreadable files", summary.unreadable_files),
        ("Call graph nodes", summary.call_graph_nodes),
        ("Call graph edges", summary.call_graph_edges),
        ("Endpoints", summary.endpoints),
        ("Table access records", summary.table_access_records),
    ];
    for (name, value) in rows {
        writeln!(out, "    {name:<25} {value}")?;
    }
    writeln!(out, "    {:<25} {}ms", "Duration", summary.duration_ms)?;
    Ok(())
}

pub fn write_source_files<W: Write>(out: &mut W, files: &[SourceFile], fmt: Format) -> io::Result<()> {
    if fmt == Format::Json {
        return write_json(out, &Listing { items: files, total: files.len() });
    }
    write!(out, "{}", simple_box("Source Files"))?;
    for f in files {
        writeln!(out, "  {} ({} bytes)", f.relative_path.display(), f.size)?;
    }
    writeln!(out, "\nTotal: {}", files.len())
}

pub fn write_endpoints<W: Write>(out: &mut W, endpoints: &[Endpoint], fmt: Format) -> io::Result<()> {
    if fmt == Format::Json {
        return write_json(out, &Listing { items: endpoints, total: endpoints.len() });
    }
    write!(out, "{}", simple_box("Endpoints"))?;
    if endpoints.is_empty() {
        writeln!(out, "✔ No endpoints found.")?;
        return Ok(());
    }
    for e in endpoints {
        writeln!(
            out,
            "  {:<7} {} -> {} ({})",
            e.http_method, e.path, e.method_signature, e.class_name
        )?;
    }
    writeln!(out, "\nTotal: {}", endpoints.len())
}

/// One block per record: table, layer, query type, columns and files.
pub fn write_table_access<W: Write>(
    out: &mut W,
    records: &[TableAccessInfo],
    fmt: Format,
) -> io::Result<()> {
    if fmt == Format::Json {
        return write_json(out, &Listing { items: records, total: records.len() });
    }
    write!(out, "{}", simple_box("Table Access"))?;
    if records.is_empty() {
        writeln!(out, "✔ No table access found.")?;
        return Ok(());
    }
    for r in records {
        writeln!(
            out,
            "\n  {} [{}] {} - {} file(s)",
            r.table_name,
            r.layer,
            r.query_type,
            r.access_files.len()
        )?;
        if r.columns.is_empty() {
            writeln!(out, "    columns: N/A")?;
        } else {
            let cols: Vec<String> = r
                .columns
                .iter()
                .map(|c| format!("{}:{}", c.name, color_usage(c.usage)))
                .collect();
            writeln!(out, "    columns: {}", cols.join(", "))?;
        }
        for (layer, files) in &r.layer_files {
            writeln!(out, "    {layer}:")?;
            for f in files {
                writeln!(out, "      - {f}")?;
            }
        }
        if !r.entry_points.is_empty() {
            let eps: Vec<&str> = r.entry_points.iter().map(String::as_str).collect();
            writeln!(out, "    entry points: {}", eps.join(", "))?;
        }
    }
    writeln!(out, "\nTotal: {}", records.len())
}

fn write_tree_node<W: Write>(out: &mut W, tree: &CallTree, depth: usize) -> io::Result<()> {
    let marker = if tree.recursive {
        " ↺ (recursive)"
    } else if tree.truncated {
        " … (depth limit)"
    } else {
        ""
    };
    writeln!(out, "{}{}{}", "  ".repeat(depth + 1), tree.signature, marker)?;
    for child in &tree.children {
        write_tree_node(out, child, depth + 1)?;
    }
    Ok(())
}

pub fn write_call_tree<W: Write>(out: &mut W, tree: &CallTree, fmt: Format) -> io::Result<()> {
    if fmt == Format::Json {
        return write_json(out, tree);
    }
    write!(out, "{}", simple_box("Call Graph"))?;
    write_tree_node(out, tree, 0)
}

#[cfg(test)]
mod tests;
