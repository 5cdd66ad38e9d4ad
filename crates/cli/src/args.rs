use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::Format;

fn default_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let v: usize = s
        .parse()
        .map_err(|e: std::num::ParseIntError| e.to_string())?;
    if v == 0 {
        Err("threads must be greater than 0".into())
    } else {
        Ok(v)
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "dbscope - finds which database tables a Java/MyBatis codebase touches, and from which endpoints",
    long_about = "dbscope statically analyzes a Java enterprise project: it parses the Java sources, builds a call graph rooted at the HTTP endpoints, extracts the SQL of the MyBatis mappers and reports, per table, the files and endpoints that reach it.

Examples:
  dbscope analyze --config config.json        # Analyze and persist the results
  dbscope list --db                           # Table access per table
  dbscope list --endpoint                     # REST endpoints
  dbscope list --callgraph 'GET /api/users'   # Call tree of one endpoint",
    subcommand_required = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze the configured project and persist the results
    Analyze(AnalyzeArgs),
    /// Show previously persisted results
    List(ListArgs),
}

#[derive(ClapArgs)]
pub struct AnalyzeArgs {
    /// Configuration file (.json, .yaml, .yml or .toml)
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,
    /// Output format of the run summary
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Number of parallel threads
    #[arg(long, default_value_t = default_threads(), value_parser = parse_threads)]
    pub threads: usize,
    /// Parse every Java file again instead of using the parse cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,
    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

#[derive(ClapArgs)]
#[command(group(
    clap::ArgGroup::new("what")
        .required(true)
        .args(["all", "db", "endpoint", "callgraph"])
))]
pub struct ListArgs {
    /// Configuration file (.json, .yaml, .yml or .toml)
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
    /// Every collected source file
    #[arg(long)]
    pub all: bool,
    /// Table access records
    #[arg(long)]
    pub db: bool,
    /// REST endpoints
    #[arg(long)]
    pub endpoint: bool,
    /// Call tree of one endpoint, by method signature or `METHOD /path`
    #[arg(long, value_name = "ENDPOINT")]
    pub callgraph: Option<String>,
    /// Enable debug logging
    #[arg(long)]
    pub verbose: bool,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
