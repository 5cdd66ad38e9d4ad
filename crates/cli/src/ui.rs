//! Terminal decorations. Everything goes to stderr so stdout stays usable
//! for JSON output.

use colored::*;

pub fn print_header() {
    let version = env!("CARGO_PKG_VERSION");
    let spaces = " ".repeat(24usize.saturating_sub(version.len()));
    eprintln!(
        r#"
    ╭──────────────────────────────────────╮
    │                                      │
    │        DBSCOPE  TABLE  ACCESS        │
    │     Java / MyBatis static analysis   │
    │     Version: {version}{spaces}│
    │                                      │
    ╰──────────────────────────────────────╯
"#
    );
}

/// `[n/total] message` progress line.
pub fn print_step(n: usize, total: usize, message: &str) {
    eprintln!("  {} {}", format!("[{n}/{total}]").bright_blue().bold(), message);
}

pub fn print_done(message: &str) {
    eprintln!("  {} {}", "✓".bright_green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".bright_red().bold(), message);
}
