//! Collects the candidate source files of a project.

use crate::config::{ConfigError, Configuration};
use crate::walk::visit;
use anyhow::Context;
use ir::SourceFile;
use regex::Regex;
use std::path::Path;
use tracing::{debug, info, warn};

/// Converts a basic glob pattern to a regular expression. `**` crosses
/// directory separators, `*` does not.
///
/// # Example
///
/// ```
/// use loader::glob_to_regex;
/// let re = glob_to_regex("**/*Test.java").unwrap();
/// assert!(re.is_match("src/com/shop/UserTest.java"));
/// assert!(!re.is_match("src/com/shop/User.java"));
/// ```
pub fn glob_to_regex(pat: &str) -> Result<Regex, ConfigError> {
    if pat.contains('[') || pat.contains(']') {
        return Err(ConfigError::InvalidPattern(pat.to_string()));
    }
    let mut regex = String::from("^");
    let mut chars = pat.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    // `**/` also matches zero directories
                    if chars.peek() == Some(&'/') {
                        chars.next();
                        regex.push_str("(?:.*/)?");
                    } else {
                        regex.push_str(".*");
                    }
                } else {
                    regex.push_str("[^/]*");
                }
            }
            '?' => regex.push_str("[^/]"),
            '.' | '(' | ')' | '+' | '|' | '^' | '$' | '{' | '}' | '\\' => {
                regex.push('\\');
                regex.push(c);
            }
            _ => regex.push(c),
        }
    }
    regex.push('$');
    Regex::new(&regex).map_err(|_| ConfigError::InvalidPattern(pat.to_string()))
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Walks `target_project` and returns every file whose extension is listed
/// in `source_file_types`, sorted by path. Directories named in
/// `exclude_dirs` are pruned; `exclude_files` globs are matched against the
/// path relative to the project root.
pub fn collect_source_files(config: &Configuration) -> anyhow::Result<Vec<SourceFile>> {
    let root = config.target_project.as_path();
    let patterns = config
        .exclude_files
        .iter()
        .map(|p| glob_to_regex(p))
        .collect::<Result<Vec<_>, _>>()?;
    let extensions: Vec<String> = config
        .source_file_types
        .iter()
        .map(|e| {
            let e = e.trim().to_lowercase();
            if e.starts_with('.') {
                e
            } else {
                format!(".{e}")
            }
        })
        .collect();

    let skip = |path: &Path, file_type: &std::fs::FileType| {
        if file_type.is_dir() {
            return path
                .file_name()
                .is_some_and(|n| config.exclude_dirs.iter().any(|d| n == d.as_str()));
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        patterns.iter().any(|re| re.is_match(&normalized(relative)))
    };

    let mut files = Vec::new();
    let mut keep = |path: &Path| -> anyhow::Result<()> {
        let file = match SourceFile::from_path(path, root) {
            Ok(f) => f,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Unreadable source file skipped");
                return Ok(());
            }
        };
        if extensions.contains(&file.extension) {
            debug!(file = %path.display(), "Source file collected");
            files.push(file);
        }
        Ok(())
    };
    visit(root, &skip, &mut keep)
        .with_context(|| format!("failed to walk {}", root.display()))?;

    files.sort_by(|a, b| a.path.cmp(&b.path));
    info!(root = %root.display(), files = files.len(), "Source files collected");
    Ok(files)
}
