//! Architectural layer of a file, guessed from its name.

use std::path::Path;

pub const CONTROLLER: &str = "controller";
pub const SERVICE: &str = "service";
pub const REPOSITORY: &str = "repository";
pub const MODEL: &str = "model";
pub const OTHER: &str = "other";

/// Class name suffixes, longest first so `ServiceImpl` wins over `Impl`-less
/// forms. CCS abbreviations map onto the standard names.
const SUFFIXES: &[(&str, &str)] = &[
    ("restcontroller", CONTROLLER),
    ("controller", CONTROLLER),
    ("resource", CONTROLLER),
    ("endpoint", CONTROLLER),
    ("ctl", CONTROLLER),
    ("serviceimpl", SERVICE),
    ("service", SERVICE),
    ("svcimpl", SERVICE),
    ("svc", SERVICE),
    ("biz", SERVICE),
    ("facade", SERVICE),
    ("repositoryimpl", REPOSITORY),
    ("repository", REPOSITORY),
    ("daoimpl", REPOSITORY),
    ("dao", REPOSITORY),
    ("mapper", REPOSITORY),
    ("dqm", REPOSITORY),
    ("dvo", REPOSITORY),
    ("entity", MODEL),
    ("dto", MODEL),
    ("vo", MODEL),
    ("model", MODEL),
];

const DIRECTORIES: &[(&str, &str)] = &[
    ("controller", CONTROLLER),
    ("web", CONTROLLER),
    ("api", CONTROLLER),
    ("service", SERVICE),
    ("biz", SERVICE),
    ("mapper", REPOSITORY),
    ("dao", REPOSITORY),
    ("repository", REPOSITORY),
    ("persistence", REPOSITORY),
    ("model", MODEL),
    ("entity", MODEL),
    ("domain", MODEL),
    ("dto", MODEL),
];

/// Classifies by file stem suffix first, then by the nearest directory
/// carrying a layer name.
///
/// # Example
/// ```
/// use engine::layer::classify_layer;
/// assert_eq!(classify_layer("src/web/UserController.java"), "controller");
/// assert_eq!(classify_layer("src/ccs/CRActPnstaSVCImpl.java"), "service");
/// assert_eq!(classify_layer("src/resources/UserDQM.xml"), "repository");
/// assert_eq!(classify_layer("src/service/support/Helpers.java"), "service");
/// assert_eq!(classify_layer("src/util/Strings.java"), "other");
/// ```
pub fn classify_layer(file_path: &str) -> &'static str {
    let path = Path::new(file_path);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if let Some((_, layer)) = SUFFIXES.iter().find(|(suffix, _)| stem.ends_with(*suffix)) {
        return *layer;
    }
    let dirs: Vec<String> = path
        .parent()
        .into_iter()
        .flat_map(|p| p.components())
        .map(|c| c.as_os_str().to_string_lossy().to_lowercase())
        .collect();
    for dir in dirs.iter().rev() {
        if let Some((_, layer)) = DIRECTORIES.iter().find(|(name, _)| dir == *name) {
            return *layer;
        }
    }
    OTHER
}
