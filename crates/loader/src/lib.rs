//! Inputs of an analysis run: the configuration file and the source files
//! of the target project.

mod collector;
mod config;
mod walk;

pub use collector::{collect_source_files, glob_to_regex};
pub use config::{
    AccessTable, ConfigError, ConfigFormat, Configuration, StrategyConfig, DEFAULT_MAX_CALL_DEPTH,
};
pub use walk::visit;
