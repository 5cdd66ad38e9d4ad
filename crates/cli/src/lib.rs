//! Command line front end of dbscope.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod analyze;
pub mod args;
pub mod list;
pub mod output;
pub mod persistence;
pub mod ui;

/// Installs the stderr subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
