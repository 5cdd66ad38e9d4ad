//! Entry point for the command-line interface.
//! Delegates to the `analyze` and `list` modules.

use dbscope::analyze::run_analyze;
use dbscope::args::{parse_cli, Commands};
use dbscope::list::run_list;
use dbscope::ui;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = parse_cli();
    let result = match cli.command {
        Commands::Analyze(args) => run_analyze(args),
        Commands::List(args) => run_list(args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
