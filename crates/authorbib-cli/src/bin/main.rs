//! authorbib CLI binary entry point
//!
//! This is a thin wrapper that calls the library's `run_cli()` function.

use std::process::ExitCode;

use authorbib_cli::run_cli;

fn main() -> ExitCode {
    run_cli()
}
