//! Binary entrypoint for the `stagehand` collection maintenance tool.
//!
//! All behaviour lives in [`stagehand_cli::run`] so tests can drive the
//! CLI with substituted IO streams.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    stagehand_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
