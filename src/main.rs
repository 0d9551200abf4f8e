//! Reader - track reading progress through prerequisite-gated chapters

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = reader_progress::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
