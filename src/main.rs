//! filecabinet entry point
//!
//! All logic is delegated to the CLI module. Prints the error to stderr
//! and exits non-zero on failure.

use filecabinet::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
