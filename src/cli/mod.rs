//! CLI module for filecabinet
//!
//! - `args`: startup flags (backend, rule set, tracing)
//! - `parser`: command-line verbs
//! - `commands`: the session loop and one handler per verb
//! - `io`: prompts and text rendering

mod args;
mod commands;
mod errors;
mod io;
mod parser;

pub use args::{Cli, LogLevel, RulesArg, StorageKind};
pub use commands::{open_store, run, Session};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use parser::{parse_command, Command};
