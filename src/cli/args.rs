//! Startup argument definitions using clap
//!
//! ```text
//! filecabinet [--storage memory|file] [--path <file>]
//!             [--validation-rules default|custom] [--rules-file <json>]
//!             [--use-stopwatch] [--use-logger] [--log-level <level>]
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::observability::Severity;
use crate::validation::RuleKind;

/// filecabinet - a console cabinet of personal records
#[derive(Parser, Debug)]
#[command(name = "filecabinet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Storage backend
    #[arg(short = 's', long, value_enum, default_value_t = StorageKind::Memory)]
    pub storage: StorageKind,

    /// Storage file used by the file backend
    #[arg(long, default_value = "cabinet.db")]
    pub path: PathBuf,

    /// Validation rule set
    #[arg(short = 'v', long, value_enum, default_value_t = RulesArg::Default)]
    pub validation_rules: RulesArg,

    /// JSON file overriding the built-in rule sets
    #[arg(long)]
    pub rules_file: Option<PathBuf>,

    /// Log the elapsed time of every store call
    #[arg(long)]
    pub use_stopwatch: bool,

    /// Log every store call
    #[arg(long)]
    pub use_logger: bool,

    /// Minimum severity written to stderr
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    File,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RulesArg {
    Default,
    Custom,
}

impl From<RulesArg> for RuleKind {
    fn from(arg: RulesArg) -> Self {
        match arg {
            RulesArg::Default => RuleKind::Default,
            RulesArg::Custom => RuleKind::Custom,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Whether store calls are wrapped for tracing
    pub fn observes_store(&self) -> bool {
        self.use_logger || self.use_stopwatch
    }

    /// Effective minimum log severity.
    ///
    /// Store call tracing is logged at TRACE, so enabling it lowers the
    /// threshold to TRACE.
    pub fn min_severity(&self) -> Severity {
        if self.observes_store() {
            Severity::Trace
        } else {
            self.log_level.into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["filecabinet"]).unwrap();
        assert_eq!(cli.storage, StorageKind::Memory);
        assert_eq!(cli.path, PathBuf::from("cabinet.db"));
        assert_eq!(cli.validation_rules, RulesArg::Default);
        assert!(cli.rules_file.is_none());
        assert!(!cli.observes_store());
        assert_eq!(cli.min_severity(), Severity::Warn);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "filecabinet",
            "-s",
            "file",
            "--path",
            "/tmp/records.db",
            "--validation-rules",
            "custom",
            "--rules-file",
            "rules.json",
            "--use-stopwatch",
            "--log-level",
            "error",
        ])
        .unwrap();
        assert_eq!(cli.storage, StorageKind::File);
        assert_eq!(cli.validation_rules, RulesArg::Custom);
        assert_eq!(RuleKind::from(cli.validation_rules), RuleKind::Custom);
        assert!(cli.use_stopwatch);
        assert_eq!(cli.min_severity(), Severity::Trace);
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["filecabinet", "--storage", "cloud"]).is_err());
    }
}
