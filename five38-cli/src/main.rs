//! five38 - browse the dataset projects of a GitHub repository
//!
//! Main entry point: parses flags, sets up logging, dispatches to the
//! catalog commands.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod catalog_cli;

use catalog_cli::CatalogCommand;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Log output formats
#[derive(Debug, Clone, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(
    name = "five38",
    about = "Browse the dataset projects published in a GitHub repository",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: CatalogCommand,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Log output format
    #[clap(long, default_value = "text", global = true)]
    log_format: LogFormat,

    /// Override configuration file path
    #[clap(long, global = true)]
    config: Option<PathBuf>,
}

/// Initialize tracing with CLI flags
///
/// Logs always go to stderr so command output on stdout stays parseable.
fn initialize_tracing(log_level: &LogLevel, log_format: &LogFormat) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    match log_format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, &cli.log_format);

    cli.command.execute(cli.config.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_walk_flags() {
        let cli = Cli::try_parse_from([
            "five38",
            "walk",
            "--query",
            "poll",
            "--depth",
            "2",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert!(matches!(cli.log_level, LogLevel::Debug));
        match cli.command {
            CatalogCommand::Walk { query, depth, json } => {
                assert_eq!(query.as_deref(), Some("poll"));
                assert_eq!(depth, 2);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
