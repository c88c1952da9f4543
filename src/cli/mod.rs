//! CLI command definitions and handlers

mod analyze;
mod init;
mod report;
mod serve;

use crate::config::ServiceConfig;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Code quality service for Python uploads
///
/// Runs pylint and radon on uploaded files, stores the results and renders
/// PDF reports.
#[derive(Parser, Debug)]
#[command(name = "code-quality")]
#[command(
    version,
    about = "Python code quality service: complexity, code smells, maintainability and PDF reports",
    after_help = "\
Examples:
  code-quality                              Start the HTTP service (same as `serve`)
  code-quality serve --bind 127.0.0.1:9000  Listen on a different address
  code-quality analyze app.py               Print the analysis of one file as JSON
  code-quality report result.json -o r.pdf  Render a PDF from a saved report request
  code-quality init                         Write an example code-quality.toml"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Config file (default: ./code-quality.toml, then the user config dir)
    #[arg(long, global = true, env = "CODE_QUALITY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Listen address, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },

    /// Analyze one file and print the result as JSON
    Analyze {
        /// Source file to analyze
        file: PathBuf,

        /// Also append the result to the configured store
        #[arg(long)]
        store: bool,
    },

    /// Render a PDF report from a report request JSON file ("-" for stdin)
    Report {
        request: PathBuf,

        /// Output path (default: <filename>_analysis.pdf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Write an example config file
    Init,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    if let Some(Commands::Init) = cli.command {
        return init::run(cli.config.as_deref());
    }

    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        None => serve::run(config, None),
        Some(Commands::Serve { bind }) => serve::run(config, bind),
        Some(Commands::Analyze { file, store }) => analyze::run(&config, &file, store),
        Some(Commands::Report { request, output }) => report::run(&request, output.as_deref()),
        Some(Commands::Init) => init::run(cli.config.as_deref()),
    }
}

/// Multi-threaded runtime for commands that need async I/O
fn runtime() -> Result<tokio::runtime::Runtime> {
    use anyhow::Context;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["code-quality"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from(["code-quality", "analyze", "a.py", "--store"]).unwrap();
        match cli.command {
            Some(Commands::Analyze { file, store }) => {
                assert_eq!(file, PathBuf::from("a.py"));
                assert!(store);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "code-quality",
            "serve",
            "--bind",
            "127.0.0.1:9000",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Some(Commands::Serve { bind: Some(_) })));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(Cli::try_parse_from(["code-quality", "--log-level", "loud"]).is_err());
    }
}
