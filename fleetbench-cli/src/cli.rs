//! CLI argument parsing definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the tests come from and what they run against
#[derive(Args, Debug, Clone)]
pub struct TestSource {
    /// Path to the test document (YAML mapping of test name to definition)
    #[arg(long, value_name = "PATH")]
    pub tests: PathBuf,

    /// Path to the fleet description the tests run against
    #[arg(long, value_name = "PATH")]
    pub fleet: PathBuf,

    /// The test document is base64-encoded YAML
    #[arg(long)]
    pub base64: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every test in a document, stopping at the first invalid one
    Run {
        #[command(flatten)]
        source: TestSource,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Check every test in a document against the fleet without running it
    Validate {
        #[command(flatten)]
        source: TestSource,
    },

    /// Show the batch plan of every test without running it
    Plan {
        #[command(flatten)]
        source: TestSource,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        output: OutputFormat,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        #[arg(long, value_name = "PATH")]
        config_file: PathBuf,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output file path
        #[arg(long, value_name = "PATH")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration in use
    Show {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },
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
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "fleetbench",
            "--log-level",
            "debug",
            "run",
            "--tests",
            "tests.yaml",
            "--fleet",
            "fleet.yaml",
            "--base64",
            "--output",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Run { source, output } => {
                assert_eq!(source.tests, PathBuf::from("tests.yaml"));
                assert_eq!(source.fleet, PathBuf::from("fleet.yaml"));
                assert!(source.base64);
                assert_eq!(output, OutputFormat::Json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_run_requires_fleet() {
        assert!(Cli::try_parse_from(["fleetbench", "run", "--tests", "tests.yaml"]).is_err());
    }

    #[test]
    fn test_parse_config_generate() {
        let cli = Cli::try_parse_from([
            "fleetbench",
            "config",
            "generate",
            "--output",
            "fleetbench.yaml",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Config {
                config_cmd: ConfigCommands::Generate { force: false, .. }
            }
        ));
    }
}
