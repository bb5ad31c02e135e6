//! Command-line argument parsing for toolgate
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// toolgate - Secure execution broker for allow-listed security tools
#[derive(Parser, Debug)]
#[command(name = "toolgate")]
#[command(version)]
#[command(about = "Broker allow-listed security tool runs against lab targets", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a single tool invocation
    Run {
        /// Logical tool name (see `toolgate list`)
        #[arg(short, long)]
        tool: String,

        /// Target address, CIDR, hostname, or URL
        #[arg(short = 'T', long)]
        target: String,

        /// Extra arguments in shell-word syntax (validated, never shelled)
        #[arg(short, long, default_value = "", allow_hyphen_values = true)]
        args: String,

        /// Timeout override in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Validate and resolve only; do not spawn
        #[arg(long)]
        dry_run: bool,
    },

    /// List registered tools
    List,

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Default tracing filter directive for this level
    pub fn env_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }
}

/// Timeout override parsed from the run subcommand
pub fn timeout_override(timeout_secs: Option<u64>) -> Option<Duration> {
    timeout_secs.map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "toolgate", "run", "--tool", "nmap", "--target", "10.0.0.5", "--args", "-p 80",
        ]);
        match args.command {
            Commands::Run {
                tool,
                target,
                args,
                timeout,
                dry_run,
            } => {
                assert_eq!(tool, "nmap");
                assert_eq!(target, "10.0.0.5");
                assert_eq!(args, "-p 80");
                assert_eq!(timeout, None);
                assert!(!dry_run);
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = Args::parse_from(["toolgate", "list"]);
        assert_eq!(args.verbosity(), Verbosity::Normal);

        let args = Args::parse_from(["toolgate", "-v", "list"]);
        assert_eq!(args.verbosity(), Verbosity::Verbose);

        let args = Args::parse_from(["toolgate", "-vv", "list"]);
        assert_eq!(args.verbosity(), Verbosity::VeryVerbose);

        let args = Args::parse_from(["toolgate", "-q", "list"]);
        assert_eq!(args.verbosity(), Verbosity::Quiet);
        assert_eq!(args.verbosity().env_filter(), "error");
    }

    #[test]
    fn test_timeout_override() {
        assert_eq!(timeout_override(Some(5)), Some(Duration::from_secs(5)));
        assert_eq!(timeout_override(None), None);
    }
}
