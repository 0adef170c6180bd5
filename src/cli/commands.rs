//! CLI argument definitions.
//!
//! This module defines the command-line arguments using clap.

use clap::Parser;
use std::path::PathBuf;

/// invgen - Compile an environment description into Kubespray and HAProxy inventories.
#[derive(Parser, Debug)]
#[command(name = "invgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Environment to compile (a folder under `Environments/`).
    pub environment: String,

    /// Resolve and validate addresses without generating or writing anything.
    #[arg(long)]
    pub test: bool,

    /// Project root containing `Environments/`, `Kubespray/` and `Ansible/`.
    #[arg(long, env = "INVGEN_ROOT", default_value = ".")]
    pub root: PathBuf,

    /// YAML file mapping hostnames (and `virtual_ip`) to discovered addresses.
    #[arg(long, value_name = "FILE")]
    pub discovered: Option<PathBuf>,

    /// Refuse prefix-derived fallback addresses.
    #[arg(long)]
    pub strict: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["invgen", "lab"]).unwrap();
        assert_eq!(cli.environment, "lab");
        assert!(!cli.test);
        assert!(!cli.strict);
        assert!(cli.discovered.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "invgen",
            "prod",
            "--test",
            "--root",
            "/srv/infra",
            "--discovered",
            "ips.yml",
            "--output",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(cli.test);
        assert!(cli.verbose);
        assert_eq!(cli.root, PathBuf::from("/srv/infra"));
        assert_eq!(cli.discovered, Some(PathBuf::from("ips.yml")));
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_environment_required() {
        assert!(Cli::try_parse_from(["invgen"]).is_err());
    }
}
