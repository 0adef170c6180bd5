//! invgen CLI entrypoint.
//!
//! This is the main entrypoint for the invgen command-line tool.

use std::process::ExitCode;

use invgen::cli::{Cli, OutputFormatter};
use invgen::compiler::{CompilationMode, CompilationReport, InventoryCompiler};
use invgen::config::{ConfigParser, ConfigValidator, EnvironmentConfig};
use invgen::error::Result;
use invgen::network::{AddressDiscovery, AddressResolver, StaticDiscovery, TableDiscovery};
use invgen::writer::ArtifactWriter;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    let formatter = OutputFormatter::new(cli.output);
    match run(&cli) {
        Ok(report) => {
            eprintln!("{}", formatter.format_report(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e));
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads, validates and compiles one environment.
fn run(cli: &Cli) -> Result<CompilationReport> {
    let parser = ConfigParser::new(&cli.root);
    parser.load_dotenv()?;

    let config = parser.load_environment(&cli.environment)?;
    let validation = ConfigValidator::new().validate(&config)?;
    for warning in &validation.warnings {
        warn!("{warning}");
    }

    let report = match &cli.discovered {
        Some(path) => compile(cli, &config, TableDiscovery::from_file(path)?)?,
        None => compile(cli, &config, StaticDiscovery::new())?,
    };
    Ok(report.with_warnings(validation.warnings))
}

/// Runs the requested pipeline with a discovery capability.
fn compile<D: AddressDiscovery>(
    cli: &Cli,
    config: &EnvironmentConfig,
    discovery: D,
) -> Result<CompilationReport> {
    let mut compiler = InventoryCompiler::with_discovery(discovery);
    if cli.strict {
        debug!("Computed default addresses are disabled");
        compiler = compiler.with_resolver(AddressResolver::strict());
    }

    if cli.test {
        let table = compiler.check(config)?;
        info!("Test mode: nothing written");
        return Ok(CompilationReport::new(config, CompilationMode::Check, &table));
    }

    let output = compiler.compile(config)?;
    let written = ArtifactWriter::new(&cli.root).write_all(&config.environment, &output.artifacts)?;

    Ok(
        CompilationReport::new(config, CompilationMode::Generate, &output.table)
            .with_fingerprint(&output.fingerprint)
            .with_written(written),
    )
}
