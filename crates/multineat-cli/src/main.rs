use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod build;

/// Build the MultiNEAT native extension module.
///
/// Selects a binding strategy, derives platform compiler flags and compiles
/// every source in parallel, one worker per physical core. The resulting
/// build target descriptor is written next to the objects for the link step.
///
/// EXAMPLES:
///     mn-build                           Build the pregenerated _MultiNEAT.cpp
///     MN_BUILD=cython mn-build           Generate bindings with Cython, then build
///     mn-build --strategy boost -j 4     Boost.Python bindings on four workers
///     mn-build --dry-run --json          Print the build target without compiling
///
/// ENVIRONMENT VARIABLES:
///     MN_BUILD    Binding strategy: 'cython' or 'boost'
///     PREFIX      Install prefix; adds <PREFIX>/include to the include path
///     CXX         C++ compiler program
///     RUST_LOG    Log filter (overrides -v)
#[derive(Parser)]
#[command(name = "mn-build")]
#[command(version)]
pub(crate) struct Cli {
    /// Project root containing src/ and the binding sources
    #[arg(long, short = 'C', default_value = ".")]
    pub project_dir: PathBuf,
    /// Binding strategy (overrides MN_BUILD)
    #[arg(long, short = 's')]
    pub strategy: Option<String>,
    /// Install prefix (overrides PREFIX)
    #[arg(long)]
    pub prefix: Option<String>,
    /// Python major version the module is built for
    #[arg(long)]
    pub python_major: Option<u32>,
    /// Number of parallel compilation jobs (defaults to physical cores)
    #[arg(long, short = 'j')]
    pub jobs: Option<usize>,
    /// C++ compiler program
    #[arg(long, env = "CXX")]
    pub compiler: Option<String>,
    /// Object output directory, relative to the project root
    #[arg(long)]
    pub target_dir: Option<PathBuf>,
    /// Path to configuration file (defaults to multineat-build.toml in the project)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
    /// Resolve and print the build target without compiling
    #[arg(long)]
    pub dry_run: bool,
    /// JSON output
    #[arg(long)]
    pub json: bool,
    /// Verbose output
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Quiet output (errors only)
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

fn init_logging(cli: &Cli) {
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    build::run(&cli)
}
