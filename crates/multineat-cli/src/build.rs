//! Build command - resolve, compile and report the extension module build

use crate::Cli;
use anyhow::{Context, Result};
use multineat_build::{
    BuildConfig, BuildContext, BuildTarget, Builder, CommandCompiler, CythonGenerator,
};
use tracing::{debug, info};

/// Run the build
pub fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let generator = CythonGenerator::new(config.generator.clone());

    let mut context = BuildContext::from_env(&cli.project_dir, &generator)
        .with_python_major(config.python_major);
    if cli.strategy.is_some() {
        context = context.with_strategy_signal(cli.strategy.clone());
    }
    if cli.prefix.is_some() {
        context = context.with_install_prefix(cli.prefix.clone());
    }

    debug!(
        root = %context.root.display(),
        signal = ?context.strategy_signal,
        pregenerated = context.pregenerated_present,
        os = %context.os_family,
        "Read build context"
    );

    let compiler = CommandCompiler::new(config.compiler.clone());
    let builder = Builder::new().with_config(config);

    if cli.dry_run {
        let target = builder.plan(&context).context("Build failed")?;
        info!(variant = %target.variant, sources = target.sources.len(), "Planned build (dry run)");
        print_target(cli, &target)?;
        return Ok(());
    }

    let output = builder
        .build(&context, &compiler, &generator)
        .context("Build failed")?;

    if cli.json {
        let stats = &output.stats;
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "variant": stats.variant.name(),
                "module": output.target.module_name,
                "workers": stats.workers,
                "sources": stats.total_sources,
                "compiled": stats.compiled_sources,
                "skipped": stats.skipped_sources,
                "generation_time": stats.generation_time.as_secs_f64(),
                "compilation_time": stats.compilation_time.as_secs_f64(),
                "total_time": stats.total_time.as_secs_f64(),
                "descriptor": output.descriptor_path,
                "objects": output.report.object_paths(),
            })
        );
    } else if !cli.quiet {
        println!("\n{}", "=".repeat(60));
        println!(
            "Build succeeded in {:.2}s",
            output.stats.total_time.as_secs_f64()
        );
        println!("{}", "=".repeat(60));
        println!("  Module: {}", output.target.module_name);
        println!("  Strategy: {}", output.stats.variant);
        println!(
            "  Sources: {} compiled, {} skipped",
            output.stats.compiled_sources, output.stats.skipped_sources
        );
        println!("  Workers: {}", output.stats.workers);
        println!("  Descriptor: {}", output.descriptor_path.display());
        println!("{}", "=".repeat(60));
    }

    Ok(())
}

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<BuildConfig> {
    let mut config = match cli.config {
        Some(ref path) => BuildConfig::load_from_file(path),
        None => BuildConfig::load_from_directory(&cli.project_dir),
    }
    .context("Failed to load build configuration")?;

    if let Some(ref compiler) = cli.compiler {
        config.compiler = compiler.clone();
    }
    if let Some(ref target_dir) = cli.target_dir {
        config.target_dir = target_dir.clone();
    }
    if cli.jobs.is_some() {
        config.jobs = cli.jobs;
    }
    if let Some(major) = cli.python_major {
        config.python_major = major;
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid build configuration: {}", e))?;
    debug!(
        compiler = %config.compiler,
        generator = %config.generator,
        jobs = ?config.jobs,
        target_dir = %config.target_dir.display(),
        "Loaded build configuration"
    );
    Ok(config)
}

fn print_target(cli: &Cli, target: &BuildTarget) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(target)?);
    } else if !cli.quiet {
        println!("Module: {}", target.module_name);
        println!("Strategy: {}", target.variant);
        println!("Sources:");
        for source in &target.sources {
            println!("  {}", source.display());
        }
        println!("Compiler flags: {}", target.compiler_flags.join(" "));
        if !target.link_libraries.is_empty() {
            let libs: Vec<_> = target.link_libraries.iter().cloned().collect();
            println!("Link libraries: {}", libs.join(" "));
        }
    }
    Ok(())
}
