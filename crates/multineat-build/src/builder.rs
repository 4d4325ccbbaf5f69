//! Build orchestration and pipeline management
use crate::config::BuildConfig;
use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use crate::platform::PlatformProfile;
use crate::scheduler::{JobTable, ScheduleReport, Scheduler};
use crate::strategy::{self, Variant, PREGENERATED_SOURCE};
use crate::targets::BuildTarget;
use crate::toolchain::{BindingGenerator, Compiler};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Descriptor file written next to the objects for the link step
pub const DESCRIPTOR_FILE_NAME: &str = "build_target.json";

/// Build statistics
#[derive(Debug, Clone)]
pub struct BuildStats {
    pub variant: Variant,
    /// Worker threads in the compilation pool
    pub workers: usize,
    pub total_sources: usize,
    pub compiled_sources: usize,
    pub skipped_sources: usize,
    /// Time spent in the binding generator
    pub generation_time: Duration,
    pub compilation_time: Duration,
    pub total_time: Duration,
}

/// Result of a successful build
#[derive(Debug)]
pub struct BuildOutput {
    pub target: BuildTarget,
    pub report: ScheduleReport,
    pub stats: BuildStats,
    /// Where the target descriptor was written
    pub descriptor_path: PathBuf,
}

/// Main builder for the extension module.
///
/// The project root always comes from the [`BuildContext`], so strategy
/// detection and compilation look at the same tree.
#[derive(Debug, Clone, Default)]
pub struct Builder {
    config: BuildConfig,
}

impl Builder {
    /// Create a new builder with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the object directory
    pub fn with_target_dir(mut self, target_dir: PathBuf) -> Self {
        self.config.target_dir = target_dir;
        self
    }

    /// Set the number of compilation workers
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.config.jobs = jobs;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Object directory resolved against a project root
    pub fn target_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.config.target_dir)
    }

    /// Resolve the strategy and assemble the target without compiling
    pub fn plan(&self, context: &BuildContext) -> BuildResult<BuildTarget> {
        let resolution = strategy::resolve(context)?;
        let profile = PlatformProfile::build(context.os_family, context.install_prefix.as_deref());
        debug!(flags = ?profile.compiler_flags, os = %profile.os_family, "Derived platform profile");

        let target = BuildTarget::assemble(&resolution, &profile);
        target.validate().map_err(BuildError::InvalidTarget)?;
        Ok(target)
    }

    /// Execute the build
    pub fn build(
        &self,
        context: &BuildContext,
        compiler: &dyn Compiler,
        generator: &dyn BindingGenerator,
    ) -> BuildResult<BuildOutput> {
        let build_start = Instant::now();

        let target = self.plan(context)?;
        info!(module = %target.module_name, variant = %target.variant, "Building extension module");

        let generation_time = if target.variant == Variant::GeneratedBinding {
            self.generate_bindings(&context.root, &target, generator)?
        } else {
            Duration::ZERO
        };

        let target_dir = self.target_dir(&context.root);
        let table = JobTable::plan(&target, &context.root, &target_dir);
        let scheduler = match self.config.jobs {
            Some(jobs) => Scheduler::new(jobs),
            None => Scheduler::with_physical_cores(),
        };

        let compile_start = Instant::now();
        let report = scheduler
            .run(&target.sources, &table, compiler)?
            .into_result()?;
        let compilation_time = compile_start.elapsed();

        let descriptor_path = self.write_descriptor(&target, &target_dir)?;

        let stats = BuildStats {
            variant: target.variant,
            workers: report.workers,
            total_sources: target.sources.len(),
            compiled_sources: report.compiled_count(),
            skipped_sources: report.skipped_count(),
            generation_time,
            compilation_time,
            total_time: build_start.elapsed(),
        };

        info!(
            compiled = stats.compiled_sources,
            workers = stats.workers,
            seconds = stats.total_time.as_secs_f64(),
            "Build completed"
        );

        Ok(BuildOutput {
            target,
            report,
            stats,
            descriptor_path,
        })
    }

    /// Run the binding generator over the target's interface file
    fn generate_bindings(
        &self,
        root: &Path,
        target: &BuildTarget,
        generator: &dyn BindingGenerator,
    ) -> BuildResult<Duration> {
        let start = Instant::now();
        let interface = match target.leading_source() {
            Some(source) => root.join(source),
            None => return Err(BuildError::InvalidTarget("target has no sources".to_string())),
        };
        let output = root.join(PREGENERATED_SOURCE);

        info!(tool = generator.name(), interface = %interface.display(), "Generating bindings");
        generator
            .generate(&interface, &output)
            .map_err(|e| BuildError::generator(generator.name(), e))?;

        Ok(start.elapsed())
    }

    fn write_descriptor(&self, target: &BuildTarget, target_dir: &Path) -> BuildResult<PathBuf> {
        fs::create_dir_all(target_dir).map_err(|e| BuildError::io(target_dir, e))?;

        let path = target_dir.join(DESCRIPTOR_FILE_NAME);
        let json = serde_json::to_string_pretty(target)
            .map_err(|e| BuildError::InvalidTarget(e.to_string()))?;
        fs::write(&path, json).map_err(|e| BuildError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::OsFamily;

    #[test]
    fn test_target_dir_relative_to_root() {
        let builder = Builder::new().with_target_dir(PathBuf::from("out"));
        assert_eq!(
            builder.target_dir(Path::new("/project")),
            PathBuf::from("/project/out")
        );
    }

    #[test]
    fn test_plan_propagates_resolver_error() {
        let builder = Builder::new();
        let ctx = BuildContext::new("/project", OsFamily::Posix);
        assert!(matches!(
            builder.plan(&ctx).unwrap_err(),
            BuildError::Configuration(_)
        ));
    }

    #[test]
    fn test_with_jobs() {
        let builder = Builder::new().with_jobs(Some(2));
        assert_eq!(builder.config().jobs, Some(2));
    }
}
