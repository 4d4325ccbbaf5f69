//! MultiNEAT extension module build infrastructure
//!
//! Provides build orchestration for the `MultiNEAT._MultiNEAT` module including:
//! - Binding strategy resolution (pregenerated, Cython, Boost.Python)
//! - Platform profiles (compiler flags, include and library paths)
//! - Build target assembly
//! - Parallel compilation over a bounded worker pool

pub mod builder;
pub mod config;
pub mod context;
pub mod error;
pub mod platform;
pub mod scheduler;
pub mod strategy;
pub mod targets;
pub mod toolchain;

// Re-export main types
pub use builder::{BuildOutput, BuildStats, Builder, DESCRIPTOR_FILE_NAME};
pub use config::{BuildConfig, CONFIG_FILE_NAME};
pub use context::{BuildContext, PREFIX_ENV, STRATEGY_ENV};
pub use error::{BuildError, BuildResult};
pub use platform::{OsFamily, PlatformProfile};
pub use scheduler::{CompilationJob, JobOutcome, JobTable, ScheduleReport, Scheduler};
pub use strategy::{resolve, PythonMajor, Resolution, StrategySignal, Variant};
pub use targets::{BuildTarget, ALGORITHM_SOURCES, MODULE_NAME};
pub use toolchain::{BindingGenerator, CommandCompiler, Compiler, CythonGenerator};
