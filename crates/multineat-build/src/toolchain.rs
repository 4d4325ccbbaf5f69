//! External toolchain invocation
//!
//! The C++ compiler and the Cython binding generator are external programs.
//! The scheduler only sees the [`Compiler`] trait, so tests and alternative
//! toolchains plug in without touching scheduling.

use crate::scheduler::CompilationJob;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Compiles one job's input into its object file.
///
/// A single compiler is shared by every worker in the pool, so `compile`
/// must be safe to call concurrently for disjoint source/object pairs.
/// Spawning one compiler process per file satisfies this.
pub trait Compiler: Sync {
    fn compile(&self, job: &CompilationJob) -> Result<(), String>;
}

/// Compiler driven through a command-line C++ compiler
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandCompiler {
    fn default() -> Self {
        Self::new("c++")
    }
}

impl Compiler for CommandCompiler {
    fn compile(&self, job: &CompilationJob) -> Result<(), String> {
        if let Some(parent) = job.object.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("cannot create {}: {}", parent.display(), e))?;
        }

        debug!(compiler = %self.program, input = %job.input.display(), "Invoking compiler");

        let output = Command::new(&self.program)
            .arg("-fPIC")
            .args(&job.flags)
            .arg("-c")
            .arg(&job.input)
            .arg("-o")
            .arg(&job.object)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| format!("failed to run '{}': {}", self.program, e))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(format!(
                "'{}' exited with code {}: {}",
                self.program,
                output.status.code().unwrap_or(1),
                stderr.trim()
            ))
        }
    }
}

/// Tool that turns a binding interface file into compilable C++
pub trait BindingGenerator {
    /// Short tool name used in diagnostics
    fn name(&self) -> &str;

    /// Whether the tool can be invoked on this host
    fn is_available(&self) -> bool;

    /// Generate `output` from `interface`
    fn generate(&self, interface: &Path, output: &Path) -> Result<(), String>;
}

/// Cython invoked in C++ mode
#[derive(Debug, Clone)]
pub struct CythonGenerator {
    program: String,
}

impl CythonGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CythonGenerator {
    fn default() -> Self {
        Self::new("cython")
    }
}

impl BindingGenerator for CythonGenerator {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn generate(&self, interface: &Path, output: &Path) -> Result<(), String> {
        let result = Command::new(&self.program)
            .arg("--cplus")
            .arg("-3")
            .arg(interface)
            .arg("-o")
            .arg(output)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| format!("failed to run '{}': {}", self.program, e))?;

        if result.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&result.stderr).trim().to_string())
        }
    }
}
