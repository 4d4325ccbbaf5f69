//! Build context - environment and filesystem signals read once per build
//!
//! Everything the strategy resolver and profile builder depend on is
//! captured here up front, so resolution itself never consults the
//! environment.

use crate::platform::OsFamily;
use crate::strategy::{StrategySignal, PREGENERATED_SOURCE};
use crate::toolchain::BindingGenerator;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable selecting the build strategy
pub const STRATEGY_ENV: &str = "MN_BUILD";
/// Environment variable naming the install prefix
pub const PREFIX_ENV: &str = "PREFIX";

/// Python major version the extension is built against
pub const DEFAULT_PYTHON_MAJOR: u32 = 3;

/// Signals observed at build start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Project root containing `src/` and the binding sources
    pub root: PathBuf,
    /// Raw strategy signal (MN_BUILD)
    pub strategy_signal: Option<String>,
    /// Install prefix (PREFIX)
    pub install_prefix: Option<String>,
    /// Whether the pregenerated binding source exists in the project root
    pub pregenerated_present: bool,
    /// Whether the binding generator can be invoked
    pub generator_available: bool,
    pub os_family: OsFamily,
    pub python_major: u32,
}

impl BuildContext {
    /// Create a context with no signals set
    pub fn new(root: impl Into<PathBuf>, os_family: OsFamily) -> Self {
        Self {
            root: root.into(),
            strategy_signal: None,
            install_prefix: None,
            pregenerated_present: false,
            generator_available: false,
            os_family,
            python_major: DEFAULT_PYTHON_MAJOR,
        }
    }

    /// Read signals from the process environment and the project directory
    pub fn from_env(root: impl AsRef<Path>, generator: &dyn BindingGenerator) -> Self {
        Self::from_lookup(root, generator, |key| env::var(key).ok())
    }

    /// Read signals through an arbitrary variable lookup.
    ///
    /// The generator is only invoked when the signal selects the generated
    /// binding; every other signal leaves `generator_available` false.
    pub fn from_lookup<F>(root: impl AsRef<Path>, generator: &dyn BindingGenerator, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = root.as_ref().to_path_buf();
        let pregenerated_present = root.join(PREGENERATED_SOURCE).is_file();
        let strategy_signal = lookup(STRATEGY_ENV);
        let generator_available = matches!(
            strategy_signal.as_deref().map(StrategySignal::parse),
            Some(Ok(StrategySignal::GeneratedBinding))
        ) && generator.is_available();

        Self {
            strategy_signal,
            install_prefix: lookup(PREFIX_ENV),
            pregenerated_present,
            generator_available,
            os_family: OsFamily::host(),
            python_major: DEFAULT_PYTHON_MAJOR,
            root,
        }
    }

    pub fn with_strategy_signal(mut self, signal: Option<String>) -> Self {
        self.strategy_signal = signal;
        self
    }

    pub fn with_install_prefix(mut self, prefix: Option<String>) -> Self {
        self.install_prefix = prefix;
        self
    }

    pub fn with_pregenerated(mut self, present: bool) -> Self {
        self.pregenerated_present = present;
        self
    }

    pub fn with_generator_available(mut self, available: bool) -> Self {
        self.generator_available = available;
        self
    }

    pub fn with_os_family(mut self, os_family: OsFamily) -> Self {
        self.os_family = os_family;
        self
    }

    pub fn with_python_major(mut self, major: u32) -> Self {
        self.python_major = major;
        self
    }
}
