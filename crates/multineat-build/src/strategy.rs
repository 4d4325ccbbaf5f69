//! Binding strategy resolution
//!
//! Decides which of the three binding variants to build and what each one
//! contributes to the target: the leading source file, extra compiler flags,
//! link libraries and library directories.

use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use crate::platform::OsFamily;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Binding source shipped in source distributions
pub const PREGENERATED_SOURCE: &str = "_MultiNEAT.cpp";
/// Cython interface file
pub const CYTHON_INTERFACE: &str = "_MultiNEAT.pyx";
/// Boost.Python glue
pub const BOOST_GLUE_SOURCE: &str = "src/PythonBindings.cpp";

/// Signal values accepted in MN_BUILD
pub const ACCEPTED_SIGNALS: &[&str] = &["cython", "generated-binding", "boost", "native-binding"];

const HIGH_OPT_FLAG: &str = "-O3";

const BOOST_DEFINES: [&str; 3] = ["-DUSE_BOOST_PYTHON", "-DUSE_BOOST_RANDOM", "-DUSE_BOOST_NUMPY"];

const BOOST_LIBRARY_DIRS: [&str; 3] = ["C:/MinGW/lib", "C:/Boost/lib", "C:/Python36/libs"];

/// Explicit strategy request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategySignal {
    GeneratedBinding,
    NativeBinding,
}

impl StrategySignal {
    /// Parse a signal value
    pub fn parse(value: &str) -> BuildResult<Self> {
        match value {
            "cython" | "generated-binding" => Ok(Self::GeneratedBinding),
            "boost" | "native-binding" => Ok(Self::NativeBinding),
            other => Err(BuildError::unknown_strategy(other)),
        }
    }
}

/// Binding variant selected for a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Compile the shipped `_MultiNEAT.cpp`
    Pregenerated,
    /// Generate bindings with Cython
    GeneratedBinding,
    /// Boost.Python bindings
    NativeBinding,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pregenerated => "pregenerated",
            Self::GeneratedBinding => "generated-binding",
            Self::NativeBinding => "native-binding",
        }
    }

    /// Source file placed first in the target
    pub fn leading_source(&self) -> &'static str {
        match self {
            Self::Pregenerated => PREGENERATED_SOURCE,
            Self::GeneratedBinding => CYTHON_INTERFACE,
            Self::NativeBinding => BOOST_GLUE_SOURCE,
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Python line the extension targets, as far as library naming cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PythonMajor {
    /// Python 2
    Legacy,
    /// Python 3 and later
    Modern,
}

impl PythonMajor {
    pub fn from_major(major: u32) -> Self {
        if major < 3 {
            Self::Legacy
        } else {
            Self::Modern
        }
    }
}

const BOOST_GENERIC_LIBS: &[&str] = &[
    "boost_python",
    "boost_numpy",
    "boost_system",
    "boost_filesystem",
    "boost_serialization",
    "boost_date_time",
    "boost_random",
];

// Visual Studio 2017 builds of Boost 1.71
const BOOST_VC141_LIBS: &[&str] = &[
    "boost_system-vc141-mt-x64-1_71",
    "boost_filesystem-vc141-mt-x64-1_71",
    "boost_wserialization-vc141-mt-x64-1_71",
    "boost_date_time-vc141-mt-x64-1_71",
    "boost_random-vc141-mt-x64-1_71",
    "boost_python36-vc141-mt-x64-1_71",
    "boost_numpy36-vc141-mt-x64-1_71",
    "python3",
];

/// Link libraries per platform, Python line and variant.
///
/// Windows names encode compiler ABI, threading model and Boost version, so
/// every supported combination is listed rather than computed.
const LIBRARY_MATRIX: &[((OsFamily, PythonMajor, Variant), &[&str])] = &[
    ((OsFamily::Posix, PythonMajor::Legacy, Variant::NativeBinding), BOOST_GENERIC_LIBS),
    ((OsFamily::Posix, PythonMajor::Modern, Variant::NativeBinding), BOOST_GENERIC_LIBS),
    ((OsFamily::Mac, PythonMajor::Legacy, Variant::NativeBinding), BOOST_GENERIC_LIBS),
    ((OsFamily::Mac, PythonMajor::Modern, Variant::NativeBinding), BOOST_GENERIC_LIBS),
    ((OsFamily::Windows, PythonMajor::Modern, Variant::NativeBinding), BOOST_VC141_LIBS),
];

/// Look up the link libraries for a combination
pub fn link_libraries(
    os_family: OsFamily,
    python: PythonMajor,
    variant: Variant,
) -> BuildResult<&'static [&'static str]> {
    if variant != Variant::NativeBinding {
        return Ok(&[]);
    }

    LIBRARY_MATRIX
        .iter()
        .find(|(key, _)| *key == (os_family, python, variant))
        .map(|(_, libs)| *libs)
        .ok_or_else(|| {
            BuildError::PlatformUnsupported(format!(
                "{} bindings require Python 3 or later on {}",
                variant, os_family
            ))
        })
}

/// What the selected strategy contributes to the build target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub variant: Variant,
    pub leading_source: PathBuf,
    pub extra_compile_flags: Vec<String>,
    pub extra_link_libraries: Vec<String>,
    pub extra_library_dirs: Vec<String>,
}

impl Resolution {
    fn new(variant: Variant) -> Self {
        Self {
            variant,
            leading_source: PathBuf::from(variant.leading_source()),
            extra_compile_flags: Vec::new(),
            extra_link_libraries: Vec::new(),
            extra_library_dirs: Vec::new(),
        }
    }

    fn with_flags(mut self, flags: &[&str]) -> Self {
        self.extra_compile_flags = to_strings(flags);
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Select the binding strategy for a build
pub fn resolve(context: &BuildContext) -> BuildResult<Resolution> {
    let resolution = match context.strategy_signal.as_deref() {
        None => {
            if !context.pregenerated_present {
                return Err(BuildError::no_strategy());
            }
            Resolution::new(Variant::Pregenerated).with_flags(&[HIGH_OPT_FLAG])
        }
        Some(value) => match StrategySignal::parse(value)? {
            StrategySignal::GeneratedBinding => {
                if !context.generator_available {
                    return Err(BuildError::missing_tool(
                        "cython",
                        "install Cython (`pip install cython`) or unset MN_BUILD to build the pregenerated source",
                    ));
                }
                Resolution::new(Variant::GeneratedBinding).with_flags(&[HIGH_OPT_FLAG])
            }
            StrategySignal::NativeBinding => resolve_native(context)?,
        },
    };

    info!(
        variant = %resolution.variant,
        leading_source = %resolution.leading_source.display(),
        "Resolved build strategy"
    );

    Ok(resolution)
}

fn resolve_native(context: &BuildContext) -> BuildResult<Resolution> {
    let python = PythonMajor::from_major(context.python_major);
    if context.os_family == OsFamily::Windows && python == PythonMajor::Legacy {
        return Err(BuildError::PlatformUnsupported(
            "Python prior to version 3 is not supported on Windows due to limits of the VC++ compiler version"
                .to_string(),
        ));
    }

    let libs = link_libraries(context.os_family, python, Variant::NativeBinding)?;
    debug!(libraries = libs.len(), "Selected Boost libraries");

    let mut resolution = Resolution::new(Variant::NativeBinding).with_flags(&BOOST_DEFINES);
    resolution.extra_link_libraries = to_strings(libs);
    resolution.extra_library_dirs = to_strings(&BOOST_LIBRARY_DIRS);
    Ok(resolution)
}
