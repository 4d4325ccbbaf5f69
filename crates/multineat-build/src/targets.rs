/// Build target descriptor for the extension module
use crate::platform::{OsFamily, PlatformProfile};
use crate::strategy::{Resolution, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Python import path of the extension module
pub const MODULE_NAME: &str = "MultiNEAT._MultiNEAT";

/// NEAT algorithm sources compiled into every variant
pub const ALGORITHM_SOURCES: [&str; 10] = [
    "src/Genome.cpp",
    "src/Innovation.cpp",
    "src/NeuralNetwork.cpp",
    "src/Parameters.cpp",
    "src/PhenotypeBehavior.cpp",
    "src/Population.cpp",
    "src/Random.cpp",
    "src/Species.cpp",
    "src/Substrate.cpp",
    "src/Utils.cpp",
];

/// Fully resolved description of the module to compile and link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTarget {
    /// Dotted module name
    pub module_name: String,
    /// Binding variant the sources come from
    pub variant: Variant,
    pub os_family: OsFamily,
    /// Source files relative to the project root; the binding source comes first
    pub sources: Vec<PathBuf>,
    pub compiler_flags: Vec<String>,
    pub link_libraries: BTreeSet<String>,
    pub library_search_paths: BTreeSet<String>,
    pub include_search_paths: BTreeSet<String>,
}

impl BuildTarget {
    /// Merge a strategy resolution and a platform profile
    pub fn assemble(resolution: &Resolution, profile: &PlatformProfile) -> Self {
        let mut sources = Vec::with_capacity(ALGORITHM_SOURCES.len() + 1);
        sources.push(resolution.leading_source.clone());
        sources.extend(ALGORITHM_SOURCES.iter().map(PathBuf::from));

        let mut compiler_flags = profile.compiler_flags.clone();
        compiler_flags.extend(resolution.extra_compile_flags.iter().cloned());

        let mut link_libraries = profile.link_libraries.clone();
        link_libraries.extend(resolution.extra_link_libraries.iter().cloned());

        let mut library_search_paths = profile.library_search_paths.clone();
        library_search_paths.extend(resolution.extra_library_dirs.iter().cloned());

        Self {
            module_name: MODULE_NAME.to_string(),
            variant: resolution.variant,
            os_family: profile.os_family,
            sources,
            compiler_flags,
            link_libraries,
            library_search_paths,
            include_search_paths: profile.include_search_paths.clone(),
        }
    }

    /// Binding source placed first by the strategy
    pub fn leading_source(&self) -> Option<&PathBuf> {
        self.sources.first()
    }

    /// Shared object file name for the module (last dotted component)
    pub fn output_filename(&self) -> String {
        let stem = self
            .module_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.module_name);
        let extension = match self.os_family {
            OsFamily::Windows => "pyd",
            OsFamily::Posix | OsFamily::Mac => "so",
        };
        format!("{}.{}", stem, extension)
    }

    /// Validate the target configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.module_name.is_empty() {
            return Err("Module name cannot be empty".to_string());
        }

        if self.sources.is_empty() {
            return Err(format!("Target '{}' has no source files", self.module_name));
        }

        Ok(())
    }
}
