//! Platform profile derivation
//!
//! Turns the host's operating system family and an optional install prefix
//! into the compiler flags and search paths every compilation job shares.
//! Profiles are plain values: building one never touches the environment.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Flags present on every platform
const BASE_FLAGS: [&str; 3] = ["-march=native", "-mtune=native", "-g"];

/// Standard-library selector used with the macOS toolchain
pub const MAC_STDLIB_FLAG: &str = "-stdlib=libc++";
/// Language standard on macOS
pub const MAC_STD_FLAG: &str = "-std=c++11";
/// Language standard everywhere else
pub const GNU_STD_FLAG: &str = "-std=gnu++11";

/// Expected Boost install location on Windows hosts
pub const WINDOWS_INCLUDE_DIR: &str = "C:/Boost/include/";
pub const WINDOWS_LIBRARY_DIR: &str = "C:/Boost/lib";

/// Operating system family of the build host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Linux, BSDs and other Unix-likes
    Posix,
    /// macOS
    Mac,
    /// Windows
    Windows,
}

impl OsFamily {
    /// Family of the machine running the build
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Classify an OS name as reported by `std::env::consts::OS`.
    ///
    /// Cygwin hosts use the Windows Boost layout.
    pub fn from_os(os: &str) -> Self {
        match os {
            "macos" | "ios" => Self::Mac,
            "windows" | "cygwin" => Self::Windows,
            _ => Self::Posix,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::Mac => "mac",
            Self::Windows => "windows",
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Toolchain flags and paths for one operating environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub os_family: OsFamily,
    /// Compiler flags in the order they are passed
    pub compiler_flags: Vec<String>,
    pub link_libraries: BTreeSet<String>,
    pub library_search_paths: BTreeSet<String>,
    pub include_search_paths: BTreeSet<String>,
}

impl PlatformProfile {
    /// Derive the profile for an OS family and optional install prefix.
    ///
    /// An empty prefix is treated the same as no prefix.
    pub fn build(os_family: OsFamily, install_prefix: Option<&str>) -> Self {
        let mut profile = Self {
            os_family,
            compiler_flags: BASE_FLAGS.iter().map(|f| f.to_string()).collect(),
            link_libraries: BTreeSet::new(),
            library_search_paths: BTreeSet::new(),
            include_search_paths: BTreeSet::new(),
        };

        match os_family {
            OsFamily::Mac => {
                profile.push_flag(MAC_STDLIB_FLAG);
                profile.push_flag(MAC_STD_FLAG);
            }
            OsFamily::Posix | OsFamily::Windows => profile.push_flag(GNU_STD_FLAG),
        }

        if os_family == OsFamily::Windows {
            profile.add_include_dir(WINDOWS_INCLUDE_DIR);
            profile.add_library_dir(WINDOWS_LIBRARY_DIR);
        }

        if let Some(prefix) = install_prefix.filter(|p| !p.is_empty()) {
            profile.add_include_dir(&format!("{}/include", prefix));
        }

        profile
    }

    fn push_flag(&mut self, flag: &str) {
        self.compiler_flags.push(flag.to_string());
    }

    fn add_include_dir(&mut self, dir: &str) {
        self.push_flag(&format!("-I{}", dir));
        self.include_search_paths.insert(dir.to_string());
    }

    fn add_library_dir(&mut self, dir: &str) {
        self.push_flag(&format!("-L{}", dir));
        self.library_search_paths.insert(dir.to_string());
    }

    /// Whether a flag is part of this profile
    pub fn has_flag(&self, flag: &str) -> bool {
        self.compiler_flags.iter().any(|f| f == flag)
    }
}
