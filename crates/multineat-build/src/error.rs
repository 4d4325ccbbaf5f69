/// Build system error types
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{0}")]
    Configuration(String),

    #[error("Unknown build strategy '{value}': expected one of {}", crate::strategy::ACCEPTED_SIGNALS.join(", "))]
    UnknownStrategy { value: String },

    #[error("Required tool '{tool}' is not available: {hint}")]
    MissingTool { tool: String, hint: String },

    #[error("Unsupported platform: {0}")]
    PlatformUnsupported(String),

    #[error("Compilation failed for '{source_file}': {error}")]
    Compilation { source_file: PathBuf, error: String },

    #[error("Binding generator '{tool}' failed: {error}")]
    Generator { tool: String, error: String },

    #[error("Invalid target configuration: {0}")]
    InvalidTarget(String),

    #[error("Failed to load configuration at {path}: {error}")]
    Config { path: PathBuf, error: String },

    #[error("I/O error at {path}: {error}")]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("Failed to start compilation pool: {0}")]
    ThreadPool(String),
}

impl BuildError {
    /// Create the error raised when no strategy can be determined
    pub fn no_strategy() -> Self {
        Self::Configuration(
            "No build strategy selected and no pregenerated source present. \
             Set MN_BUILD to 'cython' or 'boost', e.g. `export MN_BUILD=cython`"
                .to_string(),
        )
    }

    /// Create an unknown strategy error
    pub fn unknown_strategy(value: impl Into<String>) -> Self {
        Self::UnknownStrategy {
            value: value.into(),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(tool: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            hint: hint.into(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            error,
        }
    }

    /// Create a compilation error
    pub fn compilation(source: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::Compilation {
            source_file: source.into(),
            error: error.to_string(),
        }
    }

    /// Create a generator error
    pub fn generator(tool: impl Into<String>, error: impl ToString) -> Self {
        Self::Generator {
            tool: tool.into(),
            error: error.to_string(),
        }
    }
}
