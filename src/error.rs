//! Error types for yass_build operations.
//!
//! Leaf code never terminates the process. Every failure is returned as a
//! [`BuildError`] and propagated to `main`, which prints a single fatal line
//! together with recovery suggestions and exits with a non-zero status.

use std::{
    fmt::Display,
    io,
    path::{self, PathBuf},
    process::ExitStatus,
};
use thiserror::Error;

/// Result type alias for yass_build operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Main error type for all yass_build operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BuildError {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// External process errors
    #[error("{0}")]
    Process(#[from] ProcessError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Operation that failed (e.g., "reading license file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Generic I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Zip container error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Error walking a directory tree
    #[error("{0}")]
    Walkdir(#[from] walkdir::Error),

    /// Path prefix stripping error
    #[error("{0}")]
    StripPrefix(#[from] path::StripPrefixError),

    /// Failed to move a finished temporary file into place
    #[error("failed to persist {path}: {error}")]
    Persist {
        /// Final destination
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Generic error with custom message
    #[error("{0}")]
    Generic(String),
}

/// Errors raised while running external commands
#[derive(Error, Debug)]
pub enum ProcessError {
    /// Invocation had no program to run
    #[error("Cannot run an empty command")]
    EmptyCommand,

    /// The executable could not be started
    #[error("Command \"{command}\" failed to start: {source}")]
    Spawn {
        /// Rendered argument list
        command: String,
        /// Underlying error (not found, permission denied, ...)
        #[source]
        source: io::Error,
    },

    /// Reading the child's output or waiting for it failed
    #[error("Command \"{command}\" failed while {operation}: {source}")]
    Io {
        /// Rendered argument list
        command: String,
        /// What the runner was doing
        operation: &'static str,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The process ran but reported failure
    #[error("Command \"{command}\" failed with {status}{}", stderr_suffix(.stderr))]
    ExitStatus {
        /// Rendered argument list
        command: String,
        /// Exit status reported by the OS
        status: ExitStatus,
        /// Captured standard error (only for captured invocations)
        stderr: Option<String>,
    },
}

fn stderr_suffix(stderr: &Option<String>) -> String {
    match stderr.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => format!(":\n{text}"),
        _ => String::new(),
    }
}

impl ProcessError {
    /// Rendered command this error refers to, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            ProcessError::EmptyCommand => None,
            ProcessError::Spawn { command, .. }
            | ProcessError::Io { command, .. }
            | ProcessError::ExitStatus { command, .. } => Some(command),
        }
    }
}

/// Invalid or inconsistent build configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No CMakeLists.txt at the source root
    #[error("Cannot find top dir of the source tree: {} has no CMakeLists.txt", path.display())]
    SourceTreeNotFound {
        /// Directory that was searched
        path: PathBuf,
    },

    /// Architecture not supported for the target system
    #[error("Invalid arch {arch} for system {system}")]
    UnsupportedArch {
        /// Target system name
        system: String,
        /// Requested architecture
        arch: String,
    },

    /// Unknown Visual C++ target architecture
    #[error("Invalid msvc target arch: {0}")]
    InvalidMsvcArch(String),
}

impl BuildError {
    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            BuildError::Context(_, inner) => inner.recovery_suggestions(),
            BuildError::Config(ConfigError::SourceTreeNotFound { .. }) => vec![
                "Run from the top of the source tree or pass --source-dir".to_string(),
            ],
            BuildError::Config(ConfigError::UnsupportedArch { .. }) => vec![
                "Pass a supported architecture with --arch (e.g. amd64, arm64, x86)".to_string(),
            ],
            BuildError::Config(ConfigError::InvalidMsvcArch(_)) => vec![
                "Run from a Visual Studio developer prompt or pass --msvc-tgt-arch (x86, x64, arm, arm64)"
                    .to_string(),
            ],
            BuildError::Process(ProcessError::Spawn { .. }) => vec![
                "Ensure the tool is installed and available on PATH".to_string(),
            ],
            BuildError::Process(ProcessError::ExitStatus { .. }) => vec![
                "Inspect the command output above for the underlying failure".to_string(),
                "Re-run with --nc to keep the previous build directory".to_string(),
            ],
            _ => Vec::new(),
        }
    }
}

/// Trait for adding context to errors.
///
/// Works with both `Result<T>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| BuildError::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| BuildError::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| BuildError::Generic(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| BuildError::Generic(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying license".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| BuildError::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Early return with a [`BuildError::Generic`].
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::BuildError::Generic(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::error::BuildError::Generic($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::BuildError::Generic(format!($fmt, $($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_inner_error() {
        let result: Result<()> = Err(BuildError::Generic("disk full".into()));
        let err = result.context("writing archive").unwrap_err();
        assert_eq!(err.to_string(), "writing archive: disk full");
    }

    #[test]
    fn fs_context_includes_path() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.fs_context("reading file", "/tmp/LICENSE").unwrap_err();
        assert_eq!(err.to_string(), "reading file /tmp/LICENSE: gone");
    }

    #[test]
    fn spawn_error_names_command() {
        let err = BuildError::from(ProcessError::Spawn {
            command: "nonexistent-tool-xyz --flag".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        });
        assert!(err.to_string().contains("nonexistent-tool-xyz"));
        assert!(!err.recovery_suggestions().is_empty());
    }
}
