//! # yass_build
//!
//! Build-and-package orchestrator for the yass application.
//!
//! The crate drives an external toolchain (cmake, ninja, strip, codesign,
//! tar, ...) through a [`ProcessRunner`] and assembles release archives with
//! an [`Archiver`]. A [`Pipeline`] sequences the stages for one target.
//!
//! ## Usage
//!
//! ```bash
//! yass_build                                  # build and package for the host
//! yass_build --dry-run --system linux --arch arm64 --sysroot /opt/sysroot
//! yass_build --nc --no-packaging              # incremental build only
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod process;
pub mod report;

pub use archive::{ArchiveFormat, Archiver};
pub use config::BuildConfig;
pub use error::{BuildError, Result};
pub use pipeline::{ArchiveManifest, Pipeline};
pub use platform::TargetSystem;
pub use process::{FailurePolicy, Invocation, ProcessRunner, RunOutcome};
pub use report::{LogReporter, Reporter};
