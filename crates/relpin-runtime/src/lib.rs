//! Host integration for relpin: where Erlang/OTP lives and what is installed there.
//!
//! This crate implements the host side of release generation: configuration loading
//! (`HostConfig`), the `HostRuntime` trait with the real `OtpInstallation` and a
//! `MockRuntime`, code path assembly, the per-application `PackageIndex`, and the
//! installed-version scanner that classifies lookup problems.

pub mod config;
pub mod host;
pub mod index;
pub mod mock;
pub mod scan;

pub use config::HostConfig;
pub use host::{compare_versions, code_path_for, HostRuntime, OtpInstallation};
pub use index::{InstalledApplication, Lookup, PackageIndex};
pub use mock::MockRuntime;
pub use scan::{scan_release, MissingApp, Problem, ScanError, ScanReport, UnlistedDependency};

use relpin_schema::AppFileError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no Erlang/OTP installation found: {0}")]
    HostNotFound(String),
    #[error("cannot determine the ERTS version of the installation at {0}")]
    UnknownRuntimeVersion(String),
    #[error("invalid application resource file {path}: {source}")]
    AppFile {
        path: String,
        #[source]
        source: AppFileError,
    },
    #[error("application resource file {path} declares application '{declared}', expected '{expected}'")]
    AppNameMismatch {
        path: String,
        declared: String,
        expected: String,
    },
    #[error("invalid host configuration {path}: {reason}")]
    Config { path: String, reason: String },
}
