//! Release generation for relpin.
//!
//! This crate ties the schema and runtime crates together into the `Engine`: locate a
//! `.rel`/`.rel.src` template, resolve every listed application against the host's
//! installed packages, stamp the host ERTS version, and write the aligned descriptor
//! atomically.

pub mod engine;
pub mod template;

pub use engine::{write_atomic, Engine, GenerateOptions, GenerateResult, ResolveResult};
pub use template::{canonical_template_path, TemplateSource};

use relpin_runtime::{MissingApp, ScanError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unsupported template file {path}: expected a .rel or .rel.src extension")]
    UnsupportedExtension { path: String },
    #[error("{} application(s) could not be resolved: {}", .missing.len(), missing_names(.missing))]
    Resolution { missing: Vec<MissingApp> },
    #[error("cannot write {path}: {reason}")]
    Write { path: String, reason: String },
    #[error("template error: {0}")]
    Release(#[from] relpin_schema::ReleaseError),
    #[error("runtime error: {0}")]
    Runtime(#[from] relpin_runtime::RuntimeError),
}

impl From<ScanError> for CoreError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Unresolved { missing } => Self::Resolution { missing },
            ScanError::Runtime(e) => Self::Runtime(e),
        }
    }
}

impl CoreError {
    /// Diagnostic lines to print after the error itself.
    pub fn trace(&self) -> Vec<String> {
        if let Self::Resolution { missing } = self {
            return missing
                .iter()
                .map(|m| {
                    format!(
                        "no installed package for {} (declared version \"{}\")",
                        m.app, m.expected
                    )
                })
                .collect();
        }
        let summary = self.to_string();
        let mut lines = Vec::new();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let message = err.to_string();
            if !summary.contains(&message) {
                lines.push(format!("caused by: {message}"));
            }
            source = err.source();
        }
        lines
    }
}

fn missing_names(missing: &[MissingApp]) -> String {
    missing
        .iter()
        .map(|m| m.app.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
