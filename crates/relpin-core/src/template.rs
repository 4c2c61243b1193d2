use crate::CoreError;
use relpin_schema::{parse_release_file, ReleaseTemplate};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const RELEASE_SUFFIX: &str = ".rel";
const SOURCE_SUFFIX: &str = ".rel.src";

/// Path of the descriptor a template stands for.
///
/// `myapp.rel` maps to itself and `myapp.rel.src` to its sibling `myapp.rel`.
pub fn canonical_template_path(path: &Path) -> Result<PathBuf, CoreError> {
    let unsupported = || CoreError::UnsupportedExtension {
        path: path.display().to_string(),
    };
    let file_name = path
        .file_name()
        .and_then(OsStr::to_str)
        .ok_or_else(unsupported)?;

    if let Some(stem) = file_name.strip_suffix(SOURCE_SUFFIX) {
        if !stem.is_empty() {
            return Ok(path.with_file_name(format!("{stem}{RELEASE_SUFFIX}")));
        }
    } else if let Some(stem) = file_name.strip_suffix(RELEASE_SUFFIX) {
        if !stem.is_empty() {
            return Ok(path.to_path_buf());
        }
    }
    Err(unsupported())
}

/// A located template: where it is read from and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    pub input: PathBuf,
    pub canonical: PathBuf,
    /// Canonical file name without `.rel`.
    pub basename: String,
    /// Directory searched before the host code path.
    pub directory: PathBuf,
    /// Input file name, as named in the generated header.
    pub display_name: String,
}

impl TemplateSource {
    pub fn locate(path: &Path) -> Result<Self, CoreError> {
        let canonical = canonical_template_path(path)?;
        let basename = canonical
            .file_name()
            .and_then(OsStr::to_str)
            .and_then(|n| n.strip_suffix(RELEASE_SUFFIX))
            .unwrap_or_default()
            .to_owned();
        let directory = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            input: path.to_path_buf(),
            canonical,
            basename,
            directory,
            display_name,
        })
    }

    pub fn is_source_variant(&self) -> bool {
        self.input != self.canonical
    }

    /// Parse the template straight from the input path.
    pub fn read(&self) -> Result<ReleaseTemplate, CoreError> {
        Ok(parse_release_file(&self.input)?)
    }
}
