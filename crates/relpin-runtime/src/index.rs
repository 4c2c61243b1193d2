use crate::RuntimeError;
use relpin_schema::{parse_app_file, AppName};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An application found on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledApplication {
    pub name: AppName,
    pub version: String,
    /// Minimum ERTS version from `runtime_dependencies`.
    pub runtime_requirement: Option<String>,
    pub dependencies: Vec<AppName>,
    pub resource_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(InstalledApplication),
    NotFound,
}

/// Looks applications up by their `<app>.app` resource file.
///
/// Directories are searched in order and the first match wins, so earlier entries
/// shadow later ones.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    search_path: Vec<PathBuf>,
}

impl PackageIndex {
    pub fn new(search_path: Vec<PathBuf>) -> Self {
        Self { search_path }
    }

    /// The template's own directory followed by the host code path.
    pub fn for_template(template_dir: &Path, code_path: Vec<PathBuf>) -> Self {
        let mut search_path = Vec::with_capacity(code_path.len() + 1);
        search_path.push(template_dir.to_path_buf());
        search_path.extend(code_path);
        Self::new(search_path)
    }

    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }

    pub fn lookup(&self, app: &str) -> Result<Lookup, RuntimeError> {
        let file_name = format!("{app}.app");
        for dir in &self.search_path {
            let candidate = dir.join(&file_name);
            if !candidate.is_file() {
                continue;
            }
            debug!("{app}: using {}", candidate.display());
            let resource = parse_app_file(&candidate).map_err(|source| RuntimeError::AppFile {
                path: candidate.display().to_string(),
                source,
            })?;
            if resource.name != app {
                return Err(RuntimeError::AppNameMismatch {
                    path: candidate.display().to_string(),
                    declared: resource.name.into_inner(),
                    expected: app.to_owned(),
                });
            }
            return Ok(Lookup::Found(InstalledApplication {
                runtime_requirement: resource.runtime_requirement().map(str::to_owned),
                name: resource.name,
                version: resource.version,
                dependencies: resource.applications,
                resource_path: candidate,
            }));
        }
        debug!("{app}: not found on {} directories", self.search_path.len());
        Ok(Lookup::NotFound)
    }
}
