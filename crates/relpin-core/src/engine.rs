use crate::template::TemplateSource;
use crate::CoreError;
use relpin_runtime::{compare_versions, scan_release, HostRuntime, PackageIndex, ScanReport};
use relpin_schema::{apply_substitutions, render_descriptor, ReleaseTemplate, ResolvedRelease};
use std::cmp::Ordering;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Turns release templates into descriptors for one host runtime.
pub struct Engine {
    host: Box<dyn HostRuntime>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Release version to write instead of the template's.
    pub version_override: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolveResult {
    pub source: TemplateSource,
    pub template: ReleaseTemplate,
    pub release: ResolvedRelease,
    pub report: ScanReport,
}

#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub release: ResolvedRelease,
    pub report: ScanReport,
    pub output: PathBuf,
}

impl Engine {
    pub fn new(host: Box<dyn HostRuntime>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &dyn HostRuntime {
        self.host.as_ref()
    }

    /// Read a template and resolve it against the host, without writing anything.
    pub fn resolve(&self, template_path: &Path) -> Result<ResolveResult, CoreError> {
        let source = TemplateSource::locate(template_path)?;
        info!(
            "resolving release {} from {}",
            source.basename,
            source.input.display()
        );
        let template = source.read()?;

        let index = PackageIndex::for_template(&source.directory, self.host.code_path()?);
        debug!(
            "searching {} directories on the {} host",
            index.search_path().len(),
            self.host.name()
        );
        let report = scan_release(&template, &index)?;

        let runtime_version = self.host.runtime_version()?;
        for app in &report.installed {
            if let Some(required) = &app.runtime_requirement {
                if compare_versions(required, &runtime_version) == Ordering::Greater {
                    warn!(
                        "{} {} requires ERTS {required}, host runs {runtime_version}",
                        app.name, app.version
                    );
                }
            }
        }

        let release = apply_substitutions(
            ResolvedRelease::from_template(&template),
            &report.substitutions,
            &runtime_version,
        );
        info!(
            "{} applications resolved, {} versions substituted, ERTS {runtime_version}",
            release.apps.len(),
            report.substitutions.len()
        );
        Ok(ResolveResult {
            source,
            template,
            release,
            report,
        })
    }

    /// Resolve `template_path` and write the descriptor to `out`.
    ///
    /// Nothing is written unless every application resolves.
    pub fn generate(
        &self,
        template_path: &Path,
        out: &Path,
        options: &GenerateOptions,
    ) -> Result<GenerateResult, CoreError> {
        let resolved = self.resolve(template_path)?;
        let content = render_descriptor(
            &resolved.release,
            &resolved.source.display_name,
            options.version_override.as_deref(),
        );
        write_atomic(out, &content)?;
        info!("wrote {}", out.display());
        Ok(GenerateResult {
            release: resolved.release,
            report: resolved.report,
            output: out.to_path_buf(),
        })
    }
}

/// Replace `dest` with `content` through a temporary file in the same directory.
pub fn write_atomic(dest: &Path, content: &str) -> Result<(), CoreError> {
    let write_error = |reason: String| CoreError::Write {
        path: dest.display().to_string(),
        reason,
    };
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| write_error(e.to_string()))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| write_error(e.to_string()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| write_error(e.to_string()))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;
    tmp.persist(dest)
        .map_err(|e| write_error(e.error.to_string()))?;
    Ok(())
}
