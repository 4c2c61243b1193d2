use crate::index::{InstalledApplication, Lookup, PackageIndex};
use crate::RuntimeError;
use relpin_schema::{AppEntry, AppName, ReleaseTemplate, Substitution};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a template entry cannot be used as declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    NotFound {
        app: AppName,
        expected: String,
    },
    VersionMismatch {
        app: AppName,
        expected: String,
        found: String,
    },
}

/// An application the template lists but the search path does not provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingApp {
    pub app: AppName,
    /// The declared version, possibly empty.
    pub expected: String,
}

impl fmt::Display for MissingApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expected.is_empty() {
            write!(f, "{}", self.app)
        } else {
            write!(f, "{} ({})", self.app, self.expected)
        }
    }
}

/// An installed application depends on something the template does not list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlistedDependency {
    pub app: AppName,
    pub dependency: AppName,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("applications not found: {}", join_missing(.missing))]
    Unresolved { missing: Vec<MissingApp> },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn join_missing(missing: &[MissingApp]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// In template order.
    pub installed: Vec<InstalledApplication>,
    pub substitutions: Vec<Substitution>,
    pub unlisted_dependencies: Vec<UnlistedDependency>,
}

/// Compare one template entry against its lookup result.
pub fn classify(entry: &AppEntry, lookup: &Lookup) -> Option<Problem> {
    match lookup {
        Lookup::NotFound => Some(Problem::NotFound {
            app: entry.name.clone(),
            expected: entry.version.clone(),
        }),
        Lookup::Found(installed) if installed.version != entry.version => {
            Some(Problem::VersionMismatch {
                app: entry.name.clone(),
                expected: entry.version.clone(),
                found: installed.version.clone(),
            })
        }
        Lookup::Found(_) => None,
    }
}

/// Resolve every template entry against `index`.
///
/// All entries are looked up before failing, so the error names every missing
/// application at once. Mismatched versions become substitutions.
pub fn scan_release(
    template: &ReleaseTemplate,
    index: &PackageIndex,
) -> Result<ScanReport, ScanError> {
    let mut report = ScanReport::default();
    let mut missing = Vec::new();

    for entry in &template.apps {
        let lookup = index.lookup(&entry.name)?;
        match classify(entry, &lookup) {
            Some(Problem::NotFound { app, expected }) => {
                debug!("{app}: no installed package");
                missing.push(MissingApp { app, expected });
            }
            Some(Problem::VersionMismatch {
                app,
                expected,
                found,
            }) => {
                debug!("{app}: \"{expected}\" -> \"{found}\"");
                report.substitutions.push(Substitution::new(app, found));
            }
            None => debug!("{}: \"{}\" is installed", entry.name, entry.version),
        }
        if let Lookup::Found(installed) = lookup {
            report.installed.push(installed);
        }
    }

    if !missing.is_empty() {
        return Err(ScanError::Unresolved { missing });
    }

    for installed in &report.installed {
        for dependency in &installed.dependencies {
            if template.app(dependency).is_none() {
                warn!(
                    "{} depends on {dependency}, which the release does not include",
                    installed.name
                );
                report.unlisted_dependencies.push(UnlistedDependency {
                    app: installed.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::write_app_resource;
    use relpin_schema::parse_release_str;

    fn template(apps: &str) -> ReleaseTemplate {
        parse_release_str(&format!(
            "{{release, {{demo, \"0.1\"}}, {{erts, \"\"}}, [{apps}]}}."
        ))
        .unwrap()
    }

    #[test]
    fn classify_detects_each_case() {
        let entry = AppEntry::new("kernel", "8.5");
        assert_eq!(
            classify(&entry, &Lookup::NotFound),
            Some(Problem::NotFound {
                app: AppName::from("kernel"),
                expected: "8.5".to_owned()
            })
        );

        let installed = |version: &str| {
            Lookup::Found(InstalledApplication {
                name: AppName::from("kernel"),
                version: version.to_owned(),
                runtime_requirement: None,
                dependencies: Vec::new(),
                resource_path: "/lib/kernel/ebin/kernel.app".into(),
            })
        };
        assert_eq!(classify(&entry, &installed("8.5")), None);
        assert!(matches!(
            classify(&entry, &installed("8.6")),
            Some(Problem::VersionMismatch { ref found, .. }) if found == "8.6"
        ));
    }

    #[test]
    fn mismatches_become_substitutions() {
        let ebin = tempfile::tempdir().unwrap();
        write_app_resource(ebin.path(), "kernel", "3.0", &[]).unwrap();
        write_app_resource(ebin.path(), "stdlib", "4.1", &["kernel"]).unwrap();
        let index = PackageIndex::new(vec![ebin.path().to_path_buf()]);

        let report = scan_release(
            &template(r#"{kernel, ""}, {stdlib, "4.1", transient}"#),
            &index,
        )
        .unwrap();
        assert_eq!(report.substitutions, vec![Substitution::new("kernel", "3.0")]);
        assert_eq!(report.installed.len(), 2);
        assert!(report.unlisted_dependencies.is_empty());
    }

    #[test]
    fn every_missing_app_is_reported() {
        let ebin = tempfile::tempdir().unwrap();
        write_app_resource(ebin.path(), "kernel", "3.0", &[]).unwrap();
        let index = PackageIndex::new(vec![ebin.path().to_path_buf()]);

        let err = scan_release(
            &template(r#"{nosuch, "1.0"}, {kernel, ""}, {ghost, ""}"#),
            &index,
        )
        .unwrap_err();
        let ScanError::Unresolved { missing } = &err else {
            panic!("unexpected error: {err}");
        };
        let names: Vec<&str> = missing.iter().map(|m| m.app.as_str()).collect();
        assert_eq!(names, ["nosuch", "ghost"]);
        assert_eq!(err.to_string(), "applications not found: nosuch (1.0), ghost");
    }

    #[test]
    fn unlisted_dependencies_are_reported_not_fatal() {
        let ebin = tempfile::tempdir().unwrap();
        write_app_resource(ebin.path(), "myapp", "0.1.0", &["kernel", "crypto"]).unwrap();
        write_app_resource(ebin.path(), "kernel", "8.5", &[]).unwrap();
        let index = PackageIndex::new(vec![ebin.path().to_path_buf()]);

        let report = scan_release(&template(r#"{kernel, ""}, {myapp, ""}"#), &index).unwrap();
        assert_eq!(
            report.unlisted_dependencies,
            vec![UnlistedDependency {
                app: AppName::from("myapp"),
                dependency: AppName::from("crypto"),
            }]
        );
        assert_eq!(report.substitutions.len(), 2);
    }
}
