use crate::host::HostRuntime;
use crate::RuntimeError;
use relpin_schema::{format_atom, format_string};
use std::fs;
use std::path::{Path, PathBuf};

/// A host runtime with a fixed ERTS version and code path, for tests.
#[derive(Debug, Clone)]
pub struct MockRuntime {
    version: String,
    code_path: Vec<PathBuf>,
}

impl MockRuntime {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            code_path: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_code_path(mut self, code_path: Vec<PathBuf>) -> Self {
        self.code_path = code_path;
        self
    }
}

impl HostRuntime for MockRuntime {
    fn name(&self) -> &str {
        "mock"
    }

    fn runtime_version(&self) -> Result<String, RuntimeError> {
        Ok(self.version.clone())
    }

    fn code_path(&self) -> Result<Vec<PathBuf>, RuntimeError> {
        Ok(self.code_path.clone())
    }
}

/// Write a minimal `<name>.app` resource into `dir`.
pub fn write_app_resource(
    dir: &Path,
    name: &str,
    version: &str,
    applications: &[&str],
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let deps: Vec<String> = applications.iter().map(|a| format_atom(a)).collect();
    let content = format!(
        "{{application, {},\n [{{vsn, {}}},\n  {{applications, [{}]}}]}}.\n",
        format_atom(name),
        format_string(version),
        deps.join(", ")
    );
    let path = dir.join(format!("{name}.app"));
    fs::write(&path, content)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relpin_schema::parse_app_file;

    #[test]
    fn mock_reports_configured_values() {
        let mock = MockRuntime::new("13.1").with_code_path(vec![PathBuf::from("/ebin")]);
        assert_eq!(mock.name(), "mock");
        assert_eq!(mock.runtime_version().unwrap(), "13.1");
        assert_eq!(mock.code_path().unwrap(), vec![PathBuf::from("/ebin")]);
    }

    #[test]
    fn written_resource_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_app_resource(dir.path(), "my_app", "1.0.0", &["kernel", "stdlib"]).unwrap();
        let app = parse_app_file(&path).unwrap();
        assert_eq!(app.name, "my_app");
        assert_eq!(app.version, "1.0.0");
        assert_eq!(app.applications.len(), 2);
    }
}
