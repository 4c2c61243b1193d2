use crate::term::{parse_terms, Term, TermError};
use crate::types::AppName;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppFileError {
    #[error("failed to read application resource file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse application resource file: {0}")]
    Term(#[from] TermError),
    #[error("application resource file must hold exactly one term, found {0}")]
    TermCount(usize),
    #[error("malformed application resource: expected {expected}, found {found}")]
    Malformed {
        expected: &'static str,
        found: String,
    },
    #[error("application '{0}' has no vsn property")]
    MissingVsn(String),
}

/// The parts of an `.app` resource file that release generation cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppResource {
    pub name: AppName,
    pub version: String,
    pub applications: Vec<AppName>,
    pub included_applications: Vec<AppName>,
    /// Entries such as `"erts-13.0"` or `"kernel-8.0"`.
    pub runtime_dependencies: Vec<String>,
}

impl AppResource {
    pub fn from_term(term: &Term) -> Result<Self, AppFileError> {
        let Some([tag, name, props]) = term.as_tuple() else {
            return Err(malformed("{application, Name, Props}", term));
        };
        if tag.as_atom() != Some("application") {
            return Err(malformed("{application, Name, Props}", term));
        }
        let name = name
            .as_atom()
            .map(AppName::from)
            .ok_or_else(|| malformed("application name atom", name))?;
        let props = props
            .as_list()
            .ok_or_else(|| malformed("property list", props))?;

        let mut version = None;
        let mut applications = Vec::new();
        let mut included_applications = Vec::new();
        let mut runtime_dependencies = Vec::new();

        // Unknown keys and non-tuple entries are ignored, as the runtime does.
        for prop in props {
            let Some([key, value]) = prop.as_tuple() else {
                continue;
            };
            match key.as_atom() {
                Some("vsn") => {
                    version = Some(
                        value
                            .as_text()
                            .ok_or_else(|| malformed("vsn string", value))?
                            .to_owned(),
                    );
                }
                Some("applications") => applications = atom_list(value)?,
                Some("included_applications") => included_applications = atom_list(value)?,
                Some("runtime_dependencies") => runtime_dependencies = string_list(value)?,
                _ => {}
            }
        }

        let version = version.ok_or_else(|| AppFileError::MissingVsn(name.to_string()))?;
        Ok(Self {
            name,
            version,
            applications,
            included_applications,
            runtime_dependencies,
        })
    }

    /// Minimum ERTS version declared in `runtime_dependencies`, if any.
    pub fn runtime_requirement(&self) -> Option<&str> {
        self.runtime_dependencies
            .iter()
            .find_map(|dep| dep.strip_prefix("erts-"))
    }
}

fn malformed(expected: &'static str, found: &Term) -> AppFileError {
    AppFileError::Malformed {
        expected,
        found: found.describe(),
    }
}

fn atom_list(term: &Term) -> Result<Vec<AppName>, AppFileError> {
    term.as_list()
        .ok_or_else(|| malformed("list of atoms", term))?
        .iter()
        .map(|t| {
            t.as_atom()
                .map(AppName::from)
                .ok_or_else(|| malformed("atom", t))
        })
        .collect()
}

fn string_list(term: &Term) -> Result<Vec<String>, AppFileError> {
    term.as_list()
        .ok_or_else(|| malformed("list of strings", term))?
        .iter()
        .map(|t| {
            t.as_text()
                .map(str::to_owned)
                .ok_or_else(|| malformed("string", t))
        })
        .collect()
}

pub fn parse_app_str(input: &str) -> Result<AppResource, AppFileError> {
    let terms = parse_terms(input)?;
    match terms.as_slice() {
        [term] => AppResource::from_term(term),
        other => Err(AppFileError::TermCount(other.len())),
    }
}

pub fn parse_app_file(path: impl AsRef<Path>) -> Result<AppResource, AppFileError> {
    let content = fs::read_to_string(path)?;
    parse_app_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STDLIB_APP: &str = r#"
%% This is an -*- erlang -*- file.
{application, stdlib,
 [{description, "ERTS  CXC 138 10"},
  {vsn, "4.1"},
  {modules, [array, base64, lists]},
  {registered, [timer_server]},
  {applications, [kernel]},
  {env, []},
  {runtime_dependencies, ["sasl-3.0", "kernel-8.0", "erts-12.3", "crypto-4.5"]}
 ]}.
"#;

    #[test]
    fn parses_otp_style_app_file() {
        let app = parse_app_str(STDLIB_APP).unwrap();
        assert_eq!(app.name, "stdlib");
        assert_eq!(app.version, "4.1");
        assert_eq!(app.applications, vec![AppName::from("kernel")]);
        assert!(app.included_applications.is_empty());
        assert_eq!(app.runtime_requirement(), Some("12.3"));
    }

    #[test]
    fn ignores_unknown_properties() {
        let app = parse_app_str(
            r#"{application, myapp, [{vsn, "0.1.0"}, {mod, {myapp_app, []}}, {env, [{port, 8080}]}, stray]}."#,
        )
        .unwrap();
        assert_eq!(app.version, "0.1.0");
        assert_eq!(app.runtime_requirement(), None);
    }

    #[test]
    fn missing_vsn_is_an_error() {
        let err = parse_app_str("{application, myapp, [{applications, [kernel]}]}.").unwrap_err();
        assert!(matches!(err, AppFileError::MissingVsn(ref n) if n == "myapp"));
    }

    #[test]
    fn rejects_non_application_terms() {
        assert!(matches!(
            parse_app_str(r#"{library, myapp, [{vsn, "1"}]}."#).unwrap_err(),
            AppFileError::Malformed { .. }
        ));
        assert!(matches!(
            parse_app_str(r#"{application, myapp, [{vsn, 1}]}."#).unwrap_err(),
            AppFileError::Malformed { .. }
        ));
        assert!(matches!(
            parse_app_str("").unwrap_err(),
            AppFileError::TermCount(0)
        ));
    }

    #[test]
    fn reads_app_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdlib.app");
        fs::write(&path, STDLIB_APP).unwrap();
        let app = parse_app_file(&path).unwrap();
        assert_eq!(app.version, "4.1");
    }
}
