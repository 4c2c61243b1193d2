use crate::term::{format_atom, format_string, parse_terms, Term, TermError};
use crate::types::AppName;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("failed to read release template: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse release template: {0}")]
    Term(#[from] TermError),
    #[error("release template must hold exactly one term, found {0}")]
    TermCount(usize),
    #[error("malformed release template: expected {expected}, found {found}")]
    Malformed {
        expected: &'static str,
        found: String,
    },
    #[error("unknown start type '{0}' (expected permanent, transient, temporary, load or none)")]
    UnknownStartType(String),
    #[error("application '{0}' is listed more than once")]
    DuplicateApp(String),
}

/// How the release handler starts an application. `Permanent` is the default and is
/// omitted from rendered entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StartType {
    #[default]
    Permanent,
    Transient,
    Temporary,
    Load,
    None,
}

impl StartType {
    pub fn as_str(self) -> &'static str {
        match self {
            StartType::Permanent => "permanent",
            StartType::Transient => "transient",
            StartType::Temporary => "temporary",
            StartType::Load => "load",
            StartType::None => "none",
        }
    }

    pub fn is_default(self) -> bool {
        self == StartType::Permanent
    }
}

impl FromStr for StartType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "permanent" => Ok(StartType::Permanent),
            "transient" => Ok(StartType::Transient),
            "temporary" => Ok(StartType::Temporary),
            "load" => Ok(StartType::Load),
            "none" => Ok(StartType::None),
            other => Err(ReleaseError::UnknownStartType(other.to_owned())),
        }
    }
}

impl fmt::Display for StartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Release names are atoms in most templates, but strings are accepted too and are
/// written back in the form they were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseName {
    Atom(String),
    Str(String),
}

impl ReleaseName {
    pub fn as_str(&self) -> &str {
        match self {
            ReleaseName::Atom(s) | ReleaseName::Str(s) => s,
        }
    }
}

impl fmt::Display for ReleaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseName::Atom(a) => f.write_str(&format_atom(a)),
            ReleaseName::Str(s) => f.write_str(&format_string(s)),
        }
    }
}

/// One application line of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEntry {
    pub name: AppName,
    /// Declared version. Empty means "whatever is installed".
    pub version: String,
    pub start_type: StartType,
    pub included: Option<Vec<AppName>>,
}

impl AppEntry {
    pub fn new(name: impl Into<AppName>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            start_type: StartType::Permanent,
            included: None,
        }
    }

    #[must_use]
    pub fn with_start_type(mut self, start_type: StartType) -> Self {
        self.start_type = start_type;
        self
    }
}

/// A parsed release template: `{release, {Name, Vsn}, {erts, ErtsVsn}, [Apps]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTemplate {
    pub name: ReleaseName,
    pub version: String,
    pub erts_version: String,
    pub apps: Vec<AppEntry>,
}

impl ReleaseTemplate {
    pub fn from_term(term: &Term) -> Result<Self, ReleaseError> {
        let Some([tag, name_vsn, erts, apps]) = term.as_tuple() else {
            return Err(malformed("{release, {Name, Vsn}, {erts, Vsn}, [Apps]}", term));
        };
        if tag.as_atom() != Some("release") {
            return Err(malformed("{release, {Name, Vsn}, {erts, Vsn}, [Apps]}", term));
        }

        let (name, version) = match name_vsn.as_tuple() {
            Some([name, vsn]) => (release_name(name)?, text(vsn, "release version string")?),
            _ => return Err(malformed("{Name, Vsn}", name_vsn)),
        };

        let erts_version = match erts.as_tuple() {
            Some([tag, vsn]) if tag.as_atom() == Some("erts") => text(vsn, "erts version string")?,
            _ => return Err(malformed("{erts, Vsn}", erts)),
        };

        let app_terms = apps
            .as_list()
            .ok_or_else(|| malformed("list of applications", apps))?;
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(app_terms.len());
        for app_term in app_terms {
            let entry = parse_app_entry(app_term)?;
            if !seen.insert(entry.name.clone()) {
                return Err(ReleaseError::DuplicateApp(entry.name.into_inner()));
            }
            entries.push(entry);
        }

        Ok(Self {
            name,
            version,
            erts_version,
            apps: entries,
        })
    }

    pub fn app(&self, name: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|a| a.name == name)
    }
}

fn malformed(expected: &'static str, found: &Term) -> ReleaseError {
    ReleaseError::Malformed {
        expected,
        found: found.describe(),
    }
}

fn text(term: &Term, expected: &'static str) -> Result<String, ReleaseError> {
    term.as_text()
        .map(str::to_owned)
        .ok_or_else(|| malformed(expected, term))
}

fn release_name(term: &Term) -> Result<ReleaseName, ReleaseError> {
    match term {
        Term::Atom(a) => Ok(ReleaseName::Atom(a.clone())),
        Term::Str(s) => Ok(ReleaseName::Str(s.clone())),
        other => Err(malformed("release name atom or string", other)),
    }
}

fn app_name(term: &Term) -> Result<AppName, ReleaseError> {
    term.as_atom()
        .map(AppName::from)
        .ok_or_else(|| malformed("application name atom", term))
}

fn included_apps(term: &Term) -> Result<Vec<AppName>, ReleaseError> {
    term.as_list()
        .ok_or_else(|| malformed("list of included applications", term))?
        .iter()
        .map(app_name)
        .collect()
}

fn start_type(term: &Term) -> Result<StartType, ReleaseError> {
    term.as_atom()
        .ok_or_else(|| malformed("start type atom", term))?
        .parse()
}

fn parse_app_entry(term: &Term) -> Result<AppEntry, ReleaseError> {
    if let Term::Atom(name) = term {
        return Ok(AppEntry::new(name.as_str(), ""));
    }
    let Some(items) = term.as_tuple() else {
        return Err(malformed("application entry", term));
    };
    let (name, version, rest) = match items {
        [name, vsn, rest @ ..] if rest.len() <= 2 => {
            (app_name(name)?, text(vsn, "application version string")?, rest)
        }
        _ => return Err(malformed("{App, Vsn[, Type][, IncApps]}", term)),
    };

    let mut entry = AppEntry::new(name, version);
    match rest {
        [] => {}
        [third] if third.as_atom().is_some() => entry.start_type = start_type(third)?,
        [third] => entry.included = Some(included_apps(third)?),
        [ty, inc] => {
            entry.start_type = start_type(ty)?;
            entry.included = Some(included_apps(inc)?);
        }
        _ => return Err(malformed("{App, Vsn[, Type][, IncApps]}", term)),
    }
    Ok(entry)
}

pub fn parse_release_str(input: &str) -> Result<ReleaseTemplate, ReleaseError> {
    let terms = parse_terms(input)?;
    match terms.as_slice() {
        [term] => ReleaseTemplate::from_term(term),
        other => Err(ReleaseError::TermCount(other.len())),
    }
}

pub fn parse_release_file(path: impl AsRef<Path>) -> Result<ReleaseTemplate, ReleaseError> {
    let content = fs::read_to_string(path)?;
    parse_release_str(&content)
}
