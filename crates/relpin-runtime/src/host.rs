use crate::config::HostConfig;
use crate::RuntimeError;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A host Erlang runtime that release generation can query.
pub trait HostRuntime {
    fn name(&self) -> &str;

    /// Version of the ERTS that releases built here will run on.
    fn runtime_version(&self) -> Result<String, RuntimeError>;

    /// Application `ebin` directories in lookup order.
    fn code_path(&self) -> Result<Vec<PathBuf>, RuntimeError>;
}

/// An Erlang/OTP installation on the local filesystem.
///
/// The root comes from configuration when set, otherwise from the `erl` found on
/// `PATH`. Discovery runs on each query; nothing is cached.
pub struct OtpInstallation {
    config: HostConfig,
}

impl OtpInstallation {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    pub fn root(&self) -> Result<PathBuf, RuntimeError> {
        if let Some(root) = &self.config.otp_root {
            if !root.join("lib").is_dir() {
                return Err(RuntimeError::HostNotFound(format!(
                    "{} has no lib directory",
                    root.display()
                )));
            }
            return Ok(root.clone());
        }
        locate_otp_root(std::env::var_os("PATH").as_deref())
    }
}

impl HostRuntime for OtpInstallation {
    fn name(&self) -> &str {
        "otp"
    }

    fn runtime_version(&self) -> Result<String, RuntimeError> {
        if let Some(vsn) = &self.config.erts_version {
            return Ok(vsn.clone());
        }
        erts_version_at(&self.root()?)
    }

    fn code_path(&self) -> Result<Vec<PathBuf>, RuntimeError> {
        let mut roots = self.config.erl_libs.clone();
        roots.push(self.root()?.join("lib"));
        code_path_for(&roots)
    }
}

/// Find the installation that owns the first `erl` executable on `path_var`.
pub fn locate_otp_root(path_var: Option<&OsStr>) -> Result<PathBuf, RuntimeError> {
    let Some(path_var) = path_var else {
        return Err(RuntimeError::HostNotFound("PATH is not set".to_owned()));
    };
    for dir in std::env::split_paths(path_var) {
        let erl = dir.join("erl");
        if !erl.is_file() {
            continue;
        }
        let real = fs::canonicalize(&erl)?;
        debug!("erl found at {} -> {}", erl.display(), real.display());
        match otp_root_from_erl(&real) {
            Some(root) if root.join("lib").is_dir() => return Ok(root),
            _ => debug!("{} is not inside an OTP installation", real.display()),
        }
    }
    Err(RuntimeError::HostNotFound(
        "no erl executable inside an OTP installation on PATH; set RELPIN_OTP_ROOT".to_owned(),
    ))
}

/// `<root>/bin/erl` and `<root>/erts-<vsn>/bin/erl` both map to `<root>`.
pub fn otp_root_from_erl(erl: &Path) -> Option<PathBuf> {
    let prefix = erl.parent()?.parent()?;
    let is_erts_dir = prefix
        .file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|n| n.starts_with("erts-"));
    if is_erts_dir {
        prefix.parent().map(Path::to_path_buf)
    } else {
        Some(prefix.to_path_buf())
    }
}

/// ERTS version of the installation at `root`.
///
/// `releases/start_erl.data` names the version the installation boots with. Without
/// it, the highest `erts-<vsn>` directory is used.
pub fn erts_version_at(root: &Path) -> Result<String, RuntimeError> {
    let start_erl = root.join("releases").join("start_erl.data");
    if let Ok(content) = fs::read_to_string(&start_erl) {
        if let Some(vsn) = content.split_whitespace().next() {
            return Ok(vsn.to_owned());
        }
    }

    let mut versions = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(vsn) = entry
            .file_name()
            .to_str()
            .and_then(|n| n.strip_prefix("erts-"))
        {
            versions.push(vsn.to_owned());
        }
    }
    versions.sort_by(|a, b| compare_versions(a, b));
    if versions.len() > 1 {
        warn!(
            "several ERTS versions under {}, using the highest",
            root.display()
        );
    }
    versions
        .pop()
        .ok_or_else(|| RuntimeError::UnknownRuntimeVersion(root.display().to_string()))
}

/// Build the code path from library roots, in the given order.
///
/// Each root holds `<app>` or `<app>-<vsn>` directories. Within one root the
/// highest version of each application wins and contributes its `ebin` directory.
/// Roots that do not exist are skipped.
pub fn code_path_for(lib_roots: &[PathBuf]) -> Result<Vec<PathBuf>, RuntimeError> {
    let mut code_path = Vec::new();
    for root in lib_roots {
        if !root.is_dir() {
            debug!("skipping missing library root {}", root.display());
            continue;
        }
        let mut newest: BTreeMap<String, (Option<String>, PathBuf)> = BTreeMap::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(dir_name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let (app, vsn) = split_app_dir(&dir_name);
            let ebin = entry.path().join("ebin");
            if !ebin.is_dir() {
                continue;
            }
            let replace = match newest.get(app) {
                None => true,
                Some((current, _)) => {
                    compare_optional(vsn, current.as_deref()) == Ordering::Greater
                }
            };
            if replace {
                newest.insert(app.to_owned(), (vsn.map(str::to_owned), ebin));
            }
        }
        code_path.extend(newest.into_values().map(|(_, ebin)| ebin));
    }
    Ok(code_path)
}

/// `stdlib-4.1` splits into `("stdlib", Some("4.1"))`, `myapp` into `("myapp", None)`.
///
/// The version starts at the first `-` followed by a digit, so `myapp-1.0-rc1` is
/// `myapp` at `1.0-rc1`.
fn split_app_dir(name: &str) -> (&str, Option<&str>) {
    let split = name.match_indices('-').map(|(i, _)| i).find(|&i| {
        i > 0 && name[i + 1..].starts_with(|c: char| c.is_ascii_digit())
    });
    match split {
        Some(i) => (&name[..i], Some(&name[i + 1..])),
        None => (name, None),
    }
}

fn compare_optional(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => compare_versions(a, b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Compare dotted version strings: numeric components numerically, others as text.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split(['.', '-', '+']).collect();
    let right: Vec<&str> = b.split(['.', '-', '+']).collect();
    for (l, r) in left.iter().zip(&right) {
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(l), Ok(r)) => l.cmp(&r),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}
