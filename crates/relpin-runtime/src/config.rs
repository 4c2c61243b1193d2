use crate::RuntimeError;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Explicit path to the host configuration file.
pub const CONFIG_ENV: &str = "RELPIN_CONFIG";
/// Root directory of the OTP installation.
pub const OTP_ROOT_ENV: &str = "RELPIN_OTP_ROOT";
/// ERTS version to stamp instead of asking the installation.
pub const ERTS_VSN_ENV: &str = "RELPIN_ERTS_VSN";
/// Extra library roots searched before the installation's own `lib`.
pub const ERL_LIBS_ENV: &str = "ERL_LIBS";

/// Where and how to find the Erlang/OTP installation.
///
/// Values come from `$RELPIN_CONFIG` or `~/.config/relpin/host.toml`, then from the
/// environment, which wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    #[serde(default)]
    pub otp_root: Option<PathBuf>,
    #[serde(default)]
    pub erts_version: Option<String>,
    #[serde(default)]
    pub erl_libs: Vec<PathBuf>,
}

impl HostConfig {
    pub fn load() -> Result<Self, RuntimeError> {
        Self::from_sources(|key| std::env::var_os(key))
    }

    /// Build a configuration from a file and an environment lookup.
    ///
    /// An explicitly named config file must exist; the default one is optional.
    pub fn from_sources<F>(env: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let mut config = if let Some(explicit) = lookup(CONFIG_ENV) {
            Self::read(Path::new(&explicit))?
        } else {
            match lookup("HOME").map(|home| default_config_path(Path::new(&home))) {
                Some(path) if path.is_file() => Self::read(&path)?,
                _ => Self::default(),
            }
        };

        if let Some(root) = lookup(OTP_ROOT_ENV) {
            config.otp_root = Some(PathBuf::from(root));
        }
        if let Some(vsn) = lookup(ERTS_VSN_ENV) {
            config.erts_version = Some(vsn.to_string_lossy().into_owned());
        }
        if let Some(libs) = lookup(ERL_LIBS_ENV) {
            config.erl_libs = std::env::split_paths(&libs)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        Ok(config)
    }

    pub fn read(path: &Path) -> Result<Self, RuntimeError> {
        let content = fs::read_to_string(path).map_err(|e| RuntimeError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| RuntimeError::Config {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".config").join("relpin").join("host.toml")
}
