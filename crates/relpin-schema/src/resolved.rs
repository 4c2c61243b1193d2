use crate::release::{AppEntry, ReleaseName, ReleaseTemplate};
use crate::types::AppName;

/// An installed version to put in place of an application's declared version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Substitution {
    pub app: AppName,
    pub version: String,
}

impl Substitution {
    pub fn new(app: impl Into<AppName>, version: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            version: version.into(),
        }
    }
}

/// A release template with installed versions filled in.
///
/// Entry order always matches the template; only version fields and the ERTS
/// version differ from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRelease {
    pub name: ReleaseName,
    pub version: String,
    pub erts_version: String,
    pub apps: Vec<AppEntry>,
}

impl ResolvedRelease {
    pub fn from_template(template: &ReleaseTemplate) -> Self {
        Self {
            name: template.name.clone(),
            version: template.version.clone(),
            erts_version: template.erts_version.clone(),
            apps: template.apps.clone(),
        }
    }

    pub fn app(&self, name: &str) -> Option<&AppEntry> {
        self.apps.iter().find(|a| a.name == name)
    }
}

/// Replace the version of the entry named by `substitution`, keeping its start type
/// and included applications. Names not present in the release are ignored.
pub fn substitute(release: ResolvedRelease, substitution: &Substitution) -> ResolvedRelease {
    let apps = release
        .apps
        .into_iter()
        .map(|entry| {
            if entry.name == substitution.app {
                AppEntry {
                    version: substitution.version.clone(),
                    ..entry
                }
            } else {
                entry
            }
        })
        .collect();
    ResolvedRelease { apps, ..release }
}

/// Stamp the running ERTS version and apply every substitution in turn.
pub fn apply_substitutions(
    release: ResolvedRelease,
    substitutions: &[Substitution],
    runtime_version: &str,
) -> ResolvedRelease {
    let stamped = ResolvedRelease {
        erts_version: runtime_version.to_owned(),
        ..release
    };
    substitutions.iter().fold(stamped, substitute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::{parse_release_str, StartType};

    fn sample() -> ResolvedRelease {
        let template = parse_release_str(
            r#"{release, {demo, "0.1"}, {erts, "9.9"}, [{kernel, ""}, {stdlib, "", transient}, {sasl, "4.0", [mylib]}]}."#,
        )
        .unwrap();
        ResolvedRelease::from_template(&template)
    }

    #[test]
    fn substitute_replaces_only_matching_entry() {
        let r = substitute(sample(), &Substitution::new("stdlib", "4.1"));
        assert_eq!(r.apps[0].version, "");
        assert_eq!(r.apps[1].version, "4.1");
        assert_eq!(r.apps[1].start_type, StartType::Transient);
    }

    #[test]
    fn substitute_preserves_included_apps() {
        let r = substitute(sample(), &Substitution::new("sasl", "4.2"));
        let sasl = r.app("sasl").unwrap();
        assert_eq!(sasl.version, "4.2");
        assert_eq!(sasl.included, Some(vec![AppName::from("mylib")]));
    }

    #[test]
    fn unknown_substitution_is_ignored() {
        let before = sample();
        let after = substitute(before.clone(), &Substitution::new("ssl", "10.0"));
        assert_eq!(before, after);
    }

    #[test]
    fn apply_stamps_runtime_version() {
        let r = apply_substitutions(sample(), &[], "12.3");
        assert_eq!(r.erts_version, "12.3");
        assert_eq!(r.version, "0.1");
    }

    #[test]
    fn application_order_does_not_matter() {
        let subs = [
            Substitution::new("kernel", "3.0"),
            Substitution::new("stdlib", "4.1"),
            Substitution::new("sasl", "4.2"),
        ];
        let mut reversed = subs.clone();
        reversed.reverse();
        let a = apply_substitutions(sample(), &subs, "12.3");
        let b = apply_substitutions(sample(), &reversed, "12.3");
        assert_eq!(a, b);
        let names: Vec<&str> = a.apps.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["kernel", "stdlib", "sasl"]);
    }
}
