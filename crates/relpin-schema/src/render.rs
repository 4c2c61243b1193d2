use crate::release::AppEntry;
use crate::resolved::ResolvedRelease;
use crate::term::{format_atom, format_string};

/// Render the final descriptor text: a generated-file header followed by the
/// column-aligned release tuple.
///
/// The output depends only on the arguments, so identical inputs always produce
/// identical bytes. `version_override` replaces the template's release version.
pub fn render_descriptor(
    release: &ResolvedRelease,
    source_name: &str,
    version_override: Option<&str>,
) -> String {
    let source = source_name.replace(['\n', '\r'], " ");
    let version = version_override.unwrap_or(&release.version);
    let mut out = format!(
        "%% This file is generated by relpin from {source}.\n\
         %% Do not edit it by hand: change the template and regenerate.\n\
         \n\
         {{release, {{{}, {}}}, {{erts, {}}}, [\n",
        release.name,
        format_string(version),
        format_string(&release.erts_version)
    );
    for row in app_rows(&release.apps) {
        out.push_str("    ");
        out.push_str(&row);
        out.push_str(",\n");
    }
    out.push_str("  ]\n}.\n");
    out
}

/// One rendered tuple per entry, padded so names and versions line up.
///
/// Entries with the default start type and no included applications use the short
/// `{App, "Vsn"}` form.
pub fn app_rows(apps: &[AppEntry]) -> Vec<String> {
    let names: Vec<String> = apps.iter().map(|a| format_atom(&a.name)).collect();
    let versions: Vec<String> = apps.iter().map(|a| format_string(&a.version)).collect();
    let name_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0) + 1;
    let vsn_width = versions.iter().map(|v| v.chars().count()).max().unwrap_or(0) + 1;

    apps.iter()
        .zip(names)
        .zip(versions)
        .map(|((app, name), vsn)| {
            let name_col = format!("{name},");
            let tail = trailing_fields(app);
            if tail.is_empty() {
                format!("{{{name_col:<name_width$} {vsn}}}")
            } else {
                let vsn_col = format!("{vsn},");
                format!("{{{name_col:<name_width$} {vsn_col:<vsn_width$} {tail}}}")
            }
        })
        .collect()
}

fn trailing_fields(app: &AppEntry) -> String {
    let mut fields = Vec::new();
    if !app.start_type.is_default() {
        fields.push(app.start_type.as_str().to_owned());
    }
    if let Some(included) = &app.included {
        let list: Vec<String> = included.iter().map(|n| format_atom(n)).collect();
        fields.push(format!("[{}]", list.join(", ")));
    }
    fields.join(", ")
}
