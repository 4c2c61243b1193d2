use relpin_core::{CoreError, Engine, GenerateOptions};
use relpin_runtime::mock::write_app_resource;
use relpin_runtime::{HostConfig, MockRuntime, OtpInstallation};
use std::fs;
use std::path::{Path, PathBuf};

const DEMO_TEMPLATE: &str =
    r#"{release, {demo, "0.1"}, {erts, ""}, [{kernel, ""}, {stdlib, "", transient}]}."#;

/// `<root>/lib/<app>-<vsn>/ebin/<app>.app` for each app, plus start_erl.data.
fn fake_otp(root: &Path, erts: &str, apps: &[(&str, &str)]) {
    for (name, vsn) in apps {
        let ebin = root.join("lib").join(format!("{name}-{vsn}")).join("ebin");
        write_app_resource(&ebin, name, vsn, &[]).unwrap();
    }
    fs::create_dir_all(root.join(format!("erts-{erts}"))).unwrap();
    fs::create_dir_all(root.join("releases")).unwrap();
    fs::write(root.join("releases/start_erl.data"), format!("{erts} 1\n")).unwrap();
}

fn otp_engine(root: &Path) -> Engine {
    Engine::new(Box::new(OtpInstallation::new(HostConfig {
        otp_root: Some(root.to_path_buf()),
        ..HostConfig::default()
    })))
}

fn write_template(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn renders_the_reference_sample() {
    let otp = tempfile::tempdir().unwrap();
    fake_otp(otp.path(), "12.3", &[("kernel", "3.0"), ("stdlib", "4.1")]);
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.rel.src", DEMO_TEMPLATE);
    let out = work.path().join("demo.rel");

    otp_engine(otp.path())
        .generate(&template, &out, &GenerateOptions::default())
        .unwrap();

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.starts_with("%% "));
    assert!(written.ends_with(
        "\n\n{release, {demo, \"0.1\"}, {erts, \"12.3\"}, [\n    {kernel, \"3.0\"},\n    {stdlib, \"4.1\", transient},\n  ]\n}.\n"
    ));
}

#[test]
fn full_resolution_keeps_length_and_order() {
    let otp = tempfile::tempdir().unwrap();
    fake_otp(
        otp.path(),
        "13.1",
        &[("kernel", "8.5"), ("stdlib", "4.2"), ("sasl", "4.2.1"), ("stdlib", "4.10")],
    );
    let work = tempfile::tempdir().unwrap();
    let template = write_template(
        work.path(),
        "demo.rel",
        r#"{release, {demo, "0.1"}, {erts, "9.0"}, [{sasl, "4.0", load}, {kernel, "8.5"}, {stdlib, ""}]}."#,
    );
    let out = work.path().join("out.rel");

    let result = otp_engine(otp.path())
        .generate(&template, &out, &GenerateOptions::default())
        .unwrap();

    let names: Vec<&str> = result.release.apps.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["sasl", "kernel", "stdlib"]);
    let versions: Vec<&str> = result.release.apps.iter().map(|a| a.version.as_str()).collect();
    assert_eq!(versions, ["4.2.1", "8.5", "4.10"]);
    assert_eq!(result.release.erts_version, "13.1");
    assert_eq!(result.report.substitutions.len(), 2);

    let reread = relpin_schema::parse_release_file(&out).unwrap();
    assert_eq!(reread.apps, result.release.apps);
    assert_eq!(reread.erts_version, "13.1");
}

#[test]
fn version_override_wins() {
    let ebin = tempfile::tempdir().unwrap();
    write_app_resource(ebin.path(), "kernel", "3.0", &[]).unwrap();
    write_app_resource(ebin.path(), "stdlib", "4.1", &[]).unwrap();
    let engine = Engine::new(Box::new(
        MockRuntime::new("12.3").with_code_path(vec![ebin.path().to_path_buf()]),
    ));
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.rel.src", DEMO_TEMPLATE);

    let plain = work.path().join("plain.rel");
    engine
        .generate(&template, &plain, &GenerateOptions::default())
        .unwrap();
    assert!(fs::read_to_string(&plain)
        .unwrap()
        .contains("{release, {demo, \"0.1\"}"));

    let bumped = work.path().join("bumped.rel");
    engine
        .generate(
            &template,
            &bumped,
            &GenerateOptions {
                version_override: Some("0.2.0".to_owned()),
            },
        )
        .unwrap();
    assert!(fs::read_to_string(&bumped)
        .unwrap()
        .contains("{release, {demo, \"0.2.0\"}"));
}

#[test]
fn reruns_are_byte_identical() {
    let otp = tempfile::tempdir().unwrap();
    fake_otp(otp.path(), "12.3", &[("kernel", "3.0"), ("stdlib", "4.1")]);
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.rel.src", DEMO_TEMPLATE);
    let out = work.path().join("demo.rel");
    let engine = otp_engine(otp.path());

    engine
        .generate(&template, &out, &GenerateOptions::default())
        .unwrap();
    let first = fs::read(&out).unwrap();
    engine
        .generate(&template, &out, &GenerateOptions::default())
        .unwrap();
    assert_eq!(first, fs::read(&out).unwrap());
}

#[test]
fn missing_app_leaves_output_untouched() {
    let otp = tempfile::tempdir().unwrap();
    fake_otp(otp.path(), "12.3", &[("kernel", "3.0")]);
    let work = tempfile::tempdir().unwrap();
    let template = write_template(
        work.path(),
        "demo.rel",
        r#"{release, {demo, "0.1"}, {erts, ""}, [{kernel, ""}, {nosuch, "1.0"}]}."#,
    );
    let fresh = work.path().join("fresh.rel");
    let existing = work.path().join("existing.rel");
    fs::write(&existing, "previous contents").unwrap();
    let engine = otp_engine(otp.path());

    let err = engine
        .generate(&template, &fresh, &GenerateOptions::default())
        .unwrap_err();
    let CoreError::Resolution { missing } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].app, "nosuch");
    assert!(!fresh.exists());

    assert!(engine
        .generate(&template, &existing, &GenerateOptions::default())
        .is_err());
    assert_eq!(fs::read_to_string(&existing).unwrap(), "previous contents");
}

#[test]
fn unsupported_extension_is_rejected_before_reading() {
    let engine = Engine::new(Box::new(MockRuntime::new("12.3")));
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.txt", DEMO_TEMPLATE);
    let err = engine
        .generate(&template, &work.path().join("demo.rel"), &GenerateOptions::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::UnsupportedExtension { .. }));
}

#[test]
fn rel_template_is_used_unmodified() {
    let ebin = tempfile::tempdir().unwrap();
    write_app_resource(ebin.path(), "kernel", "3.0", &[]).unwrap();
    write_app_resource(ebin.path(), "stdlib", "4.1", &[]).unwrap();
    let engine = Engine::new(Box::new(
        MockRuntime::new("12.3").with_code_path(vec![ebin.path().to_path_buf()]),
    ));
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.rel", DEMO_TEMPLATE);

    engine
        .generate(&template, &work.path().join("out.rel"), &GenerateOptions::default())
        .unwrap();
    assert_eq!(fs::read_to_string(&template).unwrap(), DEMO_TEMPLATE);
    let mut entries: Vec<String> = fs::read_dir(work.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    assert_eq!(entries, ["demo.rel", "out.rel"]);
}

#[test]
fn broken_template_is_a_template_error() {
    let engine = Engine::new(Box::new(MockRuntime::new("12.3")));
    let work = tempfile::tempdir().unwrap();
    let template = write_template(work.path(), "demo.rel", "{release, {demo, \"0.1\"}");
    let err = engine
        .generate(&template, &work.path().join("out.rel"), &GenerateOptions::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::Release(_)));
}
