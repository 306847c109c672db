//! CLI integration tests using the REAL bundletool binary

mod common;

use assert_cmd::Command;
use common::{TestBundle, TestModule, TestWorkspace};
use predicates::prelude::*;

fn bundletool_cmd() -> Command {
    Command::new(TestWorkspace::bundletool_bin())
}

fn abi_bundle(workspace: &TestWorkspace) -> std::path::PathBuf {
    workspace.write_bundle(
        "app.aab",
        &TestBundle::new()
            .base(|m| {
                m.file("lib/x86/libfoo.so", b"x86")
                    .file("lib/arm64-v8a/libfoo.so", b"arm64")
            })
            .module("maps", TestModule::new().on_demand().file("assets/maps.bin", b"m")),
    )
}

fn build_apks(workspace: &TestWorkspace) -> std::path::PathBuf {
    let bundle = abi_bundle(workspace);
    let output = workspace.path_of("app.apks");
    bundletool_cmd()
        .args(["build-apks", "--quiet", "--bundle"])
        .arg(&bundle)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    output
}

#[test]
fn test_help_output() {
    bundletool_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Android App Bundle"))
        .stdout(predicate::str::contains("build-bundle"))
        .stdout(predicate::str::contains("build-apks"))
        .stdout(predicate::str::contains("extract-apks"))
        .stdout(predicate::str::contains("get-size"));
}

#[test]
fn test_version_output() {
    bundletool_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundletool"))
        .stdout(predicate::str::contains("Build info"));
}

#[test]
fn test_completions_bash() {
    bundletool_cmd()
        .args(["completions", "--shell", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bundletool"));
}

#[test]
fn test_completions_unknown_shell() {
    bundletool_cmd()
        .args(["completions", "--shell", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_build_bundle_from_directories() {
    let workspace = TestWorkspace::new();
    let base = workspace.write_module_dir(
        "base",
        &TestModule::new().min_sdk(21).file("dex/classes.dex", b"dex"),
    );
    let maps = workspace.write_module_zip(
        "maps",
        &TestModule::new().on_demand().file("assets/maps.bin", b"m"),
    );
    let output = workspace.path_of("out/app.aab");

    bundletool_cmd()
        .arg("build-bundle")
        .arg("--modules")
        .arg(format!("{},{}", base.display(), maps.display()))
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert!(output.is_file());

    bundletool_cmd()
        .arg("validate")
        .arg("--bundle")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("com.example.app"))
        .stdout(predicate::str::contains("maps"));
}

#[test]
fn test_build_bundle_rejects_dependency_cycle() {
    let workspace = TestWorkspace::new();
    let base = workspace.write_module_dir("base", &TestModule::new().min_sdk(21));
    let first = workspace.write_module_dir("feature1", &TestModule::new().uses_split("feature2"));
    let second = workspace.write_module_dir("feature2", &TestModule::new().uses_split("feature1"));
    let output = workspace.path_of("app.aab");

    bundletool_cmd()
        .arg("build-bundle")
        .arg("--modules")
        .arg(format!(
            "{},{},{}",
            base.display(),
            first.display(),
            second.display()
        ))
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    assert!(!output.exists());
}

#[test]
fn test_build_apks_writes_apk_set() {
    let workspace = TestWorkspace::new();
    let output = build_apks(&workspace);
    assert!(output.is_file());
}

#[test]
fn test_build_apks_refuses_existing_output() {
    let workspace = TestWorkspace::new();
    let bundle = abi_bundle(&workspace);
    let output = workspace.write_file("app.apks", b"keep");

    bundletool_cmd()
        .args(["build-apks", "--quiet", "--bundle"])
        .arg(&bundle)
        .arg("--output")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    assert_eq!(workspace.read_file("app.apks"), b"keep");

    bundletool_cmd()
        .args(["build-apks", "--quiet", "--overwrite", "--bundle"])
        .arg(&bundle)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
}

#[test]
fn test_build_apks_missing_bundle() {
    let workspace = TestWorkspace::new();
    bundletool_cmd()
        .args(["build-apks", "--quiet", "--bundle"])
        .arg(workspace.path_of("missing.aab"))
        .arg("--output")
        .arg(workspace.path_of("app.apks"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
    assert!(!workspace.file_exists("app.apks"));
}

#[test]
fn test_build_apks_with_connected_device_from_env() {
    let workspace = TestWorkspace::new();
    let bundle = abi_bundle(&workspace);
    let spec = workspace.write_device_spec(
        "device.json",
        r#"{"sdkVersion": 30, "supportedAbis": ["x86"]}"#,
    );
    let output = workspace.path_of("app.apks");

    bundletool_cmd()
        .env("BUNDLETOOL_CONNECTED_DEVICE_SPEC", &spec)
        .args(["build-apks", "--quiet", "--connected-device", "--bundle"])
        .arg(&bundle)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();
    assert!(output.is_file());
}

#[test]
fn test_build_apks_without_connected_device() {
    let workspace = TestWorkspace::new();
    let bundle = abi_bundle(&workspace);

    bundletool_cmd()
        .env_remove("BUNDLETOOL_CONNECTED_DEVICE_SPEC")
        .args(["build-apks", "--quiet", "--connected-device", "--bundle"])
        .arg(&bundle)
        .arg("--output")
        .arg(workspace.path_of("app.apks"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No connected devices found"));
}

#[test]
fn test_extract_apks_for_device() {
    let workspace = TestWorkspace::new();
    let apks = build_apks(&workspace);
    let spec = workspace.write_device_spec(
        "device.json",
        r#"{"sdkVersion": 30, "supportedAbis": ["arm64-v8a"], "screenDensity": 480}"#,
    );
    let out = workspace.path_of("out");

    bundletool_cmd()
        .arg("extract-apks")
        .arg("--apks")
        .arg(&apks)
        .arg("--device-spec")
        .arg(&spec)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("base-master"))
        .stdout(predicate::str::contains("base-arm64_v8a"))
        .stdout(predicate::str::contains("base-x86").not())
        .stdout(predicate::str::contains("maps-master").not());
}

#[test]
fn test_extract_apks_with_requested_module() {
    let workspace = TestWorkspace::new();
    let apks = build_apks(&workspace);
    let spec = workspace.write_device_spec(
        "device.json",
        r#"{"sdkVersion": 30, "supportedAbis": ["x86"]}"#,
    );

    bundletool_cmd()
        .arg("extract-apks")
        .arg("--apks")
        .arg(&apks)
        .arg("--device-spec")
        .arg(&spec)
        .arg("--output-dir")
        .arg(workspace.path_of("out"))
        .args(["--modules", "maps"])
        .assert()
        .success()
        .stdout(predicate::str::contains("maps-master"));
}

#[test]
fn test_extract_apks_incompatible_device() {
    let workspace = TestWorkspace::new();
    let apks = build_apks(&workspace);
    let spec = workspace.write_device_spec("device.json", r#"{"sdkVersion": 19}"#);

    bundletool_cmd()
        .arg("extract-apks")
        .arg("--apks")
        .arg(&apks)
        .arg("--device-spec")
        .arg(&spec)
        .arg("--output-dir")
        .arg(workspace.path_of("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "No variant of the app matches the device spec.",
        ));
    assert!(!workspace.file_exists("out"));
}

#[test]
fn test_get_size_total() {
    let workspace = TestWorkspace::new();
    let apks = build_apks(&workspace);

    bundletool_cmd()
        .args(["get-size", "total", "--apks"])
        .arg(&apks)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("MIN,MAX\n"))
        .stdout(predicate::str::is_match(r"MIN,MAX\n\d+,\d+\n").unwrap());
}

#[test]
fn test_get_size_for_known_device_is_exact() {
    let workspace = TestWorkspace::new();
    let apks = build_apks(&workspace);
    let spec = workspace.write_device_spec(
        "device.json",
        r#"{"sdkVersion": 30, "supportedAbis": ["x86"]}"#,
    );

    let output = bundletool_cmd()
        .args(["get-size", "total", "--apks"])
        .arg(&apks)
        .arg("--device-spec")
        .arg(&spec)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let sizes = text.lines().nth(1).unwrap();
    let (min, max) = sizes.split_once(',').unwrap();
    assert_eq!(min, max);
}
