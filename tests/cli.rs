//! Tests of the `crem-site` binary.

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn crem_site(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crem-site"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("binary should start")
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn demo_preset_writes_outputs_and_chart() {
    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let out = tmp.path().join("out");
    let html = tmp.path().join("ap.html");

    let output = crem_site(&["--preset", "demo", "--out-dir", &path_arg(&out), "--viz-out", &path_arg(&html)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Missing dimension info:"));
    assert!(out.join("scenarios.csv").is_file());
    assert!(out.join("variables.csv").is_file());
    assert!(out.join("national/bau.csv").is_file());

    let fragment = fs::read_to_string(&html).expect("chart should be written");
    assert!(fragment.contains(r#"id="co2_bau""#));
    assert!(fragment.contains(r#"id="ap_3""#));
    assert!(!fragment.contains("_nh3"));
}

#[test]
fn demo_preset_draws_nh3_lines() {
    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let html = tmp.path().join("ap.html");

    let output = crem_site(&[
        "--preset",
        "demo",
        "--out-dir",
        &path_arg(&tmp.path().join("out")),
        "--viz-out",
        &path_arg(&html),
        "--with-nh3",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let fragment = fs::read_to_string(&html).expect("chart should be written");
    assert!(fragment.contains(r#"id="ap_bau_nh3""#));
    assert!(fragment.contains("stroke-dasharray"));
}

#[test]
fn config_file_runs_from_dumps() {
    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let gdx = tmp.path().join("gdx");
    let out = tmp.path().join("out");
    common::write_inputs(&gdx);
    let config = tmp.path().join("site.toml");
    fs::write(&config, common::config_toml(&out)).expect("config should be written");

    let output = crem_site(&["--config", &path_arg(&config), "--gdx-dir", &path_arg(&gdx)]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("(None)"));
    assert!(out.join("A/x.csv").is_file());
    assert!(out.join("national/x.csv").is_file());
}

#[test]
fn missing_dumps_fail() {
    let tmp = tempfile::tempdir().expect("tempdir should be created");
    let config = tmp.path().join("site.toml");
    fs::write(&config, common::config_toml(&tmp.path().join("out"))).expect("config should be written");

    let output = crem_site(&["--config", &path_arg(&config), "--gdx-dir", &path_arg(&tmp.path().join("nowhere"))]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("data preparation failed"));
}

#[test]
fn unknown_preset_fails() {
    let output = crem_site(&["--preset", "nope"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope"));
}

#[test]
fn nh3_flag_requires_chart_output() {
    let output = crem_site(&["--preset", "demo", "--with-nh3"]);
    assert!(!output.status.success());
}
