mod common;

use std::process::{Command, Output};

use common::fixtures_dir;

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_crop_advisor"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run crop_advisor")
}

fn fixture_args<'a>(dir: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["--models-dir", dir];
    args.extend_from_slice(extra);
    args
}

#[test]
fn test_documented_invocation_prints_result_card() {
    let dir = fixtures_dir().display().to_string();
    let output = run(&fixture_args(
        &dir,
        &[
            "--n", "90", "--p", "42", "--k", "43", "--temperature", "20.9", "--humidity", "82", "--ph", "6.5",
            "--rainfall", "202.9",
        ],
    ));
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RICE"));
    assert!(stdout.contains("N: 90 | P: 42 | K: 43 | pH: 6.5"));
}

#[test]
fn test_defaults_when_readings_are_omitted() {
    let dir = fixtures_dir().display().to_string();
    let output = run(&fixture_args(&dir, &[]));
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("MAIZE"));
    assert!(stdout.contains("Temp: 25°C | Hum: 80% | Rain: 100mm"));
}

#[test]
fn test_out_of_range_reading_is_clamped_with_warning() {
    let dir = fixtures_dir().display().to_string();
    let output = run(&fixture_args(&dir, &["--ph", "20"]));
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ph = 20 is outside 0..=14, clamping"), "stderr: {stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("pH: 14"));
}

#[test]
fn test_verify_without_manifest_exits_non_zero() {
    let dir = fixtures_dir().display().to_string();
    let output = run(&fixture_args(&dir, &["--verify"]));
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("digests.json"));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_missing_artifacts_exit_non_zero() {
    let output = run(&["--models-dir", "/nonexistent/crop-advisor-models"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load"));
    assert!(output.stdout.is_empty());
}
