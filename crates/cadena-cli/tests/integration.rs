//! Integration tests for cadena-cli.
//!
//! Tests run the `cadena` binary and check its output for listing,
//! selection, negotiation and preset workflows.

use std::process::Command;

use tempfile::TempDir;

/// Helper to get the path to the `cadena` binary built by cargo.
fn cadena_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cadena"))
}

fn run_ok(args: &[&str]) -> String {
    let output = cadena_bin()
        .args(args)
        .output()
        .expect("failed to run cadena");
    assert!(
        output.status.success(),
        "cadena {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn run_err(args: &[&str]) -> String {
    let output = cadena_bin()
        .args(args)
        .output()
        .expect("failed to run cadena");
    assert!(!output.status.success(), "cadena {args:?} should fail");
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// `cadena filters`
// ---------------------------------------------------------------------------

#[test]
fn cli_filters_lists_all_filters() {
    let stdout = run_ok(&["filters"]);
    assert!(stdout.contains("Available Filters"));
    for filter in ["dummy", "volume", "format", "resample", "delay", "meter"] {
        assert!(stdout.contains(filter), "listing should contain '{filter}'");
    }
}

#[test]
fn cli_filters_detail_shows_parameters() {
    let stdout = run_ok(&["filters", "volume"]);
    assert!(stdout.contains("Parameters"));
    assert!(stdout.contains("gain"));
    assert!(stdout.contains("detach"));
}

#[test]
fn cli_filters_json() {
    let stdout = run_ok(&["filters", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let filters = value.as_array().expect("array");
    assert_eq!(filters.len(), 6);
    let meter = filters
        .iter()
        .find(|f| f["name"] == "meter")
        .expect("meter listed");
    assert_eq!(meter["once_per_chain"], true);
}

#[test]
fn cli_filters_unknown() {
    let stderr = run_err(&["filters", "reverb"]);
    assert!(stderr.contains("Unknown filter"));
}

// ---------------------------------------------------------------------------
// `cadena layouts` / `cadena select`
// ---------------------------------------------------------------------------

#[test]
fn cli_layouts_lists_standard_names() {
    let stdout = run_ok(&["layouts"]);
    assert!(stdout.contains("5.1(side)"));
    assert!(stdout.contains("stereo"));
    let speakers = run_ok(&["layouts", "--speakers"]);
    assert!(speakers.contains("lfe"));
}

#[test]
fn cli_layouts_describes_a_map() {
    let stdout = run_ok(&["layouts", "6"]);
    assert!(stdout.contains("channels:  6"), "{stdout}");
}

#[test]
fn cli_select_falls_back() {
    let stdout = run_ok(&["select", "5.1(side)", "--allow", "5.1,stereo"]);
    assert_eq!(stdout.trim(), "5.1");
    let stdout = run_ok(&["select", "stereo", "--allow", "stereo"]);
    assert_eq!(stdout.trim(), "stereo (accepted)");
}

#[test]
fn cli_select_without_policy_fails() {
    let stderr = run_err(&["select", "stereo"]);
    assert!(stderr.contains("No acceptable layout"));
}

// ---------------------------------------------------------------------------
// `cadena negotiate`
// ---------------------------------------------------------------------------

#[test]
fn cli_negotiate_dumps_chain() {
    let stdout = run_ok(&[
        "negotiate",
        "--input",
        "16000:mono:s16",
        "--output",
        "48000:stereo:float",
    ]);
    assert!(stdout.contains("[in]"));
    assert!(stdout.contains("resample (auto)"), "{stdout}");
    assert!(stdout.contains("format (auto)"), "{stdout}");
    assert!(stdout.contains("[out]"));
}

#[test]
fn cli_negotiate_pumps_frames() {
    let stdout = run_ok(&[
        "negotiate",
        "--input",
        "48000:stereo:float",
        "--af",
        "@vol:volume=0.5",
        "--frames",
        "4",
        "--frame-size",
        "256",
        "--json",
    ]);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(report["filters"][0]["name"], "volume");
    assert_eq!(report["filters"][0]["label"], "vol");
    assert_eq!(report["pump"]["samples_in"], 1024);
    assert_eq!(report["pump"]["samples_out"], 1024);
    let peak = report["pump"]["peak"].as_f64().unwrap();
    assert!(peak <= 0.2501, "{peak}");
}

#[test]
fn cli_negotiate_passthrough_notes_removal() {
    let stdout = run_ok(&[
        "negotiate",
        "--input",
        "48000:5.1:ac3",
        "--af",
        "dummy,volume",
    ]);
    assert!(stdout.contains("note: removed 'volume'"), "{stdout}");
}

#[test]
fn cli_negotiate_reports_failure() {
    let stderr = run_err(&["negotiate", "--input", "48000:5.1:ac3", "--output", "::s16"]);
    assert!(stderr.contains("Negotiation failed"), "{stderr}");
    let stderr = run_err(&["negotiate", "--af", "volume"]);
    assert!(stderr.contains("No input format"), "{stderr}");
}

#[test]
fn cli_negotiate_no_auto_refuses_conversion() {
    let args = ["negotiate", "--input", "48000:stereo:s16", "--af", "volume"];
    let stdout = run_ok(&args);
    assert!(stdout.contains("format (auto)"), "{stdout}");

    let mut forced = args.to_vec();
    forced.push("--no-auto");
    let stderr = run_err(&forced);
    assert!(stderr.contains("Negotiation failed"), "{stderr}");
    assert!(stderr.contains("automatic conversion is disabled"), "{stderr}");
}

// ---------------------------------------------------------------------------
// `cadena preset`
// ---------------------------------------------------------------------------

#[test]
fn cli_preset_create_check_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("night.toml");
    let path_str = path.to_str().unwrap();

    let stdout = run_ok(&[
        "preset",
        "create",
        "night",
        path_str,
        "--input",
        "48000:5.1:float",
        "--output",
        "48000:stereo:s16",
        "--af",
        "@vol:volume=-6dB",
    ]);
    assert!(stdout.contains("Saved preset 'night'"));
    assert!(path.exists());

    let stdout = run_ok(&["preset", "check", path_str]);
    assert!(stdout.contains("@vol: volume"), "{stdout}");
    assert!(stdout.contains("is valid"));

    let stdout = run_ok(&["preset", "show", path_str]);
    assert!(stdout.contains("--af \"@vol:volume=gain=-6dB\""), "{stdout}");

    // Refuses to overwrite without --force.
    let stderr = run_err(&["preset", "create", "night", path_str]);
    assert!(stderr.contains("already exists"));

    let stdout = run_ok(&["negotiate", "--preset", path_str, "--frames", "2"]);
    assert!(stdout.contains("pumped 2 frames"), "{stdout}");
}

#[test]
fn cli_preset_check_rejects_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "name = \"bad\"\n[[filters]]\nname = \"fuzz\"\n").unwrap();
    let stderr = run_err(&["preset", "check", path.to_str().unwrap()]);
    assert!(stderr.contains("unknown filter: fuzz"), "{stderr}");
}
