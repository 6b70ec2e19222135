//! Integration tests for the CLI binary.
//!
//! Verifies that the `watt` binary responds to basic flags and that a
//! full init → fund → trade → buy flow works over a state file.
//!
//! This test is registered as a [[test]] in the wattmarket-cli crate so
//! that CARGO_BIN_EXE_watt is available.

use std::path::Path;
use std::process::Command;

/// Get a Command pointing to the `watt` binary.
fn watt_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_watt"))
}

/// Run `watt` with a state file, panicking on non-zero exit.
fn watt(state: &Path, args: &[&str]) -> String {
    let output = watt_binary()
        .arg("--state")
        .arg(state)
        .args(args)
        .output()
        .expect("failed to execute watt");
    assert!(
        output.status.success(),
        "watt {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = watt_binary()
        .arg("--help")
        .output()
        .expect("failed to execute watt --help");

    assert!(
        output.status.success(),
        "watt --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("watt") || stdout.contains("WattMarket") || stdout.contains("Usage"),
        "watt --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = watt_binary()
        .arg("--version")
        .output()
        .expect("failed to execute watt --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1") || stdout.contains("watt"));
}

#[test]
fn cli_exits_with_error_on_unknown_command() {
    let output = watt_binary()
        .arg("definitely-not-a-command")
        .output()
        .expect("failed to execute watt");
    assert!(!output.status.success());
}

#[test]
fn cli_end_to_end_trade_flow() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    watt(&state, &["init"]);
    watt(&state, &["account", "new", "seller"]);
    watt(&state, &["account", "new", "buyer"]);
    watt(&state, &["account", "fund", "buyer", "100000"]);
    watt(&state, &["energy", "credit", "seller", "10", "--as", "seller"]);

    // Create a grid and list a trade on it.
    let created = watt(
        &state,
        &[
            "grid",
            "create",
            "Helsingborg",
            "SE",
            "Sweden",
            "--as",
            "admin",
        ],
    );
    let grid_id = created
        .split_whitespace()
        .last()
        .expect("grid id in output")
        .to_string();

    let listed = watt(
        &state,
        &["trade", "create", &grid_id, "5", "1000", "--as", "seller"],
    );
    let trade_id = listed
        .split_whitespace()
        .last()
        .expect("trade id in output")
        .to_string();

    // Escrow happened.
    let balance = watt(&state, &["energy", "balance", "seller"]);
    assert_eq!(balance.trim(), "5");

    watt(
        &state,
        &[
            "trade", "buy", &grid_id, &trade_id, "--pay", "5000", "--as", "buyer",
        ],
    );

    let balance = watt(&state, &["energy", "balance", "buyer"]);
    assert_eq!(balance.trim(), "5");

    // The trade list is empty and the settlement is on the event log.
    let trades = watt(&state, &["trade", "list", &grid_id]);
    assert!(trades.trim().is_empty());
    let events = watt(&state, &["events"]);
    assert!(events.contains("trade_settled"));
}

#[test]
fn cli_surfaces_named_errors() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path().join("state.json");

    watt(&state, &["init"]);
    watt(&state, &["account", "new", "seller"]);
    watt(&state, &["energy", "credit", "seller", "20", "--as", "seller"]);

    // Below the 5 kWh minimum: the named condition reaches stderr.
    let output = watt_binary()
        .arg("--state")
        .arg(&state)
        .args([
            "trade",
            "create",
            "grid_unknown",
            "2",
            "1000",
            "--as",
            "seller",
        ])
        .output()
        .expect("failed to execute watt");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Quantity too low"),
        "expected named condition, got: {stderr}"
    );

    // The rejected call left the balance untouched.
    let balance = watt(&state, &["energy", "balance", "seller"]);
    assert_eq!(balance.trim(), "20");
}
