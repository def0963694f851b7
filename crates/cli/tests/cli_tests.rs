// Integration tests for the `sheets` binary's non-interactive surface.
// Run with: cargo test -p sheets-cli --test cli_tests
//
// Manual smoke test (cannot be automated, requires a real TTY):
//   sheets /tmp/demo.csv
//   Verify: grid draws, `=1+2<Enter>` shows 3, `:wq` writes the file, terminal restored.

use std::process::Command;

fn sheets() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sheets"))
}

#[test]
fn version_long_flag() {
    let output = sheets().arg("--version").output().expect("sheets --version");

    assert!(output.status.success(), "exit code: {:?}\nstderr: {}",
        output.status, String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "stdout: {}", stdout);
}

#[test]
fn version_short_flag() {
    let output = sheets().arg("-v").output().expect("sheets -v");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "stdout: {}", stdout);
}

#[test]
fn help_exits_zero() {
    let output = sheets().arg("--help").output().expect("sheets --help");

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Usage"));
}

#[test]
fn unknown_flag_is_usage_error() {
    let output = sheets().arg("--bogus").output().expect("sheets --bogus");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bogus"), "stderr: {}", stderr);
}

#[test]
fn extra_argument_is_usage_error() {
    let output = sheets().args(["a.csv", "b.csv"]).output().expect("sheets a.csv b.csv");

    assert_eq!(output.status.code(), Some(2));
}
