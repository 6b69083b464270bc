//! End-to-end runs of the `mxmltest` driver.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/test.xml")
}

fn mxmltest(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mxmltest"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn test_fixture_succeeds() {
    let path = fixture();
    let out = mxmltest(&[path.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("<group type=\"text\">"), "{stdout}");
    assert_eq!(stdout.matches("<choice>").count(), 2);
    assert!(stdout.contains("<integer>123</integer>"));
}

#[test]
fn test_find_other_element() {
    let path = fixture();
    let out = mxmltest(&[path.to_str().unwrap(), "--find", "option"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
}

#[test]
fn test_search_miss_fails() {
    let path = fixture();
    let out = mxmltest(&[path.to_str().unwrap(), "--find", "nothing"]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unable to find first <nothing>"), "{stderr}");
    assert!(out.stdout.is_empty());
}

#[test]
fn test_missing_file_fails() {
    let out = mxmltest(&["/nonexistent/input.xml"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_malformed_file_fails() {
    let dir = std::env::temp_dir().join(format!("mxmltest-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let bad = dir.join("bad.xml");
    std::fs::write(&bad, "<a><b></a>").unwrap();

    let out = mxmltest(&[bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("mismatched close tag"), "{stderr}");

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_missing_argument_fails() {
    let out = mxmltest(&[]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("required"), "{stderr}");
}

#[test]
fn test_help_goes_to_stdout() {
    let out = mxmltest(&["--help"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage"), "{stdout}");
}
