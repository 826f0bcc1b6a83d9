//! CONTEXT: win32kd CLI tests
//! OWNERS: @win32k
//! TEST_COVERAGE: 3 CLI tests

use std::io::Write;

#[test]
fn help_flag() {
    assert!(win32kd::execute(&["--help"]).contains("--selfcheck"));
}

#[test]
fn config_file_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[queue]\nmax_pending = 16\n[trace]\nmessages = true").unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert_eq!(win32kd::execute(&["--config", &path]), "win32kd: ready");
}

#[test]
fn broken_config_is_reported() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[queue]\nmax_pending = \"lots\"").unwrap();
    let path = file.path().to_str().unwrap().to_string();
    assert!(win32kd::execute(&["--config", &path, "--selfcheck"]).contains("failed to parse"));
}
