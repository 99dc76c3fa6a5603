//! Exercises the built `osort` binary end-to-end, mirroring the corpus's
//! own `test_executable.py`: every assertion here checks the exact
//! stderr wording and exit code the contract specifies.

use std::fs;
use std::process::Command;

fn osort() -> Command {
    Command::new(env!("CARGO_BIN_EXE_osort"))
}

fn tempdir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("osort-cli-tests-{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn version_prints_to_stdout_and_exits_success() {
    let output = osort().arg("--version").output().expect("binary runs");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("osort "));
}

#[test]
fn no_files_present_reports_nothing_to_do() {
    let dir = tempdir("empty");
    let output = osort().arg(dir.display().to_string()).output().expect("binary runs");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr, "No files are present to be sorted. Nothing to do.\n");
}

#[test]
fn nonexistent_path_is_reported_and_fails() {
    let dir = tempdir("missing");
    let missing = dir.join("missing.py");
    let output = osort().arg(missing.display().to_string()).output().expect("binary runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("does not exist"));
    assert!(stderr.ends_with("1 file was not sortable\n"));
}

#[test]
fn already_sorted_file_is_reported_unchanged_and_left_on_disk() {
    let dir = tempdir("unchanged");
    let file = dir.join("good.py");
    let contents = b"def _helper():\n    pass\n\n\ndef public():\n    return _helper()\n";
    fs::write(&file, contents).unwrap();

    let output = osort().arg(dir.display().to_string()).output().expect("binary runs");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr, "1 file was left unchanged\n");
    assert_eq!(fs::read(&file).unwrap(), contents);
}

#[test]
fn unsorted_file_is_rewritten_in_default_mode() {
    let dir = tempdir("resort");
    let file = dir.join("needs_sort.py");
    fs::write(&file, b"def public():\n    return _helper()\n\n\ndef _helper():\n    pass\n").unwrap();

    let output = osort().arg(dir.display().to_string()).output().expect("binary runs");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Sorting"));
    assert!(stderr.ends_with("1 file was resorted\n"));

    let rewritten = fs::read_to_string(&file).unwrap();
    assert!(rewritten.find("_helper").unwrap() < rewritten.find("public").unwrap());
}

#[test]
fn check_mode_reports_drift_without_rewriting() {
    let dir = tempdir("check");
    let file = dir.join("needs_sort.py");
    let original = b"def public():\n    return _helper()\n\n\ndef _helper():\n    pass\n".to_vec();
    fs::write(&file, &original).unwrap();

    let output = osort()
        .arg("--check")
        .arg(dir.display().to_string())
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("is incorrectly sorted"));
    assert!(stderr.ends_with("1 file would be resorted\n"));
    assert_eq!(fs::read(&file).unwrap(), original);
}

#[test]
fn syntax_error_is_reported_with_position() {
    let dir = tempdir("syntax");
    let file = dir.join("broken.py");
    fs::write(&file, b"def broken(:\n    pass\n").unwrap();

    let output = osort().arg(dir.display().to_string()).output().expect("binary runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("syntax error in"));
    assert!(stderr.ends_with("1 file was not sortable\n"));
}

#[test]
fn multiple_unresolved_references_in_one_file_are_all_reported() {
    let dir = tempdir("unresolved");
    let file = dir.join("bad_refs.py");
    fs::write(&file, b"def fun():\n    first_missing()\n    second_missing()\n").unwrap();

    let output = osort().arg(dir.display().to_string()).output().expect("binary runs");
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("unresolved dependency 'first_missing'"));
    assert!(stderr.contains("unresolved dependency 'second_missing'"));
}

#[test]
fn explicit_file_argument_without_py_extension_is_still_processed() {
    let dir = tempdir("no-ext");
    let file = dir.join("plainfile");
    let contents = b"def _helper():\n    pass\n\n\ndef public():\n    return _helper()\n";
    fs::write(&file, contents).unwrap();

    let output = osort().arg(file.display().to_string()).output().expect("binary runs");
    assert!(output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr, "1 file was left unchanged\n");
}
