//! Task dispatch tests: what runs, where, and with which outcome.

use std::fs;

use devtask::{Error, Task};

use crate::fixtures::TestProject;

#[test]
fn test_code_runs_runner_on_package() {
    let project = TestProject::new();

    project.dispatcher(&[]).run(Task::TestCode).unwrap();

    let calls = project.calls();
    assert_eq!(calls.len(), 1);
    assert!(
        calls[0].starts_with("pytest pyformlang --showlocals -v cwd="),
        "unexpected call: {}",
        calls[0]
    );
}

/// Given a test runner that exits 1
/// When test-code runs
/// Then the dispatcher's status is exactly 1
#[test]
fn test_code_propagates_exit_one() {
    let mut project = TestProject::new();
    project.set_pytest("exit 1");

    let err = project.dispatcher(&[]).run(Task::TestCode).unwrap_err();

    assert!(matches!(err, Error::StepFailed { code: 1, .. }));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_code_propagates_other_codes() {
    let mut project = TestProject::new();
    project.set_pytest("exit 5");

    let err = project.dispatcher(&[]).run(Task::TestCode).unwrap_err();
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn doc_delegates_html_inside_subproject() {
    let project = TestProject::with_docs();

    project.dispatcher(&[]).run(Task::Doc).unwrap();

    let calls = project.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("make html cwd=doc"), "unexpected call: {}", calls[0]);
}

/// Given existing coverage artifacts
/// When doc runs (successfully or not)
/// Then the artifacts are untouched
#[test]
fn doc_never_touches_coverage_state() {
    let mut project = TestProject::with_docs();
    project.create_coverage_artifacts();

    project.dispatcher(&[]).run(Task::Doc).unwrap();
    assert!(project.exists(".coverage"));
    assert!(project.exists("htmlcov/index.html"));

    project.set_dispatcher("exit 2");
    let err = project.dispatcher(&[]).run(Task::Doc).unwrap_err();
    assert_eq!(err.exit_code(), 2);
    assert!(project.exists(".coverage"));
    assert!(project.exists("htmlcov/index.html"));
}

#[test]
fn doc_fails_without_subproject() {
    let mut project = TestProject::new();
    project.create_coverage_artifacts();

    let err = project.dispatcher(&[]).run(Task::Doc).unwrap_err();

    assert!(matches!(err, Error::DelegateMissing(_)));
    assert_ne!(err.exit_code(), 0);
    assert!(project.calls().is_empty(), "delegate must not be spawned");
    assert!(project.exists(".coverage"));
}

#[test]
fn doc_fails_when_dispatcher_missing() {
    let mut project = TestProject::with_docs();
    project.config_mut().docs.dispatcher = "devtask-no-such-make".to_string();

    let err = project.dispatcher(&[]).run(Task::Doc).unwrap_err();

    assert!(matches!(err, Error::Spawn { .. }));
    assert_eq!(err.exit_code(), 127);
}

#[test]
fn clean_without_artifacts_succeeds() {
    let project = TestProject::with_docs();

    project.dispatcher(&[]).run(Task::Clean).unwrap();

    let calls = project.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("make clean cwd=doc"), "unexpected call: {}", calls[0]);
}

#[test]
fn clean_removes_artifacts_then_delegates() {
    let project = TestProject::with_docs();
    project.create_coverage_artifacts();

    project.dispatcher(&[]).run(Task::Clean).unwrap();

    assert!(!project.exists(".coverage"));
    assert!(!project.exists("htmlcov"));
    assert_eq!(project.calls().len(), 1);
}

#[test]
fn clean_returns_delegate_failure() {
    let mut project = TestProject::with_docs();
    project.set_dispatcher("exit 3");
    project.create_coverage_artifacts();

    let err = project.dispatcher(&[]).run(Task::Clean).unwrap_err();

    assert_eq!(err.exit_code(), 3);
    // Local deletions happened before the delegate ran.
    assert!(!project.exists(".coverage"));
}

/// Given a coverage artifact inside a read-only directory
/// When clean runs
/// Then the task aborts before the delegate is spawned
#[test]
fn clean_stops_when_removal_fails() {
    use std::os::unix::fs::PermissionsExt;

    let mut project = TestProject::with_docs();
    let locked = project.path.join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join(".coverage"), "data").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();
    project.config_mut().coverage.data_file = "locked/.coverage".into();

    // Directory permissions do not bind a privileged user.
    if fs::write(locked.join("write-check"), "").is_err() {
        let err = project.dispatcher(&[]).run(Task::Clean).unwrap_err();

        assert!(matches!(err, Error::Remove { .. }), "got {:?}", err);
        assert_eq!(err.exit_code(), 2);
        assert!(locked.join(".coverage").exists());
        assert!(project.calls().is_empty());
    }

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn clean_treats_path_below_a_file_as_absent() {
    let mut project = TestProject::with_docs();
    fs::write(project.path.join("notes.txt"), "x").unwrap();
    project.config_mut().coverage.data_file = "notes.txt/.coverage".into();

    project.dispatcher(&[]).run(Task::Clean).unwrap();

    assert!(project.exists("notes.txt"));
    assert_eq!(project.calls().len(), 1);
}

/// Given a report dir that points at the project root
/// When clean runs
/// Then it fails without deleting anything
#[test]
fn clean_refuses_to_remove_project_root() {
    for bad in ["", ".", ".."] {
        let mut project = TestProject::with_docs();
        fs::write(project.path.join("setup.py"), "").unwrap();
        project.create_coverage_artifacts();
        project.config_mut().coverage.report_dir = bad.into();

        let err = project.dispatcher(&[]).run(Task::Clean).unwrap_err();

        assert!(matches!(err, Error::Validation(_)), "got {:?}", err);
        assert!(project.exists("setup.py"));
        assert!(project.exists(".coverage"));
        assert!(project.calls().is_empty());
    }
}
