//! Integration tests for the lifecycle phases running against a console host.

use extcore_core::ErrorKind;

use crate::helpers::{self, TestHost};

#[test]
fn test_full_lifecycle_runs_host_tasks() {
    let host = TestHost::new(Some("Data Source=memory"));

    let tasks = host.run().unwrap();

    assert_eq!(tasks, 2);
    assert_eq!(
        host.entries(),
        [
            "greet:hello",
            "save:Data Source=memory",
            "audit:save",
            "handlers:1",
        ]
    );
    assert_eq!(host.notes.all(), ["note"]);
}

#[test]
fn test_storage_without_connection_string() {
    let host = TestHost::new(None);

    host.run().unwrap();

    assert!(host.entries().contains(&"save:-".to_string()));
}

#[test]
fn test_missing_storage_fails_when_connection_configured() {
    let host = TestHost::with_sample("sample-memory", Some("Data Source=memory"), Vec::new());

    let err = host.run().unwrap_err();

    assert!(err.is(ErrorKind::ImplementationNotFound));
    assert!(host.entries().is_empty());
}

#[test]
fn test_missing_storage_fails_only_the_task_without_connection() {
    let host = TestHost::with_sample("sample-memory", None, Vec::new());

    let err = host.run().unwrap_err();

    // The storage action tolerates the gap; the task needing storage does not.
    assert!(err.message.contains("save"));
    assert_eq!(host.entries(), ["greet:hello"]);
}

#[test]
fn test_failing_pipeline_action_is_skipped() {
    let host = TestHost::with_sample(
        "sample-data-memory",
        None,
        vec![helpers::broken_pipeline_module()],
    );

    assert_eq!(host.run().unwrap(), 2);
}

#[test]
fn test_failing_host_action_stops_startup() {
    let host = TestHost::with_sample(
        "sample-data-memory",
        None,
        vec![helpers::broken_host_module()],
    );

    let err = host.run().unwrap_err();

    assert!(err.is(ErrorKind::Internal));
    assert!(host.entries().is_empty());
}

#[test]
fn test_descriptors_of_linked_crates() {
    let host = TestHost::new(None);

    let descriptors = host.manager.extension_descriptors().unwrap();
    let names: Vec<String> = descriptors.iter().map(|d| d.info().name).collect();

    assert_eq!(names, ["ExtCore.Events", "ExtCore.Data"]);
    assert_eq!(descriptors[1].module(), "extcore-data");
}
