use lib_common::loggers::setup_logging;
use std::fs;
use tempfile::tempdir;

// The global logger can be installed once per process, so this file holds a
// single test.
#[test]
fn test_setup_logging_writes_log_file() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let log_dir = temp_dir.path().join("logs");
    fs::create_dir_all(&log_dir).unwrap();
    let stale = log_dir.join("test_app_2020-01-01_00-00-00.log");
    fs::write(&stale, "old run\n").unwrap();

    setup_logging("test_app", "debug", Some(&log_dir)).expect("logger setup");

    log::info!("Messages processed: 1000");
    log::warn!("Entity not found for entity ID 7 (status 404)");
    log::trace!("filtered out");
    log::logger().flush();

    assert!(!stale.exists(), "older log should have been removed");

    let log_files: Vec<_> = fs::read_dir(&log_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert_eq!(log_files.len(), 1);

    let content = fs::read_to_string(&log_files[0]).unwrap();
    assert!(content.contains("[INFO] Messages processed: 1000"));
    assert!(content.contains("[WARN] Entity not found for entity ID 7"));
    assert!(!content.contains("filtered out"));

    // A second logger cannot be installed.
    assert!(setup_logging("test_app", "info", None).is_err());
}
