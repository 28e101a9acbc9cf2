//! Global logger setup. Runs in its own test binary because the logger
//! can only be installed once per process.

#[test]
fn test_setup_messages_reach_ring_and_file() {
    let dir = tempfile::tempdir().unwrap();
    rolling_logger::init_logger(dir.path(), "setup").unwrap();

    rolling_logger::info("Remote services started").unwrap();
    rolling_logger::error("Starting remote services failed: offline").unwrap();
    log::warn!("bridged from log");

    let recent = rolling_logger::recent_lines(10);
    assert!(recent
        .iter()
        .any(|line| line.contains("INFO") && line.contains("Remote services started")));
    assert!(recent
        .iter()
        .any(|line| line.contains("ERROR") && line.contains("Starting remote services failed")));
    assert!(recent.iter().any(|line| line.contains("bridged from log")));

    let on_disk = std::fs::read_to_string(dir.path().join("setup.log")).unwrap();
    assert!(on_disk.contains("Remote services started"));

    assert!(matches!(
        rolling_logger::init_logger(dir.path(), "setup"),
        Err(rolling_logger::LoggerError::AlreadyInitialized)
    ));
}
