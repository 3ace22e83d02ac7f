// Integration tests for vpool::error

use std::io;
use std::time::Duration;

use anyhow::anyhow;
use vpool::error::PoolError;
use vpool::GroupId;

#[test]
fn test_configuration_error_display() {
    assert_eq!(
        PoolError::InvalidWorkerCount { requested: 5000, max: 4096 }.to_string(),
        "Invalid worker count 5000 (maximum per group: 4096)"
    );
    assert_eq!(
        PoolError::InvalidConfig("poll_interval must be non-zero".to_string()).to_string(),
        "Invalid pool configuration: poll_interval must be non-zero"
    );
}

#[test]
fn test_group_error_display() {
    assert_eq!(PoolError::UnknownGroup(GroupId::from("g9")).to_string(), "Unknown group: g9");
    assert_eq!(PoolError::UnknownGroup(GroupId::from(3)).to_string(), "Unknown group: 3");
    assert_eq!(
        PoolError::WaitTimeout { group: GroupId::from("g1"), timeout: Duration::from_millis(500) }.to_string(),
        "Group g1 did not become idle within 500ms"
    );
    assert_eq!(
        PoolError::ShutdownTimeout(Duration::from_secs(2)).to_string(),
        "Workers did not retire within 2s"
    );
}

#[test]
fn test_spawn_error_display_and_source() {
    let err = PoolError::SpawnFailed {
        group: GroupId::from("g1"),
        source: io::Error::new(io::ErrorKind::Other, "out of threads"),
    };
    assert_eq!(err.to_string(), "Failed to spawn worker thread for group g1: out of threads");
    assert!(std::error::Error::source(&err).is_some());

    let monitor = PoolError::MonitorSpawnFailed(io::Error::new(io::ErrorKind::Other, "denied"));
    assert_eq!(monitor.to_string(), "Failed to spawn lifecycle monitor thread: denied");

    let fanout = PoolError::FanOutSpawnFailed(io::Error::new(io::ErrorKind::Other, "denied"));
    assert_eq!(fanout.to_string(), "Failed to spawn fan-out thread: denied");
}

#[test]
fn test_other_wraps_anyhow() {
    let err: PoolError = anyhow!("queue disconnected").into();
    assert!(matches!(err, PoolError::Other(_)));
    assert!(err.to_string().contains("queue disconnected"));
}
