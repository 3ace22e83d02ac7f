// Shared helpers for vpool integration tests
#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use vpool::{PoolConfig, PoolContext};

/// Poll interval used by test contexts
pub const TEST_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Upper bound for any condition a test waits on
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates an isolated context with a short poll interval
pub fn test_context() -> PoolContext {
    test_context_with(PoolConfig::default())
}

/// Like `test_context`, starting from the given configuration
pub fn test_context_with(config: PoolConfig) -> PoolContext {
    vpool::logging::init_test();
    PoolContext::new(PoolConfig {
        poll_interval: TEST_POLL_INTERVAL,
        ..config
    })
    .expect("test configuration is valid")
}

/// Polls `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// In-memory console sink
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
