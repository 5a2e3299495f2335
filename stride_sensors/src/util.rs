use std::time::{Duration, Instant};

use crate::error::{Result, SensorError};

/// Wait until `is_ready` returns true, or `timeout` expires.
/// Sleeps in small intervals to avoid CPU spinning.
pub fn wait_until_ready_with_timeout(
    mut is_ready: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let deadline = Instant::now() + timeout;
    while !is_ready() {
        let now = Instant::now();
        if now >= deadline {
            return Err(SensorError::DataReadyTimeout);
        }
        std::thread::sleep(poll_interval.min(deadline - now));
    }
    Ok(())
}

/// Block until `due`, as long as that is within `timeout`.
pub fn wait_until_due(due: Instant, timeout: Duration) -> Result<()> {
    wait_until_ready_with_timeout(
        || Instant::now() >= due,
        timeout,
        Duration::from_micros(500),
    )
}
