//! One-shot, re-armable stop deadline on a logical nanosecond clock.
//!
//! The timer never reads a clock itself; callers pass "now" in the same domain
//! as sample timestamps, so tests and replays drive it deterministically.

#[derive(Debug, Clone)]
pub struct StopTimer {
    timeout_ns: u64,
    deadline_ns: Option<u64>,
}

impl StopTimer {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ns: timeout_ms.saturating_mul(1_000_000),
            deadline_ns: None,
        }
    }

    pub fn timeout_ns(&self) -> u64 {
        self.timeout_ns
    }

    pub fn deadline_ns(&self) -> Option<u64> {
        self.deadline_ns
    }

    pub fn is_armed(&self) -> bool {
        self.deadline_ns.is_some()
    }

    /// Cancel any pending deadline and schedule a new one `timeout` after `now_ns`.
    pub fn rearm(&mut self, now_ns: u64) {
        self.deadline_ns = Some(now_ns.saturating_add(self.timeout_ns));
    }

    pub fn cancel(&mut self) {
        self.deadline_ns = None;
    }

    /// Returns the deadline and disarms if it has been reached.
    pub fn poll(&mut self, now_ns: u64) -> Option<u64> {
        match self.deadline_ns {
            Some(deadline) if now_ns >= deadline => {
                self.deadline_ns = None;
                Some(deadline)
            }
            _ => None,
        }
    }
}
