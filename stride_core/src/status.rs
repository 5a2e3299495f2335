//! Per-sample status returned by the engine.

use stride_traits::SpeedUpdate;

/// What processing one sample produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleStatus {
    /// No step on this sample.
    NoStep,
    /// A step that only became the timing reference (first step of a run).
    FirstStep,
    /// A step whose interval was at or below the noise floor.
    RejectedStep { interval_ns: u64 },
    /// A step that produced a speed update (already delivered to the sink).
    Speed(SpeedUpdate),
}

/// Session state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No step seen since `start()`.
    #[default]
    Idle,
    /// At least one step seen; persists across stop-timeouts.
    Tracking,
}
