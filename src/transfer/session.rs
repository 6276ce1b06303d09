//! Transfer lifecycle and byte accounting

use log::{debug, trace, warn};
use serde::Deserialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, TransferStatsError};
use crate::transfer::rate::{DEFAULT_WINDOW_CAPACITY, SlidingRateEstimator};
use crate::transfer::stats::TransferStats;

/// Construction options for a [`Transfer`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    /// Known content length, `None` for an unbounded transfer
    pub bytes_total: Option<u64>,

    /// Bytes already completed by a previous session being resumed
    pub bytes_completed: u64,

    /// Number of rate samples averaged into `bytes_per_second`
    pub window_capacity: usize,
}

impl TransferOptions {
    pub fn with_total(mut self, bytes_total: u64) -> Self {
        self.bytes_total = Some(bytes_total);
        self
    }

    pub fn with_completed(mut self, bytes_completed: u64) -> Self {
        self.bytes_completed = bytes_completed;
        self
    }

    pub fn with_window_capacity(mut self, window_capacity: usize) -> Self {
        self.window_capacity = window_capacity;
        self
    }
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            bytes_total: None,
            bytes_completed: 0,
            window_capacity: DEFAULT_WINDOW_CAPACITY,
        }
    }
}

/// Lifecycle state of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Running,
    Paused,
    Finished,
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferState::Idle => write!(f, "idle"),
            TransferState::Running => write!(f, "running"),
            TransferState::Paused => write!(f, "paused"),
            TransferState::Finished => write!(f, "finished"),
        }
    }
}

/// Idle/running/finished progression, tracked separately from pausing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Running,
    Finished,
}

/// Raw transfer state that statistics are derived from
#[derive(Debug, Clone)]
pub(crate) struct TransferRecord {
    pub(crate) phase: Phase,
    pub(crate) bytes_total: Option<u64>,
    pub(crate) bytes_completed: u64,
    pub(crate) start_time: Option<i64>,
    pub(crate) last_update_time: i64,
    pub(crate) paused_accumulated_ms: i64,
    // Some exactly while paused
    pub(crate) pause_start_time: Option<i64>,
    pub(crate) end_time: Option<i64>,
    pub(crate) rate: SlidingRateEstimator,
}

impl TransferRecord {
    pub(crate) fn is_started(&self) -> bool {
        self.phase == Phase::Running
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.pause_start_time.is_some()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Combined state; finishing takes precedence over pausing
    pub(crate) fn state(&self) -> TransferState {
        match self.phase {
            Phase::Finished => TransferState::Finished,
            _ if self.is_paused() => TransferState::Paused,
            Phase::Running => TransferState::Running,
            Phase::Idle => TransferState::Idle,
        }
    }
}

/// Progress tracker for a single upload or download.
///
/// The owner reports the running byte count through
/// [`update_bytes`](Self::update_bytes) and reads [`stats`](Self::stats)
/// whenever it needs to render progress. Calls must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct Transfer<C: Clock = SystemClock> {
    record: TransferRecord,
    clock: C,
}

impl Transfer<SystemClock> {
    /// Create a transfer timed by the system clock
    pub fn new(options: TransferOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }
}

impl<C: Clock> Transfer<C> {
    /// Create a transfer timed by the given clock
    pub fn with_clock(options: TransferOptions, clock: C) -> Self {
        debug!(
            "Creating transfer: total={:?}, completed={}, window={}",
            options.bytes_total, options.bytes_completed, options.window_capacity
        );

        Self {
            record: TransferRecord {
                phase: Phase::Idle,
                bytes_total: options.bytes_total,
                bytes_completed: options.bytes_completed,
                start_time: None,
                last_update_time: 0,
                paused_accumulated_ms: 0,
                pause_start_time: None,
                end_time: None,
                rate: SlidingRateEstimator::with_capacity(options.window_capacity),
            },
            clock,
        }
    }

    /// Mark the transfer as started.
    ///
    /// Timestamps are only recorded on the first call; starting again after
    /// [`finish`](Self::finish) resumes counting from the current totals.
    /// A pause requested earlier stays in effect until [`resume`](Self::resume).
    pub fn start(&mut self) {
        if self.record.phase == Phase::Finished {
            debug!("Restarting finished transfer");
        }

        self.record.phase = Phase::Running;
        if self.record.start_time.is_none() {
            let now = self.clock.now_ms();
            self.record.start_time = Some(now);
            self.record.last_update_time = now;
            // Time before the first start is never elapsed time
            if self.record.is_paused() {
                self.record.pause_start_time = Some(now);
            }
            debug!("Transfer started at {now}");
        }
    }

    /// Suspend rate sampling until [`resume`](Self::resume).
    ///
    /// The rate window is cleared so samples after resuming start fresh.
    pub fn pause(&mut self) {
        if self.record.is_paused() {
            debug!("Ignoring pause while already paused");
            return;
        }

        let now = self.clock.now_ms();
        self.record.pause_start_time = Some(now);
        self.record.rate.clear();
        debug!("Transfer paused at {now}");
    }

    /// Resume after a pause, excluding the paused interval from timings
    pub fn resume(&mut self) {
        if !self.record.is_paused() {
            debug!("Ignoring resume while {}", self.record.state());
            return;
        }

        let now = self.clock.now_ms();
        let paused_ms = self.close_pause(now);
        self.record.last_update_time = now;
        debug!("Transfer resumed after {paused_ms} ms paused");
    }

    /// Mark the transfer as finished. Counters and the pause flag stay readable.
    pub fn finish(&mut self) {
        let now = self.clock.now_ms();
        self.record.phase = Phase::Finished;
        self.record.end_time = Some(now);
        debug!(
            "Transfer finished at {now} with {} bytes completed",
            self.record.bytes_completed
        );
    }

    /// Report the total number of bytes completed so far.
    ///
    /// While paused only the byte count is recorded. Otherwise the rate since
    /// the previous update is sampled into the window. A decreasing count is
    /// accepted and yields a negative rate sample.
    pub fn update_bytes(&mut self, bytes_completed: u64) -> Result<()> {
        if !self.record.is_started() {
            warn!(
                "Rejected byte update of {bytes_completed} while {}",
                self.record.state()
            );
            return Err(TransferStatsError::InvalidState(
                "Transfer not started. Call start() before update_bytes()".to_string(),
            ));
        }

        if self.record.is_paused() {
            self.record.bytes_completed = bytes_completed;
            return Ok(());
        }

        let now = self.clock.now_ms();
        let delta_bytes = bytes_completed as f64 - self.record.bytes_completed as f64;
        let delta_ms = (now - self.record.last_update_time) as f64;
        let sample = rate_sample(delta_bytes, delta_ms);
        trace!("Rate sample: {delta_bytes} bytes over {delta_ms} ms = {sample} B/s");

        self.record.rate.push(sample);
        self.record.last_update_time = now;
        self.record.bytes_completed = bytes_completed;
        Ok(())
    }

    /// Derive the current statistics
    pub fn stats(&self) -> TransferStats {
        TransferStats::compute(&self.record, self.clock.now_ms())
    }

    pub fn state(&self) -> TransferState {
        self.record.state()
    }

    pub fn is_started(&self) -> bool {
        self.record.is_started()
    }

    pub fn is_paused(&self) -> bool {
        self.record.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.record.is_finished()
    }

    pub fn bytes_completed(&self) -> u64 {
        self.record.bytes_completed
    }

    pub fn bytes_total(&self) -> Option<u64> {
        self.record.bytes_total
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Fold the open pause into the paused total and return its length.
    ///
    /// Only time after the first start counts, and once finished only the
    /// part of the pause before the finish.
    fn close_pause(&mut self, now: i64) -> i64 {
        let until = match self.record.end_time {
            Some(end) if self.record.is_finished() => end.min(now),
            _ => now,
        };
        let since = self.record.pause_start_time.take();
        let paused_ms = match (since, self.record.start_time) {
            (Some(since), Some(start)) => (until - since.max(start)).max(0),
            _ => 0,
        };
        self.record.paused_accumulated_ms += paused_ms;
        paused_ms
    }
}

/// Bytes per second for `delta_bytes` moved over `delta_ms`
fn rate_sample(delta_bytes: f64, delta_ms: f64) -> f64 {
    if delta_ms == 0.0 && delta_bytes == 0.0 {
        return 0.0;
    }
    delta_bytes / delta_ms * 1000.0
}
