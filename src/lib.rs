//! Progress and throughput statistics for a single in-flight byte transfer.
//!
//! A [`Transfer`] is driven by its owner (`start`, `update_bytes`, `pause`,
//! `resume`, `finish`) and exposes a [`TransferStats`] snapshot with the
//! completion percentage, a windowed bytes-per-second rate, and elapsed and
//! remaining time estimates.

pub mod clock;
pub mod config;
pub mod error;
pub mod terminal;
pub mod transfer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TransferStatsError};
pub use transfer::{SlidingRateEstimator, Transfer, TransferOptions, TransferState, TransferStats};
