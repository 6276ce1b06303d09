//! Transfer tracking: lifecycle, rate window and derived statistics

pub mod rate;
pub mod session;
pub mod stats;

// Re-export main types
pub use rate::{DEFAULT_WINDOW_CAPACITY, SlidingRateEstimator};
pub use session::{Transfer, TransferOptions, TransferState};
pub use stats::TransferStats;
