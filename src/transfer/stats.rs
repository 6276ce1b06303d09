//! Derived transfer statistics
//!
//! Every metric is recomputed from the raw transfer state at read time.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::transfer::session::TransferRecord;

/// Decimal places kept by `percentage`
const PERCENTAGE_DECIMALS: usize = 10;

/// Point-in-time view of a transfer's progress
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferStats {
    pub started: bool,
    pub paused: bool,
    pub finished: bool,
    pub bytes_total: Option<u64>,
    pub bytes_completed: u64,
    /// Milliseconds since the Unix epoch of the first `start`
    pub start_date_time: Option<i64>,
    /// Milliseconds since the Unix epoch of the latest `finish`
    pub end_date_time: Option<i64>,
    /// Completed fraction in `0.0..=1.0`, rounded to 10 decimal places
    pub percentage: Option<f64>,
    pub bytes_remaining: Option<i64>,
    /// Active (non-paused) time since the transfer started
    pub ms_elapsed: i64,
    /// Mean of the rate window, 0 before any sample
    pub bytes_per_second: f64,
    /// Latest single rate sample
    pub bytes_per_second_sharp: Option<f64>,
    /// Estimated full duration; infinite while the rate is zero
    pub ms_total: Option<f64>,
    /// Estimated time left; infinite while the rate is zero
    pub ms_remaining: Option<f64>,
}

impl TransferStats {
    pub(crate) fn compute(record: &TransferRecord, now_ms: i64) -> Self {
        let bytes_total = record.bytes_total;
        let bytes_completed = record.bytes_completed;

        let bytes_remaining = bytes_total.map(|total| remaining_bytes(total, bytes_completed));
        let percentage = bytes_total
            .zip(bytes_remaining)
            .map(|(total, remaining)| round_percentage(1.0 - remaining as f64 / total as f64));

        let ms_elapsed = elapsed_ms(record, now_ms);
        let bytes_per_second = record.rate.mean();
        let ms_total = bytes_total.map(|total| estimate_total_ms(total, bytes_per_second));
        let ms_remaining = ms_total.map(|total| {
            if bytes_remaining == Some(0) {
                0.0
            } else {
                total - ms_elapsed as f64
            }
        });

        Self {
            started: record.is_started(),
            paused: record.is_paused(),
            finished: record.is_finished(),
            bytes_total,
            bytes_completed,
            start_date_time: record.start_time,
            end_date_time: record.end_time,
            percentage,
            bytes_remaining,
            ms_elapsed,
            bytes_per_second,
            bytes_per_second_sharp: record.rate.most_recent(),
            ms_total,
            ms_remaining,
        }
    }

    pub fn start_date_time_utc(&self) -> Option<DateTime<Utc>> {
        self.start_date_time.and_then(DateTime::from_timestamp_millis)
    }

    pub fn end_date_time_utc(&self) -> Option<DateTime<Utc>> {
        self.end_date_time.and_then(DateTime::from_timestamp_millis)
    }

    /// True when a bounded transfer has no measurable throughput
    pub fn is_stalled(&self) -> bool {
        self.ms_remaining == Some(f64::INFINITY)
    }

    /// Remaining time as a `Duration`, if finite and not overdue
    pub fn eta(&self) -> Option<Duration> {
        self.ms_remaining
            .filter(|ms| ms.is_finite() && *ms >= 0.0)
            .map(|ms| Duration::from_millis(ms as u64))
    }
}

/// `total - completed`, saturating at the `i64` bounds
fn remaining_bytes(total: u64, completed: u64) -> i64 {
    let remaining = i128::from(total) - i128::from(completed);
    i64::try_from(remaining).unwrap_or(if remaining < 0 { i64::MIN } else { i64::MAX })
}

/// Active milliseconds between the first start and the reference instant.
///
/// The reference instant is the earliest of `now_ms`, the pause start while
/// paused, and the finish time once finished.
fn elapsed_ms(record: &TransferRecord, now_ms: i64) -> i64 {
    let Some(start) = record.start_time else {
        return 0;
    };

    let finished_at = record.end_time.filter(|_| record.is_finished());
    let reference = [Some(now_ms), record.pause_start_time, finished_at]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(now_ms);
    (reference - start - record.paused_accumulated_ms).max(0)
}

fn estimate_total_ms(bytes_total: u64, bytes_per_second: f64) -> f64 {
    if bytes_per_second == 0.0 {
        return f64::INFINITY;
    }
    (bytes_total as f64 / bytes_per_second * 1000.0).floor()
}

/// Round to a fixed number of decimals the way fixed-point formatting does,
/// so binary noise such as `0.010000000000000009` reads back as `0.01`.
fn round_percentage(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", PERCENTAGE_DECIMALS, value)
        .parse()
        .unwrap_or(value)
}
