//! Terminal module for transfer statistics
//!
//! Human-readable rendering of progress snapshots.

pub mod progress;

// Re-export commonly used items
pub use progress::{format_bytes, format_duration_ms, format_speed, render_progress_line};
