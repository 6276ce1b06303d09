//! Progress display functionality for transfers

use std::io::{self, Write};

use crate::error::Result;
use crate::transfer::TransferStats;

/// Width of the progress bar in characters
const BAR_WIDTH: usize = 50;

/// Render a single progress line for a stats snapshot.
///
/// Bounded transfers get a bar, a percentage and an ETA; unbounded ones only
/// show the byte count and speed.
pub fn render_progress_line(label: &str, stats: &TransferStats) -> String {
    let speed = format_speed(stats.bytes_per_second);
    let completed = format_bytes(stats.bytes_completed);

    match (stats.percentage, stats.bytes_total) {
        (Some(percentage), Some(total)) => {
            let filled = ((percentage.clamp(0.0, 1.0) * BAR_WIDTH as f64) as usize).min(BAR_WIDTH);
            let bar = "#".repeat(filled) + &" ".repeat(BAR_WIDTH - filled);
            format!(
                "{}: [{}] {:.1}% ({} / {}) {} ETA {}",
                label,
                bar,
                percentage * 100.0,
                completed,
                format_bytes(total),
                speed,
                format_duration_ms(stats.ms_remaining)
            )
        }
        _ => format!(
            "{}: {} {} elapsed {}",
            label,
            completed,
            speed,
            format_duration_ms(Some(stats.ms_elapsed as f64))
        ),
    }
}

/// Overwrite the current terminal line with the progress line
pub fn display_progress(label: &str, stats: &TransferStats) -> Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "\r{}", render_progress_line(label, stats))?;
    stdout.flush()?;
    Ok(())
}

/// Clear the progress line and move to next line
pub fn finish_progress() {
    println!();
}

/// Format bytes as human readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

/// Format speed as human readable string
pub fn format_speed(bps: f64) -> String {
    if !bps.is_finite() {
        return "-- B/s".to_string();
    }
    if bps < 0.0 {
        return format!("-{}/s", format_bytes((-bps) as u64));
    }
    format!("{}/s", format_bytes(bps as u64))
}

/// Format a millisecond duration as `m:ss` or `h:mm:ss`.
///
/// Absent, infinite and negative durations render as `--:--`.
pub fn format_duration_ms(ms: Option<f64>) -> String {
    let Some(ms) = ms.filter(|ms| ms.is_finite() && *ms >= 0.0) else {
        return "--:--".to_string();
    };

    let total_secs = (ms / 1000.0) as u64;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(bytes_total: Option<u64>, bytes_completed: u64) -> TransferStats {
        TransferStats {
            started: true,
            paused: false,
            finished: false,
            bytes_total,
            bytes_completed,
            start_date_time: Some(0),
            end_date_time: None,
            percentage: bytes_total.map(|total| bytes_completed as f64 / total as f64),
            bytes_remaining: bytes_total.map(|total| total as i64 - bytes_completed as i64),
            ms_elapsed: 65_000,
            bytes_per_second: 2048.0,
            bytes_per_second_sharp: Some(2048.0),
            ms_total: bytes_total.map(|_| 130_000.0),
            ms_remaining: bytes_total.map(|_| 65_000.0),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1048576), "1.0 MB");
        assert_eq!(format_bytes(1073741824), "1.0 GB");
        assert_eq!(format_bytes(1099511627776), "1.0 TB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(1024.0), "1.0 KB/s");
        assert_eq!(format_speed(1048576.0), "1.0 MB/s");
        assert_eq!(format_speed(-512.0), "-512 B/s");
        assert_eq!(format_speed(f64::INFINITY), "-- B/s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration_ms(Some(0.0)), "0:00");
        assert_eq!(format_duration_ms(Some(65_000.0)), "1:05");
        assert_eq!(format_duration_ms(Some(3_723_000.0)), "1:02:03");
        assert_eq!(format_duration_ms(Some(f64::INFINITY)), "--:--");
        assert_eq!(format_duration_ms(Some(-10.0)), "--:--");
        assert_eq!(format_duration_ms(None), "--:--");
    }

    #[test]
    fn test_render_bounded_line() {
        let line = render_progress_line("file.bin", &stats(Some(4096), 2048));
        assert!(line.starts_with("file.bin: ["));
        assert!(line.contains(&"#".repeat(25)));
        assert!(line.contains("50.0% (2.0 KB / 4.0 KB)"));
        assert!(line.contains("2.0 KB/s"));
        assert!(line.ends_with("ETA 1:05"));
    }

    #[test]
    fn test_render_unbounded_line() {
        let line = render_progress_line("stream", &stats(None, 2048));
        assert_eq!(line, "stream: 2.0 KB 2.0 KB/s elapsed 1:05");
    }
}
