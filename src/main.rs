use log::{debug, info};
use std::env;
use std::process;
use std::thread;
use std::time::Duration;

use transfer_stats::config::{AppConfig, SimulationConfig};
use transfer_stats::terminal::progress::{display_progress, finish_progress};
use transfer_stats::terminal::{format_bytes, format_duration_ms, format_speed};
use transfer_stats::{Result, Transfer};

const LABEL: &str = "simulated";

fn main() {
    // Initialize logging
    env_logger::init();

    let config_path = env::args().nth(1);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            print_usage();
            process::exit(1);
        }
    };
    info!("Loaded configuration: {}", config);

    if let Err(e) = run_simulation(&config) {
        eprintln!("Simulation failed: {}", e);
        process::exit(1);
    }
}

/// Drive a transfer with synthetic byte counts on the system clock
fn run_simulation(config: &AppConfig) -> Result<()> {
    let simulation = &config.simulation;
    let interval = Duration::from_millis(simulation.interval_ms);
    let mut transfer = Transfer::new(config.transfer.clone());
    let bytes_total = transfer.bytes_total();
    let mut bytes = transfer.bytes_completed();

    transfer.start();
    for update in 1..=simulation.max_updates {
        thread::sleep(interval);

        if is_stalled_update(simulation, update) {
            debug!("Update {update} reports no new bytes");
        } else {
            bytes += simulation.chunk_bytes;
            if let Some(total) = bytes_total {
                bytes = bytes.min(total);
            }
        }

        transfer.update_bytes(bytes)?;
        display_progress(LABEL, &transfer.stats())?;

        if bytes_total.is_some_and(|total| bytes >= total) {
            break;
        }

        if simulation.pause_after_updates == Some(update) {
            transfer.pause();
            debug!("Pausing for {} ms", simulation.pause_ms);
            thread::sleep(Duration::from_millis(simulation.pause_ms));
            transfer.resume();
        }
    }
    transfer.finish();
    finish_progress();

    let stats = transfer.stats();
    let average = if stats.ms_elapsed > 0 {
        stats.bytes_completed as f64 / stats.ms_elapsed as f64 * 1000.0
    } else {
        0.0
    };
    println!(
        "Transferred {} in {} (average {}, last window {})",
        format_bytes(stats.bytes_completed),
        format_duration_ms(Some(stats.ms_elapsed as f64)),
        format_speed(average),
        format_speed(stats.bytes_per_second)
    );
    if let (Some(start), Some(end)) = (stats.start_date_time_utc(), stats.end_date_time_utc()) {
        println!("Started {} / finished {}", start.to_rfc3339(), end.to_rfc3339());
    }

    info!(
        "Simulation completed: {} bytes, {} ms active",
        stats.bytes_completed, stats.ms_elapsed
    );
    Ok(())
}

/// Stalled updates are placed right after the halfway point
fn is_stalled_update(simulation: &SimulationConfig, update: u32) -> bool {
    let stall_start = simulation.max_updates / 2;
    update > stall_start && update <= stall_start + simulation.stall_updates
}

fn print_usage() {
    println!("Transfer Stats Simulator");
    println!("Usage: transfer-stats [config.toml]");
    println!("Environment Variables:");
    println!("  TRANSFER_STATS_TRANSFER__BYTES_TOTAL=4194304");
    println!("  TRANSFER_STATS_TRANSFER__WINDOW_CAPACITY=5");
    println!("  TRANSFER_STATS_SIMULATION__INTERVAL_MS=100");
    println!("  RUST_LOG=debug");
}
