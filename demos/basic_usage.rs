//! Basic Usage Example
//!
//! This example demonstrates the core functionality of the EXOS-2 mount library:
//! - Listing and selecting serial ports
//! - Loading settings from an optional TOML file
//! - Connecting and waiting for the first position report
//! - Sending date, time and a site location request
//! - Watching the inferred mount state
//!
//! Usage:
//!   cargo run --example basic_usage                            # Interactive mode
//!   cargo run --example basic_usage -- /dev/ttyUSB0            # Specify port
//!   cargo run --example basic_usage -- /dev/ttyUSB0 exos2.toml # Port and config file
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example basic_usage
//!   RUST_LOG=trace cargo run --example basic_usage   # Hex dump of every frame

use chrono::Utc;
use exos2_mount::{
    MountConfig, MountController, MountListener, MountSignal, MountState, Result,
    SerialPortTransport,
};
use inquire::Select;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = SerialPortTransport::list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports
        .iter()
        .map(|p| format!("{} - {:?}", p.port_name, p.port_type))
        .collect();

    let selection = Select::new("Select a serial port:", port_names)
        .prompt()
        .map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Selection cancelled: {}", e),
            )
        })?;

    // Extract just the port name (before " - ")
    let port_name = selection
        .split(" - ")
        .next()
        .unwrap_or(&selection)
        .to_string();
    Ok(port_name)
}

struct LogListener;

impl MountListener for LogListener {
    fn on_site_location_received(&self, latitude: f32, longitude: f32) {
        info!("Site location: LAT {:.4} LON {:.4}", latitude, longitude);
    }

    fn on_error_state_reached(&self, from: MountState, signal: MountSignal) {
        error!("Mount entered fail safe after {} in {}", signal, from);
    }
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let port_name = args.next().map(Ok).unwrap_or_else(select_port)?;
    let mut config = match args.next() {
        Some(path) => MountConfig::load_from_file(path)?,
        None => MountConfig::default(),
    };
    config.port_name = port_name;

    info!("Connecting to EXOS-2 mount on {}...", config.port_name);
    let transport = SerialPortTransport::from_config(&config);
    let mount = MountController::with_listener(transport, config.clone(), Arc::new(LogListener));
    mount.start()?;

    mount.set_date_time_utc(Utc::now())?;
    mount.request_site_location()?;

    // Watchdog: the mount only reports once the site location was requested
    let started = Instant::now();
    while mount.pointing_coordinates().is_nan() {
        if started.elapsed() > config.watchdog_timeout() {
            warn!(
                "No position report within {:?}, is the mount powered and in PC mode?",
                config.watchdog_timeout()
            );
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    info!("=== Watching mount for 10 seconds ===");
    for _ in 0..10 {
        let pointing = mount.pointing_coordinates();
        info!(
            "{} RA {:.4} DEC {:.4}",
            mount.current_state(),
            pointing.right_ascension,
            pointing.declination
        );
        std::thread::sleep(Duration::from_secs(1));
    }

    mount.stop()?;
    info!("=== Basic Usage Complete ===");

    Ok(())
}
