//! Simulated Mount Example
//!
//! Runs the full engine against a simulated EXOS-2 controller on an
//! in-memory transport, so no hardware is needed. The simulator answers
//! site location requests, slews towards GoTo and park targets, and tracks
//! slowly once a target is reached. The engine infers every state from the
//! position reports alone.
//!
//! Usage:
//!   cargo run --example simulated_mount
//!   RUST_LOG=debug cargo run --example simulated_mount

use exos2_mount::constants::*;
use exos2_mount::protocol::to_hex;
use exos2_mount::{Command, MemoryTransport, MountConfig, MountController, MountState, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const SLEW_STEP: f32 = 0.5;
const TRACK_STEP: f32 = 0.0002;
const HOME: (f32, f32) = (0.0, 90.0);

fn report(command_id: u8, first: f32, second: f32) -> Vec<u8> {
    let mut bytes = PREAMBLE.to_vec();
    bytes.push(command_id);
    bytes.extend_from_slice(&first.to_le_bytes());
    bytes.extend_from_slice(&second.to_le_bytes());
    bytes
}

fn payload_floats(frame: &[u8]) -> (f32, f32) {
    let mut first = [0u8; 4];
    let mut second = [0u8; 4];
    first.copy_from_slice(&frame[PAYLOAD_OFFSET..PAYLOAD_OFFSET + 4]);
    second.copy_from_slice(&frame[PAYLOAD_OFFSET + 4..PAYLOAD_OFFSET + 8]);
    (f32::from_le_bytes(first), f32::from_le_bytes(second))
}

fn step_towards(current: f32, target: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= SLEW_STEP {
        target
    } else {
        current + SLEW_STEP * diff.signum()
    }
}

/// Simulated hand controller on the far side of the serial line
struct Simulator {
    link: MemoryTransport,
    position: (f32, f32),
    site: (f32, f32),
    target: Option<(f32, f32)>,
    tracking: bool,
    reporting: bool,
}

impl Simulator {
    fn new(link: MemoryTransport) -> Self {
        Self {
            link,
            position: HOME,
            site: (52.5, 13.4),
            target: None,
            tracking: false,
            reporting: false,
        }
    }

    fn handle(&mut self, frame: &[u8]) {
        if frame.len() != FRAME_SIZE || frame[..COMMAND_OFFSET] != PREAMBLE {
            warn!("Simulator ignored {}", to_hex(frame));
            return;
        }

        match Command::from_id(frame[COMMAND_OFFSET]) {
            Some(Command::GetSiteLocation) => {
                self.link
                    .feed(&report(SITE_LOCATION_REPORT_CMD, self.site.0, self.site.1));
                self.reporting = true;
            }
            Some(Command::SetSiteLocation) => {
                let (lon, lat) = payload_floats(frame);
                self.site = (lat, lon);
            }
            Some(Command::GoTo) => {
                self.target = Some(payload_floats(frame));
                self.tracking = true;
            }
            Some(Command::Sync) => self.position = payload_floats(frame),
            Some(Command::Park) => {
                self.target = Some(HOME);
                self.tracking = false;
            }
            Some(Command::StopMotion) => {
                self.target = None;
                self.tracking = false;
            }
            Some(Command::MoveNorth) => self.position.1 = (self.position.1 + 0.01).min(90.0),
            Some(Command::MoveSouth) => self.position.1 = (self.position.1 - 0.01).max(-90.0),
            Some(Command::Disconnect) => self.reporting = false,
            Some(command) => debug!("Simulator accepted {}", command),
            None => warn!("Simulator got unknown command {}", to_hex(frame)),
        }
    }

    fn tick(&mut self) {
        for frame in self.link.take_sent_frames() {
            self.handle(&frame);
        }

        match self.target {
            Some(target) if self.position != target => {
                self.position = (
                    step_towards(self.position.0, target.0),
                    step_towards(self.position.1, target.1),
                );
            }
            Some(_) => self.target = None,
            None if self.tracking => {
                self.position.0 = (self.position.0 + TRACK_STEP) % 24.0;
            }
            None => {}
        }

        if self.reporting {
            self.link
                .feed(&report(POSITION_REPORT_CMD, self.position.0, self.position.1));
        }
    }
}

fn wait_for_state(
    mount: &MountController<MemoryTransport>,
    state: MountState,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if mount.current_state() == state {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    warn!(
        "Timed out waiting for {}, mount is {}",
        state,
        mount.current_state()
    );
    false
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let link = MemoryTransport::new();
    let running = Arc::new(AtomicBool::new(true));
    let simulator = {
        let mut simulator = Simulator::new(link.clone());
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                simulator.tick();
                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    let config = MountConfig {
        poll_interval_ms: 20,
        ..MountConfig::default()
    };
    let mount = MountController::with_config(link, config);
    mount.start()?;
    mount.request_site_location()?;

    wait_for_state(&mount, MountState::Parked, Duration::from_secs(2));
    let site = mount.site_location();
    info!(
        "Site LAT {} LON {}",
        site.right_ascension, site.declination
    );

    info!("=== GoTo Vega ===");
    mount.goto(18.6, 38.8)?;
    wait_for_state(&mount, MountState::Tracking, Duration::from_secs(10));

    info!("=== Hold north for one second ===");
    mount.start_motion(Command::MoveNorth, 5)?;
    thread::sleep(Duration::from_secs(1));
    mount.stop_motion_to_direction()?;

    let pointing = mount.pointing_coordinates();
    info!(
        "Pointing RA {:.4} DEC {:.4} ({})",
        pointing.right_ascension,
        pointing.declination,
        mount.current_state()
    );

    info!("=== Park ===");
    mount.park()?;
    wait_for_state(&mount, MountState::Parked, Duration::from_secs(10));

    mount.stop()?;
    running.store(false, Ordering::SeqCst);
    if simulator.join().is_err() {
        warn!("Simulator thread panicked");
    }

    info!("=== Simulation Complete ===");
    Ok(())
}
