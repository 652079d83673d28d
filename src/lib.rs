//! # EXOS-2 Mount Library
//!
//! A Rust library for controlling Bresser EXOS-2 GoTo telescope mounts over
//! their serial protocol.
//!
//! ## Features
//!
//! - Encode every command the controller understands into its 13 byte frame
//! - Receive and resynchronize position and site location reports
//! - Infer the mount state (parked, slewing, tracking...) from consecutive reports
//! - Repeat hold-direction moves at a fixed rate while tracking
//! - In-memory transport for tests and simulation
//!
//! ## Example
//!
//! ```no_run
//! use exos2_mount::{MountController, SerialPortTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mount = MountController::new(SerialPortTransport::new("/dev/ttyUSB0"));
//!     mount.start()?;
//!     mount.request_site_location()?;
//!     mount.goto(5.5, 22.0)?;
//!     println!("Mount state: {}", mount.current_state());
//!     mount.stop()?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod critical;
pub mod error;
pub mod protocol;
pub mod ring_buffer;
pub mod state_machine;
pub mod transceiver;
pub mod transport;
pub mod types;

pub use config::MountConfig;
pub use controller::{MountController, MountListener};
pub use error::{MountError, Result, ValidationError};
pub use transceiver::TelemetryHandler;
pub use transport::{ByteTransport, MemoryTransport, SerialPortTransport};
pub use types::*;
