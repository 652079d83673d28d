//! Error types for EXOS-2 mount operations.

use crate::types::{Command, MountSignal, MountState};
use thiserror::Error;

/// Result type alias for mount operations.
pub type Result<T> = std::result::Result<T, MountError>;

/// Argument rejected before a frame was encoded.
///
/// The controller accepts any value on the wire (even a time of 99:99:99),
/// so every range check happens on this side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Right ascension outside [0, 24) hours
    #[error("invalid range for right ascension: {0}")]
    RightAscension(f32),

    /// Declination outside [-90, 90] degrees
    #[error("invalid range for declination: {0}")]
    Declination(f32),

    /// Latitude outside [-180, 180]
    #[error("invalid range for latitude: {0}")]
    Latitude(f32),

    /// Longitude outside [-90, 90]
    #[error("invalid range for longitude: {0}")]
    Longitude(f32),

    #[error("invalid range for year: {0}")]
    Year(u16),

    #[error("invalid range for month: {0}")]
    Month(u8),

    /// Day outside the bounds of its month
    #[error("invalid day {day} for month {month}")]
    Day {
        /// Month the day was checked against
        month: u8,
        /// Rejected day
        day: u8,
    },

    #[error("invalid range for hour: {0}")]
    Hour(u8),

    #[error("invalid range for minute: {0}")]
    Minute(u8),

    #[error("invalid range for second: {0}")]
    Second(u8),

    /// February 29 in a common year
    #[error("february can only have 29 days in leap years, {year} is not one")]
    NotALeapYear {
        /// Rejected year
        year: u16,
    },

    /// Command is not one of the four move directions
    #[error("the direction provided is invalid: {0}")]
    Direction(Command),
}

/// Error types for mount communication.
#[derive(Error, Debug)]
pub enum MountError {
    /// Argument failed validation, nothing was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport refused to write the frame
    #[error("Failed to send {command} frame")]
    SendFailed {
        /// Command of the frame that was not sent
        command: Command,
    },

    /// Signal had no transition from the current state, the mount is now FailSafe
    #[error("Undefined transition: ({from}, {signal})")]
    UndefinedTransition {
        /// State the signal was applied to
        from: MountState,
        /// Signal without a registered transition
        signal: MountSignal,
    },
}
