use crate::constants::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Command identifiers understood by the GoTo controller
///
/// Identifiers not listed here make the handbox stop reporting its status
/// until a valid command arrives, so none are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    Null = NULL_CMD,
    MoveEast = MOVE_EAST_CMD,
    MoveWest = MOVE_WEST_CMD,
    MoveNorth = MOVE_NORTH_CMD,
    MoveSouth = MOVE_SOUTH_CMD,
    StopMotion = STOP_MOTION_CMD,
    Park = PARK_CMD,
    GetSiteLocation = GET_SITE_LOCATION_CMD,
    Disconnect = DISCONNECT_CMD,
    GoTo = GOTO_CMD,
    Sync = SYNC_CMD,
    SetSiteLocation = SET_SITE_LOCATION_CMD,
    SetDateTime = SET_DATE_TIME_CMD,
    SiteLocationReport = SITE_LOCATION_REPORT_CMD,
    PositionReport = POSITION_REPORT_CMD,
}

impl Command {
    /// Wire identifier of this command
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up a command by its wire identifier
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            NULL_CMD => Some(Command::Null),
            MOVE_EAST_CMD => Some(Command::MoveEast),
            MOVE_WEST_CMD => Some(Command::MoveWest),
            MOVE_NORTH_CMD => Some(Command::MoveNorth),
            MOVE_SOUTH_CMD => Some(Command::MoveSouth),
            STOP_MOTION_CMD => Some(Command::StopMotion),
            PARK_CMD => Some(Command::Park),
            GET_SITE_LOCATION_CMD => Some(Command::GetSiteLocation),
            DISCONNECT_CMD => Some(Command::Disconnect),
            GOTO_CMD => Some(Command::GoTo),
            SYNC_CMD => Some(Command::Sync),
            SET_SITE_LOCATION_CMD => Some(Command::SetSiteLocation),
            SET_DATE_TIME_CMD => Some(Command::SetDateTime),
            SITE_LOCATION_REPORT_CMD => Some(Command::SiteLocationReport),
            POSITION_REPORT_CMD => Some(Command::PositionReport),
            _ => None,
        }
    }

    /// True for the four move-while-tracking directions
    pub fn is_direction(self) -> bool {
        matches!(
            self,
            Command::MoveEast | Command::MoveWest | Command::MoveNorth | Command::MoveSouth
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02X})", self, self.id())
    }
}

/// Simple coordinate pair, as reported by the mount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoordinates {
    /// Decimal right ascension in hours
    pub right_ascension: f32,
    /// Decimal declination in degrees
    pub declination: f32,
    /// When these coordinates were received
    pub timestamp: DateTime<Utc>,
}

impl EquatorialCoordinates {
    /// Coordinates received now
    pub fn new(right_ascension: f32, declination: f32) -> Self {
        Self {
            right_ascension,
            declination,
            timestamp: Utc::now(),
        }
    }

    /// NaN/NaN, the value before the first report
    pub fn unset() -> Self {
        Self::new(f32::NAN, f32::NAN)
    }

    /// True if either component is NaN
    pub fn is_nan(&self) -> bool {
        self.right_ascension.is_nan() || self.declination.is_nan()
    }

    /// Component-wise `first - second`.
    ///
    /// Both components are taken from the right ascension difference, so
    /// declination-only motion yields a zero delta. The track/slew threshold
    /// is calibrated against this.
    pub fn delta(first: &Self, second: &Self) -> Self {
        let ra = first.right_ascension - second.right_ascension;
        Self {
            right_ascension: ra,
            declination: ra,
            timestamp: second.timestamp,
        }
    }

    /// Squared magnitude of a delta, NaN if either input was unset
    pub fn absolute(delta: &Self) -> f32 {
        delta.right_ascension * delta.right_ascension + delta.declination * delta.declination
    }
}

impl Default for EquatorialCoordinates {
    fn default() -> Self {
        Self::unset()
    }
}

/// Decoded content of a received frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Telemetry {
    /// Position report (0xFF)
    PointingCoordinates {
        right_ascension: f32,
        declination: f32,
    },
    /// Site location report (0xFE), same layout as the position report
    SiteLocation { latitude: f32, longitude: f32 },
    /// Well-formed frame with any other command identifier
    Unhandled {
        command_id: u8,
        payload: [u8; PAYLOAD_SIZE],
    },
}

/// Telescope mount state, inferred from telemetry and issued commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MountState {
    /// No serial session
    Disconnected,
    /// Session started, no report received yet
    Unknown,
    /// At least one report received, the mount accepts commands
    Connected,
    /// Park command sent, slewing to the park position
    ParkingIssued,
    /// Resting at the park/home position
    Parked,
    /// Moving faster than the tracking threshold
    Slewing,
    /// Moving at or below the tracking threshold
    Tracking,
    /// Hold-direction motion while tracking
    MoveWhileTracking,
    /// Stopped after slewing or tracking
    Idle,
    /// Reached on any undefined transition
    FailSafe,
}

impl fmt::Display for MountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Input symbols of the mount state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MountSignal {
    Connect,
    Disconnect,
    /// Site location report received
    GeoReceived,
    /// First valid position report, or a report without motion
    InitialCoordsReceived,
    Stop,
    GoTo,
    Park,
    /// No motion observed while parking
    ParkReached,
    /// Motion above the tracking threshold
    Slew,
    /// Motion at or below the tracking threshold
    Track,
    StartMotion,
    StopMotion,
}

impl MountSignal {
    /// Every signal, in declaration order
    pub const ALL: [MountSignal; 12] = [
        MountSignal::Connect,
        MountSignal::Disconnect,
        MountSignal::GeoReceived,
        MountSignal::InitialCoordsReceived,
        MountSignal::Stop,
        MountSignal::GoTo,
        MountSignal::Park,
        MountSignal::ParkReached,
        MountSignal::Slew,
        MountSignal::Track,
        MountSignal::StartMotion,
        MountSignal::StopMotion,
    ];
}

impl fmt::Display for MountSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Direction and rate of a hold-direction motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionState {
    /// One of the four move commands, `Command::Null` when idle
    pub direction: Command,
    /// Move commands sent per second
    pub rate_per_second: u16,
}

impl MotionState {
    /// No motion
    pub fn idle() -> Self {
        Self {
            direction: Command::Null,
            rate_per_second: 0,
        }
    }

    /// Interval between repeated move commands, `None` if this state cannot drive motion.
    ///
    /// Never shorter than one millisecond.
    pub fn hold_interval(&self) -> Option<Duration> {
        if !self.direction.is_direction() || self.rate_per_second == 0 {
            return None;
        }
        let millis = (1000 / self.rate_per_second as u64).max(1);
        Some(Duration::from_millis(millis))
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::idle()
    }
}
