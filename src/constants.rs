//! Protocol constants for EXOS-2 mount communication.
//!
//! This module defines the wire framing, command identifiers, timing
//! parameters and serial port defaults used by the GoTo controller protocol
//! as of handbox firmware V2.3.

/// Frame preamble, present at the start of every message in both directions
pub const PREAMBLE: [u8; 4] = [0x55, 0xAA, 0x01, 0x09];

/// Total frame size in bytes (preamble + command byte + payload)
pub const FRAME_SIZE: usize = 13;

/// Payload size in bytes
pub const PAYLOAD_SIZE: usize = 8;

/// Offset of the command identifier within a frame
pub const COMMAND_OFFSET: usize = 4;

/// Offset of the first payload byte within a frame
pub const PAYLOAD_OFFSET: usize = 5;

/// Null command, used as "no direction" by the motion state
pub const NULL_CMD: u8 = 0x00;

/// Move east while tracking
pub const MOVE_EAST_CMD: u8 = 0x01;

/// Move west while tracking
pub const MOVE_WEST_CMD: u8 = 0x02;

/// Move north while tracking
pub const MOVE_NORTH_CMD: u8 = 0x04;

/// Move south while tracking
pub const MOVE_SOUTH_CMD: u8 = 0x08;

/// Immediately stop any slewing
pub const STOP_MOTION_CMD: u8 = 0x1D;

/// Slew back to the park/home position
pub const PARK_CMD: u8 = 0x1E;

/// Request the site location from the controller
pub const GET_SITE_LOCATION_CMD: u8 = 0x1F;

/// Gracefully end the session, the mount stops sending status reports
pub const DISCONNECT_CMD: u8 = 0x22;

/// Slew to and track equatorial coordinates
pub const GOTO_CMD: u8 = 0x23;

/// Align the mount to the given coordinates
pub const SYNC_CMD: u8 = 0x24;

/// Set the site location
pub const SET_SITE_LOCATION_CMD: u8 = 0x25;

/// Set date and time
pub const SET_DATE_TIME_CMD: u8 = 0x26;

/// Site location report, answer to GET_SITE_LOCATION
pub const SITE_LOCATION_REPORT_CMD: u8 = 0xFE;

/// Unsolicited pointing position report
pub const POSITION_REPORT_CMD: u8 = 0xFF;

/// Speed marker written twice into move-while-tracking payloads
pub const MOVE_SPEED_MARKER: u8 = 0xC8;

/// Capacity of the receive ring buffer in bytes
pub const RECEIVE_BUFFER_CAPACITY: usize = 256;

/// Interval between receive polls. The mount reports roughly once per second.
pub const POLL_INTERVAL_MS: u64 = 500;

/// Tracking runs at about 0.004°/s, anything above is considered slewing
pub const TRACK_SLEW_THRESHOLD: f32 = 0.0045;

/// Default repeat rate of hold-direction commands
pub const COMMANDS_PER_SECOND: u16 = 10;

/// Host watchdog timeout after connecting
pub const WATCHDOG_TIMEOUT_MS: u64 = 10_000;

/// Baud rate (9600 bps, 8N1)
pub const BAUD_RATE: u32 = 9600;

/// Serial read timeout in milliseconds
pub const TIMEOUT_MS: u64 = 100;

/// Largest year the date/time command can carry
pub const MAX_YEAR: u16 = 9999;
