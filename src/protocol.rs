//! Frame codec for the EXOS-2 serial protocol.
//!
//! Every message is a fixed 13 byte frame without checksum:
//!
//! ```text
//! 0x55 0xAA 0x01 0x09 <cmd> <payload: 8 bytes>
//! ```
//!
//! Payloads are either zero padding, two little-endian IEEE-754 floats, the
//! date/time layout, or the move-while-tracking speed markers. Since the
//! protocol is fairly simple, the controller accepts nearly anything, so all
//! range checks are done here before a frame is built.

use crate::constants::*;
use crate::error::ValidationError;
use crate::types::{Command, Telemetry};

/// One wire frame
pub type Frame = [u8; FRAME_SIZE];

/// Build a frame from a command and its payload
fn frame(command: Command, payload: [u8; PAYLOAD_SIZE]) -> Frame {
    let mut frame = [0u8; FRAME_SIZE];
    frame[..COMMAND_OFFSET].copy_from_slice(&PREAMBLE);
    frame[COMMAND_OFFSET] = command.id();
    frame[PAYLOAD_OFFSET..].copy_from_slice(&payload);
    frame
}

/// Pack two floats into a payload, first value in bytes 0..4
fn float_payload(first: f32, second: f32) -> [u8; PAYLOAD_SIZE] {
    let mut payload = [0u8; PAYLOAD_SIZE];
    payload[..4].copy_from_slice(&first.to_le_bytes());
    payload[4..].copy_from_slice(&second.to_le_bytes());
    payload
}

fn validate_equatorial(right_ascension: f32, declination: f32) -> Result<(), ValidationError> {
    if !(0.0..24.0).contains(&right_ascension) {
        return Err(ValidationError::RightAscension(right_ascension));
    }
    if !(-90.0..=90.0).contains(&declination) {
        return Err(ValidationError::Declination(declination));
    }
    Ok(())
}

/// Julian rule: every fourth year is a leap year, centuries included
pub fn is_leap_year(year: u16) -> bool {
    year % 4 == 0
}

/// Check a calendar date and time of day as accepted by the controller.
///
/// Hour 24 is allowed.
pub fn validate_date_time(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Result<(), ValidationError> {
    if year > MAX_YEAR {
        return Err(ValidationError::Year(year));
    }
    if !(1..=12).contains(&month) {
        return Err(ValidationError::Month(month));
    }
    if !(1..=31).contains(&day) {
        return Err(ValidationError::Day { month, day });
    }
    if hour > 24 {
        return Err(ValidationError::Hour(hour));
    }
    if minute > 59 {
        return Err(ValidationError::Minute(minute));
    }
    if second > 59 {
        return Err(ValidationError::Second(second));
    }

    let max_day = match month {
        2 => 29,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    if day > max_day {
        return Err(ValidationError::Day { month, day });
    }
    if month == 2 && day == 29 && !is_leap_year(year) {
        return Err(ValidationError::NotALeapYear { year });
    }

    Ok(())
}

/// Gracefully end the session
pub fn encode_disconnect() -> Frame {
    frame(Command::Disconnect, [0; PAYLOAD_SIZE])
}

/// Stop the telescope if it is moving or tracking
pub fn encode_stop_motion() -> Frame {
    frame(Command::StopMotion, [0; PAYLOAD_SIZE])
}

/// Slew back to the park/home position
pub fn encode_park() -> Frame {
    frame(Command::Park, [0; PAYLOAD_SIZE])
}

/// Ask for a site location report. This also starts position reporting.
pub fn encode_get_site_location() -> Frame {
    frame(Command::GetSiteLocation, [0; PAYLOAD_SIZE])
}

/// Slew to and track the given coordinates
pub fn encode_goto(right_ascension: f32, declination: f32) -> Result<Frame, ValidationError> {
    validate_equatorial(right_ascension, declination)?;
    Ok(frame(Command::GoTo, float_payload(right_ascension, declination)))
}

/// Align the mount to the given coordinates, e.g. after plate solving
pub fn encode_sync(right_ascension: f32, declination: f32) -> Result<Frame, ValidationError> {
    validate_equatorial(right_ascension, declination)?;
    Ok(frame(Command::Sync, float_payload(right_ascension, declination)))
}

/// Set the site location. Elevation is not supported by the controller.
///
/// Latitude is checked against [-180, 180] and longitude against [-90, 90],
/// and the payload carries longitude first. Both match what the handbox
/// firmware has been observed to accept.
pub fn encode_set_site_location(latitude: f32, longitude: f32) -> Result<Frame, ValidationError> {
    if !(-180.0..=180.0).contains(&latitude) {
        return Err(ValidationError::Latitude(latitude));
    }
    if !(-90.0..=90.0).contains(&longitude) {
        return Err(ValidationError::Longitude(longitude));
    }
    Ok(frame(Command::SetSiteLocation, float_payload(longitude, latitude)))
}

/// Set date and time of the controller
pub fn encode_set_date_time(
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
) -> Result<Frame, ValidationError> {
    validate_date_time(year, month, day, hour, minute, second)?;

    let payload = [
        (year / 100) as u8,
        (year % 100) as u8,
        month,
        day,
        hour,
        minute,
        second,
        0x00,
    ];
    Ok(frame(Command::SetDateTime, payload))
}

/// Single move-while-tracking step in one of the four directions
pub fn encode_move(direction: Command) -> Result<Frame, ValidationError> {
    if !direction.is_direction() {
        return Err(ValidationError::Direction(direction));
    }

    let payload = [MOVE_SPEED_MARKER, 0, 0, 0, MOVE_SPEED_MARKER, 0, 0, 0];
    Ok(frame(direction, payload))
}

/// Position of the first preamble in `buf`
pub fn find_preamble(buf: &[u8]) -> Option<usize> {
    buf.windows(PREAMBLE.len()).position(|window| window == PREAMBLE)
}

/// Decode one frame.
///
/// Returns `None` unless `bytes` is exactly one frame starting with the
/// preamble. Unknown command identifiers decode to [`Telemetry::Unhandled`].
pub fn decode(bytes: &[u8]) -> Option<Telemetry> {
    if bytes.len() != FRAME_SIZE || bytes[..COMMAND_OFFSET] != PREAMBLE {
        return None;
    }

    let command_id = bytes[COMMAND_OFFSET];
    let first = f32::from_le_bytes([bytes[5], bytes[6], bytes[7], bytes[8]]);
    let second = f32::from_le_bytes([bytes[9], bytes[10], bytes[11], bytes[12]]);

    let telemetry = match Command::from_id(command_id) {
        Some(Command::PositionReport) => Telemetry::PointingCoordinates {
            right_ascension: first,
            declination: second,
        },
        Some(Command::SiteLocationReport) => Telemetry::SiteLocation {
            latitude: first,
            longitude: second,
        },
        _ => {
            let mut payload = [0u8; PAYLOAD_SIZE];
            payload.copy_from_slice(&bytes[PAYLOAD_OFFSET..]);
            Telemetry::Unhandled {
                command_id,
                payload,
            }
        }
    };

    Some(telemetry)
}

/// Space separated hex dump for trace logging
pub fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(command_id: u8, first: f32, second: f32) -> Frame {
        let mut bytes = [0u8; FRAME_SIZE];
        bytes[..4].copy_from_slice(&PREAMBLE);
        bytes[4] = command_id;
        bytes[5..9].copy_from_slice(&first.to_le_bytes());
        bytes[9..].copy_from_slice(&second.to_le_bytes());
        bytes
    }

    #[test]
    fn test_goto_layout() {
        let frame = encode_goto(12.5, -30.25).unwrap();
        assert_eq!(frame.len(), FRAME_SIZE);
        assert_eq!(&frame[..5], &[0x55, 0xAA, 0x01, 0x09, 0x23]);
        assert_eq!(&frame[5..9], &12.5f32.to_le_bytes());
        assert_eq!(&frame[9..13], &(-30.25f32).to_le_bytes());
    }

    #[test]
    fn test_equatorial_ranges() {
        assert_eq!(
            encode_goto(24.01, 0.0),
            Err(ValidationError::RightAscension(24.01))
        );
        assert!(encode_goto(0.0, 90.0).is_ok());
        assert!(encode_goto(0.0, -90.0).is_ok());
        assert_eq!(
            encode_goto(0.0, 90.01),
            Err(ValidationError::Declination(90.01))
        );
        assert!(encode_goto(-0.5, 0.0).is_err());
        assert!(encode_sync(f32::NAN, 0.0).is_err());
        assert!(encode_sync(23.99, 45.0).is_ok());
    }

    #[test]
    fn test_site_location_order_and_ranges() {
        let frame = encode_set_site_location(120.0, -45.5).unwrap();
        assert_eq!(frame[4], SET_SITE_LOCATION_CMD);
        // Longitude goes first on the wire
        assert_eq!(&frame[5..9], &(-45.5f32).to_le_bytes());
        assert_eq!(&frame[9..13], &120.0f32.to_le_bytes());

        assert_eq!(
            encode_set_site_location(180.5, 0.0),
            Err(ValidationError::Latitude(180.5))
        );
        assert_eq!(
            encode_set_site_location(0.0, 91.0),
            Err(ValidationError::Longitude(91.0))
        );
    }

    #[test]
    fn test_zero_padded_commands() {
        for (frame, id) in [
            (encode_disconnect(), DISCONNECT_CMD),
            (encode_stop_motion(), STOP_MOTION_CMD),
            (encode_park(), PARK_CMD),
            (encode_get_site_location(), GET_SITE_LOCATION_CMD),
        ] {
            assert_eq!(&frame[..4], &PREAMBLE);
            assert_eq!(frame[4], id);
            assert!(frame[5..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_date_time_layout() {
        let frame = encode_set_date_time(2021, 7, 14, 23, 5, 59).unwrap();
        assert_eq!(frame[4], SET_DATE_TIME_CMD);
        assert_eq!(&frame[5..], &[20, 21, 7, 14, 23, 5, 59, 0]);
    }

    #[test]
    fn test_date_time_leap_years() {
        assert!(encode_set_date_time(2024, 2, 29, 0, 0, 0).is_ok());
        assert_eq!(
            encode_set_date_time(2023, 2, 29, 0, 0, 0),
            Err(ValidationError::NotALeapYear { year: 2023 })
        );
        assert!(encode_set_date_time(2023, 2, 28, 0, 0, 0).is_ok());
        // Centuries count as leap years
        assert!(encode_set_date_time(1900, 2, 29, 0, 0, 0).is_ok());
        assert!(encode_set_date_time(2024, 2, 30, 0, 0, 0).is_err());
    }

    #[test]
    fn test_date_time_field_ranges() {
        assert_eq!(
            encode_set_date_time(10000, 1, 1, 0, 0, 0),
            Err(ValidationError::Year(10000))
        );
        assert_eq!(
            encode_set_date_time(2021, 13, 1, 0, 0, 0),
            Err(ValidationError::Month(13))
        );
        assert_eq!(
            encode_set_date_time(2021, 0, 1, 0, 0, 0),
            Err(ValidationError::Month(0))
        );
        assert_eq!(
            encode_set_date_time(2021, 4, 31, 0, 0, 0),
            Err(ValidationError::Day { month: 4, day: 31 })
        );
        assert!(encode_set_date_time(2021, 3, 31, 24, 0, 0).is_ok());
        assert_eq!(
            encode_set_date_time(2021, 3, 31, 25, 0, 0),
            Err(ValidationError::Hour(25))
        );
        assert_eq!(
            encode_set_date_time(2021, 3, 31, 12, 60, 0),
            Err(ValidationError::Minute(60))
        );
        assert_eq!(
            encode_set_date_time(2021, 3, 31, 12, 0, 60),
            Err(ValidationError::Second(60))
        );
    }

    #[test]
    fn test_move_frames() {
        let frame = encode_move(Command::MoveNorth).unwrap();
        assert_eq!(
            frame,
            [0x55, 0xAA, 0x01, 0x09, 0x04, 0xC8, 0, 0, 0, 0xC8, 0, 0, 0]
        );
        assert_eq!(
            encode_move(Command::Park),
            Err(ValidationError::Direction(Command::Park))
        );
        assert!(encode_move(Command::Null).is_err());
    }

    #[test]
    fn test_decode_reports() {
        let position = report(POSITION_REPORT_CMD, 5.5, 22.125);
        assert_eq!(
            decode(&position),
            Some(Telemetry::PointingCoordinates {
                right_ascension: 5.5,
                declination: 22.125,
            })
        );

        let site = report(SITE_LOCATION_REPORT_CMD, 52.25, 13.5);
        assert_eq!(
            decode(&site),
            Some(Telemetry::SiteLocation {
                latitude: 52.25,
                longitude: 13.5,
            })
        );
    }

    #[test]
    fn test_decode_preserves_unknown_ids() {
        let goto = encode_goto(1.0, 2.0).unwrap();
        match decode(&goto) {
            Some(Telemetry::Unhandled { command_id, payload }) => {
                assert_eq!(command_id, GOTO_CMD);
                assert_eq!(&payload, &goto[5..]);
            }
            other => panic!("unexpected decode result: {:?}", other),
        }

        let unknown = report(0x42, 0.0, 0.0);
        assert!(matches!(
            decode(&unknown),
            Some(Telemetry::Unhandled { command_id: 0x42, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let position = report(POSITION_REPORT_CMD, 1.0, 1.0);
        assert_eq!(decode(&position[..12]), None);
        let mut bad = position;
        bad[1] = 0x00;
        assert_eq!(decode(&bad), None);
    }

    #[test]
    fn test_float_payload_is_bit_exact() {
        for (ra, dec) in [(0.0f32, -90.0f32), (23.999, 89.999), (6.283_185, -0.000_1)] {
            let frame = encode_goto(ra, dec).unwrap();
            let first = f32::from_le_bytes([frame[5], frame[6], frame[7], frame[8]]);
            let second = f32::from_le_bytes([frame[9], frame[10], frame[11], frame[12]]);
            assert_eq!(first.to_bits(), ra.to_bits());
            assert_eq!(second.to_bits(), dec.to_bits());
        }
    }

    #[test]
    fn test_find_preamble() {
        let mut buf = vec![0x00, 0x55, 0xAA, 0x13];
        buf.extend_from_slice(&PREAMBLE);
        assert_eq!(find_preamble(&buf), Some(4));
        assert_eq!(find_preamble(&buf[..6]), None);
    }
}
