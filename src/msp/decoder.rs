//! # MSP Telemetry Decoder
//!
//! Decodes MSP telemetry frames (Attitude, Altitude, GPS, Status, RC, Raw IMU)
//! received as single datagrams.
//!
//! Malformed input never surfaces as an error from [`decode`]: a truncated
//! frame, a wrong header or an unknown command simply yields `None`. The
//! trailing checksum byte is not verified.

use bytes::Buf;
use tracing::trace;

use super::protocol::*;
use crate::error::{BridgeError, Result};

/// Decode a datagram into a telemetry record
///
/// # Arguments
///
/// * `bytes` - Raw datagram (magic, length, command, payload, checksum)
///
/// # Returns
///
/// * `Option<Telemetry>` - Decoded record, or `None` if the frame is malformed,
///   too short, or carries a command this bridge does not decode
///
/// # Examples
///
/// ```
/// use skynet_bridge::msp::decoder::decode;
/// use skynet_bridge::msp::protocol::{MspFrame, Telemetry, MSP_ATTITUDE};
///
/// let payload = [100u8, 0, 56, 255, 8, 7]; // 10.0°, -20.0°, 180.0°
/// let datagram = MspFrame::new(MSP_ATTITUDE, &payload).to_bytes();
///
/// match decode(&datagram) {
///     Some(Telemetry::Attitude(att)) => assert!((att.yaw - 180.0).abs() < 0.01),
///     other => panic!("unexpected {:?}", other),
/// }
/// assert!(decode(&[0x24, 0x4D]).is_none());
/// ```
pub fn decode(bytes: &[u8]) -> Option<Telemetry> {
    let frame = match decode_frame(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            trace!("Dropping datagram ({} bytes): {}", bytes.len(), e);
            return None;
        }
    };

    let record = match frame.command {
        MSP_ATTITUDE => decode_attitude(frame.payload).map(Telemetry::Attitude),
        MSP_ALTITUDE => decode_altitude(frame.payload).map(Telemetry::Altitude),
        MSP_RAW_GPS => decode_gps(frame.payload).map(Telemetry::Gps),
        MSP_STATUS => decode_status(frame.payload).map(Telemetry::Status),
        MSP_RC => decode_rc(frame.payload).map(Telemetry::Rc),
        MSP_RAW_IMU => decode_raw_imu(frame.payload).map(Telemetry::RawImu),
        other => {
            // MSP_MOTOR lands here too: recognized by the firmware, unused by us
            trace!("Ignoring MSP command {}", other);
            return None;
        }
    };

    if record.is_none() {
        trace!(
            "Payload too short for MSP command {}: {} bytes",
            frame.command,
            frame.payload.len()
        );
    }
    record
}

/// Split a datagram into command and payload
///
/// # Errors
///
/// Returns error if:
/// - Fewer than 6 bytes
/// - Magic is not `$M>`
/// - Datagram is shorter than `6 + length`
pub fn decode_frame(bytes: &[u8]) -> Result<MspFrame<'_>> {
    if bytes.len() < MSP_FRAME_OVERHEAD {
        return Err(BridgeError::MspProtocol(format!(
            "Frame too short: {} bytes",
            bytes.len()
        )));
    }

    if bytes[..3] != MSP_MAGIC {
        return Err(BridgeError::MspProtocol(format!(
            "Invalid header: {:02X?}",
            &bytes[..3]
        )));
    }

    let length = bytes[3] as usize;
    let command = bytes[4];

    if bytes.len() < MSP_FRAME_OVERHEAD + length {
        return Err(BridgeError::MspProtocol(format!(
            "Frame too short: expected {} bytes, got {}",
            MSP_FRAME_OVERHEAD + length,
            bytes.len()
        )));
    }

    let payload = &bytes[MSP_PAYLOAD_OFFSET..MSP_PAYLOAD_OFFSET + length];
    Ok(MspFrame::new(command, payload))
}

/// Decode MSP_ATTITUDE: roll, pitch, yaw as i16 degrees × 10
pub fn decode_attitude(payload: &[u8]) -> Option<Attitude> {
    if payload.len() < ATTITUDE_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    Some(Attitude {
        roll: buf.get_i16_le() as f32 / 10.0,
        pitch: buf.get_i16_le() as f32 / 10.0,
        yaw: buf.get_i16_le() as f32 / 10.0,
    })
}

/// Decode MSP_ALTITUDE: i32 altitude (cm), i16 velocity (cm/s)
pub fn decode_altitude(payload: &[u8]) -> Option<Altitude> {
    if payload.len() < ALTITUDE_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    Some(Altitude {
        altitude_cm: buf.get_i32_le(),
        velocity_cms: buf.get_i16_le(),
    })
}

/// Decode MSP_RAW_GPS
pub fn decode_gps(payload: &[u8]) -> Option<GpsData> {
    if payload.len() < GPS_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    let fix = buf.get_u8() != 0;
    let satellites = buf.get_u8();

    // Degrees × 10^7
    let latitude = buf.get_i32_le() as f64 / 10_000_000.0;
    let longitude = buf.get_i32_le() as f64 / 10_000_000.0;

    let altitude = buf.get_u16_le();
    let speed = buf.get_u16_le();

    // Degrees × 10
    let course = buf.get_u16_le() as f32 / 10.0;

    Some(GpsData {
        fix,
        satellites,
        latitude,
        longitude,
        altitude,
        speed,
        course,
    })
}

/// Decode MSP_STATUS
pub fn decode_status(payload: &[u8]) -> Option<Status> {
    if payload.len() < STATUS_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    Some(Status {
        cycle_time: buf.get_u16_le(),
        i2c_errors: buf.get_u16_le(),
        sensors: buf.get_u16_le(),
        flight_mode_bits: buf.get_u32_le(),
        // Decivolts
        battery_voltage: buf.get_u8() as f32 / 10.0,
    })
}

/// Decode MSP_RC: 8 × u16 PWM values
pub fn decode_rc(payload: &[u8]) -> Option<RcChannels> {
    if payload.len() < RC_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    let mut values = [0u16; RC_CHANNEL_COUNT];
    for value in values.iter_mut() {
        *value = buf.get_u16_le();
    }

    Some(RcChannels { values })
}

/// Decode MSP_RAW_IMU: accel, gyro, mag as 3 × i16 each
pub fn decode_raw_imu(payload: &[u8]) -> Option<RawImu> {
    if payload.len() < RAW_IMU_PAYLOAD_SIZE {
        return None;
    }

    let mut buf = payload;
    let mut read_vec3 = || [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()];

    let accel = read_vec3();
    let gyro = read_vec3();
    let mag = read_vec3();

    Some(RawImu { accel, gyro, mag })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(command: u8, payload: &[u8]) -> Vec<u8> {
        MspFrame::new(command, payload).to_bytes()
    }

    fn attitude_payload(roll: i16, pitch: i16, yaw: i16) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&roll.to_le_bytes());
        payload.extend_from_slice(&pitch.to_le_bytes());
        payload.extend_from_slice(&yaw.to_le_bytes());
        payload
    }

    // ==================== Framing ====================

    #[test]
    fn test_decode_too_short() {
        for len in 0..MSP_FRAME_OVERHEAD {
            let bytes = vec![0x24; len];
            assert!(decode(&bytes).is_none(), "{} bytes should not decode", len);
        }
    }

    #[test]
    fn test_decode_wrong_magic() {
        let mut bytes = frame(MSP_ATTITUDE, &attitude_payload(1, 2, 3));
        bytes[2] = b'<'; // request direction, not a response
        assert!(decode(&bytes).is_none());

        let mut bytes = frame(MSP_ATTITUDE, &attitude_payload(1, 2, 3));
        bytes[0] = 0x00;
        assert!(decode(&bytes).is_none());
    }

    #[test]
    fn test_decode_frame_wrong_magic_is_error() {
        let bytes = [0xFF, 0x4D, 0x3E, 0x00, MSP_STATUS, 0x00];
        let result = decode_frame(&bytes);
        assert!(matches!(result, Err(BridgeError::MspProtocol(_))));
    }

    #[test]
    fn test_decode_truncated_payload() {
        let mut bytes = frame(MSP_ATTITUDE, &attitude_payload(1, 2, 3));
        // Drop the checksum: 5 + 6 bytes < 6 + 6
        bytes.pop();
        assert!(decode_frame(&bytes).is_err());
        assert!(decode(&bytes).is_none());
    }

    #[test]
    fn test_decode_frame_ignores_checksum() {
        let mut bytes = frame(MSP_ATTITUDE, &attitude_payload(1, 2, 3));
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(decode(&bytes).is_some());
    }

    #[test]
    fn test_decode_frame_extracts_payload() {
        let bytes = frame(MSP_RC, &[9, 8, 7]);
        let decoded = decode_frame(&bytes).unwrap();
        assert_eq!(decoded.command, MSP_RC);
        assert_eq!(decoded.payload, &[9, 8, 7]);
    }

    #[test]
    fn test_decode_frame_with_trailing_bytes() {
        let mut bytes = frame(MSP_ATTITUDE, &attitude_payload(100, 0, 0));
        bytes.extend_from_slice(&[0xAA; 4]);
        match decode(&bytes) {
            Some(Telemetry::Attitude(att)) => assert!((att.roll - 10.0).abs() < 0.001),
            other => panic!("Expected attitude, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_command() {
        let bytes = frame(200, &[0u8; 8]);
        assert!(decode_frame(&bytes).is_ok());
        assert!(decode(&bytes).is_none());
    }

    #[test]
    fn test_decode_motor_ignored() {
        let bytes = frame(MSP_MOTOR, &[0xE8, 0x03, 0xE8, 0x03, 0xE8, 0x03, 0xE8, 0x03]);
        assert!(decode(&bytes).is_none());
    }

    #[test]
    fn test_decode_short_payload_for_command() {
        // A well-formed frame whose payload is too short for the command
        let bytes = frame(MSP_STATUS, &[0u8; 10]);
        assert!(decode_frame(&bytes).is_ok());
        assert!(decode(&bytes).is_none());
    }

    // ==================== Attitude ====================

    #[test]
    fn test_decode_attitude_round_trip() {
        let bytes = frame(MSP_ATTITUDE, &attitude_payload(100, -200, 1800));

        match decode(&bytes) {
            Some(Telemetry::Attitude(att)) => {
                assert!((att.roll - 10.0).abs() < 0.001);
                assert!((att.pitch - (-20.0)).abs() < 0.001);
                assert!((att.yaw - 180.0).abs() < 0.001);
            }
            other => panic!("Expected attitude, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_attitude_sign_extension() {
        // 0xFF38 = -200
        let att = decode_attitude(&[0x38, 0xFF, 0x00, 0x80, 0xFF, 0x7F]).unwrap();
        assert!((att.roll - (-20.0)).abs() < 0.001);
        assert!((att.pitch - (-3276.8)).abs() < 0.01);
        assert!((att.yaw - 3276.7).abs() < 0.01);
    }

    // ==================== Altitude ====================

    #[test]
    fn test_decode_altitude() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&(-1234i32).to_le_bytes());
        payload.extend_from_slice(&(-56i16).to_le_bytes());

        match decode(&frame(MSP_ALTITUDE, &payload)) {
            Some(Telemetry::Altitude(alt)) => {
                assert_eq!(alt.altitude_cm, -1234);
                assert_eq!(alt.velocity_cms, -56);
            }
            other => panic!("Expected altitude, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_altitude_too_short() {
        assert!(decode_altitude(&[0u8; 5]).is_none());
    }

    // ==================== GPS ====================

    #[test]
    fn test_decode_gps() {
        let lat_raw: i32 = 377_749_000; // 37.7749
        let lon_raw: i32 = -1_224_194_000; // -122.4194

        let mut payload = vec![1u8, 12];
        payload.extend_from_slice(&lat_raw.to_le_bytes());
        payload.extend_from_slice(&lon_raw.to_le_bytes());
        payload.extend_from_slice(&120u16.to_le_bytes()); // altitude
        payload.extend_from_slice(&350u16.to_le_bytes()); // speed
        payload.extend_from_slice(&2705u16.to_le_bytes()); // 270.5°

        match decode(&frame(MSP_RAW_GPS, &payload)) {
            Some(Telemetry::Gps(gps)) => {
                assert!(gps.fix);
                assert_eq!(gps.satellites, 12);
                assert!((gps.latitude - 37.7749).abs() < 1e-6);
                assert!((gps.longitude - (-122.4194)).abs() < 1e-6);
                assert_eq!(gps.altitude, 120);
                assert_eq!(gps.speed, 350);
                assert!((gps.course - 270.5).abs() < 0.01);
            }
            other => panic!("Expected GPS, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_gps_no_fix() {
        let payload = [0u8; GPS_PAYLOAD_SIZE];
        let gps = decode_gps(&payload).unwrap();
        assert!(!gps.fix);
        assert_eq!(gps.satellites, 0);
    }

    #[test]
    fn test_decode_gps_too_short() {
        assert!(decode_gps(&[0u8; 15]).is_none());
    }

    // ==================== Status ====================

    fn status_payload(flight_modes: u32, battery_dv: u8) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&3500u16.to_le_bytes()); // cycle time
        payload.extend_from_slice(&2u16.to_le_bytes()); // i2c errors
        payload.extend_from_slice(&0x002Fu16.to_le_bytes()); // sensors
        payload.extend_from_slice(&flight_modes.to_le_bytes());
        payload.push(battery_dv);
        payload
    }

    #[test]
    fn test_decode_status() {
        match decode(&frame(MSP_STATUS, &status_payload(0x01 | 0x08, 126))) {
            Some(Telemetry::Status(status)) => {
                assert_eq!(status.cycle_time, 3500);
                assert_eq!(status.i2c_errors, 2);
                assert_eq!(status.sensors, 0x002F);
                assert!(status.is_armed());
                assert_eq!(status.flight_mode(), FlightMode::NavAltHold);
                assert!((status.battery_voltage - 12.6).abs() < 0.001);
            }
            other => panic!("Expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_status_angle_and_horizon_reports_angle() {
        let status = decode_status(&status_payload(0b0000_0110, 0)).unwrap();
        assert_eq!(status.flight_mode(), FlightMode::Angle);
        assert!(!status.is_armed());
    }

    #[test]
    fn test_decode_status_no_mode_bits_is_acro() {
        let status = decode_status(&status_payload(0, 111)).unwrap();
        assert_eq!(status.flight_mode(), FlightMode::Acro);
    }

    // ==================== RC ====================

    #[test]
    fn test_decode_rc() {
        let pwm: [u16; 8] = [1500, 1480, 1100, 1520, 2000, 1000, 1500, 1999];
        let payload: Vec<u8> = pwm.iter().flat_map(|v| v.to_le_bytes()).collect();

        match decode(&frame(MSP_RC, &payload)) {
            Some(Telemetry::Rc(rc)) => {
                assert_eq!(rc.values, pwm);
                assert_eq!(rc.throttle(), 1100);
                assert_eq!(rc.aux1(), 2000);
            }
            other => panic!("Expected RC, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rc_too_short() {
        assert!(decode_rc(&[0u8; 14]).is_none());
    }

    // ==================== Raw IMU ====================

    #[test]
    fn test_decode_raw_imu() {
        let values: [i16; 9] = [10, -20, 512, -1, 0, 1, 300, -300, 42];
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        match decode(&frame(MSP_RAW_IMU, &payload)) {
            Some(Telemetry::RawImu(imu)) => {
                assert_eq!(imu.accel, [10, -20, 512]);
                assert_eq!(imu.gyro, [-1, 0, 1]);
                assert_eq!(imu.mag, [300, -300, 42]);
            }
            other => panic!("Expected raw IMU, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_raw_imu_too_short() {
        assert!(decode_raw_imu(&[0u8; 17]).is_none());
    }
}
