//! Protocol constants for Winegard dish communication.
//!
//! This module defines the constants used by the serial menu protocol and
//! the rotctld-style network protocol, including timing parameters and
//! serial port configuration.

/// Baud rate (115200 bps)
pub const BAUD_RATE: u32 = 115_200;

/// Serial silence timeout in milliseconds
pub const TIMEOUT_MS: u64 = 15_000;

/// Response terminator, the device prompt character `>`
pub const END_CHARACTER: u8 = b'>';

/// Command terminator appended to every outbound command
pub const COMMAND_TERMINATOR: char = '\r';

/// Delay after each completed exchange before the next command
pub const INTER_COMMAND_DELAY_MS: u64 = 1;

/// Read buffer size for a single serial read
pub const READ_CHUNK_SIZE: usize = 64;

/// Motor index of the azimuth axis
pub const AZIMUTH_MOTOR_INDEX: u8 = 0;

/// Motor index of the elevation axis
pub const ELEVATION_MOTOR_INDEX: u8 = 1;

/// LNA supply mode (outdoor unit)
pub const LNA_MODE_ODU: &str = "odu";

/// Default number of RSSI samples averaged by the device
pub const RSSI_ITERATIONS: u32 = 10;

/// RSSI average reported when no measurement was taken
pub const RSSI_INVALID: i64 = -1;

/// Number of integer tokens in an `rssi` response
pub const RSSI_TOKEN_COUNT: usize = 6;

/// Number of decimal tokens in an `a` response
pub const ANGLE_TOKEN_COUNT: usize = 2;

/// Azimuth commanded at the end of homing (due south)
pub const SOUTH_DEGREES: f64 = 180.0;

/// Time for the motors to settle after homing
pub const HOMING_SETTLE_DELAY_MS: u64 = 4_000;

/// Documented lower elevation limit in degrees
pub const ELEVATION_MIN: f64 = 18.0;

/// Documented upper elevation limit in degrees
pub const ELEVATION_MAX: f64 = 65.0;

/// Maximum bytes read for a single control request
pub const MAX_REQUEST_BYTES: usize = 128;

/// Get position request
pub const CMD_GET_POSITION: &str = "p";

/// Set position request
pub const CMD_SET_POSITION: &str = "P";

/// Token count of a set position request, including the command itself
pub const CMD_SET_POSITION_NUM_PARAMS: usize = 3;

/// Stop request
pub const CMD_STOP: &str = "S";

/// Reply code for success
pub const RESP_SUCCESS: u8 = 0;

/// Reply code for failure
pub const RESP_FAILURE: u8 = 1;

/// Default rotctld TCP port
pub const DEFAULT_SOCKET_PORT: u16 = 4533;

/// Default bind host
pub const DEFAULT_SOCKET_HOST: &str = "127.0.0.1";

/// Poll interval of the cancellable accept loop
pub const ACCEPT_POLL_INTERVAL_MS: u64 = 100;
