use crate::constants::{AZIMUTH_MOTOR_INDEX, ELEVATION_MOTOR_INDEX, RSSI_INVALID};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Command-interpretation mode of the dish console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuContext {
    Main,
    Motor,
    Dvb,
}

impl fmt::Display for MenuContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MenuContext::Main => "main",
            MenuContext::Motor => "motor",
            MenuContext::Dvb => "dvb",
        };
        f.write_str(name)
    }
}

/// Positioner axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Motor {
    Azimuth,
    Elevation,
}

impl Motor {
    /// Index used by the `h` and `a` motor commands
    pub fn index(self) -> u8 {
        match self {
            Motor::Azimuth => AZIMUTH_MOTOR_INDEX,
            Motor::Elevation => ELEVATION_MOTOR_INDEX,
        }
    }
}

/// Dish pointing angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleReading {
    /// Azimuth in [0, 360), offset already removed
    pub azimuth: f64,
    pub elevation: f64,
}

/// Averaged signal strength reported by the DVB tuner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RssiSample {
    /// Number of reads the device averaged
    pub reads: u64,
    /// Average RSSI, `-1` when not measured
    pub average: i64,
    /// Most recent RSSI read
    pub current: i64,
    pub sampled_at: DateTime<Utc>,
}

impl RssiSample {
    /// Whether the average holds a real measurement
    pub fn is_measured(&self) -> bool {
        self.average != RSSI_INVALID
    }
}

/// Convert a requested azimuth to the dish's mechanical frame
pub fn apply_offset(azimuth: f64, offset_angle: i32) -> f64 {
    wrap_degrees(azimuth + f64::from(offset_angle))
}

/// Convert a mechanical azimuth reported by the dish back to true azimuth
pub fn remove_offset(azimuth: f64, offset_angle: i32) -> f64 {
    wrap_degrees(azimuth - f64::from(offset_angle))
}

/// Wrap into [0, 360); `rem_euclid` rounds tiny negatives up to 360.0
fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_wraps_into_range() {
        assert_eq!(apply_offset(350.0, 20), 10.0);
        assert_eq!(remove_offset(10.0, 20), 350.0);
        assert_eq!(apply_offset(5.0, -10), 355.0);
        assert_eq!(remove_offset(355.0, -10), 5.0);
    }

    #[test]
    fn tiny_negative_azimuth_wraps_to_zero() {
        assert_eq!(apply_offset(-1e-17, 0), 0.0);
        assert_eq!(remove_offset(-1e-17, 0), 0.0);
        assert!(apply_offset(-1e-17, 360) < 360.0);
    }

    #[test]
    fn zero_offset_is_identity() {
        assert_eq!(apply_offset(123.4, 0), 123.4);
        assert_eq!(remove_offset(123.4, 0), 123.4);
    }

    #[test]
    fn unmeasured_rssi_sentinel() {
        let sample = RssiSample {
            reads: 10,
            average: RSSI_INVALID,
            current: 0,
            sampled_at: Utc::now(),
        };
        assert!(!sample.is_measured());
    }

    #[test]
    fn menu_context_serializes_lowercase() {
        let json = serde_json::to_string(&MenuContext::Dvb).unwrap();
        assert_eq!(json, "\"dvb\"");
        assert_eq!(MenuContext::Motor.to_string(), "motor");
    }

    #[test]
    fn motor_indices() {
        assert_eq!(Motor::Azimuth.index(), 0);
        assert_eq!(Motor::Elevation.index(), 1);
    }
}
