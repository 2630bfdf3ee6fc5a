//! Runtime configuration for the dish client and the rotator gateway.

use crate::constants::{DEFAULT_SOCKET_HOST, DEFAULT_SOCKET_PORT};
use crate::error::{Result, RotatorError};
use serde::{Deserialize, Serialize};

/// Dish connection settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Serial port name, e.g. `/dev/ttyUSB0` or `COM3`
    pub serial_port: String,
    /// Azimuth mounting offset in degrees
    pub offset_angle: i32,
}

impl DeviceConfig {
    pub fn new(serial_port: &str) -> Self {
        Self {
            serial_port: serial_port.to_string(),
            offset_angle: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial_port.trim().is_empty() {
            return Err(RotatorError::InvalidConfig("serial port is empty".to_string()));
        }
        if self.offset_angle.abs() >= 360 {
            return Err(RotatorError::InvalidConfig(format!(
                "offset angle {} outside (-360, 360)",
                self.offset_angle
            )));
        }
        Ok(())
    }
}

/// Gateway settings: the dish plus the TCP endpoint clients connect to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub device: DeviceConfig,
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            host: DEFAULT_SOCKET_HOST.to_string(),
            port: DEFAULT_SOCKET_PORT,
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        self.device.validate()?;
        if self.host.trim().is_empty() {
            return Err(RotatorError::InvalidConfig("socket host is empty".to_string()));
        }
        Ok(())
    }

    /// `host:port` string for binding the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"device": {"serial_port": "/dev/ttyUSB0"}}"#).unwrap();
        assert_eq!(config.device.offset_angle, 0);
        assert_eq!(config.bind_address(), "127.0.0.1:4533");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_port_rejected() {
        assert!(matches!(
            GatewayConfig::default().validate(),
            Err(RotatorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn offset_must_be_within_one_turn() {
        let mut device = DeviceConfig::new("COM3");
        device.offset_angle = -359;
        assert!(device.validate().is_ok());
        device.offset_angle = 360;
        assert!(device.validate().is_err());
    }
}
