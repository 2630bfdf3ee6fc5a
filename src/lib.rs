//! # Winegard Rotator Library
//!
//! A Rust library for driving a Winegard satellite dish over its serial
//! console and exposing it as an antenna rotator to tracking software.
//!
//! ## Features
//!
//! - Navigate the dish's menu-driven console (main, motor and DVB menus)
//! - Home the motors, command azimuth/elevation and read back angles
//! - Enable the LNA and sample RSSI signal strength
//! - Apply an azimuth mounting offset on every command and reading
//! - Serve one rotctld-compatible TCP client (`p`, `P az el`, `S`)
//!
//! ## Example
//!
//! ```no_run
//! use winegard_rotator::Winegard;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dish = Winegard::new("/dev/ttyUSB0");
//!     dish.connect()?;
//!     dish.quit_menu()?;
//!     dish.enter_motor_menu()?;
//!     let angles = dish.get_angles()?;
//!     println!("Az={:.1} El={:.1}", angles.azimuth, angles.elevation);
//!     dish.disconnect();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod mock;
pub mod protocol;
pub mod request;
pub mod transport;
pub mod types;

pub use config::{DeviceConfig, GatewayConfig};
pub use error::{Result, RotatorError};
pub use gateway::{GatewayState, RotatorGateway, ShutdownHandle};
pub use protocol::Winegard;
pub use request::{Reply, ReplyCode, Request};
pub use transport::{SerialTransport, Transport};
pub use types::*;
