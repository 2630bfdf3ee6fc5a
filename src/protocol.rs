use crate::constants::*;
use crate::error::{ContextDisplay, Result, RotatorError};
use crate::transport::{SerialTransport, Transport};
use crate::types::*;
use chrono::Utc;
use log::{debug, info, trace, warn};
use regex::Regex;
use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

static DECIMAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("valid decimal token regex"));
// signed so the unmeasured average (-1) survives parsing
static INTEGER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+").expect("valid integer token regex"));

/// Parse an `a` response into angles, removing the azimuth offset.
///
/// The response must contain exactly two decimal values: azimuth first,
/// elevation second.
pub fn parse_angles(response: &str, offset_angle: i32) -> Result<AngleReading> {
    let tokens: Vec<&str> = DECIMAL_TOKEN.find_iter(response).map(|m| m.as_str()).collect();
    if tokens.len() != ANGLE_TOKEN_COUNT {
        return Err(malformed(format!("{} decimal values", ANGLE_TOKEN_COUNT), response));
    }

    let azimuth: f64 = tokens[0]
        .parse()
        .map_err(|_| malformed("decimal azimuth".to_string(), response))?;
    let elevation: f64 = tokens[1]
        .parse()
        .map_err(|_| malformed("decimal elevation".to_string(), response))?;

    Ok(AngleReading {
        azimuth: remove_offset(azimuth, offset_angle),
        elevation,
    })
}

/// Parse an `rssi` response.
///
/// The response must contain exactly six integers; the last three are the
/// read count, the average and the current value.
pub fn parse_rssi(response: &str) -> Result<RssiSample> {
    let tokens: Vec<&str> = INTEGER_TOKEN.find_iter(response).map(|m| m.as_str()).collect();
    if tokens.len() != RSSI_TOKEN_COUNT {
        return Err(malformed(format!("{} integer values", RSSI_TOKEN_COUNT), response));
    }

    let field = |index: usize| -> Result<i64> {
        tokens[index]
            .parse()
            .map_err(|_| malformed(format!("integer at position {}", index + 1), response))
    };

    let reads = u64::try_from(field(3)?)
        .map_err(|_| malformed("non-negative read count".to_string(), response))?;

    Ok(RssiSample {
        reads,
        average: field(4)?,
        current: field(5)?,
        sampled_at: Utc::now(),
    })
}

fn malformed(expected: String, actual: &str) -> RotatorError {
    RotatorError::MalformedResponse {
        expected,
        actual: actual.to_string(),
    }
}

/// Main Winegard dish interface
///
/// The dish console is a menu hierarchy: motor commands are only accepted
/// inside the motor menu and tuner commands inside the DVB menu. The client
/// tracks the active menu and refuses commands issued from the wrong one.
/// The menu is unknown after `connect` until the first `quit_menu`.
pub struct Winegard<T: Transport = SerialTransport> {
    transport: T,
    offset_angle: i32,
    menu: Option<MenuContext>,
}

impl Winegard<SerialTransport> {
    /// Create a new, unconnected interface for a serial port
    pub fn new(port_name: &str) -> Self {
        Self::with_transport(SerialTransport::new(port_name))
    }
}

impl<T: Transport> Winegard<T> {
    /// Create a new, unconnected interface over any transport
    pub fn with_transport(transport: T) -> Self {
        Winegard {
            transport,
            offset_angle: 0,
            menu: None,
        }
    }

    /// Set the azimuth mounting offset in degrees
    pub fn set_offset_angle(&mut self, offset_angle: i32) {
        self.offset_angle = offset_angle;
    }

    pub fn offset_angle(&self) -> i32 {
        self.offset_angle
    }

    /// Menu the device is believed to be in, `None` if unknown
    pub fn menu_context(&self) -> Option<MenuContext> {
        self.menu
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_open()
    }

    // CONNECTION

    /// Open the transport to the dish
    pub fn connect(&mut self) -> Result<()> {
        self.transport.open()?;
        self.menu = None;
        info!("Connected to dish on {}", self.transport.name());
        Ok(())
    }

    /// Close the transport; safe to call when never connected
    pub fn disconnect(&mut self) {
        if self.transport.is_open() {
            self.transport.close();
            info!("Disconnected from dish on {}", self.transport.name());
        }
        self.menu = None;
    }

    // MAIN MENU

    /// Leave the current menu, returning to the main menu
    pub fn quit_menu(&mut self) -> Result<()> {
        self.transition("q", MenuContext::Main)
    }

    /// Enter the motor menu from the main menu
    pub fn enter_motor_menu(&mut self) -> Result<()> {
        self.require("enter_motor_menu", MenuContext::Main)?;
        self.transition("mot", MenuContext::Motor)
    }

    /// Enter the DVB menu from the main menu
    pub fn enter_dvb_menu(&mut self) -> Result<()> {
        self.require("enter_dvb_menu", MenuContext::Main)?;
        self.transition("dvb", MenuContext::Dvb)
    }

    // MOTOR MENU

    /// Home one motor against its limit switch.
    ///
    /// The command returns before the motor stops; allow
    /// [`HOMING_SETTLE_DELAY_MS`] before further motion.
    pub fn home_motor(&mut self, motor: Motor) -> Result<()> {
        self.require("home_motor", MenuContext::Motor)?;
        self.exchange(&format!("h {}", motor.index()))?;
        Ok(())
    }

    pub fn home_azimuth(&mut self) -> Result<()> {
        self.home_motor(Motor::Azimuth)
    }

    pub fn home_elevation(&mut self) -> Result<()> {
        self.home_motor(Motor::Elevation)
    }

    /// Query current angles
    pub fn get_angles(&mut self) -> Result<AngleReading> {
        self.require("get_angles", MenuContext::Motor)?;
        let response = self.exchange("a")?;
        parse_angles(&response, self.offset_angle)
    }

    /// Command the azimuth motor, applying the mounting offset
    pub fn set_azimuth(&mut self, angle: f64) -> Result<()> {
        self.require("set_azimuth", MenuContext::Motor)?;
        let adjusted = apply_offset(angle, self.offset_angle);
        self.exchange(&format!("a {} {}", Motor::Azimuth.index(), adjusted))?;
        Ok(())
    }

    /// Command the elevation motor
    pub fn set_elevation(&mut self, angle: f64) -> Result<()> {
        self.require("set_elevation", MenuContext::Motor)?;
        if !(ELEVATION_MIN..=ELEVATION_MAX).contains(&angle) {
            debug!(
                "Elevation {} outside documented range [{}, {}]",
                angle, ELEVATION_MIN, ELEVATION_MAX
            );
        }
        self.exchange(&format!("a {} {}", Motor::Elevation.index(), angle))?;
        Ok(())
    }

    /// Command both motors; both are attempted even if the first fails
    pub fn set_position(&mut self, azimuth: f64, elevation: f64) -> Result<()> {
        let azimuth_status = self.set_azimuth(azimuth);
        let elevation_status = self.set_elevation(elevation);
        azimuth_status.and(elevation_status)
    }

    /// Leave the motor menu
    pub fn quit_motor_menu(&mut self) -> Result<()> {
        self.require("quit_motor_menu", MenuContext::Motor)?;
        self.quit_menu()
    }

    // DVB MENU

    /// Power the LNA in outdoor-unit mode
    pub fn enable_lna(&mut self) -> Result<()> {
        self.require("enable_lna", MenuContext::Dvb)?;
        self.exchange(&format!("lnbdc {}", LNA_MODE_ODU))?;
        Ok(())
    }

    /// Sample RSSI averaged over `iterations` reads
    pub fn sample_rssi(&mut self, iterations: u32) -> Result<RssiSample> {
        self.require("sample_rssi", MenuContext::Dvb)?;
        let response = self.exchange(&format!("rssi {}", iterations))?;
        parse_rssi(&response)
    }

    /// Leave the DVB menu
    pub fn quit_dvb_menu(&mut self) -> Result<()> {
        self.require("quit_dvb_menu", MenuContext::Dvb)?;
        self.quit_menu()
    }

    // SEQUENCES

    /// Home both motors, point south and return to the main menu
    pub fn home(&mut self) -> Result<()> {
        info!("Homing dish");
        self.quit_menu()?;
        self.enter_motor_menu()?;
        self.home_azimuth()?;
        self.home_elevation()?;
        self.set_azimuth(SOUTH_DEGREES)?;
        self.quit_motor_menu()
    }

    /// Power the LNA so RSSI samples are meaningful, ending in the main menu
    pub fn prepare_rssi(&mut self) -> Result<()> {
        self.quit_menu()?;
        self.enter_dvb_menu()?;
        self.enable_lna()?;
        self.quit_dvb_menu()
    }

    // HELPER

    fn require(&self, operation: &'static str, required: MenuContext) -> Result<()> {
        if self.menu == Some(required) {
            return Ok(());
        }
        warn!(
            "Refusing {}: requires {} menu, device is in {}",
            operation,
            required,
            ContextDisplay(self.menu)
        );
        Err(RotatorError::WrongContext {
            operation,
            required,
            actual: ContextDisplay(self.menu),
        })
    }

    /// Send a menu command; on failure the menu is no longer known
    fn transition(&mut self, command: &str, target: MenuContext) -> Result<()> {
        match self.exchange(command) {
            Ok(_) => {
                debug!("Entered {} menu", target);
                self.menu = Some(target);
                Ok(())
            }
            Err(e) => {
                self.menu = None;
                Err(e)
            }
        }
    }

    /// Send a command and wait for the prompt that ends its response
    fn exchange(&mut self, command: &str) -> Result<String> {
        trace!("Sending:  {:?}", command);
        let framed = format!("{}{}", command, COMMAND_TERMINATOR);

        let result = self
            .transport
            .write_all(framed.as_bytes())
            .and_then(|()| self.transport.read_until(END_CHARACTER));
        thread::sleep(Duration::from_millis(INTER_COMMAND_DELAY_MS));

        match result {
            Ok(bytes) => {
                let response = String::from_utf8_lossy(&bytes).into_owned();
                trace!("Received: {:?}", response);
                Ok(response)
            }
            Err(e) => {
                warn!("Command {:?} failed: {}", command, e);
                Err(e)
            }
        }
    }
}

impl<T: Transport> Drop for Winegard<T> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
