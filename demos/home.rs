//! Homing Example
//!
//! Homes both motors of a Winegard dish and leaves it pointing south.
//! The dish spins during homing, so the user is asked to confirm first.
//!
//! Usage:
//!   cargo run --example home                          # Interactive port selection
//!   cargo run --example home -- --comm-port /dev/ttyUSB0

use clap::Parser;
use inquire::{Confirm, Select};
use log::{error, info};
use std::thread;
use std::time::Duration;
use winegard_rotator::constants::HOMING_SETTLE_DELAY_MS;
use winegard_rotator::transport::list_ports;
use winegard_rotator::{Result, Winegard};

#[derive(Parser, Debug)]
#[command(about = "Home a Winegard dish")]
struct Args {
    /// The Winegard serial communication port
    #[arg(long)]
    comm_port: Option<String>,
}

/// Interactive serial port selection using inquire
fn select_port() -> Result<String> {
    let ports = list_ports()?;

    if ports.is_empty() {
        eprintln!("No serial ports found!");
        std::process::exit(1);
    }

    let port_names: Vec<String> = ports.into_iter().map(|p| p.port_name).collect();

    let selection = Select::new("Select a serial port:", port_names)
        .prompt()
        .map_err(|e| std::io::Error::other(format!("Selection cancelled: {}", e)))?;

    Ok(selection)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let port_name = match args.comm_port {
        Some(port) => port,
        None => select_port()?,
    };

    let mut dish = Winegard::new(&port_name);
    dish.connect()?;

    info!("Winegard will spin; hold cables");
    let proceed = Confirm::new("Continue?")
        .with_default(false)
        .prompt()
        .unwrap_or(false);
    if !proceed {
        dish.disconnect();
        return Ok(());
    }

    let status = dish.home();
    thread::sleep(Duration::from_millis(HOMING_SETTLE_DELAY_MS));
    dish.disconnect();

    match status {
        Ok(()) => info!("Homing complete!"),
        Err(ref e) => error!("An error occurred during homing: {}", e),
    }
    status
}
