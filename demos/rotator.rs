//! Rotator Example
//!
//! Runs a Winegard dish as a rotctld-compatible antenna rotator. Point
//! tracking software (e.g. Gpredict) at the socket host/port; the session
//! ends when the client sends `S` or disconnects.
//!
//! Usage:
//!   cargo run --example rotator -- --comm-port /dev/ttyUSB0 --socket-host 0.0.0.0 --socket-port 4533
//!   cargo run --example rotator -- --comm-port COM3 --socket-host 127.0.0.1 --socket-port 4533 --offset-angle -12
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example rotator -- ...

use clap::Parser;
use log::{error, info};
use winegard_rotator::{DeviceConfig, GatewayConfig, RotatorGateway};

#[derive(Parser, Debug)]
#[command(about = "Use a Winegard dish as a rotctld antenna rotator")]
struct Args {
    /// The Winegard serial communication port
    #[arg(long)]
    comm_port: String,

    /// The socket host name
    #[arg(long)]
    socket_host: String,

    /// The socket port number
    #[arg(long)]
    socket_port: u16,

    /// The azimuth offset angle in degrees
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset_angle: i32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GatewayConfig {
        device: DeviceConfig {
            serial_port: args.comm_port,
            offset_angle: args.offset_angle,
        },
        host: args.socket_host,
        port: args.socket_port,
    };

    let mut rotator = match RotatorGateway::new(&config) {
        Ok(rotator) => rotator,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    match rotator.run() {
        Ok(()) => info!("Rotator complete!"),
        Err(e) => {
            error!("Rotator failed: {}", e);
            std::process::exit(1);
        }
    }
}
