//! RSSI Example
//!
//! Powers the LNA and reads one averaged RSSI sample at the dish's current
//! position, printed as JSON.
//!
//! Usage:
//!   cargo run --example rssi -- --comm-port /dev/ttyUSB0 --iterations 20

use clap::Parser;
use log::{info, warn};
use winegard_rotator::constants::RSSI_ITERATIONS;
use winegard_rotator::{Result, Winegard};

#[derive(Parser, Debug)]
#[command(about = "Sample RSSI from a Winegard dish")]
struct Args {
    /// The Winegard serial communication port
    #[arg(long)]
    comm_port: String,

    /// Number of reads the dish averages
    #[arg(long, default_value_t = RSSI_ITERATIONS)]
    iterations: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut dish = Winegard::new(&args.comm_port);
    dish.connect()?;

    let result = dish.prepare_rssi().and_then(|()| {
        dish.enter_dvb_menu()?;
        let sample = dish.sample_rssi(args.iterations);
        dish.quit_dvb_menu()?;
        sample
    });
    dish.disconnect();

    let sample = result?;
    if !sample.is_measured() {
        warn!("Dish reported no measurement");
    }
    info!(
        "RSSI avg={} cur={} over {} reads",
        sample.average, sample.current, sample.reads
    );
    println!("{}", serde_json::to_string_pretty(&sample).unwrap_or_default());
    Ok(())
}
