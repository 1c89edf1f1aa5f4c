mod gps;
mod transport;

use std::error::Error;

use clap::Parser;
use millitag_lib::Reporter;
use millitag_lib::config::BeaconConfig;

use crate::gps::SimulatedFixSource;
use crate::transport::{TcpTransport, UdpTransport};

/// ciNet/Millitag tracking beacon
#[derive(Parser)]
#[command(name = "millitag", version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "beacon.json")]
    config: String,

    /// Use the connectionless UDP fallback instead of the TCP stream
    #[arg(long)]
    udp: bool,

    /// Starting latitude for the simulated GPS source (degrees)
    #[arg(long, default_value_t = 53.8272)]
    lat: f64,

    /// Starting longitude for the simulated GPS source (degrees)
    #[arg(long, default_value_t = -1.6647)]
    lon: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = BeaconConfig::load(&args.config)?;
    println!(
        "Millitag beacon, serial {} reporting to {}:{}",
        config.serial_number, config.server_host, config.server_port
    );

    let gps = SimulatedFixSource::new(args.lat, args.lon);

    // Fatal configuration or key-schedule errors surface here; the reporting
    // loop itself recovers from everything else and never returns.
    if args.udp {
        let transport = UdpTransport::new(config.server_host.clone(), config.server_port);
        Reporter::from_config(config, gps, transport)?.run().await;
    } else {
        let transport = TcpTransport::new(config.server_host.clone(), config.server_port);
        Reporter::from_config(config, gps, transport)?.run().await;
    }

    Ok(())
}
