use std::time::Duration;

use clap::Parser;

use cmw500::{ChannelState, Cmw500, ScenarioConfiguration, SensitivityConfiguration, Standard};
use cmw500::Transport;
use cmw500::sys::TcpTransport;

/// Measure the receive sensitivity of a WLAN client associated to a CMW500
#[derive(Parser, Debug)]
#[command(name = "cmw500-sensitivity")]
#[command(version)]
struct Args {
    /// Instrument address as host or host:port (raw SCPI socket)
    #[arg(long, env = "CMW500_TCP", conflicts_with = "serial")]
    tcp: Option<String>,

    /// Serial device the instrument is attached to
    #[arg(long, env = "CMW500_SERIAL")]
    serial: Option<String>,

    #[arg(long, default_value_t = 19200)]
    baud_rate: u32,

    /// Signaling channel (1..4)
    #[arg(short, long, default_value_t = 1)]
    channel: u8,

    /// AP power of the first step, in dBm
    #[arg(long, default_value_t = -70.0, allow_negative_numbers = true)]
    start_power: f64,

    /// Lowest AP power measured, in dBm
    #[arg(long, default_value_t = -80.0, allow_negative_numbers = true)]
    stop_power: f64,

    /// Step between AP powers, in dB
    #[arg(long, default_value_t = 0.5)]
    deviation: f64,

    #[arg(long, default_value_t = 500)]
    packets: u32,

    /// PER threshold in percent
    #[arg(long, default_value_t = 8.0)]
    threshold: f64,

    /// Seconds a single PER measurement may take
    #[arg(long, default_value_t = 300)]
    transport_timeout: u64,

    /// Reset the instrument before configuring it
    #[arg(long)]
    preset: bool,

    /// Configure routing, standard, attenuation and power before switching the channel on
    #[arg(long)]
    configure: bool,

    /// External attenuation applied in both directions, in dB
    #[arg(long, default_value_t = 0.0)]
    attenuation: f64,

    /// WLAN broadcast channel
    #[arg(long, default_value_t = 1)]
    broadcast_channel: u16,
}

fn run<T: Transport>(mut cmw: Cmw500<T>, args: &Args) -> cmw500::Result<()> {
    if args.preset {
        cmw.preset()?;
    }
    if args.configure {
        let scenario = ScenarioConfiguration {
            standard: Standard::AC,
            external_attenuation: args.attenuation,
            broadcast_channel: args.broadcast_channel,
            ..Default::default()
        };
        cmw.signaling().configure_scenario(args.channel, &scenario)?;
    }
    cmw.signaling().set_state(args.channel, ChannelState::On, Duration::from_secs(30))?;

    let config = SensitivityConfiguration {
        deviation: args.deviation,
        packet_count: args.packets,
        threshold: args.threshold,
        transport_timeout: Duration::from_secs(args.transport_timeout),
        ..SensitivityConfiguration::new(args.start_power, args.stop_power)
    };
    let result = cmw.sensitivity().find(args.channel, &config);
    // leave the channel off whatever the outcome
    let switched_off = cmw.signaling()
        .set_state(args.channel, ChannelState::Off, Duration::from_secs(30));
    let closed = cmw.close();

    let sensitivity = result?;
    for step in sensitivity.steps.iter() {
        println!("  {:+7.2} dBm: PER {:.2}%", step.power, step.per);
    }
    println!("sensitivity: {:+.2} dBm ({:?} at {:+.2} dBm)",
             sensitivity.power, sensitivity.cause, sensitivity.failed_at);
    switched_off?;
    closed
}

fn main() -> cmw500::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(ref address) = args.tcp {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| std::io::Error::new(
                    std::io::ErrorKind::InvalidInput, format!("invalid port in {:?}", address)))?;
                (host, port)
            }
            None => (address.as_str(), TcpTransport::DEFAULT_PORT),
        };
        return run(Cmw500::connect_tcp(host, port)?, &args)
    }

    if let Some(ref path) = args.serial {
        return run(Cmw500::connect_serial(path, args.baud_rate)?, &args)
    }

    Err(std::io::Error::new(std::io::ErrorKind::InvalidInput,
                            "one of --tcp or --serial is required").into())
}
