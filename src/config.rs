//! High-level configuration of a measurement in terms of physical qualities.

use std::time::Duration;

use crate::params::{Domain, RfPath, Standard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Substring the `*IDN?` response must contain.
    pub identity: String,
    /// Name of the port the instrument is attached to; only used in diagnostics.
    pub port_name: String,
}

impl SessionOptions {
    pub const CMW_IDENTITY: &'static str = "Rohde&Schwarz,CMW";

    pub fn new(port_name: &str) -> SessionOptions {
        SessionOptions { port_name: port_name.to_owned(), ..Default::default() }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            identity: Self::CMW_IDENTITY.to_owned(),
            port_name: String::new(),
        }
    }
}

/// RF setup of one signaling channel, applied by `Signaling::configure_scenario`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioConfiguration {
    /// Connector used for both directions, one of `RF<n>C`.
    pub connector: RfPath,
    /// RX1/RX3 pair with RF1C/RF3C, RX2/RX4 with RF2C/RF4C.
    pub rx_converter: RfPath,
    pub tx_converter: RfPath,
    pub standard: Standard,
    /// Cable loss in dB, applied to both input and output.
    pub external_attenuation: f64,
    /// Access point power in dBm.
    pub ap_power: f64,
    /// Expected burst power at the instrument input in dBm.
    pub approximate_burst_power: f64,
    /// Channel 1 is 2.412 GHz, channel 64 is 5.320 GHz.
    pub broadcast_channel: u16,
}

impl Default for ScenarioConfiguration {
    fn default() -> Self {
        Self {
            connector: RfPath::Rf1Com,
            rx_converter: RfPath::Rx1,
            tx_converter: RfPath::Tx1,
            standard: Standard::AC,
            external_attenuation: 0.0,
            ap_power: -60.0,
            approximate_burst_power: -17.0,
            broadcast_channel: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityConfiguration {
    /// AP power of the first step, in dBm.
    pub start_power: f64,
    /// Lowest AP power that is still measured, in dBm.
    pub stop_power: f64,
    /// Power decrement between steps, in dB.
    pub deviation: f64,
    pub packet_count: u32,
    /// PER in percent at or above which the client is considered to have lost the signal.
    pub threshold: f64,
    pub transport_timeout: Duration,
    pub association_timeout: Duration,
    pub domain: Domain,
    /// Delay after each AP power change.
    pub settle: Duration,
    pub poll_interval: Duration,
    /// Bound on the whole sweep.
    pub search_timeout: Duration,
}

impl SensitivityConfiguration {
    pub fn new(start_power: f64, stop_power: f64) -> SensitivityConfiguration {
        SensitivityConfiguration { start_power, stop_power, ..Default::default() }
    }
}

impl Default for SensitivityConfiguration {
    fn default() -> Self {
        Self {
            start_power: -70.0,
            stop_power: -80.0,
            deviation: 0.5,
            packet_count: 500,
            threshold: 8.0,
            transport_timeout: Duration::from_secs(300),
            association_timeout: Duration::from_secs(20),
            domain: Domain::PacketSwitched,
            settle: Duration::from_secs(1),
            poll_interval: Duration::from_secs(2),
            search_timeout: Duration::from_secs(3600),
        }
    }
}
