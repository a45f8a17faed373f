//! Per-channel configuration of the WLAN signaling application.
//!
//! Every setter validates its arguments before anything is sent, writes the setting, and reads it
//! back. A read-back that disagrees with what was written is an `Error::ConfigurationMismatch`.

use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};
use crate::command::Command;
use crate::config::ScenarioConfiguration;
use crate::diag::emit;
use crate::params::{ChannelState, Direction, OperationMode, RfPath, SecurityMode, Standard};
use crate::session::CommandSession;
use crate::validate;

pub const ATTENUATION_MAX: f64 = 100.0;
pub const ATTENUATION_TOLERANCE: f64 = 0.05;
pub const AP_POWER_MIN: f64 = -100.0;
pub const AP_POWER_MAX: f64 = 30.0;
pub const PEP_POWER_MIN: f64 = -120.0;
pub const PEP_POWER_MAX: f64 = 40.0;
pub const BURST_POWER_TOLERANCE: f64 = 0.5;
pub const BROADCAST_CHANNEL_MIN: u16 = 1;
pub const BROADCAST_CHANNEL_MAX: u16 = 196;
pub const SSID_MAX_LEN: usize = 32;

pub const STATE_POLL_DELAY: Duration = Duration::from_millis(100);
pub const STATE_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn parse_response<T: FromStr>(command: &str, response: &str) -> Result<T> {
    response.trim().parse().map_err(|_| Error::Protocol {
        command: command.to_owned(),
        response: response.to_owned(),
    })
}

pub(crate) fn unquote(response: &str) -> &str {
    response.trim().trim_matches('"')
}

pub struct Signaling<'s, S: CommandSession + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: CommandSession + ?Sized> Signaling<'s, S> {
    pub fn new(session: &'s mut S) -> Signaling<'s, S> {
        Signaling { session }
    }

    pub fn state(&mut self, channel: u8) -> Result<ChannelState> {
        let channel = validate::channel(channel)?;
        let command = Command::QueryChannelState.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let first = response.split(',').next().unwrap_or_default().trim();
        let state = ChannelState::from_scpi_code(first)
            .ok_or_else(|| Error::Protocol { command, response: response.clone() })?;
        emit!(self.session, Debug, "signaling", "CH{} state is {}", channel, state);
        Ok(state)
    }

    pub fn is_rf_on(&mut self, channel: u8) -> Result<bool> {
        Ok(self.state(channel)? == ChannelState::On)
    }

    /// Switch the signaling channel on or off and wait until the instrument reports the new
    /// state.
    pub fn set_state(&mut self, channel: u8, state: ChannelState, timeout: Duration) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "signaling", "setting CH{} to {}", channel, state);
        self.session.send(&Command::SetChannelState.format(&[&channel, &state]))?;
        self.session.wait_for_state(state.scpi_code(),
                                    &Command::QueryChannelState.format(&[&channel]),
                                    STATE_POLL_DELAY, timeout)?;
        emit!(self.session, Info, "signaling", "CH{} set to {}", channel, state);
        Ok(())
    }

    pub fn set_scenario(&mut self, channel: u8, rx_connector: RfPath, rx_converter: RfPath,
                        tx_connector: RfPath, tx_converter: RfPath) -> Result<()> {
        let channel = validate::channel(channel)?;
        for (role, path) in [("rx connector", rx_connector), ("tx connector", tx_connector)] {
            if !path.is_connector() {
                return Err(validate::invalid(role, format!("{} is not a connector", path)))
            }
        }
        if !matches!(rx_converter, RfPath::Rx1 | RfPath::Rx2 | RfPath::Rx3 | RfPath::Rx4) {
            return Err(validate::invalid("rx converter",
                                         format!("{} is not an RX converter", rx_converter)))
        }
        if !matches!(tx_converter, RfPath::Tx1 | RfPath::Tx2 | RfPath::Tx3 | RfPath::Tx4) {
            return Err(validate::invalid("tx converter",
                                         format!("{} is not a TX converter", tx_converter)))
        }
        let expected = [rx_connector, rx_converter, tx_connector, tx_converter];
        emit!(self.session, Debug, "signaling", "routing CH{} to {:?}", channel, expected);
        self.session.send(&Command::SetScenario.format(&[
            &channel, &rx_connector, &rx_converter, &tx_connector, &tx_converter]))?;
        let actual = self.scenario(channel)?;
        if actual != expected {
            return Err(validate::mismatch(format!("CH{} RF route", channel),
                                          join_paths(&expected), join_paths(&actual)))
        }
        Ok(())
    }

    pub fn scenario(&mut self, channel: u8) -> Result<[RfPath; 4]> {
        let channel = validate::channel(channel)?;
        let command = Command::QueryScenario.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let paths = response.split(',')
            .map(|code| RfPath::from_scpi_code(code.trim()))
            .collect::<Option<Vec<_>>>()
            .and_then(|paths| <[RfPath; 4]>::try_from(paths).ok());
        paths.ok_or_else(|| Error::Protocol { command, response })
    }

    pub fn set_ext_attenuation(&mut self, channel: u8, attenuation: f64, direction: Direction)
            -> Result<()> {
        self.set_ext_attenuation_with_tolerance(channel, attenuation, direction,
                                                ATTENUATION_TOLERANCE)
    }

    /// The instrument keeps two decimals of attenuation and may round the read-back.
    pub fn set_ext_attenuation_with_tolerance(&mut self, channel: u8, attenuation: f64,
                                              direction: Direction, tolerance: f64) -> Result<()> {
        let channel = validate::channel(channel)?;
        // validated as it goes out on the wire, two decimals
        let attenuation = validate::hundredths(attenuation);
        validate::below("external attenuation", attenuation, 0.0, ATTENUATION_MAX)?;
        emit!(self.session, Debug, "signaling", "configuring {} dB {} attenuation on CH{}",
              attenuation, direction, channel);
        let value = format!("{:.2}", attenuation);
        self.session.send(&Command::SetExtAttenuation.format(&[&channel, &direction, &value]))?;
        let command = Command::QueryExtAttenuation.format(&[&channel, &direction]);
        let response = self.session.send_receive(&command)?;
        let actual: f64 = parse_response(&command, &response)?;
        if !validate::within_tolerance(attenuation, actual, tolerance) {
            return Err(validate::mismatch(format!("CH{} {} attenuation", channel, direction),
                                          value, response))
        }
        Ok(())
    }

    pub fn set_standard(&mut self, channel: u8, standard: Standard) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "signaling", "configuring CH{} standard to {}", channel, standard);
        self.session.send(&Command::SetStandard.format(&[&channel, &standard]))?;
        self.verify_text(Command::QueryStandard.format(&[&channel]),
                         format!("CH{} standard", channel), standard.scpi_code())
    }

    /// Set the AP power in dBm. The instrument keeps two decimals, so `power` is rounded to
    /// 0.01 dB before it is sent and the read-back is compared on that grid.
    pub fn set_ap_power(&mut self, channel: u8, power: f64) -> Result<()> {
        let channel = validate::channel(channel)?;
        let power = validate::in_range("AP power", validate::hundredths(power),
                                       AP_POWER_MIN, AP_POWER_MAX)?;
        emit!(self.session, Debug, "signaling", "setting CH{} AP power to {} dBm", channel, power);
        let value = format!("{:.2}", power);
        self.session.send(&Command::SetApPower.format(&[&channel, &value]))?;
        let command = Command::QueryApPower.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let actual: f64 = parse_response(&command, &response)?;
        if !validate::within_tolerance(power, actual, 0.0) {
            return Err(validate::mismatch(format!("CH{} AP power", channel), value, response))
        }
        Ok(())
    }

    pub fn set_broadcast_channel(&mut self, channel: u8, broadcast_channel: u16) -> Result<()> {
        let channel = validate::channel(channel)?;
        validate::in_range("broadcast channel", broadcast_channel,
                           BROADCAST_CHANNEL_MIN, BROADCAST_CHANNEL_MAX)?;
        emit!(self.session, Debug, "signaling", "configuring CH{} broadcast channel to {}",
              channel, broadcast_channel);
        self.session.send(&Command::SetBroadcastChannel.format(&[&channel, &broadcast_channel]))?;
        let command = Command::QueryBroadcastChannel.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let actual: f64 = parse_response(&command, &response)?;
        if actual != broadcast_channel as f64 {
            return Err(validate::mismatch(format!("CH{} broadcast channel", channel),
                                          broadcast_channel, response))
        }
        Ok(())
    }

    /// Configure security and the last digit of the `1234567x` passphrase.
    ///
    /// Only possible while the channel is off. The channel state is queried once first; if it is
    /// ON, `Error::PreconditionViolation` is returned and no configuration command is sent.
    pub fn set_security(&mut self, channel: u8, mode: SecurityMode, last_password_digit: u8)
            -> Result<()> {
        let channel = validate::channel(channel)?;
        validate::in_range("last password digit", last_password_digit, 0, 9)?;
        if self.is_rf_on(channel)? {
            emit!(self.session, Warn, "signaling",
                  "refusing to configure security while CH{} is on", channel);
            return Err(Error::PreconditionViolation(format!(
                "security of signaling channel {} can only be configured while it is OFF",
                channel)))
        }
        emit!(self.session, Debug, "signaling", "configuring CH{} security to {} with digit {}",
              channel, mode, last_password_digit);
        self.session.send(&Command::SetSecurity.format(&[&channel, &mode, &last_password_digit]))?;
        let command = Command::QuerySecurity.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let actual = response.split(',').map(unquote).collect::<Vec<_>>();
        let digit = last_password_digit.to_string();
        if actual != [mode.scpi_code(), digit.as_str()] {
            return Err(validate::mismatch(format!("CH{} security", channel),
                                          format!("{},{}", mode, digit), response))
        }
        Ok(())
    }

    pub fn set_ssid(&mut self, channel: u8, ssid: &str) -> Result<()> {
        let channel = validate::channel(channel)?;
        if ssid.is_empty() || ssid.len() > SSID_MAX_LEN || !ssid.is_ascii() || ssid.contains('"') {
            return Err(validate::invalid("SSID", format!(
                "{:?} must be 1 to {} printable ASCII characters", ssid, SSID_MAX_LEN)))
        }
        emit!(self.session, Debug, "signaling", "configuring CH{} SSID to {}", channel, ssid);
        self.session.send(&Command::SetSsid.format(&[&channel, &ssid]))?;
        self.verify_text(Command::QuerySsid.format(&[&channel]),
                         format!("CH{} SSID", channel), ssid)
    }

    pub fn set_operation_mode(&mut self, channel: u8, mode: OperationMode) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "signaling", "setting CH{} operation mode to {}", channel, mode);
        self.session.send(&Command::SetOperationMode.format(&[&channel, &mode]))?;
        self.verify_text(Command::QueryOperationMode.format(&[&channel]),
                         format!("CH{} operation mode", channel), mode.scpi_code())
    }

    /// Set the AP frequency in Hz.
    pub fn set_frequency(&mut self, channel: u8, frequency: f64) -> Result<()> {
        let channel = validate::channel(channel)?;
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(validate::invalid("frequency", format!("{} Hz is not positive", frequency)))
        }
        emit!(self.session, Debug, "signaling", "setting CH{} frequency to {} Hz",
              channel, frequency);
        self.session.send(&Command::SetFrequency.format(&[&channel, &frequency]))?;
        let command = Command::QueryFrequency.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let actual: f64 = parse_response(&command, &response)?;
        if actual != frequency {
            return Err(validate::mismatch(format!("CH{} frequency", channel), frequency, response))
        }
        Ok(())
    }

    pub fn approximate_rx_burst_power(&mut self, channel: u8) -> Result<f64> {
        let channel = validate::channel(channel)?;
        let command = Command::QueryApproximateRxBurstPower.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        parse_response(&command, &response)
    }

    /// Adjust the expected PEP power until the instrument's estimate of the received burst power
    /// matches `power`.
    pub fn set_approximate_rx_burst_power(&mut self, channel: u8, power: f64) -> Result<()> {
        let channel = validate::channel(channel)?;
        validate::in_range("burst power", power, PEP_POWER_MIN, PEP_POWER_MAX)?;
        self.set_pep_power(channel, power)?;
        let approximate = self.approximate_rx_burst_power(channel)?;
        let corrected = power + (power - approximate);
        emit!(self.session, Debug, "signaling",
              "CH{} burst power estimate is {} dBm, correcting PEP power to {} dBm",
              channel, approximate, corrected);
        validate::in_range("corrected PEP power", corrected, PEP_POWER_MIN, PEP_POWER_MAX)?;
        self.set_pep_power(channel, corrected)?;
        let actual = self.approximate_rx_burst_power(channel)?;
        if !validate::within_tolerance(power, actual, BURST_POWER_TOLERANCE) {
            return Err(validate::mismatch(format!("CH{} approximate rx burst power", channel),
                                          power, actual))
        }
        Ok(())
    }

    fn set_pep_power(&mut self, channel: u8, power: f64) -> Result<()> {
        emit!(self.session, Trace, "signaling", "setting CH{} PEP power to {} dBm", channel, power);
        self.session.send(&Command::SetPepPower.format(&[&channel, &power]))
    }

    /// Route, standard, attenuation, power and broadcast channel in one go.
    pub fn configure_scenario(&mut self, channel: u8, config: &ScenarioConfiguration)
            -> Result<()> {
        self.set_scenario(channel, config.connector, config.rx_converter,
                          config.connector, config.tx_converter)?;
        self.set_standard(channel, config.standard)?;
        self.set_ext_attenuation(channel, config.external_attenuation, Direction::Input)?;
        self.set_ext_attenuation(channel, config.external_attenuation, Direction::Output)?;
        self.set_ap_power(channel, config.ap_power)?;
        self.set_approximate_rx_burst_power(channel, config.approximate_burst_power)?;
        self.set_broadcast_channel(channel, config.broadcast_channel)
    }

    fn verify_text(&mut self, command: String, parameter: String, expected: &str) -> Result<()> {
        let response = self.session.send_receive(&command)?;
        if unquote(&response) != expected {
            return Err(validate::mismatch(parameter, expected, response))
        }
        Ok(())
    }
}

fn join_paths(paths: &[RfPath]) -> String {
    paths.iter().map(|path| path.scpi_code()).collect::<Vec<_>>().join(",")
}
