//! Whether a client is associated to a signaling channel, and what the instrument knows about it.

use std::time::Duration;

use crate::{Error, Result};
use crate::command::Command;
use crate::diag::emit;
use crate::params::{Domain, IpType, CLIENT_ASSOCIATED};
use crate::session::CommandSession;
use crate::signaling::{parse_response, unquote};
use crate::validate;

pub const POLL_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationStatus {
    Associated,
    /// The client did not associate before the timeout elapsed.
    NotAssociated { last_response: Option<String> },
}

impl AssociationStatus {
    pub fn is_associated(&self) -> bool {
        matches!(self, Self::Associated)
    }
}

pub struct AssociationMonitor<'s, S: CommandSession + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: CommandSession + ?Sized> AssociationMonitor<'s, S> {
    pub fn new(session: &'s mut S) -> AssociationMonitor<'s, S> {
        AssociationMonitor { session }
    }

    /// Poll until the client is associated or `timeout` elapses. Running out of time is
    /// an ordinary outcome here, not an error.
    pub fn poll(&mut self, channel: u8, domain: Domain, timeout: Duration)
            -> Result<AssociationStatus> {
        match self.assert_associated(channel, domain, timeout) {
            Ok(()) => Ok(AssociationStatus::Associated),
            Err(Error::StateTimeout { last_response, .. }) => {
                emit!(self.session, Info, "association",
                      "client is not associated to CH{} in the {} domain", channel, domain);
                Ok(AssociationStatus::NotAssociated { last_response })
            }
            Err(error) => Err(error),
        }
    }

    pub fn is_associated(&mut self, channel: u8, domain: Domain, timeout: Duration)
            -> Result<bool> {
        Ok(self.poll(channel, domain, timeout)?.is_associated())
    }

    /// Like `poll`, but a client that does not associate in time is an `Error::StateTimeout`.
    pub fn assert_associated(&mut self, channel: u8, domain: Domain, timeout: Duration)
            -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "association",
              "checking if client is associated to CH{} in the {} domain", channel, domain);
        self.session.wait_for_state(CLIENT_ASSOCIATED,
                                    &Command::QueryAssociation.format(&[&channel, &domain]),
                                    POLL_DELAY, timeout)?;
        emit!(self.session, Info, "association", "client is associated to CH{}", channel);
        Ok(())
    }

    fn require_client(&mut self, channel: u8) -> Result<u8> {
        let channel = validate::channel(channel)?;
        if self.is_associated(channel, Domain::PacketSwitched, DEFAULT_TIMEOUT)? {
            Ok(channel)
        } else {
            Err(Error::NotAssociated { channel })
        }
    }

    pub fn client_mac_address(&mut self, channel: u8) -> Result<String> {
        let channel = self.require_client(channel)?;
        let response = self.session.send_receive(
            &Command::QueryClientMacAddress.format(&[&channel]))?;
        Ok(unquote(&response).to_owned())
    }

    pub fn client_ip_address(&mut self, channel: u8, ip_type: IpType) -> Result<String> {
        let channel = self.require_client(channel)?;
        let response = self.session.send_receive(
            &Command::QueryClientIpAddress.format(&[&channel, &ip_type]))?;
        Ok(unquote(&response).to_owned())
    }

    pub fn client_ipv4_address(&mut self, channel: u8) -> Result<String> {
        self.client_ip_address(channel, IpType::V4)
    }

    pub fn client_ipv6_address(&mut self, channel: u8) -> Result<String> {
        self.client_ip_address(channel, IpType::V6)
    }

    /// Maximum power the associated client reports, in dBm.
    pub fn client_max_power(&mut self, channel: u8) -> Result<f64> {
        let channel = self.require_client(channel)?;
        let command = Command::QueryClientMaxPower.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let power: f64 = parse_response(&command, &response)?;
        emit!(self.session, Debug, "association", "CH{} client power is {} dBm", channel, power);
        Ok(power)
    }

    /// Drop the client and verify that it does not come back within the association timeout.
    pub fn disconnect(&mut self, channel: u8) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "association", "disconnecting client from CH{}", channel);
        self.session.send(&Command::Disconnect.format(&[&channel]))?;
        if self.is_associated(channel, Domain::PacketSwitched, DEFAULT_TIMEOUT)? {
            emit!(self.session, Warn, "association",
                  "client is still associated to CH{}", channel);
            return Err(validate::mismatch(format!("CH{} association", channel),
                                          "disconnected", CLIENT_ASSOCIATED))
        }
        Ok(())
    }

    /// Signaling event log entries, with empty slots dropped.
    pub fn event_log(&mut self, channel: u8) -> Result<Vec<String>> {
        let channel = validate::channel(channel)?;
        let response = self.session.send_receive(&Command::QueryEventLog.format(&[&channel]))?;
        Ok(response.split(',')
            .map(unquote)
            .filter(|entry| !entry.is_empty() && *entry != "EMPT")
            .map(str::to_owned)
            .collect())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::MockSession;

    #[test]
    fn test_associated_after_polling() {
        let mut session = MockSession::new()
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "SCAN")
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "AUTH")
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "ASS");
        let status = AssociationMonitor::new(&mut session)
            .poll(1, Domain::PacketSwitched, DEFAULT_TIMEOUT)
            .unwrap();
        assert_eq!(status, AssociationStatus::Associated);
        session.done();
    }

    #[test]
    fn test_not_associated_is_not_an_error() {
        let mut session = MockSession::new();
        for _ in 0..3 {
            session = session.query("FETC:WLAN:SIGN2:CSW:STAT?", "IDLE");
        }
        let associated = AssociationMonitor::new(&mut session)
            .is_associated(2, Domain::CircuitSwitched, Duration::from_millis(300))
            .unwrap();
        assert!(!associated);
        session.done();
    }

    #[test]
    fn test_assert_associated_propagates_timeout() {
        let mut session = MockSession::new();
        for _ in 0..2 {
            session = session.query("FETC:WLAN:SIGN1:PSW:STAT?", "IDLE");
        }
        let result = AssociationMonitor::new(&mut session)
            .assert_associated(1, Domain::PacketSwitched, Duration::from_millis(200));
        assert!(matches!(result, Err(Error::StateTimeout { .. })));
        session.done();
    }

    #[test]
    fn test_invalid_channel() {
        let mut session = MockSession::new();
        let mut monitor = AssociationMonitor::new(&mut session);
        assert!(matches!(monitor.poll(0, Domain::PacketSwitched, DEFAULT_TIMEOUT),
                         Err(Error::Validation { .. })));
        assert!(matches!(monitor.event_log(7), Err(Error::Validation { .. })));
        assert!(matches!(monitor.disconnect(5), Err(Error::Validation { .. })));
        assert!(session.sent().is_empty());
    }

    #[test]
    fn test_client_queries() {
        let mut session = MockSession::new()
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "ASS")
            .query("SENS:WLAN:SIGN1:UEC:MAC:ADDR?", "\"00:11:22:33:44:55\"")
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "ASS")
            .query("SENS:WLAN:SIGN1:UES:UEAD:IPV4?", "\"192.168.1.2\"")
            .query("FETC:WLAN:SIGN1:PSW:STAT?", "ASS")
            .query("SENS:WLAN:SIGN1:UES:RXBP?", "-42.5");
        let mut monitor = AssociationMonitor::new(&mut session);
        assert_eq!(monitor.client_mac_address(1).unwrap(), "00:11:22:33:44:55");
        assert_eq!(monitor.client_ipv4_address(1).unwrap(), "192.168.1.2");
        assert_eq!(monitor.client_max_power(1).unwrap(), -42.5);
        session.done();
    }

    #[test]
    fn test_client_query_without_client() {
        let mut session = MockSession::new();
        for _ in 0..200 {
            session = session.query("FETC:WLAN:SIGN1:PSW:STAT?", "IDLE");
        }
        let result = AssociationMonitor::new(&mut session).client_mac_address(1);
        assert!(matches!(result, Err(Error::NotAssociated { channel: 1 })));
        session.done();
    }

    #[test]
    fn test_event_log() {
        let mut session = MockSession::new()
            .query("SENS:WLAN:SIGN1:ELOG:ALL?",
                   "\"Client associated\",\"DHCP done\",EMPT,\"\",EMPT");
        let log = AssociationMonitor::new(&mut session).event_log(1).unwrap();
        assert_eq!(log, ["Client associated", "DHCP done"]);
        session.done();
    }
}
