use std::time::{Duration, Instant};

use crate::{Error, Result};
use crate::command::Command;
use crate::config::SessionOptions;
use crate::diag::{emit, Diagnostics, Event, LogDiagnostics};
use crate::sys::Transport;

/// Source of time for every wait the crate performs.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// The capability the measurement modules are written against: a single serialized
/// command/response exchange with one instrument, plus a clock and a diagnostic sink.
pub trait CommandSession {
    fn send(&mut self, command: &str) -> Result<()>;

    /// Sends a query and returns the response with trailing whitespace removed.
    fn send_receive(&mut self, command: &str) -> Result<String>;

    fn clock(&mut self) -> &mut dyn Clock;

    fn emit(&mut self, event: Event);

    fn now(&mut self) -> Instant {
        self.clock().now()
    }

    fn sleep(&mut self, duration: Duration) {
        self.clock().sleep(duration)
    }

    /// Poll `query` every `delay` until its response equals `target`.
    ///
    /// Fails with `Error::StateTimeout`, carrying the last response seen, once `timeout` has
    /// elapsed without a match. A zero `timeout` fails without sending anything.
    fn wait_for_state(&mut self, target: &str, query: &str, delay: Duration, timeout: Duration)
            -> Result<()> {
        let start = self.now();
        let mut last_response = None;
        while self.now().duration_since(start) < timeout {
            let response = self.send_receive(query)?;
            if response == target {
                emit!(self, Debug, "session", "{} reached {:?}", query, target);
                return Ok(())
            }
            last_response = Some(response);
            self.sleep(delay);
        }
        emit!(self, Warn, "session", "{} did not reach {:?} within {:?} (last response {:?})",
              query, target, timeout, last_response);
        Err(Error::StateTimeout { target: target.to_owned(), last_response, timeout })
    }
}

impl<S: CommandSession + ?Sized> CommandSession for &mut S {
    fn send(&mut self, command: &str) -> Result<()> {
        (**self).send(command)
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        (**self).send_receive(command)
    }

    fn clock(&mut self) -> &mut dyn Clock {
        (**self).clock()
    }

    fn emit(&mut self, event: Event) {
        (**self).emit(event)
    }
}

/// A `Transport` bound to an instrument whose identity has been verified.
pub struct Session<T: Transport> {
    transport: T,
    options: SessionOptions,
    identity: String,
    clock: Box<dyn Clock>,
    diagnostics: Box<dyn Diagnostics>,
}

impl<T: Transport> Session<T> {
    pub fn open(transport: T, options: SessionOptions) -> Result<Session<T>> {
        let diagnostics = Box::new(LogDiagnostics::new(&options.port_name));
        Self::with_parts(transport, options, diagnostics, Box::new(SystemClock))
    }

    pub fn with_parts(transport: T, options: SessionOptions, diagnostics: Box<dyn Diagnostics>,
                      clock: Box<dyn Clock>) -> Result<Session<T>> {
        let mut session = Session { transport, options, identity: String::new(), clock, diagnostics };
        session.check_identity()?;
        Ok(session)
    }

    fn check_identity(&mut self) -> Result<()> {
        emit!(self, Debug, "session", "checking identity");
        let response = self.send_receive(Command::Identify.template())?;
        if response.contains(&self.options.identity) {
            emit!(self, Info, "session", "found {}", response);
            self.identity = response;
            Ok(())
        } else {
            emit!(self, Error, "session", "{:?} not found, got {:?}", self.options.identity, response);
            Err(Error::IdentityMismatch { expected: self.options.identity.clone(), actual: response })
        }
    }

    /// The `*IDN?` response seen when the session was opened.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Return the instrument to its default state. This discards every signaling channel
    /// configuration.
    pub fn preset(&mut self) -> Result<()> {
        emit!(self, Info, "session", "reset all");
        self.send(Command::Preset.template())
    }

    pub fn close(&mut self) -> Result<()> {
        self.transport.close()?;
        emit!(self, Info, "session", "closed");
        Ok(())
    }
}

impl<T: Transport> CommandSession for Session<T> {
    fn send(&mut self, command: &str) -> Result<()> {
        emit!(self, Trace, "session", "send({:?})", command);
        self.transport.send(command)
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        let mut response = self.transport.send_receive(command)?;
        response.truncate(response.trim_end().len());
        emit!(self, Trace, "session", "send_receive({:?}) = {:?}", command, response);
        Ok(response)
    }

    fn clock(&mut self) -> &mut dyn Clock {
        self.clock.as_mut()
    }

    fn emit(&mut self, event: Event) {
        self.diagnostics.emit(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mock::{MockSession, MockTransport};
    use crate::diag::NullDiagnostics;

    const IDN: &str = "Rohde&Schwarz,CMW,1201.0002k50/123456,3.7.20\n";

    fn open(transport: MockTransport) -> Result<Session<MockTransport>> {
        Session::with_parts(transport, SessionOptions::new("GPIB::18::INSTR"),
                            Box::new(NullDiagnostics), Box::new(SystemClock))
    }

    #[test]
    fn test_identity_accepted() {
        let transport = MockTransport::new()
            .query("*IDN?", IDN);
        let session = open(transport).unwrap();
        assert_eq!(session.identity(), IDN.trim_end());
        session.transport().done();
    }

    #[test]
    fn test_identity_mismatch() {
        let transport = MockTransport::new()
            .query("*IDN?", "Keysight Technologies,E5515C,GB1234,A.01\n");
        match open(transport) {
            Err(Error::IdentityMismatch { expected, actual }) => {
                assert_eq!(expected, "Rohde&Schwarz,CMW");
                assert!(actual.starts_with("Keysight"));
            }
            _ => panic!("identity mismatch not detected"),
        }
    }

    #[test]
    fn test_preset_and_trim() {
        let transport = MockTransport::new()
            .query("*IDN?", IDN)
            .command("SYST:PRES:ALL")
            .query("SOUR:WLAN:SIGN1:STAT?", "OFF \r\n");
        let mut session = open(transport).unwrap();
        session.preset().unwrap();
        assert_eq!(session.send_receive("SOUR:WLAN:SIGN1:STAT?").unwrap(), "OFF");
        session.close().unwrap();
        assert!(session.transport().closed);
        session.transport().done();
    }

    #[test]
    fn test_wait_for_state_first_match() {
        let mut session = MockSession::new()
            .query("SOUR:WLAN:SIGN1:STAT?", "OFF")
            .query("SOUR:WLAN:SIGN1:STAT?", "PEND")
            .query("SOUR:WLAN:SIGN1:STAT?", "ON");
        session.wait_for_state("ON", "SOUR:WLAN:SIGN1:STAT?",
                               Duration::from_millis(100), Duration::from_secs(30)).unwrap();
        assert_eq!(session.elapsed(), Duration::from_millis(200));
        session.done();
    }

    #[test]
    fn test_wait_for_state_timeout() {
        let mut session = MockSession::new();
        for _ in 0..10 {
            session = session.query("FETC:WLAN:SIGN1:PSW:STAT?", "IDLE");
        }
        let result = session.wait_for_state("ASS", "FETC:WLAN:SIGN1:PSW:STAT?",
                                            Duration::from_millis(100), Duration::from_secs(1));
        match result {
            Err(Error::StateTimeout { target, last_response, .. }) => {
                assert_eq!(target, "ASS");
                assert_eq!(last_response.as_deref(), Some("IDLE"));
            }
            _ => panic!("expected a state timeout"),
        }
        // ceil(1 s / 100 ms) queries, and not one more
        assert_eq!(session.sent().len(), 10);
        session.done();
    }

    #[test]
    fn test_wait_for_state_query_bound_with_latency() {
        let mut session = MockSession::new().with_latency(Duration::from_millis(50));
        for _ in 0..7 {
            session = session.query("SOUR:WLAN:SIGN2:STAT?", "OFF");
        }
        let result = session.wait_for_state("ON", "SOUR:WLAN:SIGN2:STAT?",
                                            Duration::from_millis(100), Duration::from_secs(1));
        assert!(matches!(result, Err(Error::StateTimeout { .. })));
        assert!(session.sent().len() <= 10);
        session.done();
    }

    #[test]
    fn test_wait_for_state_zero_timeout() {
        let mut session = MockSession::new();
        let result = session.wait_for_state("ON", "SOUR:WLAN:SIGN1:STAT?",
                                            Duration::from_millis(100), Duration::ZERO);
        assert!(matches!(result, Err(Error::StateTimeout { last_response: None, .. })));
        assert!(session.sent().is_empty());
    }
}
