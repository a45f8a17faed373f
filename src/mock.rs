//! Scripted stand-ins for an instrument, used by the unit tests.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::Result;
use crate::diag::Event;
use crate::session::{Clock, CommandSession};
use crate::sys::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Exchange {
    Command(String),
    Query(String, String),
}

#[derive(Debug, Default)]
struct Script {
    exchanges: VecDeque<Exchange>,
    sent: Vec<String>,
}

impl Script {
    fn push(&mut self, exchange: Exchange) {
        self.exchanges.push_back(exchange)
    }

    fn send(&mut self, command: &str) {
        self.sent.push(command.to_owned());
        match self.exchanges.pop_front() {
            Some(Exchange::Command(expected)) =>
                assert_eq!(command, expected, "unexpected command"),
            Some(Exchange::Query(expected, _)) =>
                panic!("expected query {:?}, got command {:?}", expected, command),
            None =>
                panic!("unexpected command {:?} after end of script", command),
        }
    }

    fn send_receive(&mut self, command: &str) -> String {
        self.sent.push(command.to_owned());
        match self.exchanges.pop_front() {
            Some(Exchange::Query(expected, response)) => {
                assert_eq!(command, expected, "unexpected query");
                response
            }
            Some(Exchange::Command(expected)) =>
                panic!("expected command {:?}, got query {:?}", expected, command),
            None =>
                panic!("unexpected query {:?} after end of script", command),
        }
    }

    fn done(&self) {
        assert!(self.exchanges.is_empty(), "script not exhausted: {:?}", self.exchanges);
    }
}

#[derive(Debug, Default)]
pub struct MockTransport {
    script: Script,
    pub closed: bool,
}

impl MockTransport {
    pub fn new() -> MockTransport {
        Default::default()
    }

    pub fn command(mut self, command: &str) -> Self {
        self.script.push(Exchange::Command(command.to_owned()));
        self
    }

    pub fn query(mut self, command: &str, response: &str) -> Self {
        self.script.push(Exchange::Query(command.to_owned(), response.to_owned()));
        self
    }

    pub fn done(&self) {
        self.script.done()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, command: &str) -> Result<()> {
        self.script.send(command);
        Ok(())
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        Ok(self.script.send_receive(command))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Time that only passes when the code under test sleeps or talks to the instrument.
#[derive(Debug)]
pub struct SimulatedClock {
    origin: Instant,
    elapsed: Duration,
}

impl SimulatedClock {
    pub fn new() -> SimulatedClock {
        SimulatedClock { origin: Instant::now(), elapsed: Duration::ZERO }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed
    }

    fn sleep(&mut self, duration: Duration) {
        self.elapsed += duration
    }
}

/// A `CommandSession` answering from a script, with simulated time.
#[derive(Debug)]
pub struct MockSession {
    script: Script,
    clock: SimulatedClock,
    latency: Duration,
    pub events: Vec<Event>,
}

impl MockSession {
    pub fn new() -> MockSession {
        MockSession {
            script: Script::default(),
            clock: SimulatedClock::new(),
            latency: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Time every query takes to be answered.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn command(mut self, command: &str) -> Self {
        self.script.push(Exchange::Command(command.to_owned()));
        self
    }

    pub fn query(mut self, command: &str, response: &str) -> Self {
        self.script.push(Exchange::Query(command.to_owned(), response.to_owned()));
        self
    }

    pub fn sent(&self) -> &[String] {
        &self.script.sent
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed
    }

    pub fn done(&self) {
        self.script.done()
    }
}

impl CommandSession for MockSession {
    fn send(&mut self, command: &str) -> Result<()> {
        self.script.send(command);
        Ok(())
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        let response = self.script.send_receive(command);
        self.clock.sleep(self.latency);
        Ok(response.trim_end().to_owned())
    }

    fn clock(&mut self) -> &mut dyn Clock {
        &mut self.clock
    }

    fn emit(&mut self, event: Event) {
        self.events.push(event)
    }
}
