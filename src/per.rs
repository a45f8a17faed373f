//! Packet error rate measurement.
//!
//! A run goes `IDLE -> RUNNING -> FINISHED` (or reports a setup error instead of finishing).
//! Fetching the result of a finished run always aborts it, which returns the channel to `IDLE`
//! and makes the next run possible.

use std::time::Duration;

use crate::{Error, Result};
use crate::command::Command;
use crate::diag::emit;
use crate::params::PerStatus;
use crate::session::CommandSession;
use crate::signaling::parse_response;
use crate::validate;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub struct PerEngine<'s, S: CommandSession + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: CommandSession + ?Sized> PerEngine<'s, S> {
    pub fn new(session: &'s mut S) -> PerEngine<'s, S> {
        PerEngine { session }
    }

    pub fn configure_packet_count(&mut self, channel: u8, packets: u32) -> Result<()> {
        let channel = validate::channel(channel)?;
        validate::in_range("packet count", packets, 1, u32::MAX)?;
        emit!(self.session, Debug, "per", "configuring {} packets on CH{}", packets, channel);
        self.session.send(&Command::SetPerPackets.format(&[&channel, &packets]))?;
        let command = Command::QueryPerPackets.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        let actual: f64 = parse_response(&command, &response)?;
        if actual != packets as f64 {
            return Err(validate::mismatch(format!("CH{} PER packet count", channel),
                                          packets, response))
        }
        Ok(())
    }

    pub fn start(&mut self, channel: u8) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "per", "starting PER on CH{}", channel);
        self.session.send(&Command::StartPer.format(&[&channel]))
    }

    /// Query the run status once. A response outside the documented grammar is an
    /// `Error::Protocol`; a setup error is returned as `PerStatus::SetupError`.
    pub fn status(&mut self, channel: u8) -> Result<PerStatus> {
        let channel = validate::channel(channel)?;
        let command = Command::QueryPerStatus.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        match PerStatus::classify(&response) {
            Some(status) => {
                emit!(self.session, Trace, "per", "CH{} PER status is {:?}", channel, status);
                Ok(status)
            }
            None => {
                emit!(self.session, Error, "per", "{:?} is not a valid PER status", response);
                Err(Error::Protocol { command, response })
            }
        }
    }

    /// Whether the run has finished. A setup error is reported as `Error::Protocol`.
    pub fn is_finished(&mut self, channel: u8) -> Result<bool> {
        match self.status(channel)? {
            PerStatus::Running => Ok(false),
            PerStatus::Finished => Ok(true),
            PerStatus::SetupError => Err(Error::Protocol {
                command: Command::QueryPerStatus.format(&[&channel]),
                response: PerStatus::SETUP_ERROR.to_owned(),
            }),
        }
    }

    pub fn poll_until_finished(&mut self, channel: u8, timeout: Duration, poll_interval: Duration)
            -> Result<()> {
        let channel = validate::channel(channel)?;
        let start = self.session.now();
        while self.session.now().duration_since(start) < timeout {
            if self.is_finished(channel)? {
                emit!(self.session, Debug, "per", "PER on CH{} finished", channel);
                return Ok(())
            }
            emit!(self.session, Trace, "per", "PER on CH{} still collecting", channel);
            self.session.sleep(poll_interval);
        }
        emit!(self.session, Error, "per", "PER on CH{} did not finish within {:?}", channel, timeout);
        Err(Error::MeasurementTimeout { channel, timeout })
    }

    /// Fetch the measured PER in percent, then abort the run so that another one can be started.
    /// Anything but a number in `[0, 100]` is an `Error::Protocol`.
    pub fn fetch_per(&mut self, channel: u8) -> Result<f64> {
        let channel = validate::channel(channel)?;
        let command = Command::FetchPer.format(&[&channel]);
        let response = self.session.send_receive(&command)?;
        self.abort(channel)?;
        // <reliability>,<PER>,...
        let per = response.split(',').nth(1)
            .and_then(|field| field.trim().parse::<f64>().ok())
            .filter(|per| (0.0..=100.0).contains(per));
        let per = match per {
            Some(per) => per,
            None => return Err(Error::Protocol { command, response }),
        };
        emit!(self.session, Debug, "per", "CH{} PER is {}%", channel, per);
        Ok(per)
    }

    pub fn abort(&mut self, channel: u8) -> Result<()> {
        let channel = validate::channel(channel)?;
        emit!(self.session, Debug, "per", "aborting PER on CH{}", channel);
        self.session.send(&Command::AbortPer.format(&[&channel]))
    }

    /// Configure, start, wait for and fetch one run. If the run does not finish, it is aborted
    /// before the error is returned.
    pub fn measure(&mut self, channel: u8, packets: u32, timeout: Duration,
                   poll_interval: Duration) -> Result<f64> {
        self.configure_packet_count(channel, packets)?;
        self.start(channel)?;
        if let Err(error) = self.poll_until_finished(channel, timeout, poll_interval) {
            if let Err(abort_error) = self.abort(channel) {
                emit!(self.session, Warn, "per", "aborting PER on CH{} failed: {}",
                      channel, abort_error);
            }
            return Err(error)
        }
        self.fetch_per(channel)
    }
}
