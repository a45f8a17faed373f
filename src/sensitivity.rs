//! Receive sensitivity search.
//!
//! The AP power is stepped down from `start_power` by `deviation` until either the client
//! disassociates or the measured PER reaches the threshold. The reported sensitivity is the
//! last power that still worked, one step above the power where the failure was observed.

use crate::{Error, Result};
use crate::association::AssociationMonitor;
use crate::config::SensitivityConfiguration;
use crate::diag::emit;
use crate::per::PerEngine;
use crate::session::CommandSession;
use crate::signaling::{Signaling, AP_POWER_MAX, AP_POWER_MIN};
use crate::validate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensitivityCause {
    /// The client dropped the association at the failing power.
    Disassociated,
    /// The PER measured at the failing power reached the threshold.
    PerThresholdExceeded { per: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepStep {
    pub power: f64,
    pub per: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sensitivity {
    /// Lowest AP power at which the client still received correctly, in dBm.
    pub power: f64,
    /// AP power at which the failure was observed, in dBm.
    pub failed_at: f64,
    pub cause: SensitivityCause,
    /// Every completed PER measurement, in sweep order.
    pub steps: Vec<SweepStep>,
}

pub struct SensitivitySearch<'s, S: CommandSession + ?Sized> {
    session: &'s mut S,
}

impl<'s, S: CommandSession + ?Sized> SensitivitySearch<'s, S> {
    pub fn new(session: &'s mut S) -> SensitivitySearch<'s, S> {
        SensitivitySearch { session }
    }

    fn signaling(&mut self) -> Signaling<'_, S> {
        Signaling::new(self.session)
    }

    fn association(&mut self) -> AssociationMonitor<'_, S> {
        AssociationMonitor::new(self.session)
    }

    fn per(&mut self) -> PerEngine<'_, S> {
        PerEngine::new(self.session)
    }

    /// Search with default step, packet count, threshold and timeouts; returns the sensitivity
    /// in dBm.
    pub fn find_sensitivity(&mut self, channel: u8, start_power: f64, stop_power: f64)
            -> Result<f64> {
        let config = SensitivityConfiguration::new(start_power, stop_power);
        Ok(self.find(channel, &config)?.power)
    }

    pub fn find(&mut self, channel: u8, config: &SensitivityConfiguration)
            -> Result<Sensitivity> {
        let channel = validate::channel(channel)?;
        validate::in_range("start power", config.start_power, AP_POWER_MIN, AP_POWER_MAX)?;
        validate::in_range("stop power", config.stop_power, AP_POWER_MIN, AP_POWER_MAX)?;
        if !(config.deviation.is_finite() && validate::hundredths(config.deviation) > 0.0) {
            return Err(validate::invalid("deviation",
                                         format!("{} dB is below the 0.01 dB power resolution",
                                                 config.deviation)))
        }
        validate::in_range("PER threshold", config.threshold, 0.0, 100.0)?;
        validate::in_range("packet count", config.packet_count, 1, u32::MAX)?;

        emit!(self.session, Info, "sensitivity",
              "searching CH{} from {} dBm to {} dBm in {} dB steps, {} packets, threshold {}%",
              channel, config.start_power, config.stop_power, config.deviation,
              config.packet_count, config.threshold);
        self.association().assert_associated(channel, config.domain, config.association_timeout)?;

        let began = self.session.now();
        let mut steps = Vec::new();
        let stop_power = validate::hundredths(config.stop_power);
        for index in 0u32.. {
            // computed rather than accumulated, and kept on the instrument's 0.01 dB grid
            let power = validate::hundredths(config.start_power - index as f64 * config.deviation);
            if power < stop_power { break }
            if self.session.now().duration_since(began) >= config.search_timeout {
                emit!(self.session, Error, "sensitivity",
                      "search on CH{} exceeded {:?} at {} dBm", channel, config.search_timeout, power);
                return Err(Error::SearchTimeout { channel, power, timeout: config.search_timeout })
            }

            // reported if this step fails
            let boundary = validate::hundredths(power + config.deviation);
            self.signaling().set_ap_power(channel, power)?;
            self.session.sleep(config.settle);

            if !self.association().is_associated(channel, config.domain,
                                                 config.association_timeout)? {
                emit!(self.session, Info, "sensitivity",
                      "client disassociated from CH{} at {} dBm, sensitivity is {} dBm",
                      channel, power, boundary);
                return Ok(Sensitivity {
                    power: boundary,
                    failed_at: power,
                    cause: SensitivityCause::Disassociated,
                    steps,
                })
            }

            let per = self.per().measure(channel, config.packet_count,
                                         config.transport_timeout, config.poll_interval)?;
            steps.push(SweepStep { power, per });
            if per >= config.threshold {
                emit!(self.session, Info, "sensitivity",
                      "PER on CH{} is {}% at {} dBm, sensitivity is {} dBm",
                      channel, per, power, boundary);
                return Ok(Sensitivity {
                    power: boundary,
                    failed_at: power,
                    cause: SensitivityCause::PerThresholdExceeded { per },
                    steps,
                })
            }
            emit!(self.session, Debug, "sensitivity",
                  "PER on CH{} is {}% at {} dBm, below {}%", channel, per, power, config.threshold);
        }

        emit!(self.session, Warn, "sensitivity",
              "PER on CH{} stayed below {}% down to {} dBm",
              channel, config.threshold, config.stop_power);
        Err(Error::SensitivityNotFound {
            start_power: config.start_power,
            stop_power: config.stop_power,
            threshold: config.threshold,
        })
    }
}
