pub mod sys;
mod command;
pub mod params;
pub mod config;
pub mod diag;
mod validate;
pub mod session;
pub mod signaling;
pub mod association;
pub mod per;
pub mod sensitivity;
mod device;

#[cfg(test)]
mod mock;

use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    IdentityMismatch { expected: String, actual: String },
    Validation { parameter: String, reason: String },
    ConfigurationMismatch { parameter: String, expected: String, actual: String },
    PreconditionViolation(String),
    StateTimeout { target: String, last_response: Option<String>, timeout: Duration },
    Protocol { command: String, response: String },
    MeasurementTimeout { channel: u8, timeout: Duration },
    SensitivityNotFound { start_power: f64, stop_power: f64, threshold: f64 },
    SearchTimeout { channel: u8, power: f64, timeout: Duration },
    NotAssociated { channel: u8 },
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        matches!(self,
            Self::StateTimeout { .. } | Self::MeasurementTimeout { .. } | Self::SearchTimeout { .. })
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Io(io_error) =>
                write!(f, "transport I/O error: {}", io_error),
            Self::IdentityMismatch { expected, actual } =>
                write!(f, "instrument identity {:?} does not contain {:?}", actual, expected),
            Self::Validation { parameter, reason } =>
                write!(f, "invalid {}: {}", parameter, reason),
            Self::ConfigurationMismatch { parameter, expected, actual } =>
                write!(f, "{} read back as {:?}, expected {:?}", parameter, actual, expected),
            Self::PreconditionViolation(reason) =>
                write!(f, "precondition violated: {}", reason),
            Self::StateTimeout { target, last_response: Some(last), timeout } =>
                write!(f, "state {:?} not reached within {:?} (last response {:?})",
                       target, timeout, last),
            Self::StateTimeout { target, last_response: None, timeout } =>
                write!(f, "state {:?} not reached within {:?} (no response)", target, timeout),
            Self::Protocol { command, response } =>
                write!(f, "unrecognized response {:?} to {:?}", response, command),
            Self::MeasurementTimeout { channel, timeout } =>
                write!(f, "PER measurement on signaling channel {} did not finish within {:?}",
                       channel, timeout),
            Self::SensitivityNotFound { start_power, stop_power, threshold } =>
                write!(f, "PER stayed below {}% from {} dBm down to {} dBm",
                       threshold, start_power, stop_power),
            Self::SearchTimeout { channel, power, timeout } =>
                write!(f, "sensitivity search on signaling channel {} exceeded {:?} at {} dBm",
                       channel, timeout, power),
            Self::NotAssociated { channel } =>
                write!(f, "no client associated to signaling channel {}", channel),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            _ => None
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(error) => error,
            Err(error) => Error::Io(error),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(io_error) =>
                io_error,
            Error::StateTimeout { .. } | Error::MeasurementTimeout { .. } |
            Error::SearchTimeout { .. } =>
                Self::new(std::io::ErrorKind::TimedOut, error),
            Error::Validation { .. } =>
                Self::new(std::io::ErrorKind::InvalidInput, error),
            _ =>
                Self::new(std::io::ErrorKind::Other, error),
        }
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use params::{
    ChannelState,
    RfPath,
    Direction,
    Standard,
    SecurityMode,
    OperationMode,
    Domain,
    IpType,
    PerStatus,
};

pub use config::{
    SessionOptions,
    ScenarioConfiguration,
    SensitivityConfiguration,
};

pub use session::{
    Clock,
    SystemClock,
    CommandSession,
    Session,
};

pub use diag::{
    Event,
    Diagnostics,
    LogDiagnostics,
    NullDiagnostics,
};

pub use sys::Transport;

pub use signaling::Signaling;
pub use association::{AssociationMonitor, AssociationStatus};
pub use per::PerEngine;
pub use sensitivity::{Sensitivity, SensitivityCause, SensitivitySearch, SweepStep};

pub use device::Cmw500;
