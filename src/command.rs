//! The wire protocol. Every command the crate emits is one of these templates; `{}` placeholders
//! are substituted in order. The firmware matches the text literally.

use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Identify,
    Preset,

    SetScenario,
    QueryScenario,
    SetExtAttenuation,
    QueryExtAttenuation,
    SetChannelState,
    QueryChannelState,
    SetSecurity,
    QuerySecurity,
    SetSsid,
    QuerySsid,
    SetBroadcastChannel,
    QueryBroadcastChannel,
    SetStandard,
    QueryStandard,
    SetApPower,
    QueryApPower,
    SetFrequency,
    QueryFrequency,
    SetOperationMode,
    QueryOperationMode,
    SetPepPower,
    QueryApproximateRxBurstPower,

    QueryAssociation,
    QueryClientIpAddress,
    QueryClientMacAddress,
    QueryClientMaxPower,
    QueryEventLog,
    Disconnect,

    SetPerPackets,
    QueryPerPackets,
    StartPer,
    QueryPerStatus,
    FetchPer,
    AbortPer,
}

impl Command {
    pub fn template(self) -> &'static str {
        match self {
            Self::Identify                     => "*IDN?",
            Self::Preset                       => "SYST:PRES:ALL",

            Self::SetScenario                  => "ROUT:WLAN:SIGN{}:SCEN:SCEL {},{},{},{}",
            Self::QueryScenario                => "ROUT:WLAN:SIGN{}:SCEN:SCEL?",
            Self::SetExtAttenuation            => "CONF:WLAN:SIGN{}:RFS:EATT:{} {}",
            Self::QueryExtAttenuation          => "CONF:WLAN:SIGN{}:RFS:EATT:{}?",
            Self::SetChannelState              => "SOUR:WLAN:SIGN{}:STAT {}",
            Self::QueryChannelState            => "SOUR:WLAN:SIGN{}:STAT?",
            Self::SetSecurity                  => "CONF:WLAN:SIGN{}:CONN:SEC:TYPE {}, \"{}\"",
            Self::QuerySecurity                => "CONF:WLAN:SIGN{}:CONN:SEC:TYPE?",
            Self::SetSsid                      => "CONF:WLAN:SIGN{}:CONN:SSID {}",
            Self::QuerySsid                    => "CONF:WLAN:SIGN{}:CONN:SSID?",
            Self::SetBroadcastChannel          => "CONF:WLAN:SIGN{}:RFS:CHAN {}",
            Self::QueryBroadcastChannel        => "CONF:WLAN:SIGN{}:RFS:CHAN?",
            Self::SetStandard                  => "CONF:WLAN:SIGN{}:CONN:STAN {}",
            Self::QueryStandard                => "CONF:WLAN:SIGN{}:CONN:STAN?",
            Self::SetApPower                   => "CONF:WLAN:SIGN{}:RFS:BOP {}",
            Self::QueryApPower                 => "CONF:WLAN:SIGN{}:RFS:BOP?",
            Self::SetFrequency                 => "CONF:WLAN:SIGN{}:RFS:FREQ {}",
            Self::QueryFrequency               => "CONF:WLAN:SIGN{}:RFS:FREQ?",
            Self::SetOperationMode             => "CONF:WLAN:SIGN{}:CONN:OMOD {}",
            Self::QueryOperationMode           => "CONF:WLAN:SIGN{}:CONN:OMOD?",
            Self::SetPepPower                  => "CONF:WLAN:SIGN{}:RFS:EPEP {}",
            Self::QueryApproximateRxBurstPower => "SENS:WLAN:SIGN{}:UES:ARXB?",

            Self::QueryAssociation             => "FETC:WLAN:SIGN{}:{}W:STAT?",
            Self::QueryClientIpAddress         => "SENS:WLAN:SIGN{}:UES:UEAD:{}?",
            Self::QueryClientMacAddress        => "SENS:WLAN:SIGN{}:UEC:MAC:ADDR?",
            Self::QueryClientMaxPower          => "SENS:WLAN:SIGN{}:UES:RXBP?",
            Self::QueryEventLog                => "SENS:WLAN:SIGN{}:ELOG:ALL?",
            Self::Disconnect                   => "CALL:WLAN:SIGN{}:ACT:DISC",

            Self::SetPerPackets                => "CONF:WLAN:SIGN{}:PER:PACK {}",
            Self::QueryPerPackets              => "CONF:WLAN:SIGN{}:PER:PACK?",
            Self::StartPer                     => "INIT:WLAN:SIGN{}:PER",
            Self::QueryPerStatus               => "FETC:WLAN:SIGN{}:PER:STAT:ALL?",
            Self::FetchPer                     => "FETC:WLAN:SIGN{}:PER?",
            Self::AbortPer                     => "ABORT:WLAN:SIGN{}:PER",
        }
    }

    pub fn arity(self) -> usize {
        self.template().matches("{}").count()
    }

    pub fn format(self, args: &[&dyn fmt::Display]) -> String {
        debug_assert_eq!(args.len(), self.arity(), "wrong argument count for {:?}", self);
        let mut output = String::new();
        let mut args = args.iter();
        let mut pieces = self.template().split("{}").peekable();
        while let Some(piece) = pieces.next() {
            output.push_str(piece);
            if pieces.peek().is_some() {
                if let Some(arg) = args.next() {
                    // writing into a `String` cannot fail
                    let _ = write!(output, "{}", arg);
                }
            }
        }
        output
    }
}
