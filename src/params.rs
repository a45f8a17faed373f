//! Enumerated instrument domains and the codes the firmware uses for them on the wire.

use std::fmt;

macro_rules! wire_enum {
    {
        $( #[$attr:meta] )*
        pub enum $name:ident {
            $( $( #[$variant_attr:meta] )* $variant:ident = $code:literal, )+
        }
        $( $rest:tt )*
    } => {
        $( #[$attr] )*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $( #[$variant_attr] )* $variant, )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            pub fn scpi_code(self) -> &'static str {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            pub fn from_scpi_code(code: &str) -> Option<Self> {
                match code {
                    $( $code => Some(Self::$variant), )+
                    _ => None
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.scpi_code())
            }
        }

        wire_enum! { $( $rest )* }
    };
    {} => {}
}

wire_enum! {
    #[derive(Default)]
    pub enum ChannelState {
        On = "ON",
        #[default]
        Off = "OFF",
    }

    /// Physical path codes usable in a standard cell routing scenario.
    pub enum RfPath {
        Rf1Com = "RF1C",
        Rf2Com = "RF2C",
        Rf3Com = "RF3C",
        Rf4Com = "RF4C",
        Rf1Out = "RF1O",
        Rf3Out = "RF3O",
        Rx1 = "RX1",
        Rx2 = "RX2",
        Rx3 = "RX3",
        Rx4 = "RX4",
        Tx1 = "TX1",
        Tx2 = "TX2",
        Tx3 = "TX3",
        Tx4 = "TX4",
    }

    /// Direction of external attenuation compensation.
    pub enum Direction {
        Output = "OUTP",
        Input = "INP",
    }

    #[derive(Default)]
    pub enum Standard {
        /// 802.11a
        A = "ASTD",
        /// 802.11b
        B = "BSTD",
        /// 802.11g
        G = "GSTD",
        /// 802.11g (OFDM only)
        GOfdm = "GOST",
        /// 802.11n greenfield
        NGreenfield = "NGFS",
        /// 802.11a/n
        AN = "ANST",
        /// 802.11g/n
        GN = "GNST",
        /// 802.11g (OFDM)/n
        GOfdmN = "GONS",
        /// 802.11ac
        #[default]
        AC = "ACST",
    }

    #[derive(Default)]
    pub enum SecurityMode {
        #[default]
        Disabled = "DIS",
        WpaPersonal = "WPER",
        WpaEnterprise = "WENT",
        Wpa2Personal = "W2P",
        Wpa2Enterprise = "W2EN",
    }

    #[derive(Default)]
    pub enum OperationMode {
        #[default]
        AccessPoint = "AP",
        Station = "STAT",
    }

    /// Connection domain a client association is reported in.
    #[derive(Default)]
    pub enum Domain {
        CircuitSwitched = "CS",
        #[default]
        PacketSwitched = "PS",
    }

    pub enum IpType {
        V4 = "IPV4",
        V6 = "IPV6",
    }
}

impl RfPath {
    pub fn is_connector(self) -> bool {
        matches!(self, Self::Rf1Com | Self::Rf2Com | Self::Rf3Com | Self::Rf4Com |
                       Self::Rf1Out | Self::Rf3Out)
    }
}

/// Status of a PER run, as reported by `FETC:WLAN:SIGN<n>:PER:STAT:ALL?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerStatus {
    Running,
    Finished,
    SetupError,
}

impl PerStatus {
    pub const RUNNING: &'static str = "RUN,ADJ,ACT";
    pub const FINISHED: &'static str = "RDY,ADJ,INV";
    pub const SETUP_ERROR: &'static str = "OFF,INV,INV";

    /// Classify a trimmed status response. The grammar is closed: anything other than the three
    /// known signatures is `None`.
    pub fn classify(response: &str) -> Option<PerStatus> {
        match response {
            Self::RUNNING => Some(Self::Running),
            Self::FINISHED => Some(Self::Finished),
            Self::SETUP_ERROR => Some(Self::SetupError),
            _ => None
        }
    }
}

/// Response of `FETC:WLAN:SIGN<n>:<domain>W:STAT?` once a client has associated.
pub const CLIENT_ASSOCIATED: &str = "ASS";
