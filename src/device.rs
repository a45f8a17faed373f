use std::time::Duration;

use crate::Result;
use crate::association::AssociationMonitor;
use crate::config::SessionOptions;
use crate::per::PerEngine;
use crate::sensitivity::SensitivitySearch;
use crate::session::Session;
use crate::signaling::Signaling;
use crate::sys::{TcpTransport, Transport};

/// A CMW500 running the WLAN signaling application.
pub struct Cmw500<T: Transport> {
    session: Session<T>,
}

impl Cmw500<TcpTransport> {
    pub fn connect_tcp(host: &str, port: u16) -> Result<Cmw500<TcpTransport>> {
        let transport = TcpTransport::connect((host, port), Duration::from_secs(10))?;
        Self::open(transport, SessionOptions::new(&format!("{}:{}", host, port)))
    }
}

impl Cmw500<crate::sys::SerialTransport> {
    pub fn connect_serial(path: &str, baud_rate: u32) -> Result<Cmw500<crate::sys::SerialTransport>> {
        let transport = crate::sys::SerialTransport::open(path, baud_rate)?;
        Self::open(transport, SessionOptions::new(path))
    }
}

impl<T: Transport> Cmw500<T> {
    pub fn open(transport: T, options: SessionOptions) -> Result<Cmw500<T>> {
        Ok(Cmw500 { session: Session::open(transport, options)? })
    }

    pub fn from_session(session: Session<T>) -> Cmw500<T> {
        Cmw500 { session }
    }

    pub fn session(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    pub fn preset(&mut self) -> Result<()> {
        self.session.preset()
    }

    pub fn close(mut self) -> Result<()> {
        self.session.close()
    }

    pub fn signaling(&mut self) -> Signaling<'_, Session<T>> {
        Signaling::new(&mut self.session)
    }

    pub fn association(&mut self) -> AssociationMonitor<'_, Session<T>> {
        AssociationMonitor::new(&mut self.session)
    }

    pub fn per(&mut self) -> PerEngine<'_, Session<T>> {
        PerEngine::new(&mut self.session)
    }

    pub fn sensitivity(&mut self) -> SensitivitySearch<'_, Session<T>> {
        SensitivitySearch::new(&mut self.session)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::diag::Event;
    use crate::mock::{MockTransport, SimulatedClock};
    use crate::params::ChannelState;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedEvents(Rc<RefCell<Vec<Event>>>);

    impl crate::diag::Diagnostics for SharedEvents {
        fn emit(&mut self, event: Event) {
            self.0.borrow_mut().push(event)
        }
    }

    #[test]
    fn test_device_session() {
        let transport = MockTransport::new()
            .query("*IDN?", "Rohde&Schwarz,CMW,1201.0002k50/123456,3.7.20\n")
            .command("SYST:PRES:ALL")
            .command("SOUR:WLAN:SIGN1:STAT ON")
            .query("SOUR:WLAN:SIGN1:STAT?", "OFF\n")
            .query("SOUR:WLAN:SIGN1:STAT?", "ON\n");
        let events = SharedEvents::default();
        let session = Session::with_parts(transport, SessionOptions::new("GPIB::18::INSTR"),
                                          Box::new(events.clone()),
                                          Box::new(SimulatedClock::new())).unwrap();
        let mut cmw = Cmw500::from_session(session);
        cmw.preset().unwrap();
        cmw.signaling().set_state(1, ChannelState::On, Duration::from_secs(30)).unwrap();
        cmw.session().transport().done();
        cmw.close().unwrap();

        let events = events.0.borrow();
        assert!(events.iter().any(|event|
            event.component == "session" && event.message == "send(\"SYST:PRES:ALL\")"));
        assert!(events.iter().any(|event|
            event.level == log::Level::Info && event.message == "CH1 set to ON"));
    }
}
