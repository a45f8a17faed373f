//! Diagnostic events. The crate never owns a logger; it hands events to whatever sink the session
//! was constructed with.

use log::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub component: &'static str,
    pub message: String,
}

pub trait Diagnostics {
    fn emit(&mut self, event: Event);
}

/// Forwards events to the `log` facade, targeted at `cmw500::<component>`.
#[derive(Debug, Clone)]
pub struct LogDiagnostics {
    port_name: String,
}

impl LogDiagnostics {
    pub fn new(port_name: &str) -> LogDiagnostics {
        LogDiagnostics { port_name: port_name.to_owned() }
    }
}

impl Diagnostics for LogDiagnostics {
    fn emit(&mut self, event: Event) {
        let target = format!("cmw500::{}", event.component);
        log::log!(target: &target, event.level, "CMW500({}): {}", self.port_name, event.message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn emit(&mut self, _event: Event) {}
}

impl Diagnostics for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event)
    }
}

macro_rules! emit {
    ($session:expr, $level:ident, $component:expr, $($arg:tt)+) => {
        $session.emit($crate::diag::Event {
            level: log::Level::$level,
            component: $component,
            message: format!($($arg)+),
        })
    };
}

pub(crate) use emit;
