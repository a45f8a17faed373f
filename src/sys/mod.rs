use crate::Error;

/// A command/response link to one instrument.
///
/// Implementations append the line terminator their medium expects to `command`. Responses are
/// returned as received; callers strip trailing whitespace.
pub trait Transport {
    fn send(&mut self, command: &str) -> Result<(), Error>;
    fn send_receive(&mut self, command: &str) -> Result<String, Error>;

    fn close(&mut self) -> Result<(), Error>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, command: &str) -> Result<(), Error> {
        (**self).send(command)
    }

    fn send_receive(&mut self, command: &str) -> Result<String, Error> {
        (**self).send_receive(command)
    }

    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

mod serial;
mod tcp;

pub use serial::SerialTransport;
pub use tcp::TcpTransport;
