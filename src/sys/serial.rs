use std::io::{self, Read, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, SerialPort};

use crate::Result;

/// The part of a serial port the transport needs.
trait Port: Read + Write {
    fn clear_input(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.clear(ClearBuffer::All)?)
    }
}

/// RS-232 link to the instrument.
pub struct SerialTransport {
    port: Option<Box<dyn Port>>,
    path: String,
    settle: Duration,
    timeout: Duration,
}

impl SerialTransport {
    const RETRY: usize = 2;
    const BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];
    // granularity of a single read; the response deadline is enforced in `read_line`
    const READ_TIMEOUT: Duration = Duration::from_millis(100);

    pub fn open(path: &str, baud_rate: u32) -> Result<SerialTransport> {
        if !Self::BAUD_RATES.contains(&baud_rate) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput,
                                      format!("unsupported baud rate {}", baud_rate)).into())
        }
        let mut port = serialport::new(path, baud_rate)
            .timeout(Self::READ_TIMEOUT)
            .open()
            .map_err(io::Error::from)?;
        port.clear_input()?;
        log::debug!("opened {} at {} baud", path, baud_rate);
        Ok(Self::with_port(Box::new(port), path))
    }

    fn with_port(port: Box<dyn Port>, path: &str) -> SerialTransport {
        SerialTransport {
            port: Some(port),
            path: path.to_owned(),
            settle: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
        }
    }

    /// Delay after every write, giving the instrument time to consume the command.
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn port(&mut self) -> Result<&mut Box<dyn Port>> {
        match self.port {
            Some(ref mut port) => Ok(port),
            None => Err(io::Error::new(io::ErrorKind::NotConnected,
                                       format!("{} is closed", self.path)).into())
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let timeout = self.timeout;
        let port = self.port()?;
        let deadline = Instant::now() + timeout;
        let mut line = Vec::new();
        let mut chunk = [0u8; 256];
        while Instant::now() < deadline {
            match port.read(&mut chunk) {
                Ok(count) => line.extend_from_slice(&chunk[..count]),
                Err(error) if error.kind() == io::ErrorKind::TimedOut => (),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => (),
                Err(error) => return Err(error.into()),
            }
            if line.ends_with(b"\n") { break }
        }
        if !line.ends_with(b"\n") {
            log::debug!("{}: read {} bytes without terminator after {:?}",
                        self.path, line.len(), timeout);
        }
        // the instrument answers in ISO 8859-1
        Ok(line.into_iter().map(|byte| byte as char).collect())
    }
}

impl super::Transport for SerialTransport {
    fn send(&mut self, command: &str) -> Result<()> {
        log::trace!("{}: write({:?})", self.path, command);
        let port = self.port()?;
        port.clear_input()?;
        port.write_all(command.as_bytes())?;
        port.write_all(b"\r\n")?;
        port.flush()?;
        sleep(self.settle);
        Ok(())
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        let mut response = String::new();
        for _ in 0..Self::RETRY {
            self.send(command)?;
            response = self.read_line()?;
            if !response.is_empty() { break }
        }
        log::trace!("{}: read() = {:?}", self.path, response);
        Ok(response)
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            log::debug!("closing {}", self.path);
        }
        Ok(())
    }
}
