use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use crate::Result;

/// Raw SCPI socket ("SOCKET" resource), conventionally on port 5025.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<BufReader<TcpStream>>,
    peer: String,
}

impl TcpTransport {
    pub const DEFAULT_PORT: u16 = 5025;

    pub fn connect<A: ToSocketAddrs + std::fmt::Debug>(addr: A, timeout: Duration)
            -> Result<TcpTransport> {
        let peer = format!("{:?}", addr);
        let mut last_error = None;
        for socket_addr in addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(timeout))?;
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_nodelay(true)?;
                    log::debug!("connected to {}", socket_addr);
                    return Ok(TcpTransport { stream: Some(BufReader::new(stream)), peer })
                }
                Err(error) => last_error = Some(error),
            }
        }
        Err(last_error.unwrap_or_else(||
            io::Error::new(io::ErrorKind::NotFound, format!("{} did not resolve", peer))).into())
    }

    fn stream(&mut self) -> Result<&mut BufReader<TcpStream>> {
        match self.stream {
            Some(ref mut stream) => Ok(stream),
            None => Err(io::Error::new(io::ErrorKind::NotConnected,
                                       format!("{} is closed", self.peer)).into())
        }
    }
}

impl super::Transport for TcpTransport {
    fn send(&mut self, command: &str) -> Result<()> {
        log::trace!("{}: write({:?})", self.peer, command);
        let stream = self.stream()?.get_mut();
        stream.write_all(command.as_bytes())?;
        stream.write_all(b"\n")?;
        stream.flush()?;
        Ok(())
    }

    fn send_receive(&mut self, command: &str) -> Result<String> {
        self.send(command)?;
        let mut response = String::new();
        if self.stream()?.read_line(&mut response)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof,
                                      format!("{} closed the connection", self.peer)).into())
        }
        log::trace!("{}: read() = {:?}", self.peer, response);
        Ok(response)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            log::debug!("closing {}", self.peer);
            stream.into_inner().shutdown(std::net::Shutdown::Both)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Transport;
    use std::net::TcpListener;
    use std::thread;

    fn emulate(responses: &'static [(&'static str, Option<&'static str>)]) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut writer = stream;
            for &(expected, response) in responses {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                assert_eq!(line, format!("{}\n", expected));
                if let Some(response) = response {
                    writer.write_all(response.as_bytes()).unwrap();
                }
            }
        });
        addr
    }

    #[test]
    fn test_tcp_exchange() {
        let addr = emulate(&[
            ("*IDN?", Some("Rohde&Schwarz,CMW,1201.0002k50/123456,3.7.20\n")),
            ("SYST:PRES:ALL", None),
            ("CONF:WLAN:SIGN1:RFS:BOP?", Some("-60\r\n")),
        ]);
        let mut transport = TcpTransport::connect(addr, Duration::from_secs(5)).unwrap();
        let idn = transport.send_receive("*IDN?").unwrap();
        assert!(idn.starts_with("Rohde&Schwarz,CMW"));
        transport.send("SYST:PRES:ALL").unwrap();
        assert_eq!(transport.send_receive("CONF:WLAN:SIGN1:RFS:BOP?").unwrap(), "-60\r\n");
        transport.close().unwrap();
    }

    #[test]
    fn test_tcp_closed() {
        let addr = emulate(&[]);
        let mut transport = TcpTransport::connect(addr, Duration::from_secs(5)).unwrap();
        transport.close().unwrap();
        assert!(matches!(transport.send("*RST"), Err(crate::Error::Io(_))));
    }
}
