//! Byte transport between the panel and the message loop.

use crate::{Error, Result};

/// A byte stream to the panel's automation module.
///
/// The message loop owns its transport, so implementations need no internal
/// locking.
pub trait Transport: Send {
    fn open(&mut self) -> Result<()>;

    /// Reads a single byte.
    ///
    /// Returns `Ok(None)` when no byte arrived within the read timeout and
    /// [`Error::TransportClosed`] when the stream has ended.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Releases the underlying device. Safe to call more than once.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn close(&mut self) {
        (**self).close()
    }
}

#[cfg(feature = "serialport")]
pub use self::serial::SerialTransport;

#[cfg(feature = "serialport")]
mod serial {
    use super::Transport;
    use crate::{Error, Result};
    use std::io::{ErrorKind, Read, Write};
    use std::time::Duration;

    /// Serial line settings of the automation module.
    pub const BAUD_RATE: u32 = 9600;

    /// Serial port connection to the panel, 9600 8O1 without flow control.
    pub struct SerialTransport {
        device: String,
        read_timeout: Duration,
        port: Option<Box<dyn serialport::SerialPort>>,
    }

    impl std::fmt::Debug for SerialTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.debug_struct("SerialTransport")
                .field("device", &self.device)
                .field("read_timeout", &self.read_timeout)
                .field("open", &self.port.is_some())
                .finish()
        }
    }

    impl SerialTransport {
        pub fn new(device: &str, read_timeout: Duration) -> Self {
            Self {
                device: device.to_string(),
                read_timeout,
                port: None,
            }
        }

        pub fn device(&self) -> &str {
            &self.device
        }

        fn port(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
            self.port.as_mut().ok_or(Error::TransportClosed)
        }
    }

    impl Transport for SerialTransport {
        fn open(&mut self) -> Result<()> {
            log::info!("Opening serial port '{}'", self.device);
            let port = serialport::new(&self.device, BAUD_RATE)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::Odd)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(self.read_timeout)
                .open()?;
            self.port = Some(port);
            Ok(())
        }

        fn read_byte(&mut self) -> Result<Option<u8>> {
            let mut buf = [0u8; 1];
            match self.port()?.read(&mut buf) {
                Ok(0) => Err(Error::TransportClosed),
                Ok(_) => Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        }

        fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
            log::trace!("write: {:02X?}", bytes);
            let port = self.port()?;
            Write::write_all(port, bytes)?;
            port.flush()?;
            Ok(())
        }

        fn close(&mut self) {
            if self.port.take().is_some() {
                log::info!("Closed serial port '{}'", self.device);
            }
        }
    }
}

/// Transport replaying a fixed byte sequence, for offline decoding.
///
/// Writes are discarded. The stream ends once all bytes were read.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    data: std::collections::VecDeque<u8>,
}

impl ReplayTransport {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into().into(),
        }
    }
}

impl Transport for ReplayTransport {
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        self.data.pop_front().map(Some).ok_or(Error::TransportClosed)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        log::trace!("replay: discarding write {:02X?}", bytes);
        Ok(())
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_ends_with_transport_closed() {
        let mut transport = ReplayTransport::new(b"\n".to_vec());
        transport.open().unwrap();
        assert_eq!(transport.read_byte().unwrap(), Some(b'\n'));
        assert!(matches!(transport.read_byte(), Err(Error::TransportClosed)));
        assert!(transport.write_all(&[0x06]).is_ok());
    }
}
