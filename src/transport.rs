//! Byte transport between the client and the dish console.
//!
//! Responses carry no length prefix; the prompt character that ends every
//! response is the only framing signal. A response is complete once that
//! terminator arrives, and the line going silent before then is a timeout.

use crate::constants::{BAUD_RATE, READ_CHUNK_SIZE, TIMEOUT_MS};
use crate::error::{Result, RotatorError};
use log::{debug, trace};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

/// Byte channel to the dish with an explicit open/close lifecycle
pub trait Transport {
    /// Open the underlying channel
    fn open(&mut self) -> Result<()>;

    /// Release the underlying channel; no-op when already closed
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Write a complete command
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read until `terminator` is received, inclusive
    fn read_until(&mut self, terminator: u8) -> Result<Vec<u8>>;

    /// Human-readable channel name for logs
    fn name(&self) -> &str;
}

/// Read one terminated frame from `reader`.
///
/// Returns everything up to and including `terminator`. A read that times
/// out or returns zero bytes before the terminator is seen fails with
/// [`RotatorError::Timeout`]; partial data is never returned.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R, terminator: u8) -> Result<Vec<u8>> {
    let mut response = Vec::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => {
                debug!("Read returned no data after {} bytes", response.len());
                return Err(RotatorError::Timeout);
            }
            Ok(n) => match chunk[..n].iter().position(|&b| b == terminator) {
                Some(pos) => {
                    response.extend_from_slice(&chunk[..=pos]);
                    if pos + 1 < n {
                        trace!("Discarding {} bytes after terminator", n - pos - 1);
                    }
                    return Ok(response);
                }
                None => response.extend_from_slice(&chunk[..n]),
            },
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                debug!("Read timed out after {} bytes", response.len());
                return Err(RotatorError::Timeout);
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}

/// Serial port transport at the dish's fixed line settings
pub struct SerialTransport {
    port_name: String,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Create a closed transport for `port_name`
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            timeout: Duration::from_millis(TIMEOUT_MS),
            port: None,
        }
    }

    /// Override the silence timeout used by subsequent opens
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(RotatorError::NotConnected)
    }
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<()> {
        let port = serialport::new(&self.port_name, BAUD_RATE)
            .timeout(self.timeout)
            .open()
            .map_err(|source| RotatorError::TransportUnavailable {
                port: self.port_name.clone(),
                source,
            })?;

        debug!("Opened {} at {} baud", self.port_name, BAUD_RATE);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed {}", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port_mut()?;
        port.clear(serialport::ClearBuffer::Input)?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read_until(&mut self, terminator: u8) -> Result<Vec<u8>> {
        let port = self.port_mut()?;
        read_frame(&mut **port, terminator)
    }

    fn name(&self) -> &str {
        &self.port_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::{self, Cursor};

    /// Reader that hands out pre-split chunks, then times out
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(ErrorKind::TimedOut, "silent")),
            }
        }
    }

    #[test]
    fn frame_ends_at_terminator() {
        let mut reader = Cursor::new(b"q\r\nMOT>".to_vec());
        let frame = read_frame(&mut reader, b'>').unwrap();
        assert_eq!(frame, b"q\r\nMOT>");
    }

    #[test]
    fn frame_spans_multiple_reads() {
        let mut reader = ChunkedReader {
            chunks: VecDeque::from(vec![b"Angle[0] = 1".to_vec(), b"2.50\r\nMOT>".to_vec()]),
        };
        let frame = read_frame(&mut reader, b'>').unwrap();
        assert_eq!(frame, b"Angle[0] = 12.50\r\nMOT>");
    }

    #[test]
    fn bytes_after_terminator_are_dropped() {
        let mut reader = Cursor::new(b"DVB>junk".to_vec());
        assert_eq!(read_frame(&mut reader, b'>').unwrap(), b"DVB>");
    }

    #[test]
    fn silence_before_terminator_is_timeout() {
        let mut reader = ChunkedReader {
            chunks: VecDeque::from(vec![b"partial".to_vec()]),
        };
        assert!(matches!(
            read_frame(&mut reader, b'>'),
            Err(RotatorError::Timeout)
        ));
    }

    #[test]
    fn empty_read_is_timeout() {
        let mut reader = Cursor::new(Vec::new());
        assert!(matches!(
            read_frame(&mut reader, b'>'),
            Err(RotatorError::Timeout)
        ));
    }

    #[test]
    fn closed_serial_transport_is_not_connected() {
        let mut transport = SerialTransport::new("/dev/null-dish");
        assert!(!transport.is_open());
        assert!(matches!(
            transport.write_all(b"q\r"),
            Err(RotatorError::NotConnected)
        ));
        assert!(matches!(
            transport.read_until(b'>'),
            Err(RotatorError::NotConnected)
        ));
    }
}
