//! Scripted in-memory transport for exercising the client without hardware.

use crate::error::{Result, RotatorError};
use crate::transport::{read_frame, Transport};
use std::collections::VecDeque;
use std::io::Cursor;

/// Transport that replays canned responses and records every command.
///
/// Each queued response answers one `read_until` call. A response without
/// the terminator, an explicit [`MockTransport::timeout`], or an empty queue
/// all behave like a silent line.
#[derive(Debug, Default)]
pub struct MockTransport {
    open: bool,
    unavailable: bool,
    responses: VecDeque<Option<Vec<u8>>>,
    written: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response
    pub fn respond(mut self, response: &str) -> Self {
        self.responses.push_back(Some(response.as_bytes().to_vec()));
        self
    }

    /// Queue a silent exchange
    pub fn timeout(mut self) -> Self {
        self.responses.push_back(None);
        self
    }

    /// Make `open` fail as if the port did not exist
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Commands written so far, terminators included
    pub fn written(&self) -> &[String] {
        &self.written
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.len()
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<()> {
        if self.unavailable {
            return Err(RotatorError::TransportUnavailable {
                port: "mock".to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, "no such port"),
            });
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(RotatorError::NotConnected);
        }
        self.written.push(String::from_utf8_lossy(data).into_owned());
        Ok(())
    }

    fn read_until(&mut self, terminator: u8) -> Result<Vec<u8>> {
        if !self.open {
            return Err(RotatorError::NotConnected);
        }
        match self.responses.pop_front().flatten() {
            Some(bytes) => read_frame(&mut Cursor::new(bytes), terminator),
            None => Err(RotatorError::Timeout),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
