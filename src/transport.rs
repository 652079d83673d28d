//! Byte transports the transceiver talks through.
//!
//! [`ByteTransport`] is the whole contract the engine needs from a serial
//! device. [`SerialPortTransport`] implements it on top of the `serialport`
//! crate, [`MemoryTransport`] keeps everything in memory for tests and
//! simulation.

use crate::config::MountConfig;
use crate::constants::{BAUD_RATE, TIMEOUT_MS};
use crate::critical::lock;
use crate::error::Result;
use log::{debug, warn};
use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Abstraction of a serial interface
pub trait ByteTransport: Send {
    /// Open the device. Returns false if it could not be opened.
    fn open(&mut self) -> bool;

    /// Close the device. Returns false if it was not open.
    fn close(&mut self) -> bool;

    /// True if the device is ready to receive or transmit
    fn is_open(&self) -> bool;

    /// Number of bytes waiting in the receive queue
    fn bytes_available(&mut self) -> usize;

    /// Read one byte, `None` once no more data is available this cycle
    fn read_byte(&mut self) -> Option<u8>;

    /// Write all of `bytes`. Returns false on any failure.
    fn write(&mut self, bytes: &[u8]) -> bool;

    /// Discard pending input and output
    fn flush(&mut self) -> bool;
}

impl<T: ByteTransport + ?Sized> ByteTransport for Box<T> {
    fn open(&mut self) -> bool {
        (**self).open()
    }

    fn close(&mut self) -> bool {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn bytes_available(&mut self) -> usize {
        (**self).bytes_available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, bytes: &[u8]) -> bool {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> bool {
        (**self).flush()
    }
}

/// Serial port transport, 8N1 at the configured baud rate
pub struct SerialPortTransport {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialPortTransport {
    /// Create a closed transport for `port_name` with default settings
    pub fn new(port_name: &str) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate: BAUD_RATE,
            timeout: Duration::from_millis(TIMEOUT_MS),
            port: None,
        }
    }

    /// Create a closed transport from the port settings of `config`
    pub fn from_config(config: &MountConfig) -> Self {
        Self {
            port_name: config.port_name.clone(),
            baud_rate: config.baud_rate,
            timeout: Duration::from_millis(config.timeout_ms),
            port: None,
        }
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }

    /// Device path or name this transport opens
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl ByteTransport for SerialPortTransport {
    fn open(&mut self) -> bool {
        if self.port.is_some() {
            return false;
        }

        let opened = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(self.timeout)
            .open();

        match opened {
            Ok(port) => {
                debug!("Opened {} at {} baud", self.port_name, self.baud_rate);
                self.port = Some(port);
                true
            }
            Err(e) => {
                warn!("Failed to open {}: {}", self.port_name, e);
                false
            }
        }
    }

    fn close(&mut self) -> bool {
        self.port.take().is_some()
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_available(&mut self) -> usize {
        match self.port.as_ref().map(|port| port.bytes_to_read()) {
            Some(Ok(count)) => count as usize,
            _ => 0,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.bytes_available() == 0 {
            return None;
        }

        let port = self.port.as_mut()?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> bool {
        let Some(port) = self.port.as_mut() else {
            return false;
        };
        if bytes.is_empty() {
            return false;
        }

        match port.write_all(bytes) {
            Ok(()) => true,
            Err(e) => {
                warn!("Write to {} failed: {}", self.port_name, e);
                false
            }
        }
    }

    fn flush(&mut self) -> bool {
        match self.port.as_ref() {
            Some(port) => port.clear(ClearBuffer::All).is_ok(),
            None => false,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    open: bool,
    fail_writes: bool,
    rx: VecDeque<u8>,
    sent: Vec<Vec<u8>>,
}

/// In-memory transport. Clones share the same queues, so a test or a
/// simulator can keep one handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryTransport {
    /// Create a closed transport with empty queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the mount had sent them
    pub fn feed(&self, bytes: &[u8]) {
        lock(&self.inner).rx.extend(bytes.iter().copied());
    }

    /// Bytes queued but not yet read
    pub fn pending(&self) -> usize {
        lock(&self.inner).rx.len()
    }

    /// Every buffer written so far
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        lock(&self.inner).sent.clone()
    }

    /// Return and forget every buffer written so far
    pub fn take_sent_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut lock(&self.inner).sent)
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.inner).fail_writes = fail;
    }
}

impl ByteTransport for MemoryTransport {
    fn open(&mut self) -> bool {
        let mut inner = lock(&self.inner);
        if inner.open {
            return false;
        }
        inner.open = true;
        true
    }

    fn close(&mut self) -> bool {
        let mut inner = lock(&self.inner);
        std::mem::replace(&mut inner.open, false)
    }

    fn is_open(&self) -> bool {
        lock(&self.inner).open
    }

    fn bytes_available(&mut self) -> usize {
        let inner = lock(&self.inner);
        if inner.open {
            inner.rx.len()
        } else {
            0
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut inner = lock(&self.inner);
        if !inner.open {
            return None;
        }
        inner.rx.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.open || inner.fail_writes || bytes.is_empty() {
            return false;
        }
        inner.sent.push(bytes.to_vec());
        true
    }

    fn flush(&mut self) -> bool {
        lock(&self.inner).open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_requires_open() {
        let mut transport = MemoryTransport::new();
        transport.feed(&[1, 2]);
        assert_eq!(transport.bytes_available(), 0);
        assert!(!transport.write(&[0x55]));

        assert!(transport.open());
        assert!(!transport.open());
        assert_eq!(transport.bytes_available(), 2);
        assert_eq!(transport.read_byte(), Some(1));
        assert_eq!(transport.read_byte(), Some(2));
        assert_eq!(transport.read_byte(), None);
        assert!(transport.close());
        assert!(!transport.close());
    }

    #[test]
    fn test_memory_transport_shares_state_between_clones() {
        let handle = MemoryTransport::new();
        let mut engine_side = handle.clone();
        engine_side.open();
        assert!(engine_side.write(&[0xAA, 0xBB]));

        handle.set_fail_writes(true);
        assert!(!engine_side.write(&[0xCC]));

        assert_eq!(handle.take_sent_frames(), vec![vec![0xAA, 0xBB]]);
        assert!(handle.sent_frames().is_empty());
    }

    #[test]
    fn test_serial_transport_starts_closed() {
        let mut transport = SerialPortTransport::new("/dev/does-not-exist");
        assert!(!transport.is_open());
        assert_eq!(transport.bytes_available(), 0);
        assert_eq!(transport.read_byte(), None);
        assert!(!transport.write(&[0x00]));
        assert!(!transport.flush());
        assert!(!transport.close());
    }
}
