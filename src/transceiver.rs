//! Serial transceiver: the receive loop and synchronous frame sending.
//!
//! The mount sends an unsolicited status report about once per second. The
//! receive loop polls the transport on a fixed interval, collects whatever
//! arrived into a ring buffer, resynchronizes on the frame preamble and
//! hands decoded reports to a [`TelemetryHandler`]. Reports may arrive in
//! fragments; partial frames stay buffered until the next poll completes
//! them.

use crate::constants::{FRAME_SIZE, PREAMBLE};
use crate::critical::lock;
use crate::error::Result;
use crate::protocol::{decode, find_preamble, to_hex};
use crate::ring_buffer::RingBuffer;
use crate::transport::ByteTransport;
use crate::types::Telemetry;
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Receiver of decoded telemetry. Called from the receive loop thread.
pub trait TelemetryHandler: Send + Sync {
    /// A position report arrived
    fn on_pointing_coordinates_received(&self, right_ascension: f32, declination: f32);

    /// A site location report arrived
    fn on_site_location_received(&self, latitude: f32, longitude: f32);
}

/// Owns the transport and the receive loop thread
pub struct Transceiver<T: ByteTransport + 'static> {
    transport: Arc<Mutex<T>>,
    handler: Arc<dyn TelemetryHandler>,
    poll_interval: Duration,
    buffer_capacity: usize,
    running: Arc<AtomicBool>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl<T: ByteTransport + 'static> Transceiver<T> {
    /// Create a stopped transceiver. The buffer is never smaller than one frame.
    pub fn new(
        transport: T,
        handler: Arc<dyn TelemetryHandler>,
        poll_interval: Duration,
        buffer_capacity: usize,
    ) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            handler,
            poll_interval,
            buffer_capacity: buffer_capacity.max(FRAME_SIZE),
            running: Arc::new(AtomicBool::new(false)),
            reader: Mutex::new(None),
        }
    }

    /// Open the transport and spawn the receive loop. Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        let mut reader = lock(&self.reader);
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("Receive loop already running");
            return Ok(());
        }

        {
            let mut transport = lock(&self.transport);
            if !transport.is_open() && !transport.open() {
                warn!("Transport could not be opened, the mount will stay silent");
            }
        }

        let transport = Arc::clone(&self.transport);
        let handler = Arc::clone(&self.handler);
        let running = Arc::clone(&self.running);
        let poll_interval = self.poll_interval;
        let capacity = self.buffer_capacity;

        let spawned = thread::Builder::new()
            .name("exos2-receiver".to_string())
            .spawn(move || receive_loop(transport, handler, running, poll_interval, capacity));

        match spawned {
            Ok(handle) => {
                *reader = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Signal the receive loop to exit and wait for it. Only the first call has an effect.
    pub fn stop(&self) {
        let handle = {
            let mut reader = lock(&self.reader);
            if !self.running.swap(false, Ordering::SeqCst) {
                return;
            }
            reader.take()
        };

        if let Some(handle) = handle {
            handle.thread().unpark();
            if handle.join().is_err() {
                warn!("Receive loop panicked");
            }
        }
    }

    /// True between `start` and `stop`
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Write one frame to the transport. Returns false on any transport failure.
    pub fn send_frame(&self, frame: &[u8]) -> bool {
        trace!("Sending:  {}", to_hex(frame));
        lock(&self.transport).write(frame)
    }
}

impl<T: ByteTransport + 'static> Drop for Transceiver<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop<T: ByteTransport>(
    transport: Arc<Mutex<T>>,
    handler: Arc<dyn TelemetryHandler>,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    capacity: usize,
) {
    info!("Serial reader thread started");
    let mut buffer = RingBuffer::new(capacity);

    while running.load(Ordering::SeqCst) {
        thread::park_timeout(poll_interval);
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let received = receive_bytes(&transport, &mut buffer);
        if received == 0 {
            continue;
        }

        while let Some(telemetry) = extract_frame(&mut buffer) {
            dispatch(handler.as_ref(), telemetry);
        }
    }

    {
        let mut transport = lock(&transport);
        transport.flush();
        transport.close();
    }
    info!("Serial reader thread stopped");
}

/// Drain the transport into `buffer`, returning the number of bytes read.
/// Bytes that do not fit are dropped.
fn receive_bytes<T: ByteTransport>(transport: &Mutex<T>, buffer: &mut RingBuffer) -> usize {
    let mut transport = lock(transport);
    if transport.bytes_available() == 0 {
        return 0;
    }

    let mut received = 0;
    let mut dropped = 0;
    while let Some(byte) = transport.read_byte() {
        received += 1;
        if !buffer.push_back(byte) {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!("Receive buffer full, dropped {} of {} bytes", dropped, received);
    }
    received
}

/// Take the first complete frame out of `buffer`.
///
/// Everything up to the end of the extracted frame is discarded, including
/// junk before its preamble. Without a complete frame the buffer is left as
/// is, unless it is full: then bytes that can no longer start a frame are
/// dropped so reception can continue.
pub fn extract_frame(buffer: &mut RingBuffer) -> Option<Telemetry> {
    if buffer.is_empty() {
        return None;
    }

    let scratch = buffer.snapshot_to_vec();
    match find_preamble(&scratch) {
        Some(start) if scratch.len() - start >= FRAME_SIZE => {
            let end = start + FRAME_SIZE;
            if start > 0 {
                trace!("Skipped {} bytes before preamble", start);
            }
            let telemetry = decode(&scratch[start..end]);
            buffer.drain_front(end);
            telemetry
        }
        Some(start) => {
            if buffer.is_full() && start > 0 {
                debug!("Receive buffer full, discarding {} bytes before partial frame", start);
                buffer.drain_front(start);
            }
            None
        }
        None => {
            if buffer.is_full() {
                let keep = PREAMBLE.len() - 1;
                let discarded = buffer.drain_front(buffer.len() - keep);
                debug!("Receive buffer full without preamble, discarded {} bytes", discarded);
            }
            None
        }
    }
}

fn dispatch(handler: &dyn TelemetryHandler, telemetry: Telemetry) {
    match telemetry {
        Telemetry::PointingCoordinates {
            right_ascension,
            declination,
        } => handler.on_pointing_coordinates_received(right_ascension, declination),
        Telemetry::SiteLocation {
            latitude,
            longitude,
        } => handler.on_site_location_received(latitude, longitude),
        Telemetry::Unhandled { command_id, .. } => {
            trace!("Dropping frame with unhandled command 0x{:02X}", command_id);
        }
    }
}
