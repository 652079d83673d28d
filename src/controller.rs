//! Mount controller: command API, telemetry interpretation and the
//! hold-direction motion loop.
//!
//! The mount does not report a state of its own, only its pointing
//! coordinates. The controller infers whether it is parked, slewing or
//! tracking from the difference between consecutive reports and from the
//! commands it has issued, and keeps the result in a [`StateMachine`].

use crate::config::MountConfig;
use crate::critical::{lock, CriticalData};
use crate::error::{MountError, Result, ValidationError};
use crate::protocol::{self, Frame};
use crate::state_machine::{StateMachine, StateNotification};
use crate::transceiver::{TelemetryHandler, Transceiver};
use crate::transport::ByteTransport;
use crate::types::*;
use chrono::{DateTime, Datelike, Timelike, Utc};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Transition table of the mount state machine
pub const MOUNT_TRANSITIONS: &[(MountState, MountSignal, MountState)] = &[
    (MountState::Disconnected, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Disconnected, MountSignal::Connect, MountState::Unknown),
    (MountState::Unknown, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Unknown, MountSignal::InitialCoordsReceived, MountState::Connected),
    (MountState::Unknown, MountSignal::GeoReceived, MountState::Connected),
    (MountState::Connected, MountSignal::Connect, MountState::Connected),
    (MountState::Connected, MountSignal::GeoReceived, MountState::Parked),
    (MountState::Connected, MountSignal::InitialCoordsReceived, MountState::Parked),
    (MountState::Connected, MountSignal::Track, MountState::Tracking),
    (MountState::Connected, MountSignal::Slew, MountState::Slewing),
    (MountState::Connected, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Parked, MountSignal::Park, MountState::Parked),
    (MountState::Parked, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Parked, MountSignal::Stop, MountState::Parked),
    (MountState::Parked, MountSignal::GoTo, MountState::Slewing),
    (MountState::Idle, MountSignal::Stop, MountState::Idle),
    (MountState::Idle, MountSignal::GoTo, MountState::Slewing),
    (MountState::Idle, MountSignal::Park, MountState::ParkingIssued),
    (MountState::Idle, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::ParkingIssued, MountSignal::Park, MountState::ParkingIssued),
    (MountState::ParkingIssued, MountSignal::Slew, MountState::ParkingIssued),
    (MountState::ParkingIssued, MountSignal::Track, MountState::ParkingIssued),
    (MountState::ParkingIssued, MountSignal::ParkReached, MountState::Parked),
    (MountState::ParkingIssued, MountSignal::Stop, MountState::Idle),
    (MountState::ParkingIssued, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Slewing, MountSignal::Stop, MountState::Idle),
    (MountState::Slewing, MountSignal::GoTo, MountState::Slewing),
    (MountState::Slewing, MountSignal::Track, MountState::Tracking),
    (MountState::Slewing, MountSignal::Slew, MountState::Slewing),
    (MountState::Slewing, MountSignal::Park, MountState::ParkingIssued),
    (MountState::Slewing, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::Tracking, MountSignal::Track, MountState::Tracking),
    (MountState::Tracking, MountSignal::Slew, MountState::Slewing),
    (MountState::Tracking, MountSignal::GoTo, MountState::Slewing),
    (MountState::Tracking, MountSignal::Stop, MountState::Idle),
    (MountState::Tracking, MountSignal::StartMotion, MountState::MoveWhileTracking),
    (MountState::Tracking, MountSignal::Park, MountState::ParkingIssued),
    (MountState::Tracking, MountSignal::Disconnect, MountState::Disconnected),
    (MountState::MoveWhileTracking, MountSignal::StopMotion, MountState::Tracking),
    (MountState::MoveWhileTracking, MountSignal::StartMotion, MountState::MoveWhileTracking),
    (MountState::MoveWhileTracking, MountSignal::Stop, MountState::Idle),
    (MountState::MoveWhileTracking, MountSignal::GoTo, MountState::Slewing),
    (MountState::MoveWhileTracking, MountSignal::Track, MountState::MoveWhileTracking),
    (MountState::MoveWhileTracking, MountSignal::Slew, MountState::MoveWhileTracking),
    (MountState::MoveWhileTracking, MountSignal::Park, MountState::ParkingIssued),
    (MountState::MoveWhileTracking, MountSignal::Disconnect, MountState::Disconnected),
];

/// Host side notifications. Every method defaults to doing nothing.
///
/// Telemetry callbacks run on the receive loop thread, transition callbacks
/// on whichever thread issued the signal.
pub trait MountListener: Send + Sync {
    /// A position report arrived
    fn on_pointing_coordinates_received(&self, _right_ascension: f32, _declination: f32) {}

    /// A site location report arrived
    fn on_site_location_received(&self, _latitude: f32, _longitude: f32) {}

    /// A defined transition happened, including self-transitions
    fn on_transition_changed(&self, _from: MountState, _signal: MountSignal, _to: MountState) {}

    /// An undefined transition moved the mount to FailSafe
    fn on_error_state_reached(&self, _from: MountState, _signal: MountSignal) {}
}

/// Signal implied by a new position report, if any.
///
/// `previous` and `received` are consecutive reports; the motion between
/// them decides between slewing and tracking.
pub fn infer_signal(
    state: MountState,
    previous: &EquatorialCoordinates,
    received: &EquatorialCoordinates,
    threshold: f32,
) -> Option<MountSignal> {
    let delta = EquatorialCoordinates::delta(previous, received);
    let abs_delta = EquatorialCoordinates::absolute(&delta);
    let motion = if abs_delta > threshold {
        MountSignal::Slew
    } else {
        MountSignal::Track
    };

    match state {
        MountState::Unknown if !received.is_nan() => Some(MountSignal::InitialCoordsReceived),
        MountState::Connected | MountState::ParkingIssued if abs_delta.is_nan() => None,
        MountState::Connected if abs_delta > 0.0 => Some(motion),
        // Not moving, assume parked
        MountState::Connected => Some(MountSignal::InitialCoordsReceived),
        MountState::ParkingIssued if abs_delta > 0.0 => Some(motion),
        MountState::ParkingIssued => Some(MountSignal::ParkReached),
        // May be externally triggered motion
        MountState::Tracking | MountState::Slewing if abs_delta > 0.0 => Some(motion),
        _ => None,
    }
}

struct TransitionReporter {
    listener: Option<Arc<dyn MountListener>>,
}

impl StateNotification<MountState, MountSignal> for TransitionReporter {
    fn on_transition_changed(&self, from: MountState, signal: MountSignal, to: MountState) {
        if from != to {
            info!("Transition : ({}, {}) -> {}", from, signal, to);
        } else {
            trace!("Transition : ({}, {}) -> {}", from, signal, to);
        }
        if let Some(listener) = &self.listener {
            listener.on_transition_changed(from, signal, to);
        }
    }

    fn on_error_state_reached(&self, from: MountState, signal: MountSignal) {
        error!(
            "Reached fail safe state, undefined transition ({}, {}) -> ???",
            from, signal
        );
        if let Some(listener) = &self.listener {
            listener.on_error_state_reached(from, signal);
        }
    }
}

#[derive(Debug, Default)]
struct MotionControl {
    state: MotionState,
    running: bool,
}

/// State shared between the caller, the receive loop and the motion loop
struct MountCore {
    state_machine: StateMachine<MountState, MountSignal>,
    current_pointing: CriticalData<EquatorialCoordinates>,
    site_location: CriticalData<EquatorialCoordinates>,
    motion: Mutex<MotionControl>,
    motion_signal: Condvar,
    motion_thread_running: AtomicBool,
    track_slew_threshold: f32,
    listener: Option<Arc<dyn MountListener>>,
}

impl MountCore {
    fn new(track_slew_threshold: f32, listener: Option<Arc<dyn MountListener>>) -> Self {
        let state_machine = StateMachine::new(MountState::Disconnected, MountState::FailSafe)
            .with_notification(Box::new(TransitionReporter {
                listener: listener.clone(),
            }));

        state_machine.add_final_state(MountState::Disconnected);
        for &(from, signal, to) in MOUNT_TRANSITIONS {
            state_machine.add_transition(from, signal, to);
        }
        // Keep the fail safe state absorbing instead of re-entering it as an error
        for signal in MountSignal::ALL {
            state_machine.add_transition(MountState::FailSafe, signal, MountState::FailSafe);
        }

        Self {
            state_machine,
            current_pointing: CriticalData::new(EquatorialCoordinates::unset()),
            site_location: CriticalData::new(EquatorialCoordinates::unset()),
            motion: Mutex::new(MotionControl::default()),
            motion_signal: Condvar::new(),
            motion_thread_running: AtomicBool::new(false),
            track_slew_threshold,
            listener,
        }
    }

    fn fire(&self, signal: MountSignal) -> Result<()> {
        self.state_machine
            .do_transition(signal)
            .map(|_| ())
            .map_err(|rejected| MountError::UndefinedTransition {
                from: rejected.from,
                signal: rejected.signal,
            })
    }

    /// Clear the motion state and wake the motion loop
    fn halt_motion(&self) {
        {
            let mut motion = lock(&self.motion);
            motion.state = MotionState::idle();
            motion.running = false;
        }
        self.motion_signal.notify_all();
    }
}

impl TelemetryHandler for MountCore {
    fn on_pointing_coordinates_received(&self, right_ascension: f32, declination: f32) {
        let received = EquatorialCoordinates::new(right_ascension, declination);
        let previous = std::mem::replace(&mut *self.current_pointing.lock(), received);

        if let Some(listener) = &self.listener {
            listener.on_pointing_coordinates_received(right_ascension, declination);
        }

        let state = self.state_machine.current_state();
        if let Some(signal) = infer_signal(state, &previous, &received, self.track_slew_threshold) {
            // Failures are reported through the state machine notification
            let _ = self.fire(signal);
        }
    }

    fn on_site_location_received(&self, latitude: f32, longitude: f32) {
        info!("Received site location: LAT {} LON {}", latitude, longitude);
        self.site_location
            .set(EquatorialCoordinates::new(latitude, longitude));

        if let Some(listener) = &self.listener {
            listener.on_site_location_received(latitude, longitude);
        }

        let _ = self.fire(MountSignal::GeoReceived);
    }
}

/// Main EXOS-2 mount interface
pub struct MountController<T: ByteTransport + 'static> {
    core: Arc<MountCore>,
    transceiver: Arc<Transceiver<T>>,
    motion_thread: Mutex<Option<JoinHandle<()>>>,
    config: MountConfig,
}

impl<T: ByteTransport + 'static> MountController<T> {
    /// Create a controller with default settings
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, MountConfig::default())
    }

    /// Create a controller using the timing and buffer settings of `config`
    pub fn with_config(transport: T, config: MountConfig) -> Self {
        Self::build(transport, config, None)
    }

    /// Create a controller reporting to `listener`
    pub fn with_listener(
        transport: T,
        config: MountConfig,
        listener: Arc<dyn MountListener>,
    ) -> Self {
        Self::build(transport, config, Some(listener))
    }

    fn build(transport: T, config: MountConfig, listener: Option<Arc<dyn MountListener>>) -> Self {
        let core = Arc::new(MountCore::new(config.track_slew_threshold, listener));
        let handler: Arc<dyn TelemetryHandler> = core.clone();
        let transceiver = Transceiver::new(
            transport,
            handler,
            config.poll_interval(),
            config.receive_buffer_capacity,
        );

        Self {
            core,
            transceiver: Arc::new(transceiver),
            motion_thread: Mutex::new(None),
            config,
        }
    }

    /// Settings this controller was built with
    pub fn config(&self) -> &MountConfig {
        &self.config
    }

    /// Open the serial session: reset the state machine, connect, start the
    /// receive loop and the motion loop.
    pub fn start(&self) -> Result<()> {
        // A session never inherits hold-direction motion from the previous one
        self.core.halt_motion();
        self.core.state_machine.reset();
        self.core.fire(MountSignal::Connect)?;
        self.transceiver.start()?;

        let mut motion_thread = lock(&self.motion_thread);
        if self.core.motion_thread_running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let core = Arc::clone(&self.core);
        let transceiver = Arc::clone(&self.transceiver);
        let spawned = thread::Builder::new()
            .name("exos2-motion".to_string())
            .spawn(move || motion_loop(core, transceiver));

        match spawned {
            Ok(handle) => {
                *motion_thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.core.motion_thread_running.store(false, Ordering::SeqCst);
                Err(e.into())
            }
        }
    }

    /// Stop the motion loop, disconnect from the mount and stop the receive loop.
    ///
    /// Calling this again once stopped does nothing.
    pub fn stop(&self) -> Result<()> {
        // Held until the end so concurrent stops disconnect only once
        let mut motion_thread = lock(&self.motion_thread);

        if self.core.motion_thread_running.swap(false, Ordering::SeqCst) {
            if let Err(e) = self.stop_motion_to_direction() {
                warn!("Stopping hold-direction motion failed: {}", e);
            }
            if let Some(handle) = motion_thread.take() {
                if handle.join().is_err() {
                    warn!("Motion control thread panicked");
                }
            }
        }

        if !self.transceiver.is_running() {
            debug!("Already stopped");
            return Ok(());
        }

        let result = self.disconnect();
        self.transceiver.stop();
        result
    }

    /// True while the receive loop is running
    pub fn is_running(&self) -> bool {
        self.transceiver.is_running()
    }

    /// Force the state machine back to Disconnected, e.g. to leave FailSafe.
    /// Call [`start`](Self::start) afterwards to reconnect.
    pub fn reset(&self) {
        self.core.state_machine.reset();
    }

    fn encoded(
        &self,
        command: Command,
        frame: std::result::Result<Frame, ValidationError>,
    ) -> Result<Frame> {
        frame.map_err(|e| {
            warn!("{}: {}", command, e);
            MountError::from(e)
        })
    }

    fn send(&self, command: Command, frame: &Frame) -> Result<()> {
        if self.transceiver.send_frame(frame) {
            Ok(())
        } else {
            warn!("Failed to send {}", command);
            Err(MountError::SendFailed { command })
        }
    }

    /// Gracefully end the session; the mount stops sending reports
    pub fn disconnect(&self) -> Result<()> {
        self.send(Command::Disconnect, &protocol::encode_disconnect())?;
        self.core.fire(MountSignal::Disconnect)
    }

    /// Stop any motion of the telescope
    pub fn stop_motion(&self) -> Result<()> {
        self.send(Command::StopMotion, &protocol::encode_stop_motion())?;
        self.core.fire(MountSignal::Stop)
    }

    /// Slew to the park/home position
    pub fn park(&self) -> Result<()> {
        self.send(Command::Park, &protocol::encode_park())?;
        self.core.fire(MountSignal::Park)
    }

    /// Slew to and track the given coordinates
    pub fn goto(&self, right_ascension: f32, declination: f32) -> Result<()> {
        let frame = self.encoded(
            Command::GoTo,
            protocol::encode_goto(right_ascension, declination),
        )?;
        self.send(Command::GoTo, &frame)?;
        self.core.fire(MountSignal::GoTo)
    }

    /// Align the mount to the given coordinates. Does not change the state.
    pub fn sync(&self, right_ascension: f32, declination: f32) -> Result<()> {
        let frame = self.encoded(
            Command::Sync,
            protocol::encode_sync(right_ascension, declination),
        )?;
        self.send(Command::Sync, &frame)?;
        info!(
            "Sent sync to RA {} DEC {}",
            right_ascension, declination
        );
        Ok(())
    }

    /// Set the site location. Does not change the state.
    pub fn set_site_location(&self, latitude: f32, longitude: f32) -> Result<()> {
        let frame = self.encoded(
            Command::SetSiteLocation,
            protocol::encode_set_site_location(latitude, longitude),
        )?;
        self.send(Command::SetSiteLocation, &frame)
    }

    /// Ask the mount for its site location. The answer also starts position reports.
    pub fn request_site_location(&self) -> Result<()> {
        self.send(
            Command::GetSiteLocation,
            &protocol::encode_get_site_location(),
        )
    }

    /// Set date and time of the controller. Does not change the state.
    pub fn set_date_time(
        &self,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<()> {
        let frame = self.encoded(
            Command::SetDateTime,
            protocol::encode_set_date_time(year, month, day, hour, minute, second),
        )?;
        self.send(Command::SetDateTime, &frame)
    }

    /// Set date and time from a UTC timestamp
    pub fn set_date_time_utc(&self, time: DateTime<Utc>) -> Result<()> {
        let year = u16::try_from(time.year()).unwrap_or(u16::MAX);
        self.set_date_time(
            year,
            time.month() as u8,
            time.day() as u8,
            time.hour() as u8,
            time.minute() as u8,
            time.second() as u8,
        )
    }

    /// Send a single move-while-tracking step. Does not change the state.
    pub fn move_direction(&self, direction: Command) -> Result<()> {
        let frame = self.encoded(direction, protocol::encode_move(direction))?;
        self.send(direction, &frame)
    }

    /// Single step north
    pub fn move_north(&self) -> Result<()> {
        self.move_direction(Command::MoveNorth)
    }

    /// Single step south
    pub fn move_south(&self) -> Result<()> {
        self.move_direction(Command::MoveSouth)
    }

    /// Single step east
    pub fn move_east(&self) -> Result<()> {
        self.move_direction(Command::MoveEast)
    }

    /// Single step west
    pub fn move_west(&self) -> Result<()> {
        self.move_direction(Command::MoveWest)
    }

    /// Start repeating move commands in `direction` at `rate_per_second`.
    ///
    /// Only valid while tracking; from any other state the state machine
    /// falls into FailSafe and no move is sent. Rates above 1000 are
    /// capped at one move per millisecond.
    pub fn start_motion(&self, direction: Command, rate_per_second: u16) -> Result<()> {
        self.encoded(direction, protocol::encode_move(direction))?;

        if let Err(e) = self.core.fire(MountSignal::StartMotion) {
            self.core.halt_motion();
            return Err(e);
        }

        {
            let mut motion = lock(&self.core.motion);
            motion.state = MotionState {
                direction,
                rate_per_second,
            };
            motion.running = true;
        }
        self.core.motion_signal.notify_all();
        Ok(())
    }

    /// Stop the hold-direction motion and return to tracking
    pub fn stop_motion_to_direction(&self) -> Result<()> {
        self.core.halt_motion();

        if self.core.state_machine.current_state() != MountState::MoveWhileTracking {
            info!("Motion already disabled");
            return Ok(());
        }
        self.core.fire(MountSignal::StopMotion)
    }

    /// Current inferred mount state
    pub fn current_state(&self) -> MountState {
        self.core.state_machine.current_state()
    }

    /// True while in FailSafe
    pub fn is_in_error_state(&self) -> bool {
        self.core.state_machine.is_in_error_state()
    }

    /// True while disconnected
    pub fn is_final_state(&self) -> bool {
        self.core.state_machine.is_final_state()
    }

    /// Last reported pointing coordinates, NaN before the first report
    pub fn pointing_coordinates(&self) -> EquatorialCoordinates {
        self.core.current_pointing.get()
    }

    /// Last reported site location; latitude in `right_ascension`,
    /// longitude in `declination`
    pub fn site_location(&self) -> EquatorialCoordinates {
        self.core.site_location.get()
    }

    /// Current hold-direction motion
    pub fn motion_state(&self) -> MotionState {
        lock(&self.core.motion).state
    }

    /// True while the motion loop is repeating move commands
    pub fn is_motion_running(&self) -> bool {
        lock(&self.core.motion).running
    }
}

impl<T: ByteTransport + 'static> TelemetryHandler for MountController<T> {
    fn on_pointing_coordinates_received(&self, right_ascension: f32, declination: f32) {
        self.core
            .on_pointing_coordinates_received(right_ascension, declination);
    }

    fn on_site_location_received(&self, latitude: f32, longitude: f32) {
        self.core.on_site_location_received(latitude, longitude);
    }
}

impl<T: ByteTransport + 'static> Drop for MountController<T> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            debug!("Stop on drop: {}", e);
        }
    }
}

fn motion_loop<T: ByteTransport + 'static>(core: Arc<MountCore>, transceiver: Arc<Transceiver<T>>) {
    info!("Motion control thread started");

    while core.motion_thread_running.load(Ordering::SeqCst) {
        let (direction, interval) = {
            let mut motion = lock(&core.motion);
            while !motion.running && core.motion_thread_running.load(Ordering::SeqCst) {
                motion = core
                    .motion_signal
                    .wait(motion)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            if !core.motion_thread_running.load(Ordering::SeqCst) {
                break;
            }

            match motion.state.hold_interval() {
                Some(interval) => (motion.state.direction, interval),
                None => {
                    // Started without a usable direction or rate
                    motion.state = MotionState::idle();
                    motion.running = false;
                    continue;
                }
            }
        };

        match protocol::encode_move(direction) {
            Ok(frame) => {
                if !transceiver.send_frame(&frame) {
                    debug!("Failed to send {}", direction);
                }
            }
            Err(e) => warn!("{}", e),
        }

        // Sleep for the hold interval, stop and redirect wake up early
        let motion = lock(&core.motion);
        if motion.running && core.motion_thread_running.load(Ordering::SeqCst) {
            let _ = core.motion_signal.wait_timeout(motion, interval);
        }
    }

    info!("Motion control thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ra: f32, dec: f32) -> EquatorialCoordinates {
        EquatorialCoordinates::new(ra, dec)
    }

    const THRESHOLD: f32 = crate::constants::TRACK_SLEW_THRESHOLD;

    #[test]
    fn test_infer_unknown() {
        let unset = EquatorialCoordinates::unset();
        assert_eq!(
            infer_signal(MountState::Unknown, &unset, &at(1.0, 2.0), THRESHOLD),
            Some(MountSignal::InitialCoordsReceived)
        );
        assert_eq!(infer_signal(MountState::Unknown, &unset, &unset, THRESHOLD), None);
    }

    #[test]
    fn test_infer_connected() {
        let unset = EquatorialCoordinates::unset();
        assert_eq!(
            infer_signal(MountState::Connected, &unset, &at(1.0, 2.0), THRESHOLD),
            None
        );
        assert_eq!(
            infer_signal(MountState::Connected, &at(1.0, 2.0), &at(1.0, 2.0), THRESHOLD),
            Some(MountSignal::InitialCoordsReceived)
        );
        assert_eq!(
            infer_signal(MountState::Connected, &at(1.0, 2.0), &at(1.01, 2.0), THRESHOLD),
            Some(MountSignal::Track)
        );
        assert_eq!(
            infer_signal(MountState::Connected, &at(1.0, 2.0), &at(1.5, 2.0), THRESHOLD),
            Some(MountSignal::Slew)
        );
    }

    #[test]
    fn test_infer_parking() {
        assert_eq!(
            infer_signal(MountState::ParkingIssued, &at(3.0, 0.0), &at(3.0, 0.0), THRESHOLD),
            Some(MountSignal::ParkReached)
        );
        assert_eq!(
            infer_signal(MountState::ParkingIssued, &at(3.0, 0.0), &at(4.0, 0.0), THRESHOLD),
            Some(MountSignal::Slew)
        );
    }

    #[test]
    fn test_infer_tracking_and_idle() {
        assert_eq!(
            infer_signal(MountState::Tracking, &at(3.0, 0.0), &at(3.0, 0.0), THRESHOLD),
            None
        );
        assert_eq!(
            infer_signal(MountState::Slewing, &at(3.0, 0.0), &at(3.001, 0.0), THRESHOLD),
            Some(MountSignal::Track)
        );
        assert_eq!(
            infer_signal(MountState::Idle, &at(3.0, 0.0), &at(9.0, 0.0), THRESHOLD),
            None
        );
        assert_eq!(
            infer_signal(MountState::Parked, &at(3.0, 0.0), &at(9.0, 0.0), THRESHOLD),
            None
        );
    }

    #[test]
    fn test_declination_motion_does_not_count() {
        assert_eq!(
            infer_signal(MountState::Tracking, &at(3.0, 0.0), &at(3.0, 40.0), THRESHOLD),
            None
        );
    }

    #[test]
    fn test_transition_table_is_deterministic() {
        let core = MountCore::new(THRESHOLD, None);
        for &(from, signal, to) in MOUNT_TRANSITIONS {
            assert_eq!(core.state_machine.target(from, signal), Some(to));
            assert!(!core.state_machine.add_transition(from, signal, MountState::FailSafe));
        }
        for signal in MountSignal::ALL {
            assert_eq!(
                core.state_machine.target(MountState::FailSafe, signal),
                Some(MountState::FailSafe)
            );
        }
    }

    #[test]
    fn test_core_starts_disconnected_and_final() {
        let core = MountCore::new(THRESHOLD, None);
        assert_eq!(core.state_machine.current_state(), MountState::Disconnected);
        assert!(core.state_machine.is_final_state());
        assert!(core.current_pointing.get().is_nan());
        assert!(core.site_location.get().is_nan());
    }
}
