//! Deterministic, table-driven finite state machine.
//!
//! The machine knows nothing about what its states and signals mean. Each
//! `(state, signal)` pair maps to at most one target state; any signal
//! without an entry for the current state moves the machine into the
//! configured error state. All operations are serialized by one internal
//! lock, so signals may arrive from several threads.

use crate::critical::lock;
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Mutex;

/// Transition notifications
pub trait StateNotification<S, G>: Send + Sync {
    /// Called after every defined transition, including self-transitions
    fn on_transition_changed(&self, from: S, signal: G, to: S);

    /// Called when an undefined transition moved the machine to the error state
    fn on_error_state_reached(&self, from: S, signal: G);
}

/// Signal that had no transition from the state it was applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejected<S, G> {
    pub from: S,
    pub signal: G,
}

#[derive(Debug)]
struct Inner<S, G> {
    table: HashMap<(S, G), S>,
    final_states: HashSet<S>,
    current: S,
}

/// State machine with thread safe transitions
pub struct StateMachine<S, G> {
    inner: Mutex<Inner<S, G>>,
    start_state: S,
    error_state: S,
    notification: Option<Box<dyn StateNotification<S, G>>>,
}

impl<S, G> StateMachine<S, G>
where
    S: Copy + Eq + Hash + Debug,
    G: Copy + Eq + Hash + Debug,
{
    /// Create a machine with an empty table, currently in `start_state`
    pub fn new(start_state: S, error_state: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                table: HashMap::new(),
                final_states: HashSet::new(),
                current: start_state,
            }),
            start_state,
            error_state,
            notification: None,
        }
    }

    /// Attach the receiver of transition notifications
    pub fn with_notification(mut self, notification: Box<dyn StateNotification<S, G>>) -> Self {
        self.notification = Some(notification);
        self
    }

    /// Register `from --signal--> to`.
    ///
    /// Returns false and leaves the table unchanged if `(from, signal)` is
    /// already registered; the first registration wins.
    pub fn add_transition(&self, from: S, signal: G, to: S) -> bool {
        let mut inner = lock(&self.inner);
        if inner.table.contains_key(&(from, signal)) {
            return false;
        }
        inner.table.insert((from, signal), to);
        true
    }

    /// Target of `(from, signal)`, if registered
    pub fn target(&self, from: S, signal: G) -> Option<S> {
        lock(&self.inner).table.get(&(from, signal)).copied()
    }

    /// Mark a state as final
    pub fn add_final_state(&self, state: S) {
        lock(&self.inner).final_states.insert(state);
    }

    /// Apply a signal to the current state.
    ///
    /// On success the new state is returned. An undefined transition moves
    /// the machine to the error state and returns the rejected pair.
    pub fn do_transition(&self, signal: G) -> Result<S, Rejected<S, G>> {
        let outcome = {
            let mut inner = lock(&self.inner);
            let from = inner.current;
            match inner.table.get(&(from, signal)).copied() {
                Some(to) => {
                    inner.current = to;
                    Ok((from, to))
                }
                None => {
                    inner.current = self.error_state;
                    Err(Rejected { from, signal })
                }
            }
        };

        match outcome {
            Ok((from, to)) => {
                if let Some(notification) = &self.notification {
                    notification.on_transition_changed(from, signal, to);
                }
                Ok(to)
            }
            Err(rejected) => {
                if let Some(notification) = &self.notification {
                    notification.on_error_state_reached(rejected.from, rejected.signal);
                }
                Err(rejected)
            }
        }
    }

    /// Force the machine back to the start state without notification
    pub fn reset(&self) {
        lock(&self.inner).current = self.start_state;
    }

    pub fn current_state(&self) -> S {
        lock(&self.inner).current
    }

    pub fn is_in_error_state(&self) -> bool {
        lock(&self.inner).current == self.error_state
    }

    pub fn is_final_state(&self) -> bool {
        let inner = lock(&self.inner);
        inner.final_states.contains(&inner.current)
    }

    pub fn start_state(&self) -> S {
        self.start_state
    }

    pub fn error_state(&self) -> S {
        self.error_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Light {
        Off,
        On,
        Broken,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Switch {
        Press,
        Kick,
    }

    #[derive(Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl StateNotification<Light, Switch> for Recorder {
        fn on_transition_changed(&self, from: Light, signal: Switch, to: Light) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{:?}-{:?}->{:?}", from, signal, to));
        }

        fn on_error_state_reached(&self, from: Light, signal: Switch) {
            self.events
                .lock()
                .unwrap()
                .push(format!("{:?}-{:?}->!", from, signal));
        }
    }

    fn light() -> StateMachine<Light, Switch> {
        let sm = StateMachine::new(Light::Off, Light::Broken);
        assert!(sm.add_transition(Light::Off, Switch::Press, Light::On));
        assert!(sm.add_transition(Light::On, Switch::Press, Light::Off));
        sm
    }

    #[test]
    fn test_first_registration_wins() {
        let sm = light();
        assert!(!sm.add_transition(Light::Off, Switch::Press, Light::Broken));
        assert_eq!(sm.target(Light::Off, Switch::Press), Some(Light::On));
        assert_eq!(sm.do_transition(Switch::Press), Ok(Light::On));
    }

    #[test]
    fn test_undefined_transition_goes_to_error_state() {
        let sm = light();
        let rejected = sm.do_transition(Switch::Kick).unwrap_err();
        assert_eq!(
            rejected,
            Rejected {
                from: Light::Off,
                signal: Switch::Kick
            }
        );
        assert_eq!(sm.current_state(), Light::Broken);
        assert!(sm.is_in_error_state());

        // The error state has no transitions of its own here, so it stays put
        assert!(sm.do_transition(Switch::Press).is_err());
        assert_eq!(sm.current_state(), Light::Broken);
    }

    #[test]
    fn test_reset_returns_to_start() {
        let sm = light();
        sm.do_transition(Switch::Kick).unwrap_err();
        sm.reset();
        assert_eq!(sm.current_state(), Light::Off);
        assert!(!sm.is_in_error_state());
    }

    #[test]
    fn test_final_states() {
        let sm = light();
        sm.add_final_state(Light::Off);
        assert!(sm.is_final_state());
        sm.do_transition(Switch::Press).unwrap();
        assert!(!sm.is_final_state());
    }

    #[test]
    fn test_notifications() {
        let recorder = Recorder::default();
        let events = Arc::clone(&recorder.events);
        let sm = light().with_notification(Box::new(recorder));

        sm.do_transition(Switch::Press).unwrap();
        sm.do_transition(Switch::Kick).unwrap_err();
        sm.reset();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["Off-Press->On".to_string(), "On-Kick->!".to_string()]
        );
    }

    #[test]
    fn test_concurrent_signals_are_serialized() {
        let sm = Arc::new(StateMachine::new(0u32, u32::MAX));
        for state in 0..1000u32 {
            sm.add_transition(state, (), state + 1);
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sm = Arc::clone(&sm);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        sm.do_transition(()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sm.current_state(), 1000);
    }
}
