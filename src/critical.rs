//! Mutex protected cell for values shared between the receive loop, the
//! motion loop and the caller.

use std::sync::{Mutex, MutexGuard};

/// A single value behind a lock. Readers always get a consistent snapshot.
#[derive(Debug, Default)]
pub struct CriticalData<T> {
    data: Mutex<T>,
}

impl<T> CriticalData<T> {
    pub fn new(value: T) -> Self {
        Self {
            data: Mutex::new(value),
        }
    }

    /// Lock the cell. A panic on another thread while holding the lock does
    /// not make the value unusable.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        lock(&self.data)
    }

    pub fn set(&self, value: T) {
        *self.lock() = value;
    }
}

impl<T: Clone> CriticalData<T> {
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

/// Lock a mutex, recovering the guard if it was poisoned
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
