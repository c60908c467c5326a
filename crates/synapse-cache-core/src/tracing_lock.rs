// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Tracing RwLock wrapper that logs lock acquisitions and releases
//!
//! When the `lock-tracing` feature is disabled this is a zero-overhead wrapper
//! around `parking_lot::RwLock`.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "lock-tracing")]
use std::thread;
#[cfg(feature = "lock-tracing")]
use std::time::{Duration, Instant};
#[cfg(feature = "lock-tracing")]
use tracing::{trace, warn};

/// Waits or holds longer than this are logged at warn level
#[cfg(feature = "lock-tracing")]
const SLOW_LOCK: Duration = Duration::from_millis(5);

/// A `RwLock<T>` that conditionally logs lock traffic under a fixed name
pub struct TracingRwLock<T> {
    inner: RwLock<T>,
    #[cfg(feature = "lock-tracing")]
    name: &'static str,
}

impl<T> TracingRwLock<T> {
    /// Name is only used when `lock-tracing` is enabled
    pub fn new(value: T, _name: &'static str) -> Self {
        Self {
            inner: RwLock::new(value),
            #[cfg(feature = "lock-tracing")]
            name: _name,
        }
    }

    /// Acquire shared access
    #[cfg(not(feature = "lock-tracing"))]
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Acquire exclusive access
    #[cfg(not(feature = "lock-tracing"))]
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Acquire shared access, logging slow acquisitions
    #[cfg(feature = "lock-tracing")]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        let start = Instant::now();
        let guard = self.inner.read();
        let wait = start.elapsed();
        if wait > SLOW_LOCK {
            warn!(
                "[LOCK-TRACE] {}: Thread {:?} acquired read lock after {:.2}ms wait (SLOW)",
                self.name,
                thread::current().id(),
                wait.as_secs_f64() * 1000.0
            );
        }
        guard
    }

    /// Acquire exclusive access, logging the wait and, on release, the hold time
    #[cfg(feature = "lock-tracing")]
    pub fn write(&self) -> TracingWriteGuard<'_, T> {
        let start = Instant::now();
        let guard = self.inner.write();
        let acquired = Instant::now();
        let wait = acquired.duration_since(start);
        if wait > SLOW_LOCK {
            warn!(
                "[LOCK-TRACE] {}: Thread {:?} acquired write lock after {:.2}ms wait (SLOW)",
                self.name,
                thread::current().id(),
                wait.as_secs_f64() * 1000.0
            );
        } else {
            trace!(
                "[LOCK-TRACE] {}: Thread {:?} acquired write lock ({:.2}ms wait)",
                self.name,
                thread::current().id(),
                wait.as_secs_f64() * 1000.0
            );
        }
        TracingWriteGuard {
            guard,
            name: self.name,
            acquired,
        }
    }
}

/// Write guard that logs the hold time when dropped
#[cfg(feature = "lock-tracing")]
pub struct TracingWriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
    name: &'static str,
    acquired: Instant,
}

#[cfg(feature = "lock-tracing")]
impl<T> std::ops::Deref for TracingWriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

#[cfg(feature = "lock-tracing")]
impl<T> std::ops::DerefMut for TracingWriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

#[cfg(feature = "lock-tracing")]
impl<T> Drop for TracingWriteGuard<'_, T> {
    fn drop(&mut self) {
        let held = self.acquired.elapsed();
        if held > SLOW_LOCK {
            warn!(
                "[LOCK-TRACE] {}: Thread {:?} RELEASED write lock (held for {:.2}ms)",
                self.name,
                thread::current().id(),
                held.as_secs_f64() * 1000.0
            );
        } else {
            trace!(
                "[LOCK-TRACE] {}: Thread {:?} RELEASED write lock (held for {:.2}ms)",
                self.name,
                thread::current().id(),
                held.as_secs_f64() * 1000.0
            );
        }
    }
}
