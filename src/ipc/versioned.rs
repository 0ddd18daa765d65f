//! Versioned shared variable.
//!
//! Grounded on `ucosm::RTSharedVariable` (original_source): a value atomic
//! paired with a version counter that only advances when the value
//! actually changes, plus the "read version, read value, read version
//! again" loop a reader uses to detect a torn read.
//!
//! Uses [`portable_atomic::Atomic<T>`] rather than `core::sync::atomic`'s
//! fixed set of widths so `T` can be any small `Copy` payload (a sensor
//! reading, a control word) rather than only `u8`/`u16`/`u32`/`u64`, and so
//! the type keeps working on targets whose native atomics don't cover the
//! width of `T` (`portable-atomic` falls back to a critical-section
//! emulation there, same guarantee, narrower lock-free window).

use portable_atomic::{AtomicU32, Ordering};

/// A `T` published by one writer and observed consistently by any number
/// of readers, without a lock.
///
/// `T` must be `Copy` (no drop glue runs across the atomic swap) and
/// `PartialEq` (`store` only bumps the version when the value changes, per
/// `RTSharedVariable::store`'s `while (expected != newValue)` loop).
pub struct VersionedVar<T: Copy> {
    version: AtomicU32,
    value: portable_atomic::Atomic<T>,
}

impl<T: Copy + PartialEq> VersionedVar<T> {
    /// Creates a variable holding `initial` at version 0.
    pub fn new(initial: T) -> Self {
        Self {
            version: AtomicU32::new(0),
            value: portable_atomic::Atomic::new(initial),
        }
    }

    /// Publishes `new_value`. A no-op (version unchanged) if `new_value`
    /// equals the value already stored.
    pub fn store(&self, new_value: T) {
        let mut expected = self.value.load(Ordering::Relaxed);
        while expected != new_value {
            match self.value.compare_exchange_weak(
                expected,
                new_value,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    self.version.fetch_add(1, Ordering::Release);
                    break;
                }
                Err(actual) => expected = actual,
            }
        }
    }

    /// Reads the current value without a version check.
    pub fn load(&self) -> T {
        self.value.load(Ordering::Acquire)
    }

    /// Reads the value and the version it was observed at, retrying until
    /// the version is stable around the value load (§3 "Invariant: if a
    /// reader observes version V twice around its load of the value, it
    /// holds a consistent pair").
    pub fn load_with_version(&self) -> (T, u32) {
        loop {
            let before = self.version.load(Ordering::Acquire);
            let value = self.value.load(Ordering::Acquire);
            let after = self.version.load(Ordering::Acquire);
            if before == after {
                return (value, after);
            }
        }
    }

    /// Current version number. Increments by one on every value change.
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    /// `true` iff the version has advanced past `last_version` — a cheap
    /// check a reader can use to skip [`Self::load_with_version`] when
    /// nothing changed.
    pub fn has_changed(&self, last_version: u32) -> bool {
        self.version.load(Ordering::Acquire) != last_version
    }

    /// Atomically swaps the value if it still equals `*expected`. On
    /// failure `*expected` is updated to the value actually observed, so
    /// the caller can retry without a separate load (mirrors
    /// `compare_exchange`'s `Err` payload).
    pub fn compare_and_swap(&self, expected: &mut T, desired: T) -> bool {
        match self
            .value
            .compare_exchange(*expected, desired, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.version.fetch_add(1, Ordering::AcqRel);
                true
            }
            Err(actual) => {
                *expected = actual;
                false
            }
        }
    }
}

impl<T: Copy + PartialEq + Default> Default for VersionedVar<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
