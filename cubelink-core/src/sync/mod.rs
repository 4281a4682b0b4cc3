//! Primitives shared between interrupt handlers and the main loop
//!
//! - [`Semaphore`]: event counter, incremented from interrupt context,
//!   consumed one unit at a time by the main loop
//! - [`Shared`]: a `Copy` value behind a critical-section mutex
//! - [`RingBuffer`]: single-producer single-consumer byte/word queue

pub mod ring;

use core::cell::Cell;

use critical_section::{CriticalSection, Mutex};
use portable_atomic::{AtomicUsize, Ordering};

pub use ring::{Element, RingBuffer};

/// Counting semaphore for interrupt → main-loop notifications
///
/// `signal` is a single atomic increment and is safe from any context.
/// `take` decrements inside a critical section and never goes below zero.
#[derive(Debug)]
pub struct Semaphore {
    count: AtomicUsize,
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore {
    pub const fn new() -> Self {
        Self {
            count: AtomicUsize::new(0),
        }
    }

    /// Record one pending unit of work
    pub fn signal(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of pending units
    pub fn pending(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Consume one unit; returns `false` if none was pending
    pub fn take(&self) -> bool {
        critical_section::with(|_| {
            let count = self.count.load(Ordering::Acquire);
            if count == 0 {
                return false;
            }
            self.count.store(count - 1, Ordering::Release);
            true
        })
    }
}

/// A `Copy` value shared with interrupt context
pub struct Shared<T: Copy> {
    inner: Mutex<Cell<T>>,
}

impl<T: Copy> Shared<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(value)),
        }
    }

    pub fn get(&self) -> T {
        critical_section::with(|cs| self.inner.borrow(cs).get())
    }

    pub fn set(&self, value: T) {
        critical_section::with(|cs| self.inner.borrow(cs).set(value));
    }

    /// Read-modify-write in one critical section, returning `f`'s result
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| self.update_in(cs, f))
    }

    /// Read-modify-write inside a critical section the caller already holds
    pub fn update_in<R>(&self, cs: CriticalSection<'_>, f: impl FnOnce(&mut T) -> R) -> R {
        let cell = self.inner.borrow(cs);
        let mut value = cell.get();
        let result = f(&mut value);
        cell.set(value);
        result
    }

    /// Read inside a critical section the caller already holds
    pub fn get_in(&self, cs: CriticalSection<'_>) -> T {
        self.inner.borrow(cs).get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_counts_and_floors_at_zero() {
        let sem = Semaphore::new();
        assert!(!sem.take());

        sem.signal();
        sem.signal();
        assert_eq!(sem.pending(), 2);

        assert!(sem.take());
        assert!(sem.take());
        assert!(!sem.take());
        assert_eq!(sem.pending(), 0);
    }

    #[test]
    fn test_shared_update_returns_result() {
        let shared = Shared::new(10u32);
        let doubled = shared.update(|v| {
            *v *= 2;
            *v
        });
        assert_eq!(doubled, 20);
        assert_eq!(shared.get(), 20);

        shared.set(3);
        assert_eq!(critical_section::with(|cs| shared.get_in(cs)), 3);
    }
}
