//! Fixed-capacity ring buffer shared between one interrupt producer and the
//! main-loop consumer.
//!
//! The producer only touches the write cursor and its pending count. The
//! consumer owns the read cursor and the readable count, and moves pending
//! elements into the readable count inside a short critical section. When the
//! producer laps the consumer the oldest elements are overwritten and the
//! readable window becomes the newest `N` elements.
//!
//! Slots are atomics, so the whole structure can live in a `static` and be
//! written through a shared reference without `unsafe`.

use portable_atomic::{
    AtomicBool, AtomicI16, AtomicI32, AtomicI8, AtomicU16, AtomicU32, AtomicU8, AtomicUsize,
    Ordering,
};

/// Types that can be stored in a [`RingBuffer`] slot
pub trait Element: Copy {
    /// Atomic storage cell for one element
    type Slot;

    fn empty_slot() -> Self::Slot;
    fn load(slot: &Self::Slot) -> Self;
    fn store(slot: &Self::Slot, value: Self);
}

macro_rules! atomic_element {
    ($($ty:ty => $atomic:ty, $zero:expr;)*) => {
        $(
            impl Element for $ty {
                type Slot = $atomic;

                fn empty_slot() -> $atomic {
                    <$atomic>::new($zero)
                }

                fn load(slot: &$atomic) -> $ty {
                    slot.load(Ordering::Acquire)
                }

                fn store(slot: &$atomic, value: $ty) {
                    slot.store(value, Ordering::Release)
                }
            }
        )*
    };
}

atomic_element! {
    u8 => AtomicU8, 0;
    u16 => AtomicU16, 0;
    u32 => AtomicU32, 0;
    i8 => AtomicI8, 0;
    i16 => AtomicI16, 0;
    i32 => AtomicI32, 0;
    bool => AtomicBool, false;
}

/// Interrupt-safe circular buffer of capacity `N`
pub struct RingBuffer<T: Element, const N: usize> {
    slots: [T::Slot; N],
    /// Next slot the producer writes (producer-owned)
    write_cursor: AtomicUsize,
    /// Oldest readable slot (consumer-owned)
    read_cursor: AtomicUsize,
    /// Written but not yet handed to the consumer (producer increments)
    pending: AtomicUsize,
    /// Readable by the consumer, at most `N`
    ready: AtomicUsize,
}

impl<T: Element, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element, const N: usize> RingBuffer<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            slots: core::array::from_fn(|_| T::empty_slot()),
            write_cursor: AtomicUsize::new(0),
            read_cursor: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
            ready: AtomicUsize::new(0),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append one element (producer side)
    ///
    /// Never blocks and never fails; a full buffer loses its oldest element.
    pub fn write(&self, value: T) {
        let cursor = self.write_cursor.load(Ordering::Relaxed);
        T::store(&self.slots[cursor], value);
        self.write_cursor
            .store((cursor + 1) % N, Ordering::Release);
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    /// Append every element of `values` (producer side)
    pub fn write_slice(&self, values: &[T]) {
        for value in values {
            self.write(*value);
        }
    }

    /// Number of readable elements (consumer side)
    ///
    /// Moves the producer's pending count into the readable window first.
    pub fn available(&self) -> usize {
        if self.pending.load(Ordering::Acquire) > 0 {
            critical_section::with(|_| {
                let pending = self.pending.swap(0, Ordering::AcqRel);
                let total = self.ready.load(Ordering::Relaxed) + pending;
                if total > N {
                    let lost = total - N;
                    let read = self.read_cursor.load(Ordering::Relaxed);
                    self.read_cursor
                        .store((read + lost) % N, Ordering::Relaxed);
                    self.ready.store(N, Ordering::Release);
                } else {
                    self.ready.store(total, Ordering::Release);
                }
            });
        }
        self.ready.load(Ordering::Acquire)
    }

    /// Element `offset` places after the read cursor, without consuming it
    ///
    /// Only the window reported by the last [`available`](Self::available)
    /// call is visible.
    pub fn peek(&self, offset: usize) -> Option<T> {
        if offset >= self.ready.load(Ordering::Acquire) {
            return None;
        }
        let read = self.read_cursor.load(Ordering::Acquire);
        Some(T::load(&self.slots[(read + offset) % N]))
    }

    /// Copy the first `out.len()` readable elements without consuming them
    ///
    /// Returns `false` (and copies nothing) if fewer are readable.
    pub fn peek_into(&self, out: &mut [T]) -> bool {
        if out.len() > self.ready.load(Ordering::Acquire) {
            return false;
        }
        let read = self.read_cursor.load(Ordering::Acquire);
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = T::load(&self.slots[(read + i) % N]);
        }
        true
    }

    /// Discard up to `n` readable elements, returning how many were dropped
    pub fn flush(&self, n: usize) -> usize {
        let ready = self.ready.load(Ordering::Acquire);
        let n = n.min(ready);
        if n > 0 {
            let read = self.read_cursor.load(Ordering::Relaxed);
            self.read_cursor.store((read + n) % N, Ordering::Release);
            self.ready.store(ready - n, Ordering::Release);
        }
        n
    }

    /// Consume the oldest element
    pub fn read(&self) -> Option<T> {
        if self.available() == 0 {
            return None;
        }
        let value = self.peek(0);
        self.flush(1);
        value
    }

    /// Drop everything and rewind both cursors
    pub fn reset(&self) {
        critical_section::with(|_| {
            self.write_cursor.store(0, Ordering::Relaxed);
            self.read_cursor.store(0, Ordering::Relaxed);
            self.pending.store(0, Ordering::Relaxed);
            self.ready.store(0, Ordering::Release);
        });
    }

    #[cfg(test)]
    fn cursors(&self) -> (usize, usize) {
        (
            self.write_cursor.load(Ordering::Relaxed),
            self.read_cursor.load(Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::vec::Vec;

    #[test]
    fn test_fifo_order() {
        let ring: RingBuffer<u8, 4> = RingBuffer::new();
        ring.write_slice(&[1, 2, 3]);

        assert_eq!(ring.available(), 3);
        assert_eq!(ring.peek(2), Some(3));
        assert_eq!(ring.peek(3), None);
        assert_eq!(ring.read(), Some(1));
        assert_eq!(ring.read(), Some(2));
        assert_eq!(ring.available(), 1);
    }

    #[test]
    fn test_overwrite_keeps_newest() {
        let ring: RingBuffer<u8, 4> = RingBuffer::new();
        ring.write_slice(&[1, 2, 3, 4, 5, 6]);

        assert_eq!(ring.available(), 4);
        let mut window = [0u8; 4];
        assert!(ring.peek_into(&mut window));
        assert_eq!(window, [3, 4, 5, 6]);
    }

    #[test]
    fn test_flush_clamps_to_readable() {
        let ring: RingBuffer<u8, 8> = RingBuffer::new();
        ring.write_slice(&[9, 8]);
        assert_eq!(ring.available(), 2);

        assert_eq!(ring.flush(5), 2);
        assert_eq!(ring.available(), 0);
        assert_eq!(ring.flush(1), 0);
        assert_eq!(ring.read(), None);
    }

    #[test]
    fn test_peek_only_sees_folded_window() {
        let ring: RingBuffer<u8, 8> = RingBuffer::new();
        ring.write(1);
        assert_eq!(ring.peek(0), None);
        assert_eq!(ring.available(), 1);
        assert_eq!(ring.peek(0), Some(1));
    }

    #[test]
    fn test_peek_into_requires_enough_data() {
        let ring: RingBuffer<u8, 8> = RingBuffer::new();
        ring.write_slice(&[1, 2]);
        ring.available();

        let mut out = [0u8; 3];
        assert!(!ring.peek_into(&mut out));
        assert_eq!(out, [0, 0, 0]);
    }

    #[test]
    fn test_reset() {
        let ring: RingBuffer<i16, 3> = RingBuffer::new();
        ring.write_slice(&[-1, -2]);
        ring.available();
        ring.write(-3);
        ring.reset();

        assert_eq!(ring.available(), 0);
        assert_eq!(ring.cursors(), (0, 0));
        ring.write(7);
        assert_eq!(ring.read(), Some(7));
    }

    #[test]
    fn test_non_byte_elements() {
        let flags: RingBuffer<bool, 2> = RingBuffer::new();
        flags.write(true);
        assert_eq!(flags.read(), Some(true));

        let words: RingBuffer<u32, 2> = RingBuffer::new();
        words.write(0xDEAD_BEEF);
        assert_eq!(words.read(), Some(0xDEAD_BEEF));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Write(Vec<u8>),
        Flush(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::collection::vec(any::<u8>(), 0..20).prop_map(Op::Write),
            (0usize..20).prop_map(Op::Flush),
        ]
    }

    proptest! {
        #[test]
        fn matches_bounded_queue_model(ops in proptest::collection::vec(op(), 1..40)) {
            const CAP: usize = 8;
            let ring: RingBuffer<u8, CAP> = RingBuffer::new();
            let mut model: VecDeque<u8> = VecDeque::new();

            for op in ops {
                match op {
                    Op::Write(bytes) => {
                        ring.write_slice(&bytes);
                        for b in bytes {
                            if model.len() == CAP {
                                model.pop_front();
                            }
                            model.push_back(b);
                        }
                    }
                    Op::Flush(n) => {
                        let before = ring.available();
                        let dropped = ring.flush(n);
                        prop_assert_eq!(dropped, n.min(before));
                        prop_assert_eq!(ring.available(), before - dropped);
                        for _ in 0..dropped {
                            model.pop_front();
                        }
                    }
                }

                prop_assert_eq!(ring.available(), model.len());
                prop_assert!(ring.available() <= CAP);
                let (write, read) = ring.cursors();
                prop_assert!(write < CAP && read < CAP);
                for (i, expected) in model.iter().enumerate() {
                    prop_assert_eq!(ring.peek(i), Some(*expected));
                }
            }
        }

        #[test]
        fn overfill_loses_only_oldest(data in proptest::collection::vec(any::<u8>(), 0..64)) {
            let ring: RingBuffer<u8, 16> = RingBuffer::new();
            ring.write_slice(&data);

            let kept = data.len().min(16);
            prop_assert_eq!(ring.available(), kept);
            let mut drained = Vec::new();
            while let Some(b) = ring.read() {
                drained.push(b);
            }
            prop_assert_eq!(&drained[..], &data[data.len() - kept..]);
        }
    }
}
