//! Single-producer/single-consumer input byte queue.
//!
//! Bridges an asynchronous producer (typically an interrupt handler feeding
//! received bytes) and the synchronous consumer draining the shell's run
//! step. Both sides operate through `&self`, so one shared reference can
//! live in interrupt context while another drives the main loop.
//!
//! The queue is lock-free: the producer writes only the head index, the
//! consumer writes only the tail index, and index updates are published with
//! release stores paired with acquire loads. Slots are `AtomicU8` so the
//! whole structure stays free of `unsafe`.
//!
//! Capacity is a power of two so wraparound is a bitmask; one slot is kept
//! empty to distinguish full from empty, leaving room for
//! [`QUEUE_SIZE`]` - 1` pending bytes.

use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Number of slots in the input queue. Must be a power of two.
pub const QUEUE_SIZE: usize = 64;

const MASK: usize = QUEUE_SIZE - 1;

const _: () = assert!(QUEUE_SIZE.is_power_of_two());

/// Fixed-capacity circular byte queue with single-producer/single-consumer
/// discipline.
///
/// Exactly one execution context may call [`push`](Self::push) and exactly
/// one may call [`pop`](Self::pop); the two may run concurrently. Typical
/// use is a `static` instance shared between an interrupt handler and the
/// main loop:
///
/// ```rust
/// use nanoshell::queue::InputQueue;
///
/// static QUEUE: InputQueue = InputQueue::new();
///
/// // interrupt context
/// QUEUE.push(b'x');
///
/// // main loop
/// assert_eq!(QUEUE.pop(), Some(b'x'));
/// ```
pub struct InputQueue {
    slots: [AtomicU8; QUEUE_SIZE],
    /// Producer-owned write index.
    head: AtomicUsize,
    /// Consumer-owned read index.
    tail: AtomicUsize,
}

impl InputQueue {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; QUEUE_SIZE],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Enqueue one byte from the producer side.
    ///
    /// Returns `false` without modifying the queue when it is full; the
    /// producer must not block, so dropping the byte (and optionally
    /// counting the overflow) is the caller's decision.
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) & MASK;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        self.slots[head].store(byte, Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        true
    }

    /// Dequeue one byte from the consumer side, or `None` when empty.
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.slots[tail].load(Ordering::Relaxed);
        self.tail.store((tail + 1) & MASK, Ordering::Release);
        Some(byte)
    }

    /// Number of bytes currently queued (consumer-side view).
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail) & MASK
    }

    /// `true` when no bytes are queued (consumer-side view).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InputQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputQueue")
            .field("len", &self.len())
            .field("capacity", &(QUEUE_SIZE - 1))
            .finish()
    }
}
