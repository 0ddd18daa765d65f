//! Lock-free, wait-free SPSC ring queue.
//!
//! Grounded on `ucosm::RTMessageQueue` (original_source): relaxed load of
//! the producer's own index, acquire load of the consumer's index to test
//! fullness, release store to publish a write; symmetric on the consumer
//! side. Exactly one producer and one consumer may call into a given queue
//! concurrently — nothing here arbitrates more than that.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Single-producer, single-consumer ring buffer of `N` slots of `T`.
///
/// `N` must be a power of two (checked at first use of [`SpscQueue::new`],
/// via a const-evaluated assertion — a non-power-of-two `N` is a compile
/// error). `T` must be `Copy`: the queue stores messages by value and never
/// calls `Drop`, matching `RTMessageQueue`'s `is_trivially_copyable`
/// constraint.
pub struct SpscQueue<T: Copy, const N: usize> {
    buffer: UnsafeCell<[MaybeUninit<T>; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: `buffer` is only ever written by the single producer at `tail`
// and only ever read by the single consumer at `head`; the two indices
// never address the same slot for a write and an unsynchronized read at
// the same time because `try_send` publishes `tail` with `Release` after
// the write and `try_receive` only trusts slots strictly between `head`
// and the `Acquire`-loaded `tail`.
unsafe impl<T: Copy + Send, const N: usize> Sync for SpscQueue<T, N> {}

impl<T: Copy, const N: usize> SpscQueue<T, N> {
    const CAPACITY_IS_POWER_OF_TWO: () =
        assert!(N > 0 && (N & (N - 1)) == 0, "SpscQueue: N must be a power of two");

    /// Creates an empty queue.
    pub fn new() -> Self {
        let () = Self::CAPACITY_IS_POWER_OF_TWO;
        Self {
            buffer: UnsafeCell::new([MaybeUninit::uninit(); N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Attempts to enqueue `message`. Returns `false` without blocking if
    /// the queue is full.
    pub fn try_send(&self, message: T) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let next_tail = (tail + 1) & (N - 1);
        if next_tail == self.head.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: `tail` is owned exclusively by the single producer, and
        // the slot is not visible to the consumer until the release store
        // below publishes `next_tail`.
        unsafe {
            (*self.buffer.get())[tail] = MaybeUninit::new(message);
        }
        self.tail.store(next_tail, Ordering::Release);
        true
    }

    /// Attempts to dequeue one message into `message`. Returns `false`
    /// without blocking if the queue is empty.
    pub fn try_receive(&self, message: &mut T) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: `head` is owned exclusively by the single consumer, and
        // the producer never overwrites a slot before the consumer has
        // advanced `head` past it.
        *message = unsafe { (*self.buffer.get())[head].assume_init() };
        self.head.store((head + 1) & (N - 1), Ordering::Release);
        true
    }

    /// `true` iff no message is queued.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// `true` iff there is no room for another message.
    pub fn is_full(&self) -> bool {
        let next_tail = (self.tail.load(Ordering::Acquire) + 1) & (N - 1);
        next_tail == self.head.load(Ordering::Acquire)
    }

    /// Approximate number of queued messages. May be stale by the time the
    /// caller observes it if the other side is concurrently active.
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        (tail.wrapping_sub(head)) & (N - 1)
    }

    /// Drops all queued messages by fast-forwarding the consumer index to
    /// the producer's. Only safe to call when the consumer is not
    /// concurrently racing this queue (e.g. from the producer side while
    /// the consumer task is known to be unlinked).
    pub fn clear(&self) {
        self.head.store(self.tail.load(Ordering::Acquire), Ordering::Release);
    }
}

impl<T: Copy, const N: usize> Default for SpscQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_queue_is_empty() {
        let q: SpscQueue<u32, 4> = SpscQueue::new();
        assert!(q.is_empty());
        assert!(!q.is_full());
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn fifo_order_is_preserved() {
        let q: SpscQueue<u32, 4> = SpscQueue::new();
        assert!(q.try_send(1));
        assert!(q.try_send(2));
        assert!(q.try_send(3));
        let mut out = 0;
        assert!(q.try_receive(&mut out));
        assert_eq!(out, 1);
        assert!(q.try_receive(&mut out));
        assert_eq!(out, 2);
        assert!(q.try_receive(&mut out));
        assert_eq!(out, 3);
        assert!(!q.try_receive(&mut out));
    }

    #[test]
    fn full_queue_rejects_send_without_dropping_data() {
        let q: SpscQueue<u32, 4> = SpscQueue::new();
        // Capacity is N - 1 usable slots, matching the original's
        // `nextWrite == readIndex` fullness test.
        assert!(q.try_send(1));
        assert!(q.try_send(2));
        assert!(q.try_send(3));
        assert!(!q.try_send(4));
        assert!(q.is_full());

        let mut out = 0;
        assert!(q.try_receive(&mut out));
        assert_eq!(out, 1);
        assert!(q.try_send(4));
    }

    #[test]
    fn empty_receive_fails_without_mutating_output() {
        let q: SpscQueue<u32, 4> = SpscQueue::new();
        let mut out = 42;
        assert!(!q.try_receive(&mut out));
        assert_eq!(out, 42);
    }

    #[test]
    fn clear_drops_queued_messages() {
        let q: SpscQueue<u32, 4> = SpscQueue::new();
        q.try_send(1);
        q.try_send(2);
        q.clear();
        assert!(q.is_empty());
        let mut out = 0;
        assert!(!q.try_receive(&mut out));
    }

    #[test]
    fn producer_consumer_threads_see_every_message_once() {
        use std::thread;

        static Q: SpscQueue<u32, 1024> = SpscQueue {
            buffer: UnsafeCell::new([MaybeUninit::uninit(); 1024]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        };

        let producer = thread::spawn(|| {
            let mut sent = 0u32;
            while sent < 10_000 {
                if Q.try_send(sent) {
                    sent += 1;
                }
            }
        });
        let consumer = thread::spawn(|| {
            let mut expected = 0u32;
            let mut out = 0;
            while expected < 10_000 {
                if Q.try_receive(&mut out) {
                    assert_eq!(out, expected);
                    expected += 1;
                }
            }
        });
        producer.join().unwrap();
        consumer.join().unwrap();
    }
}
