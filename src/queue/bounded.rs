use super::{QueueError, QueueState};
use crate::codec::fixed;
use crate::segment::Segment;
use std::io;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub const DEFAULT_ITEM_SIZE: usize = fixed::DEFAULT_WIDTH;

/// Bounded FIFO queue over a raw shared memory segment.
///
/// One mutex guards the cursors and the segment bytes; producers wait on
/// `not_full`, consumers on `not_empty`. The primitives are process-local:
/// the queue protocol is safe for threads of one process only, even when the
/// backing segment is named and attachable from elsewhere.
pub struct SharedQueue {
    segment: Segment,
    capacity: usize,
    item_size: usize,
    state: Mutex<QueueState>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl SharedQueue {
    /// Anonymous segment, 4-byte slots.
    pub fn new(capacity: usize) -> Result<Self, QueueError> {
        Self::with_item_size(capacity, DEFAULT_ITEM_SIZE)
    }

    pub fn with_item_size(capacity: usize, item_size: usize) -> Result<Self, QueueError> {
        let len = validate(capacity, item_size)?;

        let segment =
            Segment::anon(len).map_err(|source| QueueError::Allocation { source })?;

        Ok(Self::from_parts(segment, capacity, item_size))
    }

    /// Creates the queue over a named segment, taking the creator/owner role.
    /// `close` removes the name; a taken name fails with `NameInUse`.
    pub fn create_named(
        name: &str,
        capacity: usize,
        item_size: usize,
    ) -> Result<Self, QueueError> {
        let len = validate(capacity, item_size)?;

        let segment = Segment::create(name, len).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                QueueError::NameInUse {
                    name: name.to_string(),
                }
            } else {
                QueueError::Allocation { source }
            }
        })?;

        Ok(Self::from_parts(segment, capacity, item_size))
    }

    fn from_parts(segment: Segment, capacity: usize, item_size: usize) -> Self {
        Self {
            segment,
            capacity,
            item_size,
            state: Mutex::new(QueueState {
                head: 0,
                tail: 0,
                size: 0,
                closed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    /// Blocks while the queue is full. A value that does not fit the slot
    /// width fails before any shared state is touched.
    pub fn enqueue(&self, item: i64) -> Result<(), QueueError> {
        let mut slot = [0u8; fixed::MAX_WIDTH];
        let slot = &mut slot[..self.item_size];
        fixed::encode(item, slot).map_err(QueueError::Encoding)?;

        let mut state = self.lock_state();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.size < self.capacity {
                break;
            }
            state = wait(&self.not_full, state);
        }

        self.commit_write(&mut state, slot);
        Ok(())
    }

    /// Like `enqueue`, but gives up with `Timeout` once `timeout` has passed
    /// without capacity becoming available.
    pub fn enqueue_timeout(&self, item: i64, timeout: Duration) -> Result<(), QueueError> {
        let mut slot = [0u8; fixed::MAX_WIDTH];
        let slot = &mut slot[..self.item_size];
        fixed::encode(item, slot).map_err(QueueError::Encoding)?;

        let deadline = Instant::now() + timeout;
        let mut state = self.lock_state();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.size < self.capacity {
                break;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(QueueError::Timeout { waited: timeout });
            };
            state = wait_timeout(&self.not_full, state, remaining);
        }

        self.commit_write(&mut state, slot);
        Ok(())
    }

    /// Blocks while the queue is empty; returns items in enqueue order.
    pub fn dequeue(&self) -> Result<i64, QueueError> {
        let mut state = self.lock_state();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.size > 0 {
                break;
            }
            state = wait(&self.not_empty, state);
        }

        self.commit_read(&mut state)
    }

    /// Like `dequeue`, but gives up with `Timeout` once `timeout` has passed
    /// without an item arriving.
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<i64, QueueError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock_state();
        loop {
            if state.closed {
                return Err(QueueError::Closed);
            }
            if state.size > 0 {
                break;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Err(QueueError::Timeout { waited: timeout });
            };
            state = wait_timeout(&self.not_empty, state, remaining);
        }

        self.commit_read(&mut state)
    }

    /// Shuts the queue down: every blocked producer and consumer wakes with
    /// `Closed`, further operations fail with `Closed`, and the segment name
    /// (if any) is removed so it can be reused. Idempotent. The mapping itself
    /// is released on drop.
    pub fn close(&self) {
        let mut state = self.lock_state();
        if state.closed {
            return;
        }
        state.closed = true;
        drop(state);

        self.not_full.notify_all();
        self.not_empty.notify_all();

        let _ = self.segment.unlink();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    pub fn len(&self) -> usize {
        self.lock_state().size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    pub fn segment_len(&self) -> usize {
        self.segment.len()
    }

    pub fn segment_name(&self) -> Option<&str> {
        self.segment.name()
    }

    fn commit_write(&self, state: &mut QueueState, slot: &[u8]) {
        let offset = state.tail * self.item_size;
        unsafe { self.segment.write_slot(offset, slot) };
        state.tail = (state.tail + 1) % self.capacity;
        state.size += 1;
        self.not_empty.notify_one();
    }

    fn commit_read(&self, state: &mut QueueState) -> Result<i64, QueueError> {
        let mut slot = [0u8; fixed::MAX_WIDTH];
        let slot = &mut slot[..self.item_size];
        let offset = state.head * self.item_size;
        unsafe { self.segment.read_slot(offset, slot) };
        let item = fixed::decode(slot).map_err(QueueError::Decoding)?;
        state.head = (state.head + 1) % self.capacity;
        state.size -= 1;
        self.not_full.notify_one();
        Ok(item)
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // No panic can occur between a slot write and its cursor update, so a
        // poisoned guard still protects consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate(capacity: usize, item_size: usize) -> Result<usize, QueueError> {
    if capacity == 0 {
        return Err(QueueError::InvalidCapacity {
            capacity,
            reason: "must be positive",
        });
    }
    if !fixed::is_supported(item_size) {
        return Err(QueueError::InvalidItemSize {
            item_size,
            reason: "must be 1, 2, 4, or 8 bytes",
        });
    }
    capacity
        .checked_mul(item_size)
        .ok_or(QueueError::InvalidCapacity {
            capacity,
            reason: "segment length overflows",
        })
}

fn wait<'a>(
    cv: &Condvar,
    guard: MutexGuard<'a, QueueState>,
) -> MutexGuard<'a, QueueState> {
    cv.wait(guard).unwrap_or_else(PoisonError::into_inner)
}

fn wait_timeout<'a>(
    cv: &Condvar,
    guard: MutexGuard<'a, QueueState>,
    timeout: Duration,
) -> MutexGuard<'a, QueueState> {
    let (guard, _) = cv
        .wait_timeout(guard, timeout)
        .unwrap_or_else(PoisonError::into_inner);
    guard
}
