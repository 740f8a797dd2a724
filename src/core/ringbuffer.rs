use std::collections::VecDeque;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

use super::frame::Frame;
use super::lock::{lock_read, lock_write};
use super::logging::{ComponentLogger, LogContext};

const HIGH_WATER_PERCENT: u8 = 90;
// Darüber wächst die Deque erst beim Füllen
const PREALLOC_FRAMES: usize = 1024;

/// Capacity-bounded, FIFO-evicting store of captured frames.
///
/// One writer (the capture tick) and any number of readers. Eviction and
/// insertion happen under the same write guard, so a reader never observes
/// more than `capacity` entries or a half-shifted window.
pub struct FrameRingBuffer {
    capacity: usize,
    entries: RwLock<VecDeque<Frame>>,
    pushed: AtomicU64,
    evicted: AtomicU64,
    high_water: AtomicBool,
}

impl FrameRingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(PREALLOC_FRAMES))),
            pushed: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            high_water: AtomicBool::new(false),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a frame, evicting the oldest entry first when full.
    /// Returns the number of frames held afterwards.
    pub fn push(&self, frame: Frame) -> usize {
        let seq = frame.seq();
        let (len, evicted) = {
            let mut entries = lock_write(&self.entries, "FrameRingBuffer::push");
            debug_assert!(
                entries.back().is_none_or(|last| last.seq() < seq),
                "frames must be pushed in capture order"
            );
            let evicted = if entries.len() == self.capacity {
                entries.pop_front()
            } else {
                None
            };
            entries.push_back(frame);
            (entries.len(), evicted)
        };

        let pushed = self.pushed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(old) = evicted {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            if pushed % 50 == 0 {
                self.debug(&format!("evicted seq={} for seq={}", old.seq(), seq));
            }
        }

        if pushed <= 5 || pushed % 50 == 0 {
            self.debug(&format!("push[seq={}] len={}/{}", seq, len, self.capacity));
        }

        let usage = usage_percent(len, self.capacity);
        if usage >= HIGH_WATER_PERCENT {
            if !self.high_water.swap(true, Ordering::Relaxed) {
                self.debug(&format!("buffer {}% full, oldest frames now rotate out", usage));
            }
        } else {
            self.high_water.store(false, Ordering::Relaxed);
        }

        len
    }

    /// Point-in-time copy of all entries, oldest first.
    pub fn snapshot(&self) -> Vec<Frame> {
        lock_read(&self.entries, "FrameRingBuffer::snapshot")
            .iter()
            .cloned()
            .collect()
    }

    /// Drops every entry. Only used on full teardown.
    pub fn clear(&self) {
        let dropped = {
            let mut entries = lock_write(&self.entries, "FrameRingBuffer::clear");
            let dropped = entries.len();
            entries.clear();
            dropped
        };
        self.high_water.store(false, Ordering::Relaxed);
        self.info(&format!("cleared {} frames", dropped));
    }

    pub fn len(&self) -> usize {
        lock_read(&self.entries, "FrameRingBuffer::len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fill level in percent, rounded half up.
    pub fn usage(&self) -> u8 {
        usage_percent(self.len(), self.capacity)
    }

    pub fn stats(&self) -> RingBufferStats {
        let entries = lock_read(&self.entries, "FrameRingBuffer::stats");
        RingBufferStats {
            capacity: self.capacity,
            current_frames: entries.len(),
            usage_percent: usage_percent(entries.len(), self.capacity),
            pushed: self.pushed.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            oldest_seq: entries.front().map(Frame::seq),
            newest_seq: entries.back().map(Frame::seq),
            oldest_utc_ns: entries.front().map(Frame::utc_ns),
            newest_utc_ns: entries.back().map(Frame::utc_ns),
        }
    }
}

pub fn usage_percent(len: usize, capacity: usize) -> u8 {
    if capacity == 0 {
        return 0;
    }
    let len = len.min(capacity) as u128;
    let capacity = capacity as u128;
    ((200 * len + capacity) / (2 * capacity)) as u8
}

#[derive(Debug, Clone, Serialize)]
pub struct RingBufferStats {
    pub capacity: usize,
    pub current_frames: usize,
    pub usage_percent: u8,
    pub pushed: u64,
    pub evicted: u64,
    pub oldest_seq: Option<u64>,
    pub newest_seq: Option<u64>,
    pub oldest_utc_ns: Option<u64>,
    pub newest_utc_ns: Option<u64>,
}

impl ComponentLogger for FrameRingBuffer {
    fn log_context(&self) -> LogContext {
        LogContext::new("RingBuffer", &format!("cap={}", self.capacity))
    }
}
