use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::error::{SessionError, SessionResult};
use super::events::{EventHub, MemoryEvent, SessionState};
use super::frame::Frame;
use super::lock::lock_mutex;
use super::logging::{ComponentLogger, LogContext};
use super::ringbuffer::{FrameRingBuffer, usage_percent};
use super::timestamp::utc_ns_now;
use super::{FrameCodec, SharedSource};
use crate::producers::wait::StopWait;

pub const DEFAULT_CAPTURE_CADENCE: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Captured { seq: u64, len: usize },
    Unavailable,
    Late,
}

#[derive(Default)]
struct TickCounters {
    captured: AtomicU64,
    unavailable: AtomicU64,
    late: AtomicU64,
    skipped: AtomicU64,
    consecutive_unavailable: AtomicU64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulerStats {
    pub captured: u64,
    pub unavailable: u64,
    pub late: u64,
    pub skipped: u64,
    pub consecutive_unavailable: u64,
}

struct TickWorker {
    stop: Arc<StopWait>,
    handle: JoinHandle<()>,
    source_id: String,
}

/// Everything one tick needs. Moved into the worker thread.
struct TickContext {
    ring: Arc<FrameRingBuffer>,
    codec: Arc<Mutex<Box<dyn FrameCodec>>>,
    events: Arc<EventHub>,
    source: SharedSource,
    next_seq: Arc<AtomicU64>,
    counters: Arc<TickCounters>,
    cadence: Duration,
    stall_after: u64,
}

impl TickContext {
    fn tick(&self) -> TickOutcome {
        let started = Instant::now();
        let image = {
            let mut codec = lock_mutex(&self.codec, "CaptureScheduler::tick(codec)");
            let mut source = lock_mutex(&self.source, "CaptureScheduler::tick(source)");
            codec.capture(&mut **source)
        };

        let Some(image) = image else {
            self.counters.unavailable.fetch_add(1, Ordering::Relaxed);
            let consecutive = self
                .counters
                .consecutive_unavailable
                .fetch_add(1, Ordering::Relaxed)
                + 1;
            if self.stall_after > 0 && consecutive == self.stall_after {
                log::warn!(
                    "[capture] source produced no pixels for {} consecutive ticks",
                    consecutive
                );
                self.events.publish(MemoryEvent::CaptureStalled { consecutive });
            } else {
                log::debug!("[capture] source not ready, tick skipped");
            }
            return TickOutcome::Unavailable;
        };
        self.counters.consecutive_unavailable.store(0, Ordering::Relaxed);

        // Zu spät fertig => verwerfen statt nachreichen
        let elapsed = started.elapsed();
        if elapsed > self.cadence {
            self.counters.late.fetch_add(1, Ordering::Relaxed);
            log::warn!(
                "[capture] capture took {:?} (cadence {:?}), frame discarded",
                elapsed,
                self.cadence
            );
            return TickOutcome::Late;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let len = self.ring.push(Frame::new(seq, utc_ns_now(), image));
        self.counters.captured.fetch_add(1, Ordering::Relaxed);
        self.events.publish(MemoryEvent::UsageChanged {
            percent: usage_percent(len, self.ring.capacity()),
        });

        TickOutcome::Captured { seq, len }
    }

    fn run(self, stop: Arc<StopWait>) {
        let mut next_tick = Instant::now() + self.cadence;
        loop {
            if stop.wait_until(next_tick) {
                break;
            }
            self.tick();

            // Verpasste Slots werden nicht nachgeholt
            let now = Instant::now();
            next_tick += self.cadence;
            while next_tick <= now {
                next_tick += self.cadence;
                self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Drives periodic capture into the ring buffer and owns the
/// `Idle`/`Recording` state.
///
/// At most one worker thread exists at a time. `start`, `restart` and `stop`
/// cancel and join the previous worker before returning, so two ticks never
/// race on the buffer.
pub struct CaptureScheduler {
    ring: Arc<FrameRingBuffer>,
    codec: Arc<Mutex<Box<dyn FrameCodec>>>,
    events: Arc<EventHub>,
    cadence: Duration,
    stall_after: u64,
    next_seq: Arc<AtomicU64>,
    counters: Arc<TickCounters>,
    worker: Option<TickWorker>,
    /// Recording, but between two sources: no worker ticks.
    paused: bool,
}

impl CaptureScheduler {
    pub fn new(
        ring: Arc<FrameRingBuffer>,
        codec: Box<dyn FrameCodec>,
        events: Arc<EventHub>,
        cadence: Duration,
        stall_after: u64,
    ) -> Self {
        Self {
            ring,
            codec: Arc::new(Mutex::new(codec)),
            events,
            cadence,
            stall_after,
            next_seq: Arc::new(AtomicU64::new(1)),
            counters: Arc::new(TickCounters::default()),
            worker: None,
            paused: false,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.is_recording() {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.worker.is_some() || self.paused
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// `Idle -> Recording`. Calling it while recording replaces the source.
    pub fn start(&mut self, source: SharedSource) {
        let was_recording = self.halt();
        self.spawn_worker(source);
        if !was_recording {
            self.info(&format!("recording started, cadence {:?}", self.cadence));
            self.events.publish(MemoryEvent::StateChanged {
                state: SessionState::Recording,
            });
        }
    }

    /// Swaps the source of an active recording without touching the buffer.
    pub fn restart(&mut self, source: SharedSource) -> SessionResult<()> {
        if !self.is_recording() {
            return Err(SessionError::NotRecording);
        }
        self.halt();
        self.spawn_worker(source);
        self.info("recording resumed on new source");
        Ok(())
    }

    /// Stops ticking while staying `Recording`, e.g. while the next source is
    /// being acquired. Only `restart` or `stop` leave this state.
    pub fn pause(&mut self) {
        if self.cancel_worker() {
            self.paused = true;
            self.debug("ticking paused");
        }
    }

    /// `Recording -> Idle`. Idempotent; the buffer keeps its frames.
    pub fn stop(&mut self) {
        if self.halt() {
            self.info("recording stopped");
            self.events.publish(MemoryEvent::StateChanged {
                state: SessionState::Idle,
            });
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            captured: self.counters.captured.load(Ordering::Relaxed),
            unavailable: self.counters.unavailable.load(Ordering::Relaxed),
            late: self.counters.late.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            consecutive_unavailable: self.counters.consecutive_unavailable.load(Ordering::Relaxed),
        }
    }

    fn context(&self, source: SharedSource) -> TickContext {
        TickContext {
            ring: self.ring.clone(),
            codec: self.codec.clone(),
            events: self.events.clone(),
            source,
            next_seq: self.next_seq.clone(),
            counters: self.counters.clone(),
            cadence: self.cadence,
            stall_after: self.stall_after,
        }
    }

    fn spawn_worker(&mut self, source: SharedSource) {
        let source_id = lock_mutex(&source, "CaptureScheduler::spawn_worker")
            .id()
            .to_string();
        self.counters.consecutive_unavailable.store(0, Ordering::Relaxed);

        let ctx = self.context(source);
        let stop = Arc::new(StopWait::new());
        let worker_stop = stop.clone();
        let handle = std::thread::spawn(move || ctx.run(worker_stop));

        self.worker = Some(TickWorker {
            stop,
            handle,
            source_id,
        });
        self.debug("tick worker spawned");
    }

    /// Ends ticking and any pause. Returns whether the scheduler was recording.
    fn halt(&mut self) -> bool {
        let was_paused = std::mem::take(&mut self.paused);
        self.cancel_worker() || was_paused
    }

    /// Cancels and joins the current worker. Returns whether one was running.
    fn cancel_worker(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };
        worker.stop.cancel();
        if worker.handle.join().is_err() {
            self.error(&format!("tick worker for '{}' panicked", worker.source_id));
        }
        true
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        self.cancel_worker();
    }
}

impl ComponentLogger for CaptureScheduler {
    fn log_context(&self) -> LogContext {
        let instance = self
            .worker
            .as_ref()
            .map(|w| w.source_id.as_str())
            .unwrap_or(if self.paused { "paused" } else { "idle" });
        LogContext::new("Scheduler", instance)
    }
}
