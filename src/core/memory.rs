use std::sync::Arc;

use crossbeam::channel::Receiver;
use serde::Serialize;

use super::error::SessionResult;
use super::events::{EventHub, MemoryEvent, SessionState};
use super::frame::Frame;
use super::logging::{ComponentLogger, LogContext};
use super::ringbuffer::FrameRingBuffer;
use super::sampler::sample;
use super::scheduler::{CaptureScheduler, SchedulerStats};
use super::source::{FacingMode, SourceManager};
use super::timestamp::{format_utc_ns, utc_ms_now};
use super::{FrameCodec, SourceProvider};
use crate::config::MemoryConfig;

/// Observable snapshot of a capture session.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStatus {
    pub session_id: String,
    pub state: SessionState,
    pub mode: FacingMode,
    pub usage_percent: u8,
    pub frames: usize,
    pub capacity: usize,
    pub cadence_ms: u64,
    pub sample_stride: usize,
    pub scheduler: SchedulerStats,
    pub oldest_capture: Option<String>,
    pub newest_capture: Option<String>,
}

/// The short-horizon visual memory: a ring buffer fed by a capture scheduler
/// from whichever source the source manager currently holds.
///
/// Frames live only as long as this value. Dropping it stops capture,
/// releases the source and clears the buffer.
pub struct VisualMemory {
    session_id: String,
    ring: Arc<FrameRingBuffer>,
    events: Arc<EventHub>,
    scheduler: CaptureScheduler,
    sources: SourceManager,
    sample_stride: usize,
}

impl VisualMemory {
    pub fn new(
        config: &MemoryConfig,
        provider: Arc<dyn SourceProvider>,
        codec: Box<dyn FrameCodec>,
        mode: FacingMode,
    ) -> Self {
        let ring = Arc::new(FrameRingBuffer::new(config.capacity()));
        let events = Arc::new(EventHub::new());
        let scheduler = CaptureScheduler::new(
            ring.clone(),
            codec,
            events.clone(),
            config.cadence(),
            config.stall_after_ticks,
        );

        let memory = Self {
            session_id: format!("session-{}", utc_ms_now()),
            ring,
            events,
            scheduler,
            sources: SourceManager::new(provider, mode),
            sample_stride: config.sample_stride.max(1),
        };
        memory.info(&format!(
            "created: capacity={} cadence={:?} stride={}",
            memory.ring.capacity(),
            memory.scheduler.cadence(),
            memory.sample_stride
        ));
        memory
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Starts recording in the current facing mode.
    pub fn start(&mut self) -> SessionResult<()> {
        self.start_with(self.sources.mode())
    }

    pub fn start_with(&mut self, mode: FacingMode) -> SessionResult<()> {
        match self.sources.acquire(mode) {
            Ok(source) => {
                self.scheduler.start(source);
                Ok(())
            }
            Err(err) => {
                self.scheduler.stop();
                self.error(&format!("start failed: {}", err));
                Err(err.into())
            }
        }
    }

    /// Stops capture and releases the source. Buffered frames stay.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.sources.release();
    }

    /// Flips between user- and environment-facing capture, keeping every
    /// buffered frame.
    pub fn switch_mode(&mut self) -> SessionResult<FacingMode> {
        let before = self.sources.mode();
        let result = self.sources.switch_mode(&mut self.scheduler);
        let after = self.sources.mode();
        if after != before {
            self.events.publish(MemoryEvent::ModeChanged { mode: after });
        }
        if let Err(err) = &result {
            self.error(&format!("switch to '{}' failed: {}", after, err));
        }
        result
    }

    /// Full teardown: stop, release and forget every frame.
    pub fn teardown(&mut self) {
        self.stop();
        if !self.ring.is_empty() {
            self.ring.clear();
            self.events.publish(MemoryEvent::Cleared);
            self.events.publish(MemoryEvent::UsageChanged { percent: 0 });
        }
    }

    pub fn state(&self) -> SessionState {
        self.scheduler.state()
    }

    pub fn is_recording(&self) -> bool {
        self.scheduler.is_recording()
    }

    pub fn mode(&self) -> FacingMode {
        self.sources.mode()
    }

    pub fn usage(&self) -> u8 {
        self.ring.usage()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Frame> {
        self.ring.snapshot()
    }

    /// Evenly spaced frames with the configured stride.
    pub fn recent_frames(&self) -> Vec<Frame> {
        self.sample_with(self.sample_stride)
    }

    pub fn sample_with(&self, stride: usize) -> Vec<Frame> {
        sample(&self.ring.snapshot(), stride)
    }

    pub fn subscribe(&self) -> Receiver<MemoryEvent> {
        self.events.subscribe()
    }

    pub fn ring(&self) -> Arc<FrameRingBuffer> {
        self.ring.clone()
    }

    pub fn status(&self) -> MemoryStatus {
        let ring = self.ring.stats();
        MemoryStatus {
            session_id: self.session_id.clone(),
            state: self.state(),
            mode: self.mode(),
            usage_percent: ring.usage_percent,
            frames: ring.current_frames,
            capacity: ring.capacity,
            cadence_ms: self.scheduler.cadence().as_millis() as u64,
            sample_stride: self.sample_stride,
            scheduler: self.scheduler.stats(),
            oldest_capture: ring.oldest_utc_ns.map(format_utc_ns),
            newest_capture: ring.newest_utc_ns.map(format_utc_ns),
        }
    }
}

impl Drop for VisualMemory {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl ComponentLogger for VisualMemory {
    fn log_context(&self) -> LogContext {
        LogContext::new("VisualMemory", self.sources.mode().as_str()).with_session(&self.session_id)
    }
}
