pub mod error;
pub mod events;
pub mod frame;
pub mod lock;
pub mod logging;
pub mod memory;
pub mod ringbuffer;
pub mod sampler;
pub mod scheduler;
pub mod source;
pub mod timestamp;

use std::sync::{Arc, Mutex};

pub use error::{AcquireError, AcquireFailure, AnswerError, ConfigError, SessionError, SessionResult};
pub use events::{EventHub, MemoryEvent, SessionState};
pub use frame::{EncodedImage, Frame, MediaType, RawImage};
pub use logging::{ComponentLogger, LogContext};
pub use memory::{MemoryStatus, VisualMemory};
pub use ringbuffer::{FrameRingBuffer, RingBufferStats};
pub use sampler::{DEFAULT_SAMPLE_STRIDE, sample};
pub use scheduler::{CaptureScheduler, SchedulerStats, TickOutcome};
pub use source::{FacingMode, SourceManager};
pub use timestamp::*;

/// A live video-producing handle, e.g. an opened camera stream.
pub trait VideoSource: Send {
    fn id(&self) -> &str;
    fn mode(&self) -> FacingMode;
    /// Current picture, or `None` while the source has no pixels yet.
    fn grab(&mut self) -> Option<RawImage>;
    /// Stops the underlying capture. Further calls are no-ops.
    fn stop(&mut self);
    fn is_live(&self) -> bool;
}

/// Opens live sources. Acquisition may block on permission prompts or
/// device negotiation.
pub trait SourceProvider: Send + Sync {
    fn name(&self) -> &str;
    fn acquire(&self, mode: FacingMode) -> Result<Box<dyn VideoSource>, AcquireError>;
}

/// Turns the current picture of a source into one encoded still.
pub trait FrameCodec: Send {
    fn name(&self) -> &str;
    /// `None` means unavailable: the tick is skipped without error.
    fn capture(&mut self, source: &mut dyn VideoSource) -> Option<EncodedImage>;
}

pub type SharedSource = Arc<Mutex<Box<dyn VideoSource>>>;

pub fn share_source(source: Box<dyn VideoSource>) -> SharedSource {
    Arc::new(Mutex::new(source))
}
