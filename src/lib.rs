// src/lib.rs
pub mod answer;
pub mod api;
pub mod codecs;
pub mod config;
pub mod core;
pub mod producers;
pub mod testing;

// Re-export der wichtigsten Typen
pub use answer::{Answer, AnswerClient, ask};
pub use core::{
    ComponentLogger, EncodedImage, FacingMode, Frame, FrameRingBuffer, LogContext, MemoryEvent,
    SessionState, VisualMemory, sample,
};
pub use core::timestamp::utc_ns_now;
