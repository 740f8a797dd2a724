use std::sync::Arc;
use std::time::{Duration, Instant};

use recall_node::codecs::JpegCodec;
use recall_node::config::MemoryConfig;
use recall_node::core::MediaType;
use recall_node::producers::PatternProvider;
use recall_node::{FacingMode, SessionState, VisualMemory};

#[test]
fn e2e_pattern_source_produces_jpeg_stills() {
    let config = MemoryConfig {
        capture_cadence_ms: 20,
        retention_secs: 2,
        sample_stride: 2,
        stall_after_ticks: 0,
    };
    let mut memory = VisualMemory::new(
        &config,
        Arc::new(PatternProvider::new(64, 48, 2)),
        Box::new(JpegCodec::new(70)),
        FacingMode::Environment,
    );

    memory.start().expect("pattern source is always available");
    assert_eq!(memory.state(), SessionState::Recording);

    let deadline = Instant::now() + Duration::from_secs(5);
    while memory.len() < 3 {
        assert!(Instant::now() < deadline, "no jpeg frames captured");
        std::thread::sleep(Duration::from_millis(10));
    }
    memory.stop();

    let status = memory.status();
    // Warmup-Ticks liefern keine Pixel
    assert!(status.scheduler.unavailable >= 2);
    assert_eq!(status.mode, FacingMode::Environment);

    for frame in memory.snapshot() {
        let image = frame.image();
        assert_eq!(image.media_type, MediaType::Jpeg);
        assert!(image.len() > 4);
        assert_eq!(&image.data[..2], &[0xFF, 0xD8]);
    }

    memory.teardown();
    assert!(memory.is_empty());
}
