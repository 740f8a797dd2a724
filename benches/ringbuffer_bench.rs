use std::time::Instant;

use recall_node::core::ringbuffer::FrameRingBuffer;
use recall_node::{EncodedImage, Frame, sample};

fn main() {
    let buffer = FrameRingBuffer::new(300);
    let image = EncodedImage::jpeg(vec![0xAB; 24 * 1024]);

    let iterations = 10_000u64;
    let start = Instant::now();
    for seq in 1..=iterations {
        buffer.push(Frame::new(seq, seq, image.clone()));
    }
    let elapsed = start.elapsed();

    println!(
        "Ringbuffer push: {} frames in {:.2?} ({:.0} ops/s)",
        iterations,
        elapsed,
        iterations as f64 / elapsed.as_secs_f64()
    );

    let rounds = 1_000;
    let start = Instant::now();
    let mut picked = 0;
    for _ in 0..rounds {
        picked += sample(&buffer.snapshot(), 5).len();
    }
    let elapsed = start.elapsed();

    println!(
        "Snapshot+sample: {} rounds in {:.2?} ({} frames picked, {:.0} rounds/s)",
        rounds,
        elapsed,
        picked,
        rounds as f64 / elapsed.as_secs_f64()
    );
}
