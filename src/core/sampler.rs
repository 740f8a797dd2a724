use super::frame::Frame;

pub const DEFAULT_SAMPLE_STRIDE: usize = 5;

/// Every `stride`-th frame starting at index 0, in capture order.
///
/// Operates on a snapshot, so the result stays valid while capture goes on.
/// A stride of 0 is treated as 1.
pub fn sample(entries: &[Frame], stride: usize) -> Vec<Frame> {
    let stride = stride.max(1);
    entries.iter().step_by(stride).cloned().collect()
}
