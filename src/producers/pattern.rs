use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::CameraConfig;
use crate::core::{AcquireError, FacingMode, RawImage, SourceProvider, VideoSource};

// Größte Auflösung, die der Testbild-Generator anbietet
const MAX_DIMENSION: u32 = 4096;

/// Hardware-free camera: renders a moving test pattern per facing mode.
pub struct PatternProvider {
    width: u32,
    height: u32,
    warmup_ticks: u32,
    opened: AtomicU64,
}

impl PatternProvider {
    pub fn new(width: u32, height: u32, warmup_ticks: u32) -> Self {
        Self {
            width,
            height,
            warmup_ticks,
            opened: AtomicU64::new(0),
        }
    }

    pub fn from_config(cfg: &CameraConfig) -> Self {
        Self::new(cfg.width, cfg.height, cfg.warmup_ticks)
    }
}

impl SourceProvider for PatternProvider {
    fn name(&self) -> &str {
        "pattern"
    }

    fn acquire(&self, mode: FacingMode) -> Result<Box<dyn VideoSource>, AcquireError> {
        if self.width == 0 || self.height == 0 {
            return Err(AcquireError::constraint(format!(
                "{}x{} has no pixels",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(AcquireError::constraint(format!(
                "{}x{} exceeds {}x{}",
                self.width, self.height, MAX_DIMENSION, MAX_DIMENSION
            )));
        }

        let n = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        log::info!(
            "[pattern] opened {} source #{} at {}x{}",
            mode,
            n,
            self.width,
            self.height
        );
        Ok(Box::new(PatternSource {
            id: format!("pattern:{}#{}", mode, n),
            mode,
            width: self.width,
            height: self.height,
            warmup_remaining: self.warmup_ticks,
            frame_no: 0,
            live: true,
        }))
    }
}

pub struct PatternSource {
    id: String,
    mode: FacingMode,
    width: u32,
    height: u32,
    warmup_remaining: u32,
    frame_no: u32,
    live: bool,
}

impl PatternSource {
    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let shift = (self.frame_no as usize * 8) % w.max(1);
        let mut rgb = Vec::with_capacity(w * h * 3);
        for y in 0..h {
            for x in 0..w {
                let ramp = (((x + shift) % w) * 255 / w.max(1)) as u8;
                let rows = (y * 255 / h.max(1)) as u8;
                let pixel = match self.mode {
                    FacingMode::User => [ramp / 2, rows / 2, 200],
                    FacingMode::Environment => [rows / 3, 180, ramp],
                };
                rgb.extend_from_slice(&pixel);
            }
        }
        rgb
    }
}

impl VideoSource for PatternSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn mode(&self) -> FacingMode {
        self.mode
    }

    fn grab(&mut self) -> Option<RawImage> {
        if !self.live {
            return None;
        }
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            return None;
        }
        let rgb = self.render();
        self.frame_no = self.frame_no.wrapping_add(1);
        Some(RawImage {
            width: self.width,
            height: self.height,
            rgb,
        })
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            log::debug!("[pattern] stopped {}", self.id);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AcquireFailure;

    #[test]
    fn test_warmup_then_pixels() {
        let provider = PatternProvider::new(8, 4, 2);
        let mut source = provider.acquire(FacingMode::User).unwrap();

        assert!(source.grab().is_none());
        assert!(source.grab().is_none());
        let raw = source.grab().unwrap();
        assert_eq!((raw.width, raw.height), (8, 4));
        assert_eq!(raw.rgb.len(), 8 * 4 * 3);
    }

    #[test]
    fn test_modes_render_differently() {
        let provider = PatternProvider::new(4, 4, 0);
        let mut user = provider.acquire(FacingMode::User).unwrap();
        let mut env = provider.acquire(FacingMode::Environment).unwrap();

        assert_ne!(user.grab().unwrap().rgb, env.grab().unwrap().rgb);
        assert!(env.id().starts_with("pattern:environment#"));
    }

    #[test]
    fn test_stopped_source_has_no_pixels() {
        let provider = PatternProvider::new(4, 4, 0);
        let mut source = provider.acquire(FacingMode::User).unwrap();
        source.stop();
        source.stop();
        assert!(!source.is_live());
        assert!(source.grab().is_none());
    }

    #[test]
    fn test_oversized_request_is_constraint_error() {
        let provider = PatternProvider::new(8192, 8192, 0);
        let err = provider.acquire(FacingMode::User).err().unwrap();
        assert_eq!(err.reason, AcquireFailure::ConstraintUnsatisfiable);
    }
}
