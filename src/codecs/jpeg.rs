use image::ColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::core::{EncodedImage, FrameCodec, VideoSource};

pub const DEFAULT_JPEG_QUALITY: u8 = 60;

/// Encodes the current picture of a source as a JPEG still.
pub struct JpegCodec {
    quality: u8,
    buffer: Vec<u8>,
}

impl JpegCodec {
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
            buffer: Vec::new(),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encode_rgb(&mut self, rgb: &[u8], width: u32, height: u32) -> Option<EncodedImage> {
        let expected = width as usize * height as usize * 3;
        if rgb.len() != expected {
            log::warn!(
                "[jpeg] rgb buffer has {} bytes, expected {} for {}x{}",
                rgb.len(),
                expected,
                width,
                height
            );
            return None;
        }

        self.buffer.clear();
        let encoded = {
            let mut encoder = JpegEncoder::new_with_quality(&mut self.buffer, self.quality);
            encoder.encode(rgb, width, height, ColorType::Rgb8)
        };
        if let Err(e) = encoded {
            log::warn!("[jpeg] encode {}x{} failed: {}", width, height, e);
            return None;
        }

        Some(EncodedImage::jpeg(self.buffer.clone()))
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameCodec for JpegCodec {
    fn name(&self) -> &str {
        "jpeg"
    }

    fn capture(&mut self, source: &mut dyn VideoSource) -> Option<EncodedImage> {
        let raw = source.grab()?;
        // Quelle liefert noch keine Dimensionen
        if !raw.has_dimensions() {
            return None;
        }
        self.encode_rgb(&raw.rgb, raw.width, raw.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MediaType;
    use crate::core::RawImage;
    use crate::testing::mocks::MockSource;

    #[test]
    fn test_encodes_jpeg() {
        let mut codec = JpegCodec::default();
        let rgb = vec![128u8; 16 * 8 * 3];

        let image = codec.encode_rgb(&rgb, 16, 8).unwrap();
        assert_eq!(image.media_type, MediaType::Jpeg);
        assert_eq!(&image.data[..2], &[0xff, 0xd8]);
        assert!(image.len() < rgb.len() * 4);
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        let mut codec = JpegCodec::new(80);
        assert!(codec.encode_rgb(&[0u8; 10], 16, 8).is_none());
    }

    #[test]
    fn test_quality_is_clamped() {
        assert_eq!(JpegCodec::new(0).quality(), 1);
        assert_eq!(JpegCodec::new(250).quality(), 100);
    }

    #[test]
    fn test_capture_without_dimensions_is_unavailable() {
        let mut codec = JpegCodec::default();
        let mut source = MockSource::new("mock:user").with_picture(RawImage {
            width: 0,
            height: 0,
            rgb: Vec::new(),
        });
        assert!(codec.capture(&mut source).is_none());
    }

    #[test]
    fn test_capture_from_source() {
        let mut codec = JpegCodec::default();
        let mut source = MockSource::new("mock:user").with_picture(RawImage {
            width: 4,
            height: 4,
            rgb: vec![200u8; 4 * 4 * 3],
        });
        assert!(codec.capture(&mut source).is_some());

        source.stop();
        assert!(codec.capture(&mut source).is_none());
    }
}
