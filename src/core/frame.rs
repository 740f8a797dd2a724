use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Declared media type of an encoded still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl MediaType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Opaque encoded still image as produced by a `FrameCodec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub media_type: MediaType,
    pub data: Bytes,
}

impl EncodedImage {
    pub fn new(media_type: MediaType, data: impl Into<Bytes>) -> Self {
        Self {
            media_type,
            data: data.into(),
        }
    }

    pub fn jpeg(data: impl Into<Bytes>) -> Self {
        Self::new(MediaType::Jpeg, data)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Raw RGB8 pixels grabbed from a live source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RawImage {
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// One retained observation.
///
/// `seq` is the canonical capture order. `utc_ns` is wall-clock metadata and
/// may jump backwards when the system clock is adjusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    seq: u64,
    utc_ns: u64,
    image: EncodedImage,
}

impl Frame {
    pub fn new(seq: u64, utc_ns: u64, image: EncodedImage) -> Self {
        Self { seq, utc_ns, image }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn utc_ns(&self) -> u64 {
        self.utc_ns
    }

    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    pub fn into_image(self) -> EncodedImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_mime() {
        assert_eq!(MediaType::Jpeg.as_mime(), "image/jpeg");
        assert_eq!(MediaType::Jpeg.to_string(), "image/jpeg");
        assert_eq!(serde_json::to_string(&MediaType::Jpeg).unwrap(), "\"image/jpeg\"");
    }

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(7, 1_000, EncodedImage::jpeg(vec![0xff, 0xd8]));
        assert_eq!(frame.seq(), 7);
        assert_eq!(frame.utc_ns(), 1_000);
        assert_eq!(frame.image().len(), 2);
        assert_eq!(frame.image().media_type, MediaType::Jpeg);
    }

    #[test]
    fn test_raw_image_dimensions() {
        let empty = RawImage { width: 0, height: 480, rgb: Vec::new() };
        assert!(!empty.has_dimensions());

        let ok = RawImage { width: 2, height: 1, rgb: vec![0; 6] };
        assert!(ok.has_dimensions());
    }
}
