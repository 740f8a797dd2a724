pub mod jpeg;

pub use jpeg::{DEFAULT_JPEG_QUALITY, JpegCodec};
