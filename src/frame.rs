//! Captured frames.
//!
//! A `Frame` is an owned RGB image plus the sequence index assigned by its source.
//! Detectors only borrow it; the counter loop takes it back by value for compositing.

use anyhow::{anyhow, Result};
use image::RgbImage;

pub struct Frame {
    /// 1-based capture index within the source.
    pub index: u64,
    image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self { index, image }
    }

    /// Wrap packed RGB24 bytes. The length must match `width * height * 3`.
    pub fn from_rgb(index: u64, width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let len = pixels.len();
        let image = RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            anyhow!(
                "RGB frame length mismatch: {}x{} needs {} bytes, got {}",
                width,
                height,
                width as usize * height as usize * 3,
                len
            )
        })?;
        Ok(Self { index, image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("index", &self.index)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
