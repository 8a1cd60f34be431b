//! Synthetic frame source (`stub://`).
//!
//! Produces a moving gradient pattern. Used for headless runs and tests; it can be
//! bounded to a fixed number of frames to exercise the end-of-stream path.

use anyhow::Result;
use image::{Rgb, RgbImage};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a synthetic source.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Stop after this many frames. `None` runs forever.
    pub max_frames: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            name: "stub://camera".to_string(),
            width: 640,
            height: 480,
            max_frames: None,
        }
    }
}

pub struct SyntheticSource {
    config: SyntheticConfig,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            connected: false,
        }
    }

    fn generate(&self) -> RgbImage {
        let shift = (self.frame_count % 256) as u32;
        RgbImage::from_fn(self.config.width, self.config.height, |x, y| {
            Rgb([
                ((x + shift) % 256) as u8,
                ((y + shift) % 256) as u8,
                ((x + y) % 256) as u8,
            ])
        })
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        self.config.name.clone()
    }

    /// Synthetic sources are always "connected".
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!(
            "SyntheticSource: connected to {} ({}x{})",
            self.config.name,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if !self.connected {
            return Ok(None);
        }
        if let Some(max) = self.config.max_frames {
            if self.frame_count >= max {
                return Ok(None);
            }
        }
        let image = self.generate();
        self.frame_count += 1;
        Ok(Some(Frame::new(self.frame_count, image)))
    }

    fn release(&mut self) {
        if self.connected {
            log::debug!("SyntheticSource: released {}", self.config.name);
        }
        self.connected = false;
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            location: self.config.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded(max: u64) -> SyntheticSource {
        SyntheticSource::new(SyntheticConfig {
            width: 32,
            height: 24,
            max_frames: Some(max),
            ..SyntheticConfig::default()
        })
    }

    #[test]
    fn synthetic_source_produces_frames() -> Result<()> {
        let mut source = bounded(3);
        source.connect()?;

        let frame = source.next_frame()?.expect("first frame");
        assert_eq!(frame.index, 1);
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 24);
        Ok(())
    }

    #[test]
    fn bounded_source_ends_stream() -> Result<()> {
        let mut source = bounded(2);
        source.connect()?;
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_some());
        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn released_source_yields_nothing() -> Result<()> {
        let mut source = bounded(10);
        source.connect()?;
        source.release();
        assert!(source.next_frame()?.is_none());
        Ok(())
    }
}
