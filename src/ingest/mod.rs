//! Frame sources.
//!
//! This module provides different sources for frames:
//! - Synthetic `stub://` source (testing, headless demos)
//! - Directory of still images (replay)
//! - USB/V4L2 webcams (feature: ingest-v4l2)
//!
//! Every source is a blocking pull: `next_frame` returns `Ok(None)` once the source is
//! exhausted or the device stops delivering, which ends the run normally. Errors are
//! reserved for failures that should abort the run.

pub mod images;
#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Result};

use crate::config::SourceSettings;
use crate::frame::Frame;

pub use images::ImageDirSource;
pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// Blocking frame producer.
pub trait FrameSource {
    /// Human-readable source location (device path, directory, stub URI).
    fn describe(&self) -> String;

    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame. `Ok(None)` means end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Release device resources. Idempotent.
    fn release(&mut self) {}

    /// Frame statistics.
    fn stats(&self) -> SourceStats;
}

/// Statistics for a frame source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub location: String,
}

/// Open the source described by `settings.uri`.
///
/// - `stub://...` selects the synthetic source
/// - `/dev/video*` selects V4L2 (requires the ingest-v4l2 feature)
/// - anything else is treated as a directory of images
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    let uri = settings.uri.trim();
    if uri.is_empty() {
        return Err(anyhow!("frame source uri must not be empty"));
    }
    if uri.starts_with("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            name: uri.to_string(),
            width: settings.width,
            height: settings.height,
            max_frames: settings.max_frames,
        })));
    }
    if uri.starts_with("/dev/video") {
        #[cfg(feature = "ingest-v4l2")]
        {
            return Ok(Box::new(V4l2Source::new(V4l2Config {
                device: uri.to_string(),
                target_fps: settings.target_fps,
                width: settings.width,
                height: settings.height,
            })));
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            return Err(anyhow!(
                "webcam capture from {} requires the ingest-v4l2 feature",
                uri
            ));
        }
    }
    if uri.contains("://") {
        return Err(anyhow!("unsupported frame source scheme: {}", uri));
    }
    Ok(Box::new(ImageDirSource::new(uri)))
}
