//! Image directory source.
//!
//! Replays the still images of a local directory (png/jpg/jpeg) in file-name order,
//! one frame per image, then ends the stream.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use super::{FrameSource, SourceStats};
use crate::frame::Frame;

pub struct ImageDirSource {
    dir: PathBuf,
    pending: Vec<PathBuf>,
    frame_count: u64,
}

impl ImageDirSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            pending: Vec::new(),
            frame_count: 0,
        }
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn connect(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.dir)
            .with_context(|| format!("open image directory {}", self.dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(anyhow!("no png/jpg images in {}", self.dir.display()));
        }
        files.sort();
        // Reversed so `pop` yields frames in name order.
        files.reverse();
        log::info!(
            "ImageDirSource: {} images queued from {}",
            files.len(),
            self.dir.display()
        );
        self.pending = files;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.pending.pop() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .with_context(|| format!("decode image {}", path.display()))?
            .into_rgb8();
        self.frame_count += 1;
        Ok(Some(Frame::new(self.frame_count, image)))
    }

    fn release(&mut self) {
        self.pending.clear();
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            location: self.describe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn replays_images_in_name_order() -> Result<()> {
        let dir = tempfile::tempdir()?;
        RgbImage::from_pixel(4, 2, Rgb([10, 0, 0])).save(dir.path().join("b.png"))?;
        RgbImage::from_pixel(2, 2, Rgb([20, 0, 0])).save(dir.path().join("a.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "skip me")?;

        let mut source = ImageDirSource::new(dir.path());
        source.connect()?;

        let first = source.next_frame()?.expect("a.png");
        assert_eq!((first.index, first.width()), (1, 2));
        let second = source.next_frame()?.expect("b.png");
        assert_eq!((second.index, second.width()), (2, 4));
        assert!(source.next_frame()?.is_none());
        assert_eq!(source.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn empty_directory_fails_to_connect() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut source = ImageDirSource::new(dir.path());
        assert!(source.connect().is_err());
        Ok(())
    }
}
