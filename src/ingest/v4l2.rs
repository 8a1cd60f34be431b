//! V4L2 webcam source.
//!
//! Connects to a local device node (e.g. /dev/video0), negotiates RGB3 when the driver
//! allows it and otherwise normalizes YUYV or MJPEG buffers to RGB24.
//!
//! A capture failure after connecting is treated as the camera going away: it is logged
//! and reported as end of stream. A buffer that fails to decode (corrupt MJPEG, short
//! read) is logged and skipped; only a run of such buffers ends the stream.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::normalize::{normalize_to_rgb, PixelFormat};
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Consecutive undecodable buffers after which the device is considered gone.
const MAX_CONSECUTIVE_DECODE_FAILURES: u32 = 10;

/// Configuration for a V4L2 source.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested frame rate. Drivers may ignore it.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Source {
    config: V4l2Config,
    state: Option<DeviceState>,
    format: PixelFormat,
    frame_count: u64,
    decode_failures: u32,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Source {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            format: PixelFormat::Rgb24,
            frame_count: 0,
            decode_failures: 0,
        }
    }

    /// Convert one captured buffer. Failures are logged and counted, not propagated.
    fn decode(&mut self, raw: &[u8]) -> Option<Frame> {
        let decoded = normalize_to_rgb(raw, self.active_width, self.active_height, self.format)
            .and_then(|rgb| {
                Frame::from_rgb(
                    self.frame_count + 1,
                    self.active_width,
                    self.active_height,
                    rgb,
                )
            });
        match decoded {
            Ok(frame) => {
                self.frame_count += 1;
                self.decode_failures = 0;
                Some(frame)
            }
            Err(err) => {
                self.decode_failures += 1;
                log::warn!(
                    "V4l2Source: skipping undecodable buffer from {}: {:#}",
                    self.config.device,
                    err
                );
                None
            }
        }
    }
}

impl FrameSource for V4l2Source {
    fn describe(&self) -> String {
        self.config.device.clone()
    }

    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Source: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        self.format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "v4l2 device {} delivers unsupported pixel format {}",
                self.config.device,
                format.fourcc
            )
        })?;

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Source: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "V4l2Source: connected to {} ({}x{} {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        use v4l::io::traits::CaptureStream;

        loop {
            let Some(state) = self.state.as_mut() else {
                return Ok(None);
            };
            let captured = state.with_mut(|fields| {
                fields
                    .stream
                    .next()
                    .map(|(buf, meta)| buf[..(meta.bytesused as usize).min(buf.len())].to_vec())
            });
            let raw = match captured {
                Ok(raw) => raw,
                Err(err) => {
                    log::warn!(
                        "V4l2Source: capture from {} failed, ending stream: {}",
                        self.config.device,
                        err
                    );
                    return Ok(None);
                }
            };

            if let Some(frame) = self.decode(&raw) {
                return Ok(Some(frame));
            }
            if self.decode_failures >= MAX_CONSECUTIVE_DECODE_FAILURES {
                log::warn!(
                    "V4l2Source: {} undecodable buffers in a row from {}, ending stream",
                    self.decode_failures,
                    self.config.device
                );
                return Ok(None);
            }
        }
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            log::info!("V4l2Source: released {}", self.config.device);
        }
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            location: self.config.device.clone(),
        }
    }
}
