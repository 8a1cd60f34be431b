//! Display surfaces.
//!
//! A display presents composited frames and queues the input it receives. The counter
//! loop drains that queue once per frame, after presenting, so click handling never
//! interleaves with a frame's filter and draw step.

#[cfg(feature = "window")]
mod window;

use anyhow::Result;
use image::RgbImage;

#[cfg(feature = "window")]
pub use window::WindowDisplay;

/// Input delivered by a display surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    /// Left-button press at frame pixel coordinates.
    Click { x: i32, y: i32 },
    /// Key press, lowercased.
    Key(char),
    /// The user closed the window.
    Closed,
}

/// Character reported for the Escape key.
pub const ESCAPE: char = '\u{1b}';

/// True for the characters a display reports as `InputEvent::Key`: lowercase ASCII
/// letters, digits, space and Escape.
pub fn is_reportable_key(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == ' ' || ch == ESCAPE
}

pub trait Display {
    /// Present a composited frame under the window title `name`.
    fn show(&mut self, name: &str, frame: &RgbImage) -> Result<()>;

    /// Pump window events without presenting a new frame.
    ///
    /// Called when a frame is skipped so input polled afterwards is current.
    fn refresh(&mut self) {}

    /// Drain queued input events. Never blocks.
    fn poll_input(&mut self) -> Vec<InputEvent>;

    /// Release window resources. Idempotent.
    fn release(&mut self) {}
}

/// Display that presents nothing and never produces input.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    frames_shown: u64,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl Display for HeadlessDisplay {
    fn show(&mut self, _name: &str, _frame: &RgbImage) -> Result<()> {
        self.frames_shown += 1;
        Ok(())
    }

    fn poll_input(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }
}
