use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// The counter loop treats a backend as an opaque function: frame in, detections out.
/// Calls block until the result is ready; there is no timeout or cancellation.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// Labels must be stable strings and boxes must use the frame's pixel space.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;

    /// Returns false when the backend can never emit `label`.
    ///
    /// Used only for startup diagnostics. Backends without a fixed vocabulary accept everything.
    fn knows_label(&self, _label: &str) -> bool {
        true
    }

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
