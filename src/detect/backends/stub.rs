use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Stub backend for headless runs and tests.
///
/// Without a script it reports nothing. With a script it replays the scripted
/// detection sets in a cycle, one set per call.
#[derive(Default)]
pub struct StubBackend {
    script: Vec<Vec<Detection>>,
    calls: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(script: Vec<Vec<Detection>>) -> Self {
        Self { script, calls: 0 }
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        let slot = self.calls as usize;
        self.calls += 1;
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.script[slot % self.script.len()].clone())
    }
}
