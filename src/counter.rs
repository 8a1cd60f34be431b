//! The render/log loop.
//!
//! One frame is fully processed (capture, detect, draw, log, present) before the next
//! one is pulled. The loop reads Session State once per frame; clicks queued by the
//! display are dispatched after the frame is presented.
//!
//! Whatever ends the run (end of stream, quit, window close, interrupt, or a fatal error)
//! the frame source and display are released before `run` returns.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::config::DetectorErrorPolicy;
use crate::controls::{ButtonRegistry, InputDispatcher, SessionState};
use crate::count_log::{CountLog, LogRecord};
use crate::detect::{matching, SharedBackend};
use crate::display::{Display, InputEvent};
use crate::ingest::FrameSource;
use crate::overlay;

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    SourceExhausted,
    QuitButton,
    QuitKey,
    WindowClosed,
    /// Stop requested from outside the loop (e.g. Ctrl-C).
    Interrupted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub rows_logged: u64,
    pub reason: StopReason,
    pub log_path: Option<PathBuf>,
    /// Report for the last frame that was fully processed.
    pub last_frame: Option<FrameReport>,
}

/// Result of one processed frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    pub index: u64,
    pub target_class: String,
    pub count: usize,
    pub boxes_drawn: usize,
}

#[derive(Clone, Debug)]
pub struct LoopSettings {
    pub window_name: String,
    pub quit_key: char,
    pub on_detector_error: DetectorErrorPolicy,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            window_name: "Object Counter".to_string(),
            quit_key: 'q',
            on_detector_error: DetectorErrorPolicy::Abort,
        }
    }
}

enum Step {
    Processed(FrameReport),
    Skipped,
    EndOfStream,
}

pub struct CounterLoop {
    source: Box<dyn FrameSource>,
    detector: SharedBackend,
    display: Box<dyn Display>,
    log: Option<CountLog>,
    session: Arc<SessionState>,
    registry: Arc<ButtonRegistry>,
    dispatcher: InputDispatcher,
    settings: LoopSettings,
    stop_reason: Option<StopReason>,
    frames_processed: u64,
    frames_skipped: u64,
    last_report: Option<FrameReport>,
}

impl CounterLoop {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: SharedBackend,
        display: Box<dyn Display>,
        registry: Arc<ButtonRegistry>,
        session: Arc<SessionState>,
        settings: LoopSettings,
    ) -> Self {
        let dispatcher = InputDispatcher::new(Arc::clone(&registry), Arc::clone(&session));
        Self {
            source,
            detector,
            display,
            log: None,
            session,
            registry,
            dispatcher,
            settings,
            stop_reason: None,
            frames_processed: 0,
            frames_skipped: 0,
            last_report: None,
        }
    }

    /// Enable per-frame logging.
    pub fn with_log(mut self, log: CountLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Run until a stop condition, then release the source and display.
    ///
    /// The frame source must already be connected.
    pub fn run(mut self) -> Result<RunSummary> {
        let outcome = self.run_frames();

        self.source.release();
        self.display.release();

        let stats = self.source.stats();
        log::info!(
            "frame source {} released after {} frames",
            stats.location,
            stats.frames_captured
        );

        let reason = outcome?;
        let log_path = self.log.as_ref().and_then(|l| l.path().map(|p| p.to_path_buf()));
        let summary = RunSummary {
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            rows_logged: self.log.as_ref().map(CountLog::rows).unwrap_or(0),
            reason,
            log_path,
            last_frame: self.last_report.take(),
        };
        match &summary.log_path {
            Some(path) => log::info!(
                "run ended ({:?}); {} rows logged in {}",
                summary.reason,
                summary.rows_logged,
                path.display()
            ),
            None => log::info!("run ended ({:?}); logging disabled", summary.reason),
        }
        Ok(summary)
    }

    fn run_frames(&mut self) -> Result<StopReason> {
        while self.session.is_running() {
            match self.step()? {
                Step::Processed(report) => {
                    self.frames_processed += 1;
                    self.last_report = Some(report);
                }
                Step::Skipped => self.frames_skipped += 1,
                Step::EndOfStream => {
                    self.session.stop();
                    return Ok(StopReason::SourceExhausted);
                }
            }
        }
        Ok(self.stop_reason.unwrap_or(StopReason::Interrupted))
    }

    fn step(&mut self) -> Result<Step> {
        let Some(frame) = self.source.next_frame().context("frame capture failed")? else {
            log::info!("frame source {} exhausted", self.source.describe());
            return Ok(Step::EndOfStream);
        };

        let detected = {
            let mut backend = self
                .detector
                .lock()
                .map_err(|_| anyhow!("detector lock poisoned"))?;
            backend.detect(&frame)
        };
        let detections = match detected {
            Ok(detections) => detections,
            Err(err) => match self.settings.on_detector_error {
                DetectorErrorPolicy::Abort => {
                    return Err(err.context(format!("detector failed on frame {}", frame.index)))
                }
                DetectorErrorPolicy::Skip => {
                    log::warn!("detector failed on frame {}, skipping: {:#}", frame.index, err);
                    self.display.refresh();
                    self.poll_input();
                    return Ok(Step::Skipped);
                }
            },
        };

        // Counting and drawing share this snapshot even if a click lands mid-frame.
        let target = self.session.target_class();
        let matches = matching(&detections, &target);
        let count = matches.len();

        let index = frame.index;
        let mut image = frame.into_image();
        let boxes_drawn = overlay::compose(&mut image, &matches, &target, &self.registry);

        if let Some(log) = self.log.as_mut() {
            log.append(&LogRecord::now(target.as_str(), count))?;
        }
        log::debug!(
            "frame {}: {} of {} detections are '{}'",
            index,
            count,
            detections.len(),
            target
        );

        self.display
            .show(&self.settings.window_name, &image)
            .context("failed to present frame")?;
        self.poll_input();

        Ok(Step::Processed(FrameReport {
            index,
            target_class: target,
            count,
            boxes_drawn,
        }))
    }

    /// Drain display input: dispatch clicks, honor the quit key and window close.
    fn poll_input(&mut self) {
        for event in self.display.poll_input() {
            match event {
                InputEvent::Click { x, y } => {
                    let was_running = self.session.is_running();
                    self.dispatcher.handle_click(x, y);
                    if was_running && !self.session.is_running() {
                        self.record_stop(StopReason::QuitButton);
                    }
                }
                InputEvent::Key(key) if key == self.settings.quit_key => {
                    if self.session.stop() {
                        log::info!("quit key '{}' pressed", key);
                    }
                    self.record_stop(StopReason::QuitKey);
                }
                InputEvent::Key(_) => {}
                InputEvent::Closed => {
                    self.session.stop();
                    self.record_stop(StopReason::WindowClosed);
                }
            }
        }
    }

    fn record_stop(&mut self, reason: StopReason) {
        if self.stop_reason.is_none() {
            self.stop_reason = Some(reason);
        }
    }
}
