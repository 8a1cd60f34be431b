//! Object Counter
//!
//! Live object counting over a camera feed. Each frame goes through a pretrained detector;
//! detections of the selected class are boxed and counted, an on-screen button bar switches
//! the class, and every frame's count is appended to a CSV log.
//!
//! # Module Structure
//!
//! - `frame`, `geometry`: frames and rectangles shared by every stage
//! - `ingest`: frame sources (synthetic, image directory, V4L2 webcam)
//! - `detect`: detector backends (stub, YOLOv8 via tract) and their registry
//! - `controls`: button bar, session state, click dispatch
//! - `overlay`: compositing of boxes, status line and buttons
//! - `display`: window/headless presentation and input queue
//! - `count_log`: append-only CSV log
//! - `counter`: the per-frame render/log loop

pub mod config;
pub mod controls;
pub mod count_log;
pub mod counter;
pub mod detect;
pub mod display;
pub mod frame;
pub mod geometry;
pub mod ingest;
pub mod overlay;
pub mod ui;

pub use config::{CounterConfig, DetectorErrorPolicy};
pub use controls::{Button, ButtonAction, ButtonRegistry, InputDispatcher, SessionState};
pub use count_log::{CountLog, LogRecord, LogSink, LOG_HEADER};
pub use counter::{CounterLoop, FrameReport, LoopSettings, RunSummary, StopReason};
pub use detect::{BackendRegistry, Detection, DetectorBackend, SharedBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use display::{Display, HeadlessDisplay, InputEvent};
#[cfg(feature = "window")]
pub use display::WindowDisplay;
pub use frame::Frame;
pub use geometry::Rect;
pub use ingest::{open_source, FrameSource, SourceStats};
