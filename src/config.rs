use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::controls::QUIT_LABEL;
use crate::display::is_reportable_key;

const DEFAULT_BACKEND: &str = "yolov8";
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;
const DEFAULT_SOURCE_URI: &str = "/dev/video0";
const DEFAULT_SOURCE_FPS: u32 = 30;
const DEFAULT_SOURCE_WIDTH: u32 = 640;
const DEFAULT_SOURCE_HEIGHT: u32 = 480;
const DEFAULT_CLASSES: [&str; 4] = ["person", "car", "dog", "bicycle"];
const DEFAULT_TARGET: &str = "person";
const DEFAULT_LOG_PATH: &str = "object_counts.csv";
const DEFAULT_WINDOW_NAME: &str = "Object Counter";
const DEFAULT_QUIT_KEY: char = 'q';

#[derive(Debug, Deserialize, Default)]
struct CounterConfigFile {
    detector: Option<DetectorConfigFile>,
    source: Option<SourceConfigFile>,
    classes: Option<Vec<String>>,
    default_target: Option<String>,
    log: Option<LogConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    on_error: Option<DetectorErrorPolicy>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
    max_frames: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct LogConfigFile {
    enabled: Option<bool>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    enabled: Option<bool>,
    window_name: Option<String>,
    quit_key: Option<char>,
}

/// What the counter loop does when the detector fails on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorErrorPolicy {
    /// Abort the run.
    #[default]
    Abort,
    /// Log the failure and skip the frame (no overlay, no log row).
    Skip,
}

#[derive(Debug, Clone)]
pub struct CounterConfig {
    pub detector: DetectorSettings,
    pub source: SourceSettings,
    /// Selectable classes, in button bar order. The quit button is appended.
    pub classes: Vec<String>,
    pub default_target: String,
    pub log: LogSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: PathBuf,
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub on_error: DetectorErrorPolicy,
}

#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub uri: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
    /// Upper bound on frames for synthetic sources.
    pub max_frames: Option<u64>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_SOURCE_URI.to_string(),
            target_fps: DEFAULT_SOURCE_FPS,
            width: DEFAULT_SOURCE_WIDTH,
            height: DEFAULT_SOURCE_HEIGHT,
            max_frames: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub enabled: bool,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub enabled: bool,
    pub window_name: String,
    pub quit_key: char,
}

impl Default for CounterConfig {
    fn default() -> Self {
        // The empty file always yields a valid config.
        Self::from_file(CounterConfigFile::default())
    }
}

impl CounterConfig {
    /// Defaults, then the JSON file named by `OBJECT_COUNTER_CONFIG`, then environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("OBJECT_COUNTER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CounterConfigFile) -> Self {
        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: detector_file
                .model_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            input_size: detector_file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            confidence_threshold: detector_file
                .confidence_threshold
                .unwrap_or(DEFAULT_CONFIDENCE),
            iou_threshold: detector_file.iou_threshold.unwrap_or(DEFAULT_IOU),
            on_error: detector_file.on_error.unwrap_or_default(),
        };

        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            uri: source_file
                .uri
                .unwrap_or_else(|| DEFAULT_SOURCE_URI.to_string()),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_SOURCE_FPS),
            width: source_file.width.unwrap_or(DEFAULT_SOURCE_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_SOURCE_HEIGHT),
            max_frames: source_file.max_frames,
        };

        let log_file = file.log.unwrap_or_default();
        let log = LogSettings {
            enabled: log_file.enabled.unwrap_or(true),
            path: log_file
                .path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH)),
        };

        let display_file = file.display.unwrap_or_default();
        let display = DisplaySettings {
            enabled: display_file.enabled.unwrap_or(true),
            window_name: display_file
                .window_name
                .unwrap_or_else(|| DEFAULT_WINDOW_NAME.to_string()),
            quit_key: display_file.quit_key.unwrap_or(DEFAULT_QUIT_KEY),
        };

        Self {
            detector,
            source,
            classes: file
                .classes
                .unwrap_or_else(|| DEFAULT_CLASSES.iter().map(|c| c.to_string()).collect()),
            default_target: file
                .default_target
                .unwrap_or_else(|| DEFAULT_TARGET.to_string()),
            log,
            display,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(uri) = non_empty_env("OBJECT_COUNTER_SOURCE") {
            self.source.uri = uri;
        }
        if let Some(backend) = non_empty_env("OBJECT_COUNTER_BACKEND") {
            self.detector.backend = backend;
        }
        if let Some(model) = non_empty_env("OBJECT_COUNTER_MODEL") {
            self.detector.model_path = PathBuf::from(model);
        }
        if let Some(classes) = non_empty_env("OBJECT_COUNTER_CLASSES") {
            let parsed = split_csv(&classes);
            if !parsed.is_empty() {
                self.classes = parsed;
            }
        }
        if let Some(target) = non_empty_env("OBJECT_COUNTER_TARGET") {
            self.default_target = target;
        }
        if let Some(flag) = non_empty_env("OBJECT_COUNTER_SAVE_LOG") {
            self.log.enabled = parse_bool("OBJECT_COUNTER_SAVE_LOG", &flag)?;
        }
        if let Some(path) = non_empty_env("OBJECT_COUNTER_LOG_PATH") {
            self.log.path = PathBuf::from(path);
        }
        if let Some(flag) = non_empty_env("OBJECT_COUNTER_HEADLESS") {
            self.display.enabled = !parse_bool("OBJECT_COUNTER_HEADLESS", &flag)?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.classes = self
            .classes
            .iter()
            .map(|class| class.trim().to_string())
            .collect();
        if self.classes.is_empty() {
            return Err(anyhow!("at least one selectable class is required"));
        }
        for (idx, class) in self.classes.iter().enumerate() {
            if class.is_empty() {
                return Err(anyhow!("class names must not be empty"));
            }
            if class == QUIT_LABEL {
                return Err(anyhow!("'{}' is reserved for the quit button", QUIT_LABEL));
            }
            if self.classes[..idx].contains(class) {
                return Err(anyhow!("duplicate class '{}'", class));
            }
        }

        self.default_target = self.default_target.trim().to_string();
        if self.default_target.is_empty() {
            return Err(anyhow!("default target class must not be empty"));
        }
        if !self.classes.contains(&self.default_target) {
            log::warn!(
                "default target '{}' has no button; it stays active until another class is clicked",
                self.default_target
            );
        }

        for (name, value) in [
            ("confidence_threshold", self.detector.confidence_threshold),
            ("iou_threshold", self.detector.iou_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.detector.input_size == 0 {
            return Err(anyhow!("detector input_size must be > 0"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source width and height must be > 0"));
        }
        self.display.quit_key = self.display.quit_key.to_ascii_lowercase();
        if !is_reportable_key(self.display.quit_key) {
            return Err(anyhow!(
                "quit_key {:?} cannot be pressed in the window; use a letter, digit, space or Escape",
                self.display.quit_key
            ));
        }
        if self.log.enabled && self.log.path.as_os_str().is_empty() {
            return Err(anyhow!("log path must not be empty when logging is enabled"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<CounterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("{} must be true/false, got '{}'", key, other)),
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
