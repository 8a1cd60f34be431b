//! object_counter - live object counting from a camera feed
//!
//! This binary:
//! 1. Loads configuration (defaults, optional JSON file, environment overrides)
//! 2. Loads the detector backend and opens the frame source
//! 3. Runs the render/log loop until quit, end of stream or Ctrl-C
//! 4. Reports where the count log was saved

use anyhow::{Context, Result};
use std::sync::Arc;

use object_counter::{
    open_source, ui::Ui, BackendRegistry, ButtonRegistry, CountLog, CounterConfig, CounterLoop,
    Display, HeadlessDisplay, LoopSettings, SessionState, SharedBackend, StopReason,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = CounterConfig::load()?;
    let ui = Ui::detect();

    let detector = {
        let _stage = ui.stage("load detector");
        load_detector(&cfg)?
    };

    let mut source = {
        let _stage = ui.stage("open frame source");
        let mut source = open_source(&cfg.source)?;
        source
            .connect()
            .with_context(|| format!("failed to open frame source {}", source.describe()))?;
        source
    };

    let registry = Arc::new(ButtonRegistry::from_classes(&cfg.classes)?);
    let session = SessionState::new(cfg.default_target.clone());

    let handler_session = Arc::clone(&session);
    ctrlc::set_handler(move || {
        handler_session.stop();
    })
    .expect("error setting Ctrl-C handler");

    let log = if cfg.log.enabled {
        let _stage = ui.stage("create count log");
        match CountLog::create(&cfg.log.path) {
            Ok(log) => Some(log),
            Err(err) => {
                source.release();
                return Err(err);
            }
        }
    } else {
        None
    };

    let display = open_display(&cfg);
    let settings = LoopSettings {
        window_name: cfg.display.window_name.clone(),
        quit_key: cfg.display.quit_key,
        on_detector_error: cfg.detector.on_error,
    };

    println!(
        "Counting '{}' from {}. Click a button to switch class, '{}' or the quit button to exit.",
        cfg.default_target,
        source.describe(),
        cfg.display.quit_key
    );

    let mut counter = CounterLoop::new(source, detector, display, registry, session, settings);
    if let Some(log) = log {
        counter = counter.with_log(log);
    }

    match counter.run() {
        Ok(summary) => {
            if summary.reason == StopReason::Interrupted {
                log::info!("interrupted, shutting down");
            }
            match &summary.log_path {
                Some(path) => println!("Project ended. Logs saved in: {}", path.display()),
                None => println!("Project ended. Logging was disabled."),
            }
            log::info!(
                "{} frames processed, {} skipped",
                summary.frames_processed,
                summary.frames_skipped
            );
            Ok(())
        }
        Err(err) => {
            log::error!("run aborted: {:#}", err);
            eprintln!("Project terminated: {:#}", err);
            if cfg.log.enabled {
                eprintln!(
                    "Rows written before the failure remain in {}",
                    cfg.log.path.display()
                );
            }
            Err(err)
        }
    }
}

/// Load the configured detector, warn about classes it can never report, and warm it up.
fn load_detector(cfg: &CounterConfig) -> Result<SharedBackend> {
    let registry = BackendRegistry::from_settings(&cfg.detector)?;

    let unknown = registry.unknown_labels(&cfg.classes)?;
    if !unknown.is_empty() {
        log::warn!(
            "detector does not know classes {:?}; their count will stay 0",
            unknown
        );
    }

    let backend = registry
        .default_backend()
        .context("no detector backend registered")?;
    {
        let mut guard = backend
            .lock()
            .map_err(|_| anyhow::anyhow!("detector lock poisoned"))?;
        log::info!("detector backend: {}", guard.name());
        guard.warm_up().context("detector warm-up failed")?;
    }
    Ok(backend)
}

fn open_display(cfg: &CounterConfig) -> Box<dyn Display> {
    if cfg.display.enabled {
        #[cfg(feature = "window")]
        {
            return Box::new(object_counter::WindowDisplay::new());
        }
        #[cfg(not(feature = "window"))]
        log::warn!("built without the window feature; running headless");
    }
    Box::new(HeadlessDisplay::new())
}
