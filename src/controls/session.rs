use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Mutable run state shared by the input side and the counter loop.
///
/// `target_class` sits behind a mutex and `running` is atomic, so the dispatcher (or a
/// signal handler) may write from another thread while the loop reads once per frame.
#[derive(Debug)]
pub struct SessionState {
    target_class: Mutex<String>,
    running: AtomicBool,
}

impl SessionState {
    pub fn new(default_target: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            target_class: Mutex::new(default_target.into()),
            running: AtomicBool::new(true),
        })
    }

    /// Snapshot of the current target class.
    pub fn target_class(&self) -> String {
        self.target_class
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the target class. Returns the previous value.
    pub fn set_target_class(&self, class: &str) -> String {
        let mut guard = self
            .target_class
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, class.to_string())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request a stop. Returns true only for the call that performed the transition.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::SeqCst)
    }
}
