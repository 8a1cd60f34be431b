use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};

use super::backend::DetectorBackend;
use super::backends::StubBackend;
#[cfg(feature = "backend-tract")]
use super::backends::TractBackend;
use crate::config::DetectorSettings;

/// Backend handle shared between the registry and the counter loop.
pub type SharedBackend = Arc<Mutex<dyn DetectorBackend>>;

/// Thread-safe registry of detector backends.
///
/// Backends are wrapped in `Mutex` because `DetectorBackend::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, SharedBackend>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: DetectorBackend + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Build the registry for a run and make `settings.backend` the default.
    ///
    /// The stub is always registered. Model-backed detectors are loaded only when selected,
    /// and a selected backend that cannot be loaded is an error rather than a silent stub run.
    pub fn from_settings(settings: &DetectorSettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(StubBackend::new());

        #[cfg(feature = "backend-tract")]
        if settings.backend == "yolov8" {
            let backend = TractBackend::new(&settings.model_path, settings.input_size)
                .with_context(|| {
                    format!(
                        "detector backend 'yolov8' could not load {}",
                        settings.model_path.display()
                    )
                })?
                .with_thresholds(settings.confidence_threshold, settings.iou_threshold);
            registry.register(backend);
        }

        registry.set_default(&settings.backend).with_context(|| {
            format!(
                "detector backend '{}' is unavailable in this build (available: {})",
                settings.backend,
                registry.list().join(", ")
            )
        })?;
        Ok(registry)
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<SharedBackend> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<SharedBackend> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Labels among `labels` that the default backend can never report.
    pub fn unknown_labels(&self, labels: &[String]) -> Result<Vec<String>> {
        let backend = self
            .default_backend()
            .ok_or_else(|| anyhow!("no detector backend registered"))?;
        let guard = backend
            .lock()
            .map_err(|_| anyhow!("default backend lock poisoned"))?;
        Ok(labels
            .iter()
            .filter(|label| !guard.knows_label(label))
            .cloned()
            .collect())
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::Detection;
    use crate::frame::Frame;

    struct PeopleOnly;

    impl DetectorBackend for PeopleOnly {
        fn name(&self) -> &'static str {
            "people"
        }

        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
            Ok(Vec::new())
        }

        fn knows_label(&self, label: &str) -> bool {
            label == "person"
        }
    }

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        registry.register(PeopleOnly);

        let default = registry.default_backend().unwrap();
        assert_eq!(default.lock().unwrap().name(), "stub");
        assert_eq!(registry.list(), vec!["people", "stub"]);
    }

    #[test]
    fn set_default_rejects_unknown_backend() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        assert!(registry.set_default("yolov8").is_err());
        registry.register(PeopleOnly);
        registry.set_default("people").unwrap();
        assert_eq!(registry.default_backend().unwrap().lock().unwrap().name(), "people");
    }

    fn settings(backend: &str) -> DetectorSettings {
        let mut settings = crate::config::CounterConfig::default().detector;
        settings.backend = backend.to_string();
        settings.model_path = "/nonexistent/model.onnx".into();
        settings
    }

    #[test]
    fn from_settings_selects_stub_when_asked() {
        let registry = BackendRegistry::from_settings(&settings("stub")).unwrap();
        let default = registry.default_backend().unwrap();
        assert_eq!(default.lock().unwrap().name(), "stub");
    }

    #[test]
    fn from_settings_fails_instead_of_falling_back() {
        for backend in ["yolov8", "nonesuch"] {
            let err = BackendRegistry::from_settings(&settings(backend)).err();
            assert!(err.is_some(), "{backend} fell back silently");
        }
    }

    #[test]
    fn unknown_labels_uses_default_backend_vocabulary() {
        let mut registry = BackendRegistry::new();
        registry.register(PeopleOnly);
        let labels = vec!["person".to_string(), "car".to_string()];
        assert_eq!(registry.unknown_labels(&labels).unwrap(), vec!["car"]);

        assert!(BackendRegistry::new().unknown_labels(&labels).is_err());
    }
}
