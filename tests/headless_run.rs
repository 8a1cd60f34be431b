use std::sync::{Arc, Mutex};

use object_counter::config::SourceSettings;
use object_counter::{
    open_source, ButtonRegistry, CountLog, CounterLoop, Detection, HeadlessDisplay, LoopSettings,
    Rect, SessionState, SharedBackend, StopReason, StubBackend,
};

#[test]
fn synthetic_run_writes_csv_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let log_path = dir.path().join("object_counts.csv");

    let settings = SourceSettings {
        uri: "stub://bench".to_string(),
        width: 320,
        height: 240,
        max_frames: Some(3),
        ..SourceSettings::default()
    };
    let mut source = open_source(&settings)?;
    source.connect()?;

    let detector: SharedBackend = Arc::new(Mutex::new(StubBackend::scripted(vec![
        vec![Detection::new("dog", 0.7, Rect::new(10, 100, 60, 150))],
        vec![],
    ])));
    let classes = vec!["person".to_string(), "dog".to_string()];
    let registry = Arc::new(ButtonRegistry::from_classes(&classes)?);

    let summary = CounterLoop::new(
        source,
        detector,
        Box::new(HeadlessDisplay::new()),
        registry,
        SessionState::new("dog"),
        LoopSettings::default(),
    )
    .with_log(CountLog::create(&log_path)?)
    .run()?;

    assert_eq!(summary.reason, StopReason::SourceExhausted);
    assert_eq!(summary.log_path.as_deref(), Some(log_path.as_path()));

    let contents = std::fs::read_to_string(&log_path)?;
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "Timestamp,Class,Count");
    let counts: Vec<&str> = lines[1..]
        .iter()
        .map(|line| line.rsplit(',').next().unwrap_or_default())
        .collect();
    assert_eq!(counts, vec!["1", "0", "1"]);
    assert!(lines[1..].iter().all(|line| line.contains(",dog,")));
    Ok(())
}
