//! Append-only CSV count log.
//!
//! The file is truncated at startup and starts with the `Timestamp,Class,Count` header.
//! Each processed frame appends one row, flushed before the next frame. When a row cannot
//! be written completely, the sink is cut back to the last complete row before the error
//! is returned, so a row is either fully present or absent.

use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};

pub const LOG_HEADER: &str = "Timestamp,Class,Count";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for count log bytes that can drop a partially written tail.
pub trait LogSink: Write + Send {
    /// Discard everything after the first `len` bytes and continue writing from there.
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LogSink for File {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

impl LogSink for Vec<u8> {
    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.truncate(len as usize);
        Ok(())
    }
}

/// One row of the count log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub class: String,
    pub count: usize,
}

impl LogRecord {
    pub fn now(class: impl Into<String>, count: usize) -> Self {
        Self {
            timestamp: Local::now(),
            class: class.into(),
            count,
        }
    }

    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            csv_field(&self.class),
            self.count
        )
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

pub struct CountLog {
    path: Option<PathBuf>,
    sink: Box<dyn LogSink>,
    /// Bytes belonging to complete lines.
    committed: u64,
    rows: u64,
}

impl CountLog {
    /// Create (or truncate) the log file and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("failed to create count log {}", path.display()))?;
        let mut log = Self::from_sink(Box::new(file))?;
        log.path = Some(path.to_path_buf());
        Ok(log)
    }

    /// Wrap an empty sink. The header is written immediately.
    pub fn from_sink(sink: Box<dyn LogSink>) -> Result<Self> {
        let mut log = Self {
            path: None,
            sink,
            committed: 0,
            rows: 0,
        };
        log.write_line(LOG_HEADER)
            .context("failed to write count log header")?;
        Ok(log)
    }

    pub fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.write_line(&record.to_csv_row())
            .with_context(|| format!("failed to append count log row {}", self.rows + 1))?;
        self.rows += 1;
        Ok(())
    }

    /// Rows appended after the header.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let written = self
            .sink
            .write_all(buf.as_bytes())
            .and_then(|()| self.sink.flush());
        if let Err(err) = written {
            if let Err(rollback) = self.sink.truncate_to(self.committed) {
                return Err(anyhow!(
                    "{}; dropping the partial row also failed: {}",
                    err,
                    rollback
                ));
            }
            return Err(err.into());
        }
        self.committed += buf.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io;

    fn fixed_record(class: &str, count: usize) -> LogRecord {
        LogRecord {
            timestamp: Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap(),
            class: class.to_string(),
            count,
        }
    }

    #[test]
    fn row_uses_local_timestamp_format() {
        assert_eq!(fixed_record("person", 2).to_csv_row(), "2024-03-09 07:05:01,person,2");
    }

    #[test]
    fn fields_with_delimiters_are_quoted() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("dog"), "dog");
    }

    #[test]
    fn create_truncates_and_writes_header() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("counts.csv");
        std::fs::write(&path, "stale contents\nfrom before\n")?;

        let mut log = CountLog::create(&path)?;
        log.append(&fixed_record("car", 0))?;
        log.append(&fixed_record("car", 3))?;
        assert_eq!(log.rows(), 2);
        assert_eq!(log.path(), Some(path.as_path()));

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(
            contents,
            "Timestamp,Class,Count\n2024-03-09 07:05:01,car,0\n2024-03-09 07:05:01,car,3\n"
        );
        Ok(())
    }

    /// Accepts `budget` bytes, then fails every write.
    struct ShortSink {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::new(io::ErrorKind::Other, "no space left on device"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogSink for ShortSink {
        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    /// Forwards to a shared `ShortSink` so the test can inspect it afterwards.
    struct Shared(std::sync::Arc<std::sync::Mutex<ShortSink>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogSink for Shared {
        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.0.lock().unwrap().truncate_to(len)
        }
    }

    #[test]
    fn failed_append_leaves_no_partial_row() {
        let header_len = LOG_HEADER.len() + 1;
        let inner = std::sync::Arc::new(std::sync::Mutex::new(ShortSink {
            data: Vec::new(),
            budget: header_len + 10,
        }));
        let mut log = CountLog::from_sink(Box::new(Shared(inner.clone()))).unwrap();

        let err = log.append(&fixed_record("person", 4)).unwrap_err();
        assert!(format!("{:#}", err).contains("no space left"));
        assert_eq!(log.rows(), 0);
        let data = inner.lock().unwrap().data.clone();
        assert_eq!(String::from_utf8(data).unwrap(), "Timestamp,Class,Count\n");
    }

    #[test]
    fn file_sink_truncates_back_to_committed_length() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("counts.csv");
        let mut file = File::create(&path)?;
        file.write_all(b"Timestamp,Class,Count\n2024-03-09 07:")?;
        file.truncate_to(LOG_HEADER.len() as u64 + 1)?;
        file.write_all(b"next\n")?;
        drop(file);

        assert_eq!(std::fs::read_to_string(&path)?, "Timestamp,Class,Count\nnext\n");
        Ok(())
    }

    #[test]
    fn unwritable_path_fails_to_create() {
        let err = CountLog::create("/nonexistent-dir/for/sure/counts.csv").err();
        assert!(err.is_some());
    }
}
