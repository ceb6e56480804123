//! File appender writing one JSON record per line

use crate::core::{Appender, LogEntry, LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct FileAppender {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileAppender {
    /// Open `path` for appending, creating missing parent directories
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Appender for FileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;

        let mut output = entry.to_json_line()?;
        output.push('\n');

        writer.write_all(output.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use serde_json::{json, Map, Value};
    use tempfile::tempdir;

    #[test]
    fn test_writes_json_lines() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("svc_test.log");

        let mut appender = FileAppender::new(&log_path)?;
        for i in 0..3 {
            let mut fields = Map::new();
            fields.insert("iteration".into(), json!(i));
            let entry = LogEntry::new(LogLevel::Info, format!("step {}", i)).with_fields(fields);
            appender.append(&entry)?;
        }
        appender.flush()?;

        let content = fs::read_to_string(&log_path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);

        for (i, line) in lines.iter().enumerate() {
            let parsed: Value = serde_json::from_str(line)?;
            assert_eq!(parsed["iteration"], i);
            assert_eq!(parsed["level"], 30);
        }
        Ok(())
    }

    #[test]
    fn test_appends_to_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let log_path = dir.path().join("append.log");
        fs::write(&log_path, "{\"existing\":true}\n")?;

        let mut appender = FileAppender::new(&log_path)?;
        appender.append(&LogEntry::new(LogLevel::Warn, "new"))?;
        appender.flush()?;

        assert_eq!(fs::read_to_string(&log_path)?.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_unusable_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();

        assert!(FileAppender::new(blocker.join("app.log")).is_err());
    }
}
