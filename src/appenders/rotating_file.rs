//! Rotating file appender
//!
//! Writes JSON lines like [`FileAppender`](super::FileAppender) and cycles
//! the file once its period has elapsed. The current file keeps its name;
//! older content moves to `name.1` (newest) through `name.N` (oldest).

use crate::core::appender::Appender;
use crate::core::config::{RotationConfig, DEFAULT_ROTATION_COUNT};
use crate::core::error::{LoggerError, Result};
use crate::core::log_entry::LogEntry;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const HOUR: u64 = 3600;
const DAY: u64 = 24 * HOUR;

/// When and how many rotated files are kept
///
/// # Examples
///
/// ```
/// use structured_logger::appenders::RotationPolicy;
/// use std::time::Duration;
///
/// let policy = RotationPolicy::parse("6h", 4).unwrap();
/// assert_eq!(policy.period, Duration::from_secs(6 * 3600));
/// assert_eq!(policy.count, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Time between rotations
    pub period: Duration,
    /// Maximum number of rotated files to keep
    pub count: usize,
    /// Whether to gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(DAY),
            count: DEFAULT_ROTATION_COUNT,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new(period: Duration, count: usize) -> Self {
        Self {
            period,
            count,
            compress: false,
        }
    }

    /// Build a policy from a period string and a retained count
    pub fn parse(period: &str, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(LoggerError::config("rotation", "count must be at least 1"));
        }
        Ok(Self::new(parse_period(period)?, count))
    }

    pub fn from_config(config: &RotationConfig) -> Result<Self> {
        Ok(Self::parse(&config.period, config.retained())?.with_compression(config.compress))
    }

    /// Enable compression
    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

/// Parse a rotation period
///
/// Accepts `<n>h`, `<n>d`, `<n>w`, `<n>m` (months of 30 days), `<n>y`
/// (365 days), the aliases `hourly`, `daily`, `weekly`, `monthly`,
/// `yearly`, and otherwise any duration `humantime` understands
/// (`90min`, `500ms`).
pub fn parse_period(period: &str) -> Result<Duration> {
    let period = period.trim();
    let invalid = |message: String| LoggerError::config("rotation.period", message);

    let alias = match period {
        "hourly" => Some(HOUR),
        "daily" => Some(DAY),
        "weekly" => Some(7 * DAY),
        "monthly" => Some(30 * DAY),
        "yearly" => Some(365 * DAY),
        _ => None,
    };
    if let Some(secs) = alias {
        return Ok(Duration::from_secs(secs));
    }

    let split = period
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(period.len());
    let (digits, unit) = period.split_at(split);
    let unit_secs = match unit {
        "h" => Some(HOUR),
        "d" => Some(DAY),
        "w" => Some(7 * DAY),
        "m" => Some(30 * DAY),
        "y" => Some(365 * DAY),
        _ => None,
    };

    let duration = match (digits.parse::<u64>(), unit_secs) {
        (Ok(n), Some(unit_secs)) => n
            .checked_mul(unit_secs)
            .map(Duration::from_secs)
            .ok_or_else(|| invalid(format!("'{}' is too long", period)))?,
        _ => humantime::parse_duration(period)
            .map_err(|e| invalid(format!("'{}' is not a valid period: {}", period, e)))?,
    };

    if duration.is_zero() {
        return Err(invalid(format!("'{}' must be longer than zero", period)));
    }
    Ok(duration)
}

/// File appender that rotates on a fixed period
///
/// # Examples
///
/// ```no_run
/// use structured_logger::appenders::{RotatingFileAppender, RotationPolicy};
///
/// let policy = RotationPolicy::parse("1d", 7).unwrap().with_compression(true);
/// let appender = RotatingFileAppender::with_policy("/var/log/billing_production.log", policy).unwrap();
/// ```
pub struct RotatingFileAppender {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    /// Timestamp of the last rotation
    last_rotation: SystemTime,
    /// Counter for consecutive deletion failures (reset on successful deletion)
    deletion_failure_count: usize,
}

impl RotatingFileAppender {
    /// Create a rotating appender with the default policy
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Create a rotating appender with a custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, last_rotation) = Self::open_file(&base_path)?;

        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            last_rotation,
            deletion_failure_count: 0,
        })
    }

    /// Open the log file, reporting its modification time
    fn open_file(path: &Path) -> Result<(File, SystemTime)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let metadata = file.metadata().map_err(|e| {
            LoggerError::file_appender(
                path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?;
        let last_rotation = metadata.modified().unwrap_or_else(|_| SystemTime::now());
        Ok((file, last_rotation))
    }

    fn should_rotate(&self) -> bool {
        SystemTime::now()
            .duration_since(self.last_rotation)
            .unwrap_or(Duration::ZERO)
            >= self.policy.period
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        // Drop whatever sits in the slot about to fall off the end
        const MAX_DELETION_FAILURES: usize = 5;
        let oldest = self.backup_path(self.policy.count);
        let mut deletion_failed = false;
        for candidate in [Self::compressed_path(&oldest), oldest] {
            if candidate.exists() {
                if let Err(e) = fs::remove_file(&candidate) {
                    deletion_failed = true;
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove oldest backup {}: {} (failure #{}/{})",
                        candidate.display(),
                        e,
                        self.deletion_failure_count + 1,
                        MAX_DELETION_FAILURES
                    );
                }
            }
        }

        if deletion_failed {
            self.deletion_failure_count += 1;
            if self.deletion_failure_count >= MAX_DELETION_FAILURES {
                return Err(LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!(
                        "Rotation aborted: failed to delete old backup files {} consecutive times",
                        self.deletion_failure_count
                    ),
                ));
            }
        } else {
            self.deletion_failure_count = 0;
        }

        for index in (1..self.policy.count).rev() {
            let from = self.backup_path(index);
            let to = self.backup_path(index + 1);
            let from_gz = Self::compressed_path(&from);

            if from_gz.exists() {
                Self::shift(&from_gz, &Self::compressed_path(&to))?;
            } else if from.exists() {
                Self::shift(&from, &to)?;
            }
        }

        let newest = self.backup_path(1);
        if self.base_path.exists() {
            fs::rename(&self.base_path, &newest).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;

            if self.policy.compress {
                self.compress_file(&newest)?;
            }
        }

        let (file, _) = Self::open_file(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.last_rotation = SystemTime::now();

        Ok(())
    }

    /// Rename, replacing the destination on platforms where rename refuses to
    fn shift(from: &Path, to: &Path) -> Result<()> {
        if fs::rename(from, to).is_ok() {
            return Ok(());
        }
        if to.exists() {
            if let Err(e) = fs::remove_file(to) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove {} before shifting {} onto it: {}",
                    to.display(),
                    from.display(),
                    e
                );
            }
        }
        fs::rename(from, to).map_err(|e| {
            LoggerError::file_rotation(
                from.display().to_string(),
                format!("Failed to rotate backup files: {}", e),
            )
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut path = self.base_path.clone();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log")
            .to_string();
        path.set_file_name(format!("{}.{}", filename, index));
        path
    }

    fn compressed_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(".gz");
        PathBuf::from(name)
    }

    /// Gzip a rotated file, removing the original only once the archive is complete
    fn compress_file(&self, path: &Path) -> Result<()> {
        use std::io::{BufReader, Read};

        let gz_path = Self::compressed_path(path);
        let mut temp_name = gz_path.as_os_str().to_os_string();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        let compress = || -> std::io::Result<()> {
            let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_path)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());

            let mut buffer = vec![0u8; 64 * 1024];
            loop {
                let bytes_read = reader.read(&mut buffer)?;
                if bytes_read == 0 {
                    break;
                }
                encoder.write_all(&buffer[..bytes_read])?;
            }
            encoder.finish()?.flush()?;
            fs::rename(&temp_path, &gz_path)
        };

        if let Err(e) = compress() {
            let _ = fs::remove_file(&temp_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress {}", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[LOGGER WARNING] Compressed {} but failed to remove the original: {}",
                path.display(),
                e
            );
        }

        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn last_rotation(&self) -> SystemTime {
        self.last_rotation
    }
}

impl Appender for RotatingFileAppender {
    fn name(&self) -> &str {
        "rotating-file"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        if self.should_rotate() {
            if let Err(e) = self.rotate() {
                eprintln!(
                    "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                    e
                );

                if self.writer.is_none() {
                    let (file, _) = Self::open_file(&self.base_path).map_err(|reopen| {
                        eprintln!(
                            "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                            reopen
                        );
                        e
                    })?;
                    self.writer = Some(BufWriter::new(file));
                }

                // Wait a full period before trying again
                self.last_rotation = SystemTime::now();
            }
        }

        let mut line = entry.to_json_line()?;
        line.push('\n');

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("Writer not initialized"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_appender(
                self.base_path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileAppender {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
