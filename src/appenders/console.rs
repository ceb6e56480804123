//! Console appender rendering records for humans

use crate::core::{Appender, ConsoleMode, LogEntry, Result};
use colored::Colorize;
use serde_json::Value;
use std::io::{self, Write};

pub struct ConsoleAppender {
    mode: ConsoleMode,
    use_colors: bool,
    target: Box<dyn Write + Send + Sync>,
}

impl ConsoleAppender {
    /// Render to standard output in `mode`
    pub fn new(mode: ConsoleMode) -> Self {
        Self {
            mode,
            use_colors: true,
            target: Box::new(io::stdout()),
        }
    }

    /// Enable or disable ANSI colors
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Render into `target` instead of standard output
    ///
    /// # Example
    ///
    /// ```
    /// use structured_logger::appenders::ConsoleAppender;
    /// use structured_logger::ConsoleMode;
    ///
    /// let appender = ConsoleAppender::new(ConsoleMode::Simple)
    ///     .with_writer(std::io::stderr());
    /// ```
    #[must_use]
    pub fn with_writer<W: Write + Send + Sync + 'static>(mut self, target: W) -> Self {
        self.target = Box::new(target);
        self
    }

    pub fn mode(&self) -> ConsoleMode {
        self.mode
    }

    /// Render one entry according to the configured mode
    pub fn render(&self, entry: &LogEntry) -> Result<String> {
        if self.mode == ConsoleMode::Json {
            return Ok(entry.to_json_line()?);
        }

        let level = self.level_label(entry);
        let message = self.message_with_error(entry);
        let mut output = match self.mode {
            ConsoleMode::Short => format!(
                "{} {} {}: {}",
                entry.timestamp.format("%H:%M:%S%.3fZ"),
                level,
                entry.name,
                message
            ),
            ConsoleMode::Long => format!(
                "[{}] {}: {}/{} on {}: {}",
                entry.time(),
                level,
                entry.name,
                entry.pid,
                entry.hostname,
                message
            ),
            ConsoleMode::Simple | ConsoleMode::Json => format!("{}: {}", level, message),
        };

        for (key, value) in &entry.payload_fields() {
            if key == "err" {
                continue;
            }
            output.push_str(&format!("\n    {}: {}", key, indent(&pretty(value))));
        }
        if let Some(stack) = visible_stack(entry) {
            output.push_str(&format!("\n    {}", indent(stack)));
        }

        Ok(output)
    }

    fn level_label(&self, entry: &LogEntry) -> String {
        let label = format!("{:>5}", entry.level.to_str());
        if self.use_colors {
            label.color(entry.level.color_code()).to_string()
        } else {
            label
        }
    }

    /// Message text, falling back to the error message when no text was logged
    fn message_with_error(&self, entry: &LogEntry) -> String {
        let message = entry.message.trim_end();
        match error_message(entry) {
            Some(err) if message.is_empty() => err.to_string(),
            Some(err) if visible_stack(entry).is_none() => format!("{} ({})", message, err),
            _ => message.to_string(),
        }
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new(ConsoleMode::default())
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.render(entry)?;
        writeln!(self.target, "{}", output)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.target.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

fn error_message(entry: &LogEntry) -> Option<&str> {
    entry.fields.get("err")?.get("message")?.as_str()
}

/// Stack of the `err` field unless the error asks to hide it
fn visible_stack(entry: &LogEntry) -> Option<&str> {
    let err = entry.fields.get("err")?;
    if err.get("hideStack").and_then(Value::as_bool).unwrap_or(false) {
        return None;
    }
    err.get("stack")?.as_str()
}

fn pretty(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn indent(text: &str) -> String {
    text.replace('\n', "\n    ")
}
