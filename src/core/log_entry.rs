//! Entry handed to a sink after a stream has accepted a record

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Keys owned by the entry envelope
const RESERVED_KEYS: [&str; 7] = ["name", "hostname", "pid", "level", "msg", "time", "v"];

/// Object holding record fields whose names collide with the envelope
pub const SHADOWED_FIELDS_KEY: &str = "fields";

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Logger name (the configured domain)
    pub name: String,
    pub hostname: String,
    pub pid: u32,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Serialized record fields
    pub fields: Map<String, Value>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>) -> Self {
        Self {
            level,
            name: String::new(),
            hostname: String::new(),
            pid: std::process::id(),
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            fields: Map::new(),
        }
    }

    #[must_use]
    pub fn with_origin(mut self, name: impl Into<String>, hostname: impl Into<String>) -> Self {
        self.name = name.into();
        self.hostname = hostname.into();
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields = fields;
        self
    }

    /// Record fields as written next to the envelope
    ///
    /// Fields named like an envelope key (`name`, `level`, `time`, ..) are
    /// moved under [`SHADOWED_FIELDS_KEY`], merged into a `fields` object
    /// the caller already supplied. A non-object `fields` value is kept
    /// inside that object under its own name.
    pub fn payload_fields(&self) -> Map<String, Value> {
        let (shadowed, mut payload): (Map<String, Value>, Map<String, Value>) = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .partition(|(key, _)| RESERVED_KEYS.contains(&key.as_str()));

        if shadowed.is_empty() {
            return payload;
        }
        let container = match payload.remove(SHADOWED_FIELDS_KEY) {
            Some(Value::Object(mut existing)) => {
                existing.extend(shadowed);
                existing
            }
            Some(other) => {
                let mut container = shadowed;
                container.insert(SHADOWED_FIELDS_KEY.to_string(), other);
                container
            }
            None => shadowed,
        };
        payload.insert(SHADOWED_FIELDS_KEY.to_string(), Value::Object(container));
        payload
    }

    /// Timestamp as written into records: RFC 3339, milliseconds, UTC
    pub fn time(&self) -> String {
        self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    }

    /// Bunyan-layout JSON object
    pub fn to_json_value(&self) -> Value {
        let mut record = Map::new();
        record.insert("name".to_string(), Value::String(self.name.clone()));
        record.insert("hostname".to_string(), Value::String(self.hostname.clone()));
        record.insert("pid".to_string(), Value::Number(self.pid.into()));
        record.insert("level".to_string(), Value::Number(self.level.code().into()));
        record.extend(self.payload_fields());
        record.insert("msg".to_string(), Value::String(self.message.clone()));
        record.insert("time".to_string(), Value::String(self.time()));
        record.insert("v".to_string(), Value::Number(0.into()));
        Value::Object(record)
    }

    /// One JSON line without the trailing newline
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_json_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_newlines_escaped() {
        let entry = LogEntry::new(LogLevel::Info, "line one\nERROR fake");
        assert_eq!(entry.message, "line one\\nERROR fake");
    }

    #[test]
    fn test_json_line_layout() {
        let mut fields = Map::new();
        fields.insert("userId".into(), json!(7));
        fields.insert("level".into(), json!("shadowed"));

        let entry = LogEntry::new(LogLevel::Warn, "slow query ")
            .with_origin("billing", "api-1")
            .with_fields(fields);

        let line = entry.to_json_line().unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();

        assert_eq!(parsed["name"], "billing");
        assert_eq!(parsed["hostname"], "api-1");
        assert_eq!(parsed["level"], 40);
        assert_eq!(parsed["msg"], "slow query ");
        assert_eq!(parsed["userId"], 7);
        assert_eq!(parsed["fields"], json!({ "level": "shadowed" }));
        assert_eq!(parsed["v"], 0);
        assert!(parsed["time"].as_str().unwrap().ends_with('Z'));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_colliding_fields_are_kept() {
        let fields = match json!({ "name": "alice", "level": "gold", "time": 12, "plan": "pro" }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let entry = LogEntry::new(LogLevel::Info, "")
            .with_origin("svc", "localhost")
            .with_fields(fields);

        let record = entry.to_json_value();
        assert_eq!(record["name"], "svc");
        assert_eq!(record["level"], 30);
        assert_eq!(record["plan"], "pro");
        assert_eq!(
            record["fields"],
            json!({ "name": "alice", "level": "gold", "time": 12 })
        );
    }

    #[test]
    fn test_colliding_fields_merge_into_existing_container() {
        let object = match json!({ "fields": { "a": 1 }, "pid": 9 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let entry = LogEntry::new(LogLevel::Info, "").with_fields(object);
        assert_eq!(entry.payload_fields()["fields"], json!({ "a": 1, "pid": 9 }));

        let scalar = match json!({ "fields": "raw", "v": 2 }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let entry = LogEntry::new(LogLevel::Info, "").with_fields(scalar);
        assert_eq!(entry.payload_fields()["fields"], json!({ "fields": "raw", "v": 2 }));
    }

    #[test]
    fn test_plain_fields_untouched() {
        let mut fields = Map::new();
        fields.insert("fields".into(), json!([1, 2]));
        let entry = LogEntry::new(LogLevel::Info, "").with_fields(fields.clone());
        assert_eq!(entry.payload_fields(), fields);
    }
}
