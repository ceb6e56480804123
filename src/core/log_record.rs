//! Per-call structured record and the argument normalizer
//!
//! A log call takes any mix of text, JSON objects and error values. They are
//! folded left to right into one [`LogRecord`] whose three parts are kept
//! independently:
//!
//! - `err`: the last error argument
//! - `fields`: own keys of every object argument, later keys overwriting
//! - `text`: every scalar argument followed by a space

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field tag under which the error argument is stored
pub const ERROR_FIELD: &str = "err";

/// Error value carried by a log call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_stack: Option<bool>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Capture a Rust error: its message, type name and `source()` chain
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let short_name = type_name.rsplit("::").next().unwrap_or(type_name);

        let mut stack = vec![err.to_string()];
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        Self {
            error_type: Some(short_name.to_string()),
            message: err.to_string(),
            stack: Some(stack.join("\n    ")),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    #[must_use]
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_hide_stack(mut self, hide_stack: bool) -> Self {
        self.hide_stack = Some(hide_stack);
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.message.clone()))
    }
}

/// One argument of a log call
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Error(ErrorRecord),
    Object(Map<String, Value>),
    Text(String),
}

impl LogArg {
    /// Wrap a Rust error as an error argument
    pub fn error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        LogArg::Error(ErrorRecord::from_error(err))
    }

    /// Build an object argument holding a single field
    pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value.into());
        LogArg::Object(map)
    }
}

impl From<ErrorRecord> for LogArg {
    fn from(err: ErrorRecord) -> Self {
        LogArg::Error(err)
    }
}

impl From<Map<String, Value>> for LogArg {
    fn from(map: Map<String, Value>) -> Self {
        LogArg::Object(map)
    }
}

impl From<Value> for LogArg {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => LogArg::Object(map),
            Value::String(s) => LogArg::Text(s),
            other => LogArg::Text(other.to_string()),
        }
    }
}

impl From<String> for LogArg {
    fn from(s: String) -> Self {
        LogArg::Text(s)
    }
}

impl From<&str> for LogArg {
    fn from(s: &str) -> Self {
        LogArg::Text(s.to_string())
    }
}

impl From<&String> for LogArg {
    fn from(s: &String) -> Self {
        LogArg::Text(s.clone())
    }
}

macro_rules! text_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for LogArg {
                fn from(value: $ty) -> Self {
                    LogArg::Text(value.to_string())
                }
            }
        )*
    };
}

text_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64, bool, char);

/// Structured result of normalizing one log call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogRecord {
    pub err: Option<ErrorRecord>,
    pub fields: Map<String, Value>,
    pub text: Option<String>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold call arguments into a record
    pub fn normalize<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<LogArg>,
    {
        args.into_iter().fold(Self::new(), |mut record, arg| {
            record.push(arg.into());
            record
        })
    }

    /// Fold a single argument into the record
    pub fn push(&mut self, arg: LogArg) {
        match arg {
            LogArg::Error(err) => self.err = Some(err),
            LogArg::Object(map) => {
                for (key, value) in map {
                    self.fields.insert(key, value);
                }
            }
            LogArg::Text(s) => {
                let text = self.text.get_or_insert_with(String::new);
                text.push_str(&s);
                text.push(' ');
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.err.is_none() && self.fields.is_empty() && self.text.is_none()
    }

    /// Message part of the record, empty when no text argument was given
    pub fn message(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Fields handed to serializers: merged keys plus the error under `err`
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.fields.clone();
        if let Some(ref err) = self.err {
            fields.insert(ERROR_FIELD.to_string(), err.to_value());
        }
        fields
    }

    /// JSON view of the whole record
    ///
    /// Pure-text records render as a JSON string, anything else as an
    /// object with the text under `msg`.
    pub fn to_value(&self) -> Value {
        if self.err.is_none() && self.fields.is_empty() {
            return match self.text {
                Some(ref text) => Value::String(text.clone()),
                None => Value::Object(Map::new()),
            };
        }
        let mut fields = self.to_fields();
        if let Some(ref text) = self.text {
            fields.insert("msg".to_string(), Value::String(text.clone()));
        }
        Value::Object(fields)
    }

    /// JSON rendering with quote characters stripped, tested by match predicates
    pub fn safe_text(&self) -> String {
        self.to_value().to_string().replace('"', "")
    }
}
