//! Removal of sensitive keys from structured data
//!
//! Keys are matched case-insensitively as substrings against a fixed set of
//! terms, at every nesting depth, so `Authorization`, `X-Pin-Code` and
//! `user_password` are all dropped from the sanitized copy.

use super::error::{LoggerError, Result};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::sync::LazyLock;

/// Terms that mark a key as sensitive
pub const DEFAULT_SENSITIVE_TERMS: [&str; 4] = ["password", "authorization", "cookie", "pin"];

static GLOBAL: LazyLock<Redactor> = LazyLock::new(Redactor::new);

/// Strips sensitive keys from JSON objects
#[derive(Debug, Clone)]
pub struct Redactor {
    pattern: Regex,
}

impl Redactor {
    /// Create a redactor for [`DEFAULT_SENSITIVE_TERMS`]
    pub fn new() -> Self {
        let pattern = build_pattern(&DEFAULT_SENSITIVE_TERMS)
            .expect("default sensitive terms are valid literals");
        Self { pattern }
    }

    /// Process-wide redactor shared by the default serializers
    pub fn global() -> &'static Redactor {
        &GLOBAL
    }

    /// Create a redactor for a custom set of terms
    ///
    /// Terms are matched literally; regex metacharacters are escaped.
    pub fn with_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: Vec<String> = terms.into_iter().map(|t| t.as_ref().to_string()).collect();
        if terms.is_empty() {
            return Err(LoggerError::config("redactor", "at least one sensitive term is required"));
        }
        if terms.iter().any(|t| t.is_empty()) {
            return Err(LoggerError::config("redactor", "sensitive terms must not be empty"));
        }
        let pattern = build_pattern(&terms)
            .map_err(|e| LoggerError::config("redactor", e.to_string()))?;
        Ok(Self { pattern })
    }

    /// Whether a key would be removed
    pub fn is_sensitive(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }

    /// Return a copy of `value` with every sensitive key removed
    ///
    /// Objects nested in objects or arrays are visited at any depth; the
    /// walk uses a heap stack, so nesting depth is bounded only by memory.
    /// Scalars pass through unchanged.
    pub fn sanitize(&self, value: &Value) -> Value {
        let mut sanitized = value.clone();
        {
            let mut stack: Vec<&mut Value> = vec![&mut sanitized];

            while let Some(node) = stack.pop() {
                match node {
                    Value::Object(map) => {
                        map.retain(|key, _| !self.is_sensitive(key));
                        stack.extend(map.values_mut());
                    }
                    Value::Array(items) => {
                        stack.extend(items.iter_mut());
                    }
                    _ => {}
                }
            }
        }

        sanitized
    }

    /// Sanitize a top-level object
    pub fn sanitize_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        match self.sanitize(&Value::Object(map.clone())) {
            Value::Object(sanitized) => sanitized,
            _ => Map::new(),
        }
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

fn build_pattern<S: AsRef<str>>(terms: &[S]) -> std::result::Result<Regex, regex::Error> {
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t.as_ref()))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&alternation).case_insensitive(true).build()
}
