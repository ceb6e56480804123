//! Field serializers applied when a stream writes an entry
//!
//! A serializer is keyed by the field tag it handles (`req`, `res`, `err`).
//! It never fails: missing inputs simply produce missing outputs.

use super::log_record::ERROR_FIELD;
use super::redactor::Redactor;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const REQUEST_FIELD: &str = "req";
pub const RESPONSE_FIELD: &str = "res";

/// Transform applied to the value stored under a tag
pub type SerializerFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Serializers for the tagged fields of a record
#[derive(Clone)]
pub struct SerializerSet {
    serializers: HashMap<String, SerializerFn>,
}

impl SerializerSet {
    /// Default `req`, `res` and `err` serializers using the global redactor
    pub fn new() -> Self {
        Self::with_redactor(Redactor::global().clone())
    }

    /// Default serializers redacting with `redactor`
    pub fn with_redactor(redactor: Redactor) -> Self {
        let redactor = Arc::new(redactor);
        let req_redactor = Arc::clone(&redactor);

        Self::empty()
            .with_serializer(REQUEST_FIELD, move |req| serialize_request(req, &req_redactor))
            .with_serializer(RESPONSE_FIELD, move |res| serialize_response(res, &redactor))
            .with_serializer(ERROR_FIELD, serialize_error)
    }

    /// A set without any serializer; fields are written as given
    pub fn empty() -> Self {
        Self {
            serializers: HashMap::new(),
        }
    }

    /// Register or replace the serializer for `tag`
    #[must_use]
    pub fn with_serializer<F>(mut self, tag: impl Into<String>, serializer: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.serializers.insert(tag.into(), Arc::new(serializer));
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.serializers.contains_key(tag)
    }

    /// Apply the matching serializer to every tagged field
    pub fn apply(&self, fields: &Map<String, Value>) -> Map<String, Value> {
        fields
            .iter()
            .map(|(key, value)| {
                let serialized = match self.serializers.get(key) {
                    Some(serializer) => serializer(value),
                    None => value.clone(),
                };
                (key.clone(), serialized)
            })
            .collect()
    }
}

impl Default for SerializerSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.serializers.keys().collect();
        tags.sort();
        f.debug_struct("SerializerSet").field("tags", &tags).finish()
    }
}

fn copy_fields(source: &Value, target: &mut Map<String, Value>, pairs: &[(&str, &str)]) {
    for (from, to) in pairs {
        if let Some(value) = source.get(*from) {
            target.insert((*to).to_string(), value.clone());
        }
    }
}

fn copy_redacted(
    source: &Value,
    target: &mut Map<String, Value>,
    keys: &[&str],
    redactor: &Redactor,
) {
    for key in keys {
        if let Some(value) = source.get(*key) {
            target.insert((*key).to_string(), redactor.sanitize(value));
        }
    }
}

/// Flatten an HTTP request into `meta`, routing info and redacted payloads
pub fn serialize_request(req: &Value, redactor: &Redactor) -> Value {
    let mut out = Map::new();
    if !req.is_object() {
        return Value::Object(out);
    }

    let mut meta = Map::new();
    copy_fields(req, &mut meta, &[("requestId", "requestId"), ("userId", "userId")]);
    out.insert("meta".to_string(), Value::Object(meta));

    copy_fields(
        req,
        &mut out,
        &[
            ("url", "url"),
            ("method", "method"),
            ("originalUrl", "originalUrl"),
            ("params", "params"),
        ],
    );
    copy_redacted(req, &mut out, &["headers", "body", "query"], redactor);

    Value::Object(out)
}

/// Flatten an HTTP response into redacted headers, status and timing
pub fn serialize_response(res: &Value, redactor: &Redactor) -> Value {
    let mut out = Map::new();
    if !res.is_object() {
        return Value::Object(out);
    }

    copy_redacted(res, &mut out, &["_headers"], redactor);
    copy_fields(
        res,
        &mut out,
        &[("statusCode", "statusCode"), ("responseTime", "responseTime")],
    );

    Value::Object(out)
}

/// Flatten an error, exposing its type tag as `name`
pub fn serialize_error(err: &Value) -> Value {
    let mut out = Map::new();
    match err {
        Value::Object(_) => copy_fields(
            err,
            &mut out,
            &[
                ("id", "id"),
                ("code", "code"),
                ("errorType", "name"),
                ("statusCode", "statusCode"),
                ("level", "level"),
                ("message", "message"),
                ("context", "context"),
                ("help", "help"),
                ("stack", "stack"),
                ("hideStack", "hideStack"),
            ],
        ),
        Value::String(message) => {
            out.insert("message".to_string(), Value::String(message.clone()));
        }
        _ => {}
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::log_record::ErrorRecord;
    use serde_json::json;

    #[test]
    fn test_serialize_request() {
        let req = json!({
            "requestId": "r-1",
            "userId": 42,
            "url": "/login?next=/",
            "method": "POST",
            "originalUrl": "/api/login?next=/",
            "params": { "id": "7" },
            "headers": { "authorization": "Bearer x", "accept": "*/*" },
            "body": { "username": "bob", "password": "pw", "profile": { "pin": "0000" } },
            "query": { "next": "/" },
            "socket": { "ignored": true }
        });

        let out = serialize_request(&req, &Redactor::new());
        assert_eq!(out["meta"], json!({ "requestId": "r-1", "userId": 42 }));
        assert_eq!(out["method"], "POST");
        assert_eq!(out["params"], json!({ "id": "7" }));
        assert_eq!(out["headers"], json!({ "accept": "*/*" }));
        assert_eq!(out["body"], json!({ "username": "bob", "profile": {} }));
        assert!(out.get("socket").is_none());
    }

    #[test]
    fn test_serialize_request_missing_fields() {
        let out = serialize_request(&json!({ "url": "/" }), &Redactor::new());
        assert_eq!(out, json!({ "meta": {}, "url": "/" }));

        let out = serialize_request(&json!("GET /"), &Redactor::new());
        assert_eq!(out, json!({}));
    }

    #[test]
    fn test_serialize_response() {
        let res = json!({
            "_headers": { "set-cookie": "sid=1", "content-type": "text/html" },
            "statusCode": 200,
            "responseTime": 12.5
        });

        let out = serialize_response(&res, &Redactor::new());
        assert_eq!(
            out,
            json!({
                "_headers": { "content-type": "text/html" },
                "statusCode": 200,
                "responseTime": 12.5
            })
        );
    }

    #[test]
    fn test_serialize_error_maps_type_to_name() {
        let err = ErrorRecord::new("not found")
            .with_error_type("NotFoundError")
            .with_status_code(404)
            .with_help("check the id");

        let out = serialize_error(&err.to_value());
        assert_eq!(out["name"], "NotFoundError");
        assert_eq!(out["statusCode"], 404);
        assert_eq!(out["message"], "not found");
        assert!(out.get("errorType").is_none());
        assert!(out.get("stack").is_none());
    }

    #[test]
    fn test_apply_only_touches_tagged_fields() {
        let set = SerializerSet::new();
        let mut fields = Map::new();
        fields.insert("res".into(), json!({ "statusCode": 500, "extra": 1 }));
        fields.insert("password".into(), json!("untagged fields are not redacted"));

        let out = set.apply(&fields);
        assert_eq!(out["res"], json!({ "statusCode": 500 }));
        assert_eq!(out["password"], fields["password"]);
    }

    #[test]
    fn test_custom_serializer() {
        let set = SerializerSet::empty().with_serializer("user", |u| json!({ "id": u["id"] }));
        let mut fields = Map::new();
        fields.insert("user".into(), json!({ "id": 1, "email": "a@b.c" }));

        assert_eq!(set.apply(&fields)["user"], json!({ "id": 1 }));
        assert!(set.contains("user"));
        assert!(!set.contains("req"));
    }
}
