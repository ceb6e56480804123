//! Property-based tests for structured_logger using proptest

use proptest::prelude::*;
use serde_json::{Map, Value};
use structured_logger::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

/// Keys that sometimes embed a sensitive term in varying case
fn any_key() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-z]{1,8}",
        1 => ("[a-z]{0,3}", prop_oneof![
            Just("password"),
            Just("Authorization"),
            Just("COOKIE"),
            Just("Pin"),
        ], "[a-z]{0,3}")
            .prop_map(|(pre, term, post)| format!("{}{}{}", pre, term, post)),
    ]
}

fn any_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(6, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(any_key(), inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Walk every object key at any depth
fn collect_keys(value: &Value, keys: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                keys.push(key.clone());
                collect_keys(child, keys);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_keys(item, keys)),
        _ => {}
    }
}

fn is_sensitive(key: &str) -> bool {
    let lower = key.to_lowercase();
    ["password", "authorization", "cookie", "pin"]
        .iter()
        .any(|term| lower.contains(term))
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().to_lowercase().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering of levels agrees with their numeric codes
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a <= b, a.code() <= b.code());
        prop_assert_eq!(a.passes(b), a.code() >= b.code());
    }
}

// ============================================================================
// Redactor Tests
// ============================================================================

proptest! {
    #[test]
    fn test_sanitize_removes_sensitive_keys(value in any_json()) {
        let sanitized = Redactor::global().sanitize(&value);

        let mut keys = Vec::new();
        collect_keys(&sanitized, &mut keys);
        for key in keys {
            prop_assert!(!is_sensitive(&key), "sensitive key survived: {}", key);
        }
    }

    #[test]
    fn test_sanitize_keeps_other_keys(map in prop::collection::btree_map("[a-z]{1,8}", any_json(), 0..6)) {
        let clean: Map<String, Value> = map
            .into_iter()
            .filter(|(key, _)| !is_sensitive(key))
            .collect();
        let sanitized = Redactor::global().sanitize_map(&clean);

        for key in clean.keys() {
            prop_assert!(sanitized.contains_key(key), "key dropped: {}", key);
        }
        prop_assert_eq!(sanitized.len(), clean.len());
    }

    #[test]
    fn test_sanitize_idempotent(value in any_json()) {
        let redactor = Redactor::global();
        let once = redactor.sanitize(&value);
        prop_assert_eq!(redactor.sanitize(&once), once);
    }

    /// Values without any object pass through untouched
    #[test]
    fn test_sanitize_scalars_unchanged(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let value = Value::from(items);
        prop_assert_eq!(Redactor::global().sanitize(&value), value);
    }
}

/// Wrap `leaf` in `depth` levels; odd levels are arrays, even levels objects
/// that also carry a sensitive sibling key
fn deep_nest(leaf: Value, depth: usize) -> Value {
    (0..depth).fold(leaf, |inner, level| {
        if level % 2 == 1 {
            Value::Array(vec![inner, Value::from(level)])
        } else {
            serde_json::json!({ "next": inner, "Authorization": level })
        }
    })
}

#[test]
fn test_sanitize_far_below_any_fixed_depth() {
    for depth in [64, 65, 129, 500] {
        let value = deep_nest(serde_json::json!({ "pin": "0000", "ok": 1 }), depth);
        let sanitized = Redactor::global().sanitize(&value);

        let mut keys = Vec::new();
        collect_keys(&sanitized, &mut keys);
        assert!(keys.iter().all(|k| !is_sensitive(k)), "sensitive key left at depth {}", depth);
        assert!(keys.iter().any(|k| k == "ok"), "leaf lost at depth {}", depth);
    }
}

proptest! {
    /// Generated trees buried below 64 levels of objects and arrays
    #[test]
    fn test_sanitize_deep_trees(value in any_json(), depth in 65usize..160) {
        let sanitized = Redactor::global().sanitize(&deep_nest(value, depth));

        let mut keys = Vec::new();
        collect_keys(&sanitized, &mut keys);
        for key in keys {
            prop_assert!(!is_sensitive(&key), "sensitive key survived: {}", key);
        }
    }
}

// ============================================================================
// Normalizer Tests
// ============================================================================

proptest! {
    #[test]
    fn test_normalize_text_accumulates(words in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let record = LogRecord::normalize(words.iter());
        let expected: String = words.iter().map(|w| format!("{} ", w)).collect();
        prop_assert_eq!(record.message(), expected.as_str());
        prop_assert!(record.fields.is_empty());
        prop_assert!(record.err.is_none());
    }

    /// Later objects overwrite earlier keys
    #[test]
    fn test_normalize_merge_last_wins(
        first in prop::collection::btree_map("[a-c]", any::<i32>(), 0..3),
        second in prop::collection::btree_map("[a-c]", any::<i32>(), 0..3),
    ) {
        let to_arg = |m: &std::collections::BTreeMap<String, i32>| {
            LogArg::Object(m.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect())
        };
        let record = LogRecord::normalize([to_arg(&first), to_arg(&second)]);

        for key in first.keys().chain(second.keys()) {
            let expected = second.get(key).or_else(|| first.get(key)).copied().unwrap();
            prop_assert_eq!(&record.fields[key], &Value::from(expected));
        }
        prop_assert!(record.text.is_none());
    }

    /// Text, fields and error all survive in one record
    #[test]
    fn test_normalize_mixed_keeps_all(text in "[a-z]{1,8}", value in any::<i64>(), message in "[a-z]{1,8}") {
        let record = LogRecord::normalize([
            LogArg::from(text.clone()),
            LogArg::field("value", value),
            LogArg::from(ErrorRecord::new(message.clone())),
        ]);

        prop_assert_eq!(record.message(), format!("{} ", text));
        prop_assert_eq!(&record.fields["value"], &Value::from(value));
        prop_assert_eq!(record.err.map(|e| e.message), Some(message));
    }
}

// ============================================================================
// LogEntry Message Sanitization Tests
// ============================================================================

proptest! {
    /// Messages never span more than one line once written
    #[test]
    fn test_message_stays_single_line(message in ".*") {
        let entry = LogEntry::new(LogLevel::Info, &message);
        prop_assert!(!entry.message.contains('\n'));
        prop_assert!(!entry.message.contains('\r'));

        let line = entry.to_json_line().unwrap();
        prop_assert_eq!(line.lines().count(), 1);
    }
}
