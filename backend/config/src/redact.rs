//! Config redaction: produce safe-to-print config snapshots by masking secrets.

use serde_json::Value;

use crate::schema::BotConfig;

static SENSITIVE_KEYS: &[&str] = &["token", "botToken", "secret", "password"];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Redact a config JSON value, replacing sensitive strings with a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Serialized, redacted view of a config for `check --json` and startup logs.
pub fn redacted_config(config: &BotConfig) -> Value {
    redact(&serde_json::to_value(config).unwrap_or(Value::Null))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    // Keep a 4 character hint so operators can tell tokens apart.
    let hint = if s.chars().count() > 8 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    };
    Value::String(hint)
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}
