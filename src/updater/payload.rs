//! Untyped update-server payload and the lenient coercions applied to it

use serde_json::{Map, Value};

/// Key/value map exactly as the update server returned it.
///
/// No field is guaranteed to exist or to have any particular type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRemotePayload(Map<String, Value>);

impl RawRemotePayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accept only JSON objects; anything else is not a payload
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    /// Scalar value rendered as a trimmed string; empty strings count as absent
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    /// Permissive boolean: `yes`/`1`/`true`/`on` (any case), JSON `true`,
    /// or a non-zero number. `None` when the key is absent.
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(truthy)
    }

    /// Non-negative integer, clamping negatives and garbage to zero
    pub fn count(&self, key: &str) -> Option<u64> {
        self.get(key).map(non_negative_int)
    }
}

pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "yes" | "1" | "true" | "on"
        ),
        _ => false,
    }
}

pub fn non_negative_int(value: &Value) -> u64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(f) if f.is_finite() && f > 0.0 => f.trunc() as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> RawRemotePayload {
        RawRemotePayload::from_value(value).unwrap()
    }

    #[test]
    fn test_only_objects_are_payloads() {
        assert!(RawRemotePayload::from_value(json!([1, 2])).is_none());
        assert!(RawRemotePayload::from_value(json!("ok")).is_none());
        assert!(RawRemotePayload::from_value(json!({})).is_some());
    }

    #[test]
    fn test_flag_coercion() {
        let raw = payload(json!({
            "a": "YES", "b": "1", "c": "True", "d": "no", "e": true, "f": 0, "g": 2, "h": "on", "i": []
        }));
        assert_eq!(raw.flag("a"), Some(true));
        assert_eq!(raw.flag("b"), Some(true));
        assert_eq!(raw.flag("c"), Some(true));
        assert_eq!(raw.flag("d"), Some(false));
        assert_eq!(raw.flag("e"), Some(true));
        assert_eq!(raw.flag("f"), Some(false));
        assert_eq!(raw.flag("g"), Some(true));
        assert_eq!(raw.flag("h"), Some(true));
        assert_eq!(raw.flag("i"), Some(false));
        assert_eq!(raw.flag("missing"), None);
    }

    #[test]
    fn test_count_clamps_to_non_negative_integers() {
        let raw = payload(json!({
            "neg": -10, "float": 87.9, "text": "1,200", "junk": "lots", "null": null
        }));
        assert_eq!(raw.count("neg"), Some(0));
        assert_eq!(raw.count("float"), Some(87));
        assert_eq!(raw.count("text"), Some(1200));
        assert_eq!(raw.count("junk"), Some(0));
        assert_eq!(raw.count("null"), None);
    }

    #[test]
    fn test_text_treats_blank_as_absent() {
        let raw = payload(json!({"blank": "   ", "num": 2.5, "version": " 1.0 "}));
        assert_eq!(raw.text("blank"), None);
        assert_eq!(raw.text("num").as_deref(), Some("2.5"));
        assert_eq!(raw.text("version").as_deref(), Some("1.0"));
    }
}
