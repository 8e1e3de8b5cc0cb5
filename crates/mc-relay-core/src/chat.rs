//! Legacy formatting-code and JSON chat-component helpers used by the
//! sign, tab-list and ping translators.

use serde_json::{json, Value};

/// The legacy formatting escape character.
pub const COLOR_CHAR: char = '\u{a7}';

/// Remove every legacy formatting code (the escape plus the code letter).
pub fn strip_color(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == COLOR_CHAR {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

/// Wrap legacy text in a JSON text component.
pub fn legacy_to_json(text: &str) -> String {
    json!({ "text": text }).to_string()
}

/// Pass valid component JSON through untouched; wrap anything else so
/// the result is always a component the newer protocol accepts.
pub fn ensure_json_component(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(_)) | Ok(Value::String(_)) => raw.to_owned(),
        _ => legacy_to_json(raw),
    }
}

/// Flatten a JSON chat component back to legacy text: `text` first, then
/// every `extra` entry in order. Non-component input is returned as-is.
pub fn json_to_legacy(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => {
            let mut out = String::new();
            flatten(&value, &mut out);
            out
        }
        Err(_) => raw.to_owned(),
    }
}

fn flatten(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                for part in extra {
                    flatten(part, out);
                }
            }
        }
        Value::Array(parts) => {
            for part in parts {
                flatten(part, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_color_codes() {
        assert_eq!(strip_color("\u{a7}6Gold\u{a7}r text"), "Gold text");
        assert_eq!(strip_color("plain"), "plain");
        // Trailing escape with no code letter.
        assert_eq!(strip_color("end\u{a7}"), "end");
    }

    #[test]
    fn legacy_json_roundtrip() {
        let component = legacy_to_json("line one");
        assert_eq!(json_to_legacy(&component), "line one");
    }

    #[test]
    fn flattens_extra_parts() {
        let raw = r#"{"text":"a","extra":[{"text":"b"},"c"]}"#;
        assert_eq!(json_to_legacy(raw), "abc");
    }

    #[test]
    fn invalid_json_is_wrapped_not_rejected() {
        let fixed = ensure_json_component("not json");
        assert_eq!(json_to_legacy(&fixed), "not json");
        let valid = r#"{"text":"ok"}"#;
        assert_eq!(ensure_json_component(valid), valid);
    }
}
