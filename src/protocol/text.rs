//! Rich-text MOTD to plain text.
//!
//! Two rich-text shapes are accepted: JSON chat components (`{"text": ...,
//! "extra": [...]}`, arrays, or bare strings) and legacy formatting codes
//! introduced by `&` or `§`. Anything that does not parse as a JSON component
//! is treated as legacy text.

use serde_json::Value;

/// Legacy color and style code characters (`0-9`, `a-f`, `k-o`, `r`, and `x` for hex colors)
fn is_format_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r' | 'x')
}

/// Render `rich` as plain text.
pub fn to_plain(rich: &str) -> String {
    let trimmed = rich.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with('"') {
        if let Ok(component) = serde_json::from_str::<Value>(trimmed) {
            let mut out = String::new();
            flatten_component(&component, &mut out);
            return strip_legacy(&out);
        }
    }
    strip_legacy(rich)
}

/// Remove `&x` / `§x` formatting codes, keeping any other use of the markers.
pub fn strip_legacy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' || c == '§' {
            if let Some(&next) = chars.peek() {
                if is_format_code(next) {
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn flatten_component(component: &Value, out: &mut String) {
    match component {
        Value::String(text) => out.push_str(text),
        Value::Array(parts) => parts.iter().for_each(|part| flatten_component(part, out)),
        Value::Object(fields) => {
            if let Some(Value::String(text)) = fields.get("text") {
                out.push_str(text);
            } else if let Some(Value::String(key)) = fields.get("translate") {
                out.push_str(key);
            }
            if let Some(Value::Array(extra)) = fields.get("extra") {
                extra.iter().for_each(|part| flatten_component(part, out));
            }
        }
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => {}
    }
}
