//! Result parsing: raw model reply → [`Flags`].
//!
//! The model is asked for a flat JSON object but nothing forces it to comply.
//! A reply that does not parse is still useful to the reader, so it degrades
//! to [`Flags::Raw`] instead of failing the request. This function has no
//! error path.
//!
//! Chat models frequently wrap JSON in a ```` ```json ```` fence despite
//! being told not to. One outer fence is stripped before parsing; the
//! fallback always carries the reply exactly as received.

use crate::output::Flags;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json|JSON)?[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

/// Interpret `raw` as a JSON object of findings.
pub fn parse_flags(raw: &str) -> Flags {
    let candidate = strip_outer_fence(raw);

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Flags::Structured(map),
        Ok(other) => {
            warn!(
                "Model output is JSON but not an object ({}); returning raw text",
                json_kind(&other)
            );
            Flags::Raw {
                raw: raw.to_string(),
            }
        }
        Err(e) => {
            warn!("Failed to parse model output as JSON: {}", e);
            Flags::Raw {
                raw: raw.to_string(),
            }
        }
    }
}

fn strip_outer_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match RE_OUTER_FENCE.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => trimmed,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_becomes_structured() {
        let flags = parse_flags(r#"{"auto_renewal":"yes"}"#);
        match &flags {
            Flags::Structured(map) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map["auto_renewal"], json!("yes"));
            }
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[test]
    fn non_json_falls_back_to_raw() {
        assert_eq!(
            parse_flags("not json"),
            Flags::Raw {
                raw: "not json".into()
            }
        );
    }

    #[test]
    fn extra_and_missing_keys_pass_through() {
        let flags = parse_flags(r#"{"payment_terms":"Net 90","governing_law":"Delaware"}"#);
        assert_eq!(flags.finding("payment_terms"), Some("Net 90"));
        assert_eq!(flags.finding("governing_law"), Some("Delaware"));
        assert_eq!(flags.finding("auto_renewal"), None);
    }

    #[test]
    fn non_string_values_are_kept_verbatim() {
        let flags = parse_flags(r#"{"termination_fees":["$5k","30 days notice"]}"#);
        match flags {
            Flags::Structured(map) => {
                assert_eq!(map["termination_fees"], json!(["$5k", "30 days notice"]));
            }
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[test]
    fn json_that_is_not_an_object_is_raw() {
        assert!(parse_flags("[1, 2, 3]").is_degraded());
        assert!(parse_flags("\"just a string\"").is_degraded());
        assert!(parse_flags("").is_degraded());
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "```json\n{\"exclusivity_clauses\": \"Sole supplier for 5 years\"}\n```";
        let flags = parse_flags(reply);
        assert_eq!(
            flags.finding("exclusivity_clauses"),
            Some("Sole supplier for 5 years")
        );
    }

    #[test]
    fn fallback_keeps_original_text_including_fence() {
        let reply = "```\nnot json at all\n```";
        assert_eq!(
            parse_flags(reply),
            Flags::Raw {
                raw: reply.to_string()
            }
        );
    }
}
