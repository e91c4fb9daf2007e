//! Recovery parsing: locate and decode the JSON object inside a model reply.
//!
//! ## Why recovery parsing at all?
//!
//! The prompt tells the model to emit JSON only, with no code fences. Models
//! disobey: replies arrive prefixed with "Here is the data:", wrapped in
//! ` ```json ` fences, or suffixed with commentary. Rather than demand a
//! clean reply, this module finds the first plausible JSON object anywhere
//! in the text and decodes that span.
//!
//! The span is found with a string-and-escape-aware balanced-brace scan
//! starting at the first `{`. The historical behaviour was a greedy
//! first-`{`-to-last-`}` match; the scanner preserves that black-box
//! contract (first plausible object, tolerant of surrounding prose) while no
//! longer mis-spanning when the trailing commentary itself contains a `}`.
//! When the braces never balance — a truncated reply — we fall back to the
//! legacy greedy span so the decoder can report what went wrong inside it.

use crate::error::ExtractError;
use crate::record::AwbRecord;
use serde_json::{Map, Value};
use tracing::debug;

/// Recover an [`AwbRecord`] from raw model output.
///
/// # Errors
/// * [`ExtractError::NoJsonFound`] — the text contains no `{`…`}` span at
///   all. Carries the original text unchanged.
/// * [`ExtractError::MalformedJson`] — a span was found but does not decode
///   as a JSON object. Carries the original text and the decoder's detail.
pub fn recover_record(raw: &str) -> Result<AwbRecord, ExtractError> {
    let span = match json_span(raw) {
        Some(span) => span,
        None => {
            return Err(ExtractError::NoJsonFound {
                raw: raw.to_string(),
            })
        }
    };

    debug!("Recovered candidate JSON span of {} bytes", span.len());

    match serde_json::from_str::<Map<String, Value>>(span) {
        Ok(map) => Ok(AwbRecord::new(map)),
        Err(e) => Err(ExtractError::MalformedJson {
            raw: raw.to_string(),
            detail: e.to_string(),
        }),
    }
}

/// Locate the candidate JSON object span inside free text.
///
/// Returns the substring from the first `{` to its balanced closing `}`,
/// skipping braces inside JSON string literals (and their escapes). If the
/// braces never balance, falls back to the greedy span ending at the last
/// `}` in the text. Returns `None` when no `{`…`}` pair exists.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    // Unbalanced (truncated reply, or an unterminated string swallowed the
    // closer). Fall back to the legacy greedy span so the decoder can say
    // exactly what is wrong with it.
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_object_round_trips() {
        let raw = r#"{"Air Waybill Number": "020-12345678", "Routing and Destination": [{"to": "JFK", "by": "AA"}]}"#;
        let record = recover_record(raw).unwrap();
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({
                "Air Waybill Number": "020-12345678",
                "Routing and Destination": [{"to": "JFK", "by": "AA"}]
            })
        );
    }

    #[test]
    fn surrounding_prose_is_tolerated() {
        let raw = "Sure! Here is the extracted data:\n{\"Air Waybill Number\": \"057-99\"}\nLet me know if you need anything else.";
        let record = recover_record(raw).unwrap();
        assert_eq!(record.waybill_number().as_deref(), Some("057-99"));
    }

    #[test]
    fn code_fences_are_tolerated() {
        let raw = "Here is the data:\n```json\n{\"Air Waybill Number\": \"020-12345678\"}\n```";
        let record = recover_record(raw).unwrap();
        assert_eq!(record.waybill_number().as_deref(), Some("020-12345678"));
    }

    #[test]
    fn nested_objects_span_correctly() {
        let raw = r#"prefix {"Charges Details": [{"Tax": {"Prepaid": "1"}}]} suffix"#;
        let record = recover_record(raw).unwrap();
        assert!(record.get("Charges Details").is_some());
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_span() {
        let raw = r#"{"Handling Information": "keep {upright} at all times"} trailing } brace"#;
        let record = recover_record(raw).unwrap();
        assert_eq!(
            record.text("Handling Information").as_deref(),
            Some("keep {upright} at all times")
        );
    }

    #[test]
    fn escaped_quotes_inside_strings_are_handled() {
        let raw = r#"{"Issued by": "ACME \"Air\" Cargo"}"#;
        let record = recover_record(raw).unwrap();
        assert_eq!(record.text("Issued by").as_deref(), Some("ACME \"Air\" Cargo"));
    }

    #[test]
    fn no_braces_is_no_json_found_with_raw_preserved() {
        let raw = "I am sorry, I cannot read this document.";
        match recover_record(raw) {
            Err(ExtractError::NoJsonFound { raw: kept }) => assert_eq!(kept, raw),
            other => panic!("expected NoJsonFound, got {other:?}"),
        }
    }

    #[test]
    fn open_brace_without_close_is_no_json_found() {
        let raw = "reply was cut off right here {";
        assert!(matches!(
            recover_record(raw),
            Err(ExtractError::NoJsonFound { .. })
        ));
    }

    #[test]
    fn trailing_comma_is_malformed_json_with_raw_preserved() {
        let raw = r#"{"Air Waybill Number": "020-1",}"#;
        match recover_record(raw) {
            Err(ExtractError::MalformedJson { raw: kept, detail }) => {
                assert_eq!(kept, raw);
                assert!(!detail.is_empty());
            }
            other => panic!("expected MalformedJson, got {other:?}"),
        }
    }

    #[test]
    fn unquoted_keys_are_malformed_json() {
        let raw = "{waybill: 020}";
        assert!(matches!(
            recover_record(raw),
            Err(ExtractError::MalformedJson { .. })
        ));
    }

    #[test]
    fn truncated_object_falls_back_to_greedy_span_and_reports_decode_error() {
        // The outer object never closes; the greedy span ends at the inner
        // routing object's brace and fails to decode as the full object.
        let raw = r#"{"Air Waybill Number": "020-1", "Routing and Destination": [{"to": "JFK"}"#;
        assert!(matches!(
            recover_record(raw),
            Err(ExtractError::MalformedJson { .. })
        ));
    }

    #[test]
    fn top_level_array_is_no_json_found() {
        // The contract is an object span; a bare array has no `{` at all.
        let raw = r#"["a", "b"]"#;
        assert!(matches!(
            recover_record(raw),
            Err(ExtractError::NoJsonFound { .. })
        ));
    }

    #[test]
    fn embedded_object_round_trip_is_exact() {
        let embedded = json!({
            "Air Waybill Number": "020-12345678",
            "Goods Description Table Rows": [
                {"No. of Pieces RCP": "3", "Gross Weight": "45.0"}
            ],
            "Unexpected Extra": 7
        });
        let raw = format!(
            "Certainly — the structured result follows.\n{}\nEnd of data.",
            serde_json::to_string_pretty(&embedded).unwrap()
        );
        let record = recover_record(&raw).unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), embedded);
    }
}
