use pagetap_core_types::CorrelationCandidate;
use serde_json::{Map, Value};

use crate::config::ExtractorConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Extraction {
    Candidate(CorrelationCandidate),
    /// Parsed, but none of the configured fields held a usable value.
    NoIdentifier,
    /// Not a JSON document. The common case for most page traffic.
    NotStructured,
}

/// Derives correlation candidates from response text. Never touches storage.
#[derive(Clone, Debug, Default)]
pub struct PayloadExtractor {
    config: ExtractorConfig,
}

impl PayloadExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn extract(&self, text: &str) -> Extraction {
        let doc: Value = match serde_json::from_str(text) {
            Ok(doc) => doc,
            Err(_) => return Extraction::NotStructured,
        };
        let Some(fields) = doc.as_object() else {
            return Extraction::NoIdentifier;
        };

        let candidate = CorrelationCandidate {
            entry_id: first_usable(fields, &self.config.entry_fields),
            session_id: first_usable(fields, &self.config.session_fields),
        };
        if candidate.is_empty() {
            Extraction::NoIdentifier
        } else {
            Extraction::Candidate(candidate)
        }
    }
}

fn first_usable(fields: &Map<String, Value>, names: &[String]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| fields.get(name))
        .find_map(identifier_value)
}

// Strings count unless empty and are kept verbatim; numbers count unless zero.
fn identifier_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => (!text.is_empty()).then(|| text.clone()),
        Value::Number(number) => {
            let is_zero = number.as_f64().map_or(false, |n| n == 0.0);
            (!is_zero).then(|| number.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> PayloadExtractor {
        PayloadExtractor::default()
    }

    fn candidate(entry: Option<&str>, session: Option<&str>) -> Extraction {
        Extraction::Candidate(CorrelationCandidate {
            entry_id: entry.map(str::to_string),
            session_id: session.map(str::to_string),
        })
    }

    #[test]
    fn named_fields_become_candidate() {
        assert_eq!(
            extractor().extract(r#"{"entryId":"abc123","sessionId":"t999"}"#),
            candidate(Some("abc123"), Some("t999"))
        );
    }

    #[test]
    fn session_without_entry_still_yields_candidate() {
        assert_eq!(
            extractor().extract(r#"{"sessionId":"t999"}"#),
            candidate(None, Some("t999"))
        );
    }

    #[test]
    fn numeric_board_ids_are_rendered_as_text() {
        assert_eq!(
            extractor().extract(r#"{"pid": 98765432, "tid": 12345}"#),
            candidate(Some("98765432"), Some("12345"))
        );
    }

    #[test]
    fn primary_field_name_wins_over_fallback() {
        assert_eq!(
            extractor().extract(r#"{"pid": 1, "entryId": "e-2"}"#),
            candidate(Some("e-2"), None)
        );
    }

    #[test]
    fn unusable_values_fall_through_to_next_field() {
        assert_eq!(
            extractor().extract(r#"{"entryId": "", "pid": 42, "sessionId": null, "tid": 0}"#),
            candidate(Some("42"), None)
        );
    }

    #[test]
    fn string_identifiers_are_kept_as_sent() {
        assert_eq!(
            extractor().extract(r#"{"entryId":" abc123 ","sessionId":" t9 "}"#),
            candidate(Some(" abc123 "), Some(" t9 "))
        );
        assert_eq!(
            extractor().extract(r#"{"entryId":"   "}"#),
            candidate(Some("   "), None)
        );
    }

    #[test]
    fn documents_without_identifiers() {
        let ex = extractor();
        assert_eq!(ex.extract(r#"{"ok":true}"#), Extraction::NoIdentifier);
        assert_eq!(ex.extract(r#"[{"entryId":"x"}]"#), Extraction::NoIdentifier);
        assert_eq!(ex.extract(r#""entryId""#), Extraction::NoIdentifier);
        assert_eq!(
            ex.extract(r#"{"entryId": {"nested": "x"}, "sessionId": true}"#),
            Extraction::NoIdentifier
        );
    }

    #[test]
    fn non_json_bodies_are_not_structured() {
        let ex = extractor();
        assert_eq!(
            ex.extract("<html><body>Post successful</body></html>"),
            Extraction::NotStructured
        );
        assert_eq!(ex.extract(""), Extraction::NotStructured);
        assert_eq!(ex.extract(r#"{"entryId": "abc"#), Extraction::NotStructured);
    }

    #[test]
    fn custom_field_names() {
        let ex = PayloadExtractor::new(ExtractorConfig {
            entry_fields: vec!["postNo".into()],
            session_fields: vec!["threadNo".into()],
        });
        assert_eq!(
            ex.extract(r#"{"postNo":"7","threadNo":"3","entryId":"ignored"}"#),
            candidate(Some("7"), Some("3"))
        );
    }
}
