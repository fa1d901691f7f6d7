//! Stored questionnaire responses
//!
//! A [`Record`] is one accepted submission: the respondent's answers keyed by
//! question id, plus metadata assigned at accept time. Records are immutable
//! once stored; corrections require a new submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload flag set by the front end when a respondent was screened out
/// before completing the questionnaire.
pub const FILTERED_FLAG: &str = "filtered";

/// Reported origin when no client address could be determined.
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// One accepted submission.
///
/// Serializes to a flat JSON object: the metadata fields side by side with
/// the answers, which is also the on-disk representation in the store file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Accept-time timestamp, assigned by the server.
    #[serde(rename = "submittedAt")]
    pub submitted_at: DateTime<Utc>,

    /// Best-effort client origin. Only as trustworthy as the deployment:
    /// forwarded headers are honored when `trust_proxy` is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,

    /// Answers keyed by question id (string, number, or array of strings).
    #[serde(flatten)]
    pub answers: Map<String, Value>,
}

impl Record {
    /// Build a record from an accepted payload, stamping metadata.
    ///
    /// Client-supplied values for the reserved metadata keys are dropped so
    /// they cannot shadow the server-assigned fields.
    pub fn new(mut answers: Map<String, Value>, ip: Option<String>) -> Self {
        answers.remove("submittedAt");
        answers.remove("ip");
        Self {
            submitted_at: Utc::now(),
            ip,
            answers,
        }
    }

    /// Answer for a question id; `None` when absent or JSON null.
    pub fn answer(&self, field: &str) -> Option<&Value> {
        self.answers.get(field).filter(|v| !v.is_null())
    }

    /// Client origin, falling back to [`UNKNOWN_ORIGIN`].
    pub fn origin(&self) -> &str {
        self.ip.as_deref().unwrap_or(UNKNOWN_ORIGIN)
    }
}

/// Whether a value counts as an answer: null, blank strings, and empty
/// arrays do not.
pub fn is_answered(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Numeric coercion for scale answers. Accepts JSON numbers and numeric
/// strings; anything else (including non-finite values) is not a rating.
pub fn scale_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Multi-select coercion. The canonical representation is an array of
/// strings; a bare non-empty string is accepted as a single selection.
pub fn selections(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_keys_cannot_be_spoofed() {
        let mut answers = Map::new();
        answers.insert("Q1".into(), json!("yes"));
        answers.insert("submittedAt".into(), json!("1970-01-01T00:00:00Z"));
        answers.insert("ip".into(), json!("203.0.113.9"));

        let record = Record::new(answers, None);
        assert!(record.answers.get("submittedAt").is_none());
        assert!(record.answers.get("ip").is_none());
        assert_eq!(record.origin(), UNKNOWN_ORIGIN);
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut answers = Map::new();
        answers.insert("Q1".into(), json!("yes"));
        answers.insert("Q10".into(), json!(["friends", "social media"]));
        let record = Record::new(answers, Some("198.51.100.7".into()));

        let encoded = serde_json::to_string(&record).unwrap();
        let decoded: Record = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.submitted_at, record.submitted_at);
        assert_eq!(decoded.ip.as_deref(), Some("198.51.100.7"));
        assert_eq!(decoded.answers, record.answers);
    }

    #[test]
    fn scale_value_coerces_numbers_and_numeric_strings() {
        assert_eq!(scale_value(&json!(4)), Some(4.0));
        assert_eq!(scale_value(&json!("5")), Some(5.0));
        assert_eq!(scale_value(&json!(" 3 ")), Some(3.0));
        assert_eq!(scale_value(&json!("strongly agree")), None);
        assert_eq!(scale_value(&json!(null)), None);
        assert_eq!(scale_value(&json!([4])), None);
    }

    #[test]
    fn selections_accepts_array_or_bare_string() {
        assert_eq!(selections(&json!(["a", "b"])), vec!["a", "b"]);
        assert_eq!(selections(&json!("a")), vec!["a"]);
        assert!(selections(&json!([])).is_empty());
        assert!(selections(&json!("  ")).is_empty());
        assert!(selections(&json!(7)).is_empty());
    }
}
