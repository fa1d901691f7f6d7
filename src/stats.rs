//! Statistics aggregation
//!
//! Recomputable snapshot over a record set: total and eligible counts,
//! per-demographic tallies, and per-scale-question averages. The snapshot is
//! derived data only; the record store remains the single source of truth.
//!
//! Eligibility mirrors validation: a record counts toward tallies and
//! averages only when its gate answer matches the eligible value and it was
//! not screened out. Ineligible records still contribute to `count`.

use crate::record::{is_answered, scale_value, selections, Record};
use crate::schema::Schema;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tally bucket for records with no answer to a demographic question.
/// Missing answers are counted, not dropped, so the buckets sum to the
/// eligible record count.
pub const UNANSWERED_BUCKET: &str = "unanswered";

/// Per-scale-question statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaleStat {
    /// Mean rating rounded to 2 decimals; `None` (serialized as null) when
    /// nobody answered.
    pub average: Option<f64>,
    /// Number of eligible records with a numeric answer for this question.
    pub answered: u64,
}

/// Aggregated statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// All stored records, including screened-out respondents.
    pub count: u64,

    /// Records passing the eligibility gate.
    #[serde(rename = "validCount")]
    pub valid_count: u64,

    /// Reporting label -> answer -> occurrence count.
    pub demographics: BTreeMap<String, BTreeMap<String, u64>>,

    /// Question id -> average / answered.
    #[serde(rename = "scaleStats")]
    pub scale_stats: BTreeMap<String, ScaleStat>,

    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
}

/// Compute a full statistics snapshot over `records`.
pub fn aggregate(records: &[Record], schema: &Schema) -> StatsReport {
    let valid: Vec<&Record> = records
        .iter()
        .filter(|r| schema.is_eligible(&r.answers))
        .collect();

    let mut demographics = BTreeMap::new();
    for demographic in &schema.demographics {
        let mut tally: BTreeMap<String, u64> = BTreeMap::new();
        for record in &valid {
            let key = record
                .answer(&demographic.field)
                .filter(|v| is_answered(v))
                .map(tally_key)
                .unwrap_or_else(|| UNANSWERED_BUCKET.to_string());
            *tally.entry(key).or_default() += 1;
        }
        demographics.insert(demographic.label.clone(), tally);
    }

    let mut scale_stats = BTreeMap::new();
    for field in &schema.scale_fields {
        let mut sum = 0.0;
        let mut answered = 0u64;
        for record in &valid {
            // A stored non-numeric rating counts as unanswered rather than
            // failing the whole aggregation.
            if let Some(value) = record.answer(field).and_then(scale_value) {
                sum += value;
                answered += 1;
            }
        }
        let average = (answered > 0).then(|| round2(sum / answered as f64));
        scale_stats.insert(field.clone(), ScaleStat { average, answered });
    }

    StatsReport {
        count: records.len() as u64,
        valid_count: valid.len() as u64,
        demographics,
        scale_stats,
        last_updated: Utc::now(),
    }
}

/// Inclusive `submittedAt` filter: `[start 00:00:00, end 23:59:59]`, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse optional `YYYY-MM-DD` boundaries from query parameters.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> std::result::Result<Self, String> {
        Ok(Self {
            start: parse_date(start)?,
            end: parse_date(end)?,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if at < Utc.from_utc_datetime(&start.and_time(NaiveTime::MIN)) {
                return false;
            }
        }
        if let Some(end) = self.end {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).expect("valid time of day");
            if at > Utc.from_utc_datetime(&end.and_time(end_of_day)) {
                return false;
            }
        }
        true
    }
}

fn parse_date(raw: Option<&str>) -> std::result::Result<Option<NaiveDate>, String> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("invalid date {:?}, expected YYYY-MM-DD", s)),
    }
}

/// Keep the records whose submission timestamp falls inside `range`.
pub fn filter_by_date(records: Vec<Record>, range: &DateRange) -> Vec<Record> {
    if range.is_unbounded() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| range.contains(r.submitted_at))
        .collect()
}

fn tally_key(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) => selections(value).join(";"),
        _ => UNANSWERED_BUCKET.to_string(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Demographic;
    use chrono::Duration;
    use serde_json::{json, Map, Value};

    fn test_schema() -> Schema {
        Schema {
            gate_field: "visited".into(),
            gate_eligible: "yes".into(),
            gate_ineligible: "no".into(),
            required_fields: vec!["city".into()],
            multi_value_fields: vec![],
            scale_fields: vec!["rating".into(), "service".into()],
            scale_min: 1,
            scale_max: 5,
            demographics: vec![Demographic {
                label: "city".into(),
                field: "city".into(),
            }],
            export_fields: vec![],
        }
    }

    fn record(fields: Value) -> Record {
        let answers: Map<String, Value> = fields.as_object().unwrap().clone();
        Record::new(answers, None)
    }

    #[test]
    fn averages_cover_only_eligible_records() {
        let records = vec![
            record(json!({"visited": "yes", "city": "Springfield", "rating": 4})),
            record(json!({"visited": "yes", "city": "Shelbyville", "rating": 5})),
            record(json!({"visited": "no", "rating": 1})),
        ];

        let report = aggregate(&records, &test_schema());
        assert_eq!(report.count, 3);
        assert_eq!(report.valid_count, 2);

        let rating = &report.scale_stats["rating"];
        assert_eq!(rating.average, Some(4.5));
        assert_eq!(rating.answered, 2);
    }

    #[test]
    fn unanswered_scale_reports_absent_average() {
        let records = vec![record(json!({"visited": "yes", "city": "Springfield"}))];
        let report = aggregate(&records, &test_schema());

        let service = &report.scale_stats["service"];
        assert_eq!(service.average, None);
        assert_eq!(service.answered, 0);
        assert!(report
            .scale_stats
            .values()
            .all(|s| s.answered <= report.valid_count));
    }

    #[test]
    fn malformed_stored_rating_counts_as_unanswered() {
        let records = vec![
            record(json!({"visited": "yes", "rating": "great"})),
            record(json!({"visited": "yes", "rating": "3"})),
        ];

        let report = aggregate(&records, &test_schema());
        let rating = &report.scale_stats["rating"];
        assert_eq!(rating.answered, 1);
        assert_eq!(rating.average, Some(3.0));
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        let records = vec![
            record(json!({"visited": "yes", "rating": 4})),
            record(json!({"visited": "yes", "rating": 4})),
            record(json!({"visited": "yes", "rating": 5})),
        ];

        let report = aggregate(&records, &test_schema());
        assert_eq!(report.scale_stats["rating"].average, Some(4.33));
    }

    #[test]
    fn missing_demographic_answers_land_in_unanswered_bucket() {
        let records = vec![
            record(json!({"visited": "yes", "city": "Springfield"})),
            record(json!({"visited": "yes", "city": ""})),
            record(json!({"visited": "yes"})),
        ];

        let report = aggregate(&records, &test_schema());
        let tally = &report.demographics["city"];
        assert_eq!(tally["Springfield"], 1);
        assert_eq!(tally[UNANSWERED_BUCKET], 2);
        assert_eq!(tally.values().sum::<u64>(), report.valid_count);
    }

    #[test]
    fn date_range_is_inclusive_of_both_days() {
        let range = DateRange::parse(Some("2026-08-01"), Some("2026-08-02")).unwrap();

        let aug_first = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let aug_second_late = Utc.with_ymd_and_hms(2026, 8, 2, 23, 59, 59).unwrap();
        assert!(range.contains(aug_first));
        assert!(range.contains(aug_second_late));
        assert!(!range.contains(aug_first - Duration::seconds(1)));
        assert!(!range.contains(aug_second_late + Duration::seconds(1)));
    }

    #[test]
    fn date_parse_rejects_garbage() {
        assert!(DateRange::parse(Some("08/01/2026"), None).is_err());
        assert!(DateRange::parse(None, Some("never")).is_err());
        assert!(DateRange::parse(Some(""), None).unwrap().is_unbounded());
    }

    #[test]
    fn filter_keeps_only_records_in_range() {
        let mut early = record(json!({"visited": "yes"}));
        early.submitted_at = Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap();
        let mut late = record(json!({"visited": "yes"}));
        late.submitted_at = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();

        let range = DateRange::parse(Some("2026-08-01"), None).unwrap();
        let kept = filter_by_date(vec![early, late], &range);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].submitted_at.date_naive().to_string(), "2026-08-01");
    }
}
