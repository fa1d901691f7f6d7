//! Record export rendering
//!
//! Renders a record set as CSV or pretty-printed JSON for the dashboard's
//! download endpoint. CSV output is prefixed with a UTF-8 byte-order mark so
//! spreadsheet applications detect the encoding, uses the schema's column
//! order with the metadata columns first, joins multi-select answers with a
//! semicolon, and quotes any cell containing a comma, double quote, or
//! newline (internal quotes doubled). Missing answers render as empty cells.

use crate::record::{selections, Record};
use crate::schema::Schema;
use crate::Result;
use chrono::SecondsFormat;
use serde_json::Value;

const UTF8_BOM: &str = "\u{feff}";

/// Supported download formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse the `format` query parameter; CSV is the default.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// Render `records` in the requested format.
pub fn render(records: &[Record], schema: &Schema, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(records)?),
        ExportFormat::Csv => Ok(to_csv(records, schema)),
    }
}

fn to_csv(records: &[Record], schema: &Schema) -> String {
    let mut columns = vec!["submittedAt".to_string(), "ip".to_string()];
    columns.extend(schema.export_fields());

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(columns.join(","));

    for record in records {
        let mut cells = Vec::with_capacity(columns.len());
        cells.push(
            record
                .submitted_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );
        cells.push(escape(record.origin()));
        for field in &columns[2..] {
            let text = record.answer(field).map(cell_text).unwrap_or_default();
            cells.push(escape(&text));
        }
        rows.push(cells.join(","));
    }

    format!("{}{}", UTF8_BOM, rows.join("\n"))
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(_) => selections(value).join(";"),
        _ => String::new(),
    }
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Demographic;
    use serde_json::{json, Map};

    fn test_schema() -> Schema {
        Schema {
            gate_field: "visited".into(),
            gate_eligible: "yes".into(),
            gate_ineligible: "no".into(),
            required_fields: vec!["city".into()],
            multi_value_fields: vec!["channels".into()],
            scale_fields: vec!["rating".into()],
            scale_min: 1,
            scale_max: 5,
            demographics: vec![Demographic {
                label: "city".into(),
                field: "city".into(),
            }],
            export_fields: vec![],
        }
    }

    fn record(fields: serde_json::Value, ip: Option<&str>) -> Record {
        let answers: Map<String, serde_json::Value> = fields.as_object().unwrap().clone();
        Record::new(answers, ip.map(str::to_string))
    }

    #[test]
    fn csv_starts_with_bom_and_schema_columns() {
        let csv = to_csv(&[], &test_schema());
        assert!(csv.starts_with(UTF8_BOM));
        assert_eq!(
            csv.trim_start_matches(UTF8_BOM),
            "submittedAt,ip,visited,city,channels,rating"
        );
    }

    #[test]
    fn multi_select_answers_join_with_semicolons() {
        let records = vec![record(
            json!({"visited": "yes", "city": "Springfield", "channels": ["friends", "poster"], "rating": 4}),
            Some("192.0.2.1"),
        )];

        let csv = to_csv(&records, &test_schema());
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains("friends;poster"));
        assert!(row.contains("192.0.2.1"));
        assert!(row.ends_with(",4"));
    }

    #[test]
    fn cells_with_delimiters_are_quoted_and_doubled() {
        let records = vec![record(
            json!({"visited": "yes", "city": "Spring,field \"the fair\"", "rating": 4}),
            None,
        )];

        let csv = to_csv(&records, &test_schema());
        assert!(csv.contains(r#""Spring,field ""the fair""""#));
        // Missing multi-select renders as an empty cell, not a literal null.
        let row = csv.lines().nth(1).unwrap();
        assert!(row.contains(",,"));
        assert!(!row.contains("null"));
    }

    #[test]
    fn escaped_cells_round_trip() {
        let original = "a,b\"c\nd";
        let escaped = escape(original);
        assert_eq!(escaped, "\"a,b\"\"c\nd\"");

        let unescaped = escaped
            .trim_matches('"')
            .replace("\"\"", "\"");
        assert_eq!(unescaped, original);
    }

    #[test]
    fn json_export_is_the_pretty_printed_record_list() {
        let records = vec![record(json!({"visited": "no"}), None)];
        let body = render(&records, &test_schema(), ExportFormat::Json).unwrap();

        let parsed: Vec<Record> = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(body.contains('\n'));
    }

    #[test]
    fn format_parsing_defaults_to_csv() {
        assert_eq!(ExportFormat::parse(None), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse(Some("json")), ExportFormat::Json);
        assert_eq!(ExportFormat::parse(Some("xlsx")), ExportFormat::Csv);
    }
}
