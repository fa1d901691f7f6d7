//! Declarative questionnaire schema
//!
//! One [`Schema`] value drives validation, aggregation, and export for a
//! survey deployment, so a new question set needs only new configuration.
//! The built-in default mirrors the visitor-satisfaction questionnaire this
//! service was first deployed with: a screening gate (`Q1`), demographic
//! questions (`Q2`-`Q9`), one multi-select (`Q10`), visit-profile questions
//! (`Q11`-`Q15`), rating scales (`Q16`-`Q47`), and free-text feedback
//! (`Q48`-`Q49`).

use crate::record::{is_answered, FILTERED_FLAG};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Survey schema: field roles and value domains, loadable from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct Schema {
    /// Screening question answered by every respondent.
    pub gate_field: String,

    /// Gate answer meaning the respondent is eligible for the full
    /// questionnaire and counted in aggregation.
    pub gate_eligible: String,

    /// Gate answer meaning the respondent is screened out; such submissions
    /// validate with the gate answer alone.
    pub gate_ineligible: String,

    /// Fields that must be present and non-empty for eligible respondents.
    #[serde(default)]
    pub required_fields: Vec<String>,

    /// Fields whose value is a non-empty set of selections.
    #[serde(default)]
    pub multi_value_fields: Vec<String>,

    /// Fields rated on a bounded integer scale.
    #[serde(default)]
    pub scale_fields: Vec<String>,

    /// Inclusive lower bound of the rating scale.
    #[serde(default = "default_scale_min")]
    pub scale_min: i64,

    /// Inclusive upper bound of the rating scale.
    #[serde(default = "default_scale_max")]
    pub scale_max: i64,

    /// Fields tallied per distinct answer for reporting.
    #[serde(default)]
    pub demographics: Vec<Demographic>,

    /// Question ids in export column order. Metadata columns are prepended
    /// by the export formatter.
    #[serde(default)]
    pub export_fields: Vec<String>,
}

/// One tallied reporting dimension.
#[derive(Debug, Clone, Deserialize)]
pub struct Demographic {
    /// Reporting label, e.g. `age`.
    pub label: String,
    /// Question id the tally is computed from.
    pub field: String,
}

fn default_scale_min() -> i64 {
    1
}

fn default_scale_max() -> i64 {
    5
}

impl Schema {
    /// Load a schema from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read schema file {}: {}", path.display(), e))
        })?;
        let schema: Schema = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("Failed to parse schema TOML: {}", e)))?;
        schema.ensure_valid()?;
        Ok(schema)
    }

    /// Structural sanity checks applied after deserialization.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.gate_field.trim().is_empty() {
            return Err(Error::Config("Schema gate_field must not be empty".into()));
        }
        if self.gate_eligible == self.gate_ineligible {
            return Err(Error::Config(
                "Schema gate_eligible and gate_ineligible must differ".into(),
            ));
        }
        if self.scale_min >= self.scale_max {
            return Err(Error::Config(format!(
                "Schema scale range {}..{} is empty",
                self.scale_min, self.scale_max
            )));
        }
        Ok(())
    }

    /// Gate check shared by aggregation: the screening answer matches the
    /// eligible value and the payload was not explicitly screened out.
    pub fn is_eligible(&self, answers: &Map<String, Value>) -> bool {
        let gate_ok = answers
            .get(&self.gate_field)
            .and_then(Value::as_str)
            .map(|v| v == self.gate_eligible)
            .unwrap_or(false);
        gate_ok && !is_filtered(answers)
    }

    /// Whether the gate answer explicitly screens the respondent out.
    pub fn is_screened_out(&self, answers: &Map<String, Value>) -> bool {
        let declined = answers
            .get(&self.gate_field)
            .and_then(Value::as_str)
            .map(|v| v == self.gate_ineligible)
            .unwrap_or(false);
        declined || is_filtered(answers)
    }

    /// Whether the gate question was answered at all.
    pub fn has_gate_answer(&self, answers: &Map<String, Value>) -> bool {
        answers.get(&self.gate_field).is_some_and(is_answered)
    }

    /// Question ids in export column order, derived from the field roles
    /// when no explicit order is configured.
    pub fn export_fields(&self) -> Vec<String> {
        if !self.export_fields.is_empty() {
            return self.export_fields.clone();
        }
        let mut fields = vec![self.gate_field.clone()];
        for group in [
            &self.required_fields,
            &self.multi_value_fields,
            &self.scale_fields,
        ] {
            for field in group {
                if !fields.contains(field) {
                    fields.push(field.clone());
                }
            }
        }
        fields
    }
}

fn is_filtered(answers: &Map<String, Value>) -> bool {
    answers
        .get(FILTERED_FLAG)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

impl Default for Schema {
    /// The built-in visitor-satisfaction questionnaire shape.
    fn default() -> Self {
        Self {
            gate_field: "Q1".into(),
            gate_eligible: "yes".into(),
            gate_ineligible: "no".into(),
            required_fields: question_ids(2, 6)
                .into_iter()
                .chain(["Q8".to_string(), "Q9".to_string()])
                .chain(question_ids(11, 15))
                .collect(),
            multi_value_fields: vec!["Q10".into()],
            scale_fields: question_ids(16, 47),
            scale_min: default_scale_min(),
            scale_max: default_scale_max(),
            demographics: vec![
                Demographic::new("gender", "Q2"),
                Demographic::new("residence", "Q3"),
                Demographic::new("age", "Q4"),
                Demographic::new("education", "Q5"),
                Demographic::new("occupation", "Q6"),
                Demographic::new("income", "Q7"),
                Demographic::new("visitCount", "Q8"),
                Demographic::new("purpose", "Q9"),
            ],
            export_fields: question_ids(1, 49),
        }
    }
}

impl Demographic {
    fn new(label: &str, field: &str) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
        }
    }
}

fn question_ids(from: u32, to: u32) -> Vec<String> {
    (from..=to).map(|n| format!("Q{}", n)).collect()
}
