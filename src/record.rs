//! Scoring records and the normalizing boundary for raw source rows
//!
//! Rows arrive from the loader as untyped JSON-style objects, whatever the
//! source format was. `normalize` is the only way such a row becomes a
//! `Record`; nothing downstream ever sees a raw row.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use thiserror::Error;

/// An untyped row as produced by the JSON or CSV decoder.
pub type RawRow = Map<String, Value>;

/// Source column names, matched case-for-case.
pub const FIELD_POINTS: &str = "Points";
pub const FIELD_DISCIPLINE: &str = "Discipline";
pub const FIELD_RESULT: &str = "Result";
pub const FIELD_GENDER: &str = "Gender";
pub const FIELD_ENVIRONMENT: &str = "Environment";

/// The two recognized gender buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Bucket declaration order; Male is always rendered first.
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    /// Classify a source gender code. Only the exact codes `M` and `F` count.
    pub fn from_code(code: &str) -> Option<Gender> {
        match code {
            "M" => Some(Gender::Male),
            "F" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display value of a performance. JSON sources usually carry text
/// ("10.55", "2:03:45"), CSV sources with dynamic typing may yield numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultValue {
    Text(String),
    Number(Number),
}

impl Default for ResultValue {
    fn default() -> Self {
        ResultValue::Text(String::new())
    }
}

impl fmt::Display for ResultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultValue::Text(s) => f.write_str(s),
            ResultValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A canonical scoring record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Points awarded; 1..=1400 by convention, not checked at load time
    pub score: i64,
    /// Discipline name, e.g. "100m" or "Marathon"
    pub discipline: String,
    /// Performance shown next to the points
    pub result: ResultValue,
    /// Gender code exactly as it appeared in the source
    pub gender_code: String,
    /// Indoor/outdoor marker; carried for display only
    pub environment: String,
}

impl Record {
    /// The bucket this record belongs in, or `None` for an unrecognized code.
    pub fn gender(&self) -> Option<Gender> {
        Gender::from_code(&self.gender_code)
    }
}

/// Why a raw row could not become a `Record`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has unexpected type: {found}")]
    InvalidField { field: &'static str, found: String },

    #[error("field 'Points' is text ({0:?}), expected a number")]
    NonNumericScore(String),

    #[error("field 'Points' is not an integer: {0}")]
    NonIntegralScore(String),

    #[error("field 'Points' is too large: {0}")]
    ScoreOutOfRange(String),
}

/// Convert a raw row into a `Record`.
///
/// Gender codes are passed through untouched; deciding whether a code is
/// usable is the grouping step's job.
pub fn normalize(raw: &RawRow) -> Result<Record, NormalizeError> {
    let score = match required(raw, FIELD_POINTS)? {
        Value::Number(n) => integral_score(n)?,
        Value::String(s) => return Err(NormalizeError::NonNumericScore(s.clone())),
        other => return Err(invalid(FIELD_POINTS, other)),
    };

    let discipline = match required(raw, FIELD_DISCIPLINE)? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Err(invalid(FIELD_DISCIPLINE, other)),
    };

    let gender_code = match required(raw, FIELD_GENDER)? {
        Value::String(s) => s.clone(),
        other => return Err(invalid(FIELD_GENDER, other)),
    };

    let result = match raw.get(FIELD_RESULT) {
        None | Some(Value::Null) => ResultValue::default(),
        Some(Value::String(s)) => ResultValue::Text(s.clone()),
        Some(Value::Number(n)) => ResultValue::Number(n.clone()),
        Some(other) => return Err(invalid(FIELD_RESULT, other)),
    };

    let environment = match raw.get(FIELD_ENVIRONMENT) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => return Err(invalid(FIELD_ENVIRONMENT, other)),
    };

    Ok(Record {
        score,
        discipline,
        result,
        gender_code,
        environment,
    })
}

/// Whole-valued floats such as `500.0` count as integers.
fn integral_score(n: &Number) -> Result<i64, NormalizeError> {
    if let Some(i) = n.as_i64() {
        return Ok(i);
    }
    if n.is_u64() {
        return Err(NormalizeError::ScoreOutOfRange(n.to_string()));
    }
    match n.as_f64() {
        Some(f) if f.fract() != 0.0 || !f.is_finite() => {
            Err(NormalizeError::NonIntegralScore(n.to_string()))
        }
        // i64::MAX as f64 rounds up to 2^63, which itself does not fit
        Some(f) if f >= i64::MIN as f64 && f < i64::MAX as f64 => Ok(f as i64),
        Some(_) => Err(NormalizeError::ScoreOutOfRange(n.to_string())),
        None => Err(NormalizeError::NonIntegralScore(n.to_string())),
    }
}

fn required<'a>(raw: &'a RawRow, field: &'static str) -> Result<&'a Value, NormalizeError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(NormalizeError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

fn invalid(field: &'static str, value: &Value) -> NormalizeError {
    let found = match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    NormalizeError::InvalidField {
        field,
        found: found.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test row must be an object"),
        }
    }

    #[test]
    fn test_normalize_full_row() {
        let raw = row(json!({
            "Points": 1200,
            "Discipline": "100m",
            "Result": "9.95",
            "Gender": "M",
            "Environment": "outdoor"
        }));
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.score, 1200);
        assert_eq!(rec.discipline, "100m");
        assert_eq!(rec.result, ResultValue::Text("9.95".to_string()));
        assert_eq!(rec.gender(), Some(Gender::Male));
        assert_eq!(rec.environment, "outdoor");
    }

    #[test]
    fn test_unrecognized_gender_passes_through() {
        let raw = row(json!({"Points": 10, "Discipline": "HJ", "Gender": "X"}));
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.gender_code, "X");
        assert_eq!(rec.gender(), None);
    }

    #[test]
    fn test_gender_codes_are_exact() {
        assert_eq!(Gender::from_code("M"), Some(Gender::Male));
        assert_eq!(Gender::from_code("F"), Some(Gender::Female));
        assert_eq!(Gender::from_code("m"), None);
        assert_eq!(Gender::from_code("Male"), None);
        assert_eq!(Gender::from_code(" M"), None);
    }

    #[test]
    fn test_text_score_is_rejected() {
        let raw = row(json!({"Points": "500", "Discipline": "100m", "Gender": "M"}));
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::NonNumericScore("500".to_string()))
        );
    }

    #[test]
    fn test_fractional_score_is_rejected() {
        let raw = row(json!({"Points": 500.5, "Discipline": "100m", "Gender": "M"}));
        assert!(matches!(
            normalize(&raw),
            Err(NormalizeError::NonIntegralScore(_))
        ));
    }

    #[test]
    fn test_whole_float_score_is_accepted() {
        let raw = row(json!({"Points": 500.0, "Discipline": "100m", "Gender": "M"}));
        assert_eq!(normalize(&raw).unwrap().score, 500);

        let raw: RawRow =
            serde_json::from_str(r#"{"Points": 1.2e3, "Discipline": "100m", "Gender": "F"}"#)
                .unwrap();
        assert_eq!(normalize(&raw).unwrap().score, 1200);
    }

    #[test]
    fn test_huge_score_is_out_of_range() {
        let raw = row(json!({"Points": u64::MAX, "Discipline": "100m", "Gender": "M"}));
        assert!(matches!(
            normalize(&raw),
            Err(NormalizeError::ScoreOutOfRange(_))
        ));

        let raw = row(json!({"Points": 1e20, "Discipline": "100m", "Gender": "M"}));
        assert!(matches!(
            normalize(&raw),
            Err(NormalizeError::ScoreOutOfRange(_))
        ));
    }

    #[test]
    fn test_missing_required_fields() {
        let raw = row(json!({"Discipline": "100m", "Gender": "M"}));
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::MissingField(FIELD_POINTS))
        );

        let raw = row(json!({"Points": 1, "Discipline": null, "Gender": "M"}));
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::MissingField(FIELD_DISCIPLINE))
        );

        let raw = row(json!({"Points": 1, "Discipline": "100m"}));
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::MissingField(FIELD_GENDER))
        );
    }

    #[test]
    fn test_optional_fields_default_empty() {
        let raw = row(json!({"Points": 1, "Discipline": "100m", "Gender": "F"}));
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.result.to_string(), "");
        assert_eq!(rec.environment, "");
    }

    #[test]
    fn test_numeric_discipline_and_result() {
        let raw = row(json!({"Points": 700, "Discipline": 400, "Result": 45.5, "Gender": "F"}));
        let rec = normalize(&raw).unwrap();
        assert_eq!(rec.discipline, "400");
        assert_eq!(rec.result.to_string(), "45.5");
    }

    #[test]
    fn test_wrong_type_gender() {
        let raw = row(json!({"Points": 1, "Discipline": "100m", "Gender": true}));
        assert_eq!(
            normalize(&raw),
            Err(NormalizeError::InvalidField {
                field: FIELD_GENDER,
                found: "bool".to_string()
            })
        );
    }
}
