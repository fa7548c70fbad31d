//! Structured validators that score data out of 100 and list what is wrong.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use civhub_types::{Balanced, calculate_balance, verify_meta};

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ValidationSeverity: ValidationSeverity {
        Info => "info",
        Warning => "warning",
        Error => "error",
        Critical => "critical",
    }
}

impl ValidationSeverity {
    /// Error and critical issues make a report invalid.
    #[must_use]
    pub const fn is_blocking(self) -> bool {
        matches!(self, ValidationSeverity::Error | ValidationSeverity::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub code: &'static str,
    pub message: String,
    pub severity: ValidationSeverity,
    pub field: Option<String>,
    pub value: Option<String>,
}

impl ValidationIssue {
    pub fn new(code: &'static str, severity: ValidationSeverity, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity,
            field: None,
            value: None,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(code, ValidationSeverity::Error, message)
    }

    #[must_use]
    pub fn on(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl fmt::Display) -> Self {
        self.value = Some(value.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl ValidationReport {
    /// Validity follows the issues; the score is floored at zero.
    #[must_use]
    pub fn from_issues(issues: Vec<ValidationIssue>, score: f64) -> Self {
        Self {
            valid: !issues.iter().any(|i| i.severity.is_blocking()),
            issues,
            score: score.max(0.0),
            timestamp: Utc::now(),
        }
    }

    fn rejected(issues: Vec<ValidationIssue>, score: f64) -> Self {
        Self {
            valid: false,
            ..Self::from_issues(issues, score)
        }
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity.is_blocking())
            .count()
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
            .count()
    }
}

pub trait Validator<T: ?Sized> {
    fn name(&self) -> &str;

    fn validate(&self, data: &T) -> ValidationReport;
}

fn balance_text((a, b): (f64, f64)) -> String {
    format!("{a:.2}/{b:.2}")
}

/// Checks a `{"positive", "negative"}` object for a 50/50 split.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceValidator;

impl Validator<Value> for BalanceValidator {
    fn name(&self) -> &str {
        "balance"
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        let mut issues = Vec::new();
        let mut score = 100.0;

        let fields = ["positive", "negative"];
        for (field, code) in fields.into_iter().zip(["MISSING_POSITIVE", "MISSING_NEGATIVE"]) {
            if data.get(field).is_none() {
                issues.push(
                    ValidationIssue::error(code, format!("Missing '{field}' field")).on(field),
                );
                score -= 50.0;
            }
        }
        if !issues.is_empty() {
            return ValidationReport::rejected(issues, score);
        }

        let mut values = [0.0; 2];
        for (slot, field) in values.iter_mut().zip(fields) {
            let raw = &data[field];
            match raw.as_f64() {
                Some(v) => *slot = v,
                None => {
                    issues.push(
                        ValidationIssue::error("INVALID_TYPE", format!("'{field}' must be numeric"))
                            .on(field)
                            .with_value(raw),
                    );
                    score -= 30.0;
                }
            }
        }
        if !issues.is_empty() {
            return ValidationReport::rejected(issues, score);
        }

        for (value, field) in values.into_iter().zip(fields) {
            if value < 0.0 {
                issues.push(
                    ValidationIssue::error("NEGATIVE_VALUE", format!("'{field}' cannot be negative"))
                        .on(field)
                        .with_value(value),
                );
                score -= 20.0;
            }
        }
        if !issues.is_empty() {
            return ValidationReport::rejected(issues, score);
        }

        let [positive, negative] = values;
        if !verify_meta(positive, negative) {
            let balance = calculate_balance(positive, negative);
            issues.push(
                ValidationIssue::error(
                    "UNBALANCED",
                    format!("Not META 50/50 balanced: {}", balance_text(balance)),
                )
                .on("balance")
                .with_value(balance_text(balance)),
            );
            score -= (balance.0 - 50.0).abs() * 2.0;
        }
        ValidationReport::from_issues(issues, score)
    }
}

/// Checks a `{"numerator", "denominator"}` object against an expected split.
#[derive(Debug, Clone, Copy)]
pub struct ProportionRatioValidator {
    expected: (f64, f64),
}

impl Default for ProportionRatioValidator {
    fn default() -> Self {
        Self {
            expected: (52.0, 48.0),
        }
    }
}

impl ProportionRatioValidator {
    #[must_use]
    pub const fn new(expected: (f64, f64)) -> Self {
        Self { expected }
    }
}

impl Validator<Value> for ProportionRatioValidator {
    fn name(&self) -> &str {
        "proportion"
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        let numerator = data.get("numerator").and_then(Value::as_f64);
        let denominator = data.get("denominator").and_then(Value::as_f64);
        let (Some(num), Some(den)) = (numerator, denominator) else {
            return ValidationReport::rejected(
                vec![ValidationIssue::error(
                    "MISSING_FIELDS",
                    "Missing 'numerator' or 'denominator'",
                )],
                0.0,
            );
        };
        if den == 0.0 {
            return ValidationReport::rejected(
                vec![
                    ValidationIssue::new(
                        "ZERO_DENOMINATOR",
                        ValidationSeverity::Critical,
                        "Denominator cannot be zero",
                    )
                    .on("denominator")
                    .with_value(0),
                ],
                0.0,
            );
        }

        let actual = calculate_balance(num, den);
        let deviation_num = (actual.0 - self.expected.0).abs();
        let deviation_den = (actual.1 - self.expected.1).abs();
        let mut issues = Vec::new();
        let mut score = 100.0;
        if deviation_num > 0.5 || deviation_den > 0.5 {
            let severity = if deviation_num < 5.0 {
                ValidationSeverity::Warning
            } else {
                ValidationSeverity::Error
            };
            issues.push(
                ValidationIssue::new(
                    "RATIO_MISMATCH",
                    severity,
                    format!(
                        "Ratio {} differs from expected {}/{}",
                        balance_text(actual),
                        self.expected.0,
                        self.expected.1
                    ),
                )
                .on("ratio")
                .with_value(balance_text(actual)),
            );
            score -= (deviation_num + deviation_den) * 2.0;
        }
        ValidationReport::from_issues(issues, score)
    }
}

/// JSON value shapes a [`SchemaValidator`] can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Integer,
    String,
    Bool,
    Array,
    Object,
}

impl FieldKind {
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::Number => value.is_number(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::String => value.is_string(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Array => value.is_array(),
            FieldKind::Object => value.is_object(),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    fields: Vec<(String, FieldKind)>,
}

impl SchemaValidator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push((name.into(), kind));
        self
    }
}

impl Validator<Value> for SchemaValidator {
    fn name(&self) -> &str {
        "schema"
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        let weight = if self.fields.is_empty() {
            100.0
        } else {
            100.0 / self.fields.len() as f64
        };
        let mut issues = Vec::new();
        let mut score = 100.0;
        for (field, kind) in &self.fields {
            match data.get(field) {
                None => {
                    issues.push(
                        ValidationIssue::error(
                            "MISSING_FIELD",
                            format!("Missing required field: {field}"),
                        )
                        .on(field),
                    );
                    score -= weight;
                }
                Some(value) if !kind.matches(value) => {
                    issues.push(
                        ValidationIssue::error(
                            "TYPE_MISMATCH",
                            format!("Field '{field}' expected {kind:?}, got {}", kind_of(value)),
                        )
                        .on(field)
                        .with_value(value),
                    );
                    score -= weight;
                }
                Some(_) => {}
            }
        }
        ValidationReport::from_issues(issues, score)
    }
}

#[derive(Debug, Clone)]
pub struct RangeValidator {
    name: String,
    min: Option<f64>,
    max: Option<f64>,
}

impl RangeValidator {
    #[must_use]
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            name: "range".to_string(),
            min,
            max,
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn penalty(deviation: f64, bound: f64) -> f64 {
        if bound == 0.0 {
            50.0
        } else {
            (deviation / bound.abs() * 100.0).min(50.0)
        }
    }
}

impl Validator<f64> for RangeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, value: &f64) -> ValidationReport {
        let value = *value;
        let mut issues = Vec::new();
        let mut score = 100.0;
        if let Some(min) = self.min
            && value < min
        {
            issues.push(
                ValidationIssue::error(
                    "BELOW_MINIMUM",
                    format!("Value {value} is below minimum {min}"),
                )
                .with_value(value),
            );
            score -= Self::penalty(min - value, min);
        }
        if let Some(max) = self.max
            && value > max
        {
            issues.push(
                ValidationIssue::error(
                    "ABOVE_MAXIMUM",
                    format!("Value {value} is above maximum {max}"),
                )
                .with_value(value),
            );
            score -= Self::penalty(value - max, max);
        }
        ValidationReport::from_issues(issues, score)
    }
}

impl Validator<Value> for RangeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        match data.as_f64() {
            Some(value) => Validator::<f64>::validate(self, &value),
            None => ValidationReport::rejected(
                vec![
                    ValidationIssue::error(
                        "INVALID_TYPE",
                        format!("Expected numeric value, got {}", kind_of(data)),
                    )
                    .with_value(data),
                ],
                0.0,
            ),
        }
    }
}

type Extractor = dyn Fn(&Value) -> Option<Value> + Send + Sync;

struct Member {
    name: String,
    validator: Box<dyn Validator<Value> + Send + Sync>,
    extractor: Option<Box<Extractor>>,
}

/// Runs several validators over one value and averages their scores.
pub struct CompositeValidator {
    name: String,
    members: Vec<Member>,
}

impl fmt::Debug for CompositeValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeValidator")
            .field("name", &self.name)
            .field(
                "members",
                &self.members.iter().map(|m| &m.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CompositeValidator {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        validator: impl Validator<Value> + Send + Sync + 'static,
    ) -> Self {
        self.members.push(Member {
            name: name.into(),
            validator: Box::new(validator),
            extractor: None,
        });
        self
    }

    /// Validates whatever `extractor` pulls out of the input. `None` counts
    /// as a failed member with score 0.
    #[must_use]
    pub fn with_extractor(
        mut self,
        name: impl Into<String>,
        validator: impl Validator<Value> + Send + Sync + 'static,
        extractor: impl Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.members.push(Member {
            name: name.into(),
            validator: Box::new(validator),
            extractor: Some(Box::new(extractor)),
        });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Validator<Value> for CompositeValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        if self.members.is_empty() {
            return ValidationReport::from_issues(Vec::new(), 100.0);
        }
        let mut issues = Vec::new();
        let mut total = 0.0;
        for member in &self.members {
            let report = match &member.extractor {
                None => member.validator.validate(data),
                Some(extract) => match extract(data) {
                    Some(target) => member.validator.validate(&target),
                    None => {
                        issues.push(ValidationIssue::error(
                            "VALIDATOR_ERROR",
                            format!("Validator '{}' failed: nothing to extract", member.name),
                        ));
                        continue;
                    }
                },
            };
            total += report.score;
            issues.extend(report.issues);
        }
        ValidationReport::from_issues(issues, total / self.members.len() as f64)
    }
}

/// Checks anything that exposes a positive/negative pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaEquilibriumValidator;

impl MetaEquilibriumValidator {
    #[must_use]
    pub fn validate_balanced(&self, data: &impl Balanced) -> ValidationReport {
        let mut issues = Vec::new();
        let mut score = 100.0;
        if !data.is_balanced() {
            let balance = data.balance();
            issues.push(
                ValidationIssue::error(
                    "META_VIOLATION",
                    format!("Object not balanced: {}", balance_text(balance)),
                )
                .with_value(balance_text(balance)),
            );
            score -= (balance.0 - 50.0).abs() * 2.0;
        }
        ValidationReport::from_issues(issues, score)
    }
}

impl Validator<Value> for MetaEquilibriumValidator {
    fn name(&self) -> &str {
        "meta_equilibrium"
    }

    fn validate(&self, data: &Value) -> ValidationReport {
        let positive = data.get("positive").and_then(Value::as_f64);
        let negative = data.get("negative").and_then(Value::as_f64);
        let (Some(positive), Some(negative)) = (positive, negative) else {
            return ValidationReport::from_issues(
                vec![ValidationIssue::new(
                    "UNKNOWN_FORMAT",
                    ValidationSeverity::Warning,
                    "Cannot determine balance from data format",
                )],
                90.0,
            );
        };
        let mut issues = Vec::new();
        let mut score = 100.0;
        if !verify_meta(positive, negative) {
            let balance = calculate_balance(positive, negative);
            issues.push(
                ValidationIssue::error(
                    "META_VIOLATION",
                    format!("META 50/50 violated: {}", balance_text(balance)),
                )
                .with_value(balance_text(balance)),
            );
            score -= (balance.0 - 50.0).abs() * 2.0;
        }
        ValidationReport::from_issues(issues, score)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use civhub_types::BalancedPair;

    use super::*;

    fn codes(report: &ValidationReport) -> Vec<&'static str> {
        report.issues.iter().map(|i| i.code).collect()
    }

    #[test]
    fn balance_validator_returns_early_per_stage() {
        let v = BalanceValidator;
        let report = v.validate(&json!({}));
        assert_eq!(codes(&report), vec!["MISSING_POSITIVE", "MISSING_NEGATIVE"]);
        assert!(report.score.abs() < f64::EPSILON);

        let report = v.validate(&json!({"positive": "a", "negative": 1}));
        assert_eq!(codes(&report), vec!["INVALID_TYPE"]);
        assert!((report.score - 70.0).abs() < 1e-9);

        let report = v.validate(&json!({"positive": -1, "negative": -1}));
        assert!((report.score - 60.0).abs() < 1e-9);
        assert_eq!(report.error_count(), 2);

        let report = v.validate(&json!({"positive": 60, "negative": 40}));
        assert_eq!(codes(&report), vec!["UNBALANCED"]);
        assert!((report.score - 80.0).abs() < 1e-9);
        assert!(v.validate(&json!({"positive": 3, "negative": 3})).valid);
    }

    #[test]
    fn proportion_validator_grades_mismatch() {
        let v = ProportionRatioValidator::default();
        assert!(v.validate(&json!({"numerator": 52, "denominator": 48})).valid);

        let report = v.validate(&json!({"numerator": 50, "denominator": 50}));
        assert!(report.valid);
        assert_eq!(report.warning_count(), 1);
        assert!((report.score - 92.0).abs() < 1e-9);

        let report = v.validate(&json!({"numerator": 90, "denominator": 10}));
        assert!(!report.valid);

        let report = v.validate(&json!({"numerator": 1, "denominator": 0}));
        assert_eq!(report.issues[0].severity, ValidationSeverity::Critical);
        assert!(!v.validate(&json!({"numerator": 1})).valid);
    }

    #[test]
    fn schema_validator_weights_fields() {
        let v = SchemaValidator::new()
            .field("name", FieldKind::String)
            .field("count", FieldKind::Integer);
        let report = v.validate(&json!({"name": 3}));
        assert_eq!(codes(&report), vec!["TYPE_MISMATCH", "MISSING_FIELD"]);
        assert!(report.score.abs() < 1e-9);
        assert!(v.validate(&json!({"name": "x", "count": 2})).valid);
    }

    #[test]
    fn range_validator_caps_penalty() {
        let v = RangeValidator::new(Some(10.0), Some(20.0));
        let report = Validator::<f64>::validate(&v, &9.0);
        assert!((report.score - 90.0).abs() < 1e-9);
        let report = Validator::<f64>::validate(&v, &100.0);
        assert!((report.score - 50.0).abs() < 1e-9);
        let report = Validator::<Value>::validate(&v, &json!("x"));
        assert_eq!(codes(&report), vec!["INVALID_TYPE"]);
        let zero = RangeValidator::new(Some(0.0), None);
        assert!((Validator::<f64>::validate(&zero, &-0.1).score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn composite_averages_and_reports_missing_extracts() {
        let v = CompositeValidator::new("all")
            .with("balance", BalanceValidator)
            .with_extractor("range", RangeValidator::new(Some(0.0), Some(10.0)), |d| {
                d.get("positive").cloned()
            })
            .with_extractor("absent", BalanceValidator, |d| d.get("missing").cloned());
        let report = v.validate(&json!({"positive": 5, "negative": 5}));
        assert_eq!(codes(&report), vec!["VALIDATOR_ERROR"]);
        assert!((report.score - 200.0 / 3.0).abs() < 1e-9);
        assert!(!report.valid);
        assert!(CompositeValidator::new("none").validate(&json!(null)).valid);
    }

    #[test]
    fn meta_validator_handles_values_and_balanced_types() {
        let v = MetaEquilibriumValidator;
        let report = v.validate(&json!([1, 2]));
        assert!(report.valid);
        assert_eq!(report.warning_count(), 1);
        assert!((report.score - 90.0).abs() < 1e-9);

        let pair = BalancedPair::new(75.0, 25.0).unwrap();
        let report = v.validate_balanced(&pair);
        assert_eq!(codes(&report), vec!["META_VIOLATION"]);
        assert!((report.score - 50.0).abs() < 1e-9);
        assert!(v.validate_balanced(&BalancedPair::new(2.0, 2.0).unwrap()).valid);
    }
}
