use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use civhub_types::{Balanced, ClaimId, calculate_balance, non_negative, verify_meta};

use super::VerificationError;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum VerificationStatus: VerificationStatus {
        #[default]
        Pending => "pending",
        InProgress => "in_progress",
        Verified => "verified",
        Failed => "failed",
        Inconclusive => "inconclusive",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum VerificationType: VerificationType {
        #[default]
        Balance => "balance",
        Proportion => "proportion",
        Consistency => "consistency",
        Completeness => "completeness",
        Integrity => "integrity",
        Compliance => "compliance",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ConfidenceLevel: ConfidenceLevel {
        #[default]
        None => "none",
        Low => "low",
        Medium => "medium",
        High => "high",
        Absolute => "absolute",
    }
}

impl ConfidenceLevel {
    #[must_use]
    pub fn from_score(score_for: f64) -> Self {
        if score_for >= 90.0 {
            ConfidenceLevel::Absolute
        } else if score_for >= 75.0 {
            ConfidenceLevel::High
        } else if score_for >= 50.0 {
            ConfidenceLevel::Medium
        } else if score_for >= 25.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationClaim {
    id: ClaimId,
    kind: VerificationType,
    statement: String,
    evidence_for: f64,
    evidence_against: f64,
    timestamp: DateTime<Utc>,
}

impl VerificationClaim {
    pub fn new(
        statement: impl Into<String>,
        kind: VerificationType,
        evidence_for: f64,
        evidence_against: f64,
    ) -> Result<Self, VerificationError> {
        if non_negative("evidence_for", evidence_for).is_err()
            || non_negative("evidence_against", evidence_against).is_err()
        {
            return Err(VerificationError::NegativeEvidence);
        }
        Ok(Self {
            id: ClaimId::new(),
            kind,
            statement: statement.into(),
            evidence_for,
            evidence_against,
            timestamp: Utc::now(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> VerificationType {
        self.kind
    }

    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    #[must_use]
    pub const fn evidence_for(&self) -> f64 {
        self.evidence_for
    }

    #[must_use]
    pub const fn evidence_against(&self) -> f64 {
        self.evidence_against
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn total_evidence(&self) -> f64 {
        self.evidence_for + self.evidence_against
    }

    #[must_use]
    pub fn net_evidence(&self) -> f64 {
        self.evidence_for - self.evidence_against
    }

    pub fn add_evidence(&mut self, support: f64, opposition: f64) -> Result<(), VerificationError> {
        if non_negative("support", support).is_err()
            || non_negative("opposition", opposition).is_err()
        {
            return Err(VerificationError::NegativeEvidence);
        }
        self.evidence_for += support;
        self.evidence_against += opposition;
        Ok(())
    }
}

impl Balanced for VerificationClaim {
    fn pair(&self) -> (f64, f64) {
        (self.evidence_for, self.evidence_against)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub claim_id: ClaimId,
    pub status: VerificationStatus,
    pub kind: VerificationType,
    pub confidence: ConfidenceLevel,
    pub score_verified: f64,
    pub score_falsified: f64,
    pub timestamp: DateTime<Utc>,
    pub rule: Option<String>,
    pub errors: Vec<String>,
}

impl VerificationResult {
    fn failed(claim_id: ClaimId, kind: VerificationType, error: impl Into<String>) -> Self {
        Self {
            claim_id,
            status: VerificationStatus::Failed,
            kind,
            confidence: ConfidenceLevel::None,
            score_verified: 0.0,
            score_falsified: 0.0,
            timestamp: Utc::now(),
            rule: None,
            errors: vec![error.into()],
        }
    }

    /// Failed result not tied to any stored claim.
    #[must_use]
    pub fn detached_failure(error: impl Into<String>) -> Self {
        Self::failed(ClaimId::new(), VerificationType::Compliance, error)
    }

    #[must_use]
    pub fn total_score(&self) -> f64 {
        self.score_verified + self.score_falsified
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

impl Balanced for VerificationResult {
    fn pair(&self) -> (f64, f64) {
        (self.score_verified, self.score_falsified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleOutcome {
    pub passed: bool,
    pub score_for: f64,
    pub score_against: f64,
}

impl RuleOutcome {
    #[must_use]
    pub const fn new(passed: bool, score_for: f64, score_against: f64) -> Self {
        Self {
            passed,
            score_for,
            score_against,
        }
    }

    #[must_use]
    pub const fn pass() -> Self {
        Self::new(true, 100.0, 0.0)
    }

    #[must_use]
    pub const fn missing() -> Self {
        Self::new(false, 0.0, 100.0)
    }
}

type RuleFn = dyn Fn(&Value) -> RuleOutcome + Send + Sync;

pub struct VerificationRule {
    name: String,
    kind: VerificationType,
    description: String,
    validator: Box<RuleFn>,
}

impl fmt::Debug for VerificationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationRule")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl VerificationRule {
    pub fn new(
        name: impl Into<String>,
        kind: VerificationType,
        validator: impl Fn(&Value) -> RuleOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            validator: Box::new(validator),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> VerificationType {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn verify(&self, data: &Value) -> RuleOutcome {
        (self.validator)(data)
    }
}

fn number(data: &Value, key: &str) -> Option<f64> {
    data.get(key).and_then(Value::as_f64)
}

fn meta_balance(data: &Value) -> RuleOutcome {
    let (Some(positive), Some(negative)) = (number(data, "positive"), number(data, "negative"))
    else {
        return RuleOutcome::missing();
    };
    if verify_meta(positive, negative) {
        return RuleOutcome::pass();
    }
    let deviation = (calculate_balance(positive, negative).0 - 50.0).abs();
    RuleOutcome::new(false, 100.0 - deviation * 2.0, deviation * 2.0)
}

fn proportion_check(data: &Value) -> RuleOutcome {
    let (Some(actual), Some(expected)) = (number(data, "ratio"), number(data, "expected")) else {
        return RuleOutcome::missing();
    };
    let tolerance = number(data, "tolerance").unwrap_or(0.01);
    if (actual - expected).abs() <= tolerance {
        return RuleOutcome::pass();
    }
    let deviation = (actual - expected).abs() / expected * 100.0;
    RuleOutcome::new(false, (100.0 - deviation).max(0.0), deviation.min(100.0))
}

fn completeness_check(data: &Value) -> RuleOutcome {
    let (Some(required), Some(present)) = (
        data.get("required").and_then(Value::as_array),
        data.get("present").and_then(Value::as_array),
    ) else {
        return RuleOutcome::missing();
    };
    let mut wanted: Vec<&Value> = Vec::new();
    for field in required {
        if !wanted.contains(&field) {
            wanted.push(field);
        }
    }
    if wanted.is_empty() {
        return RuleOutcome::pass();
    }
    let found = wanted.iter().filter(|field| present.contains(**field)).count();
    let completeness = found as f64 / wanted.len() as f64 * 100.0;
    RuleOutcome::new(found == wanted.len(), completeness, 100.0 - completeness)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationStats {
    pub total: usize,
    pub verified: usize,
    pub failed: usize,
    pub inconclusive: usize,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifierValidation {
    pub claims: usize,
    pub results: usize,
    pub rules: usize,
    pub statistics: VerificationStats,
    pub aggregate_balance: String,
    pub system_balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifierProof {
    #[serde(flatten)]
    pub validation: VerifierValidation,
    pub proof: String,
}

/// Rule registry plus the claims and results it has produced.
///
/// Results from executed rules are kept separately from the history, which
/// also records failures for unknown claims or rules.
#[derive(Debug)]
pub struct Verifier {
    rules: Vec<VerificationRule>,
    claims: HashMap<ClaimId, VerificationClaim>,
    results: Vec<VerificationResult>,
    history: Vec<VerificationResult>,
}

impl Default for Verifier {
    fn default() -> Self {
        let mut verifier = Self::empty();
        verifier.register_rule(
            VerificationRule::new("meta_balance", VerificationType::Balance, meta_balance)
                .with_description("Verifies META 50/50 balance"),
        );
        verifier.register_rule(
            VerificationRule::new(
                "proportion_check",
                VerificationType::Proportion,
                proportion_check,
            )
            .with_description("Verifies ratio proportions"),
        );
        verifier.register_rule(
            VerificationRule::new(
                "completeness_check",
                VerificationType::Completeness,
                completeness_check,
            )
            .with_description("Verifies data completeness"),
        );
        verifier
    }
}

impl Verifier {
    /// Verifier with the built-in balance, proportion and completeness rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            claims: HashMap::new(),
            results: Vec::new(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    #[must_use]
    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    /// Results of claims that reached a rule, in verification order.
    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    #[must_use]
    pub fn history(&self) -> &[VerificationResult] {
        &self.history
    }

    /// A rule with an existing name is replaced in place.
    pub fn register_rule(&mut self, rule: VerificationRule) {
        match self.rules.iter_mut().find(|r| r.name == rule.name) {
            Some(existing) => *existing = rule,
            None => self.rules.push(rule),
        }
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&VerificationRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn rules(&self) -> impl Iterator<Item = &VerificationRule> {
        self.rules.iter()
    }

    pub fn create_claim(
        &mut self,
        statement: impl Into<String>,
        kind: VerificationType,
        evidence_for: f64,
        evidence_against: f64,
    ) -> Result<&mut VerificationClaim, VerificationError> {
        let claim = VerificationClaim::new(statement, kind, evidence_for, evidence_against)?;
        Ok(self.claims.entry(claim.id).or_insert(claim))
    }

    #[must_use]
    pub fn claim(&self, id: ClaimId) -> Option<&VerificationClaim> {
        self.claims.get(&id)
    }

    pub fn claim_mut(&mut self, id: ClaimId) -> Option<&mut VerificationClaim> {
        self.claims.get_mut(&id)
    }

    /// Runs the named rule, or the first rule matching the claim's type.
    pub fn verify_claim(
        &mut self,
        claim_id: ClaimId,
        data: &Value,
        rule_name: Option<&str>,
    ) -> VerificationResult {
        let Some(claim) = self.claims.get(&claim_id) else {
            let result = VerificationResult::failed(
                claim_id,
                VerificationType::default(),
                "Claim not found",
            );
            self.history.push(result.clone());
            return result;
        };
        let claim_kind = claim.kind;
        let rule = match rule_name {
            Some(name) => self.rule(name),
            None => self.rules.iter().find(|r| r.kind == claim_kind),
        };
        let Some(rule) = rule else {
            let result = VerificationResult::failed(
                claim_id,
                claim_kind,
                "No matching verification rule found",
            );
            self.history.push(result.clone());
            return result;
        };

        let outcome = rule.verify(data);
        let result = VerificationResult {
            claim_id,
            status: if outcome.passed {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Failed
            },
            kind: rule.kind,
            confidence: ConfidenceLevel::from_score(outcome.score_for),
            score_verified: outcome.score_for,
            score_falsified: outcome.score_against,
            timestamp: Utc::now(),
            rule: Some(rule.name.clone()),
            errors: Vec::new(),
        };
        tracing::debug!(
            claim = %claim_id,
            rule = %rule.name,
            status = %result.status,
            "Verified claim"
        );
        self.results.push(result.clone());
        self.history.push(result.clone());
        result
    }

    pub fn verify_balance(
        &mut self,
        positive: f64,
        negative: f64,
    ) -> Result<VerificationResult, VerificationError> {
        let claim_id = self
            .create_claim(
                format!("Balance check: {positive}/{negative}"),
                VerificationType::Balance,
                0.0,
                0.0,
            )?
            .id();
        let data = json!({ "positive": positive, "negative": negative });
        Ok(self.verify_claim(claim_id, &data, Some("meta_balance")))
    }

    pub fn verify_proportion(
        &mut self,
        actual: f64,
        expected: f64,
        tolerance: f64,
    ) -> Result<VerificationResult, VerificationError> {
        let claim_id = self
            .create_claim(
                format!("Proportion check: {actual} vs {expected}"),
                VerificationType::Proportion,
                0.0,
                0.0,
            )?
            .id();
        let data = json!({ "ratio": actual, "expected": expected, "tolerance": tolerance });
        Ok(self.verify_claim(claim_id, &data, Some("proportion_check")))
    }

    pub fn batch_verify(
        &mut self,
        items: &[(ClaimId, Value)],
        rule_name: &str,
    ) -> Vec<VerificationResult> {
        items
            .iter()
            .map(|(claim_id, data)| self.verify_claim(*claim_id, data, Some(rule_name)))
            .collect()
    }

    pub fn results_by_status(
        &self,
        status: VerificationStatus,
    ) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    #[must_use]
    pub fn stats(&self) -> VerificationStats {
        let total = self.results.len();
        let verified = self.results_by_status(VerificationStatus::Verified).count();
        let failed = self.results_by_status(VerificationStatus::Failed).count();
        VerificationStats {
            total,
            verified,
            failed,
            inconclusive: total - verified - failed,
            rate: if total == 0 {
                0.0
            } else {
                verified as f64 / total as f64 * 100.0
            },
        }
    }

    #[must_use]
    pub fn validate_all(&self) -> VerifierValidation {
        let (verified, falsified) = self.results.iter().fold((0.0, 0.0), |(v, f), r| {
            (v + r.score_verified, f + r.score_falsified)
        });
        let (a, b) = calculate_balance(verified, falsified);
        VerifierValidation {
            claims: self.claims.len(),
            results: self.results.len(),
            rules: self.rules.len(),
            statistics: self.stats(),
            aggregate_balance: format!("{a:.2}/{b:.2}"),
            system_balanced: verify_meta(verified, falsified),
        }
    }

    #[must_use]
    pub fn proof(&self) -> VerifierProof {
        let validation = self.validate_all();
        let proof = if validation.system_balanced {
            "Verification system maintains META 50/50 equilibrium"
        } else {
            "Verification system aggregate is not balanced"
        };
        VerifierProof {
            validation,
            proof: proof.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(100.0), ConfidenceLevel::Absolute);
        assert_eq!(ConfidenceLevel::from_score(75.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(50.0), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(25.0), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(24.9), ConfidenceLevel::None);
    }

    #[test]
    fn balance_rule_scores_by_deviation() {
        assert_eq!(
            meta_balance(&json!({"positive": 5, "negative": 5})),
            RuleOutcome::pass()
        );
        assert_eq!(meta_balance(&json!({"positive": 5})), RuleOutcome::missing());
        let outcome = meta_balance(&json!({"positive": 60.0, "negative": 40.0}));
        assert!(!outcome.passed);
        assert!((outcome.score_for - 80.0).abs() < 1e-9);
        assert!((outcome.score_against - 20.0).abs() < 1e-9);
    }

    #[test]
    fn proportion_rule_uses_relative_deviation() {
        let outcome = proportion_check(&json!({"ratio": 1.5, "expected": 1.0}));
        assert!(!outcome.passed);
        assert!((outcome.score_for - 50.0).abs() < 1e-9);
        assert!(proportion_check(&json!({"ratio": 1.083, "expected": 1.0833})).passed);
    }

    #[test]
    fn completeness_rule_counts_present_fields() {
        let outcome = completeness_check(&json!({"required": ["a", "b"], "present": ["a"]}));
        assert!(!outcome.passed);
        assert!((outcome.score_for - 50.0).abs() < 1e-9);
        assert!(completeness_check(&json!({"required": [], "present": []})).passed);
    }

    #[test]
    fn missing_claim_and_rule_fail_into_history() {
        let mut verifier = Verifier::new();
        let result = verifier.verify_claim(ClaimId::new(), &json!({}), None);
        assert_eq!(result.errors, vec!["Claim not found".to_string()]);

        let id = verifier
            .create_claim("consistent", VerificationType::Consistency, 0.0, 0.0)
            .unwrap()
            .id();
        let result = verifier.verify_claim(id, &json!({}), None);
        assert_eq!(result.status, VerificationStatus::Failed);
        assert_eq!(verifier.history().len(), 2);
        assert_eq!(verifier.result_count(), 0);
    }

    #[test]
    fn claim_picks_rule_by_type() {
        let mut verifier = Verifier::new();
        let id = verifier
            .create_claim("complete", VerificationType::Completeness, 0.0, 0.0)
            .unwrap()
            .id();
        let result = verifier.verify_claim(
            id,
            &json!({"required": ["x"], "present": ["x", "y"]}),
            None,
        );
        assert!(result.passed());
        assert_eq!(result.rule.as_deref(), Some("completeness_check"));
        assert_eq!(result.confidence, ConfidenceLevel::Absolute);
    }

    #[test]
    fn stats_and_proof() {
        let mut verifier = Verifier::new();
        assert!(verifier.verify_balance(10.0, 10.0).unwrap().passed());
        assert!(!verifier.verify_balance(90.0, 10.0).unwrap().passed());
        let stats = verifier.stats();
        assert_eq!((stats.total, stats.verified, stats.failed), (2, 1, 1));
        assert!((stats.rate - 50.0).abs() < 1e-12);
        assert!(!verifier.proof().validation.system_balanced);
        assert!(verifier.verify_proportion(1.0833, 1.0833, 0.01).unwrap().passed());
    }

    #[test]
    fn custom_rule_replaces_by_name() {
        let mut verifier = Verifier::new();
        verifier.register_rule(VerificationRule::new(
            "meta_balance",
            VerificationType::Balance,
            |_| RuleOutcome::new(true, 50.0, 50.0),
        ));
        assert_eq!(verifier.rule_count(), 3);
        let result = verifier.verify_balance(1.0, 99.0).unwrap();
        assert!(result.passed());
        assert!(result.is_balanced());
    }

    #[test]
    fn evidence_must_be_non_negative() {
        let mut claim =
            VerificationClaim::new("c", VerificationType::Integrity, 1.0, 1.0).unwrap();
        assert!(claim.add_evidence(-1.0, 0.0).is_err());
        claim.add_evidence(2.0, 2.0).unwrap();
        assert!(claim.is_balanced());
        assert!((claim.total_evidence() - 6.0).abs() < 1e-12);
        assert!(VerificationClaim::new("c", VerificationType::Integrity, -1.0, 0.0).is_err());
    }
}
