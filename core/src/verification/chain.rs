use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::verifier::{VerificationResult, VerificationType, Verifier};

type Transform = dyn Fn(&Value) -> Result<Value, String> + Send + Sync;

struct ChainStep {
    name: String,
    transform: Box<Transform>,
    rule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    pub chain: String,
    pub total_steps: usize,
    pub executed: usize,
    pub passed: usize,
    pub failed: usize,
    pub complete: bool,
}

/// Ordered verification steps. Each step transforms the previous step's data
/// and checks it against a named rule; the chain stops at the first failure.
pub struct VerificationChain {
    name: String,
    steps: Vec<ChainStep>,
    results: Vec<VerificationResult>,
}

impl fmt::Debug for VerificationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationChain")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("results", &self.results.len())
            .finish()
    }
}

impl VerificationChain {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            results: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    pub fn add_step(
        &mut self,
        name: impl Into<String>,
        transform: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
        rule: impl Into<String>,
    ) -> &mut Self {
        self.steps.push(ChainStep {
            name: name.into(),
            transform: Box::new(transform),
            rule: rule.into(),
        });
        self
    }

    /// Returns whether every step verified, plus the results of the steps run.
    pub fn execute(&mut self, verifier: &mut Verifier, data: Value) -> (bool, &[VerificationResult]) {
        self.results.clear();
        let mut current = data;
        let mut all_passed = true;

        for step in &self.steps {
            let step_data = match (step.transform)(&current) {
                Ok(value) => value,
                Err(err) => {
                    self.results.push(VerificationResult::detached_failure(format!(
                        "Transform error in {}: {err}",
                        step.name
                    )));
                    all_passed = false;
                    break;
                }
            };
            let claim_id = match verifier.create_claim(
                format!("Chain step: {}", step.name),
                VerificationType::Compliance,
                0.0,
                0.0,
            ) {
                Ok(claim) => claim.id(),
                Err(err) => {
                    self.results
                        .push(VerificationResult::detached_failure(err.to_string()));
                    all_passed = false;
                    break;
                }
            };
            let result = verifier.verify_claim(claim_id, &step_data, Some(&step.rule));
            let passed = result.passed();
            self.results.push(result);
            if !passed {
                all_passed = false;
                break;
            }
            current = step_data;
        }

        tracing::debug!(chain = %self.name, all_passed, steps = self.results.len(), "Executed verification chain");
        (all_passed, &self.results)
    }

    #[must_use]
    pub fn summary(&self) -> ChainSummary {
        let passed = self.results.iter().filter(|r| r.passed()).count();
        let failed = self.results.len() - passed;
        ChainSummary {
            chain: self.name.clone(),
            total_steps: self.steps.len(),
            executed: self.results.len(),
            passed,
            failed,
            complete: self.results.len() == self.steps.len() && failed == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn chain() -> VerificationChain {
        let mut chain = VerificationChain::new("ledger");
        chain
            .add_step("balance", |data| Ok(data.clone()), "meta_balance")
            .add_step(
                "ratio",
                |data| {
                    let positive = data["positive"].as_f64().ok_or("positive missing")?;
                    Ok(json!({ "ratio": positive / positive, "expected": 1.0 }))
                },
                "proportion_check",
            );
        chain
    }

    #[test]
    fn balanced_data_passes_every_step() {
        let mut verifier = Verifier::new();
        let mut chain = chain();
        let (passed, results) = chain.execute(&mut verifier, json!({"positive": 4, "negative": 4}));
        assert!(passed);
        assert_eq!(results.len(), 2);
        assert!(chain.summary().complete);
    }

    #[test]
    fn stops_at_first_failure() {
        let mut verifier = Verifier::new();
        let mut chain = chain();
        let (passed, results) = chain.execute(&mut verifier, json!({"positive": 9, "negative": 1}));
        assert!(!passed);
        assert_eq!(results.len(), 1);
        let summary = chain.summary();
        assert_eq!((summary.executed, summary.failed), (1, 1));
        assert!(!summary.complete);
    }

    #[test]
    fn transform_error_is_recorded() {
        let mut verifier = Verifier::new();
        let mut chain = VerificationChain::new("broken");
        chain.add_step("explode", |_| Err("no data".to_string()), "meta_balance");
        let (passed, results) = chain.execute(&mut verifier, json!(null));
        assert!(!passed);
        assert_eq!(results[0].errors, vec!["Transform error in explode: no data".to_string()]);
    }
}
