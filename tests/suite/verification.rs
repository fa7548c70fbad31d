//! Claims, rule dispatch, chains and validators.

use serde_json::{Value, json};

use civhub_core::verification::{
    BalanceValidator, MetaEquilibriumValidator, Validator, VerificationChain, VerificationStatus,
    Verifier,
};
use civhub_types::BalancedPair;

#[test]
fn balance_claims_pass_and_fail() {
    let mut verifier = Verifier::new();
    assert!(verifier.verify_balance(50.0, 50.0).unwrap().passed());

    let failed = verifier.verify_balance(52.0, 48.0).unwrap();
    assert_eq!(failed.status, VerificationStatus::Failed);
    assert!((failed.score_verified - 96.0).abs() < 1e-9);

    let stats = verifier.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.verified, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(verifier.results().len(), 2);
}

#[test]
fn proportion_claim_honours_tolerance() {
    let mut verifier = Verifier::new();
    assert!(verifier.verify_proportion(1.0833, 52.0 / 48.0, 0.01).unwrap().passed());
    assert!(!verifier.verify_proportion(1.2, 1.0, 0.01).unwrap().passed());
}

#[test]
fn chain_stops_at_first_failure() {
    let mut verifier = Verifier::new();
    let mut chain = VerificationChain::new("energy");
    chain
        .add_step("identity", |v: &Value| Ok(v.clone()), "meta_balance")
        .add_step(
            "skew",
            |v: &Value| {
                let positive = v["positive"].as_f64().ok_or("missing positive")?;
                Ok(json!({ "positive": positive * 2.0, "negative": v["negative"] }))
            },
            "meta_balance",
        )
        .add_step("never", |v: &Value| Ok(v.clone()), "meta_balance");

    let (passed, results) = chain.execute(&mut verifier, json!({ "positive": 5.0, "negative": 5.0 }));
    assert!(!passed);
    assert_eq!(results.len(), 2);

    let summary = chain.summary();
    assert_eq!(summary.total_steps, 3);
    assert_eq!(summary.passed, 1);
    assert!(!summary.complete);
}

#[test]
fn chain_reports_transform_errors() {
    let mut verifier = Verifier::new();
    let mut chain = VerificationChain::new("broken");
    chain.add_step("fail", |_: &Value| Err("no data".to_string()), "meta_balance");

    let (passed, results) = chain.execute(&mut verifier, Value::Null);
    assert!(!passed);
    assert!(results[0].errors[0].contains("Transform error in fail"));
}

#[test]
fn balance_validator_flags_each_problem() {
    let missing = BalanceValidator.validate(&json!({ "positive": 1.0 }));
    assert!(!missing.valid);
    assert_eq!(missing.issues[0].code, "MISSING_NEGATIVE");

    let skewed = BalanceValidator.validate(&json!({ "positive": 60.0, "negative": 40.0 }));
    assert!(!skewed.valid);
    assert!((skewed.score - 80.0).abs() < 1e-9);

    assert!(BalanceValidator.validate(&json!({ "positive": 3, "negative": 3 })).valid);
}

#[test]
fn meta_validator_accepts_balanced_values() {
    let validator = MetaEquilibriumValidator;
    assert!(validator.validate_balanced(&BalancedPair::even(10.0).unwrap()).valid);
    assert!(!validator.validate_balanced(&BalancedPair::new(9.0, 1.0).unwrap()).valid);
}
