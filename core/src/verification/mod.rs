//! Claim verification against named rules, multi-step chains, and
//! structured validators.

mod chain;
mod validators;
mod verifier;

use thiserror::Error;

pub use chain::{ChainSummary, VerificationChain};
pub use validators::{
    BalanceValidator, CompositeValidator, FieldKind, MetaEquilibriumValidator,
    ProportionRatioValidator, RangeValidator, SchemaValidator, ValidationIssue, ValidationReport,
    ValidationSeverity, Validator,
};
pub use verifier::{
    ConfidenceLevel, RuleOutcome, VerificationClaim, VerificationResult, VerificationRule,
    VerificationStats, VerificationStatus, VerificationType, Verifier, VerifierProof,
    VerifierValidation,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Evidence values cannot be negative")]
    NegativeEvidence,
}
