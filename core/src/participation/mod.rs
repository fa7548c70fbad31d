//! Participation accounting: who gave and received how much, how engaged
//! they are, and contributions that wait for an equal reciprocation.

mod contributions;
mod metrics;
mod tracker;

use thiserror::Error;

use civhub_types::{BalanceError, ContributionId, EntityId, PoolId};

pub use contributions::{
    BalancePlan, Contribution, ContributionCategory, ContributionCounts, ContributionManager,
    ContributionMatcher, ContributionPool, ContributionProof, ContributionStatus,
    ContributionTotals, ContributionValidation, ContributorBalance, ContributorPlan, PoolProof,
};
pub use metrics::{ActivitySummary, ParticipationMetricValues, ParticipationMetrics, ParticipationReport, RankBy};
pub use tracker::{
    EngagementState, ExchangeProof, ParticipantStatus, ParticipationLevel, ParticipationProof,
    ParticipationRecord, ParticipationSnapshot, ParticipationState, ParticipationTracker,
    ParticipationTrackerProof, ParticipationType, ParticipationValidation,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParticipationError {
    #[error("Participation values cannot be negative")]
    NegativeValue { given: f64, received: f64 },
    #[error("Participation violates META 50/50: given={given:.2}%/received={received:.2}%")]
    UnbalancedRecord { given: f64, received: f64 },
    #[error("Participant already registered: {0}")]
    AlreadyRegistered(EntityId),
    #[error("Participant not registered: {0}")]
    NotRegistered(EntityId),
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContributionError {
    #[error("Contribution values cannot be negative")]
    NegativeValue,
    #[error("Reciprocation amount cannot be negative")]
    NegativeReciprocation,
    #[error("Reciprocation amount must be a finite number")]
    NonFiniteAmount,
    #[error("Contribution not found: {0}")]
    ContributionNotFound(ContributionId),
    #[error("Pool not found: {0}")]
    PoolNotFound(PoolId),
}
