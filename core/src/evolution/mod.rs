//! Evolution tracking: energy pairs that grow through balanced deltas and
//! move between phases along a fixed transition table.

mod metrics;
mod state;
mod tracker;
mod transitions;

use thiserror::Error;

use civhub_types::{BalanceError, EntityId};

pub use metrics::{
    DEFAULT_MOMENTUM_WINDOW, EvolutionMetricValues, EvolutionMetrics, EvolutionReport,
    HistorySummary,
};
pub use state::{
    EnergyProof, EvolutionDelta, EvolutionDirection, EvolutionPhase, EvolutionProof,
    EvolutionSnapshot, EvolutionState, OperationalProof,
};
pub use tracker::{EntityStatus, EvolutionTracker, TrackerProof, TrackerValidation};
pub use transitions::{
    RuleStatus, RuleValidation, TransitionCheck, TransitionEngine, TransitionMatrix,
    TransitionProof, TransitionResult, TransitionRule, TransitionStatistics, TransitionType,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvolutionError {
    #[error("Change values cannot be negative")]
    NegativeChange { positive: f64, negative: f64 },
    #[error("Evolution delta violates META 50/50: +{positive:.2}%/-{negative:.2}%")]
    UnbalancedDelta { positive: f64, negative: f64 },
    #[error("Entity already registered: {0}")]
    AlreadyRegistered(EntityId),
    #[error("Entity not registered: {0}")]
    NotRegistered(EntityId),
    #[error(transparent)]
    Balance(#[from] BalanceError),
}
