//! Core balance types for Civilisation Hub.
//!
//! This crate contains pure value types with no IO and minimal dependencies:
//! the balanced pair and its 50/50 and 52/48 checks, ratios and the π/6
//! proportion, the parameter registry, and the identifiers the other crates
//! key their collections by.

mod atom;
pub mod balance;
mod equilibrium;
mod error;
mod ids;
pub mod proportions;

pub use atom::{Atom, AtomBalance, AtomOperational, AtomProof, AtomState, WaveState};
pub use balance::{
    Balanced, BalanceError, BalancedPair, TargetRatio, Tolerance, calculate_balance,
    enables_meta, is_balanced_to, non_negative, percentages, split_50_50, split_52_48,
    verify_meta,
};
pub use equilibrium::{MetaEquilibrium, SubParameter, SubParameterProof};
pub use error::{EnumKind, EnumParseError};
pub use ids::{ClaimId, ConceptId, ContributionId, DomainId, EntityId, PoolId, RelationId};
pub use proportions::{
    Level, OperationalRatio, Pi6Proportion, Ratio, RatioError, RatioValidation,
    ProportionValidator,
};
