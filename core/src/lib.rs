//! Core logic for Civilisation Hub.
//!
//! Every tracker in this crate works on paired quantities that are expected to
//! hold at 50/50 (the META invariant), with 52/48 as the operational split that
//! supports it. Each component can emit a serialisable proof of its balance.

pub mod evolution;
mod hub;
pub mod knowledge;
pub mod participation;
mod policy;
pub mod verification;

pub use hub::{
    DomainCounts, DomainSummary, Hub, MetaBalance, OperationalSplit, ProofEntry, SystemProof,
    SystemStats,
};
pub use policy::DeltaPolicy;
