//! Knowledge domains: dualities that must hold at 50/50, the concepts seeded
//! into them, and the registry that tracks hierarchies and relationships.

pub mod catalog;
mod concept;
mod domain;
mod registry;

use thiserror::Error;

use civhub_types::{BalanceError, DomainId};

pub use concept::{
    Concept, ConceptRelation, ConceptType, KnowledgeDomain, KnowledgeDuality, KnowledgeProof,
    KnowledgeStats, RelationType,
};
pub use domain::{
    AttributeProof, Domain, DomainAttribute, DomainDuality, DomainPole, DomainProof,
    DomainRelationship, DomainState, DomainType, DualityProof, PoleProof, RelationshipProof,
};
pub use registry::{
    DomainHierarchy, DomainRegistry, DomainStatus, HierarchyEntry, HierarchyProof,
    HierarchyValidation, RegistryProof, RegistryValidation, RelationshipStatus,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Pole value cannot be negative: {0}")]
    NegativePole(String),
    #[error(
        "Duality '{name}' violates META 50/50: {positive_pole}={positive:.2}% / {negative_pole}={negative:.2}%"
    )]
    UnbalancedDuality {
        name: String,
        positive_pole: String,
        negative_pole: String,
        positive: f64,
        negative: f64,
    },
    #[error("Domain '{0}' has no duality")]
    NoDuality(String),
    #[error("Domain '{0}' duality is not balanced")]
    NotBalanced(String),
    #[error("Domain must be active before stabilizing: {0}")]
    NotActive(String),
    #[error("Relationship '{name}' violates META 50/50: {give:.2}%/{receive:.2}%")]
    UnbalancedRelationship { name: String, give: f64, receive: f64 },
    #[error("Unknown domain: {0}")]
    UnknownCatalogEntry(String),
    #[error(transparent)]
    Balance(#[from] BalanceError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Domain already registered: {0}")]
    AlreadyRegistered(String),
    #[error("Domain name already exists: {0}")]
    NameTaken(String),
    #[error("Domain '{0}' does not maintain META 50/50 compliance")]
    NotCompliant(String),
    #[error("Domain not found: {0}")]
    DomainNotFound(DomainId),
    #[error("Hierarchy already registered: {0}")]
    HierarchyExists(String),
    #[error("Hierarchy not found: {0}")]
    HierarchyNotFound(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
