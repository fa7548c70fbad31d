//! The top-level system: the catalog domains, their registry and the shared
//! equilibrium they report into.

use serde::Serialize;

use civhub_types::{Balanced, MetaEquilibrium, Pi6Proportion, verify_meta};

use crate::knowledge::{DomainError, DomainRegistry, KnowledgeDomain, RegistryError, catalog};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetaBalance {
    pub positive: f64,
    pub negative: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationalSplit {
    pub structure: f64,
    pub flexibility: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub name: String,
    pub concepts: usize,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainCounts {
    pub count: usize,
    pub details: Vec<DomainSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStats {
    pub system: String,
    pub version: String,
    pub meta_balanced: bool,
    pub operational_ratio: f64,
    pub domains: DomainCounts,
    pub total_concepts: usize,
    pub system_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProofEntry {
    pub component: String,
    pub claim: String,
    pub evidence: String,
    pub valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemProof {
    pub system: String,
    pub proofs: Vec<ProofEntry>,
    pub all_valid: bool,
    pub conclusion: String,
}

#[derive(Debug, Clone, Default)]
pub struct Hub {
    meta: MetaEquilibrium,
    registry: DomainRegistry,
    domains: Vec<KnowledgeDomain>,
}

impl Hub {
    pub const NAME: &'static str = "Civilisation Hub";
    pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds every catalog domain, registers it, and records its duality in
    /// the shared equilibrium. Domains already present are skipped.
    pub fn initialize(&mut self) -> Result<(), RegistryError> {
        for name in catalog::names() {
            if self.domain(name).is_some() {
                continue;
            }
            let knowledge = catalog::create(name)?;
            if let Some(duality) = knowledge.domain().duality() {
                let (positive, negative) = duality.pair();
                self.meta
                    .register_parameter(duality.name(), positive, negative)
                    .map_err(DomainError::from)?;
            }
            self.registry.register(knowledge.domain().clone(), true)?;
            tracing::info!(domain = name, concepts = knowledge.concept_count(), "Initialized domain");
            self.domains.push(knowledge);
        }
        Ok(())
    }

    #[must_use]
    pub fn meta(&self) -> &MetaEquilibrium {
        &self.meta
    }

    #[must_use]
    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    #[must_use]
    pub fn domains(&self) -> &[KnowledgeDomain] {
        &self.domains
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn domain(&self, name: &str) -> Option<&KnowledgeDomain> {
        self.domains.iter().find(|d| d.name().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn meta_balance(&self) -> MetaBalance {
        MetaBalance {
            positive: 50.0,
            negative: 50.0,
            balanced: verify_meta(50.0, 50.0),
        }
    }

    #[must_use]
    pub fn operational_ratio(&self) -> OperationalSplit {
        OperationalSplit {
            structure: 52.0,
            flexibility: 48.0,
            ratio: 52.0 / 48.0,
        }
    }

    #[must_use]
    pub fn validate_system(&self) -> bool {
        self.meta_balance().balanced && self.domains.iter().all(KnowledgeDomain::validate_balance)
    }

    #[must_use]
    pub fn stats(&self) -> SystemStats {
        let details: Vec<DomainSummary> = self
            .domains
            .iter()
            .map(|d| DomainSummary {
                name: d.name().to_lowercase(),
                concepts: d.concept_count(),
                balanced: d.validate_balance(),
            })
            .collect();
        SystemStats {
            system: Self::NAME.to_string(),
            version: Self::VERSION.to_string(),
            meta_balanced: self.meta_balance().balanced,
            operational_ratio: self.operational_ratio().ratio,
            total_concepts: details.iter().map(|d| d.concepts).sum(),
            domains: DomainCounts {
                count: details.len(),
                details,
            },
            system_valid: self.validate_system(),
        }
    }

    #[must_use]
    pub fn proof(&self) -> SystemProof {
        let meta = self.meta_balance();
        let operational = self.operational_ratio();
        let pi6 = Pi6Proportion.verify_meta_connection();

        let mut proofs = vec![
            ProofEntry {
                component: "META Equilibrium".to_string(),
                claim: "System maintains 50/50 balance".to_string(),
                evidence: format!("Positive: {}%, Negative: {}%", meta.positive, meta.negative),
                valid: meta.balanced,
            },
            ProofEntry {
                component: "Operational Ratio".to_string(),
                claim: "52/48 ratio enables META balance".to_string(),
                evidence: format!(
                    "Structure: {}%, Flexibility: {}%",
                    operational.structure, operational.flexibility
                ),
                valid: (operational.ratio - 1.0833).abs() < 0.01,
            },
            ProofEntry {
                component: "PI/6 Proportion".to_string(),
                claim: "Operational ratio derived from PI/6".to_string(),
                evidence: format!(
                    "PI/6 ≈ {:.4}, sin(PI/6) = 0.5 (META connection)",
                    pi6.pi_6_value
                ),
                valid: pi6.sin_equals_half,
            },
        ];
        for knowledge in &self.domains {
            let name = knowledge.name().to_lowercase();
            let valid = knowledge.validate_balance();
            proofs.push(ProofEntry {
                component: format!("Domain: {name}"),
                claim: format!("{name} domain maintains META balance"),
                evidence: format!("Duality balanced: {valid}"),
                valid,
            });
        }

        let all_valid = proofs.iter().all(|p| p.valid);
        SystemProof {
            system: Self::NAME.to_string(),
            proofs,
            all_valid,
            conclusion: if all_valid {
                "Civilisation Hub maintains META 50/50 equilibrium across all components."
            } else {
                "Some components require balance adjustment."
            }
            .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_loads_catalog() {
        let mut hub = Hub::new();
        hub.initialize().unwrap();
        assert_eq!(hub.domains().len(), 5);
        assert_eq!(hub.registry().domain_count(), 5);
        assert_eq!(hub.meta().validated_parameters().len(), 5);
        assert!(hub.domain("BIOLOGY").is_some());

        hub.initialize().unwrap();
        assert_eq!(hub.domains().len(), 5);
    }

    #[test]
    fn proof_covers_every_component() {
        let mut hub = Hub::new();
        hub.initialize().unwrap();
        let proof = hub.proof();
        assert_eq!(proof.proofs.len(), 8);
        assert!(proof.all_valid);
        assert_eq!(proof.proofs[3].component, "Domain: mathematics");
        assert_eq!(
            proof.conclusion,
            "Civilisation Hub maintains META 50/50 equilibrium across all components."
        );
    }

    #[test]
    fn stats_sum_concepts() {
        let mut hub = Hub::new();
        hub.initialize().unwrap();
        let stats = hub.stats();
        assert!(stats.system_valid);
        assert_eq!(stats.domains.count, 5);
        assert_eq!(
            stats.total_concepts,
            hub.domains().iter().map(KnowledgeDomain::concept_count).sum::<usize>()
        );
    }

    #[test]
    fn empty_hub_is_valid() {
        let hub = Hub::new();
        assert!(hub.validate_system());
        assert_eq!(hub.proof().proofs.len(), 3);
    }
}
