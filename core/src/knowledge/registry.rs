use serde::Serialize;

use civhub_types::{Balanced, DomainId};

use super::domain::{Domain, DomainProof, DomainRelationship, DomainState, DomainType, RelationshipProof};
use super::RegistryError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyEntry {
    pub name: String,
    pub valid: bool,
    pub state: DomainState,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyValidation {
    pub hierarchy: String,
    pub total_domains: usize,
    pub root_domains: usize,
    pub all_valid: bool,
    pub domains: Vec<HierarchyEntry>,
    pub proof: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyProof {
    #[serde(flatten)]
    pub validation: HierarchyValidation,
    pub domain_proofs: Vec<DomainProof>,
}

/// Named grouping of root domains. Roots are resolved through the registry,
/// and every sub-domain under a root belongs to the hierarchy too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainHierarchy {
    name: String,
    roots: Vec<DomainId>,
}

impl DomainHierarchy {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roots: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn roots(&self) -> &[DomainId] {
        &self.roots
    }

    fn members<'r>(&self, registry: &'r DomainRegistry) -> Vec<&'r Domain> {
        self.roots
            .iter()
            .filter_map(|id| registry.get(*id))
            .flat_map(Domain::flatten)
            .collect()
    }

    #[must_use]
    pub fn validate(&self, registry: &DomainRegistry) -> HierarchyValidation {
        let members = self.members(registry);
        let domains: Vec<HierarchyEntry> = members
            .iter()
            .map(|d| HierarchyEntry {
                name: d.name().to_string(),
                valid: d.validate_meta_compliance(),
                state: d.state(),
            })
            .collect();
        let all_valid = domains.iter().all(|d| d.valid);
        HierarchyValidation {
            hierarchy: self.name.clone(),
            total_domains: domains.len(),
            root_domains: self.roots.len(),
            all_valid,
            domains,
            proof: if all_valid {
                format!("Hierarchy '{}' maintains META 50/50", self.name)
            } else {
                format!("Hierarchy '{}' has invalid domains", self.name)
            },
        }
    }

    #[must_use]
    pub fn proof(&self, registry: &DomainRegistry) -> HierarchyProof {
        HierarchyProof {
            validation: self.validate(registry),
            domain_proofs: self
                .members(registry)
                .into_iter()
                .map(Domain::proof)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStatus {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DomainType,
    pub state: DomainState,
    pub meta_valid: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipStatus {
    pub name: String,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryValidation {
    pub total_domains: usize,
    pub valid_domains: usize,
    pub invalid_domains: usize,
    pub all_valid: bool,
    pub domains: Vec<DomainStatus>,
    pub relationships: Vec<RelationshipStatus>,
    pub hierarchies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryProof {
    #[serde(flatten)]
    pub validation: RegistryValidation,
    pub domain_proofs: Vec<DomainProof>,
    pub hierarchy_proofs: Vec<HierarchyProof>,
    pub relationship_proofs: Vec<RelationshipProof>,
    pub proof: String,
}

/// Owns every registered domain along with the hierarchies and relationships
/// built over them. Iteration follows registration order.
#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    domains: Vec<Domain>,
    hierarchies: Vec<DomainHierarchy>,
    relationships: Vec<DomainRelationship>,
}

impl DomainRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    #[must_use]
    pub fn hierarchy_count(&self) -> usize {
        self.hierarchies.len()
    }

    #[must_use]
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    #[must_use]
    pub fn relationships(&self) -> &[DomainRelationship] {
        &self.relationships
    }

    #[must_use]
    pub fn hierarchies(&self) -> &[DomainHierarchy] {
        &self.hierarchies
    }

    pub fn register(&mut self, domain: Domain, require_balanced: bool) -> Result<&Domain, RegistryError> {
        if self.get(domain.id()).is_some() {
            return Err(RegistryError::AlreadyRegistered(domain.name().to_string()));
        }
        if self.get_by_name(domain.name()).is_some() {
            return Err(RegistryError::NameTaken(domain.name().to_string()));
        }
        if require_balanced && !domain.validate_meta_compliance() {
            return Err(RegistryError::NotCompliant(domain.name().to_string()));
        }
        tracing::debug!(domain = domain.name(), id = %domain.id(), "Registered domain");
        self.domains.push(domain);
        Ok(&self.domains[self.domains.len() - 1])
    }

    /// Also drops the domain from hierarchy roots and removes its relationships.
    pub fn unregister(&mut self, id: DomainId) -> Option<Domain> {
        let index = self.domains.iter().position(|d| d.id() == id)?;
        let domain = self.domains.remove(index);
        for hierarchy in &mut self.hierarchies {
            hierarchy.roots.retain(|root| *root != id);
        }
        self.relationships.retain(|r| !r.involves(id));
        Some(domain)
    }

    #[must_use]
    pub fn get(&self, id: DomainId) -> Option<&Domain> {
        self.domains.iter().find(|d| d.id() == id)
    }

    pub fn get_mut(&mut self, id: DomainId) -> Option<&mut Domain> {
        self.domains.iter_mut().find(|d| d.id() == id)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Domain> {
        self.domains.iter().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn list(&self, kind: Option<DomainType>, state: Option<DomainState>) -> Vec<&Domain> {
        self.domains
            .iter()
            .filter(|d| kind.is_none_or(|k| d.kind() == k))
            .filter(|d| state.is_none_or(|s| d.state() == s))
            .collect()
    }

    /// Builds and registers a domain. With both poles given the domain is
    /// activated and must balance; without them it stays nascent.
    pub fn create_domain(
        &mut self,
        name: &str,
        kind: DomainType,
        description: &str,
        positive: Option<(&str, f64)>,
        negative: Option<(&str, f64)>,
    ) -> Result<&Domain, RegistryError> {
        let mut domain = Domain::new(name, kind, description);
        let require_balanced = match (positive, negative) {
            (Some(positive), Some(negative)) => {
                domain.set_duality(positive, negative, None)?;
                domain.activate()?;
                true
            }
            _ => false,
        };
        self.register(domain, require_balanced)
    }

    pub fn create_hierarchy(&mut self, name: &str) -> Result<&DomainHierarchy, RegistryError> {
        if self.hierarchy(name).is_some() {
            return Err(RegistryError::HierarchyExists(name.to_string()));
        }
        self.hierarchies.push(DomainHierarchy::new(name));
        Ok(&self.hierarchies[self.hierarchies.len() - 1])
    }

    #[must_use]
    pub fn hierarchy(&self, name: &str) -> Option<&DomainHierarchy> {
        self.hierarchies.iter().find(|h| h.name == name)
    }

    /// Adds a registered domain as a root of the named hierarchy.
    pub fn add_to_hierarchy(&mut self, hierarchy: &str, domain: DomainId) -> Result<(), RegistryError> {
        if self.get(domain).is_none() {
            return Err(RegistryError::DomainNotFound(domain));
        }
        let entry = self
            .hierarchies
            .iter_mut()
            .find(|h| h.name == hierarchy)
            .ok_or_else(|| RegistryError::HierarchyNotFound(hierarchy.to_string()))?;
        if !entry.roots.contains(&domain) {
            entry.roots.push(domain);
        }
        Ok(())
    }

    /// Links two registered domains, splitting `influence` evenly between
    /// give and receive.
    pub fn create_relationship(
        &mut self,
        name: &str,
        source: DomainId,
        target: DomainId,
        influence: f64,
        kind: &str,
    ) -> Result<&DomainRelationship, RegistryError> {
        let source = self.get(source).ok_or(RegistryError::DomainNotFound(source))?;
        let target = self.get(target).ok_or(RegistryError::DomainNotFound(target))?;
        let half = influence / 2.0;
        let relationship = DomainRelationship::new(name, source, target, half, half, kind)?;
        self.relationships.push(relationship);
        Ok(&self.relationships[self.relationships.len() - 1])
    }

    #[must_use]
    pub fn relationships_for(&self, id: DomainId) -> Vec<&DomainRelationship> {
        self.relationships.iter().filter(|r| r.involves(id)).collect()
    }

    #[must_use]
    pub fn validate_all(&self) -> RegistryValidation {
        let domains: Vec<DomainStatus> = self
            .domains
            .iter()
            .map(|d| DomainStatus {
                name: d.name().to_string(),
                kind: d.kind(),
                state: d.state(),
                meta_valid: d.validate_meta_compliance(),
            })
            .collect();
        let valid_domains = domains.iter().filter(|d| d.meta_valid).count();
        let invalid_domains = domains.len() - valid_domains;
        RegistryValidation {
            total_domains: domains.len(),
            valid_domains,
            invalid_domains,
            all_valid: invalid_domains == 0,
            domains,
            relationships: self
                .relationships
                .iter()
                .map(|r| RelationshipStatus {
                    name: r.name().to_string(),
                    balanced: r.is_balanced(),
                })
                .collect(),
            hierarchies: self.hierarchies.iter().map(|h| h.name.clone()).collect(),
        }
    }

    #[must_use]
    pub fn proof(&self) -> RegistryProof {
        let validation = self.validate_all();
        let proof = if validation.all_valid {
            "Registry maintains META 50/50 equilibrium"
        } else {
            "Registry contains domains violating META 50/50"
        };
        RegistryProof {
            domain_proofs: self.domains.iter().map(Domain::proof).collect(),
            hierarchy_proofs: self.hierarchies.iter().map(|h| h.proof(self)).collect(),
            relationship_proofs: self
                .relationships
                .iter()
                .map(DomainRelationship::proof)
                .collect(),
            proof: proof.to_string(),
            validation,
        }
    }
}
