use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{Balanced, ConceptId, DomainId, RelationId};

use super::domain::{Domain, DomainType};

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum ConceptType: ConceptType {
        Axiom => "axiom",
        Theorem => "theorem",
        Hypothesis => "hypothesis",
        #[default]
        Definition => "definition",
        Principle => "principle",
        Law => "law",
        Theory => "theory",
        Model => "model",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RelationType: RelationType {
        #[default]
        DerivesFrom => "derives_from",
        Implies => "implies",
        Contradicts => "contradicts",
        Supports => "supports",
        Extends => "extends",
        Specializes => "specializes",
        Generalizes => "generalizes",
        Equivalent => "equivalent",
    }
}

/// A named idea whose certainty and uncertainty always sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Concept {
    id: ConceptId,
    name: String,
    kind: ConceptType,
    description: String,
    certainty: f64,
    uncertainty: f64,
    domain: Option<DomainId>,
    created_at: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
}

impl Concept {
    /// Normalises the pair to sum to 100 unless both sides are zero.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: ConceptType,
        description: impl Into<String>,
        certainty: f64,
        uncertainty: f64,
    ) -> Self {
        let certainty = certainty.max(0.0);
        let uncertainty = uncertainty.max(0.0);
        let total = certainty + uncertainty;
        let (certainty, uncertainty) = if total > 0.0 {
            (certainty / total * 100.0, uncertainty / total * 100.0)
        } else {
            (certainty, uncertainty)
        };
        Self {
            id: ConceptId::new(),
            name: name.into(),
            kind,
            description: description.into(),
            certainty,
            uncertainty,
            domain: None,
            created_at: Utc::now(),
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn id(&self) -> ConceptId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> ConceptType {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn certainty(&self) -> f64 {
        self.certainty
    }

    #[must_use]
    pub const fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    #[must_use]
    pub const fn domain(&self) -> Option<DomainId> {
        self.domain
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Shifts certainty by `delta`, clamped to 0..=100.
    pub fn adjust_certainty(&mut self, delta: f64) {
        self.certainty = (self.certainty + delta).clamp(0.0, 100.0);
        self.uncertainty = 100.0 - self.certainty;
    }
}

impl Balanced for Concept {
    fn pair(&self) -> (f64, f64) {
        (self.certainty, self.uncertainty)
    }

    fn is_balanced(&self) -> bool {
        (self.certainty - 50.0).abs() < 0.01
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptRelation {
    id: RelationId,
    source: ConceptId,
    target: ConceptId,
    kind: RelationType,
    strength: f64,
    bidirectional: bool,
}

impl ConceptRelation {
    #[must_use]
    pub fn new(source: ConceptId, target: ConceptId, kind: RelationType, strength: f64) -> Self {
        Self {
            id: RelationId::new(),
            source,
            target,
            kind,
            strength: strength.clamp(0.0, 100.0),
            bidirectional: false,
        }
    }

    #[must_use]
    pub fn bidirectional(mut self) -> Self {
        self.bidirectional = true;
        self
    }

    #[must_use]
    pub const fn id(&self) -> RelationId {
        self.id
    }

    #[must_use]
    pub const fn source(&self) -> ConceptId {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> ConceptId {
        self.target
    }

    #[must_use]
    pub const fn kind(&self) -> RelationType {
        self.kind
    }

    #[must_use]
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    #[must_use]
    pub const fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    #[must_use]
    pub fn involves(&self, id: ConceptId) -> bool {
        self.source == id || self.target == id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeStats {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DomainType,
    pub concepts: usize,
    pub axioms: usize,
    pub relations: usize,
    pub concepts_by_type: BTreeMap<ConceptType, usize>,
    pub average_certainty: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeDuality {
    pub positive: String,
    pub negative: String,
    pub balanced: bool,
    pub balance: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeProof {
    pub domain: String,
    pub statistics: KnowledgeStats,
    pub duality: Option<KnowledgeDuality>,
    pub meta_valid: bool,
    pub proof: String,
}

/// A domain populated with concepts and the relations between them.
#[derive(Debug, Clone)]
pub struct KnowledgeDomain {
    domain: Domain,
    concepts: Vec<Concept>,
    relations: Vec<ConceptRelation>,
}

impl KnowledgeDomain {
    #[must_use]
    pub const fn new(domain: Domain) -> Self {
        Self {
            domain,
            concepts: Vec::new(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.domain.name()
    }

    #[must_use]
    pub const fn domain(&self) -> &Domain {
        &self.domain
    }

    pub fn domain_mut(&mut self) -> &mut Domain {
        &mut self.domain
    }

    #[must_use]
    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    #[must_use]
    pub fn relations(&self) -> &[ConceptRelation] {
        &self.relations
    }

    #[must_use]
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    #[must_use]
    pub fn axiom_count(&self) -> usize {
        self.axioms().count()
    }

    pub fn axioms(&self) -> impl Iterator<Item = &Concept> {
        self.concepts.iter().filter(|c| c.kind == ConceptType::Axiom)
    }

    pub fn add_concept(&mut self, mut concept: Concept) -> ConceptId {
        concept.domain = Some(self.domain.id());
        let id = concept.id;
        self.concepts.push(concept);
        id
    }

    /// Adds a concept with `uncertainty = 100 - certainty`.
    pub fn create_concept(
        &mut self,
        name: impl Into<String>,
        kind: ConceptType,
        description: impl Into<String>,
        certainty: f64,
    ) -> ConceptId {
        let certainty = certainty.clamp(0.0, 100.0);
        self.add_concept(Concept::new(
            name,
            kind,
            description,
            certainty,
            100.0 - certainty,
        ))
    }

    pub fn create_relation(
        &mut self,
        source: ConceptId,
        target: ConceptId,
        kind: RelationType,
        strength: f64,
    ) -> RelationId {
        let relation = ConceptRelation::new(source, target, kind, strength);
        let id = relation.id;
        self.relations.push(relation);
        id
    }

    #[must_use]
    pub fn concept(&self, id: ConceptId) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.id == id)
    }

    pub fn concept_mut(&mut self, id: ConceptId) -> Option<&mut Concept> {
        self.concepts.iter_mut().find(|c| c.id == id)
    }

    #[must_use]
    pub fn concept_by_name(&self, name: &str) -> Option<&Concept> {
        let name = name.to_lowercase();
        self.concepts.iter().find(|c| c.name.to_lowercase() == name)
    }

    #[must_use]
    pub fn relations_for(&self, id: ConceptId) -> Vec<&ConceptRelation> {
        self.relations.iter().filter(|r| r.involves(id)).collect()
    }

    #[must_use]
    pub fn concepts_of(&self, kind: ConceptType) -> Vec<&Concept> {
        self.concepts.iter().filter(|c| c.kind == kind).collect()
    }

    #[must_use]
    pub fn validate_balance(&self) -> bool {
        self.domain.validate_meta_compliance()
    }

    #[must_use]
    pub fn stats(&self) -> KnowledgeStats {
        let mut concepts_by_type = BTreeMap::new();
        for concept in &self.concepts {
            *concepts_by_type.entry(concept.kind).or_insert(0) += 1;
        }
        let average_certainty = if self.concepts.is_empty() {
            0.0
        } else {
            self.concepts.iter().map(|c| c.certainty).sum::<f64>() / self.concepts.len() as f64
        };
        KnowledgeStats {
            name: self.name().to_string(),
            kind: self.domain.kind(),
            concepts: self.concepts.len(),
            axioms: self.axiom_count(),
            relations: self.relations.len(),
            concepts_by_type,
            average_certainty,
            balanced: self.validate_balance(),
        }
    }

    #[must_use]
    pub fn proof(&self) -> KnowledgeProof {
        let meta_valid = self.validate_balance();
        let name = self.name();
        KnowledgeProof {
            domain: name.to_string(),
            statistics: self.stats(),
            duality: self.domain.duality().map(|d| KnowledgeDuality {
                positive: d.positive().name().to_string(),
                negative: d.negative().name().to_string(),
                balanced: d.is_balanced(),
                balance: d.balance(),
            }),
            meta_valid,
            proof: if meta_valid {
                format!("Domain '{name}' maintains META 50/50 equilibrium")
            } else {
                format!("Domain '{name}' requires balance adjustment")
            },
        }
    }
}
