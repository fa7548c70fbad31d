use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use civhub_types::{
    Balanced, DomainId, MetaEquilibrium, OperationalRatio, non_negative, split_52_48,
};

use super::DomainError;

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DomainType: DomainType {
        #[default]
        Fundamental => "fundamental",
        Derived => "derived",
        Composite => "composite",
        Emergent => "emergent",
    }
}

civhub_types::string_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum DomainState: DomainState {
        #[default]
        Nascent => "nascent",
        Active => "active",
        Evolving => "evolving",
        Stable => "stable",
        Archived => "archived",
    }
}

/// One side of a domain's duality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPole {
    name: String,
    value: f64,
}

impl DomainPole {
    pub fn new(name: impl Into<String>, value: f64) -> Result<Self, DomainError> {
        let name = name.into();
        if non_negative("pole", value).is_err() {
            return Err(DomainError::NegativePole(name));
        }
        Ok(Self { name, value })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDuality {
    name: String,
    positive: DomainPole,
    negative: DomainPole,
}

impl DomainDuality {
    #[must_use]
    pub fn new(name: impl Into<String>, positive: DomainPole, negative: DomainPole) -> Self {
        Self {
            name: name.into(),
            positive,
            negative,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn positive(&self) -> &DomainPole {
        &self.positive
    }

    #[must_use]
    pub const fn negative(&self) -> &DomainPole {
        &self.negative
    }

    #[must_use]
    pub fn total_energy(&self) -> f64 {
        self.positive.value + self.negative.value
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_balanced() {
            return Ok(());
        }
        let (positive, negative) = self.balance();
        Err(DomainError::UnbalancedDuality {
            name: self.name.clone(),
            positive_pole: self.positive.name.clone(),
            negative_pole: self.negative.name.clone(),
            positive,
            negative,
        })
    }
}

impl Balanced for DomainDuality {
    fn pair(&self) -> (f64, f64) {
        (self.positive.value, self.negative.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeProof {
    pub name: String,
    pub total: f64,
    pub structure: f64,
    pub flexibility: f64,
    pub ratio: String,
    pub is_operational: bool,
}

/// A quantity distributed 52/48 between structure and flexibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAttribute {
    name: String,
    total: f64,
    structure: f64,
    flexibility: f64,
    description: String,
}

impl DomainAttribute {
    #[must_use]
    pub fn new(name: impl Into<String>, total: f64, description: impl Into<String>) -> Self {
        let (structure, flexibility) = split_52_48(total);
        Self {
            name: name.into(),
            total,
            structure,
            flexibility,
            description: description.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    #[must_use]
    pub const fn structure(&self) -> f64 {
        self.structure
    }

    #[must_use]
    pub const fn flexibility(&self) -> f64 {
        self.flexibility
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// `None` for an empty attribute.
    #[must_use]
    pub fn operational_ratio(&self) -> Option<OperationalRatio> {
        OperationalRatio::new(self.structure, self.flexibility).ok()
    }

    #[must_use]
    pub fn prove_operational(&self) -> AttributeProof {
        let ratio = if self.total == 0.0 {
            "52/48".to_string()
        } else {
            format!(
                "{:.0}/{:.0}",
                self.structure / self.total * 100.0,
                self.flexibility / self.total * 100.0
            )
        };
        AttributeProof {
            name: self.name.clone(),
            total: self.total,
            structure: self.structure,
            flexibility: self.flexibility,
            ratio,
            is_operational: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoleProof {
    pub name: String,
    pub value: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualityProof {
    pub name: String,
    pub positive: PoleProof,
    pub negative: PoleProof,
    pub is_balanced: bool,
}

impl DualityProof {
    fn of(duality: &DomainDuality) -> Self {
        let (positive, negative) = duality.balance();
        Self {
            name: duality.name.clone(),
            positive: PoleProof {
                name: duality.positive.name.clone(),
                value: duality.positive.value,
                percentage: positive,
            },
            negative: PoleProof {
                name: duality.negative.name.clone(),
                value: duality.negative.value,
                percentage: negative,
            },
            is_balanced: duality.is_balanced(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainProof {
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: DomainType,
    pub state: DomainState,
    pub meta_valid: bool,
    pub duality: Option<DualityProof>,
    pub attributes: Vec<AttributeProof>,
    pub sub_domains_count: usize,
    pub sub_domains_valid: bool,
    pub proof: String,
}

/// A knowledge domain: a balanced duality, 52/48 attributes, and nested
/// sub-domains.
#[derive(Debug, Clone)]
pub struct Domain {
    id: DomainId,
    name: String,
    kind: DomainType,
    description: String,
    state: DomainState,
    meta: MetaEquilibrium,
    duality: Option<DomainDuality>,
    attributes: Vec<DomainAttribute>,
    sub_domains: Vec<Domain>,
}

impl Domain {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: DomainType, description: impl Into<String>) -> Self {
        Self {
            id: DomainId::new(),
            name: name.into(),
            kind,
            description: description.into(),
            state: DomainState::default(),
            meta: MetaEquilibrium::new(),
            duality: None,
            attributes: Vec::new(),
            sub_domains: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> DomainId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> DomainType {
        self.kind
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub const fn state(&self) -> DomainState {
        self.state
    }

    #[must_use]
    pub const fn duality(&self) -> Option<&DomainDuality> {
        self.duality.as_ref()
    }

    #[must_use]
    pub const fn meta(&self) -> &MetaEquilibrium {
        &self.meta
    }

    #[must_use]
    pub fn attributes(&self) -> &[DomainAttribute] {
        &self.attributes
    }

    #[must_use]
    pub fn sub_domains(&self) -> &[Domain] {
        &self.sub_domains
    }

    /// Sets the duality only if it holds at 50/50. The duality name defaults
    /// to `<domain>_duality`.
    pub fn set_duality(
        &mut self,
        positive: (&str, f64),
        negative: (&str, f64),
        name: Option<&str>,
    ) -> Result<(), DomainError> {
        let duality = DomainDuality::new(
            name.map_or_else(|| format!("{}_duality", self.name), str::to_string),
            DomainPole::new(positive.0, positive.1)?,
            DomainPole::new(negative.0, negative.1)?,
        );
        duality.validate()?;
        self.meta
            .register_parameter(duality.name.clone(), positive.1, negative.1)?;
        self.duality = Some(duality);
        Ok(())
    }

    pub fn add_attribute(
        &mut self,
        name: impl Into<String>,
        total: f64,
        description: impl Into<String>,
    ) -> &DomainAttribute {
        let attribute = DomainAttribute::new(name, total, description);
        match self.attributes.iter().position(|a| a.name == attribute.name) {
            Some(slot) => {
                self.attributes[slot] = attribute;
                &self.attributes[slot]
            }
            None => {
                self.attributes.push(attribute);
                &self.attributes[self.attributes.len() - 1]
            }
        }
    }

    pub fn add_sub_domain(&mut self, domain: Domain) {
        self.sub_domains.retain(|d| d.name != domain.name);
        self.sub_domains.push(domain);
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        let Some(duality) = &self.duality else {
            return Err(DomainError::NoDuality(self.name.clone()));
        };
        if !duality.is_balanced() {
            return Err(DomainError::NotBalanced(self.name.clone()));
        }
        self.state = DomainState::Active;
        Ok(())
    }

    pub fn stabilize(&mut self) -> Result<(), DomainError> {
        if self.state != DomainState::Active {
            return Err(DomainError::NotActive(self.name.clone()));
        }
        self.state = DomainState::Stable;
        Ok(())
    }

    pub fn set_state(&mut self, state: DomainState) {
        self.state = state;
    }

    /// False until a balanced duality is set.
    #[must_use]
    pub fn validate_meta_compliance(&self) -> bool {
        self.duality.as_ref().is_some_and(Balanced::is_balanced)
    }

    /// This domain followed by every nested sub-domain, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<&Domain> {
        let mut out = vec![self];
        for sub in &self.sub_domains {
            out.extend(sub.flatten());
        }
        out
    }

    #[must_use]
    pub fn proof(&self) -> DomainProof {
        let meta_valid = self.validate_meta_compliance();
        DomainProof {
            domain: self.name.clone(),
            kind: self.kind,
            state: self.state,
            meta_valid,
            duality: self.duality.as_ref().map(DualityProof::of),
            attributes: self
                .attributes
                .iter()
                .map(DomainAttribute::prove_operational)
                .collect(),
            sub_domains_count: self.sub_domains.len(),
            sub_domains_valid: self
                .sub_domains
                .iter()
                .all(Domain::validate_meta_compliance),
            proof: if meta_valid {
                format!("Domain '{}' maintains META 50/50 equilibrium", self.name)
            } else {
                format!("Domain '{}' violates META 50/50", self.name)
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipProof {
    pub name: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub give: f64,
    pub receive: f64,
    pub balance: String,
    pub is_balanced: bool,
    pub proof: String,
}

/// Directed link between two registered domains with balanced influence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRelationship {
    name: String,
    source: DomainId,
    source_name: String,
    target: DomainId,
    target_name: String,
    give: f64,
    receive: f64,
    kind: String,
    created_at: DateTime<Utc>,
}

impl DomainRelationship {
    pub fn new(
        name: impl Into<String>,
        source: &Domain,
        target: &Domain,
        give: f64,
        receive: f64,
        kind: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let relationship = Self {
            name: name.into(),
            source: source.id,
            source_name: source.name.clone(),
            target: target.id,
            target_name: target.name.clone(),
            give,
            receive,
            kind: kind.into(),
            created_at: Utc::now(),
        };
        if !relationship.is_balanced() {
            let (give, receive) = relationship.balance();
            return Err(DomainError::UnbalancedRelationship {
                name: relationship.name,
                give,
                receive,
            });
        }
        Ok(relationship)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> DomainId {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> DomainId {
        self.target
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn total_influence(&self) -> f64 {
        self.give + self.receive
    }

    #[must_use]
    pub fn involves(&self, id: DomainId) -> bool {
        self.source == id || self.target == id
    }

    #[must_use]
    pub fn proof(&self) -> RelationshipProof {
        let (give, receive) = self.balance();
        RelationshipProof {
            name: self.name.clone(),
            source: self.source_name.clone(),
            target: self.target_name.clone(),
            kind: self.kind.clone(),
            give: self.give,
            receive: self.receive,
            balance: format!("{give:.2}/{receive:.2}"),
            is_balanced: self.is_balanced(),
            proof: "Relationship maintains META 50/50 equilibrium".to_string(),
        }
    }
}

impl Balanced for DomainRelationship {
    fn pair(&self) -> (f64, f64) {
        (self.give, self.receive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbalanced_duality_is_rejected() {
        let mut domain = Domain::new("Art", DomainType::Derived, "");
        let err = domain
            .set_duality(("form", 60.0), ("content", 40.0), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Duality 'Art_duality' violates META 50/50: form=60.00% / content=40.00%"
        );
        assert!(domain.duality().is_none());
        assert!(!domain.validate_meta_compliance());
    }

    #[test]
    fn negative_pole_is_rejected() {
        assert!(matches!(
            DomainPole::new("void", -1.0),
            Err(DomainError::NegativePole(_))
        ));
    }

    #[test]
    fn lifecycle_requires_duality_then_activation() {
        let mut domain = Domain::new("Music", DomainType::Fundamental, "");
        assert!(matches!(domain.activate(), Err(DomainError::NoDuality(_))));
        assert!(matches!(domain.stabilize(), Err(DomainError::NotActive(_))));

        domain
            .set_duality(("sound", 50.0), ("silence", 50.0), Some("music_duality"))
            .unwrap();
        assert_eq!(domain.meta().parameter("music_duality"), Some((50.0, 50.0)));
        domain.activate().unwrap();
        domain.stabilize().unwrap();
        assert_eq!(domain.state(), DomainState::Stable);
    }

    #[test]
    fn attribute_splits_52_48() {
        let mut domain = Domain::new("Code", DomainType::Fundamental, "");
        let attribute = domain.add_attribute("effort", 100.0, "");
        assert!((attribute.structure() - 52.0).abs() < 1e-9);
        assert_eq!(attribute.prove_operational().ratio, "52/48");
        assert!(attribute.operational_ratio().is_some());
        domain.add_attribute("effort", 50.0, "");
        assert_eq!(domain.attributes().len(), 1);
    }

    #[test]
    fn proof_reports_sub_domains() {
        let mut parent = Domain::new("Science", DomainType::Composite, "");
        parent.set_duality(("theory", 1.0), ("experiment", 1.0), None).unwrap();
        parent.add_sub_domain(Domain::new("Chemistry", DomainType::Derived, ""));
        let proof = parent.proof();
        assert!(proof.meta_valid);
        assert_eq!(proof.sub_domains_count, 1);
        assert!(!proof.sub_domains_valid);
        assert_eq!(parent.flatten().len(), 2);
    }

    #[test]
    fn relationship_must_balance() {
        let a = Domain::new("A", DomainType::Fundamental, "");
        let b = Domain::new("B", DomainType::Fundamental, "");
        assert!(DomainRelationship::new("ab", &a, &b, 10.0, 5.0, "bidirectional").is_err());
        let relationship =
            DomainRelationship::new("ab", &a, &b, 5.0, 5.0, "bidirectional").unwrap();
        assert!(relationship.involves(b.id()));
        assert_eq!(relationship.proof().balance, "50.00/50.00");
    }
}
