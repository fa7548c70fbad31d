//! Knowledge domains, the registry and the hub facade.

use civhub_core::Hub;
use civhub_core::knowledge::{
    ConceptType, Domain, DomainRegistry, DomainState, DomainType, KnowledgeDomain, RegistryError,
    RelationType, catalog,
};

use crate::common::initialized_hub;

#[test]
fn catalog_domains_are_balanced_and_seeded() {
    assert_eq!(
        catalog::names(),
        ["Mathematics", "Physics", "Code", "Biology", "Philosophy"]
    );
    for name in catalog::names() {
        let knowledge = catalog::create(name).unwrap();
        assert!(knowledge.validate_balance(), "{name} should balance");
        assert!(knowledge.concept_count() > 0);
        assert_eq!(knowledge.domain().state(), DomainState::Active);
    }
    assert!(catalog::create("alchemy").is_err());
}

#[test]
fn catalog_axiom_certainty_per_domain() {
    let mathematics = catalog::create("mathematics").unwrap();
    assert!(
        mathematics
            .concepts()
            .iter()
            .filter(|c| c.kind() == ConceptType::Axiom)
            .all(|c| (c.certainty() - 100.0).abs() < f64::EPSILON)
    );

    let philosophy = catalog::create("philosophy").unwrap();
    let contradictions = philosophy
        .relations()
        .iter()
        .filter(|r| r.kind() == RelationType::Contradicts)
        .count();
    assert!(contradictions > 0);
}

#[test]
fn concept_lookup_ignores_case() {
    let mut knowledge = KnowledgeDomain::new(Domain::new("Craft", DomainType::Derived, ""));
    let id = knowledge.create_concept("Tension", ConceptType::Principle, "", 80.0);
    let other = knowledge.create_concept("Release", ConceptType::Principle, "", 80.0);
    knowledge.create_relation(id, other, RelationType::Supports, 60.0);

    assert_eq!(knowledge.concept_by_name("tension").unwrap().id(), id);
    assert_eq!(knowledge.relations_for(other).len(), 1);
}

#[test]
fn registry_rejects_duplicates_and_unbalanced_domains() {
    let mut registry = DomainRegistry::new();
    let id = registry
        .create_domain(
            "Ecology",
            DomainType::Composite,
            "",
            Some(("producers", 25.0)),
            Some(("consumers", 25.0)),
        )
        .unwrap()
        .id();

    let mut copy = Domain::new("Ecology", DomainType::Composite, "");
    copy.set_duality(("a", 1.0), ("b", 1.0), None).unwrap();
    assert!(matches!(
        registry.register(copy, false),
        Err(RegistryError::NameTaken(_))
    ));

    let nascent = Domain::new("Drafts", DomainType::Emergent, "");
    assert!(matches!(
        registry.register(nascent.clone(), true),
        Err(RegistryError::NotCompliant(_))
    ));
    registry.register(nascent, false).unwrap();

    assert_eq!(registry.domain_count(), 2);
    assert_eq!(registry.list(Some(DomainType::Composite), None).len(), 1);
    assert!(registry.get(id).is_some());
}

#[test]
fn registry_relationship_splits_influence() {
    let mut registry = DomainRegistry::new();
    let a = registry
        .create_domain("A", DomainType::Fundamental, "", Some(("x", 1.0)), Some(("y", 1.0)))
        .unwrap()
        .id();
    let b = registry
        .create_domain("B", DomainType::Fundamental, "", Some(("x", 1.0)), Some(("y", 1.0)))
        .unwrap()
        .id();
    registry.create_relationship("flow", a, b, 40.0, "supports").unwrap();

    assert_eq!(registry.relationships_for(a).len(), 1);
    assert!(registry.validate_all().all_valid);

    registry.unregister(b);
    assert!(registry.relationships_for(a).is_empty());
}

#[test]
fn hub_proof_and_stats() {
    let hub = initialized_hub();
    assert!(hub.validate_system());
    assert!(hub.meta_balance().balanced);

    let stats = hub.stats();
    assert_eq!(stats.system, Hub::NAME);
    assert_eq!(stats.domains.count, 5);
    assert_eq!(
        stats.total_concepts,
        hub.domains().iter().map(KnowledgeDomain::concept_count).sum::<usize>()
    );

    let proof = hub.proof();
    assert!(proof.all_valid);
    assert!(proof.proofs.iter().any(|p| p.component == "Domain: physics"));
}
