//! SQLite persistence of catalog domains.

use civhub_core::knowledge::{ConceptType, catalog};
use civhub_store::DomainStore;

use crate::common::{Sandbox, initialized_hub};

#[test]
fn save_then_load_round_trips_a_domain() {
    let sandbox = Sandbox::new();
    let knowledge = catalog::create("physics").unwrap();
    {
        let mut store = DomainStore::open(sandbox.db_path()).unwrap();
        assert!(store.save_domain(&knowledge).unwrap());
    }

    let store = DomainStore::open(sandbox.db_path()).unwrap();
    let loaded = store.load_domain("Physics").unwrap().unwrap();
    assert_eq!(loaded.id, knowledge.domain().id().to_string());
    assert_eq!(loaded.concept_count, knowledge.concept_count());
    assert_eq!(loaded.relation_count, knowledge.relations().len());
    assert!(loaded.meta_compliant);

    let duality = loaded.duality.unwrap();
    assert_eq!(duality.name, "physics_duality");
    assert!(duality.balanced);

    let names: Vec<&str> = loaded.concepts.iter().map(|c| c.name.as_str()).collect();
    for concept in knowledge.concepts() {
        assert!(names.contains(&concept.name()), "missing {}", concept.name());
    }
}

#[test]
fn resave_inserts_only_new_concepts() {
    let mut store = DomainStore::open_in_memory().unwrap();
    let mut knowledge = catalog::create("code").unwrap();
    let before = knowledge.concept_count();
    store.save_domain(&knowledge).unwrap();

    knowledge.create_concept("Idempotence", ConceptType::Principle, "Safe to repeat", 90.0);
    assert!(!store.save_domain(&knowledge).unwrap());
    assert!(!store.save_domain(&knowledge).unwrap());

    let loaded = store.load_domain("Code").unwrap().unwrap();
    assert_eq!(loaded.concept_count, before + 1);
    assert_eq!(store.stats().unwrap().total_concepts, before + 1);
}

#[test]
fn whole_hub_is_compliant_once_saved() {
    let hub = initialized_hub();
    let mut store = DomainStore::open_in_memory().unwrap();
    let saved = store.save_all(hub.domains()).unwrap();
    assert_eq!(saved.len(), 5);

    let listings = store.list_domains().unwrap();
    let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Biology", "Code", "Mathematics", "Philosophy", "Physics"]);

    let validation = store.validate_persisted().unwrap();
    assert!(validation.all_compliant);
    assert_eq!(validation.compliant, 5);
    assert!((store.stats().unwrap().compliance_rate - 100.0).abs() < f64::EPSILON);
}
