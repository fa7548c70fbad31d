//! Built-in knowledge domains.
//!
//! Every entry starts from a 50/50 duality, is activated, and is seeded with
//! its core concepts at a fixed certainty plus its branches of study.

use civhub_types::ConceptId;

use super::DomainError;
use super::concept::{Concept, ConceptType, KnowledgeDomain, RelationType};
use super::domain::{Domain, DomainType};

type Table = &'static [(&'static str, &'static str)];

struct Blueprint {
    name: &'static str,
    description: &'static str,
    poles: (&'static str, &'static str),
    core_kind: ConceptType,
    core_certainty: f64,
    core: Table,
    branches: Table,
    extend: fn(&mut KnowledgeDomain),
}

const MATHEMATICS: Blueprint = Blueprint {
    name: "Mathematics",
    description: "The study of numbers, quantities, structures, and patterns",
    poles: ("abstract", "concrete"),
    core_kind: ConceptType::Axiom,
    core_certainty: 100.0,
    core: &[
        ("Identity", "For any value x, x = x (reflexivity)"),
        ("Non-Contradiction", "A statement cannot be both true and false"),
        ("Excluded Middle", "Every statement is either true or false"),
        ("Substitution", "Equal quantities can be substituted for each other"),
        ("Induction", "If P(0) and P(n)→P(n+1), then P(n) for all n"),
        ("Infinity", "There exists an infinite set"),
        ("Choice", "For any collection of non-empty sets, a choice function exists"),
        ("Extensionality", "Sets with the same elements are equal"),
    ],
    branches: &[
        ("Arithmetic", "Study of numbers and basic operations"),
        ("Algebra", "Study of mathematical symbols and rules"),
        ("Geometry", "Study of shapes, sizes, and spatial relationships"),
        ("Calculus", "Study of continuous change"),
        ("Analysis", "Study of limits and related theories"),
        ("Number Theory", "Study of integers and their properties"),
        ("Topology", "Study of properties preserved under deformation"),
        ("Probability", "Study of random phenomena"),
        ("Statistics", "Collection, analysis, and interpretation of data"),
        ("Logic", "Study of valid reasoning"),
        ("Set Theory", "Study of collections of objects"),
        ("Category Theory", "Study of abstract structures and relationships"),
    ],
    extend: extend_mathematics,
};

const PHYSICS: Blueprint = Blueprint {
    name: "Physics",
    description: "The study of matter, energy, and their interactions",
    poles: ("energy", "matter"),
    core_kind: ConceptType::Law,
    core_certainty: 100.0,
    core: &[
        ("Conservation of Energy", "Energy cannot be created or destroyed, only transformed"),
        ("Conservation of Momentum", "Total momentum in an isolated system remains constant"),
        (
            "Conservation of Mass-Energy",
            "Total mass-energy in an isolated system is conserved (E=mc²)",
        ),
        ("Newton's First Law", "An object remains at rest or in uniform motion unless acted upon"),
        ("Newton's Second Law", "Force equals mass times acceleration (F=ma)"),
        ("Newton's Third Law", "Every action has an equal and opposite reaction"),
        ("Thermodynamic First Law", "Energy is conserved in thermodynamic processes"),
        ("Thermodynamic Second Law", "Entropy of an isolated system never decreases"),
        ("Speed of Light Constancy", "The speed of light in vacuum is constant for all observers"),
        ("Uncertainty Principle", "Position and momentum cannot both be precisely known"),
    ],
    branches: &[
        ("Classical Mechanics", "Study of motion of macroscopic objects"),
        ("Thermodynamics", "Study of heat, energy, and work"),
        ("Electromagnetism", "Study of electric and magnetic phenomena"),
        ("Quantum Mechanics", "Study of atomic and subatomic systems"),
        ("Relativity", "Study of space, time, and gravity"),
        ("Optics", "Study of light and its interactions"),
        ("Acoustics", "Study of sound waves"),
        ("Nuclear Physics", "Study of atomic nuclei"),
        ("Particle Physics", "Study of fundamental particles"),
        ("Astrophysics", "Physics of celestial objects"),
        ("Condensed Matter", "Study of solid and liquid phases"),
        ("Plasma Physics", "Study of ionized gases"),
    ],
    extend: extend_physics,
};

const CODE: Blueprint = Blueprint {
    name: "Code",
    description: "The art and science of software development",
    poles: ("abstraction", "implementation"),
    core_kind: ConceptType::Principle,
    core_certainty: 90.0,
    core: &[
        ("DRY", "Don't Repeat Yourself - every piece of knowledge has a single representation"),
        ("KISS", "Keep It Simple, Stupid - simplicity is a key goal in design"),
        ("YAGNI", "You Aren't Gonna Need It - don't add functionality until necessary"),
        ("Separation of Concerns", "Divide a program into distinct sections with minimal overlap"),
        ("Single Responsibility", "A class should have only one reason to change"),
        ("Open/Closed Principle", "Open for extension, closed for modification"),
        ("Liskov Substitution", "Objects should be replaceable by subtypes"),
        ("Interface Segregation", "Many specific interfaces are better than one general interface"),
        ("Dependency Inversion", "Depend on abstractions, not concretions"),
        ("Composition Over Inheritance", "Favor object composition over class inheritance"),
    ],
    branches: &[],
    extend: extend_code,
};

const BIOLOGY: Blueprint = Blueprint {
    name: "Biology",
    description: "The study of living organisms and life processes",
    poles: ("life", "death"),
    core_kind: ConceptType::Principle,
    core_certainty: 95.0,
    core: &[
        (
            "Cell Theory",
            "All living organisms are composed of cells; cells are the basic unit of life",
        ),
        ("Gene Theory", "Traits are inherited through genes; DNA is the hereditary material"),
        (
            "Evolution by Natural Selection",
            "Species evolve through variation, inheritance, selection, and time",
        ),
        ("Homeostasis", "Living systems maintain internal equilibrium despite external changes"),
        ("Energy Flow", "Energy flows through ecosystems from producers to consumers"),
        ("Central Dogma", "Genetic information flows: DNA → RNA → Protein"),
        ("Biogenesis", "Life arises only from existing life"),
        ("Unity and Diversity", "All life shares common ancestry yet exhibits vast diversity"),
    ],
    branches: &[
        ("Molecular Biology", "Study of biological molecules"),
        ("Cell Biology", "Study of cell structure and function"),
        ("Genetics", "Study of heredity and variation"),
        ("Evolutionary Biology", "Study of evolutionary processes"),
        ("Ecology", "Study of organisms and environments"),
        ("Physiology", "Study of organism functions"),
        ("Anatomy", "Study of organism structure"),
        ("Biochemistry", "Chemistry of living systems"),
        ("Microbiology", "Study of microorganisms"),
        ("Botany", "Study of plants"),
        ("Zoology", "Study of animals"),
        ("Neuroscience", "Study of the nervous system"),
        ("Immunology", "Study of immune systems"),
        ("Bioinformatics", "Computational analysis of biological data"),
    ],
    extend: extend_biology,
};

const PHILOSOPHY: Blueprint = Blueprint {
    name: "Philosophy",
    description: "The study of fundamental nature of reality, knowledge, and existence",
    poles: ("being", "non_being"),
    core_kind: ConceptType::Axiom,
    core_certainty: 75.0,
    core: &[
        ("Cogito Ergo Sum", "I think, therefore I am - the foundation of rational certainty"),
        ("Principle of Sufficient Reason", "Everything must have a reason or cause for its existence"),
        ("Law of Identity", "A thing is what it is (A = A)"),
        ("Law of Non-Contradiction", "Nothing can both be and not be at the same time"),
        ("Law of Excluded Middle", "Everything must either be or not be"),
        ("Categorical Imperative", "Act only according to maxims universalizable as law"),
        ("Unity of Opposites", "Reality arises from the tension of opposites"),
        ("The Examined Life", "The unexamined life is not worth living"),
    ],
    branches: &[
        ("Metaphysics", "Study of the nature of reality, existence, and being"),
        ("Epistemology", "Study of knowledge, belief, and justification"),
        ("Ethics", "Study of moral principles and conduct"),
        ("Logic", "Study of valid reasoning and argumentation"),
        ("Aesthetics", "Study of beauty, art, and taste"),
        ("Political Philosophy", "Study of governance, justice, and rights"),
        ("Philosophy of Mind", "Study of consciousness and mental phenomena"),
        ("Philosophy of Science", "Study of foundations and methods of science"),
        ("Philosophy of Language", "Study of meaning, reference, and communication"),
        ("Existentialism", "Study of individual existence and meaning"),
        ("Phenomenology", "Study of structures of experience and consciousness"),
        ("Ontology", "Study of being and what exists"),
    ],
    extend: extend_philosophy,
};

const CATALOG: [&Blueprint; 5] = [&MATHEMATICS, &PHYSICS, &CODE, &BIOLOGY, &PHILOSOPHY];

/// Names of the built-in domains, in initialisation order.
#[must_use]
pub fn names() -> Vec<&'static str> {
    CATALOG.iter().map(|b| b.name).collect()
}

/// Builds a fully seeded domain by case-insensitive name.
pub fn create(name: &str) -> Result<KnowledgeDomain, DomainError> {
    let blueprint = CATALOG
        .iter()
        .find(|b| b.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| DomainError::UnknownCatalogEntry(name.to_string()))?;
    build(blueprint)
}

fn build(blueprint: &Blueprint) -> Result<KnowledgeDomain, DomainError> {
    let mut domain = Domain::new(blueprint.name, DomainType::Fundamental, blueprint.description);
    let duality_name = format!("{}_duality", blueprint.name.to_lowercase());
    domain.set_duality(
        (blueprint.poles.0, 50.0),
        (blueprint.poles.1, 50.0),
        Some(duality_name.as_str()),
    )?;
    domain.activate()?;

    let mut knowledge = KnowledgeDomain::new(domain);
    for (name, description) in blueprint.core {
        knowledge.create_concept(*name, blueprint.core_kind, *description, blueprint.core_certainty);
    }
    for (name, description) in blueprint.branches {
        knowledge.create_concept(*name, ConceptType::Theory, *description, 50.0);
    }
    (blueprint.extend)(&mut knowledge);

    tracing::debug!(
        domain = blueprint.name,
        concepts = knowledge.concept_count(),
        relations = knowledge.relations().len(),
        "Built catalog domain"
    );
    Ok(knowledge)
}

fn link_chain(knowledge: &mut KnowledgeDomain, ids: &[ConceptId], kind: RelationType, strength: f64) {
    for pair in ids.windows(2) {
        knowledge.create_relation(pair[0], pair[1], kind, strength);
    }
}

fn extend_mathematics(knowledge: &mut KnowledgeDomain) {
    const NUMBER_SYSTEMS: [(&str, &str, &str); 7] = [
        ("Natural Numbers", "Positive integers: 1, 2, 3, ...", "ℕ"),
        ("Integers", "Whole numbers: ..., -2, -1, 0, 1, 2, ...", "ℤ"),
        ("Rational Numbers", "Ratios of integers: p/q", "ℚ"),
        ("Real Numbers", "All points on the number line", "ℝ"),
        ("Complex Numbers", "Numbers with real and imaginary parts", "ℂ"),
        ("Quaternions", "Extension of complex numbers", "ℍ"),
        ("Octonions", "Eight-dimensional number system", "𝕆"),
    ];
    const THEOREMS: [(&str, &str, &str); 6] = [
        (
            "Pythagorean Theorem",
            "In a right triangle, a² + b² = c²",
            "Proof by similar triangles or algebraic methods",
        ),
        (
            "Fundamental Theorem of Arithmetic",
            "Every integer > 1 is either prime or a unique product of primes",
            "Proof by strong induction",
        ),
        (
            "Fundamental Theorem of Calculus",
            "Differentiation and integration are inverse operations",
            "Links differential and integral calculus",
        ),
        (
            "Fundamental Theorem of Algebra",
            "Every non-constant polynomial has at least one complex root",
            "Multiple proofs: algebraic, analytic, topological",
        ),
        (
            "Gödel's Incompleteness Theorems",
            "Any consistent formal system has unprovable truths",
            "Self-referential construction",
        ),
        (
            "Cantor's Theorem",
            "The power set of any set has greater cardinality",
            "Diagonal argument",
        ),
    ];

    let systems: Vec<ConceptId> = NUMBER_SYSTEMS
        .iter()
        .map(|(name, description, symbol)| {
            knowledge.add_concept(
                Concept::new(*name, ConceptType::Definition, *description, 50.0, 50.0)
                    .with_metadata("symbol", *symbol),
            )
        })
        .collect();
    // ℕ ⊂ ℤ ⊂ ℚ ⊂ ℝ ⊂ ℂ ⊂ ℍ. Octonions stay unlinked.
    link_chain(knowledge, &systems[..6], RelationType::Specializes, 100.0);

    for (name, statement, sketch) in THEOREMS {
        knowledge.add_concept(
            Concept::new(name, ConceptType::Theorem, statement, 100.0, 0.0)
                .with_metadata("proof_sketch", sketch),
        );
    }
}

fn extend_physics(knowledge: &mut KnowledgeDomain) {
    const FORCES: [(&str, &str, &str); 4] = [
        ("Gravitational Force", "Attractive force between masses", "Graviton (hypothetical)"),
        ("Electromagnetic Force", "Force between charged particles", "Photon"),
        ("Strong Nuclear Force", "Force binding quarks in nucleons", "Gluon"),
        ("Weak Nuclear Force", "Force responsible for radioactive decay", "W and Z Bosons"),
    ];
    for (name, description, mediator) in FORCES {
        knowledge.add_concept(
            Concept::new(name, ConceptType::Principle, description, 50.0, 50.0)
                .with_metadata("mediator", mediator),
        );
    }
}

fn extend_code(knowledge: &mut KnowledgeDomain) {
    const PARADIGMS: Table = &[
        ("Imperative", "Programs as sequences of commands that change state"),
        ("Object-Oriented", "Programs as collections of interacting objects"),
        ("Functional", "Programs as evaluation of mathematical functions"),
        ("Declarative", "Programs express logic without describing control flow"),
        ("Event-Driven", "Programs respond to events and user actions"),
        ("Concurrent", "Programs with multiple simultaneous execution paths"),
        ("Reactive", "Programs built around data streams and propagation"),
        ("Logic", "Programs based on formal logic"),
    ];
    const DATA_STRUCTURES: Table = &[
        ("Array", "Contiguous collection of elements"),
        ("Linked List", "Sequential collection via pointers"),
        ("Stack", "Last-In-First-Out collection"),
        ("Queue", "First-In-First-Out collection"),
        ("Hash Table", "Key-value pairs with hash function"),
        ("Binary Tree", "Hierarchical structure with two children"),
        ("Heap", "Complete binary tree with heap property"),
        ("Graph", "Nodes connected by edges"),
        ("Trie", "Tree for string retrieval"),
        ("B-Tree", "Self-balancing tree for databases"),
    ];
    for (name, description) in PARADIGMS {
        knowledge.create_concept(format!("{name} Programming"), ConceptType::Theory, *description, 50.0);
    }
    for (name, description) in DATA_STRUCTURES {
        knowledge.create_concept(*name, ConceptType::Definition, *description, 50.0);
    }
}

fn extend_biology(knowledge: &mut KnowledgeDomain) {
    const RANKS: [(&str, &str, &str); 8] = [
        ("Domain", "Highest taxonomic rank", "Bacteria, Archaea, Eukarya"),
        ("Kingdom", "Major group of organisms", "Animalia, Plantae, Fungi"),
        ("Phylum", "Body plan grouping", "Chordata, Arthropoda"),
        ("Class", "Subdivision of phylum", "Mammalia, Aves, Reptilia"),
        ("Order", "Subdivision of class", "Primates, Carnivora"),
        ("Family", "Subdivision of order", "Hominidae, Felidae"),
        ("Genus", "Group of related species", "Homo, Felis"),
        ("Species", "Basic unit of classification", "Homo sapiens"),
    ];
    let ranks: Vec<ConceptId> = RANKS
        .iter()
        .map(|(name, description, examples)| {
            knowledge.add_concept(
                Concept::new(*name, ConceptType::Definition, *description, 50.0, 50.0)
                    .with_metadata("examples", *examples),
            )
        })
        .collect();
    link_chain(knowledge, &ranks, RelationType::Specializes, 100.0);
}

fn extend_philosophy(knowledge: &mut KnowledgeDomain) {
    const PAIRS: [(&str, &str); 10] = [
        ("Being", "Non-Being"),
        ("One", "Many"),
        ("Same", "Other"),
        ("Mind", "Body"),
        ("Subject", "Object"),
        ("Freedom", "Determinism"),
        ("Appearance", "Reality"),
        ("Finite", "Infinite"),
        ("Thesis", "Antithesis"),
        ("Good", "Evil"),
    ];
    for (positive, negative) in PAIRS {
        let pos = knowledge.create_concept(
            positive,
            ConceptType::Definition,
            format!("Positive pole in the {positive}/{negative} duality"),
            50.0,
        );
        let neg = knowledge.create_concept(
            negative,
            ConceptType::Definition,
            format!("Negative pole in the {positive}/{negative} duality"),
            50.0,
        );
        knowledge.create_relation(pos, neg, RelationType::Contradicts, 50.0);
    }
}

#[cfg(test)]
mod tests {
    use civhub_types::Balanced;

    use super::*;
    use crate::knowledge::DomainState;

    #[test]
    fn every_entry_builds_balanced_and_active() {
        for name in names() {
            let knowledge = create(name).unwrap();
            assert!(knowledge.validate_balance(), "{name}");
            assert_eq!(knowledge.domain().state(), DomainState::Active);
            let duality = knowledge.domain().duality().unwrap();
            assert_eq!(duality.name(), format!("{}_duality", name.to_lowercase()));
            assert!(duality.is_balanced());
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(create("pHySiCs").unwrap().name(), "Physics");
        assert!(matches!(
            create("alchemy"),
            Err(DomainError::UnknownCatalogEntry(_))
        ));
    }

    #[test]
    fn mathematics_number_chain() {
        let maths = create("mathematics").unwrap();
        assert_eq!(maths.axiom_count(), 8);
        let naturals = maths.concept_by_name("Natural Numbers").unwrap();
        assert_eq!(naturals.metadata().get("symbol").map(String::as_str), Some("ℕ"));
        let specializes = maths
            .relations()
            .iter()
            .filter(|r| r.kind() == RelationType::Specializes)
            .count();
        assert_eq!(specializes, 5);
        let octonions = maths.concept_by_name("Octonions").unwrap();
        assert!(maths.relations_for(octonions.id()).is_empty());
    }

    #[test]
    fn core_certainties() {
        for (name, kind, certainty) in [
            ("Mathematics", ConceptType::Axiom, 100.0),
            ("Physics", ConceptType::Law, 100.0),
            ("Code", ConceptType::Principle, 90.0),
            ("Biology", ConceptType::Principle, 95.0),
            ("Philosophy", ConceptType::Axiom, 75.0),
        ] {
            let knowledge = create(name).unwrap();
            let first = knowledge.concepts_of(kind)[0];
            assert!((first.certainty() - certainty).abs() < 1e-9, "{name}");
        }
    }

    #[test]
    fn philosophy_pairs_contradict() {
        let philosophy = create("Philosophy").unwrap();
        let contradicts: Vec<_> = philosophy
            .relations()
            .iter()
            .filter(|r| r.kind() == RelationType::Contradicts)
            .collect();
        assert_eq!(contradicts.len(), 10);
        assert!(contradicts.iter().all(|r| (r.strength() - 50.0).abs() < 1e-9));
        assert!(philosophy.concept_by_name("non-being").is_some());
    }

    #[test]
    fn code_paradigms_are_suffixed() {
        let code = create("code").unwrap();
        assert!(code.concept_by_name("Functional Programming").is_some());
        assert_eq!(code.axiom_count(), 0);
    }
}
