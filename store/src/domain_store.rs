//! SQLite-backed storage for knowledge domains.
//!
//! A domain is keyed by its name. Saving a domain that already exists updates
//! its description, state and duality, and appends concepts (matched by name)
//! and relations the store has not seen; nothing already stored is removed.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use serde::Serialize;

use civhub_core::knowledge::{DomainState, KnowledgeDomain};
use civhub_types::{ConceptId, verify_meta};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDuality {
    pub name: String,
    pub positive_name: String,
    pub positive_value: f64,
    pub negative_name: String,
    pub negative_value: f64,
    pub balanced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredConcept {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub certainty: f64,
    pub uncertainty: f64,
    pub balanced: bool,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDomain {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub state: String,
    pub is_active: bool,
    pub meta_compliant: bool,
    pub duality: Option<StoredDuality>,
    pub concepts: Vec<StoredConcept>,
    pub concept_count: usize,
    pub relation_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// One row of [`DomainStore::list_domains`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainListing {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub concept_count: usize,
    pub meta_compliant: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_domains: usize,
    pub total_concepts: usize,
    pub meta_compliant_domains: usize,
    pub compliance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedStatus {
    pub name: String,
    pub has_duality: bool,
    pub meta_compliant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedValidation {
    pub total_domains: usize,
    pub compliant: usize,
    pub non_compliant: usize,
    pub all_compliant: bool,
    pub domains: Vec<PersistedStatus>,
}

/// Balanced iff a duality exists and holds 50/50.
fn compliant(positive: Option<f64>, negative: Option<f64>) -> bool {
    match (positive, negative) {
        (Some(positive), Some(negative)) => verify_meta(positive, negative),
        _ => false,
    }
}

pub struct DomainStore {
    db: Connection,
}

impl DomainStore {
    const SCHEMA: &'static str = r"
        CREATE TABLE IF NOT EXISTS domains (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE,
            domain_type TEXT NOT NULL,
            description TEXT NOT NULL,
            state TEXT NOT NULL,
            is_active INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dualities (
            id INTEGER PRIMARY KEY,
            domain_id INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL,
            positive_name TEXT NOT NULL,
            positive_value REAL NOT NULL,
            negative_name TEXT NOT NULL,
            negative_value REAL NOT NULL,
            FOREIGN KEY (domain_id) REFERENCES domains(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS concepts (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL,
            domain_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            concept_type TEXT NOT NULL,
            description TEXT NOT NULL,
            certainty REAL NOT NULL,
            uncertainty REAL NOT NULL,
            metadata_json TEXT,
            UNIQUE (domain_id, uuid),
            FOREIGN KEY (domain_id) REFERENCES domains(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS concept_relations (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            source_concept_id INTEGER NOT NULL,
            target_concept_id INTEGER NOT NULL,
            relation_type TEXT NOT NULL,
            strength REAL NOT NULL,
            bidirectional INTEGER NOT NULL,
            FOREIGN KEY (source_concept_id) REFERENCES concepts(id) ON DELETE CASCADE,
            FOREIGN KEY (target_concept_id) REFERENCES concepts(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_concepts_domain
        ON concepts(domain_id);

        CREATE INDEX IF NOT EXISTS idx_relations_source
        ON concept_relations(source_concept_id);
    ";

    /// Open or create the store at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory {}", parent.display())
            })?;
        }
        let db = Connection::open(path)
            .with_context(|| format!("Failed to open domain store at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Opened domain store");
        Self::initialize(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory domain store")?;
        Self::initialize(db)
    }

    fn initialize(db: Connection) -> Result<Self> {
        db.execute_batch("PRAGMA foreign_keys=ON;")
            .context("Failed to set domain store pragmas")?;
        db.execute_batch(Self::SCHEMA)
            .context("Failed to create domain store schema")?;
        Ok(Self { db })
    }

    /// Insert or update `knowledge` by name. Returns `true` when the domain
    /// was newly inserted.
    pub fn save_domain(&mut self, knowledge: &KnowledgeDomain) -> Result<bool> {
        let tx = self
            .db
            .transaction()
            .context("Failed to start domain store transaction")?;
        let inserted = Self::upsert(&tx, knowledge)?;
        tx.commit().context("Failed to commit domain save")?;
        tracing::info!(domain = knowledge.name(), inserted, "Saved domain");
        Ok(inserted)
    }

    /// Saves every domain in one transaction and returns their names.
    pub fn save_all<'a>(
        &mut self,
        domains: impl IntoIterator<Item = &'a KnowledgeDomain>,
    ) -> Result<Vec<String>> {
        let tx = self
            .db
            .transaction()
            .context("Failed to start domain store transaction")?;
        let mut saved = Vec::new();
        for knowledge in domains {
            Self::upsert(&tx, knowledge)?;
            saved.push(knowledge.name().to_string());
        }
        tx.commit().context("Failed to commit domain batch")?;
        tracing::info!(count = saved.len(), "Saved domains");
        Ok(saved)
    }

    fn upsert(tx: &Transaction<'_>, knowledge: &KnowledgeDomain) -> Result<bool> {
        let domain = knowledge.domain();
        let now = Utc::now().to_rfc3339();
        let state = domain.state();
        let is_active = state == DomainState::Active;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM domains WHERE name = ?1",
                [domain.name()],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up domain")?;

        let domain_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE domains SET description = ?1, state = ?2, is_active = ?3, updated_at = ?4
                     WHERE id = ?5",
                    params![domain.description(), state.as_str(), is_active, &now, id],
                )
                .with_context(|| format!("Failed to update domain {}", domain.name()))?;
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO domains
                     (uuid, name, domain_type, description, state, is_active, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
                    params![
                        domain.id().to_string(),
                        domain.name(),
                        domain.kind().as_str(),
                        domain.description(),
                        state.as_str(),
                        is_active,
                        &now
                    ],
                )
                .with_context(|| format!("Failed to insert domain {}", domain.name()))?;
                tx.last_insert_rowid()
            }
        };

        if let Some(duality) = domain.duality() {
            tx.execute(
                "INSERT INTO dualities
                 (domain_id, name, positive_name, positive_value, negative_name, negative_value)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(domain_id) DO UPDATE SET
                    positive_value = excluded.positive_value,
                    negative_value = excluded.negative_value",
                params![
                    domain_id,
                    duality.name(),
                    duality.positive().name(),
                    duality.positive().value(),
                    duality.negative().name(),
                    duality.negative().value()
                ],
            )
            .context("Failed to save duality")?;
        }

        // Ids are minted per process, so stored concepts are matched by name.
        let mut concept_rows: HashMap<ConceptId, i64> = HashMap::new();
        for concept in knowledge.concepts() {
            let stored: Option<i64> = tx
                .query_row(
                    "SELECT id FROM concepts WHERE domain_id = ?1 AND name = ?2 COLLATE NOCASE",
                    params![domain_id, concept.name()],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("Failed to look up concept {}", concept.name()))?;
            if let Some(id) = stored {
                concept_rows.insert(concept.id(), id);
                continue;
            }

            let metadata = if concept.metadata().is_empty() {
                None
            } else {
                let json = serde_json::to_string(concept.metadata())
                    .context("Failed to encode concept metadata")?;
                Some(json)
            };
            tx.execute(
                "INSERT INTO concepts
                 (uuid, domain_id, name, concept_type, description, certainty, uncertainty, metadata_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    concept.id().to_string(),
                    domain_id,
                    concept.name(),
                    concept.kind().as_str(),
                    concept.description(),
                    concept.certainty(),
                    concept.uncertainty(),
                    metadata
                ],
            )
            .with_context(|| format!("Failed to insert concept {}", concept.name()))?;
            concept_rows.insert(concept.id(), tx.last_insert_rowid());
        }

        for relation in knowledge.relations() {
            let source = concept_rows.get(&relation.source());
            let target = concept_rows.get(&relation.target());
            let (Some(source), Some(target)) = (source, target) else {
                tracing::warn!(relation = %relation.id(), "Skipping relation with unknown concept");
                continue;
            };
            let known: Option<i64> = tx
                .query_row(
                    "SELECT id FROM concept_relations
                     WHERE source_concept_id = ?1 AND target_concept_id = ?2 AND relation_type = ?3",
                    params![source, target, relation.kind().as_str()],
                    |row| row.get(0),
                )
                .optional()
                .context("Failed to look up concept relation")?;
            if known.is_some() {
                continue;
            }
            tx.execute(
                "INSERT OR IGNORE INTO concept_relations
                 (uuid, source_concept_id, target_concept_id, relation_type, strength, bidirectional)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    relation.id().to_string(),
                    source,
                    target,
                    relation.kind().as_str(),
                    relation.strength(),
                    relation.is_bidirectional()
                ],
            )
            .context("Failed to insert concept relation")?;
        }

        Ok(existing.is_none())
    }

    pub fn load_domain(&self, name: &str) -> Result<Option<StoredDomain>> {
        let row = self
            .db
            .query_row(
                "SELECT d.id, d.uuid, d.name, d.domain_type, d.description, d.state, d.is_active,
                        d.created_at, d.updated_at,
                        u.name, u.positive_name, u.positive_value, u.negative_name, u.negative_value
                 FROM domains d
                 LEFT JOIN dualities u ON u.domain_id = d.id
                 WHERE d.name = ?1",
                [name],
                |row| {
                    let duality = match row.get::<_, Option<String>>(9)? {
                        Some(duality_name) => {
                            let positive_value: f64 = row.get(11)?;
                            let negative_value: f64 = row.get(13)?;
                            Some(StoredDuality {
                                name: duality_name,
                                positive_name: row.get(10)?,
                                positive_value,
                                negative_name: row.get(12)?,
                                negative_value,
                                balanced: verify_meta(positive_value, negative_value),
                            })
                        }
                        None => None,
                    };
                    Ok((
                        row.get::<_, i64>(0)?,
                        StoredDomain {
                            id: row.get(1)?,
                            name: row.get(2)?,
                            kind: row.get(3)?,
                            description: row.get(4)?,
                            state: row.get(5)?,
                            is_active: row.get(6)?,
                            meta_compliant: duality.as_ref().is_some_and(|d| d.balanced),
                            duality,
                            concepts: Vec::new(),
                            concept_count: 0,
                            relation_count: 0,
                            created_at: row.get(7)?,
                            updated_at: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()
            .with_context(|| format!("Failed to load domain {name}"))?;

        let Some((domain_id, mut stored)) = row else {
            return Ok(None);
        };
        stored.concepts = self.concepts_for(domain_id)?;
        stored.concept_count = stored.concepts.len();
        stored.relation_count = self
            .db
            .query_row(
                "SELECT COUNT(*) FROM concept_relations r
                 JOIN concepts c ON c.id = r.source_concept_id
                 WHERE c.domain_id = ?1",
                [domain_id],
                |row| row.get::<_, i64>(0),
            )
            .context("Failed to count relations")? as usize;
        Ok(Some(stored))
    }

    fn concepts_for(&self, domain_id: i64) -> Result<Vec<StoredConcept>> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT uuid, name, concept_type, description, certainty, uncertainty, metadata_json
                 FROM concepts WHERE domain_id = ?1 ORDER BY id ASC",
            )
            .context("Failed to prepare concept query")?;
        let rows = stmt
            .query_map([domain_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })
            .context("Failed to query concepts")?;

        let mut concepts = Vec::new();
        for row in rows {
            let (id, name, kind, description, certainty, uncertainty, metadata) =
                row.context("Failed to read concept row")?;
            let metadata = match metadata {
                Some(json) => serde_json::from_str(&json)
                    .with_context(|| format!("Corrupt metadata for concept {name}"))?,
                None => BTreeMap::new(),
            };
            concepts.push(StoredConcept {
                id,
                name,
                kind,
                description,
                certainty,
                uncertainty,
                balanced: (certainty - 50.0).abs() < 0.01,
                metadata,
            });
        }
        Ok(concepts)
    }

    pub fn list_domains(&self) -> Result<Vec<DomainListing>> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT d.uuid, d.name, d.domain_type, d.is_active,
                        (SELECT COUNT(*) FROM concepts c WHERE c.domain_id = d.id),
                        u.positive_value, u.negative_value
                 FROM domains d
                 LEFT JOIN dualities u ON u.domain_id = d.id
                 ORDER BY d.name ASC",
            )
            .context("Failed to prepare list_domains query")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DomainListing {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                    is_active: row.get(3)?,
                    concept_count: row.get::<_, i64>(4)? as usize,
                    meta_compliant: compliant(row.get(5)?, row.get(6)?),
                })
            })
            .context("Failed to query domains")?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row.context("Failed to read domain row")?);
        }
        Ok(listings)
    }

    /// Returns whether a domain by that name existed.
    pub fn delete_domain(&mut self, name: &str) -> Result<bool> {
        let deleted = self
            .db
            .execute("DELETE FROM domains WHERE name = ?1", [name])
            .with_context(|| format!("Failed to delete domain {name}"))?;
        if deleted > 0 {
            tracing::info!(domain = name, "Deleted domain");
        }
        Ok(deleted > 0)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let listings = self.list_domains()?;
        let total_concepts: i64 = self
            .db
            .query_row("SELECT COUNT(*) FROM concepts", [], |row| row.get(0))
            .context("Failed to count concepts")?;
        let compliant = listings.iter().filter(|l| l.meta_compliant).count();
        Ok(StoreStats {
            total_domains: listings.len(),
            total_concepts: total_concepts as usize,
            meta_compliant_domains: compliant,
            compliance_rate: if listings.is_empty() {
                100.0
            } else {
                compliant as f64 / listings.len() as f64 * 100.0
            },
        })
    }

    pub fn validate_persisted(&self) -> Result<PersistedValidation> {
        let mut stmt = self
            .db
            .prepare(
                "SELECT d.name, u.positive_value, u.negative_value
                 FROM domains d
                 LEFT JOIN dualities u ON u.domain_id = d.id
                 ORDER BY d.name ASC",
            )
            .context("Failed to prepare validation query")?;
        let rows = stmt
            .query_map([], |row| {
                let positive: Option<f64> = row.get(1)?;
                let negative: Option<f64> = row.get(2)?;
                Ok(PersistedStatus {
                    name: row.get(0)?,
                    has_duality: positive.is_some(),
                    meta_compliant: compliant(positive, negative),
                })
            })
            .context("Failed to query domains for validation")?;

        let mut domains = Vec::new();
        for row in rows {
            domains.push(row.context("Failed to read validation row")?);
        }
        let compliant = domains.iter().filter(|d| d.meta_compliant).count();
        for status in domains.iter().filter(|d| !d.meta_compliant) {
            tracing::warn!(domain = %status.name, "Persisted domain is not META compliant");
        }
        Ok(PersistedValidation {
            total_domains: domains.len(),
            compliant,
            non_compliant: domains.len() - compliant,
            all_compliant: compliant == domains.len(),
            domains,
        })
    }
}

#[cfg(test)]
mod tests {
    use civhub_core::knowledge::{ConceptType, Domain, DomainType, catalog};

    use super::*;

    fn balanced_domain(name: &str) -> KnowledgeDomain {
        let mut domain = Domain::new(name, DomainType::Derived, "test domain");
        domain.set_duality(("order", 50.0), ("chaos", 50.0), None).unwrap();
        domain.activate().unwrap();
        KnowledgeDomain::new(domain)
    }

    #[test]
    fn save_and_load_catalog_domain() {
        let mut store = DomainStore::open_in_memory().unwrap();
        let physics = catalog::create("physics").unwrap();
        assert!(store.save_domain(&physics).unwrap());

        let loaded = store.load_domain("Physics").unwrap().unwrap();
        assert_eq!(loaded.concept_count, physics.concept_count());
        assert_eq!(loaded.relation_count, physics.relations().len());
        assert!(loaded.meta_compliant);
        assert!(loaded.is_active);
        let duality = loaded.duality.unwrap();
        assert_eq!(duality.name, "physics_duality");
        assert!(duality.balanced);
        assert!(loaded.concepts.iter().any(|c| c.metadata.contains_key("mediator")));
    }

    #[test]
    fn missing_domain_is_none() {
        let store = DomainStore::open_in_memory().unwrap();
        assert!(store.load_domain("nowhere").unwrap().is_none());
    }

    #[test]
    fn resave_updates_and_appends() {
        let mut store = DomainStore::open_in_memory().unwrap();
        let mut knowledge = balanced_domain("Craft");
        knowledge.create_concept("First", ConceptType::Axiom, "", 50.0);
        assert!(store.save_domain(&knowledge).unwrap());

        knowledge.create_concept("Second", ConceptType::Model, "", 50.0);
        knowledge.domain_mut().stabilize().unwrap();
        assert!(!store.save_domain(&knowledge).unwrap());

        let loaded = store.load_domain("craft").unwrap().unwrap();
        assert_eq!(loaded.name, "Craft");
        assert_eq!(loaded.concept_count, 2);
        assert_eq!(loaded.state, "stable");
        assert!(!loaded.is_active);
        assert_eq!(store.list_domains().unwrap().len(), 1);
    }

    #[test]
    fn rebuilt_domain_matches_stored_concepts_by_name() {
        let mut store = DomainStore::open_in_memory().unwrap();
        let first = catalog::create("mathematics").unwrap();
        store.save_domain(&first).unwrap();
        let saved = store.load_domain("Mathematics").unwrap().unwrap();

        let mut rebuilt = catalog::create("mathematics").unwrap();
        rebuilt.create_concept("set theory", ConceptType::Theory, "", 50.0);
        rebuilt.create_concept("Topos Theory", ConceptType::Theory, "", 50.0);
        assert!(!store.save_domain(&rebuilt).unwrap());

        let loaded = store.load_domain("Mathematics").unwrap().unwrap();
        assert_eq!(loaded.concept_count, first.concept_count() + 1);
        assert_eq!(loaded.relation_count, saved.relation_count);
        assert_eq!(loaded.concepts[0].id, saved.concepts[0].id);
    }

    #[test]
    fn stats_and_validation() {
        let mut store = DomainStore::open_in_memory().unwrap();
        let empty = store.stats().unwrap();
        assert_eq!(empty.total_domains, 0);
        assert!((empty.compliance_rate - 100.0).abs() < f64::EPSILON);

        let bare = KnowledgeDomain::new(Domain::new("Bare", DomainType::Emergent, ""));
        let saved = store.save_all([&balanced_domain("Alpha"), &bare]).unwrap();
        assert_eq!(saved, ["Alpha", "Bare"]);

        let stats = store.stats().unwrap();
        assert_eq!(stats.total_domains, 2);
        assert_eq!(stats.meta_compliant_domains, 1);
        assert!((stats.compliance_rate - 50.0).abs() < f64::EPSILON);

        let validation = store.validate_persisted().unwrap();
        assert!(!validation.all_compliant);
        assert_eq!(validation.non_compliant, 1);
        assert!(!validation.domains[1].has_duality);
    }

    #[test]
    fn delete_cascades() {
        let mut store = DomainStore::open_in_memory().unwrap();
        store.save_domain(&catalog::create("biology").unwrap()).unwrap();
        assert!(store.delete_domain("biology").unwrap());
        assert!(!store.delete_domain("Biology").unwrap());
        assert_eq!(store.stats().unwrap().total_concepts, 0);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hub.db");
        {
            let mut store = DomainStore::open(&path).unwrap();
            store.save_domain(&catalog::create("code").unwrap()).unwrap();
        }
        let reopened = DomainStore::open(&path).unwrap();
        assert_eq!(reopened.list_domains().unwrap()[0].name, "Code");
    }
}
