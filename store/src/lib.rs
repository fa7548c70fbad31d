//! SQLite persistence for Civilisation Hub knowledge domains.

mod domain_store;

pub use domain_store::{
    DomainListing, DomainStore, PersistedStatus, PersistedValidation, StoreStats, StoredConcept,
    StoredDomain, StoredDuality,
};
