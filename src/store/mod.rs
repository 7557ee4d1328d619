//! Record store and search collaborators consumed by the dispatcher.
//!
//! The protocol layer only talks to the [`RecordStore`] and [`SearchEngine`]
//! traits. [`MemoryStore`] is a small in-process implementation of both,
//! backed by hash maps and a tag index; it is what the `vetclixd` daemon and
//! the test-suite run against.

/// In-memory record store with a tag index.
pub mod memory;
/// Client and patient record types.
pub mod record;

pub use memory::MemoryStore;
pub use record::{Client, ContactInfo, Patient, RecordId, tokenize};

use thiserror::Error;

/// Convenience result alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures reported by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Access to client and patient records.
pub trait RecordStore: Send + Sync {
    /// Fetch a client by id.
    fn get_client(&self, recid: &str) -> Result<Option<Client>>;

    /// Fetch a patient by id.
    fn get_patient(&self, recid: &str) -> Result<Option<Patient>>;

    /// Insert or replace a client.
    fn set_client(&self, client: Client) -> Result<()>;

    /// Insert or replace a patient.
    fn set_patient(&self, patient: Patient) -> Result<()>;

    /// Remove every record.
    fn clear(&self) -> Result<()>;
}

/// Tag-based search over stored records.
pub trait SearchEngine: Send + Sync {
    /// Return the ids of records carrying every tag in `query`.
    fn search(&self, query: &str) -> Result<Vec<RecordId>>;
}
