use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

use super::record::{Client, Patient, RecordId, tokenize};
use super::{RecordStore, Result, SearchEngine};

#[derive(Default)]
struct Tables {
    clients: HashMap<RecordId, Client>,
    patients: HashMap<RecordId, Patient>,
    /// tag -> ids of records carrying it
    tags: HashMap<String, BTreeSet<RecordId>>,
}

impl Tables {
    fn retag(&mut self, recid: &str, tags: BTreeSet<String>) {
        self.tags.retain(|_, ids| {
            ids.remove(recid);
            !ids.is_empty()
        });
        for tag in tags {
            self.tags.entry(tag).or_default().insert(recid.to_string());
        }
    }
}

/// Process-local record store. Cheap to share behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored clients and patients.
    pub fn len(&self) -> usize {
        let tables = self.tables.read();
        tables.clients.len() + tables.patients.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for MemoryStore {
    fn get_client(&self, recid: &str) -> Result<Option<Client>> {
        Ok(self.tables.read().clients.get(recid).cloned())
    }

    fn get_patient(&self, recid: &str) -> Result<Option<Patient>> {
        Ok(self.tables.read().patients.get(recid).cloned())
    }

    fn set_client(&self, client: Client) -> Result<()> {
        let mut tables = self.tables.write();
        tables.retag(&client.recid, client.tags());
        tables.clients.insert(client.recid.clone(), client);
        Ok(())
    }

    fn set_patient(&self, patient: Patient) -> Result<()> {
        let mut tables = self.tables.write();
        tables.retag(&patient.recid, patient.tags());
        tables.patients.insert(patient.recid.clone(), patient);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.tables.write() = Tables::default();
        Ok(())
    }
}

impl SearchEngine for MemoryStore {
    fn search(&self, query: &str) -> Result<Vec<RecordId>> {
        let wanted = tokenize([query]);
        let tables = self.tables.read();

        let mut matched: Option<BTreeSet<RecordId>> = None;
        for tag in &wanted {
            let Some(ids) = tables.tags.get(tag) else {
                return Ok(Vec::new());
            };
            matched = Some(match matched {
                Some(current) => current.intersection(ids).cloned().collect(),
                None => ids.clone(),
            });
        }

        Ok(matched.unwrap_or_default().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContactInfo;

    fn bob() -> Client {
        let mut bob = Client::new(
            "73c3a3fd-9def-4154-9f4a-067069b58d5e",
            "Bobby Tables",
            "4982 New Appledam, Fairsworth",
        );
        bob.add_contact_info(ContactInfo::new("612-555-2315", "phone", "Home"));
        bob
    }

    fn ruff() -> Patient {
        let mut ruff = Patient::new("63c8b75a-ea00-4c07-ac81-5ef75d3db298", "Ruff");
        ruff.species = "Canine".into();
        ruff.breed = "Labrador".into();
        ruff
    }

    #[test]
    fn stores_and_fetches_records() {
        let store = MemoryStore::new();
        let mut bob = bob();
        let ruff = ruff();
        bob.add_pet(ruff.recid.clone());

        store.set_patient(ruff.clone()).unwrap();
        store.set_client(bob.clone()).unwrap();

        assert_eq!(store.get_client(&bob.recid).unwrap(), Some(bob));
        assert_eq!(store.get_patient(&ruff.recid).unwrap(), Some(ruff));
        assert_eq!(store.get_client("missing").unwrap(), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn search_intersects_tags() {
        let store = MemoryStore::new();
        store.set_client(bob()).unwrap();
        store.set_patient(ruff()).unwrap();

        assert_eq!(
            store.search("bobby").unwrap(),
            vec!["73c3a3fd-9def-4154-9f4a-067069b58d5e".to_string()]
        );
        assert_eq!(
            store.search("Canine, labrador").unwrap(),
            vec!["63c8b75a-ea00-4c07-ac81-5ef75d3db298".to_string()]
        );
        assert!(store.search("bobby canine").unwrap().is_empty());
        assert!(store.search("").unwrap().is_empty());
    }

    #[test]
    fn replacing_a_record_drops_stale_tags() {
        let store = MemoryStore::new();
        let mut bob = bob();
        store.set_client(bob.clone()).unwrap();

        bob.name = "Robert Tables".into();
        store.set_client(bob).unwrap();

        assert!(store.search("bobby").unwrap().is_empty());
        assert_eq!(store.search("robert").unwrap().len(), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let store = MemoryStore::new();
        store.set_client(bob()).unwrap();
        store.clear().unwrap();
        assert!(store.is_empty());
        assert!(store.search("bobby").unwrap().is_empty());
    }
}
