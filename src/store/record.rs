//! Client and patient records held by the record store.

use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable record identifier (a UUID in text form).
pub type RecordId = String;

fn fresh_recid(recid: impl Into<String>) -> RecordId {
    let recid = recid.into();
    if recid.is_empty() {
        Uuid::new_v4().to_string()
    } else {
        recid
    }
}

/// One way of reaching a client: the contact itself, its category, and a note.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContactInfo {
    /// Phone number, email address, etc.
    pub info: String,
    /// Category such as `phone` or `email`.
    pub category: String,
    /// Free-form note ("Home (preferred)").
    pub note: String,
}

impl ContactInfo {
    /// Build a contact entry.
    pub fn new(
        info: impl Into<String>,
        category: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            info: info.into(),
            category: category.into(),
            note: note.into(),
        }
    }
}

/// An animal owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Record identifier.
    pub recid: RecordId,
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Identifiers of the patients this client owns.
    pub pets: BTreeSet<RecordId>,
    /// Contact entries.
    pub contacts: BTreeSet<ContactInfo>,
    /// Free-form notes.
    pub notes: Vec<String>,
}

impl Client {
    /// Create a client; an empty `recid` is replaced by a fresh UUID.
    pub fn new(
        recid: impl Into<String>,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            recid: fresh_recid(recid),
            name: name.into(),
            address: address.into(),
            pets: BTreeSet::new(),
            contacts: BTreeSet::new(),
            notes: Vec::new(),
        }
    }

    /// Record ownership of a patient.
    pub fn add_pet(&mut self, patient: impl Into<RecordId>) {
        self.pets.insert(patient.into());
    }

    /// Drop ownership of a patient.
    pub fn remove_pet(&mut self, patient: &str) -> bool {
        self.pets.remove(patient)
    }

    /// Add a contact entry; duplicates collapse.
    pub fn add_contact_info(&mut self, info: ContactInfo) {
        self.contacts.insert(info);
    }

    /// Remove a contact entry.
    pub fn remove_contact_info(&mut self, info: &ContactInfo) -> bool {
        self.contacts.remove(info)
    }

    /// Search tags derived from contact info, notes, name and address.
    pub fn tags(&self) -> BTreeSet<String> {
        let inputs = self
            .contacts
            .iter()
            .map(|contact| contact.info.as_str())
            .chain(self.notes.iter().map(String::as_str))
            .chain([self.name.as_str(), self.address.as_str()]);
        tokenize(inputs)
    }
}

/// An animal under care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    /// Record identifier.
    pub recid: RecordId,
    /// Animal's name.
    pub name: String,
    /// Species ("Canine").
    pub species: String,
    /// Breed ("Labrador").
    pub breed: String,
    /// Gender / reproductive status ("Neutered").
    pub gender: String,
    /// Free-form description.
    pub description: String,
    /// Free-form notes.
    pub notes: Vec<String>,
}

impl Patient {
    /// Create a patient with only a name; an empty `recid` gets a fresh UUID.
    pub fn new(recid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            recid: fresh_recid(recid),
            name: name.into(),
            species: String::new(),
            breed: String::new(),
            gender: String::new(),
            description: String::new(),
            notes: Vec::new(),
        }
    }

    /// Search tags derived from every descriptive field and the notes.
    pub fn tags(&self) -> BTreeSet<String> {
        let inputs = [
            self.name.as_str(),
            self.species.as_str(),
            self.breed.as_str(),
            self.gender.as_str(),
            self.description.as_str(),
        ]
        .into_iter()
        .chain(self.notes.iter().map(String::as_str));
        tokenize(inputs)
    }
}

/// Split free text into lower-cased search tags.
///
/// Words are separated by whitespace; a single trailing non-word character
/// (such as `,` or `.`) is stripped from each word.
pub fn tokenize<'a, I>(inputs: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut tags = BTreeSet::new();
    for input in inputs {
        for word in input.split_whitespace() {
            let mut tag = word.to_lowercase();
            if tag
                .chars()
                .last()
                .is_some_and(|ch| !(ch.is_alphanumeric() || ch == '_'))
            {
                tag.pop();
            }
            if !tag.is_empty() {
                tags.insert(tag);
            }
        }
    }
    tags
}
