//! Credential lookup backing the `auth` command.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::protocol::Permission;

/// Resolves a user/password pair to the permission it grants.
pub trait CredentialStore: Send + Sync {
    /// Return the granted level, or `None` if the credentials are not valid.
    fn lookup(&self, user: &str, password: &str) -> Option<Permission>;
}

/// Hash a password the way [`UserEntry::password_hash`] stores it (blake3, hex).
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// One configured account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Login name.
    pub user: String,
    /// Hex-encoded blake3 digest of the password.
    pub password_hash: String,
    /// Level granted on successful login.
    pub permission: Permission,
}

impl UserEntry {
    /// Build an entry from a plaintext password.
    pub fn with_password(user: impl Into<String>, password: &str, permission: Permission) -> Self {
        Self {
            user: user.into(),
            password_hash: hash_password(password),
            permission,
        }
    }
}

/// Fixed table of accounts, usually loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct CredentialTable {
    users: HashMap<String, UserEntry>,
}

impl CredentialTable {
    /// Build a table; later entries for the same user replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = UserEntry>) -> Self {
        let users = entries
            .into_iter()
            .map(|entry| (entry.user.clone(), entry))
            .collect();
        Self { users }
    }

    /// Number of configured accounts.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no accounts are configured.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialStore for CredentialTable {
    fn lookup(&self, user: &str, password: &str) -> Option<Permission> {
        let entry = self.users.get(user)?;
        let stored = blake3::Hash::from_hex(entry.password_hash.as_bytes()).ok()?;
        // blake3::Hash equality is constant-time.
        (stored == blake3::hash(password.as_bytes())).then_some(entry.permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_checks_user_and_password() {
        let table = CredentialTable::new([
            UserEntry::with_password("bob", "right", Permission::Write),
            UserEntry::with_password("eve", "peek", Permission::Read),
        ]);
        assert_eq!(table.lookup("bob", "right"), Some(Permission::Write));
        assert_eq!(table.lookup("eve", "peek"), Some(Permission::Read));
        assert_eq!(table.lookup("bob", "wrong"), None);
        assert_eq!(table.lookup("mallory", "right"), None);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn corrupt_hash_never_matches() {
        let table = CredentialTable::new([UserEntry {
            user: "bob".into(),
            password_hash: "not-hex".into(),
            permission: Permission::Write,
        }]);
        assert_eq!(table.lookup("bob", ""), None);
    }

    #[test]
    fn hash_is_hex_encoded_blake3() {
        let hash = hash_password("right");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_ne!(hash, hash_password("wrong"));
    }
}
