//! Server configuration and its on-disk JSON form.
//!
//! Configuration is plain JSON; missing fields take their defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::auth::{CredentialTable, UserEntry};

/// Default TCP listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:6060";

/// Largest request line accepted by default (1 MiB).
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Configuration for the Vetclix server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the TCP listener binds to
    pub listen: String,

    /// Requests longer than this many bytes are rejected as malformed
    pub max_message_len: usize,

    /// Enable potentially destructive commands such as `clear`
    pub testing: bool,

    /// Accounts accepted by `auth`
    pub users: Vec<UserEntry>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            testing: false,
            users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Build the credential table for the configured accounts.
    pub fn credentials(&self) -> CredentialTable {
        CredentialTable::new(self.users.iter().cloned())
    }
}

/// Load configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    let data = fs::read(path).with_context(|| format!("Failed to read config: {:?}", path))?;
    let config: ServerConfig =
        serde_json::from_slice(&data).context("Failed to deserialize config")?;
    Ok(config)
}

/// Write configuration as pretty-printed JSON.
///
/// The JSON goes to a sibling `.tmp` file first and replaces `path` only once
/// it is fully on disk, so readers see either the old file or the new one.
pub fn write_config(path: &Path, config: &ServerConfig) -> Result<()> {
    let staged = path.with_extension("tmp");
    let file = File::create(&staged)
        .with_context(|| format!("Failed to create {:?}", staged))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, config).context("Failed to serialize config")?;
    out.write_all(b"\n")?;
    let file = out
        .into_inner()
        .map_err(|err| err.into_error())
        .with_context(|| format!("Failed to flush {:?}", staged))?;
    file.sync_all().context("Failed to sync config")?;

    fs::rename(&staged, path)
        .with_context(|| format!("Failed to replace {:?}", path))?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        File::open(dir)
            .and_then(|dir| dir.sync_all())
            .with_context(|| format!("Failed to sync directory {:?}", dir))?;
    }
    Ok(())
}
