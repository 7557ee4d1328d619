use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sexp::Value;

/// Record access granted to a connection.
///
/// Levels are ordered `None < Read < Write`; a higher level implies every
/// right of the lower ones. A connection starts at `None` and only the `auth`
/// command changes its level, always by full replacement.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// No record access.
    #[default]
    None,
    /// May read records and search.
    Read,
    /// May read and write records.
    Write,
}

impl Permission {
    /// Whether records may be read.
    pub fn can_read(self) -> bool {
        self >= Self::Read
    }

    /// Whether records may be written.
    pub fn can_write(self) -> bool {
        self >= Self::Write
    }

    /// Replace the level outright.
    pub fn set(&mut self, level: Permission) {
        *self = level;
    }

    /// Numeric level used on the wire (`0`, `1`, `2`).
    pub fn level(self) -> i64 {
        match self {
            Self::None => 0,
            Self::Read => 1,
            Self::Write => 2,
        }
    }

    /// Inverse of [`Permission::level`].
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::None),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            _ => None,
        }
    }

    /// Serialized form returned by `auth`: a one-element list holding the level.
    pub fn to_value(self) -> Value {
        Value::List(vec![Value::Integer(self.level())])
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Returned when parsing an unknown permission name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission level '{0}' (expected none, read or write)")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(UnknownPermission(value.to_string())),
        }
    }
}
