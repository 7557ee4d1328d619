//! Request/response protocol spoken over the s-expression wire format.
//!
//! A request is a list whose head names a [`Command`]; the [`Dispatcher`]
//! checks the argument shape, then the connection's [`Permission`], then runs
//! the command against the record store. Every failure is reported in-band as
//! `("error" "<code>")` and the connection stays usable.

/// Closed set of wire commands.
pub mod command;
/// Request dispatcher and per-connection context.
pub mod dispatch;
/// Conversions between records and wire values.
pub mod marshal;
/// Ordered connection permission level.
pub mod permission;

pub use command::Command;
pub use dispatch::{Context, Dispatcher};
pub use permission::Permission;

use crate::sexp::{ParseError, Value};
use crate::store::StoreError;
use thiserror::Error;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Wire error codes, rendered as `("error" "<code>")`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request text did not parse.
    Malformed,
    /// Unknown command or wrong argument shape.
    BadRequest,
    /// The connection lacks the permission the command needs.
    BadAuth,
    /// The requested record does not exist.
    NoMatch,
    /// The handler failed unexpectedly.
    Internal,
}

impl ErrorCode {
    /// Canonical wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::BadRequest => "badrequest",
            Self::BadAuth => "badauth",
            Self::NoMatch => "nomatch",
            Self::Internal => "internal",
        }
    }

    /// Parse a wire spelling back into a code.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "malformed" => Some(Self::Malformed),
            "badrequest" => Some(Self::BadRequest),
            "badauth" => Some(Self::BadAuth),
            "nomatch" => Some(Self::NoMatch),
            "internal" => Some(Self::Internal),
            _ => None,
        }
    }
}

/// Failures produced while resolving or executing a request.
///
/// The messages are for logs only; the wire carries just the [`ErrorCode`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Request text failed to parse.
    #[error("malformed request: {0}")]
    Malformed(#[from] ParseError),

    /// Request is not a command list, names an unknown command, or has the
    /// wrong arguments.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Permission check failed.
    #[error("permission denied for '{command}' at level {level:?}")]
    BadAuth {
        /// Command that was refused.
        command: &'static str,
        /// Level the connection held.
        level: Permission,
    },

    /// Requested record is absent.
    #[error("no {kind} with id '{recid}'")]
    NoMatch {
        /// Record kind (`client` or `patient`).
        kind: &'static str,
        /// Requested id.
        recid: String,
    },

    /// Unexpected handler failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Construct a bad-request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// The code reported on the wire.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed(_) => ErrorCode::Malformed,
            Self::BadRequest(_) => ErrorCode::BadRequest,
            Self::BadAuth { .. } => ErrorCode::BadAuth,
            Self::NoMatch { .. } => ErrorCode::NoMatch,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Render as the wire error envelope.
    pub fn to_value(&self) -> Value {
        marshal::error(self.code())
    }
}

impl From<StoreError> for ProtocolError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}
