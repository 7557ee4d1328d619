use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::marshal::{self, CLIENT_TAG, PATIENT_TAG};
use super::{Command, DISPATCH_TARGET, ErrorCode, Permission, ProtocolError};
use crate::PROTOCOL_VERSION;
use crate::auth::CredentialStore;
use crate::sexp::{self, Value};
use crate::store::{RecordStore, SearchEngine};

/// Per-connection state. Owned by the connection loop, one per connection.
#[derive(Debug, Clone, Default)]
pub struct Context {
    permission: Permission,
}

impl Context {
    /// Fresh context at [`Permission::None`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current permission level.
    pub fn permission(&self) -> Permission {
        self.permission
    }
}

/// Successful handler result: the reply plus an optional permission
/// replacement for the connection.
struct Reply {
    value: Value,
    permission: Option<Permission>,
}

impl Reply {
    fn value(value: Value) -> Self {
        Self {
            value,
            permission: None,
        }
    }
}

type HandlerResult = Result<Reply, ProtocolError>;

/// Resolves one request to one response against the configured collaborators.
///
/// The dispatcher holds no per-connection state and is shared between
/// connections behind an `Arc`.
pub struct Dispatcher {
    records: Arc<dyn RecordStore>,
    search: Arc<dyn SearchEngine>,
    credentials: Arc<dyn CredentialStore>,
    testing: bool,
}

impl Dispatcher {
    /// Create a dispatcher over the given collaborators.
    pub fn new(
        records: Arc<dyn RecordStore>,
        search: Arc<dyn SearchEngine>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            records,
            search,
            credentials,
            testing: false,
        }
    }

    /// Enable or disable testing mode, which unlocks `clear`.
    pub fn with_testing(mut self, testing: bool) -> Self {
        self.testing = testing;
        self
    }

    /// Whether testing mode is enabled.
    pub fn is_testing(&self) -> bool {
        self.testing
    }

    /// Parse `text`, dispatch it, and render the response.
    ///
    /// Text that fails to parse is answered with `("error" "malformed")`.
    pub fn handle_text(&self, context: &mut Context, text: &str) -> String {
        let response = match sexp::parse(text) {
            Ok(request) => self.dispatch(context, &request),
            Err(err) => {
                let err = ProtocolError::from(err);
                debug!(target: DISPATCH_TARGET, error = %err, "rejecting request");
                err.to_value()
            }
        };
        sexp::dump(&response)
    }

    /// Resolve one parsed request.
    ///
    /// Shape is checked before permission, so a malformed request is reported
    /// as `badrequest` even on an unauthenticated connection and does not
    /// reveal whether the command exists. Handler failures, panics included,
    /// are reported as `internal`.
    pub fn dispatch(&self, context: &mut Context, request: &Value) -> Value {
        let (command, args) = match self.resolve(context.permission(), request) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!(target: DISPATCH_TARGET, code = err.code().as_str(), error = %err, "rejecting request");
                return err.to_value();
            }
        };

        debug!(target: DISPATCH_TARGET, command = command.name(), "dispatching");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.invoke(command, args)));
        match outcome {
            Ok(Ok(reply)) => {
                if let Some(level) = reply.permission {
                    context.permission.set(level);
                }
                reply.value
            }
            Ok(Err(err)) => {
                if err.code() == ErrorCode::Internal {
                    error!(target: DISPATCH_TARGET, command = command.name(), error = %err, "handler failed");
                } else {
                    debug!(target: DISPATCH_TARGET, command = command.name(), code = err.code().as_str(), error = %err, "command refused");
                }
                err.to_value()
            }
            Err(_) => {
                error!(target: DISPATCH_TARGET, command = command.name(), "handler panicked");
                marshal::error(ErrorCode::Internal)
            }
        }
    }

    fn resolve<'a>(
        &self,
        permission: Permission,
        request: &'a Value,
    ) -> Result<(Command, &'a [Value]), ProtocolError> {
        let Some((head, args)) = request.as_list().and_then(<[Value]>::split_first) else {
            return Err(ProtocolError::bad_request("request must be a non-empty list"));
        };
        let name = head
            .as_str()
            .ok_or_else(|| ProtocolError::bad_request("command name must be a string"))?;
        let command = Command::from_name(name)
            .ok_or_else(|| ProtocolError::bad_request(format!("unknown command '{name}'")))?;

        if !command.accepts(args) {
            return Err(ProtocolError::bad_request(format!(
                "wrong arguments for '{name}'"
            )));
        }
        if !command.permits(permission) {
            return Err(ProtocolError::BadAuth {
                command: command.name(),
                level: permission,
            });
        }
        Ok((command, args))
    }

    fn invoke(&self, command: Command, args: &[Value]) -> HandlerResult {
        match (command, args) {
            (Command::Version, []) => Ok(Reply::value(Value::Integer(PROTOCOL_VERSION))),
            (Command::Auth, [user, password]) => Ok(self.auth(user, password)),
            (Command::Get, [kind, recid]) => self.get(kind, recid),
            (Command::Set, [record]) => self.set(record),
            (Command::SetClient, [record]) => self.set_client(record),
            (Command::SetPatient, [record]) => self.set_patient(record, &[]),
            (Command::SetPatient, [record, owners]) => {
                self.set_patient(record, owners.as_list().unwrap_or_default())
            }
            (Command::Search, [query]) => self.search(query),
            (Command::Clear, []) => self.clear(),
            // Shapes were verified in `resolve`.
            (command, _) => Err(ProtocolError::Internal(format!(
                "argument shape for '{}' changed after validation",
                command.name()
            ))),
        }
    }

    fn auth(&self, user: &Value, password: &Value) -> Reply {
        let user = user.as_str().unwrap_or_default();
        let password = password.as_str().unwrap_or_default();
        let level = match self.credentials.lookup(user, password) {
            Some(level) => {
                info!(target: DISPATCH_TARGET, user, level = ?level, "authenticated");
                level
            }
            None => {
                info!(target: DISPATCH_TARGET, user, "authentication failed");
                Permission::None
            }
        };
        Reply {
            value: level.to_value(),
            permission: Some(level),
        }
    }

    fn get(&self, kind: &Value, recid: &Value) -> HandlerResult {
        let recid = recid.as_str().unwrap_or_default();
        let value = match kind.as_str() {
            Some(CLIENT_TAG) => self
                .records
                .get_client(recid)?
                .map(|client| marshal::client(&client))
                .ok_or_else(|| no_match(CLIENT_TAG, recid))?,
            Some(PATIENT_TAG) => self
                .records
                .get_patient(recid)?
                .map(|patient| marshal::patient(&patient))
                .ok_or_else(|| no_match(PATIENT_TAG, recid))?,
            other => {
                return Err(ProtocolError::bad_request(format!(
                    "unknown record type {other:?}"
                )));
            }
        };
        Ok(Reply::value(value))
    }

    fn set(&self, record: &Value) -> HandlerResult {
        match marshal::record_kind(record) {
            Some(CLIENT_TAG) => self.set_client(record),
            Some(PATIENT_TAG) => self.set_patient(record, &[]),
            other => Err(ProtocolError::bad_request(format!(
                "unknown record type {other:?}"
            ))),
        }
    }

    fn set_client(&self, record: &Value) -> HandlerResult {
        let client = marshal::parse_client(record)?;
        info!(target: DISPATCH_TARGET, recid = %client.recid, "storing client");
        self.records.set_client(client)?;
        Ok(Reply::value(marshal::success()))
    }

    /// Store a patient, then add it to the pets of each owner. Every owner is
    /// looked up before anything is written.
    fn set_patient(&self, record: &Value, owners: &[Value]) -> HandlerResult {
        let patient = marshal::parse_patient(record)?;
        let mut clients = Vec::with_capacity(owners.len());
        for owner in owners {
            let recid = owner
                .as_str()
                .ok_or_else(|| ProtocolError::bad_request("owner ids must be strings"))?;
            let client = self
                .records
                .get_client(recid)?
                .ok_or_else(|| no_match(CLIENT_TAG, recid))?;
            clients.push(client);
        }

        info!(
            target: DISPATCH_TARGET,
            recid = %patient.recid,
            owners = clients.len(),
            "storing patient"
        );
        for client in &mut clients {
            client.add_pet(patient.recid.as_str());
        }
        self.records.set_patient(patient)?;
        for client in clients {
            self.records.set_client(client)?;
        }
        Ok(Reply::value(marshal::success()))
    }

    fn search(&self, query: &Value) -> HandlerResult {
        let ids = self.search.search(query.as_str().unwrap_or_default())?;
        Ok(Reply::value(Value::list(ids)))
    }

    fn clear(&self) -> HandlerResult {
        if !self.testing {
            return Err(ProtocolError::bad_request(
                "clear is only available in testing mode",
            ));
        }
        info!(target: DISPATCH_TARGET, "clearing record store");
        self.records.clear()?;
        Ok(Reply::value(marshal::success()))
    }
}

fn no_match(kind: &'static str, recid: &str) -> ProtocolError {
    ProtocolError::NoMatch {
        kind,
        recid: recid.to_string(),
    }
}
