use super::Permission;
use crate::sexp::{Shape, Value, verify};

/// Every command the server understands.
///
/// The set is closed: a wire name either maps to one of these variants or the
/// request is rejected as `badrequest` before anything else is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `("version?")` – protocol version integer.
    Version,
    /// `("auth" user password)` – replace the connection's permission.
    Auth,
    /// `("get" type id)` – fetch one client or patient.
    Get,
    /// `("set" record)` – store a client or patient, chosen by its tag.
    Set,
    /// `("set-client" record)` – store a client.
    SetClient,
    /// `("set-patient" record [owners])` – store a patient and optionally link
    /// it to owning clients.
    SetPatient,
    /// `("search" query)` – ids of records matching every query tag.
    Search,
    /// `("clear")` – wipe the store; testing mode only.
    Clear,
}

impl Command {
    /// All commands, in wire-table order.
    pub const ALL: [Command; 8] = [
        Command::Version,
        Command::Auth,
        Command::Get,
        Command::Set,
        Command::SetClient,
        Command::SetPatient,
        Command::Search,
        Command::Clear,
    ];

    /// Look up a command by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Version => "version?",
            Self::Auth => "auth",
            Self::Get => "get",
            Self::Set => "set",
            Self::SetClient => "set-client",
            Self::SetPatient => "set-patient",
            Self::Search => "search",
            Self::Clear => "clear",
        }
    }

    /// Accepted positional argument shapes, excluding the command name.
    pub fn shapes(self) -> &'static [&'static [Shape]] {
        match self {
            Self::Version | Self::Clear => &[&[]],
            Self::Auth | Self::Get => &[&[Shape::String, Shape::String]],
            Self::Set | Self::SetClient => &[&[Shape::List]],
            Self::SetPatient => &[&[Shape::List], &[Shape::List, Shape::List]],
            Self::Search => &[&[Shape::String]],
        }
    }

    /// Whether `args` has the right arity and kinds for this command.
    pub fn accepts(self, args: &[Value]) -> bool {
        self.shapes().iter().any(|shape| verify(args, shape))
    }

    /// Weakest permission under which the command may run.
    pub fn required_permission(self) -> Permission {
        match self {
            Self::Version | Self::Auth => Permission::None,
            Self::Get | Self::Search => Permission::Read,
            Self::Set | Self::SetClient | Self::SetPatient | Self::Clear => Permission::Write,
        }
    }

    /// Permission predicate evaluated against the connection's level.
    pub fn permits(self, permission: Permission) -> bool {
        match self.required_permission() {
            Permission::None => true,
            Permission::Read => permission.can_read(),
            Permission::Write => permission.can_write(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
        assert_eq!(Command::from_name("set_client"), None);
        assert_eq!(Command::from_name("VERSION?"), None);
    }

    #[test]
    fn shapes_check_arity_and_kind() {
        assert!(Command::Version.accepts(&[]));
        assert!(!Command::Version.accepts(&[Value::Integer(1)]));
        assert!(Command::Get.accepts(&[Value::from("client"), Value::from("id")]));
        assert!(!Command::Get.accepts(&[Value::from("client")]));
        assert!(!Command::Get.accepts(&[Value::from("client"), Value::Integer(4)]));
        assert!(Command::SetClient.accepts(&[Value::empty()]));
        assert!(!Command::SetClient.accepts(&[Value::from("client")]));
        assert!(!Command::SetClient.accepts(&[Value::empty(), Value::empty()]));
    }

    #[test]
    fn set_patient_takes_optional_owner_list() {
        assert!(Command::SetPatient.accepts(&[Value::empty()]));
        assert!(Command::SetPatient.accepts(&[Value::empty(), Value::list(["c-1"])]));
        assert!(!Command::SetPatient.accepts(&[Value::empty(), Value::from("c-1")]));
        assert!(!Command::SetPatient.accepts(&[Value::empty(), Value::empty(), Value::empty()]));
    }

    #[test]
    fn write_commands_need_write() {
        for command in Command::ALL {
            if command.required_permission() == Permission::Write {
                assert!(!command.permits(Permission::None));
                assert!(!command.permits(Permission::Read));
                assert!(command.permits(Permission::Write));
            }
        }
        assert!(Command::Version.permits(Permission::None));
        assert!(Command::Search.permits(Permission::Read));
    }
}
