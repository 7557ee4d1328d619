//! Conversions between store records and wire values, plus the fixed reply
//! envelopes.
//!
//! Wire forms:
//!
//! ```text
//! ("client" recid name address (pet-id ...) ((info category note) ...) (note ...))
//! ("patient" recid name species breed gender description (note ...))
//! ```

use super::{ErrorCode, ProtocolError};
use crate::sexp::{Value, structure};
use crate::store::{Client, ContactInfo, Patient};

/// Type tag heading a client record.
pub const CLIENT_TAG: &str = "client";
/// Type tag heading a patient record.
pub const PATIENT_TAG: &str = "patient";

const CLIENT_FIELDS: &[&str] = &["recid", "name", "address", "pets", "contacts", "notes"];
const PATIENT_FIELDS: &[&str] = &[
    "recid",
    "name",
    "species",
    "breed",
    "gender",
    "description",
    "notes",
];

type Result<T> = std::result::Result<T, ProtocolError>;

/// `("error" "<code>")`
pub fn error(code: ErrorCode) -> Value {
    Value::list(["error", code.as_str()])
}

/// Read the code back out of an error envelope.
pub fn parse_error(value: &Value) -> Option<ErrorCode> {
    match value.as_list()? {
        [Value::String(tag), Value::String(code)] if tag == "error" => ErrorCode::parse(code),
        _ => None,
    }
}

/// `("ok")`
pub fn success() -> Value {
    Value::list(["ok"])
}

/// The type tag of a record value, if it has one.
pub fn record_kind(value: &Value) -> Option<&str> {
    value.as_list()?.first()?.as_str()
}

/// Serialize a client.
pub fn client(client: &Client) -> Value {
    Value::List(vec![
        Value::from(CLIENT_TAG),
        Value::from(client.recid.as_str()),
        Value::from(client.name.as_str()),
        Value::from(client.address.as_str()),
        Value::list(client.pets.iter().map(String::as_str)),
        Value::List(
            client
                .contacts
                .iter()
                .map(|contact| {
                    Value::list([
                        contact.info.as_str(),
                        contact.category.as_str(),
                        contact.note.as_str(),
                    ])
                })
                .collect(),
        ),
        Value::list(client.notes.iter().map(String::as_str)),
    ])
}

/// Deserialize a client; fails with `badrequest` on any structural mismatch.
pub fn parse_client(value: &Value) -> Result<Client> {
    let body = tagged_body(value, CLIENT_TAG)?;
    let fields = structure(body, CLIENT_FIELDS)
        .ok_or_else(|| ProtocolError::bad_request("client record has wrong field count"))?;

    let mut parsed = Client::new(
        string_field(fields.str("recid"), "recid")?,
        string_field(fields.str("name"), "name")?,
        string_field(fields.str("address"), "address")?,
    );
    for pet in string_list(fields.list("pets"), "pets")? {
        parsed.add_pet(pet);
    }
    let contacts = fields
        .list("contacts")
        .ok_or_else(|| ProtocolError::bad_request("client contacts must be a list"))?;
    for contact in contacts {
        parsed.add_contact_info(parse_contact(contact)?);
    }
    parsed.notes = string_list(fields.list("notes"), "notes")?;
    Ok(parsed)
}

/// Serialize a patient.
pub fn patient(patient: &Patient) -> Value {
    Value::List(vec![
        Value::from(PATIENT_TAG),
        Value::from(patient.recid.as_str()),
        Value::from(patient.name.as_str()),
        Value::from(patient.species.as_str()),
        Value::from(patient.breed.as_str()),
        Value::from(patient.gender.as_str()),
        Value::from(patient.description.as_str()),
        Value::list(patient.notes.iter().map(String::as_str)),
    ])
}

/// Deserialize a patient; fails with `badrequest` on any structural mismatch.
pub fn parse_patient(value: &Value) -> Result<Patient> {
    let body = tagged_body(value, PATIENT_TAG)?;
    let fields = structure(body, PATIENT_FIELDS)
        .ok_or_else(|| ProtocolError::bad_request("patient record has wrong field count"))?;

    let mut parsed = Patient::new(
        string_field(fields.str("recid"), "recid")?,
        string_field(fields.str("name"), "name")?,
    );
    parsed.species = string_field(fields.str("species"), "species")?.to_string();
    parsed.breed = string_field(fields.str("breed"), "breed")?.to_string();
    parsed.gender = string_field(fields.str("gender"), "gender")?.to_string();
    parsed.description = string_field(fields.str("description"), "description")?.to_string();
    parsed.notes = string_list(fields.list("notes"), "notes")?;
    Ok(parsed)
}

fn tagged_body<'a>(value: &'a Value, tag: &str) -> Result<&'a [Value]> {
    match value.as_list() {
        Some([Value::String(found), body @ ..]) if found == tag => Ok(body),
        _ => Err(ProtocolError::bad_request(format!(
            "expected a list headed by \"{tag}\""
        ))),
    }
}

fn string_field<'a>(field: Option<&'a str>, name: &str) -> Result<&'a str> {
    field.ok_or_else(|| ProtocolError::bad_request(format!("field '{name}' must be a string")))
}

fn string_list(items: Option<&[Value]>, name: &str) -> Result<Vec<String>> {
    let items = items
        .ok_or_else(|| ProtocolError::bad_request(format!("field '{name}' must be a list")))?;
    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ProtocolError::bad_request(format!("field '{name}' may only hold strings"))
            })
        })
        .collect()
}

fn parse_contact(value: &Value) -> Result<ContactInfo> {
    match value.as_list() {
        Some([Value::String(info), Value::String(category), Value::String(note)]) => {
            Ok(ContactInfo::new(info.as_str(), category.as_str(), note.as_str()))
        }
        _ => Err(ProtocolError::bad_request(
            "contact entries must be (info category note)",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexp::{dump, parse};

    fn bob() -> Client {
        let mut bob = Client::new(
            "73c3a3fd-9def-4154-9f4a-067069b58d5e",
            "Bobby Tables",
            "4982 New Appledam, Fairsworth",
        );
        bob.add_pet("63c8b75a-ea00-4c07-ac81-5ef75d3db298");
        bob.add_contact_info(ContactInfo::new("612-555-2315", "phone", "Home (preferred)"));
        bob.notes.push("Pays in cash".into());
        bob
    }

    #[test]
    fn error_envelope() {
        let err = error(ErrorCode::NoMatch);
        assert_eq!(err, Value::list(["error", "nomatch"]));
        assert_eq!(parse_error(&err), Some(ErrorCode::NoMatch));
        assert_eq!(parse_error(&success()), None);
        assert_eq!(success(), Value::list(["ok"]));
    }

    #[test]
    fn client_wire_form() {
        let text = dump(&client(&bob()));
        assert_eq!(
            text,
            r#"("client" "73c3a3fd-9def-4154-9f4a-067069b58d5e" "Bobby Tables" "4982 New Appledam, Fairsworth" ("63c8b75a-ea00-4c07-ac81-5ef75d3db298") (("612-555-2315" "phone" "Home (preferred)")) ("Pays in cash"))"#
        );
        assert_eq!(parse_client(&parse(&text).unwrap()).unwrap(), bob());
    }

    #[test]
    fn patient_wire_form() {
        let mut ruff = Patient::new("63c8b75a-ea00-4c07-ac81-5ef75d3db298", "Ruff");
        ruff.species = "Canine".into();
        ruff.description = "80 lbs, \"friendly\"".into();
        let value = patient(&ruff);
        assert_eq!(record_kind(&value), Some(PATIENT_TAG));
        assert_eq!(parse_patient(&value).unwrap(), ruff);
    }

    #[test]
    fn empty_recid_is_assigned_on_parse() {
        let value = parse(r#"("patient" "" "Ruff" "" "" "" "" ())"#).unwrap();
        let ruff = parse_patient(&value).unwrap();
        assert!(!ruff.recid.is_empty());
    }

    #[test]
    fn structural_mismatches_are_bad_requests() {
        let short_patient = parse(r#"("patient" "id" "Ruff")"#).unwrap();
        assert_eq!(
            parse_patient(&short_patient).unwrap_err().code(),
            ErrorCode::BadRequest
        );

        let bad_clients = [
            r#"("patient" "id" "Bob" "addr" () () ())"#,
            r#"("client" "id" "Bob" "addr" (1) () ())"#,
            r#"("client" "id" "Bob" "addr" () (("x" "y")) ())"#,
            r#"("client" "id" "Bob" "addr" () () "notes")"#,
            r#"("client" 7 "Bob" "addr" () () ())"#,
        ];
        for case in bad_clients {
            let value = parse(case).unwrap();
            let err = parse_client(&value).unwrap_err();
            assert_eq!(err.code(), ErrorCode::BadRequest, "{case}");
        }
    }
}
