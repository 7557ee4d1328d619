use std::collections::HashMap;

use super::Value;

/// Expected kind of one positional element, used by [`verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A string atom.
    String,
    /// An integer atom.
    Integer,
    /// A float atom.
    Float,
    /// Either numeric atom.
    Number,
    /// A list of anything.
    List,
    /// Any value at all.
    Any,
}

impl Shape {
    /// Check a single value against this shape.
    pub fn matches(self, value: &Value) -> bool {
        match (self, value) {
            (Shape::Any, _) => true,
            (Shape::String, Value::String(_)) => true,
            (Shape::Integer, Value::Integer(_)) => true,
            (Shape::Float, Value::Float(_)) => true,
            (Shape::Number, Value::Integer(_) | Value::Float(_)) => true,
            (Shape::List, Value::List(_)) => true,
            _ => false,
        }
    }
}

/// Check that `items` has exactly one element per shape, each matching.
pub fn verify(items: &[Value], shapes: &[Shape]) -> bool {
    items.len() == shapes.len()
        && items
            .iter()
            .zip(shapes)
            .all(|(item, shape)| shape.matches(item))
}

/// Named view over a positional list, produced by [`structure`].
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    map: HashMap<&'a str, &'a Value>,
}

impl<'a> Fields<'a> {
    /// Look up a field by name.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).copied()
    }

    /// Look up a string field.
    pub fn str(&self, key: &str) -> Option<&'a str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Look up a list field.
    pub fn list(&self, key: &str) -> Option<&'a [Value]> {
        self.get(key).and_then(Value::as_list)
    }
}

/// Pair each element of `items` with the name at the same position.
///
/// Returns `None` unless there is exactly one element per key.
pub fn structure<'a>(items: &'a [Value], keys: &[&'a str]) -> Option<Fields<'a>> {
    if items.len() != keys.len() {
        return None;
    }
    let map = keys.iter().copied().zip(items).collect();
    Some(Fields { map })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sexp::parse;

    #[test]
    fn structure_names_positional_fields() {
        let parsed = Value::List(vec![
            Value::string("client"),
            Value::string("Bobby Tables"),
            Value::list(["396-555-3213", "bobtables@example.com"]),
        ]);
        let items = parsed.as_list().unwrap();
        let fields = structure(items, &["type", "name", "contact"]).unwrap();
        assert_eq!(fields.str("type"), Some("client"));
        assert_eq!(fields.str("name"), Some("Bobby Tables"));
        assert_eq!(fields.list("contact").map(<[Value]>::len), Some(2));
        assert!(structure(items, &["type", "name"]).is_none());
    }

    #[test]
    fn verify_checks_arity_and_kinds() {
        assert!(verify(&[], &[]));
        let items = [Value::string("Bobby Tables"), Value::Integer(10)];
        assert!(verify(&items, &[Shape::String, Shape::Integer]));
        assert!(verify(&items, &[Shape::Any, Shape::Number]));
        assert!(!verify(&items, &[Shape::String]));
        assert!(!verify(&items, &[Shape::Integer, Shape::String]));
    }
}
