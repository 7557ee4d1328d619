use std::fmt;

/// A node in a wire s-expression tree.
///
/// Values are plain data: parsing and dumping never modify them, and equality
/// is structural (a `List` compares element by element, in order).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer atom.
    Integer(i64),
    /// Floating-point atom.
    Float(f64),
    /// UTF-8 string atom.
    String(String),
    /// Ordered, heterogeneous list.
    List(Vec<Value>),
}

impl Value {
    /// Build a string atom.
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    /// Build a list from anything that yields values.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// The empty list, also returned by the parser for unrecognised input.
    pub fn empty() -> Self {
        Value::List(Vec::new())
    }

    /// Borrow the text of a string atom.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Borrow the elements of a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Read an integer atom.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(num) => Some(*num),
            _ => None,
        }
    }

    /// Read a float atom.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(num) => Some(*num),
            _ => None,
        }
    }

    /// True for anything that is not a list.
    pub fn is_atom(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    /// Short human-readable name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::dump(self))
    }
}

impl From<i64> for Value {
    fn from(num: i64) -> Self {
        Value::Integer(num)
    }
}

impl From<f64> for Value {
    fn from(num: f64) -> Self {
        Value::Float(num)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::String(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::String(text)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
