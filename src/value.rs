// used to print out readable forms of a value
use std::borrow::Cow;
use std::fmt;

/// A database value as it travels through the pipeline: caller argument,
/// bound parameter, or fetched row cell.
///
/// Shape validation works on the lexical rendering of a value (see
/// [`lexical`](Value::lexical)), so an `Integer(42)` and a `Text("42")`
/// are interchangeable wherever an unsigned integer is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// A sequence value, bound through one of the list type codes.
    List(Vec<Value>),
}

impl Value {
    /// The textual form used for shape validation and text binding.
    pub fn lexical(&self) -> Cow<'_, str> {
        match self {
            Value::Null => Cow::Borrowed(""),
            Value::Integer(i) => Cow::Owned(i.to_string()),
            Value::Real(r) => Cow::Owned(r.to_string()),
            Value::Text(s) => Cow::Borrowed(s),
            Value::Blob(b) => Cow::Owned(String::from_utf8_lossy(b).into_owned()),
            Value::List(items) => {
                let parts: Vec<String> =
                    items.iter().map(|v| v.lexical().into_owned()).collect();
                Cow::Owned(parts.join(","))
            }
        }
    }

    /// The byte form used for large-binary binding.
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Value::Blob(b) => b.clone(),
            other => other.lexical().into_owned().into_bytes(),
        }
    }

    /// Splits a value into list elements: a `List` contributes its members,
    /// anything else is comma-split on its lexical form. A scalar without
    /// commas yields a single element.
    pub fn elements(&self) -> Vec<Value> {
        match self {
            Value::List(items) => items.clone(),
            other => other
                .lexical()
                .split(',')
                .map(|part| Value::Text(part.to_string()))
                .collect(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            other => write!(f, "{}", other.lexical()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}
impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}
impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(v as i64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}
impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}
impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}
impl From<Vec<i32>> for Value {
    fn from(v: Vec<i32>) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}
impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}
impl From<Vec<&str>> for Value {
    fn from(v: Vec<&str>) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}
impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::List(v.into_iter().map(Value::from).collect())
    }
}

/// Builds a `Vec<Value>` argument list for [`Database::query`](crate::database::Database::query).
///
/// ```
/// use qbind::{values, value::Value};
/// let args = values![42, "hello", vec![1, 2, 3]];
/// assert_eq!(args.len(), 3);
/// assert_eq!(args[0], Value::Integer(42));
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($v:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($v)),+]
    };
}
