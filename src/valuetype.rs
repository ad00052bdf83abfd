// the "standard" regular expression package
use lazy_static::lazy_static;
use regex::Regex;

use crate::driver::BindKind;
use crate::error::{QbindError, Result};
use crate::value::Value;

// compiled once, shared by every validation
lazy_static! {
    static ref SIGNED_INTEGER: Regex = Regex::new(r"^[-+]?[0-9]+$").unwrap();
    static ref UNSIGNED_INTEGER: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref SIGNED_DECIMAL: Regex = Regex::new(r"^[-+]?[0-9]+(\.[0-9]+)?$").unwrap();
    static ref UNSIGNED_DECIMAL: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap();
}

/// The closed set of type codes a placeholder can carry.
///
/// Scalar codes select a validation rule and a driver bind kind. List codes
/// mean "sequence valued": the value is split into elements, every element
/// is validated against the corresponding scalar code, and the placeholder
/// expands to one bind marker per element. There is no binary list code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    SignedInteger,
    UnsignedInteger,
    SignedDecimal,
    UnsignedDecimal,
    String,
    EscapedString,
    Binary,
    /// Bare list, an alias for a list of strings.
    List,
    ListString,
    ListEscapedString,
    ListSignedInteger,
    ListUnsignedInteger,
    ListSignedDecimal,
    ListUnsignedDecimal,
}

impl ValueType {
    /// Resolves a textual type code, case-insensitively. Unknown codes are
    /// rejected.
    pub fn from_code(code: &str) -> Result<ValueType> {
        match code.to_lowercase().as_str() {
            "d" => Ok(ValueType::SignedInteger),
            "ud" => Ok(ValueType::UnsignedInteger),
            "f" => Ok(ValueType::SignedDecimal),
            "uf" => Ok(ValueType::UnsignedDecimal),
            "s" => Ok(ValueType::String),
            "es" => Ok(ValueType::EscapedString),
            "b" => Ok(ValueType::Binary),
            "l" => Ok(ValueType::List),
            "ls" => Ok(ValueType::ListString),
            "les" => Ok(ValueType::ListEscapedString),
            "ld" => Ok(ValueType::ListSignedInteger),
            "lud" => Ok(ValueType::ListUnsignedInteger),
            "lf" => Ok(ValueType::ListSignedDecimal),
            "luf" => Ok(ValueType::ListUnsignedDecimal),
            _ => Err(QbindError::InvalidArgument(format!(
                "The data type \"{}\" is invalid.",
                code
            ))),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ValueType::SignedInteger => "d",
            ValueType::UnsignedInteger => "ud",
            ValueType::SignedDecimal => "f",
            ValueType::UnsignedDecimal => "uf",
            ValueType::String => "s",
            ValueType::EscapedString => "es",
            ValueType::Binary => "b",
            ValueType::List => "l",
            ValueType::ListString => "ls",
            ValueType::ListEscapedString => "les",
            ValueType::ListSignedInteger => "ld",
            ValueType::ListUnsignedInteger => "lud",
            ValueType::ListSignedDecimal => "lf",
            ValueType::ListUnsignedDecimal => "luf",
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            ValueType::List
                | ValueType::ListString
                | ValueType::ListEscapedString
                | ValueType::ListSignedInteger
                | ValueType::ListUnsignedInteger
                | ValueType::ListSignedDecimal
                | ValueType::ListUnsignedDecimal
        )
    }

    /// Collapses a list code to its element scalar code. Scalars normalize
    /// to themselves.
    pub fn normalize(&self) -> ValueType {
        match self {
            ValueType::List | ValueType::ListString => ValueType::String,
            ValueType::ListEscapedString => ValueType::EscapedString,
            ValueType::ListSignedInteger => ValueType::SignedInteger,
            ValueType::ListUnsignedInteger => ValueType::UnsignedInteger,
            ValueType::ListSignedDecimal => ValueType::SignedDecimal,
            ValueType::ListUnsignedDecimal => ValueType::UnsignedDecimal,
            scalar => *scalar,
        }
    }

    /// The human-readable name used in validation failures.
    pub fn description(&self) -> &'static str {
        match self.normalize() {
            ValueType::SignedInteger => "integer",
            ValueType::UnsignedInteger => "unsigned integer",
            ValueType::SignedDecimal => "decimal",
            ValueType::UnsignedDecimal => "unsigned decimal",
            ValueType::String => "string",
            ValueType::EscapedString => "escaped string",
            ValueType::Binary => "binary",
            _ => unreachable!("normalize() yields a scalar"),
        }
    }

    /// Verifies that a value has the lexical shape this type requires.
    ///
    /// List codes split the value into elements and validate each one with
    /// `is_list_element` set, which only changes the wording of a failure.
    /// Strings, escaped strings and binary payloads carry no shape
    /// constraint.
    pub fn validate(&self, value: &Value, is_list_element: bool) -> Result<()> {
        let regex = match self {
            ValueType::SignedInteger => &*SIGNED_INTEGER,
            ValueType::UnsignedInteger => &*UNSIGNED_INTEGER,
            ValueType::SignedDecimal => &*SIGNED_DECIMAL,
            ValueType::UnsignedDecimal => &*UNSIGNED_DECIMAL,
            ValueType::String | ValueType::EscapedString | ValueType::Binary => return Ok(()),
            list => {
                let elements = value.elements();
                if elements.is_empty() {
                    return Err(QbindError::InvalidArgument(format!(
                        "Empty list bound to a \"{}\" parameter.",
                        list.description()
                    )));
                }
                let scalar = list.normalize();
                for element in &elements {
                    scalar.validate(element, true)?;
                }
                return Ok(());
            }
        };
        if !regex.is_match(&value.lexical()) {
            let suffix = if is_list_element { " list value" } else { "" };
            return Err(QbindError::InvalidArgument(format!(
                "Invalid data for a \"{}{}\" parameter ({}).",
                self.description(),
                suffix,
                value
            )));
        }
        Ok(())
    }

    /// The driver bind kind for a parameter of this (normalized) type.
    pub fn bind_kind(&self) -> BindKind {
        match self.normalize() {
            ValueType::Binary => BindKind::LargeBinary,
            ValueType::SignedInteger | ValueType::UnsignedInteger => BindKind::Integer,
            _ => BindKind::Text,
        }
    }
}

/// Escapes markup-significant characters the way escaped-string parameters
/// are stored: `&`, `<`, `>`, `"` and `'` become their HTML entities.
pub fn escape_markup(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_codes_case_insensitively() {
        assert_eq!(
            ValueType::from_code("UD").unwrap(),
            ValueType::UnsignedInteger
        );
        assert_eq!(
            ValueType::from_code("lud").unwrap(),
            ValueType::ListUnsignedInteger
        );
        assert!(ValueType::from_code("nope").is_err());
    }

    #[test]
    fn normalizes_lists_to_scalars() {
        assert_eq!(ValueType::List.normalize(), ValueType::String);
        assert_eq!(
            ValueType::ListSignedDecimal.normalize(),
            ValueType::SignedDecimal
        );
        assert_eq!(
            ValueType::SignedInteger.normalize(),
            ValueType::SignedInteger
        );
    }

    #[test]
    fn signed_integer_shapes() {
        let t = ValueType::SignedInteger;
        for ok in ["0", "-1", "+42", "1234567890"] {
            assert!(t.validate(&Value::Text(ok.into()), false).is_ok(), "{ok}");
        }
        for bad in ["1.5", "abc", "1e4", "--2", ""] {
            assert!(t.validate(&Value::Text(bad.into()), false).is_err(), "{bad}");
        }
    }

    #[test]
    fn unsigned_decimal_rejects_sign() {
        let t = ValueType::UnsignedDecimal;
        assert!(t.validate(&Value::Text("3.14".into()), false).is_ok());
        assert!(t.validate(&Value::Text("-3.14".into()), false).is_err());
    }

    #[test]
    fn integer_values_validate_like_their_rendering() {
        assert!(ValueType::UnsignedInteger
            .validate(&Value::Integer(7), false)
            .is_ok());
        assert!(ValueType::UnsignedInteger
            .validate(&Value::Integer(-7), false)
            .is_err());
    }

    #[test]
    fn list_validation_recurses_into_elements() {
        let t = ValueType::ListSignedInteger;
        assert!(t.validate(&Value::Text("0,-1,2".into()), false).is_ok());
        let err = t
            .validate(&Value::Text("0,x,2".into()), false)
            .unwrap_err();
        assert!(err.to_string().contains("integer list value"));
    }

    #[test]
    fn sequence_values_validate_per_element() {
        let t = ValueType::ListUnsignedInteger;
        let ok = Value::List(vec![Value::Integer(0), Value::Integer(1)]);
        assert!(t.validate(&ok, false).is_ok());
        let bad = Value::List(vec![Value::Integer(0), Value::Integer(-1)]);
        assert!(t.validate(&bad, false).is_err());
    }

    #[test]
    fn empty_list_is_rejected() {
        let err = ValueType::ListString
            .validate(&Value::List(vec![]), false)
            .unwrap_err();
        assert!(err.to_string().contains("Empty list"));
    }

    #[test]
    fn strings_and_binary_are_unconstrained() {
        assert!(ValueType::String
            .validate(&Value::Text("anything at all".into()), false)
            .is_ok());
        assert!(ValueType::Binary
            .validate(&Value::Blob(vec![0, 1, 2]), false)
            .is_ok());
    }

    #[test]
    fn bind_kinds_follow_normalized_type() {
        assert_eq!(ValueType::Binary.bind_kind(), BindKind::LargeBinary);
        assert_eq!(
            ValueType::ListUnsignedInteger.bind_kind(),
            BindKind::Integer
        );
        assert_eq!(ValueType::EscapedString.bind_kind(), BindKind::Text);
    }

    #[test]
    fn markup_escaping() {
        assert_eq!(
            escape_markup("a < b & 'c'"),
            "a &lt; b &amp; &#039;c&#039;"
        );
    }
}
