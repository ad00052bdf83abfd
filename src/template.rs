//! Placeholder parsing and statement rewriting.
//!
//! Two mutually exclusive placeholder dialects are supported. The basic
//! dialect writes `{type}` or `{location:type}` markers and either infers
//! every parameter index from appearance order or takes every index from an
//! explicit location prefix; mixing the two in one template is an error.
//! The classic dialect writes `%type` markers and is always strictly
//! sequential. Either way the template is rewritten into a driver-ready
//! statement with `?` bind markers, list values expanding into one
//! parenthesized marker group per placeholder.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::configuration::QueryDialect;
use crate::error::{QbindError, Result};
use crate::value::Value;
use crate::valuetype::ValueType;

lazy_static! {
    // an optional location: prefix followed by a type code, inside braces
    static ref BASIC_PLACEHOLDER: Regex = Regex::new(r"\{((\w+):)?(\w+)\}").unwrap();
    // a type code only
    static ref CLASSIC_PLACEHOLDER: Regex = Regex::new(r"%(\w+)").unwrap();
}

/// A validated, normalized (value, type) pair in driver binding order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParameter {
    value: Value,
    value_type: ValueType,
}

impl BoundParameter {
    pub fn value(&self) -> &Value {
        &self.value
    }
    /// Always a scalar type; list placeholders bind their element type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }
}

/// The outcome of parsing one template: the rewritten statement text plus
/// the ordered parameters to bind to it.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub(crate) query: String,
    pub(crate) original_query: String,
    pub(crate) original_parameters: Vec<Value>,
    pub(crate) parameters: Vec<BoundParameter>,
}

impl ParsedQuery {
    pub fn query(&self) -> &str {
        &self.query
    }
    pub fn original_query(&self) -> &str {
        &self.original_query
    }
    pub fn parameters(&self) -> &[BoundParameter] {
        &self.parameters
    }
}

/// Parses a template under the given dialect. Failures here are parse-phase
/// failures: nothing has touched the driver yet.
pub fn parse(dialect: QueryDialect, template: &str, args: Vec<Value>) -> Result<ParsedQuery> {
    match dialect {
        QueryDialect::Basic => parse_basic(template, args),
        QueryDialect::Classic => parse_classic(template, args),
    }
}

fn parse_basic(template: &str, args: Vec<Value>) -> Result<ParsedQuery> {
    let mut parsed = ParsedQuery {
        query: template.to_string(),
        original_query: template.to_string(),
        original_parameters: args,
        parameters: Vec::new(),
    };

    // whether any placeholder so far declared its location, or left it
    // to be inferred; the two modes cannot meet in one template
    let mut location_binding = false;
    let mut inferred_binding = false;

    // the distinct parameter slots claimed so far
    let mut claimed: HashSet<usize> = HashSet::new();

    for captures in BASIC_PLACEHOLDER.captures_iter(template) {
        let matched = captures.get(0).expect("match").as_str();
        let type_code = captures.get(3).expect("type code").as_str();

        let parameter_number = match captures.get(2) {
            Some(location) => {
                location_binding = true;
                if inferred_binding {
                    return Err(QbindError::InvalidArgument(
                        "You cannot have both inferred, and location binding in the same query."
                            .to_string(),
                    ));
                }
                location.as_str().parse::<usize>().map_err(|_| {
                    QbindError::InvalidArgument(format!(
                        "Invalid parameter number value ({}).",
                        location.as_str()
                    ))
                })?
            }
            None => {
                inferred_binding = true;
                if location_binding {
                    return Err(QbindError::InvalidArgument(
                        "You cannot have both inferred, and location binding in the same query."
                            .to_string(),
                    ));
                }
                claimed.len()
            }
        };

        bind_placeholder(&mut parsed, matched, type_code, parameter_number)?;
        claimed.insert(parameter_number);
    }

    Ok(parsed)
}

fn parse_classic(template: &str, args: Vec<Value>) -> Result<ParsedQuery> {
    let mut parsed = ParsedQuery {
        query: template.to_string(),
        original_query: template.to_string(),
        original_parameters: args,
        parameters: Vec::new(),
    };

    // classic binding is strictly sequential: the Nth marker takes the
    // Nth argument
    let mut parameter_number = 0;

    for captures in CLASSIC_PLACEHOLDER.captures_iter(template) {
        let matched = captures.get(0).expect("match").as_str();
        let type_code = captures.get(1).expect("type code").as_str();

        bind_placeholder(&mut parsed, matched, type_code, parameter_number)?;
        parameter_number += 1;
    }

    Ok(parsed)
}

/// The shared validate → rewrite → bind tail of both dialects.
fn bind_placeholder(
    parsed: &mut ParsedQuery,
    matched: &str,
    type_code: &str,
    parameter_number: usize,
) -> Result<()> {
    let value = parsed
        .original_parameters
        .get(parameter_number)
        .cloned()
        .ok_or(QbindError::OutOfBounds(parameter_number))?;

    let value_type = ValueType::from_code(type_code)?;
    value_type.validate(&value, false)?;

    let (marker, values) = expand(value_type, &value);

    // one occurrence per match, in match order
    parsed.query = parsed.query.replacen(matched, &marker, 1);

    let scalar = value_type.normalize();
    for value in values {
        parsed.parameters.push(BoundParameter {
            value,
            value_type: scalar,
        });
    }

    Ok(())
}

/// Builds the marker text substituted for one placeholder, paired with the
/// values it binds: a single `?` for scalars, `(?,...,?)` sized to the
/// element count for lists, elements kept in their original order.
pub fn expand(value_type: ValueType, value: &Value) -> (String, Vec<Value>) {
    if value_type.is_list() {
        let elements = value.elements();
        let markers = vec!["?"; elements.len()].join(",");
        (format!("({})", markers), elements)
    } else {
        ("?".to_string(), vec![value.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values;

    fn basic(template: &str, args: Vec<Value>) -> Result<ParsedQuery> {
        parse(QueryDialect::Basic, template, args)
    }

    fn classic(template: &str, args: Vec<Value>) -> Result<ParsedQuery> {
        parse(QueryDialect::Classic, template, args)
    }

    #[test]
    fn no_placeholders_passes_through() {
        let parsed = basic("SELECT * FROM foo", values![]).unwrap();
        assert_eq!(parsed.query(), "SELECT * FROM foo");
        assert!(parsed.parameters().is_empty());
    }

    #[test]
    fn location_binding_rewrites_to_marker() {
        let parsed = basic("SELECT * FROM foo WHERE bar={0:ud}", values![0]).unwrap();
        assert_eq!(parsed.query(), "SELECT * FROM foo WHERE bar=?");
        assert_eq!(parsed.parameters().len(), 1);
        assert_eq!(
            parsed.parameters()[0].value_type(),
            ValueType::UnsignedInteger
        );
        assert_eq!(parsed.parameters()[0].value(), &Value::Integer(0));
    }

    #[test]
    fn inferred_binding_claims_arguments_in_order() {
        let parsed = basic(
            "INSERT INTO foo (a, b) VALUES ({s}, {s})",
            values!["x", "y"],
        )
        .unwrap();
        assert_eq!(parsed.query(), "INSERT INTO foo (a, b) VALUES (?, ?)");
        assert_eq!(parsed.parameters()[0].value(), &Value::Text("x".into()));
        assert_eq!(parsed.parameters()[1].value(), &Value::Text("y".into()));
    }

    #[test]
    fn repeated_location_placeholders_reuse_one_argument() {
        let parsed = basic(
            "SELECT * FROM foo WHERE a={0:ud} OR b={0:ud}",
            values![5],
        )
        .unwrap();
        assert_eq!(parsed.query(), "SELECT * FROM foo WHERE a=? OR b=?");
        assert_eq!(parsed.parameters().len(), 2);
    }

    #[test]
    fn list_placeholders_expand_to_marker_groups() {
        let parsed = basic(
            "SELECT * FROM foo WHERE blah IN {0:ld} AND bar IN {1:lud}",
            values!["0,-1,2", vec![0, 1, 2]],
        )
        .unwrap();
        assert_eq!(
            parsed.query(),
            "SELECT * FROM foo WHERE blah IN (?,?,?) AND bar IN (?,?,?)"
        );
        assert_eq!(parsed.parameters().len(), 6);
        for parameter in &parsed.parameters()[..3] {
            assert_eq!(parameter.value_type(), ValueType::SignedInteger);
        }
        for parameter in &parsed.parameters()[3..] {
            assert_eq!(parameter.value_type(), ValueType::UnsignedInteger);
        }
        // element order is preserved
        assert_eq!(parsed.parameters()[1].value().lexical(), "-1");
    }

    #[test]
    fn mixed_binding_modes_fail_in_either_order() {
        let err = basic(
            "SELECT * FROM foo WHERE bar={0:ud} AND blah={s}",
            values![1],
        )
        .unwrap_err();
        assert!(err.to_string().contains("inferred, and location binding"));

        let err = basic(
            "SELECT * FROM foo WHERE blah={s} AND bar={0:ud}",
            values![1],
        )
        .unwrap_err();
        assert!(err.to_string().contains("inferred, and location binding"));
    }

    #[test]
    fn non_numeric_location_is_rejected() {
        let err = basic("SELECT * FROM foo WHERE bar={x:ud}", values![1]).unwrap_err();
        assert!(err
            .to_string()
            .contains("Invalid parameter number value (x)."));
    }

    #[test]
    fn missing_argument_is_out_of_bounds() {
        let err = basic("SELECT * FROM foo WHERE bar={0:ud}", values![]).unwrap_err();
        assert!(matches!(err, QbindError::OutOfBounds(0)));

        let err = basic(
            "SELECT * FROM foo WHERE bar={1:ud} AND blah={0:s}",
            values!["hi"],
        )
        .unwrap_err();
        assert!(matches!(err, QbindError::OutOfBounds(1)));
    }

    #[test]
    fn shape_violation_is_invalid_argument() {
        let err = basic("SELECT * FROM foo WHERE blah={0:ud}", values!["hi"]).unwrap_err();
        assert!(err.to_string().contains("unsigned integer"));
    }

    #[test]
    fn unknown_type_code_is_rejected() {
        let err = basic("SELECT * FROM foo WHERE blah={0:zz}", values![1]).unwrap_err();
        assert!(err.to_string().contains("\"zz\" is invalid"));
    }

    #[test]
    fn classic_markers_bind_sequentially() {
        let parsed = classic(
            "SELECT * FROM foo WHERE bar=%ud AND blah=%s",
            values![3, "hi"],
        )
        .unwrap();
        assert_eq!(parsed.query(), "SELECT * FROM foo WHERE bar=? AND blah=?");
        assert_eq!(parsed.parameters().len(), 2);
    }

    #[test]
    fn classic_without_arguments_is_out_of_bounds() {
        let err = classic("SELECT * FROM foo WHERE bar=%ud", values![]).unwrap_err();
        assert!(matches!(err, QbindError::OutOfBounds(0)));
    }

    #[test]
    fn expand_sizes_marker_groups_to_the_list() {
        let (marker, values) =
            expand(ValueType::ListUnsignedInteger, &Value::Text("1,2,3,4".into()));
        assert_eq!(marker, "(?,?,?,?)");
        assert_eq!(values.len(), 4);
        let (marker, values) = expand(ValueType::String, &Value::Text("1,2".into()));
        assert_eq!(marker, "?");
        assert_eq!(values.len(), 1);
    }
}
