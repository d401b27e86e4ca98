//! Decoding of filter keys and values.
//!
//! A filter key is `field` or `field|operator`. A filter value is raw text,
//! coerced according to the declared type of the field it targets:
//!
//! ```rust,ignore
//! decode_key("state|NEQ", &aliases, &operators);         // state, neq
//! decode_value("1,2", &FieldType::Integer, Operator::Between); // Pair(1, 2)
//! decode_value("Dead", &FieldType::String, Operator::Like);    // "%Dead%"
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use sea_orm::sea_query::{Order, Value};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::operators::{Arity, Operator, OperatorSet};
use crate::schema::FieldType;

/// Operator part of a decoded key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOperator {
    Enabled(Operator),
    /// No pipe in the key and `eq` has been removed
    ImplicitDisabled,
    /// Token after the pipe is unknown or has been removed
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedKey {
    /// Field name after alias substitution
    pub field: String,
    pub operator: KeyOperator,
}

impl DecodedKey {
    #[must_use]
    pub fn operator(&self) -> Option<Operator> {
        match self.operator {
            KeyOperator::Enabled(op) => Some(op),
            KeyOperator::ImplicitDisabled | KeyOperator::Unavailable(_) => None,
        }
    }
}

/// Split a filter key into field name and operator.
///
/// Only the first `|` separates. The field name is trimmed and replaced by its
/// alias target if one is configured. Operator text is trimmed and lowercased
/// before being looked up among the enabled operators.
#[must_use]
pub fn decode_key(raw_key: &str, aliases: &HashMap<String, String>, enabled: &OperatorSet) -> DecodedKey {
    let (field, operator) = match raw_key.split_once('|') {
        None => {
            let operator = if enabled.is_enabled(Operator::Eq) {
                KeyOperator::Enabled(Operator::Eq)
            } else {
                KeyOperator::ImplicitDisabled
            };
            (raw_key.trim(), operator)
        }
        Some((field, token)) => {
            let token = token.trim().to_lowercase();
            let operator = match enabled.lookup(&token) {
                Some(op) => KeyOperator::Enabled(op),
                None => KeyOperator::Unavailable(token),
            };
            (field.trim(), operator)
        }
    };

    let field = aliases.get(field).cloned().unwrap_or_else(|| field.to_string());
    DecodedKey { field, operator }
}

/// Direction of a `sort` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` in any case is ascending; anything else is descending.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// A single typed value, ready to be bound as a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    /// Big integers above `i64::MAX`
    BigUnsigned(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Int(v) => v.into(),
            Scalar::BigUnsigned(v) => v.into(),
            Scalar::Float(v) => v.into(),
            Scalar::Bool(v) => v.into(),
            Scalar::Text(v) => v.into(),
            Scalar::Date(v) => v.into(),
            Scalar::DateTime(v) => v.into(),
            Scalar::Uuid(v) => v.into(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::BigUnsigned(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Uuid(v) => write!(f, "{v}"),
        }
    }
}

/// A decoded filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// `isnull` / `isnotnull` take no value
    None,
    Scalar(Scalar),
    List(Vec<Scalar>),
    Pair(Scalar, Scalar),
    Sort(SortDirection),
}

/// Why a raw value could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value does not fit the declared type of the field
    Type { field_type: FieldType, value: String },
    /// The number of values does not fit the operator
    Shape { operator: Operator, value: String },
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type { field_type, value } => {
                write!(f, "field type '{field_type}' must receive a valid value, value given: '{value}'")
            }
            Self::Shape { operator, value } => {
                write!(f, "operator '{operator}' must receive a valid value, value given: '{value}'")
            }
        }
    }
}

impl std::error::Error for ValueError {}

/// Coerce a raw value for `operator` on a field of `field_type`.
///
/// # Errors
/// [`ValueError::Type`] when an element cannot be parsed as the declared type,
/// [`ValueError::Shape`] when the number of elements does not suit the
/// operator (`between` needs exactly two, `gt` and friends exactly one).
/// An empty value is an empty string on text fields and a shape error
/// anywhere else.
pub fn decode_value(raw: &str, field_type: &FieldType, operator: Operator) -> Result<FilterValue, ValueError> {
    let value = raw.trim();

    let shape_error = || ValueError::Shape {
        operator,
        value: value.to_string(),
    };

    match operator {
        Operator::IsNull | Operator::IsNotNull => return Ok(FilterValue::None),
        Operator::Sort => return Ok(FilterValue::Sort(SortDirection::parse(value))),
        Operator::Like => return Ok(FilterValue::Scalar(Scalar::Text(format!("%{value}%")))),
        _ if value.is_empty() => {
            return match (field_type, operator.arity()) {
                (FieldType::String | FieldType::Other(_), Arity::Scalar) => {
                    Ok(FilterValue::Scalar(Scalar::Text(String::new())))
                }
                _ => Err(shape_error()),
            };
        }
        _ => {}
    }

    if !value.contains(',') {
        let scalar = coerce(value, field_type)?;
        return match operator.arity() {
            Arity::Scalar => Ok(FilterValue::Scalar(scalar)),
            Arity::List => Ok(FilterValue::List(vec![scalar])),
            Arity::Pair | Arity::None => Err(shape_error()),
        };
    }

    let mut items = value
        .split(',')
        .map(|item| coerce(item.trim(), field_type))
        .collect::<Result<Vec<_>, _>>()?;

    match operator {
        Operator::Between if items.len() == 2 => {
            let high = items.pop().ok_or_else(shape_error)?;
            let low = items.pop().ok_or_else(shape_error)?;
            Ok(FilterValue::Pair(low, high))
        }
        // eq/neq widen to IN / NOT IN
        Operator::In | Operator::NotIn | Operator::Eq | Operator::Neq => Ok(FilterValue::List(items)),
        _ => Err(shape_error()),
    }
}

fn coerce(value: &str, field_type: &FieldType) -> Result<Scalar, ValueError> {
    let type_error = || ValueError::Type {
        field_type: field_type.clone(),
        value: value.to_string(),
    };

    match field_type {
        FieldType::Integer => value.parse().map(Scalar::Int).map_err(|_| type_error()),
        FieldType::BigInteger => value
            .parse()
            .map(Scalar::Int)
            .or_else(|_| value.parse().map(Scalar::BigUnsigned))
            .map_err(|_| type_error()),
        FieldType::Float => value.parse().map(Scalar::Float).map_err(|_| type_error()),
        FieldType::Boolean => match value.to_lowercase().as_str() {
            "true" | "1" => Ok(Scalar::Bool(true)),
            "false" | "0" => Ok(Scalar::Bool(false)),
            _ => Err(type_error()),
        },
        FieldType::Date => parse_date(value).map(Scalar::Date).ok_or_else(type_error),
        FieldType::DateTime => parse_datetime(value).map(Scalar::DateTime).ok_or_else(type_error),
        FieldType::Uuid => Uuid::parse_str(value).map(Scalar::Uuid).map_err(|_| type_error()),
        FieldType::String | FieldType::Other(_) => Ok(Scalar::Text(value.to_string())),
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Accepts RFC 3339, `YYYY-MM-DD[ T]HH:MM[:SS[.f]]`, or a bare date at midnight.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(value).map(|dt| dt.date()))
}
