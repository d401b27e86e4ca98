//! Turning one filter entry into something to apply, or a reason not to.
//!
//! The applicator and the validator both go through [`resolve_filter`] and
//! [`resolve_relationship`]. The applicator applies [`Resolution::Applied`]
//! outcomes and logs the rest; the validator reports every
//! [`Resolution::Skipped`] outcome.

use std::fmt;

use crate::config::FilterConfig;
use crate::decode::{FilterValue, KeyOperator, SortDirection, ValueError, decode_key, decode_value};
use crate::errors::FilterError;
use crate::operators::{Arity, Operator};
use crate::query::Comparison;
use crate::schema::{Association, EntitySchema, FieldMetadata, FieldType, SchemaProvider};

/// Why an entry was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Operator token is unknown or has been removed
    UnavailableOperator(String),
    /// Key has no operator and `eq` has been removed
    ImplicitEqualityDisabled,
    NotFilterable,
    UnknownField,
    /// Association whose local column does not hold the target identifier
    InverseAssociation,
    ValueShape { operator: Operator, value: String },
    RelationshipsDisabled,
    UnknownAssociation,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnavailableOperator(token) => write!(f, "operator '{token}' is not available"),
            Self::ImplicitEqualityDisabled => write!(f, "implicit equality is disabled"),
            Self::NotFilterable => write!(f, "field is not filterable"),
            Self::UnknownField => write!(f, "field does not exist"),
            Self::InverseAssociation => write!(f, "association cannot be compared by identifier"),
            Self::ValueShape { operator, value } => {
                write!(f, "operator '{operator}' must receive a valid value, value given: '{value}'")
            }
            Self::RelationshipsDisabled => write!(f, "relationship filters are disabled"),
            Self::UnknownAssociation => write!(f, "association does not exist"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Applied(T),
    Skipped(SkipReason),
}

/// What a resolved filter does to the query.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Where(Comparison),
    OrderBy(SortDirection),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    /// Schema field name after alias substitution
    pub field: String,
    pub column: String,
    pub operator: Operator,
    pub instruction: Instruction,
    /// The value was accepted although it does not fit the operator: a
    /// single value for `in`/`notin`, or an empty operand
    pub lenient_value: bool,
}

/// Resolve a string-valued entry on `entity`.
///
/// Checks run in this order: field filterable, field known, operator
/// enabled, association target declared, value decodable. The first failing
/// check decides the skip reason.
///
/// # Errors
/// [`FilterError::InvalidValue`] when the value cannot be coerced to the
/// field's type, and [`FilterError::UnknownEntity`] when an association
/// points at an entity missing from the schema.
pub fn resolve_filter<S>(
    schema: &S,
    config: &FilterConfig,
    entity: &EntitySchema,
    key: &str,
    raw_value: &str,
) -> Result<Resolution<ResolvedFilter>, FilterError>
where
    S: SchemaProvider + ?Sized,
{
    let decoded = decode_key(key, &config.field_aliases, &config.operators);

    if !config.filterable_fields.allows(&decoded.field) {
        return Ok(Resolution::Skipped(SkipReason::NotFilterable));
    }

    let metadata = match entity.resolve(&decoded.field) {
        Some(FieldMetadata::Association(association)) if !association.is_owning_side() => {
            return Ok(Resolution::Skipped(SkipReason::InverseAssociation));
        }
        Some(metadata) => metadata,
        None => return Ok(Resolution::Skipped(SkipReason::UnknownField)),
    };

    let operator = match decoded.operator {
        KeyOperator::Enabled(operator) => operator,
        KeyOperator::ImplicitDisabled => return Ok(Resolution::Skipped(SkipReason::ImplicitEqualityDisabled)),
        KeyOperator::Unavailable(token) => return Ok(Resolution::Skipped(SkipReason::UnavailableOperator(token))),
    };

    let (column, field_type) = match metadata {
        FieldMetadata::Scalar(field) => (field.column.clone(), field.field_type.clone()),
        FieldMetadata::Association(association) => {
            let target = schema
                .entity(&association.target)
                .ok_or_else(|| FilterError::unknown_entity(&association.target))?;
            let field_type = target
                .primary_key_type()
                .cloned()
                .unwrap_or_else(|| FieldType::Other("identifier".to_string()));
            (association.local_column.clone(), field_type)
        }
    };

    let value = match decode_value(raw_value, &field_type, operator) {
        Ok(value) => value,
        Err(ValueError::Shape { operator, value }) => {
            return Ok(Resolution::Skipped(SkipReason::ValueShape { operator, value }));
        }
        Err(ValueError::Type { field_type, value }) => {
            return Err(FilterError::InvalidValue {
                field: decoded.field,
                field_type,
                value,
            });
        }
    };

    let Some(instruction) = instruction(operator, value) else {
        return Ok(Resolution::Skipped(SkipReason::ValueShape {
            operator,
            value: raw_value.trim().to_string(),
        }));
    };

    let trimmed = raw_value.trim();
    let lenient_value = match operator.arity() {
        Arity::List => !trimmed.contains(','),
        Arity::Scalar => operator != Operator::Sort && trimmed.is_empty(),
        Arity::Pair | Arity::None => false,
    };

    Ok(Resolution::Applied(ResolvedFilter {
        field: decoded.field,
        column,
        operator,
        instruction,
        lenient_value,
    }))
}

/// Resolve a nested-map entry as an association of `entity`.
///
/// The key is used as written: field aliases and the filterable list do not
/// apply to association names.
#[must_use]
pub fn resolve_relationship<'e>(
    config: &FilterConfig,
    entity: &'e EntitySchema,
    key: &str,
) -> Resolution<&'e Association> {
    if !config.relationships {
        return Resolution::Skipped(SkipReason::RelationshipsDisabled);
    }
    match entity.association_named(key) {
        Some(association) => Resolution::Applied(association),
        None => Resolution::Skipped(SkipReason::UnknownAssociation),
    }
}

fn instruction(operator: Operator, value: FilterValue) -> Option<Instruction> {
    let comparison = match (operator, value) {
        (Operator::Sort, FilterValue::Sort(direction)) => return Some(Instruction::OrderBy(direction)),
        (Operator::IsNull, FilterValue::None) => Comparison::IsNull,
        (Operator::IsNotNull, FilterValue::None) => Comparison::IsNotNull,
        (Operator::Eq, FilterValue::Scalar(v)) => Comparison::Eq(v),
        (Operator::Neq, FilterValue::Scalar(v)) => Comparison::Neq(v),
        (Operator::Gt, FilterValue::Scalar(v)) => Comparison::Gt(v),
        (Operator::Gte, FilterValue::Scalar(v)) => Comparison::Gte(v),
        (Operator::Lt, FilterValue::Scalar(v)) => Comparison::Lt(v),
        (Operator::Lte, FilterValue::Scalar(v)) => Comparison::Lte(v),
        (Operator::Like, FilterValue::Scalar(v)) => Comparison::Like(v.to_string()),
        (Operator::Between, FilterValue::Pair(low, high)) => Comparison::Between(low, high),
        (Operator::In | Operator::Eq, FilterValue::List(values)) => Comparison::In(values),
        (Operator::NotIn | Operator::Neq, FilterValue::List(values)) => Comparison::NotIn(values),
        _ => return None,
    };
    Some(Instruction::Where(comparison))
}
