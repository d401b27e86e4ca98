//! Pre-flight validation of a [`FilterMap`].
//!
//! The [`Applicator`](crate::Applicator) skips anything it cannot apply. The
//! [`FilterValidator`] walks the same entries the same way and reports those
//! entries instead, so a handler can reject a request before querying:
//!
//! ```rust,ignore
//! let report = FilterValidator::new(&schema, "performance")
//!     .with_config(FilterConfig::default().with_relationships(true))
//!     .validate(&filters)?;
//! if !report.is_valid() {
//!     return Err(FilterError::ValidationFailed(report));
//! }
//! ```

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::FilterConfig;
use crate::errors::FilterError;
use crate::models::{FilterEntry, FilterMap};
use crate::resolution::{Resolution, SkipReason, resolve_filter, resolve_relationship};
use crate::schema::{EntitySchema, SchemaProvider};

/// A value that does not fit its operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvalidOperatorValue {
    pub operator: String,
    pub value: String,
}

/// A value that does not fit its field's declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct InvalidTypedValue {
    pub field_type: String,
    pub value: String,
}

/// Every problem found in a filter map, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationReport {
    /// Unknown fields and fields outside the filterable list
    pub unavailable_fields: Vec<String>,
    /// Unknown associations, or any association while relationships are off
    pub unavailable_joins: Vec<String>,
    /// Unknown or removed operator tokens
    pub unavailable_operators: Vec<String>,
    pub invalid_values: Vec<InvalidOperatorValue>,
    pub invalid_typed_values: Vec<InvalidTypedValue>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.unavailable_fields.is_empty()
            && self.unavailable_joins.is_empty()
            && self.unavailable_operators.is_empty()
            && self.invalid_values.is_empty()
            && self.invalid_typed_values.is_empty()
    }

    /// One line per problem group, fields first and typed values last.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.unavailable_fields.is_empty() {
            errors.push(format!("invalid field(s): {}", self.unavailable_fields.join(", ")));
        }
        if !self.unavailable_joins.is_empty() {
            errors.push(format!("invalid join(s): {}", self.unavailable_joins.join(", ")));
        }
        if !self.unavailable_operators.is_empty() {
            errors.push(format!("invalid operator(s): {}", self.unavailable_operators.join(", ")));
        }
        errors.extend(self.invalid_values.iter().map(|invalid| {
            format!(
                "operator '{}' must receive a valid value, value given: '{}'",
                invalid.operator, invalid.value
            )
        }));
        errors.extend(self.invalid_typed_values.iter().map(|invalid| {
            format!(
                "field type '{}' must receive a valid value, value given: '{}'",
                invalid.field_type, invalid.value
            )
        }));
        errors
    }

    /// All problems joined with ` | `, or `None` when the filters are valid.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        let errors = self.errors();
        if errors.is_empty() {
            None
        } else {
            Some(errors.join(" | "))
        }
    }

    /// # Errors
    /// Returns [`FilterError::ValidationFailed`] carrying this report if it
    /// contains any problem.
    pub fn into_result(self) -> Result<(), FilterError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(FilterError::ValidationFailed(self))
        }
    }
}

pub struct FilterValidator<'s, S: SchemaProvider + ?Sized> {
    schema: &'s S,
    root: String,
    config: FilterConfig,
}

impl<'s, S: SchemaProvider + ?Sized> FilterValidator<'s, S> {
    pub fn new(schema: &'s S, root_entity: impl Into<String>) -> Self {
        Self {
            schema,
            root: root_entity.into(),
            config: FilterConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: FilterConfig) -> Self {
        self.config = config;
        self
    }

    /// # Errors
    /// [`FilterError::UnknownEntity`] if the root entity or a joined target is
    /// missing from the schema.
    pub fn validate(&self, filters: &FilterMap) -> Result<ValidationReport, FilterError> {
        let schema = self.schema;
        let root = schema
            .entity(&self.root)
            .ok_or_else(|| FilterError::unknown_entity(&self.root))?;

        let mut report = ValidationReport::default();
        self.validate_map(&mut report, filters, root)?;

        if !report.is_valid() {
            tracing::debug!(entity = %self.root, errors = ?report.errors(), "Filter validation failed");
        }
        Ok(report)
    }

    fn validate_map(
        &self,
        report: &mut ValidationReport,
        filters: &FilterMap,
        entity: &EntitySchema,
    ) -> Result<(), FilterError> {
        for (key, entry) in filters.iter() {
            match entry {
                FilterEntry::Value(raw) => self.validate_filter(report, key, raw, entity)?,
                FilterEntry::Nested(nested) => match resolve_relationship(&self.config, entity, key) {
                    Resolution::Applied(association) => {
                        let schema = self.schema;
                        let target = schema
                            .entity(&association.target)
                            .ok_or_else(|| FilterError::unknown_entity(&association.target))?;
                        self.validate_map(report, nested, target)?;
                    }
                    Resolution::Skipped(_) => report.unavailable_joins.push(key.to_string()),
                },
            }
        }
        Ok(())
    }

    fn validate_filter(
        &self,
        report: &mut ValidationReport,
        key: &str,
        raw: &str,
        entity: &EntitySchema,
    ) -> Result<(), FilterError> {
        let reason = match resolve_filter(self.schema, &self.config, entity, key, raw) {
            Ok(Resolution::Applied(filter)) if filter.lenient_value => SkipReason::ValueShape {
                operator: filter.operator,
                value: raw.trim().to_string(),
            },
            Ok(Resolution::Applied(_)) => return Ok(()),
            Ok(Resolution::Skipped(reason)) => reason,
            Err(FilterError::InvalidValue { field_type, value, .. }) => {
                report.invalid_typed_values.push(InvalidTypedValue {
                    field_type: field_type.to_string(),
                    value,
                });
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        match reason {
            SkipReason::NotFilterable | SkipReason::UnknownField | SkipReason::InverseAssociation => {
                report.unavailable_fields.push(field_name(key).to_string());
            }
            SkipReason::UnavailableOperator(token) => report.unavailable_operators.push(token),
            SkipReason::ImplicitEqualityDisabled => report.unavailable_operators.push("eq".to_string()),
            SkipReason::ValueShape { operator, value } => report.invalid_values.push(InvalidOperatorValue {
                operator: operator.to_string(),
                value,
            }),
            SkipReason::RelationshipsDisabled | SkipReason::UnknownAssociation => {
                report.unavailable_joins.push(key.to_string());
            }
        }
        Ok(())
    }
}

/// Field part of a key as the client wrote it.
fn field_name(key: &str) -> &str {
    key.split_once('|').map_or(key, |(field, _)| field).trim()
}
