//! # Errors
//!
//! Only a few situations are errors. Unknown fields, unknown associations,
//! disabled operators and non-filterable fields are skipped silently by the
//! [`Applicator`](crate::Applicator); run the
//! [`FilterValidator`](crate::FilterValidator) first to report them.
//!
//! [`FilterError`] implements axum's `IntoResponse`. Client mistakes map to
//! 400 or 422 with a JSON body; configuration and schema problems map to a
//! sanitized 500 and are logged with `tracing`:
//!
//! ```rust,ignore
//! async fn list(Query(params): Query<ListParams>) -> Result<Json<Vec<Performance>>, FilterError> {
//!     let filters = FilterMap::from_json_str(&params.filter)?;
//!     let mut applicator = Applicator::new(&SCHEMA, "performance");
//!     applicator.validate(&filters)?.into_result()?;
//!     let query: SelectStatement = applicator.apply(&filters)?;
//!     // ...
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::schema::FieldType;
use crate::validation::ValidationReport;

#[derive(Debug)]
pub enum FilterError {
    /// Invalid applicator configuration (e.g. an empty entity alias)
    Configuration { message: String },

    /// The schema has no entity with this name
    UnknownEntity { entity: String },

    /// A value could not be coerced to the declared type of its field
    InvalidValue {
        field: String,
        field_type: FieldType,
        value: String,
    },

    /// Input that is not a filter map at all
    MalformedFilter { message: String },

    /// Returned by [`ValidationReport::into_result`]
    ValidationFailed(ValidationReport),
}

impl FilterError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        Self::UnknownEntity { entity: entity.into() }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedFilter {
            message: message.into(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::Configuration { .. } | Self::UnknownEntity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidValue { .. } | Self::MalformedFilter { .. } => StatusCode::BAD_REQUEST,
            Self::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    /// Message that is safe to send to clients.
    fn user_message(&self) -> String {
        match self {
            Self::Configuration { .. } | Self::UnknownEntity { .. } => {
                "Filtering is not available for this resource".to_string()
            }
            Self::InvalidValue { field_type, value, .. } => {
                format!("field type '{field_type}' must receive a valid value, value given: '{value}'")
            }
            Self::MalformedFilter { message } => message.clone(),
            Self::ValidationFailed(report) => report.message().unwrap_or_else(|| "Invalid filter".to_string()),
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Configuration { message } => {
                tracing::error!(detail = %message, "Filter configuration error");
            }
            Self::UnknownEntity { entity } => {
                tracing::error!(entity = %entity, "Filter applied to an entity missing from the schema");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "Filter rejected"
                );
            }
        }
    }
}

/// Error body sent to clients
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

impl IntoResponse for FilterError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match &self {
            Self::ValidationFailed(report) => ErrorResponse {
                error: "Invalid filter".to_string(),
                details: Some(report.errors()),
            },
            _ => ErrorResponse {
                error: self.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { message } => write!(f, "{message}"),
            Self::UnknownEntity { entity } => write!(f, "entity '{entity}' is not declared in the schema"),
            Self::InvalidValue { field, .. } => write!(f, "{} (field '{field}')", self.user_message()),
            Self::MalformedFilter { message } => write!(f, "{message}"),
            Self::ValidationFailed(_) => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for FilterError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_is_internal() {
        let err = FilterError::configuration("Entity alias cannot be empty");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Entity alias cannot be empty");
        assert_eq!(err.user_message(), "Filtering is not available for this resource");
    }

    #[test]
    fn test_invalid_value_is_bad_request() {
        let err = FilterError::InvalidValue {
            field: "performance_date".to_string(),
            field_type: FieldType::DateTime,
            value: "soon".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "field type 'datetime' must receive a valid value, value given: 'soon' (field 'performance_date')"
        );
    }

    #[test]
    fn test_validation_failure_is_unprocessable() {
        let report = ValidationReport {
            unavailable_fields: vec!["bogus".to_string()],
            ..ValidationReport::default()
        };
        let err = FilterError::ValidationFailed(report);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.to_string(), "invalid field(s): bogus");
    }

    #[test]
    fn test_into_response_status() {
        let response = FilterError::malformed("filter must be a JSON object").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = FilterError::unknown_entity("ghost").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_trait() {
        let err = FilterError::malformed("bad");
        let _: &dyn std::error::Error = &err;
    }
}
