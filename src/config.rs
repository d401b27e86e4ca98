//! Per-instance filter configuration.
//!
//! [`FilterConfig`] is what the applicator and the validator consult while
//! resolving filters. [`FilterSettings`] is its serializable counterpart, for
//! services that keep filter rules next to the rest of their configuration:
//!
//! ```json
//! {
//!     "entity_alias": "row",
//!     "relationships": true,
//!     "removed_operators": ["like"],
//!     "field_aliases": { "province": "state" },
//!     "filterable_fields": ["state", "city", "artist"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::FilterError;
use crate::models::FilterableFields;
use crate::operators::{Operator, OperatorSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub operators: OperatorSet,
    /// External field name -> schema field name
    pub field_aliases: HashMap<String, String>,
    pub filterable_fields: FilterableFields,
    /// Off by default; nested maps are ignored until enabled
    pub relationships: bool,
}

impl FilterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn without_operator(mut self, token: &str) -> Self {
        self.operators.remove(token);
        self
    }

    #[must_use]
    pub fn with_relationships(mut self, enabled: bool) -> Self {
        self.relationships = enabled;
        self
    }

    #[must_use]
    pub fn with_field_aliases<K, V>(mut self, aliases: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.field_aliases = aliases.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    #[must_use]
    pub fn with_filterable_fields(mut self, fields: impl Into<FilterableFields>) -> Self {
        self.filterable_fields = fields.into();
        self
    }
}

/// Serializable filter settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSettings {
    pub entity_alias: Option<String>,
    pub relationships: bool,
    pub removed_operators: Vec<String>,
    pub field_aliases: HashMap<String, String>,
    /// `None` or a list containing `*` allows every field
    pub filterable_fields: Option<Vec<String>>,
}

impl FilterSettings {
    /// # Errors
    /// Returns [`FilterError::Configuration`] if the JSON does not describe
    /// filter settings.
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        serde_json::from_str(json).map_err(|e| FilterError::configuration(format!("invalid filter settings: {e}")))
    }

    /// Apply everything except the entity alias onto `config`.
    pub(crate) fn apply_to(&self, config: &mut FilterConfig) {
        for token in &self.removed_operators {
            if token.parse::<Operator>().is_err() {
                tracing::debug!(operator = %token, "Removing an operator that does not exist");
            }
            config.operators.remove(token);
        }
        if self.relationships {
            config.relationships = true;
        }
        config
            .field_aliases
            .extend(self.field_aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        if let Some(fields) = &self.filterable_fields {
            config.filterable_fields = FilterableFields::from(fields.clone());
        }
    }
}
