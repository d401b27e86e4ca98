use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::FilterError;

/// Entity name -> alias used for it in the constructed query.
pub type EntityAliasMap = BTreeMap<String, String>;

/// Ordered filters for one request.
///
/// Keys are filter keys (`state`, `state|neq`, `id|between`). Values are the
/// raw text to filter by, or a nested map to filter through an association.
///
/// ```json
/// {
///     "state|neq": "Utah",
///     "artist": { "name|like": "Dead" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap(IndexMap<String, FilterEntry>);

/// A single filter value: raw text, or nested filters for an association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterEntry {
    Value(String),
    Nested(FilterMap),
}

impl FilterMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, entry: impl Into<FilterEntry>) -> Self {
        self.insert(key, entry);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<FilterEntry>) {
        self.0.insert(key.into(), entry.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterEntry> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterEntry)> {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON object into filters. See the `TryFrom<serde_json::Value>`
    /// impl for how non-string values are handled.
    ///
    /// # Errors
    /// Returns [`FilterError::MalformedFilter`] if the text is not JSON or is
    /// not an object of filters.
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| FilterError::malformed(format!("filter is not valid JSON: {e}")))?;
        Self::try_from(value)
    }
}

impl TryFrom<serde_json::Value> for FilterMap {
    type Error = FilterError;

    /// Objects become nested maps, strings stay as-is, numbers and booleans
    /// use their textual form, and arrays of scalars become a comma list so
    /// `{"id|in": [1, 3]}` reads like `id|in=1,3`. `null` entries are dropped.
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let serde_json::Value::Object(object) = value else {
            return Err(FilterError::malformed("filter must be a JSON object"));
        };

        let mut filters = Self::new();
        for (key, value) in object {
            let entry = match value {
                serde_json::Value::Null => continue,
                serde_json::Value::Object(_) => FilterEntry::Nested(Self::try_from(value)?),
                serde_json::Value::Array(items) => {
                    let parts = items
                        .iter()
                        .map(|item| {
                            scalar_text(item).ok_or_else(|| {
                                FilterError::malformed(format!("filter '{key}' must be a list of scalar values"))
                            })
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    FilterEntry::Value(parts.join(","))
                }
                other => match scalar_text(&other) {
                    Some(text) => FilterEntry::Value(text),
                    None => continue,
                },
            };
            filters.insert(key, entry);
        }
        Ok(filters)
    }
}

fn scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl<K, V> FromIterator<(K, V)> for FilterMap
where
    K: Into<String>,
    V: Into<FilterEntry>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Self::new();
        for (key, entry) in iter {
            filters.insert(key, entry);
        }
        filters
    }
}

impl From<&str> for FilterEntry {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for FilterEntry {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<FilterMap> for FilterEntry {
    fn from(value: FilterMap) -> Self {
        Self::Nested(value)
    }
}

/// Which fields external filters may target.
///
/// Filters on fields outside an explicit list are ignored, not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterableFields {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl FilterableFields {
    #[must_use]
    pub fn allows(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(fields) => fields.contains(field),
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for FilterableFields {
    /// A list containing `*` is the wildcard.
    fn from(fields: Vec<S>) -> Self {
        let fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        if fields.contains("*") {
            Self::All
        } else {
            Self::Only(fields)
        }
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for FilterableFields {
    fn from(fields: [S; N]) -> Self {
        Self::from(Vec::from(fields))
    }
}
