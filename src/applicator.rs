//! # Applicator
//!
//! Applies a [`FilterMap`] to a query rooted at one entity.
//!
//! String entries become predicates (or an order-by for `sort`) on the entity
//! being filtered. Nested maps name an association: the association's table
//! is inner joined under the association name, and the nested filters are
//! applied to it. Relationship filters are off until
//! [`Applicator::enable_relationships`] is called.
//!
//! ```rust,ignore
//! let filters = FilterMap::new()
//!     .with("state|neq", "Utah")
//!     .with("artist", FilterMap::new().with("name|like", "Dead"));
//!
//! let query: SelectStatement = Applicator::new(&schema, "performance")
//!     .enable_relationships()
//!     .apply(&filters)?;
//! // SELECT "entity".* FROM "performance" AS "entity"
//! //   INNER JOIN "artist" AS "artist" ON "entity"."artist_id" = "artist"."id"
//! //   WHERE "entity"."state" <> ? AND "artist"."name" LIKE ?
//! ```
//!
//! Entries that cannot be applied (unknown fields, removed operators, fields
//! outside the filterable list, malformed lists) are skipped and logged at
//! debug level. Use [`Applicator::validate`] to report them to the caller.

use std::collections::HashMap;

use crate::config::{FilterConfig, FilterSettings};
use crate::errors::FilterError;
use crate::models::{EntityAliasMap, FilterEntry, FilterMap, FilterableFields};
use crate::operators::Operator;
use crate::query::{ColumnPath, JoinSpec, Predicate, QueryTarget};
use crate::resolution::{Instruction, Resolution, resolve_filter, resolve_relationship};
use crate::schema::{EntitySchema, SchemaProvider};
use crate::validation::{FilterValidator, ValidationReport};

/// Alias of the root entity unless configured otherwise.
pub const DEFAULT_ENTITY_ALIAS: &str = "entity";

pub struct Applicator<'s, S: SchemaProvider + ?Sized> {
    schema: &'s S,
    root: String,
    entity_alias: String,
    config: FilterConfig,
    alias_map: EntityAliasMap,
}

impl<'s, S: SchemaProvider + ?Sized> Applicator<'s, S> {
    pub fn new(schema: &'s S, root_entity: impl Into<String>) -> Self {
        Self {
            schema,
            root: root_entity.into(),
            entity_alias: DEFAULT_ENTITY_ALIAS.to_string(),
            config: FilterConfig::default(),
            alias_map: EntityAliasMap::new(),
        }
    }

    /// Stop accepting an operator. Unknown tokens and repeated removals are
    /// ignored.
    #[must_use]
    pub fn remove_operator(mut self, token: &str) -> Self {
        self.config.operators.remove(token);
        self
    }

    #[must_use]
    pub fn remove_operators<T: AsRef<str>>(mut self, tokens: impl IntoIterator<Item = T>) -> Self {
        for token in tokens {
            self.config.operators.remove(token.as_ref());
        }
        self
    }

    #[must_use]
    pub fn enable_relationships(mut self) -> Self {
        self.config.relationships = true;
        self
    }

    /// # Errors
    /// Returns [`FilterError::Configuration`] if the alias is empty.
    pub fn with_entity_alias(mut self, alias: impl Into<String>) -> Result<Self, FilterError> {
        let alias = alias.into();
        if alias.is_empty() {
            return Err(FilterError::configuration("Entity alias cannot be empty"));
        }
        self.entity_alias = alias;
        Ok(self)
    }

    /// Map external field names to schema field names.
    #[must_use]
    pub fn with_field_aliases<K, V>(mut self, aliases: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.config.field_aliases = aliases.into_iter().map(|(k, v)| (k.into(), v.into())).collect::<HashMap<_, _>>();
        self
    }

    #[must_use]
    pub fn with_filterable_fields(mut self, fields: impl Into<FilterableFields>) -> Self {
        self.config.filterable_fields = fields.into();
        self
    }

    /// # Errors
    /// Returns [`FilterError::Configuration`] if the settings name an empty
    /// entity alias.
    pub fn with_settings(mut self, settings: &FilterSettings) -> Result<Self, FilterError> {
        settings.apply_to(&mut self.config);
        match &settings.entity_alias {
            Some(alias) => self.with_entity_alias(alias.clone()),
            None => Ok(self),
        }
    }

    #[must_use]
    pub fn entity_alias(&self) -> &str {
        &self.entity_alias
    }

    #[must_use]
    pub fn enabled_operators(&self) -> Vec<Operator> {
        self.config.operators.iter().collect()
    }

    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Entity name -> alias for every entity a filter or join touched.
    #[must_use]
    pub fn entity_alias_map(&self) -> &EntityAliasMap {
        &self.alias_map
    }

    /// Build a query selecting the root entity with `filters` applied.
    ///
    /// # Errors
    /// [`FilterError::UnknownEntity`] if the root entity or a joined target is
    /// missing from the schema, [`FilterError::InvalidValue`] if a value does
    /// not fit its field's type.
    pub fn apply<Q: QueryTarget>(&mut self, filters: &FilterMap) -> Result<Q, FilterError> {
        let root = self.root_schema()?;
        let mut query = Q::select_from(root.table(), &self.entity_alias);
        self.apply_to(&mut query, filters)?;
        Ok(query)
    }

    /// Append `filters` to an existing query whose root entity is selected
    /// under this applicator's entity alias.
    ///
    /// # Errors
    /// See [`Self::apply`].
    pub fn apply_to<Q: QueryTarget>(&mut self, query: &mut Q, filters: &FilterMap) -> Result<(), FilterError> {
        let root = self.root_schema()?;
        let alias = self.entity_alias.clone();
        self.apply_map(query, filters, root, &alias)
    }

    /// Report every entry that [`Self::apply`] would skip or reject.
    ///
    /// # Errors
    /// [`FilterError::UnknownEntity`] if the schema is incomplete.
    pub fn validate(&self, filters: &FilterMap) -> Result<ValidationReport, FilterError> {
        FilterValidator::new(self.schema, self.root.clone())
            .with_config(self.config.clone())
            .validate(filters)
    }

    fn root_schema(&self) -> Result<&'s EntitySchema, FilterError> {
        let schema = self.schema;
        schema
            .entity(&self.root)
            .ok_or_else(|| FilterError::unknown_entity(&self.root))
    }

    fn apply_map<Q: QueryTarget>(
        &mut self,
        query: &mut Q,
        filters: &FilterMap,
        entity: &EntitySchema,
        alias: &str,
    ) -> Result<(), FilterError> {
        for (key, entry) in filters.iter() {
            match entry {
                FilterEntry::Value(raw) => self.apply_filter(query, key, raw, entity, alias)?,
                FilterEntry::Nested(nested) => self.apply_relationship(query, key, nested, entity, alias)?,
            }
        }
        Ok(())
    }

    fn apply_filter<Q: QueryTarget>(
        &mut self,
        query: &mut Q,
        key: &str,
        raw: &str,
        entity: &EntitySchema,
        alias: &str,
    ) -> Result<(), FilterError> {
        let filter = match resolve_filter(self.schema, &self.config, entity, key, raw)? {
            Resolution::Applied(filter) => filter,
            Resolution::Skipped(reason) => {
                tracing::debug!(entity = entity.name(), key, reason = %reason, "Skipping filter");
                return Ok(());
            }
        };

        self.alias_map.insert(entity.name().to_string(), alias.to_string());
        let column = ColumnPath::new(alias, filter.column);
        tracing::trace!(column = %column, operator = %filter.operator, "Applying filter");

        match filter.instruction {
            Instruction::Where(comparison) => query.add_predicate(Predicate { column, comparison }),
            Instruction::OrderBy(direction) => query.order_by_column(column, direction),
        }
        Ok(())
    }

    fn apply_relationship<Q: QueryTarget>(
        &mut self,
        query: &mut Q,
        key: &str,
        nested: &FilterMap,
        entity: &EntitySchema,
        alias: &str,
    ) -> Result<(), FilterError> {
        let association = match resolve_relationship(&self.config, entity, key) {
            Resolution::Applied(association) => association,
            Resolution::Skipped(reason) => {
                tracing::debug!(entity = entity.name(), key, reason = %reason, "Skipping relationship filter");
                return Ok(());
            }
        };

        let schema = self.schema;
        let target = schema
            .entity(&association.target)
            .ok_or_else(|| FilterError::unknown_entity(&association.target))?;

        tracing::trace!(
            from = alias,
            table = target.table(),
            alias = %association.name,
            "Joining association"
        );
        query.add_join(JoinSpec {
            parent_alias: alias.to_string(),
            table: target.table().to_string(),
            alias: association.name.clone(),
            local_column: association.local_column.clone(),
            foreign_column: association.foreign_column.clone(),
        });
        self.alias_map.insert(entity.name().to_string(), alias.to_string());

        self.apply_map(query, nested, target, &association.name)
    }
}
