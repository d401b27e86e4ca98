//! Read-only schema metadata consulted while resolving filters.
//!
//! The applicator never talks to a database to learn about fields. It asks a
//! [`SchemaProvider`] which answers with [`EntitySchema`] declarations: the
//! scalar fields of an entity, their declared [`FieldType`], and the
//! associations that can be joined.
//!
//! ```rust,ignore
//! let schema = Schema::new()
//!     .register(EntitySchema::from_entity::<artist::Entity>())
//!     .register(
//!         EntitySchema::from_entity::<performance::Entity>()
//!             .belongs_to("artist", "artist", "artist_id", "id"),
//!     );
//! ```

use indexmap::IndexMap;
use sea_orm::{ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, PrimaryKeyToColumn};
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Declared type of a scalar field. Drives value coercion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    /// Bound as a signed 64-bit integer, or unsigned above `i64::MAX`
    BigInteger,
    Float,
    Boolean,
    String,
    Date,
    DateTime,
    Uuid,
    /// Any other tag; values pass through as text
    Other(String),
}

impl FieldType {
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Integer => "integer",
            Self::BigInteger => "bigint",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldType {
    type Err = Infallible;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Ok(match tag.trim().to_lowercase().as_str() {
            "int" | "integer" | "smallint" => Self::Integer,
            "bigint" => Self::BigInteger,
            "float" | "double" => Self::Float,
            "bool" | "boolean" => Self::Boolean,
            "string" | "text" | "ascii_string" => Self::String,
            "date" | "date_immutable" => Self::Date,
            "datetime" | "datetime_immutable" | "datetimetz" | "datetimetz_immutable" | "timestamp" => {
                Self::DateTime
            }
            "uuid" | "guid" => Self::Uuid,
            _ => Self::Other(tag.trim().to_string()),
        })
    }
}

impl From<&ColumnType> for FieldType {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned => Self::Integer,
            ColumnType::BigInteger | ColumnType::BigUnsigned => Self::BigInteger,
            ColumnType::Float | ColumnType::Double => Self::Float,
            ColumnType::Boolean => Self::Boolean,
            // Enums compare against their string values
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text | ColumnType::Enum { .. } => {
                Self::String
            }
            ColumnType::Date => Self::Date,
            ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => Self::DateTime,
            ColumnType::Uuid => Self::Uuid,
            other => Self::Other(format!("{other:?}").to_lowercase()),
        }
    }
}

/// A filterable column on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarField {
    /// Name used in filter keys
    pub name: String,
    /// Column name in the table
    pub column: String,
    pub field_type: FieldType,
}

/// Which side of a relationship an association describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// The local column holds the target's identifier
    BelongsTo,
    HasOne,
    HasMany,
}

/// A joinable relationship from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Field name on the source entity (e.g. "artist"); also the join alias
    pub name: String,
    /// Target entity name
    pub target: String,
    pub kind: AssociationKind,
    /// Column on the source table used in the join condition
    pub local_column: String,
    /// Column on the target table used in the join condition
    pub foreign_column: String,
}

impl Association {
    /// True when the local column stores the target identifier, so the
    /// association itself can be compared against an identifier value.
    #[must_use]
    pub fn is_owning_side(&self) -> bool {
        self.kind == AssociationKind::BelongsTo
    }
}

/// What a field name resolves to on an entity. Never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMetadata<'a> {
    Scalar(&'a ScalarField),
    Association(&'a Association),
}

/// Declaration of one entity: table, primary key, fields and associations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    name: String,
    table: String,
    primary_key: String,
    fields: IndexMap<String, ScalarField>,
    associations: IndexMap<String, Association>,
}

impl EntitySchema {
    /// Entity with the given name and table. The primary key defaults to `id`.
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: "id".to_string(),
            fields: IndexMap::new(),
            associations: IndexMap::new(),
        }
    }

    /// Build the scalar part of a schema from a Sea-ORM entity.
    ///
    /// The entity name and table are the entity's table name, field names
    /// are the column names, and types come from each column's `ColumnType`.
    /// Associations are not derived; add them with [`Self::belongs_to`],
    /// [`Self::has_one`] or [`Self::has_many`].
    #[must_use]
    pub fn from_entity<E: EntityTrait>() -> Self {
        let table = E::default().table_name().to_string();
        let mut schema = Self::new(table.clone(), table);

        if let Some(key) = E::PrimaryKey::iter().next() {
            schema.primary_key = IdenStatic::as_str(&key.into_column()).to_string();
        }

        for column in E::Column::iter() {
            let name = IdenStatic::as_str(&column).to_string();
            let field_type = FieldType::from(column.def().get_column_type());
            schema = schema.field(name, field_type);
        }

        schema
    }

    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Add a scalar field whose column has the same name.
    #[must_use]
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        let column = name.clone();
        self.field_as(name, column, field_type)
    }

    /// Add a scalar field stored under a different column name.
    #[must_use]
    pub fn field_as(mut self, name: impl Into<String>, column: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        self.associations.shift_remove(&name);
        self.fields.insert(
            name.clone(),
            ScalarField {
                name,
                column: column.into(),
                field_type,
            },
        );
        self
    }

    #[must_use]
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        self.association(AssociationKind::BelongsTo, name, target, local_column, foreign_column)
    }

    #[must_use]
    pub fn has_one(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        self.association(AssociationKind::HasOne, name, target, local_column, foreign_column)
    }

    #[must_use]
    pub fn has_many(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        self.association(AssociationKind::HasMany, name, target, local_column, foreign_column)
    }

    fn association(
        mut self,
        kind: AssociationKind,
        name: impl Into<String>,
        target: impl Into<String>,
        local_column: impl Into<String>,
        foreign_column: impl Into<String>,
    ) -> Self {
        let name = name.into();
        // A name is either a column or an association
        self.fields.shift_remove(&name);
        self.associations.insert(
            name.clone(),
            Association {
                name,
                target: target.into(),
                kind,
                local_column: local_column.into(),
                foreign_column: foreign_column.into(),
            },
        );
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    /// Declared type of the primary identifier, if it is a declared field.
    #[must_use]
    pub fn primary_key_type(&self) -> Option<&FieldType> {
        self.fields.get(&self.primary_key).map(|field| &field.field_type)
    }

    #[must_use]
    pub fn scalar_field(&self, name: &str) -> Option<&ScalarField> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn association_named(&self, name: &str) -> Option<&Association> {
        self.associations.get(name)
    }

    /// Resolve a field name as a column first, then as an association.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<FieldMetadata<'_>> {
        self.scalar_field(name)
            .map(FieldMetadata::Scalar)
            .or_else(|| self.association_named(name).map(FieldMetadata::Association))
    }
}

/// Source of entity metadata.
pub trait SchemaProvider {
    fn entity(&self, name: &str) -> Option<&EntitySchema>;

    fn field_metadata(&self, entity: &str, field: &str) -> Option<FieldMetadata<'_>> {
        self.entity(entity)?.resolve(field)
    }

    fn primary_identifier_type(&self, entity: &str) -> Option<&FieldType> {
        self.entity(entity)?.primary_key_type()
    }
}

/// In-memory registry of entity declarations.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: HashMap<String, EntitySchema>,
}

impl Schema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity, replacing any previous declaration with that name.
    #[must_use]
    pub fn register(mut self, entity: EntitySchema) -> Self {
        self.insert(entity);
        self
    }

    pub fn insert(&mut self, entity: EntitySchema) {
        self.entities.insert(entity.name.clone(), entity);
    }
}

impl SchemaProvider for Schema {
    fn entity(&self, name: &str) -> Option<&EntitySchema> {
        self.entities.get(name)
    }
}
