//! # filtercrate
//!
//! Translate flat, string-encoded filters such as HTTP query parameters into
//! parameterized Sea-ORM queries.
//!
//! ```text
//! state|neq=Utah            "entity"."state" <> ?
//! id|between=3,5            "entity"."id" BETWEEN ? AND ?
//! artist[name|like]=Dead    INNER JOIN "artist" ... WHERE "artist"."name" LIKE ?
//! city|sort=asc             ORDER BY "entity"."city" ASC
//! ```
//!
//! Entities are described by a [`Schema`], filters arrive as a [`FilterMap`],
//! and an [`Applicator`] produces a [`sea_orm::sea_query::SelectStatement`]
//! (or any other [`QueryTarget`]). A [`FilterValidator`] reports the entries
//! the applicator would skip.

pub mod applicator;
pub mod config;
pub mod decode;
pub mod errors;
pub mod models;
pub mod operators;
pub mod query;
pub mod resolution;
pub mod schema;
pub mod validation;

pub use applicator::{Applicator, DEFAULT_ENTITY_ALIAS};
pub use config::{FilterConfig, FilterSettings};
pub use decode::{FilterValue, Scalar, SortDirection, decode_key, decode_value};
pub use errors::FilterError;
pub use models::{EntityAliasMap, FilterEntry, FilterMap, FilterableFields};
pub use operators::{Operator, OperatorSet, all_operators};
pub use query::{QueryPlan, QueryTarget};
pub use schema::{EntitySchema, FieldType, Schema, SchemaProvider};
pub use validation::{FilterValidator, ValidationReport};
