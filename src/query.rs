//! The query being built.
//!
//! [`QueryTarget`] is the seam between filter resolution and a query builder.
//! It is implemented for Sea-ORM's [`SelectStatement`], which renders every
//! value as a bound parameter, and for [`QueryPlan`], which only records the
//! instructions it receives.

use sea_orm::sea_query::{Alias, Asterisk, Expr, JoinType, Order, Query, SelectStatement, SimpleExpr, Value};
use std::fmt;

use crate::decode::{Scalar, SortDirection};

/// `alias.column`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    pub alias: String,
    pub column: String,
}

impl ColumnPath {
    pub fn new(alias: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            column: column.into(),
        }
    }

    fn expr(&self) -> Expr {
        Expr::col((Alias::new(&self.alias), Alias::new(&self.column)))
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.alias, self.column)
    }
}

/// Condition applied to a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Scalar),
    Neq(Scalar),
    Gt(Scalar),
    Gte(Scalar),
    Lt(Scalar),
    Lte(Scalar),
    Between(Scalar, Scalar),
    /// Pattern already contains its wildcards
    Like(String),
    In(Vec<Scalar>),
    NotIn(Vec<Scalar>),
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: ColumnPath,
    pub comparison: Comparison,
}

impl Predicate {
    /// Render as a sea-query expression. Values stay as `Value`s and are bound
    /// by the query builder, never written into the SQL text.
    #[must_use]
    pub fn into_expr(self) -> SimpleExpr {
        let col = self.column.expr();
        match self.comparison {
            Comparison::Eq(v) => col.eq(Value::from(v)),
            Comparison::Neq(v) => col.ne(Value::from(v)),
            Comparison::Gt(v) => col.gt(Value::from(v)),
            Comparison::Gte(v) => col.gte(Value::from(v)),
            Comparison::Lt(v) => col.lt(Value::from(v)),
            Comparison::Lte(v) => col.lte(Value::from(v)),
            Comparison::Between(low, high) => col.between(Value::from(low), Value::from(high)),
            Comparison::Like(pattern) => col.like(pattern),
            Comparison::In(values) => col.is_in(values.into_iter().map(Value::from)),
            Comparison::NotIn(values) => col.is_not_in(values.into_iter().map(Value::from)),
            Comparison::IsNull => col.is_null(),
            Comparison::IsNotNull => col.is_not_null(),
        }
    }
}

/// Inner join of an association's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Alias of the entity the association starts from
    pub parent_alias: String,
    pub table: String,
    pub alias: String,
    /// Column on the parent side of the join condition
    pub local_column: String,
    /// Column on the joined side of the join condition
    pub foreign_column: String,
}

/// Anything the applicator can append filters to.
pub trait QueryTarget {
    /// Start a query selecting every column of `table` under `alias`.
    fn select_from(table: &str, alias: &str) -> Self
    where
        Self: Sized;

    fn add_join(&mut self, join: JoinSpec);

    fn add_predicate(&mut self, predicate: Predicate);

    fn order_by_column(&mut self, column: ColumnPath, direction: SortDirection);
}

impl QueryTarget for SelectStatement {
    fn select_from(table: &str, alias: &str) -> Self {
        Query::select()
            .column((Alias::new(alias), Asterisk))
            .from_as(Alias::new(table), Alias::new(alias))
            .to_owned()
    }

    fn add_join(&mut self, join: JoinSpec) {
        let on = Expr::col((Alias::new(&join.parent_alias), Alias::new(&join.local_column)))
            .equals((Alias::new(&join.alias), Alias::new(&join.foreign_column)));
        self.join_as(JoinType::InnerJoin, Alias::new(&join.table), Alias::new(&join.alias), on);
    }

    fn add_predicate(&mut self, predicate: Predicate) {
        self.and_where(predicate.into_expr());
    }

    fn order_by_column(&mut self, column: ColumnPath, direction: SortDirection) {
        self.order_by((Alias::new(&column.alias), Alias::new(&column.column)), Order::from(direction));
    }
}

/// Recorded query instructions, in the order they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPlan {
    pub table: String,
    pub alias: String,
    pub joins: Vec<JoinSpec>,
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<(ColumnPath, SortDirection)>,
}

impl QueryPlan {
    /// Replay the plan onto a sea-query select.
    #[must_use]
    pub fn to_select(&self) -> SelectStatement {
        let mut select = SelectStatement::select_from(&self.table, &self.alias);
        for join in &self.joins {
            select.add_join(join.clone());
        }
        for predicate in &self.predicates {
            select.add_predicate(predicate.clone());
        }
        for (column, direction) in &self.order_by {
            select.order_by_column(column.clone(), *direction);
        }
        select
    }
}

impl QueryTarget for QueryPlan {
    fn select_from(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
            ..Self::default()
        }
    }

    fn add_join(&mut self, join: JoinSpec) {
        self.joins.push(join);
    }

    fn add_predicate(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    fn order_by_column(&mut self, column: ColumnPath, direction: SortDirection) {
        self.order_by.push((column, direction));
    }
}
