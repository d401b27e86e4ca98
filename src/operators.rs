//! The closed set of filter operators and the per-instance enabled set.
//!
//! Operators appear after the pipe in a filter key (`state|neq=Utah`). A key
//! without a pipe uses [`Operator::Eq`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Comparison, range, membership, null and sort operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equality (=)
    Eq,
    /// Not equal (!=)
    Neq,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// BETWEEN two values, inclusive
    Between,
    /// LIKE with the value wrapped in wildcards
    Like,
    /// IN (list of values)
    In,
    /// NOT IN (list of values)
    NotIn,
    /// IS NULL
    IsNull,
    /// IS NOT NULL
    IsNotNull,
    /// ORDER BY instead of a predicate
    Sort,
}

/// How many values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Scalar,
    List,
    Pair,
}

impl Operator {
    /// Every operator in canonical order.
    pub const ALL: [Self; 13] = [
        Self::Eq,
        Self::Neq,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::Between,
        Self::Like,
        Self::In,
        Self::NotIn,
        Self::IsNull,
        Self::IsNotNull,
        Self::Sort,
    ];

    /// Canonical lowercase token used in filter keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Between => "between",
            Self::Like => "like",
            Self::In => "in",
            Self::NotIn => "notin",
            Self::IsNull => "isnull",
            Self::IsNotNull => "isnotnull",
            Self::Sort => "sort",
        }
    }

    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::IsNull | Self::IsNotNull => Arity::None,
            Self::In | Self::NotIn => Arity::List,
            Self::Between => Arity::Pair,
            Self::Eq | Self::Neq | Self::Gt | Self::Gte | Self::Lt | Self::Lte | Self::Like | Self::Sort => {
                Arity::Scalar
            }
        }
    }
}

/// All operators in canonical order.
#[must_use]
pub fn all_operators() -> &'static [Operator] {
    &Operator::ALL
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a token is not one of the canonical operator names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperator(pub String);

impl fmt::Display for UnknownOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown operator '{}'", self.0)
    }
}

impl std::error::Error for UnknownOperator {}

impl FromStr for Operator {
    type Err = UnknownOperator;

    /// Matches the canonical lowercase token exactly. Callers handling user
    /// input lowercase it first.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == token)
            .ok_or_else(|| UnknownOperator(token.to_string()))
    }
}

/// The operators a single applicator instance accepts.
///
/// Starts with every operator; operators can be removed but never added back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorSet {
    enabled: BTreeSet<Operator>,
}

impl Default for OperatorSet {
    fn default() -> Self {
        Self::all()
    }
}

impl OperatorSet {
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: Operator::ALL.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self, operator: Operator) -> bool {
        self.enabled.contains(&operator)
    }

    /// Look up a canonical token among the enabled operators.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<Operator> {
        token.parse().ok().filter(|op| self.is_enabled(*op))
    }

    /// Remove an operator by token. Unknown tokens are ignored.
    pub fn remove(&mut self, token: &str) {
        if let Ok(operator) = token.parse::<Operator>() {
            self.enabled.remove(&operator);
        }
    }

    pub fn remove_operator(&mut self, operator: Operator) {
        self.enabled.remove(&operator);
    }

    /// Enabled operators in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Operator> + '_ {
        self.enabled.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.enabled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }
}
