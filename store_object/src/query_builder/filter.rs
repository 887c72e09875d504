//! Filter predicates
//!
//! Field names in filters are trusted SQL text (quoted identifiers or aggregate
//! expressions chosen by code); only values become parameters.

use serde_json::{Map, Value};

/// Query condition operators
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    In,        // IN
    NotIn,     // NOT IN
    Between,   // BETWEEN ? AND ?
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Equal condition
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value.into()))
    }

    /// Not equal condition
    pub fn ne(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value.into()))
    }

    /// Greater than condition
    pub fn gt(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value.into()))
    }

    /// Greater than or equal condition
    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value.into()))
    }

    /// Less than condition
    pub fn lt(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value.into()))
    }

    /// Less than or equal condition
    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value.into()))
    }

    /// LIKE condition with a caller-supplied pattern
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    /// Substring match: `field LIKE '%term%'`
    pub fn contains(field: &str, term: &str) -> Self {
        Self::like(field, &format!("%{}%", term))
    }

    /// IN condition
    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    /// NOT IN condition
    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    /// BETWEEN condition (inclusive)
    pub fn between(field: &str, min: impl Into<Value>, max: impl Into<Value>) -> Self {
        Self::condition(
            field,
            QueryOperator::Between,
            Some(Value::Array(vec![min.into(), max.into()])),
        )
    }

    /// Range with optional bounds: BETWEEN, `>=`, `<=`, or nothing
    pub fn range(field: &str, min: Option<Value>, max: Option<Value>) -> Option<Self> {
        match (min, max) {
            (Some(min), Some(max)) => Some(Self::between(field, min, max)),
            (Some(min), None) => Some(Self::gte(field, min)),
            (None, Some(max)) => Some(Self::lte(field, max)),
            (None, None) => None,
        }
    }

    /// IS NULL condition
    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    /// IS NOT NULL condition
    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Map a loosely-shaped filter value to a predicate:
    /// array → IN, `{min, max}` object → range, string containing `%` → LIKE,
    /// anything else → equality. Null and empty objects produce no predicate.
    pub fn infer(field: &str, value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(values) => Some(Self::in_values(field, values.clone())),
            Value::Object(bounds) => {
                let bound = |key: &str| bounds.get(key).filter(|v| !v.is_null()).cloned();
                Self::range(field, bound("min"), bound("max"))
            }
            Value::String(s) if s.contains('%') => Some(Self::like(field, s)),
            other => Some(Self::eq(field, other.clone())),
        }
    }

    /// Apply [`QueryFilter::infer`] to every entry of a field → value map
    pub fn from_conditions(conditions: &Map<String, Value>) -> Vec<Self> {
        conditions
            .iter()
            .filter_map(|(field, value)| Self::infer(field, value))
            .collect()
    }
}

/// Collects optional filters, dropping the ones whose input is absent
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<QueryFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter unconditionally
    pub fn push(mut self, filter: QueryFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add a filter built from `value` when it is present
    pub fn when<T>(mut self, value: Option<T>, build: impl FnOnce(T) -> QueryFilter) -> Self {
        if let Some(value) = value {
            self.filters.push(build(value));
        }
        self
    }

    /// Add a filter produced by a builder that may decline
    pub fn maybe(mut self, filter: Option<QueryFilter>) -> Self {
        if let Some(filter) = filter {
            self.filters.push(filter);
        }
        self
    }

    /// Add an IN filter when the list is non-empty
    pub fn any_of(self, field: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        let values = values.iter().cloned().map(Value::String).collect();
        self.push(QueryFilter::in_values(field, values))
    }

    /// Add an OR group of substring matches over `fields` for each term
    pub fn keyword_any(self, fields: &[&str], terms: &[String]) -> Self {
        let matches: Vec<QueryFilter> = terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .flat_map(|term| fields.iter().map(move |f| QueryFilter::contains(f, term)))
            .collect();
        if matches.is_empty() {
            return self;
        }
        self.push(QueryFilter::or(matches))
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn into_filters(self) -> Vec<QueryFilter> {
        self.filters
    }
}
