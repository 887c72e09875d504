//! Sort direction and ORDER BY items

use crate::validation::sanitize_identifier;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Parse `asc`/`desc` in any case
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("asc") {
            Some(SortOrder::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }
}

/// One ORDER BY item; the column is trusted SQL text
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub order: SortOrder,
}

impl OrderBy {
    pub fn new(column: impl Into<String>, order: SortOrder) -> Self {
        Self {
            column: column.into(),
            order,
        }
    }

    pub fn asc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Asc)
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self::new(column, SortOrder::Desc)
    }

    /// Build from user input: the column keeps only `[A-Za-z0-9_]` and the
    /// direction defaults to DESC. Returns `None` when nothing usable remains.
    pub fn sanitized(column: &str, order: Option<&str>) -> Option<Self> {
        let column = sanitize_identifier(column);
        if column.is_empty() {
            return None;
        }
        let order = order.and_then(SortOrder::parse).unwrap_or(SortOrder::Desc);
        Some(Self::new(column, order))
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column, self.order.to_sql())
    }
}
