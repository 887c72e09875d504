use super::filter::QueryFilter;
use super::ordering::OrderBy;

/// Represents a GROUP BY clause with optional HAVING conditions and result ordering
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    /// Fields to group by
    pub fields: Vec<String>,
    /// Optional HAVING conditions for filtering grouped results
    pub having: Option<Vec<QueryFilter>>,
    /// Ordering of the grouped rows
    pub order_by: Vec<OrderBy>,
    pub limit: Option<i64>,
}

impl GroupBy {
    /// Create a new GROUP BY clause with the specified fields
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            having: None,
            order_by: Vec::new(),
            limit: None,
        }
    }

    /// Create a GROUP BY clause with a single field
    pub fn single(field: impl Into<String>) -> Self {
        Self::new(vec![field.into()])
    }

    /// Add a single HAVING condition
    pub fn having(mut self, condition: QueryFilter) -> Self {
        self.having.get_or_insert_with(Vec::new).push(condition);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if this GROUP BY has HAVING conditions
    pub fn has_having(&self) -> bool {
        self.having.as_ref().is_some_and(|h| !h.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::sql_generation::SqlGenerator;
    use serde_json::json;

    #[test]
    fn test_group_by_single() {
        let group_by = GroupBy::single("region");

        assert_eq!(group_by.fields, vec!["region".to_string()]);
        assert!(!group_by.has_having());
        assert_eq!(SqlGenerator::build_group_by_clause(&group_by), "GROUP BY region");
    }

    #[test]
    fn test_group_by_having_chain() {
        let group_by = GroupBy::single("category")
            .having(QueryFilter::gt("COUNT(*)", json!(5)))
            .having(QueryFilter::lt("AVG(price)", json!(100)));

        assert!(group_by.has_having());
        let having = SqlGenerator::build_having_clause(&group_by);
        assert_eq!(having.sql(), "HAVING COUNT(*) > ? AND AVG(price) < ?");
        assert_eq!(having.params(), &[json!(5), json!(100)]);
    }

    #[test]
    fn test_has_having_empty() {
        let group_by = GroupBy {
            having: Some(vec![]),
            ..GroupBy::single("category")
        };
        assert!(!group_by.has_having());
        assert!(SqlGenerator::build_having_clause(&group_by).is_empty());
    }
}
