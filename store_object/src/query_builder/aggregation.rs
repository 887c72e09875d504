/// SQL aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    /// COUNT(DISTINCT field)
    CountDistinct,
}

impl AggregateFunction {
    pub fn to_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Count | AggregateFunction::CountDistinct => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    pub fn is_distinct(&self) -> bool {
        matches!(self, AggregateFunction::CountDistinct)
    }
}

/// A column in a SELECT list. Names and expressions are trusted SQL text.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectField {
    /// SELECT *
    All,
    /// SELECT field
    Field(String),
    /// SELECT field AS alias
    FieldWithAlias { field: String, alias: String },
    /// SELECT <expression> AS alias, e.g. a CASE bucket
    Expression { sql: String, alias: String },
    /// SELECT COUNT(field) [AS alias]
    Aggregate {
        function: AggregateFunction,
        field: Option<String>, // None for COUNT(*)
        alias: Option<String>,
    },
}

impl SelectField {
    pub fn field(field: impl Into<String>) -> Self {
        SelectField::Field(field.into())
    }

    pub fn field_as(field: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::FieldWithAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    pub fn expression(sql: impl Into<String>, alias: impl Into<String>) -> Self {
        SelectField::Expression {
            sql: sql.into(),
            alias: alias.into(),
        }
    }

    pub fn aggregate(function: AggregateFunction, field: Option<String>) -> Self {
        SelectField::Aggregate {
            function,
            field,
            alias: None,
        }
    }

    /// COUNT(*)
    pub fn count_all() -> Self {
        Self::aggregate(AggregateFunction::Count, None)
    }

    pub fn count(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Count, Some(field.into()))
    }

    pub fn count_distinct(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::CountDistinct, Some(field.into()))
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Sum, Some(field.into()))
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Avg, Some(field.into()))
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Min, Some(field.into()))
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::aggregate(AggregateFunction::Max, Some(field.into()))
    }

    /// Add an alias to this select field
    pub fn with_alias(self, alias: impl Into<String>) -> Self {
        match self {
            SelectField::Field(field) | SelectField::FieldWithAlias { field, .. } => {
                SelectField::FieldWithAlias {
                    field,
                    alias: alias.into(),
                }
            }
            SelectField::Expression { sql, .. } => SelectField::Expression {
                sql,
                alias: alias.into(),
            },
            SelectField::Aggregate {
                function, field, ..
            } => SelectField::Aggregate {
                function,
                field,
                alias: Some(alias.into()),
            },
            SelectField::All => SelectField::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::sql_generation::SqlGenerator;

    #[test]
    fn test_aggregate_function_to_sql() {
        assert_eq!(AggregateFunction::Count.to_sql(), "COUNT");
        assert_eq!(AggregateFunction::CountDistinct.to_sql(), "COUNT");
        assert_eq!(AggregateFunction::Avg.to_sql(), "AVG");
        assert!(AggregateFunction::CountDistinct.is_distinct());
        assert!(!AggregateFunction::Sum.is_distinct());
    }

    #[test]
    fn test_with_alias_on_each_variant() {
        assert_eq!(
            SelectField::field("region").with_alias("label"),
            SelectField::field_as("region", "label")
        );
        assert_eq!(
            SelectField::count_all().with_alias("count"),
            SelectField::Aggregate {
                function: AggregateFunction::Count,
                field: None,
                alias: Some("count".to_string()),
            }
        );
        assert_eq!(SelectField::All.with_alias("ignored"), SelectField::All);
    }

    #[test]
    fn test_select_clause_rendering() {
        let clause = SqlGenerator::build_select_clause(&[
            SelectField::field("\"Platform\""),
            SelectField::count_all().with_alias("count"),
            SelectField::count_distinct("keyword").with_alias("keyword_count"),
            SelectField::sum("\"video views\"").with_alias("totalViews"),
            SelectField::expression("CASE WHEN MCN = 1 THEN 1 ELSE 0 END", "has_mcn"),
        ]);

        assert_eq!(
            clause,
            "\"Platform\", COUNT(*) AS count, COUNT(DISTINCT keyword) AS keyword_count, \
             SUM(\"video views\") AS totalViews, CASE WHEN MCN = 1 THEN 1 ELSE 0 END AS has_mcn"
        );
        assert_eq!(SqlGenerator::build_select_clause(&[]), "*");
    }
}
