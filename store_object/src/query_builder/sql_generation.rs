//! Query builder utilities
//!
//! This module turns filters, ordering and selections into SQLite text with
//! positional `?` placeholders.

use crate::query_builder::aggregation::SelectField;
use crate::query_builder::filter::{LogicalOperator, QueryCondition, QueryFilter, QueryOperator};
use crate::query_builder::fragment::SqlFragment;
use crate::query_builder::grouping::GroupBy;
use crate::query_builder::ordering::OrderBy;
use serde_json::Value;

pub struct SqlGenerator;

impl SqlGenerator {
    /// Build the condition list of a WHERE clause (without the keyword).
    /// Conditions are AND-joined; no conditions yields an empty fragment.
    pub fn build_where_clause(conditions: &[QueryFilter]) -> SqlFragment {
        let mut values = Vec::new();

        let conditions_sql = conditions
            .iter()
            .map(|condition| Self::build_condition_sql(condition, &mut values))
            .collect::<Vec<_>>()
            .join(" AND ");

        SqlFragment::trusted(conditions_sql, values)
    }

    fn build_condition_sql(filter: &QueryFilter, values: &mut Vec<Value>) -> String {
        match filter {
            QueryFilter::Condition(condition) => Self::build_single_condition_sql(condition, values),
            QueryFilter::Group { filters, .. } if filters.is_empty() => "1=1".to_string(),
            QueryFilter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let group_conditions = filters
                    .iter()
                    .map(|f| Self::build_condition_sql(f, values))
                    .collect::<Vec<_>>()
                    .join(operator_str);

                format!("({})", group_conditions)
            }
        }
    }

    fn binary(field: &str, op: &str, value: &Option<Value>, values: &mut Vec<Value>) -> String {
        match value {
            Some(value) => {
                values.push(value.clone());
                format!("{} {} ?", field, op)
            }
            None => "1=0".to_string(), // Invalid condition
        }
    }

    fn list(field: &str, op: &str, items: &[Value], values: &mut Vec<Value>) -> String {
        let placeholders = vec!["?"; items.len()].join(", ");
        values.extend(items.iter().cloned());
        format!("{} {} ({})", field, op, placeholders)
    }

    fn build_single_condition_sql(condition: &QueryCondition, values: &mut Vec<Value>) -> String {
        let field = &condition.field;

        match &condition.operator {
            QueryOperator::Eq => match &condition.value {
                Some(Value::Null) | None => format!("{} IS NULL", field),
                value => Self::binary(field, "=", value, values),
            },
            QueryOperator::Ne => match &condition.value {
                Some(Value::Null) | None => format!("{} IS NOT NULL", field),
                value => Self::binary(field, "!=", value, values),
            },
            QueryOperator::Gt => Self::binary(field, ">", &condition.value, values),
            QueryOperator::Gte => Self::binary(field, ">=", &condition.value, values),
            QueryOperator::Lt => Self::binary(field, "<", &condition.value, values),
            QueryOperator::Lte => Self::binary(field, "<=", &condition.value, values),
            QueryOperator::Like => Self::binary(field, "LIKE", &condition.value, values),
            QueryOperator::In => match &condition.value {
                Some(Value::Array(items)) if !items.is_empty() => {
                    Self::list(field, "IN", items, values)
                }
                _ => "1=0".to_string(), // Empty IN clause
            },
            QueryOperator::NotIn => match &condition.value {
                Some(Value::Array(items)) if !items.is_empty() => {
                    Self::list(field, "NOT IN", items, values)
                }
                _ => "1=1".to_string(), // Empty NOT IN clause
            },
            QueryOperator::Between => match &condition.value {
                Some(Value::Array(bounds)) if bounds.len() == 2 => {
                    values.extend(bounds.iter().cloned());
                    format!("{} BETWEEN ? AND ?", field)
                }
                _ => "1=0".to_string(),
            },
            QueryOperator::IsNull => format!("{} IS NULL", field),
            QueryOperator::IsNotNull => format!("{} IS NOT NULL", field),
        }
    }

    /// Build ORDER BY clause
    pub fn build_order_clause(order_by: &[OrderBy]) -> String {
        if order_by.is_empty() {
            return "".to_string();
        }

        let order_items: Vec<String> = order_by.iter().map(OrderBy::to_sql).collect();

        format!("ORDER BY {}", order_items.join(", "))
    }

    /// Build LIMIT/OFFSET clause with bound values
    pub fn build_limit_clause(limit: Option<i64>, offset: Option<i64>) -> SqlFragment {
        let mut clause = SqlFragment::empty();

        if let Some(limit) = limit {
            clause.push(" ", SqlFragment::trusted("LIMIT ?".to_string(), vec![limit.into()]));
        }

        if let Some(offset) = offset {
            // SQLite only accepts OFFSET after a LIMIT
            if limit.is_none() {
                clause.push(" ", SqlFragment::trusted("LIMIT -1".to_string(), Vec::new()));
            }
            clause.push(" ", SqlFragment::trusted("OFFSET ?".to_string(), vec![offset.into()]));
        }

        clause
    }

    /// Build SELECT clause from fields
    pub fn build_select_clause(fields: &[SelectField]) -> String {
        if fields.is_empty() {
            return "*".to_string();
        }

        let field_parts: Vec<String> = fields.iter().map(Self::build_select_field).collect();

        field_parts.join(", ")
    }

    fn build_select_field(field: &SelectField) -> String {
        match field {
            SelectField::All => "*".to_string(),
            SelectField::Field(name) => name.clone(),
            SelectField::FieldWithAlias { field, alias } => {
                format!("{} AS {}", field, alias)
            }
            SelectField::Expression { sql, alias } => format!("{} AS {}", sql, alias),
            SelectField::Aggregate {
                function,
                field,
                alias,
            } => {
                let func_name = function.to_sql();
                let field_part = if function.is_distinct() {
                    if let Some(f) = field {
                        format!("DISTINCT {}", f)
                    } else {
                        "*".to_string()
                    }
                } else {
                    field.as_deref().unwrap_or("*").to_string()
                };

                let aggregate = format!("{}({})", func_name, field_part);

                if let Some(alias) = alias {
                    format!("{} AS {}", aggregate, alias)
                } else {
                    aggregate
                }
            }
        }
    }

    /// Build GROUP BY clause
    pub fn build_group_by_clause(group_by: &GroupBy) -> String {
        if group_by.fields.is_empty() {
            return "".to_string();
        }
        format!("GROUP BY {}", group_by.fields.join(", "))
    }

    /// Build HAVING clause (with keyword)
    pub fn build_having_clause(group_by: &GroupBy) -> SqlFragment {
        match &group_by.having {
            Some(having_conditions) if group_by.has_having() => {
                let conditions = Self::build_where_clause(having_conditions);
                let (sql, params) = conditions.into_parts();
                SqlFragment::trusted(format!("HAVING {}", sql), params)
            }
            _ => SqlFragment::empty(),
        }
    }

    /// Assemble `SELECT {select} FROM {table} [WHERE ..] [tail]`
    pub fn build_select(
        select: &str,
        table: &str,
        where_clause: Option<&SqlFragment>,
        tail: &[&str],
    ) -> SqlFragment {
        let mut statement = SqlFragment::trusted(format!("SELECT {} FROM {}", select, table), Vec::new());

        if let Some(condition) = where_clause.filter(|w| !w.is_empty()) {
            statement.push(" WHERE ", condition.clone());
        }

        for part in tail.iter().filter(|p| !p.is_empty()) {
            statement.push_sql(" ");
            statement.push_sql(part);
        }

        statement
    }
}
