//! Query builder behaviour across filters, generation and paging

use crate::query_builder::fragment::count_placeholders;
use crate::query_builder::{
    FilterSet, GroupBy, OrderBy, PageRequest, QueryBuilder, QueryFilter, QueryOperator,
    QueryParams, SelectField, SortOrder, SqlFragment, SqlGenerator,
};
use serde_json::{json, Map, Value};

fn assert_paired(fragment: &SqlFragment) {
    assert_eq!(
        count_placeholders(fragment.sql()),
        fragment.params().len(),
        "unpaired fragment: {}",
        fragment.sql()
    );
}

// ========================================
// QueryFilter Edge Cases
// ========================================

#[test]
fn test_injection_text_is_bound_not_inlined() {
    let payload = "'; DROP TABLE kol_tribit_total; --";
    let clause = SqlGenerator::build_where_clause(&[QueryFilter::eq("kol_account", payload)]);

    assert_eq!(clause.sql(), "kol_account = ?");
    assert_eq!(clause.params(), &[json!(payload)]);
    assert!(!clause.sql().contains("DROP"));
}

#[test]
fn test_eq_null_becomes_is_null() {
    let clause = SqlGenerator::build_where_clause(&[
        QueryFilter::eq("region", Value::Null),
        QueryFilter::ne("platform", Value::Null),
    ]);
    assert_eq!(clause.sql(), "region IS NULL AND platform IS NOT NULL");
    assert!(clause.params().is_empty());
}

#[test]
fn test_unicode_column_and_value() {
    let clause = SqlGenerator::build_where_clause(&[QueryFilter::contains("\"达人名称\"", "测试")]);
    assert_eq!(clause.sql(), "\"达人名称\" LIKE ?");
    assert_eq!(clause.params(), &[json!("%测试%")]);
}

#[test]
fn test_infer_from_loose_conditions() {
    let mut conditions = Map::new();
    conditions.insert("region".into(), json!(["US", "UK"]));
    conditions.insert("search_volume".into(), json!({"min": 100, "max": null}));
    conditions.insert("keyword".into(), json!("speak%"));
    conditions.insert("language".into(), json!("en"));
    conditions.insert("ignored".into(), Value::Null);
    conditions.insert("empty_range".into(), json!({}));

    let filters = QueryFilter::from_conditions(&conditions);
    assert_eq!(filters.len(), 4);
    assert!(filters.contains(&QueryFilter::in_values("region", vec![json!("US"), json!("UK")])));
    assert!(filters.contains(&QueryFilter::gte("search_volume", 100)));
    assert!(filters.contains(&QueryFilter::like("keyword", "speak%")));
    assert!(filters.contains(&QueryFilter::eq("language", "en")));
}

#[test]
fn test_range_variants() {
    assert_eq!(
        QueryFilter::range("cpc", Some(json!(1.5)), Some(json!(3.0))),
        Some(QueryFilter::between("cpc", 1.5, 3.0))
    );
    assert_eq!(
        QueryFilter::range("cpc", None, Some(json!(3.0))),
        Some(QueryFilter::lte("cpc", 3.0))
    );
    assert_eq!(QueryFilter::range("cpc", None, None), None);
}

#[test]
fn test_filter_set_skips_absent_inputs() {
    let platforms: Vec<String> = Vec::new();
    let filters = FilterSet::new()
        .any_of("platform", &platforms)
        .when(None::<String>, |r| QueryFilter::eq("region", r))
        .maybe(QueryFilter::range("rank", None, None))
        .keyword_any(&["keyword", "suggestion"], &["  ".to_string()]);

    assert!(filters.is_empty());
}

#[test]
fn test_filter_set_builds_keyword_group() {
    let filters = FilterSet::new()
        .when(Some("EU".to_string()), |r| QueryFilter::eq("\"Region\"", r))
        .keyword_any(
            &["keyword", "suggestion"],
            &["speaker".to_string(), "bass".to_string()],
        )
        .into_filters();

    let clause = SqlGenerator::build_where_clause(&filters);
    assert_eq!(
        clause.sql(),
        "\"Region\" = ? AND (keyword LIKE ? OR suggestion LIKE ? OR keyword LIKE ? OR suggestion LIKE ?)"
    );
    assert_eq!(clause.params().len(), 5);
    assert_paired(&clause);
}

// ========================================
// SQL Generation Edge Cases
// ========================================

#[test]
fn test_sql_generation_empty_conditions() {
    let clause = SqlGenerator::build_where_clause(&[]);
    assert!(clause.is_empty());
    assert!(clause.params().is_empty());
}

#[test]
fn test_sql_generation_empty_arrays() {
    let clause = SqlGenerator::build_where_clause(&[QueryFilter::in_values("status", vec![])]);
    assert_eq!(clause.sql(), "1=0");
    assert!(clause.params().is_empty());

    let clause = SqlGenerator::build_where_clause(&[QueryFilter::not_in_values("type", vec![])]);
    assert_eq!(clause.sql(), "1=1");
}

#[test]
fn test_sql_generation_invalid_operator_value_combinations() {
    let filter = QueryFilter::condition("amount", QueryOperator::Gt, None);
    assert_eq!(SqlGenerator::build_where_clause(&[filter]).sql(), "1=0");

    let filter = QueryFilter::condition("status", QueryOperator::In, Some(json!("not_an_array")));
    assert_eq!(SqlGenerator::build_where_clause(&[filter]).sql(), "1=0");

    let filter = QueryFilter::condition("rank", QueryOperator::Between, Some(json!([1])));
    let clause = SqlGenerator::build_where_clause(&[filter]);
    assert_eq!(clause.sql(), "1=0");
    assert!(clause.params().is_empty());
}

#[test]
fn test_sql_generation_complex_nested_groups() {
    let complex_filter = QueryFilter::and(vec![
        QueryFilter::or(vec![
            QueryFilter::eq("status", "active"),
            QueryFilter::eq("status", "pending"),
        ]),
        QueryFilter::in_values("platform", vec![json!("YouTube"), json!("TikTok")]),
        QueryFilter::between("rank", 1, 50),
        QueryFilter::or(vec![]),
    ]);

    let clause = SqlGenerator::build_where_clause(&[complex_filter]);
    assert_eq!(
        clause.sql(),
        "((status = ? OR status = ?) AND platform IN (?, ?) AND rank BETWEEN ? AND ? AND 1=1)"
    );
    assert_eq!(
        clause.params(),
        &[
            json!("active"),
            json!("pending"),
            json!("YouTube"),
            json!("TikTok"),
            json!(1),
            json!(50)
        ]
    );
}

#[test]
fn test_limit_without_offset_and_offset_without_limit() {
    let clause = SqlGenerator::build_limit_clause(Some(10), None);
    assert_eq!(clause.sql(), "LIMIT ?");
    assert_eq!(clause.params(), &[json!(10)]);

    let clause = SqlGenerator::build_limit_clause(None, Some(40));
    assert_eq!(clause.sql(), "LIMIT -1 OFFSET ?");
    assert_eq!(clause.params(), &[json!(40)]);

    assert!(SqlGenerator::build_limit_clause(None, None).is_empty());
}

#[test]
fn test_grouped_select_statement() {
    let group_by = GroupBy::single("\"Platform\"")
        .having(QueryFilter::gt("COUNT(*)", 2))
        .order_by(OrderBy::desc("count"));

    let select = SqlGenerator::build_select_clause(&[
        SelectField::field_as("\"Platform\"", "platform"),
        SelectField::count_all().with_alias("count"),
    ]);
    let where_clause = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null("\"Platform\"")]);
    let mut statement = SqlGenerator::build_select(
        &select,
        "kol_tribit_total",
        Some(&where_clause),
        &[&SqlGenerator::build_group_by_clause(&group_by)],
    );
    statement.push(" ", SqlGenerator::build_having_clause(&group_by));
    statement.push_sql(" ");
    statement.push_sql(&SqlGenerator::build_order_clause(&group_by.order_by));

    assert_eq!(
        statement.sql(),
        "SELECT \"Platform\" AS platform, COUNT(*) AS count FROM kol_tribit_total \
         WHERE \"Platform\" IS NOT NULL GROUP BY \"Platform\" HAVING COUNT(*) > ? ORDER BY count DESC"
    );
    assert_eq!(statement.params(), &[json!(2)]);
}

// ========================================
// QueryBuilder / QueryParams
// ========================================

#[test]
fn test_query_builder_empty_state() {
    let builder = QueryBuilder::new();

    assert!(builder.build_where_clause().is_empty());
    assert_eq!(builder.build_order_clause(), "");
    assert!(builder.build_limit_clause().is_empty());
    assert_eq!(builder.build_select("*", "t").sql(), "SELECT * FROM t");
}

#[test]
fn test_query_builder_full_statement() {
    let statement = QueryBuilder::new()
        .filter(QueryFilter::eq("region", "US"))
        .filters(vec![QueryFilter::gte("search_volume", 1000)])
        .order_by("search_volume", SortOrder::Desc)
        .order_by("keyword", SortOrder::Asc)
        .limit(20)
        .offset(40)
        .build_select("*", "insight_search");

    assert_eq!(
        statement.sql(),
        "SELECT * FROM insight_search WHERE region = ? AND search_volume >= ? \
         ORDER BY search_volume DESC, keyword ASC LIMIT ? OFFSET ?"
    );
    assert_eq!(
        statement.params(),
        &[json!("US"), json!(1000), json!(20), json!(40)]
    );
}

#[test]
fn test_query_builder_many_filters_stay_paired() {
    let mut builder = QueryBuilder::new();
    for i in 0..100 {
        builder = builder.filter(QueryFilter::eq(&format!("field_{}", i), i));
    }

    let clause = builder.build_where_clause();
    assert_eq!(clause.params().len(), 100);
    assert_eq!(clause.sql().matches(" AND ").count(), 99);
    assert_paired(&clause);
}

#[test]
fn test_query_params_defaults_to_ascending() {
    let params = QueryParams {
        order_by: Some("rank".to_string()),
        ..QueryParams::default()
    };
    assert_eq!(params.order_clause(), "ORDER BY rank ASC");

    let params = QueryParams::new()
        .order_by("\"No.\"", SortOrder::Desc)
        .limit(5);
    assert_eq!(params.order_clause(), "ORDER BY \"No.\" DESC");
    assert_eq!(params.limit_clause().params(), &[json!(5)]);
    assert_eq!(QueryParams::new().order_clause(), "");
}

#[test]
fn test_page_request_drives_limit_offset() {
    let page = PageRequest::new(3, 25).unwrap();
    let pagination = page.to_pagination();
    let clause = SqlGenerator::build_limit_clause(pagination.limit, pagination.offset);

    assert_eq!(clause.sql(), "LIMIT ? OFFSET ?");
    assert_eq!(clause.params(), &[json!(25), json!(50)]);
}
