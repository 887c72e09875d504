//! Consumer-voice analytics: needs, intent, trends, price sensitivity and
//! competition read from search keywords, with demand taken from shop sales

use super::{insight_search, integer, number, tiktok_product, ServiceOptions};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use store_object::query_builder::{
    FilterSet, GroupBy, OrderBy, QueryFilter, SelectField, SqlFragment, SqlGenerator,
};
use store_object::{QueryExecutor, RecordStore, Row, StoreError};

const KEYWORD: &str = "keyword";
const REGION: &str = "region";
const LANGUAGE: &str = "language";
const SUGGESTION: &str = "suggestion";
const VOLUME: &str = "search_volume";
const CPC: &str = "cost_per_click";
const MODIFIER: &str = "modifier";
const MODIFIER_TYPE: &str = "modifier_type";

const PRODUCT_NAME: &str = "\"商品名称\"";
const PRODUCT_CATEGORY: &str = "\"商品类目-zh\"";
const PRODUCT_SALES: &str = "\"销量\"";
const PRICE_MIN: &str = "\"商品价格最小值\"";
const PRICE_MAX: &str = "\"商品价格最大值\"";

const NEED_LIMIT: i64 = 20;
const DEMAND_LIMIT: i64 = 20;
const PRICE_LIMIT: i64 = 50;
const RELATED_LIMIT: i64 = 10;

const GROWTH_RATE: &str = "CASE \
    WHEN search_volume > 10000 THEN 100 \
    WHEN search_volume > 5000 THEN 50 \
    WHEN search_volume > 1000 THEN 20 \
    ELSE 10 END";

const PRICE_SENSITIVITY: &str = "CASE \
    WHEN keyword LIKE '%cheap%' OR keyword LIKE '%discount%' OR keyword LIKE '%deal%' THEN 'high' \
    WHEN keyword LIKE '%best%' OR keyword LIKE '%quality%' THEN 'medium' \
    ELSE 'low' END";

#[derive(Debug, Clone, Default)]
pub struct VoiceFilter {
    pub region: Option<String>,
    pub language: Option<String>,
    /// Modifier type, e.g. `question` or `comparison`
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerNeed {
    pub need_category: String,
    pub frequency: i64,
    pub related_keywords: Vec<String>,
    pub example_searches: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Informational,
    Navigational,
    Transactional,
    Commercial,
}

impl IntentType {
    const ALL: [IntentType; 4] = [
        IntentType::Informational,
        IntentType::Transactional,
        IntentType::Commercial,
        IntentType::Navigational,
    ];

    /// Words that mark a search as carrying this intent
    fn cues(&self) -> &'static [&'static str] {
        match self {
            IntentType::Informational => &["how", "what", "why", "when", "where", "guide", "tutorial"],
            IntentType::Transactional => &["buy", "price", "cheap", "deal", "discount", "sale"],
            IntentType::Commercial => &["best", "top", "review", "compare", "vs"],
            IntentType::Navigational => &["official", "website", "login", "download"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    pub intent_type: IntentType,
    pub keywords: Vec<String>,
    /// Share of searches in scope, whole percent
    pub percentage: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub mentions: i64,
    pub growth_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerInsight {
    pub category: String,
    pub insights: Vec<String>,
    pub trending_keywords: Vec<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDemand {
    pub category: String,
    /// Units sold per thousand, capped at 100
    pub demand_score: f64,
    pub avg_price: f64,
    pub top_products: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSensitivity {
    pub keyword: String,
    pub search_volume: i64,
    pub avg_cpc: f64,
    pub price_sensitivity: Sensitivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalPreference {
    pub region: String,
    pub top_categories: Vec<String>,
    pub avg_search_volume: f64,
    pub preferred_language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    Medium,
    High,
}

impl CompetitionLevel {
    fn assess(cpc: f64, volume: f64) -> Self {
        if cpc > 5.0 || volume > 10_000.0 {
            CompetitionLevel::High
        } else if cpc > 2.0 || volume > 5_000.0 {
            CompetitionLevel::Medium
        } else {
            CompetitionLevel::Low
        }
    }

    fn recommendations(&self) -> Vec<String> {
        let advice: [&str; 2] = match self {
            CompetitionLevel::High => [
                "Consider long-tail keyword variations to reduce competition",
                "Focus on content quality and user intent",
            ],
            CompetitionLevel::Medium => [
                "Good opportunity for targeted campaigns",
                "Monitor competitor strategies closely",
            ],
            CompetitionLevel::Low => [
                "Low competition presents growth opportunity",
                "Consider increasing investment in this keyword",
            ],
        };
        advice.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveInsight {
    pub keyword: String,
    pub competition_level: CompetitionLevel,
    pub related_keywords: Vec<String>,
    /// Volume per unit of CPC, scaled and capped at 100
    pub market_opportunity: f64,
    pub recommendations: Vec<String>,
}

/// English label for a Chinese shop category
fn category_label(raw: &str) -> String {
    let label = match raw {
        "手机与数码" => "Mobile & Digital",
        "家电" => "Home Appliances",
        "五金工具" => "Hardware Tools",
        "家装建材" => "Home Improvement",
        "居家日用" => "Home & Living",
        "运动与户外" => "Sports & Outdoors",
        "玩具和爱好" => "Toys & Hobbies",
        "电脑办公" => "Computer & Office",
        "汽车与摩托车" => "Automotive",
        "美妆个护" => "Beauty & Personal Care",
        "服装配饰" => "Clothing & Accessories",
        "母婴用品" => "Baby & Kids",
        "食品饮料" => "Food & Beverage",
        "宠物用品" => "Pet Supplies",
        "珠宝首饰" => "Jewelry",
        "鞋靴箱包" => "Shoes & Bags",
        "" => "Other",
        other => other,
    };
    label.to_string()
}

/// Split a `GROUP_CONCAT` column, keeping at most `take` non-empty items
fn concat_list(row: &Row, column: &str, take: usize) -> Vec<String> {
    row.get(column)
        .and_then(Value::as_str)
        .map(|joined| {
            joined
                .split(',')
                .filter(|s| !s.is_empty())
                .take(take)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct ConsumerVoiceService {
    searches: RecordStore,
    products: RecordStore,
}

impl ConsumerVoiceService {
    pub fn new(executor: Arc<dyn QueryExecutor>, options: &ServiceOptions) -> Result<Self, StoreError> {
        Ok(Self {
            searches: options.store(&executor, insight_search::TABLE)?,
            products: options.store(&executor, tiktok_product::TABLE)?,
        })
    }

    /// Modifier types ranked by how often they appear, with their modifiers and sample keywords
    pub async fn consumer_needs(
        &self,
        region: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<ConsumerNeed>, StoreError> {
        let filters = FilterSet::new()
            .push(QueryFilter::is_not_null(MODIFIER_TYPE))
            .when(region, |r| QueryFilter::eq(REGION, r))
            .when(language, |l| QueryFilter::eq(LANGUAGE, l));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());
        let group = GroupBy::single(MODIFIER_TYPE)
            .order_by(OrderBy::desc("frequency"))
            .order_by(OrderBy::asc("need_category"))
            .limit(NEED_LIMIT);
        let select = [
            SelectField::field_as(MODIFIER_TYPE, "need_category"),
            SelectField::count_all().with_alias("frequency"),
            SelectField::expression(format!("GROUP_CONCAT(DISTINCT {})", MODIFIER), "modifiers"),
            SelectField::expression(format!("GROUP_CONCAT({}, ',')", KEYWORD), "keywords"),
        ];

        let rows: Vec<Row> = self.searches.group_by(&group, &select, Some(&condition)).await?;
        Ok(rows
            .iter()
            .map(|row| ConsumerNeed {
                need_category: text(row, "need_category").unwrap_or_default(),
                frequency: integer(row, "frequency"),
                related_keywords: concat_list(row, "modifiers", 10),
                example_searches: concat_list(row, "keywords", 5),
            })
            .collect())
    }

    /// Share of searches carrying each intent, largest first. Cues are matched
    /// against both the keyword and the full suggested query.
    pub async fn search_intent(&self, region: Option<&str>) -> Result<Vec<SearchIntent>, StoreError> {
        let scope = FilterSet::new().when(region, |r| QueryFilter::eq(REGION, r));
        let total = self
            .searches
            .get_count(Some(&SqlGenerator::build_where_clause(&scope.into_filters())))
            .await?
            .max(1);

        let mut intents = Vec::new();
        for intent in IntentType::ALL {
            let cues = intent
                .cues()
                .iter()
                .flat_map(|cue| [QueryFilter::contains(KEYWORD, cue), QueryFilter::contains(SUGGESTION, cue)])
                .collect();
            let filters = FilterSet::new()
                .push(QueryFilter::or(cues))
                .when(region, |r| QueryFilter::eq(REGION, r));
            let condition = SqlGenerator::build_where_clause(&filters.into_filters());
            let statement =
                SqlGenerator::build_select(KEYWORD, &self.searches.quoted_table(), Some(&condition), &[]);

            let rows: Vec<Row> = self.searches.query(&statement).await?;
            if rows.is_empty() {
                continue;
            }
            let mut keywords: Vec<String> = Vec::new();
            for keyword in rows.iter().filter_map(|row| text(row, KEYWORD)) {
                if keywords.len() < 10 && !keywords.contains(&keyword) {
                    keywords.push(keyword);
                }
            }
            intents.push(SearchIntent {
                intent_type: intent,
                keywords,
                percentage: (rows.len() as f64 / total as f64 * 100.0).round() as i64,
            });
        }

        intents.sort_by(|a, b| b.percentage.cmp(&a.percentage));
        Ok(intents)
    }

    /// Highest-volume keywords with a growth tier derived from their volume
    pub async fn trending_topics(&self, limit: i64) -> Result<Vec<TrendingTopic>, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::field_as(KEYWORD, "topic"),
            SelectField::field_as(VOLUME, "mentions"),
            SelectField::expression(GROWTH_RATE, "growth_rate"),
        ]);
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(VOLUME)]);
        let mut statement = SqlGenerator::build_select(
            &select,
            &self.searches.quoted_table(),
            Some(&condition),
            &[&SqlGenerator::build_order_clause(&[OrderBy::desc(VOLUME)])],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(limit), None));
        self.searches.query(&statement).await
    }

    pub async fn consumer_insights(&self, filter: &VoiceFilter) -> Result<Vec<ConsumerInsight>, StoreError> {
        let filters = FilterSet::new()
            .push(QueryFilter::is_not_null(MODIFIER_TYPE))
            .when(filter.region.clone(), |r| QueryFilter::eq(REGION, r))
            .when(filter.language.clone(), |l| QueryFilter::eq(LANGUAGE, l))
            .when(filter.category.clone(), |c| QueryFilter::eq(MODIFIER_TYPE, c));
        let condition = SqlGenerator::build_where_clause(&filters.into_filters());
        let group = GroupBy::single(MODIFIER_TYPE)
            .order_by(OrderBy::desc("count"))
            .order_by(OrderBy::asc("category"));
        let select = [
            SelectField::field_as(MODIFIER_TYPE, "category"),
            SelectField::count_all().with_alias("count"),
            SelectField::avg(VOLUME).with_alias("avg_volume"),
            SelectField::expression(format!("GROUP_CONCAT(DISTINCT {})", KEYWORD), "keywords"),
            SelectField::expression(format!("GROUP_CONCAT(DISTINCT {})", SUGGESTION), "suggestions"),
        ];

        let rows: Vec<Row> = self.searches.group_by(&group, &select, Some(&condition)).await?;
        Ok(rows
            .iter()
            .map(|row| {
                let category = text(row, "category").unwrap_or_default();
                let keywords = concat_list(row, "keywords", usize::MAX);
                let suggestions = concat_list(row, "suggestions", usize::MAX);

                let mut insights = Vec::new();
                if number(row, "avg_volume") > 5000.0 {
                    insights.push(format!(
                        "High search volume indicates strong consumer interest in {}",
                        category
                    ));
                }
                if keywords.len() > 20 {
                    insights.push("Diverse search patterns suggest broad market appeal".to_string());
                }
                if !suggestions.is_empty() {
                    insights.push("Related suggestions indicate potential cross-selling opportunities".to_string());
                }

                ConsumerInsight {
                    category,
                    insights,
                    trending_keywords: keywords.into_iter().take(10).collect(),
                    confidence: (integer(row, "count") as f64 / 10.0).min(100.0) / 100.0,
                }
            })
            .collect())
    }

    /// Shop categories ranked by units sold
    pub async fn product_demand(&self) -> Result<Vec<ProductDemand>, StoreError> {
        let group = GroupBy::single(PRODUCT_CATEGORY)
            .order_by(OrderBy::desc("total_sales"))
            .limit(DEMAND_LIMIT);
        let select = [
            SelectField::field_as(PRODUCT_CATEGORY, "category"),
            SelectField::sum(PRODUCT_SALES).with_alias("total_sales"),
            SelectField::expression(format!("AVG(({} + {}) / 2)", PRICE_MAX, PRICE_MIN), "avg_price"),
            SelectField::expression(format!("GROUP_CONCAT(DISTINCT {})", PRODUCT_NAME), "products"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(PRODUCT_CATEGORY)]);

        let rows: Vec<Row> = self.products.group_by(&group, &select, Some(&condition)).await?;
        Ok(rows
            .iter()
            .map(|row| ProductDemand {
                category: category_label(&text(row, "category").unwrap_or_default()),
                demand_score: (number(row, "total_sales") / 1000.0).min(100.0),
                avg_price: number(row, "avg_price"),
                top_products: concat_list(row, "products", 5),
            })
            .collect())
    }

    /// Keywords above 1000 searches, tagged by how price-driven their wording is
    pub async fn price_sensitivity(&self) -> Result<Vec<PriceSensitivity>, StoreError> {
        let select = SqlGenerator::build_select_clause(&[
            SelectField::field(KEYWORD),
            SelectField::field(VOLUME),
            SelectField::field_as(CPC, "avg_cpc"),
            SelectField::expression(PRICE_SENSITIVITY, "price_sensitivity"),
        ]);
        let condition =
            SqlGenerator::build_where_clause(&[QueryFilter::gt(VOLUME, 1000), QueryFilter::is_not_null(CPC)]);
        let mut statement = SqlGenerator::build_select(
            &select,
            &self.searches.quoted_table(),
            Some(&condition),
            &[&SqlGenerator::build_order_clause(&[OrderBy::desc(VOLUME)])],
        );
        statement.push(" ", SqlGenerator::build_limit_clause(Some(PRICE_LIMIT), None));
        self.searches.query(&statement).await
    }

    pub async fn regional_preferences(&self) -> Result<Vec<RegionalPreference>, StoreError> {
        let group = GroupBy::single(REGION).order_by(OrderBy::desc("avg_search_volume"));
        let select = [
            SelectField::field(REGION),
            SelectField::expression(format!("GROUP_CONCAT(DISTINCT {})", MODIFIER_TYPE), "categories"),
            SelectField::avg(VOLUME).with_alias("avg_search_volume"),
            SelectField::max(LANGUAGE).with_alias("preferred_language"),
        ];
        let condition = SqlGenerator::build_where_clause(&[QueryFilter::is_not_null(REGION)]);

        let rows: Vec<Row> = self.searches.group_by(&group, &select, Some(&condition)).await?;
        Ok(rows
            .iter()
            .map(|row| RegionalPreference {
                region: text(row, REGION).unwrap_or_default(),
                top_categories: concat_list(row, "categories", 5),
                avg_search_volume: number(row, "avg_search_volume"),
                preferred_language: text(row, "preferred_language").unwrap_or_else(|| "Unknown".to_string()),
            })
            .collect())
    }

    /// Competition level, keywords sharing a modifier, and advice for `keyword`
    pub async fn competitive_insights(&self, keyword: &str) -> Result<CompetitiveInsight, StoreError> {
        let row: Option<Row> = self.searches.get_by_key(KEYWORD, keyword).await?;
        let cpc = row.as_ref().map(|r| number(r, CPC)).unwrap_or(0.0);
        let volume = row.as_ref().map(|r| number(r, VOLUME)).unwrap_or(0.0);

        let table = self.searches.quoted_table();
        let mut related = SqlFragment::new(
            format!(
                "SELECT DISTINCT {k} FROM {t} WHERE {m} IN (SELECT {m} FROM {t} WHERE {k} = ?) AND {k} != ?",
                k = KEYWORD,
                m = MODIFIER,
                t = table
            ),
            vec![keyword.into(), keyword.into()],
        )?;
        related.push(" ", SqlGenerator::build_limit_clause(Some(RELATED_LIMIT), None));
        let related_rows: Vec<Row> = self.searches.query(&related).await?;

        let competition_level = CompetitionLevel::assess(cpc, volume);
        let market_opportunity = if volume > 0.0 {
            (volume / cpc / 100.0).min(100.0)
        } else {
            0.0
        };

        Ok(CompetitiveInsight {
            keyword: keyword.to_string(),
            competition_level,
            related_keywords: related_rows.iter().filter_map(|r| text(r, KEYWORD)).collect(),
            market_opportunity,
            recommendations: competition_level.recommendations(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{empty_executor, seeded_executor};

    async fn service() -> ConsumerVoiceService {
        ConsumerVoiceService::new(seeded_executor().await, &ServiceOptions::default()).unwrap()
    }

    #[tokio::test]
    async fn test_consumer_needs_ranked_by_frequency() {
        let voice = service().await;

        let needs = voice.consumer_needs(None, None).await.unwrap();
        let ranked: Vec<(&str, i64)> = needs.iter().map(|n| (n.need_category.as_str(), n.frequency)).collect();
        assert_eq!(ranked, vec![("preposition", 3), ("question", 3), ("comparison", 2)]);
        assert_eq!(needs[2].related_keywords, vec!["vs"]);
        assert_eq!(needs[2].example_searches.len(), 2);

        let german = voice.consumer_needs(Some("DE"), Some("de")).await.unwrap();
        assert_eq!(german.len(), 2);
        assert!(german.iter().all(|n| n.frequency == 1));
    }

    #[tokio::test]
    async fn test_search_intent_shares() {
        let voice = service().await;

        let intents = voice.search_intent(None).await.unwrap();
        let shares: Vec<(IntentType, i64)> = intents.iter().map(|i| (i.intent_type, i.percentage)).collect();
        assert_eq!(
            shares,
            vec![(IntentType::Commercial, 38), (IntentType::Informational, 25)]
        );
        assert!(intents[0].keywords.contains(&"tribit speaker".to_string()));

        let us = voice.search_intent(Some("US")).await.unwrap();
        assert_eq!(us[0].intent_type, IntentType::Informational);
        assert_eq!(us[0].percentage, 67);
    }

    #[tokio::test]
    async fn test_trending_topics_growth_tiers() {
        let voice = service().await;
        let topics = voice.trending_topics(10).await.unwrap();

        assert_eq!(topics.len(), 8);
        assert_eq!(topics[0].topic, "bluetooth speaker");
        assert_eq!(topics[0].growth_rate, 100);
        let tail: Vec<i64> = topics[6..].iter().map(|t| t.growth_rate).collect();
        assert_eq!(tail, vec![50, 20]);
    }

    #[tokio::test]
    async fn test_consumer_insights() {
        let voice = service().await;

        let insights = voice.consumer_insights(&VoiceFilter::default()).await.unwrap();
        assert_eq!(insights.len(), 3);
        assert_eq!(insights[0].category, "preposition");
        assert_eq!(insights[0].insights.len(), 2);
        assert!((insights[0].confidence - 0.003).abs() < 1e-9);

        let comparison = VoiceFilter {
            category: Some("comparison".to_string()),
            ..Default::default()
        };
        let insights = voice.consumer_insights(&comparison).await.unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].trending_keywords.len(), 2);
    }

    #[tokio::test]
    async fn test_product_demand_uses_english_categories() {
        let voice = service().await;
        let demand = voice.product_demand().await.unwrap();

        let categories: Vec<&str> = demand.iter().map(|d| d.category.as_str()).collect();
        assert_eq!(
            categories,
            vec!["Mobile & Digital", "Home Improvement", "Home Appliances", "Sports & Outdoors"]
        );
        assert!((demand[0].demand_score - 8.7).abs() < 1e-9);
        assert!((demand[0].avg_price - 40.3233).abs() < 1e-3);
        assert_eq!(demand[0].top_products.len(), 3);
    }

    #[tokio::test]
    async fn test_price_sensitivity_and_regions() {
        let voice = service().await;

        let prices = voice.price_sensitivity().await.unwrap();
        assert_eq!(prices.len(), 8);
        assert_eq!(prices[0].keyword, "bluetooth speaker");
        assert!(prices.iter().all(|p| p.price_sensitivity == Sensitivity::Low));

        let regions = voice.regional_preferences().await.unwrap();
        let order: Vec<&str> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(order, vec!["US", "FR", "UK", "DE", "CA"]);
        assert_eq!(regions[0].preferred_language, "en");
        assert!(regions[0].top_categories.contains(&"question".to_string()));
    }

    #[tokio::test]
    async fn test_competitive_insights() {
        let voice = service().await;

        let busy = voice.competitive_insights("bluetooth speaker").await.unwrap();
        assert_eq!(busy.competition_level, CompetitionLevel::High);
        assert_eq!(busy.related_keywords, vec!["tribit stormbox"]);
        assert_eq!(busy.market_opportunity, 100.0);
        assert_eq!(busy.recommendations.len(), 2);

        let niche = voice.competitive_insights("tribit speaker").await.unwrap();
        assert_eq!(niche.competition_level, CompetitionLevel::Medium);
        assert!(niche.related_keywords.is_empty());

        let unknown = voice.competitive_insights("gramophone").await.unwrap();
        assert_eq!(unknown.competition_level, CompetitionLevel::Low);
        assert_eq!(unknown.market_opportunity, 0.0);

        let json = serde_json::to_value(&busy).unwrap();
        assert_eq!(json["competition_level"], "high");
    }

    #[tokio::test]
    async fn test_missing_table_is_an_error() {
        let voice = ConsumerVoiceService::new(empty_executor().await, &ServiceOptions::default()).unwrap();
        assert!(voice.consumer_needs(None, None).await.is_err());
    }
}
