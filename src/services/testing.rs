//! A/B test ideas and executions
//!
//! Ideas and executions live in process memory behind a shared lock; every
//! clone of [`TestingService`] sees the same store.

use crate::errors::PulseboardError;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use store_object::query_builder::{PageRequest, PaginatedResult};
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaStatus {
    Draft,
    Ready,
    Running,
    Completed,
    Archived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Draft,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestType {
    Ab,
    Multivariate,
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Conversion,
    Revenue,
    Engagement,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Increase,
    Decrease,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestIdea {
    pub id: String,
    pub title: String,
    pub description: String,
    pub hypothesis: String,
    pub status: IdeaStatus,
    pub priority: Priority,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
    pub category: String,
    pub expected_impact: String,
}

/// Body of a create request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTestIdea {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "description must be 1-2000 characters"))]
    pub description: String,
    #[validate(length(min = 1, max = 1000, message = "hypothesis must be 1-1000 characters"))]
    pub hypothesis: String,
    #[serde(default)]
    pub status: Option<IdeaStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[validate(email(message = "created_by must be an e-mail address"))]
    pub created_by: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub expected_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestVariant {
    pub id: String,
    pub test_id: String,
    pub name: String,
    pub description: String,
    pub traffic_percentage: f64,
    pub is_control: bool,
    pub configuration: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestMetric {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
    pub goal_type: GoalType,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantResult {
    pub variant_id: String,
    pub variant_name: String,
    pub participants: i64,
    pub conversions: i64,
    pub conversion_rate: f64,
    /// Percent over the control variant
    pub improvement: f64,
    pub confidence_interval: (f64, f64),
    pub is_winner: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResults {
    pub test_id: String,
    pub total_participants: i64,
    pub confidence_level: f64,
    pub statistical_significance: bool,
    pub variant_results: Vec<VariantResult>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestExecution {
    pub id: String,
    pub idea_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: TestType,
    pub status: ExecutionStatus,
    pub variants: Vec<TestVariant>,
    pub metrics: Vec<TestMetric>,
    pub traffic_allocation: f64,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<TestResults>,
    pub created_at: String,
    pub updated_at: String,
}

impl TestExecution {
    fn winner(&self) -> Option<&VariantResult> {
        self.results
            .as_ref()
            .and_then(|r| r.variant_results.iter().find(|v| v.is_winner))
    }
}

#[derive(Debug, Clone, Default)]
pub struct IdeaFilter {
    pub status: Option<IdeaStatus>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of title, description or hypothesis
    pub search: Option<String>,
}

impl IdeaFilter {
    fn matches(&self, idea: &TestIdea) -> bool {
        if self.status.is_some_and(|s| s != idea.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != idea.priority) {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                [&idea.title, &idea.description, &idea.hypothesis]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionFilter {
    pub status: Option<ExecutionStatus>,
    pub idea_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestingStats {
    pub total_ideas: i64,
    pub active_tests: i64,
    pub completed_tests: i64,
    /// Mean winner improvement over completed tests that have results
    pub average_improvement: f64,
}

#[derive(Debug, Default)]
struct TestingState {
    ideas: Vec<TestIdea>,
    executions: Vec<TestExecution>,
}

#[derive(Debug, Clone)]
pub struct TestingService {
    state: Arc<RwLock<TestingState>>,
}

impl Default for TestingService {
    fn default() -> Self {
        Self::new()
    }
}

impl TestingService {
    /// Store preloaded with the demo ideas and executions
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(TestingState {
                ideas: demo::ideas(),
                executions: demo::executions(),
            })),
        }
    }

    pub async fn ideas(&self, filter: &IdeaFilter, page: PageRequest) -> PaginatedResult<TestIdea> {
        let state = self.state.read().await;
        let matching: Vec<TestIdea> = state.ideas.iter().filter(|i| filter.matches(i)).cloned().collect();
        PaginatedResult::from_slice(&matching, page)
    }

    pub async fn idea(&self, id: &str) -> Option<TestIdea> {
        self.state.read().await.ideas.iter().find(|i| i.id == id).cloned()
    }

    /// Validate and store a new idea. Status defaults to draft, priority to medium.
    pub async fn create_idea(&self, new: NewTestIdea) -> Result<TestIdea, PulseboardError> {
        new.validate()?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut state = self.state.write().await;
        let idea = TestIdea {
            id: (state.ideas.len() + 1).to_string(),
            title: new.title,
            description: new.description,
            hypothesis: new.hypothesis,
            status: new.status.unwrap_or(IdeaStatus::Draft),
            priority: new.priority.unwrap_or(Priority::Medium),
            created_at: now.clone(),
            updated_at: now,
            created_by: new.created_by,
            category: new.category,
            expected_impact: new.expected_impact,
        };
        state.ideas.push(idea.clone());
        info!(id = %idea.id, title = %idea.title, "test idea created");
        Ok(idea)
    }

    pub async fn executions(&self, filter: &ExecutionFilter) -> Vec<TestExecution> {
        self.state
            .read()
            .await
            .executions
            .iter()
            .filter(|e| filter.status.is_none_or(|s| s == e.status))
            .filter(|e| filter.idea_id.as_deref().is_none_or(|id| id == e.idea_id))
            .cloned()
            .collect()
    }

    pub async fn execution(&self, id: &str) -> Option<TestExecution> {
        self.state.read().await.executions.iter().find(|e| e.id == id).cloned()
    }

    pub async fn active_tests(&self) -> Vec<TestExecution> {
        self.executions(&ExecutionFilter {
            status: Some(ExecutionStatus::Running),
            idea_id: None,
        })
        .await
    }

    pub async fn stats(&self) -> TestingStats {
        let state = self.state.read().await;
        let count = |status: ExecutionStatus| state.executions.iter().filter(|e| e.status == status).count() as i64;

        let completed_with_results: Vec<&TestExecution> = state
            .executions
            .iter()
            .filter(|e| e.status == ExecutionStatus::Completed && e.results.is_some())
            .collect();
        let improvement: f64 = completed_with_results
            .iter()
            .filter_map(|e| e.winner())
            .map(|w| w.improvement)
            .sum();
        let average_improvement = if completed_with_results.is_empty() {
            0.0
        } else {
            improvement / completed_with_results.len() as f64
        };

        TestingStats {
            total_ideas: state.ideas.len() as i64,
            active_tests: count(ExecutionStatus::Running),
            completed_tests: count(ExecutionStatus::Completed),
            average_improvement,
        }
    }
}

mod demo {
    use super::*;

    #[allow(clippy::too_many_arguments)]
    fn idea(
        id: &str,
        title: &str,
        description: &str,
        hypothesis: &str,
        status: IdeaStatus,
        priority: Priority,
        created: &str,
        updated: &str,
        author: &str,
        category: &str,
        impact: &str,
    ) -> TestIdea {
        TestIdea {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            hypothesis: hypothesis.to_string(),
            status,
            priority,
            created_at: created.to_string(),
            updated_at: updated.to_string(),
            created_by: author.to_string(),
            category: category.to_string(),
            expected_impact: impact.to_string(),
        }
    }

    pub(super) fn ideas() -> Vec<TestIdea> {
        vec![
            idea(
                "1",
                "Homepage CTA Button Color Test",
                "Test different button colors to improve conversion rate",
                "Changing the CTA button from blue to green will increase click-through rate by 15%",
                IdeaStatus::Running,
                Priority::High,
                "2024-12-01T10:00:00Z",
                "2024-12-15T14:30:00Z",
                "john.doe@company.com",
                "UI/UX",
                "15-20% CTR increase",
            ),
            idea(
                "2",
                "Email Subject Line Personalization",
                "Test personalized vs generic email subject lines",
                "Personalized subject lines will increase open rates by 25%",
                IdeaStatus::Completed,
                Priority::Medium,
                "2024-11-15T09:00:00Z",
                "2024-12-01T16:00:00Z",
                "jane.smith@company.com",
                "Email Marketing",
                "20-30% open rate increase",
            ),
            idea(
                "3",
                "Product Page Layout Optimization",
                "Test new product page layout with larger images",
                "Larger product images will increase add-to-cart rate by 10%",
                IdeaStatus::Ready,
                Priority::High,
                "2024-12-10T11:00:00Z",
                "2024-12-10T11:00:00Z",
                "mike.wilson@company.com",
                "E-commerce",
                "10-15% conversion increase",
            ),
            idea(
                "4",
                "Checkout Process Simplification",
                "Test one-page vs multi-step checkout",
                "One-page checkout will reduce cart abandonment by 20%",
                IdeaStatus::Draft,
                Priority::High,
                "2024-12-20T13:00:00Z",
                "2024-12-20T13:00:00Z",
                "sarah.jones@company.com",
                "E-commerce",
                "20% reduction in cart abandonment",
            ),
        ]
    }

    fn variant(id: &str, test_id: &str, name: &str, description: &str, control: bool, configuration: serde_json::Value) -> TestVariant {
        TestVariant {
            id: id.to_string(),
            test_id: test_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            traffic_percentage: 50.0,
            is_control: control,
            configuration,
        }
    }

    fn metric(id: &str, name: &str, metric_type: MetricType, goal_type: GoalType, primary: bool) -> TestMetric {
        TestMetric {
            id: id.to_string(),
            name: name.to_string(),
            metric_type,
            goal_type,
            primary,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn result(
        id: &str,
        name: &str,
        participants: i64,
        conversions: i64,
        rate: f64,
        improvement: f64,
        interval: (f64, f64),
        winner: bool,
    ) -> VariantResult {
        VariantResult {
            variant_id: id.to_string(),
            variant_name: name.to_string(),
            participants,
            conversions,
            conversion_rate: rate,
            improvement,
            confidence_interval: interval,
            is_winner: winner,
        }
    }

    pub(super) fn executions() -> Vec<TestExecution> {
        vec![
            TestExecution {
                id: "exec-1".to_string(),
                idea_id: "1".to_string(),
                name: "Homepage CTA Button Color Test".to_string(),
                test_type: TestType::Ab,
                status: ExecutionStatus::Running,
                variants: vec![
                    variant("var-1", "exec-1", "Control (Blue)", "Current blue button", true, json!({"color": "#007bff"})),
                    variant("var-2", "exec-1", "Variant A (Green)", "Green button variant", false, json!({"color": "#28a745"})),
                ],
                metrics: vec![
                    metric("metric-1", "Click-through Rate", MetricType::Conversion, GoalType::Increase, true),
                    metric("metric-2", "Bounce Rate", MetricType::Engagement, GoalType::Decrease, false),
                ],
                traffic_allocation: 100.0,
                start_date: "2024-12-01T10:00:00Z".to_string(),
                end_date: None,
                winner_variant_id: None,
                results: Some(TestResults {
                    test_id: "exec-1".to_string(),
                    total_participants: 50_000,
                    confidence_level: 95.0,
                    statistical_significance: true,
                    variant_results: vec![
                        result("var-1", "Control (Blue)", 25_000, 2_500, 10.0, 0.0, (9.5, 10.5), false),
                        result("var-2", "Variant A (Green)", 25_000, 3_125, 12.5, 25.0, (12.0, 13.0), true),
                    ],
                    updated_at: "2024-12-15T14:30:00Z".to_string(),
                }),
                created_at: "2024-12-01T10:00:00Z".to_string(),
                updated_at: "2024-12-15T14:30:00Z".to_string(),
            },
            TestExecution {
                id: "exec-2".to_string(),
                idea_id: "2".to_string(),
                name: "Email Subject Line Personalization".to_string(),
                test_type: TestType::Ab,
                status: ExecutionStatus::Completed,
                variants: vec![
                    variant(
                        "var-3",
                        "exec-2",
                        "Control (Generic)",
                        "Generic subject line",
                        true,
                        json!({"template": "Check out our latest deals!"}),
                    ),
                    variant(
                        "var-4",
                        "exec-2",
                        "Personalized",
                        "Personalized with first name",
                        false,
                        json!({"template": "{firstName}, exclusive deals just for you!"}),
                    ),
                ],
                metrics: vec![metric("metric-3", "Open Rate", MetricType::Engagement, GoalType::Increase, true)],
                traffic_allocation: 100.0,
                start_date: "2024-11-15T09:00:00Z".to_string(),
                end_date: Some("2024-12-01T16:00:00Z".to_string()),
                winner_variant_id: Some("var-4".to_string()),
                results: Some(TestResults {
                    test_id: "exec-2".to_string(),
                    total_participants: 100_000,
                    confidence_level: 99.0,
                    statistical_significance: true,
                    variant_results: vec![
                        result("var-3", "Control (Generic)", 50_000, 10_000, 20.0, 0.0, (19.5, 20.5), false),
                        result("var-4", "Personalized", 50_000, 13_500, 27.0, 35.0, (26.5, 27.5), true),
                    ],
                    updated_at: "2024-12-01T16:00:00Z".to_string(),
                }),
                created_at: "2024-11-15T09:00:00Z".to_string(),
                updated_at: "2024-12-01T16:00:00Z".to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_idea(title: &str, author: &str) -> NewTestIdea {
        NewTestIdea {
            title: title.to_string(),
            description: "Compare two hero images".to_string(),
            hypothesis: "Lifestyle imagery lifts engagement".to_string(),
            status: None,
            priority: Some(Priority::Low),
            created_by: author.to_string(),
            category: "UI/UX".to_string(),
            expected_impact: String::new(),
        }
    }

    #[tokio::test]
    async fn test_idea_filters() {
        let testing = TestingService::new();

        let high = IdeaFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert_eq!(testing.ideas(&high, PageRequest::default()).await.total, 3);

        let search = IdeaFilter {
            search: Some("CHECKOUT".to_string()),
            ..Default::default()
        };
        let page = testing.ideas(&search, PageRequest::default()).await;
        assert_eq!(page.data[0].id, "4");

        let none = IdeaFilter {
            status: Some(IdeaStatus::Archived),
            ..Default::default()
        };
        let page = testing.ideas(&none, PageRequest::default()).await;
        assert!(page.data.is_empty());
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_create_idea_assigns_id_and_defaults() {
        let testing = TestingService::new();
        let idea = testing.create_idea(new_idea("Hero image test", "ana@company.com")).await.unwrap();

        assert_eq!(idea.id, "5");
        assert_eq!(idea.status, IdeaStatus::Draft);
        assert_eq!(idea.priority, Priority::Low);
        assert!(idea.created_at.ends_with('Z'));

        let shared = testing.clone();
        assert_eq!(shared.idea("5").await.unwrap().title, "Hero image test");
    }

    #[tokio::test]
    async fn test_create_idea_rejects_invalid_input() {
        let testing = TestingService::new();

        let err = testing.create_idea(new_idea("", "ana@company.com")).await.unwrap_err();
        assert!(matches!(err, PulseboardError::Validation(_)));

        let err = testing.create_idea(new_idea("Valid", "not-an-email")).await.unwrap_err();
        match err {
            PulseboardError::Validation(errors) => {
                assert!(errors.field_errors().contains_key("created_by"));
            }
            other => panic!("unexpected error: {other}"),
        }

        assert_eq!(testing.stats().await.total_ideas, 4);
    }

    #[tokio::test]
    async fn test_executions_and_stats() {
        let testing = TestingService::new();

        let active = testing.active_tests().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "exec-1");

        let for_idea = testing
            .executions(&ExecutionFilter {
                idea_id: Some("2".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(for_idea[0].winner_variant_id.as_deref(), Some("var-4"));
        assert!(testing.execution("exec-9").await.is_none());

        let stats = testing.stats().await;
        assert_eq!(
            stats,
            TestingStats {
                total_ideas: 4,
                active_tests: 1,
                completed_tests: 1,
                average_improvement: 35.0,
            }
        );

        let json = serde_json::to_value(&active[0]).unwrap();
        assert_eq!(json["type"], "ab");
        assert!(json.get("end_date").is_none());
    }
}
