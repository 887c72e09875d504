//! Hosted libSQL backend over the HTTP pipeline API
//!
//! Every call is a single `POST {url}/v2/pipeline` carrying the statement and
//! a `close` request, so no stream state survives between calls.

use super::{BackendKind, ExecuteResult, QueryExecutor, Row, Statement};
use crate::errors::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum WireValue {
    Null,
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl WireValue {
    fn encode(value: &Value) -> Self {
        match value {
            Value::Null => WireValue::Null,
            Value::Bool(b) => WireValue::Integer {
                value: if *b { "1" } else { "0" }.to_string(),
            },
            Value::Number(n) => match n.as_i64() {
                Some(i) => WireValue::Integer {
                    value: i.to_string(),
                },
                None => WireValue::Float {
                    value: n.as_f64().unwrap_or_default(),
                },
            },
            Value::String(s) => WireValue::Text { value: s.clone() },
            other => WireValue::Text {
                value: other.to_string(),
            },
        }
    }

    fn decode(self) -> Value {
        match self {
            WireValue::Null => Value::Null,
            WireValue::Integer { value } => value
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or(Value::String(value)),
            WireValue::Float { value } => serde_json::Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            WireValue::Text { value } => Value::String(value),
            WireValue::Blob { base64 } => Value::String(base64),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Stmt {
    sql: String,
    args: Vec<WireValue>,
    want_rows: bool,
}

impl Stmt {
    fn new(sql: &str, params: &[Value], want_rows: bool) -> Self {
        Self {
            sql: sql.to_string(),
            args: params.iter().map(WireValue::encode).collect(),
            want_rows,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum Condition {
    Ok { step: usize },
    Not { cond: Box<Condition> },
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    stmt: Stmt,
}

#[derive(Debug, Serialize)]
pub(crate) struct Batch {
    steps: Vec<BatchStep>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(crate) enum StreamRequest {
    Execute { stmt: Stmt },
    Batch { batch: Batch },
    Close,
}

#[derive(Debug, Serialize)]
pub(crate) struct PipelineRequest {
    requests: Vec<StreamRequest>,
}

#[derive(Debug, Deserialize)]
struct PipelineResponse {
    results: Vec<StreamResult>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: WireError },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: StmtResult },
    Batch { result: BatchResult },
    Close,
}

#[derive(Debug, Default, Deserialize)]
struct Col {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StmtResult {
    #[serde(default)]
    cols: Vec<Col>,
    #[serde(default)]
    rows: Vec<Vec<WireValue>>,
    #[serde(default)]
    affected_row_count: u64,
    #[serde(default)]
    last_insert_rowid: Option<String>,
}

impl StmtResult {
    fn into_rows(self) -> Vec<Row> {
        let names: Vec<String> = self
            .cols
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.name.unwrap_or_else(|| format!("column{}", i)))
            .collect();

        self.rows
            .into_iter()
            .map(|values| {
                names
                    .iter()
                    .cloned()
                    .zip(values.into_iter().map(WireValue::decode))
                    .collect()
            })
            .collect()
    }

    fn execute_result(&self) -> ExecuteResult {
        ExecuteResult {
            changes: self.affected_row_count,
            last_insert_rowid: self
                .last_insert_rowid
                .as_deref()
                .and_then(|id| id.parse().ok()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BatchResult {
    #[serde(default)]
    step_results: Vec<Option<StmtResult>>,
    #[serde(default)]
    step_errors: Vec<Option<WireError>>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

impl From<WireError> for StoreError {
    fn from(error: WireError) -> Self {
        StoreError::Remote {
            message: error.message,
            code: error.code,
        }
    }
}

/// `libsql://` URLs are served over HTTPS
pub fn http_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    match url.strip_prefix("libsql://") {
        Some(host) => format!("https://{}", host),
        None => url.to_string(),
    }
}

/// `BEGIN; statements...; COMMIT` with each step gated on the one before and a
/// `ROLLBACK` that only runs when COMMIT did not succeed
pub(crate) fn transaction_request(statements: &[Statement]) -> PipelineRequest {
    let mut steps = vec![BatchStep {
        condition: None,
        stmt: Stmt::new("BEGIN", &[], false),
    }];
    for statement in statements {
        steps.push(BatchStep {
            condition: Some(Condition::Ok {
                step: steps.len() - 1,
            }),
            stmt: Stmt::new(&statement.sql, &statement.params, false),
        });
    }
    let commit = steps.len();
    steps.push(BatchStep {
        condition: Some(Condition::Ok { step: commit - 1 }),
        stmt: Stmt::new("COMMIT", &[], false),
    });
    steps.push(BatchStep {
        condition: Some(Condition::Not {
            cond: Box::new(Condition::Ok { step: commit }),
        }),
        stmt: Stmt::new("ROLLBACK", &[], false),
    });

    PipelineRequest {
        requests: vec![StreamRequest::Batch {
            batch: Batch { steps },
        }, StreamRequest::Close],
    }
}

/// Pick the per-statement results out of a transaction batch, surfacing the
/// first failing step
fn transaction_results(batch: BatchResult, count: usize) -> Result<Vec<ExecuteResult>, StoreError> {
    let BatchResult {
        step_results,
        step_errors,
    } = batch;

    // BEGIN, the statements and COMMIT; the trailing ROLLBACK is expected to be skipped
    if let Some(error) = step_errors.into_iter().take(count + 2).flatten().next() {
        return Err(error.into());
    }

    step_results
        .into_iter()
        .skip(1)
        .take(count)
        .map(|result| {
            result.map(|r| r.execute_result()).ok_or_else(|| StoreError::Remote {
                message: "transaction step was not executed".to_string(),
                code: None,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .and_then(|results| {
            if results.len() == count {
                Ok(results)
            } else {
                Err(StoreError::Remote {
                    message: format!("expected {} step results, got {}", count, results.len()),
                    code: None,
                })
            }
        })
}

/// Executor for a hosted libSQL database
#[derive(Debug)]
pub struct RemoteExecutor {
    client: reqwest::Client,
    pipeline_url: String,
    auth_token: String,
    closed: AtomicBool,
}

impl RemoteExecutor {
    pub fn new(url: &str, auth_token: &str, request_timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        let pipeline_url = format!("{}/v2/pipeline", http_base_url(url));

        info!(url = %pipeline_url, "Using remote database");
        Ok(Self {
            client,
            pipeline_url,
            auth_token: auth_token.to_string(),
            closed: AtomicBool::new(false),
        })
    }

    async fn pipeline(&self, request: &PipelineRequest) -> Result<StreamResponse, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Unavailable("remote connection closed".to_string()));
        }

        let response = self
            .client
            .post(&self.pipeline_url)
            .bearer_auth(&self.auth_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Remote {
                message: if body.is_empty() {
                    status.to_string()
                } else {
                    body
                },
                code: Some(status.as_u16().to_string()),
            });
        }

        let body: PipelineResponse = response.json().await?;
        match body.results.into_iter().next() {
            Some(StreamResult::Ok { response }) => Ok(response),
            Some(StreamResult::Error { error }) => Err(error.into()),
            None => Err(StoreError::Remote {
                message: "empty pipeline response".to_string(),
                code: None,
            }),
        }
    }

    async fn execute_stmt(&self, sql: &str, params: &[Value], want_rows: bool) -> Result<StmtResult, StoreError> {
        debug!(backend = "remote", sql, params = params.len(), "pipeline execute");
        let request = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt::new(sql, params, want_rows),
                },
                StreamRequest::Close,
            ],
        };

        match self.pipeline(&request).await? {
            StreamResponse::Execute { result } => Ok(result),
            other => Err(StoreError::Remote {
                message: format!("unexpected response to execute: {:?}", other),
                code: None,
            }),
        }
    }
}

#[async_trait]
impl QueryExecutor for RemoteExecutor {
    fn backend(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, StoreError> {
        Ok(self.execute_stmt(sql, params, true).await?.into_rows())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecuteResult, StoreError> {
        Ok(self.execute_stmt(sql, params, false).await?.execute_result())
    }

    async fn transaction(
        &self,
        statements: Vec<Statement>,
    ) -> Result<Vec<ExecuteResult>, StoreError> {
        if statements.is_empty() {
            return Ok(Vec::new());
        }

        match self.pipeline(&transaction_request(&statements)).await? {
            StreamResponse::Batch { result } => transaction_results(result, statements.len()),
            other => Err(StoreError::Remote {
                message: format!("unexpected response to batch: {:?}", other),
                code: None,
            }),
        }
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("Remote database client closed");
        }
    }
}
