//! Neo4j engine over the transactional HTTP endpoint
//!
//! Every request carries `access-mode: READ`, and the explain path is meant
//! to use a database user whose grants are read-only. Either one alone
//! already forbids writes.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use super::types::{TxRequest, TxResponse};
use super::{ExecutionPlan, GraphEngine, ResultSet};
use crate::guard_error::EngineError;

const ACCESS_MODE_HEADER: &str = "access-mode";

#[derive(Debug, Clone)]
pub struct Neo4jSettings {
    pub url: String,
    pub database: String,
    pub username: String,
    pub password: String,
    pub request_timeout: Duration,
    /// Rows kept by `run`; the cut is made client-side
    pub max_rows: usize,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:7474".to_string(),
            database: "neo4j".to_string(),
            username: "neo4j".to_string(),
            password: String::new(),
            request_timeout: Duration::from_secs(10),
            max_rows: 1000,
        }
    }
}

pub struct Neo4jHttpEngine {
    endpoint: String,
    username: String,
    password: String,
    max_rows: usize,
    http_client: reqwest::Client,
}

impl Neo4jHttpEngine {
    pub fn new(settings: Neo4jSettings) -> Result<Self, EngineError> {
        let endpoint = build_endpoint(&settings.url, &settings.database)?;

        let http_client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| EngineError::Network { source: e })?;

        Ok(Self {
            endpoint,
            username: settings.username,
            password: settings.password,
            max_rows: settings.max_rows,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn submit(&self, statement: &str) -> Result<TxResponse, EngineError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCESS_MODE_HEADER, HeaderValue::from_static("READ"));

        let response = self
            .http_client
            .post(&self.endpoint)
            .headers(headers)
            .basic_auth(&self.username, Some(&self.password))
            .json(&TxRequest::single(statement))
            .send()
            .await
            .map_err(|e| EngineError::Network { source: e })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), "Engine endpoint returned an error status");
            return Err(EngineError::api_error(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        let tx_response: TxResponse = serde_json::from_str(&body)?;

        if let Some(tx_error) = tx_response.errors.first() {
            debug!(code = %tx_error.code, "Engine rejected statement");
            return Err(EngineError::statement(
                tx_error.code.clone(),
                tx_error.message.clone(),
            ));
        }

        Ok(tx_response)
    }
}

#[async_trait]
impl GraphEngine for Neo4jHttpEngine {
    async fn explain_plan(&self, query: &str) -> Result<ExecutionPlan, EngineError> {
        let statement = format!("EXPLAIN {}", query);
        let response = self.submit(&statement).await?;

        response
            .results
            .into_iter()
            .next()
            .and_then(|result| result.plan)
            .map(|plan| ExecutionPlan::new(plan.root))
            .ok_or(EngineError::MissingPlan)
    }

    /// Runs the query as written. The endpoint has no row cap, so the full
    /// result is transferred and decoded and `max_rows` truncation happens
    /// here on the client.
    async fn run(&self, query: &str) -> Result<ResultSet, EngineError> {
        let start_time = Instant::now();
        let response = self.submit(query).await?;

        let Some(result) = response.results.into_iter().next() else {
            return Ok(ResultSet {
                execution_time_ms: start_time.elapsed().as_millis() as u64,
                ..ResultSet::default()
            });
        };

        let total_rows = result.data.len();
        let rows: Vec<Vec<serde_json::Value>> = result
            .data
            .into_iter()
            .take(self.max_rows)
            .map(|row| row.row)
            .collect();

        Ok(ResultSet {
            columns: result.columns,
            row_count: rows.len(),
            rows,
            truncated: total_rows > self.max_rows,
            execution_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }
}

fn build_endpoint(base_url: &str, database: &str) -> Result<String, EngineError> {
    if database.trim().is_empty()
        || !database
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(EngineError::invalid_config(format!(
            "Invalid database name: '{}'",
            database
        )));
    }

    let url = url::Url::parse(base_url)
        .map_err(|e| EngineError::invalid_config(format!("Invalid engine URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(EngineError::invalid_config(
            "Engine URL must start with 'http://' or 'https://'",
        ));
    }
    if url.host_str().is_none() {
        return Err(EngineError::invalid_config("Engine URL must include a host"));
    }

    Ok(format!(
        "{}/db/{}/tx/commit",
        url.as_str().trim_end_matches('/'),
        database
    ))
}
