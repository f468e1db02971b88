//! Wire types of the transactional HTTP endpoint (`/db/{database}/tx/commit`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PlanOperator;

#[derive(Debug, Clone, Serialize)]
pub struct TxRequest<'a> {
    pub statements: Vec<TxStatement<'a>>,
}

impl<'a> TxRequest<'a> {
    pub fn single(statement: &'a str) -> Self {
        Self {
            statements: vec![TxStatement {
                statement,
                result_data_contents: vec!["row"],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TxStatement<'a> {
    pub statement: &'a str,
    #[serde(rename = "resultDataContents")]
    pub result_data_contents: Vec<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub results: Vec<TxResult>,
    #[serde(default)]
    pub errors: Vec<TxError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub data: Vec<TxRow>,
    #[serde(default)]
    pub plan: Option<TxPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxRow {
    #[serde(default)]
    pub row: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxPlan {
    pub root: PlanOperator,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TxError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}
