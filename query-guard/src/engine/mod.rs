//! Graph query engine collaborator
//!
//! The admission filter treats the engine as a black box that can explain
//! a query (compile it to a plan without running it) and run it. Handles are
//! passed in explicitly (usually as `Arc<dyn GraphEngine>`) so tests can
//! substitute a fake engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::guard_error::EngineError;

pub mod neo4j;
pub mod types;

pub use neo4j::{Neo4jHttpEngine, Neo4jSettings};

#[async_trait]
pub trait GraphEngine: Send + Sync {
    /// Compile `query` into an execution plan without executing it
    async fn explain_plan(&self, query: &str) -> Result<ExecutionPlan, EngineError>;

    async fn run(&self, query: &str) -> Result<ResultSet, EngineError>;
}

/// One operator of an execution plan, with its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOperator {
    #[serde(rename = "operatorType")]
    pub operator_type: String,
    #[serde(default)]
    pub children: Vec<PlanOperator>,
    #[serde(flatten)]
    pub arguments: Map<String, Value>,
}

impl PlanOperator {
    pub fn new(operator_type: impl Into<String>) -> Self {
        Self {
            operator_type: operator_type.into(),
            children: Vec::new(),
            arguments: Map::new(),
        }
    }

    pub fn with_child(mut self, child: PlanOperator) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_argument(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// Operator name without the runtime suffix (`Create@neo4j` -> `Create`)
    pub fn name(&self) -> &str {
        self.operator_type
            .split('@')
            .next()
            .unwrap_or(&self.operator_type)
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// Execution plan as reported by the engine's explain facility.
///
/// Only the operator names (and a couple of operator arguments) are
/// inspected; nothing else about the tree's shape is relied on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub root: PlanOperator,
}

impl ExecutionPlan {
    pub fn new(root: PlanOperator) -> Self {
        Self { root }
    }

    /// All operators, depth first, root included
    pub fn operators(&self) -> impl Iterator<Item = &PlanOperator> {
        let mut stack = vec![&self.root];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
    pub execution_time_ms: u64,
}
