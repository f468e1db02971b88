//! Recording fake of the graph engine.
//!
//! Plans are produced by a caller-supplied function of the query text, and
//! every call is recorded so tests can assert that validation never ran
//! anything.

#![allow(dead_code)]

use async_trait::async_trait;
use query_guard::{EngineError, ExecutionPlan, GraphEngine, PlanOperator, ResultSet};
use serde_json::json;
use std::sync::Mutex;

type PlanFn = Box<dyn Fn(&str) -> Result<ExecutionPlan, EngineError> + Send + Sync>;

pub struct RecordingEngine {
    plan_for: PlanFn,
    explained: Mutex<Vec<String>>,
    ran: Mutex<Vec<String>>,
}

impl RecordingEngine {
    pub fn new<F>(plan_for: F) -> Self
    where
        F: Fn(&str) -> Result<ExecutionPlan, EngineError> + Send + Sync + 'static,
    {
        Self {
            plan_for: Box::new(plan_for),
            explained: Mutex::new(Vec::new()),
            ran: Mutex::new(Vec::new()),
        }
    }

    /// Engine whose planner only ever reports read operators
    pub fn read_only() -> Self {
        Self::new(|_| Ok(read_plan()))
    }

    /// Rough stand-in for a real planner, good enough for the scenarios
    pub fn cypher_like() -> Self {
        Self::new(|query| {
            let upper = query.to_uppercase();
            if upper.contains("(N RETURN") {
                return Err(EngineError::statement(
                    "Neo.ClientError.Statement.SyntaxError",
                    "Invalid input 'RETURN'",
                ));
            }
            if upper.contains("PROCEDURE(") {
                return Ok(plan_with(
                    PlanOperator::new("ProcedureCall@neo4j")
                        .with_argument("Details", "someUnknownProcedure() :: (value :: ANY)"),
                ));
            }
            if upper.contains("CREATE (") {
                return Ok(plan_with(PlanOperator::new("Create@neo4j")));
            }
            Ok(read_plan())
        })
    }

    pub fn explained(&self) -> Vec<String> {
        self.explained.lock().unwrap().clone()
    }

    pub fn ran(&self) -> Vec<String> {
        self.ran.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphEngine for RecordingEngine {
    async fn explain_plan(&self, query: &str) -> Result<ExecutionPlan, EngineError> {
        self.explained.lock().unwrap().push(query.to_string());
        (self.plan_for)(query)
    }

    async fn run(&self, query: &str) -> Result<ResultSet, EngineError> {
        self.ran.lock().unwrap().push(query.to_string());
        Ok(ResultSet {
            columns: vec!["n".to_string()],
            rows: vec![vec![json!({"name": "Alice"})]],
            row_count: 1,
            truncated: false,
            execution_time_ms: 1,
        })
    }
}

pub fn read_plan() -> ExecutionPlan {
    ExecutionPlan::new(
        PlanOperator::new("ProduceResults@neo4j")
            .with_child(PlanOperator::new("NodeByLabelScan@neo4j")),
    )
}

pub fn plan_with(operator: PlanOperator) -> ExecutionPlan {
    ExecutionPlan::new(PlanOperator::new("ProduceResults@neo4j").with_child(operator))
}
