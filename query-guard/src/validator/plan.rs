//! Plan-Based Validator
//!
//! Semantic check backed by the engine: the query is explained (compiled,
//! not executed) and every plan operator is inspected. The engine knows the
//! real grammar, so this is the authoritative check for procedure calls,
//! which no keyword list can fully enumerate.
//!
//! Fail closed: a timeout, an unreachable engine, a syntax error or a
//! response without a plan is a rejection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{QueryValidator, Verdict};
use crate::engine::{ExecutionPlan, GraphEngine, PlanOperator};
use crate::guard_error::{EngineError, Rejection};

pub const DEFAULT_EXPLAIN_TIMEOUT: Duration = Duration::from_secs(3);

const PROCEDURE_CALL_OPERATOR: &str = "ProcedureCall";

const DEFAULT_WRITE_OPERATORS: &[&str] = &[
    "Create",
    "Merge",
    "Set",
    "Remove",
    "Delete",
    "Foreach",
    "LoadCSV",
    "Drop",
    "Lock",
    "Transaction",
];

/// Which plan operators are acceptable in a read-only query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanPolicy {
    /// An operator whose name contains any of these markers is a write
    pub write_operators: Vec<String>,
    /// Procedures that may appear in a `ProcedureCall` operator
    #[serde(default)]
    pub allowed_procedures: Vec<String>,
}

impl Default for PlanPolicy {
    fn default() -> Self {
        Self {
            write_operators: DEFAULT_WRITE_OPERATORS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_procedures: Vec::new(),
        }
    }
}

impl PlanPolicy {
    pub fn with_allowed_procedures(mut self, procedures: Vec<String>) -> Self {
        self.allowed_procedures = procedures;
        self
    }

    /// True when no operator in the plan writes or calls a procedure that is
    /// not allow-listed
    pub fn permits(&self, plan: &ExecutionPlan) -> bool {
        plan.operators().all(|operator| self.permits_operator(operator))
    }

    fn permits_operator(&self, operator: &PlanOperator) -> bool {
        let name = operator.name();

        if name.contains(PROCEDURE_CALL_OPERATOR) {
            return match procedure_name(operator) {
                Some(procedure) => self
                    .allowed_procedures
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(procedure)),
                None => false,
            };
        }

        !self
            .write_operators
            .iter()
            .any(|marker| name.contains(marker.as_str()))
    }
}

/// Procedure name from a `ProcedureCall` operator, e.g. `db.labels` out of
/// `db.labels() :: (label :: STRING)`
fn procedure_name(operator: &PlanOperator) -> Option<&str> {
    let details = operator
        .argument_str("Details")
        .or_else(|| operator.argument_str("Signature"))?;
    let name = details.split('(').next()?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

pub struct PlanValidator {
    engine: Arc<dyn GraphEngine>,
    policy: PlanPolicy,
    timeout: Duration,
}

impl PlanValidator {
    /// `engine` should be connected with a read-only database user
    pub fn new(engine: Arc<dyn GraphEngine>) -> Self {
        Self {
            engine,
            policy: PlanPolicy::default(),
            timeout: DEFAULT_EXPLAIN_TIMEOUT,
        }
    }

    pub fn with_policy(mut self, policy: PlanPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn policy(&self) -> &PlanPolicy {
        &self.policy
    }

    async fn explain(&self, query: &str) -> Result<ExecutionPlan, EngineError> {
        match tokio::time::timeout(self.timeout, self.engine.explain_plan(query)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl QueryValidator for PlanValidator {
    fn name(&self) -> &str {
        "plan"
    }

    async fn validate(&self, query: &str) -> Verdict {
        let plan = match self.explain(query).await {
            Ok(plan) => plan,
            Err(e) => {
                // Engine messages quote the statement, so only codes are logged
                match &e {
                    EngineError::Statement { code, .. } => {
                        warn!(
                            %code,
                            query_len = query.len(),
                            "Query rejected: engine could not plan it"
                        )
                    }
                    EngineError::Api { status, .. } => {
                        error!(status, "Query rejected: engine returned an error status")
                    }
                    _ => error!(kind = e.kind(), "Query rejected: plan explain failed"),
                }
                return Verdict::Rejected(Rejection::EngineUnavailableOrSyntaxError);
            }
        };

        if self.policy.permits(&plan) {
            debug!(
                operators = plan.operators().count(),
                "Plan contains only read operators"
            );
            Verdict::Allowed
        } else {
            let offending: Vec<&str> = plan
                .operators()
                .filter(|op| !self.policy.permits_operator(op))
                .map(|op| op.name())
                .collect();
            warn!(?offending, "Query rejected: plan contains write or call operators");
            Verdict::Rejected(Rejection::PlanContainsWriteOrCall)
        }
    }
}
