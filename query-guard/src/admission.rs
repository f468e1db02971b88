//! Query Admission Service
//!
//! The single entry point for callers (parser functions, REST handlers):
//! take raw query text, decide whether it may run, and only then hand it to
//! the engine. Nothing reaches [`GraphEngine::run`] without an `Allowed`
//! verdict.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GuardConfig;
use crate::engine::{GraphEngine, Neo4jHttpEngine, ResultSet};
use crate::guard_error::{EngineError, QueryError, Rejection};
use crate::validator::{
    CompositeValidator, KeywordValidator, PlanValidator, QueryValidator, Verdict,
};

pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

pub struct QueryAdmission {
    validator: Arc<dyn QueryValidator>,
    engine: Arc<dyn GraphEngine>,
    validation_timeout: Duration,
}

impl QueryAdmission {
    pub fn new(validator: Arc<dyn QueryValidator>, engine: Arc<dyn GraphEngine>) -> Self {
        Self {
            validator,
            engine,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
        }
    }

    /// Keyword check then plan check, both engines supplied by the caller.
    /// `validation_engine` should hold a read-only credential.
    pub fn standard(
        validation_engine: Arc<dyn GraphEngine>,
        execution_engine: Arc<dyn GraphEngine>,
    ) -> Self {
        let validator = CompositeValidator::standard(
            KeywordValidator::default(),
            PlanValidator::new(validation_engine),
        );
        Self::new(Arc::new(validator), execution_engine)
    }

    /// Wires the HTTP engine(s), keyword set and plan policy from configuration.
    ///
    /// Plans are explained with the read-only validation user. Reusing the
    /// execution credential has to be switched on with
    /// `engine.allow_shared_credential`.
    pub fn from_config(config: &GuardConfig) -> Result<Self, EngineError> {
        let execution_engine: Arc<dyn GraphEngine> =
            Arc::new(Neo4jHttpEngine::new(config.engine.execution_settings())?);

        let validation_engine: Arc<dyn GraphEngine> = match config.engine.validation_settings() {
            Some(settings) => Arc::new(Neo4jHttpEngine::new(settings)?),
            None if config.engine.allow_shared_credential => {
                warn!("No read-only validation user configured, explaining with the execution user");
                execution_engine.clone()
            }
            None => {
                return Err(EngineError::invalid_config(
                    "engine.validation_username is required unless engine.allow_shared_credential is set",
                ))
            }
        };

        let keyword_set = config.validation.keyword_set();
        info!(
            keyword_set = %keyword_set.version(),
            keywords = keyword_set.keywords().len(),
            "Query admission configured"
        );

        let plan_validator = PlanValidator::new(validation_engine)
            .with_policy(config.validation.plan_policy())
            .with_timeout(config.validation.explain_timeout());
        let validator =
            CompositeValidator::standard(KeywordValidator::new(keyword_set), plan_validator);

        Ok(Self::new(Arc::new(validator), execution_engine)
            .with_validation_timeout(config.validation.timeout()))
    }

    pub fn with_validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = timeout;
        self
    }

    pub fn validation_timeout(&self) -> Duration {
        self.validation_timeout
    }

    /// Admission decision without running anything
    pub async fn check(&self, query: &str) -> Verdict {
        if query.trim().is_empty() {
            debug!("Empty query, nothing to run");
            return Verdict::Rejected(Rejection::EmptyQuery);
        }

        match tokio::time::timeout(self.validation_timeout, self.validator.validate(query)).await
        {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!(
                    timeout_ms = self.validation_timeout.as_millis() as u64,
                    "Query rejected: validation timed out"
                );
                Verdict::Rejected(Rejection::EngineUnavailableOrSyntaxError)
            }
        }
    }

    pub async fn run_if_allowed(&self, query: &str) -> Result<ResultSet, QueryError> {
        if let Verdict::Rejected(reason) = self.check(query).await {
            return Err(QueryError::Rejected(reason));
        }

        debug!(query_len = query.len(), "Query admitted, running");
        Ok(self.engine.run(query).await?)
    }
}
