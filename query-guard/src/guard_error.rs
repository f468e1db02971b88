use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use config::ConfigError;

/// Why a query was refused admission.
///
/// The display text is the internal, diagnostic reason. Callers rendering a
/// page should use [`Rejection::user_message`] instead so validator internals
/// never reach a potential attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum Rejection {
    #[error("no query text supplied")]
    EmptyQuery,
    #[error("query contains a write or administrative keyword")]
    ContainsWriteOrAdminKeyword,
    #[error("execution plan contains a write or procedure call operator")]
    PlanContainsWriteOrCall,
    #[error("query engine unavailable or query is syntactically invalid")]
    EngineUnavailableOrSyntaxError,
}

impl Rejection {
    /// Short, generic text safe to show to page readers
    pub fn user_message(&self) -> &'static str {
        match self {
            Rejection::EmptyQuery => "No query supplied",
            Rejection::ContainsWriteOrAdminKeyword | Rejection::PlanContainsWriteOrCall => {
                "Query is not a read query"
            }
            Rejection::EngineUnavailableOrSyntaxError => "Query could not be run",
        }
    }

    /// Empty queries render as a no-op rather than an error box
    pub fn is_silent(&self) -> bool {
        matches!(self, Rejection::EmptyQuery)
    }
}

/// Infrastructure failures reported by the query engine collaborator
#[derive(Error, Debug)]
pub enum EngineError {
    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// Response body could not be decoded
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// Non-success HTTP status from the engine endpoint
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The engine refused the statement (syntax error, unknown function, ...)
    #[error("Statement rejected ({code}): {message}")]
    Statement { code: String, message: String },

    #[error("Engine returned no execution plan")]
    MissingPlan,

    #[error("Engine call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid engine configuration: {message}")]
    InvalidConfig { message: String },
}

impl EngineError {
    pub fn api_error(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    pub fn statement<S: Into<String>>(code: S, message: S) -> Self {
        Self::Statement {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Variant name, safe to log. Messages may echo query text.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Network { .. } => "network",
            EngineError::Parse { .. } => "parse",
            EngineError::Api { .. } => "api",
            EngineError::Statement { .. } => "statement",
            EngineError::MissingPlan => "missing_plan",
            EngineError::Timeout(_) => "timeout",
            EngineError::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// Error returned by [`crate::QueryAdmission::run_if_allowed`]
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query rejected: {0}")]
    Rejected(Rejection),

    /// The query was admitted but the engine failed while running it
    #[error("Query execution failed: {0}")]
    Execution(#[from] EngineError),
}

impl QueryError {
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            QueryError::Rejected(reason) => Some(*reason),
            QueryError::Execution(_) => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            QueryError::Rejected(reason) => reason.user_message(),
            QueryError::Execution(_) => "Query could not be run",
        }
    }
}

impl From<Rejection> for QueryError {
    fn from(reason: Rejection) -> Self {
        QueryError::Rejected(reason)
    }
}
