//! # query-guard
//!
//! Read-only admission filter for graph queries embedded in wiki pages.
//!
//! Page authors are untrusted, yet their queries run with one shared database
//! credential. Every query therefore passes a lexical keyword check and a
//! plan-based check against the real query planner before it may run.
//!
//! ```rust,no_run
//! use query_guard::{GuardConfig, QueryAdmission};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GuardConfig::load()?;
//! query_guard::logging::init(&config.logging);
//!
//! let admission = QueryAdmission::from_config(&config)?;
//! match admission.run_if_allowed("MATCH (p:Person) RETURN p.name").await {
//!     Ok(results) => println!("{} rows", results.row_count),
//!     Err(e) => println!("{}", e.user_message()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod admission;
pub mod config;
pub mod engine;
pub mod guard_error;
pub mod logging;
pub mod validator;

pub use crate::admission::QueryAdmission;
pub use crate::config::GuardConfig;
pub use crate::engine::{ExecutionPlan, GraphEngine, Neo4jHttpEngine, PlanOperator, ResultSet};
pub use crate::guard_error::{ConfigError, EngineError, QueryError, Rejection};
pub use crate::validator::{
    CompositeValidator, KeywordSet, KeywordValidator, PlanPolicy, PlanValidator, QueryValidator,
    Verdict,
};
