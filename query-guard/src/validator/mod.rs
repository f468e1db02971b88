//! Read-only admission validators
//!
//! Untrusted query text passes through two independent classifiers before it
//! may reach the engine:
//!
//! 1. [`KeywordValidator`]: pure and fast. Normalizes the text
//!    ([`normalize`]), empties string literals ([`strip_string_literals`]) and
//!    rejects any banned keyword that is left as a whole word.
//! 2. [`PlanValidator`]: asks the engine for an execution plan (never runs
//!    the query) and rejects plans containing write or procedure call
//!    operators. Any failure to obtain a plan is a rejection.
//!
//! [`CompositeValidator`] chains them, cheap check first. Validators return
//! a [`Verdict`]; an unsafe query is an ordinary outcome, not an error.

use async_trait::async_trait;

use crate::guard_error::Rejection;

pub mod composite;
pub mod keywords;
pub mod literals;
pub mod normalize;
pub mod plan;

pub use composite::CompositeValidator;
pub use keywords::{KeywordSet, KeywordValidator, BUILTIN_KEYWORD_SET_VERSION};
pub use literals::strip_string_literals;
pub use normalize::{normalize, NormalizedQuery};
pub use plan::{PlanPolicy, PlanValidator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Allowed,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Verdict::Allowed => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

/// A read-only admission check.
///
/// Implementations hold no mutable shared state, so one instance can be
/// shared across concurrent page renders.
#[async_trait]
pub trait QueryValidator: Send + Sync {
    /// Short name used in logs (e.g. "keyword", "plan")
    fn name(&self) -> &str;

    async fn validate(&self, query: &str) -> Verdict;

    async fn is_allowed(&self, query: &str) -> bool {
        self.validate(query).await.is_allowed()
    }
}
