use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{KeywordValidator, PlanValidator, QueryValidator, Verdict};

/// AND-chain of validators.
///
/// Members are consulted in order and the first rejection is returned
/// without consulting the rest. Order changes cost, never the verdict. An
/// empty chain admits everything; production code builds it with
/// [`CompositeValidator::standard`].
#[derive(Clone, Default)]
pub struct CompositeValidator {
    validators: Vec<Arc<dyn QueryValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyword check first so most hostile input never costs a round trip
    pub fn standard(keywords: KeywordValidator, plan: PlanValidator) -> Self {
        Self::new().with(keywords).with(plan)
    }

    pub fn with<V: QueryValidator + 'static>(self, validator: V) -> Self {
        self.with_shared(Arc::new(validator))
    }

    pub fn with_shared(mut self, validator: Arc<dyn QueryValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.validators.iter().map(|v| v.name()).collect()
    }
}

#[async_trait]
impl QueryValidator for CompositeValidator {
    fn name(&self) -> &str {
        "composite"
    }

    async fn validate(&self, query: &str) -> Verdict {
        for validator in &self.validators {
            let verdict = validator.validate(query).await;
            if let Verdict::Rejected(reason) = verdict {
                debug!(validator = validator.name(), ?reason, "Chain stopped at rejection");
                return verdict;
            }
        }
        Verdict::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard_error::Rejection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        verdict: Verdict,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(verdict: Verdict) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryValidator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn validate(&self, _query: &str) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.verdict
        }
    }

    const KEYWORD: Verdict = Verdict::Rejected(Rejection::ContainsWriteOrAdminKeyword);
    const PLAN: Verdict = Verdict::Rejected(Rejection::PlanContainsWriteOrCall);

    #[tokio::test]
    async fn test_empty_chain_admits() {
        let chain = CompositeValidator::new();
        assert!(chain.is_empty());
        assert!(chain.is_allowed("anything at all").await);
    }

    #[tokio::test]
    async fn test_all_members_must_admit() {
        let first = Fixed::new(Verdict::Allowed);
        let second = Fixed::new(Verdict::Allowed);
        let chain = CompositeValidator::new()
            .with_shared(first.clone())
            .with_shared(second.clone());

        assert_eq!(chain.validate("MATCH (n) RETURN n").await, Verdict::Allowed);
        assert_eq!((first.calls(), second.calls()), (1, 1));
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_rejection() {
        let first = Fixed::new(KEYWORD);
        let second = Fixed::new(Verdict::Allowed);
        let chain = CompositeValidator::new()
            .with_shared(first.clone())
            .with_shared(second.clone());

        assert_eq!(chain.validate("CREATE (n)").await, KEYWORD);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_verdict_independent_of_order() {
        let members = [Verdict::Allowed, PLAN, Verdict::Allowed];
        let orders: [[usize; 3]; 3] = [[0, 1, 2], [1, 2, 0], [2, 0, 1]];

        for order in orders {
            let chain = order.iter().fold(CompositeValidator::new(), |chain, &i| {
                chain.with_shared(Fixed::new(members[i]))
            });
            assert!(!chain.is_allowed("RETURN x()").await);
        }
    }

    #[tokio::test]
    async fn test_chains_nest() {
        let inner = CompositeValidator::new().with_shared(Fixed::new(PLAN));
        let outer = CompositeValidator::new()
            .with_shared(Fixed::new(Verdict::Allowed))
            .with(inner);

        assert_eq!(outer.len(), 2);
        assert_eq!(outer.names(), vec!["fixed", "composite"]);
        assert_eq!(outer.validate("RETURN 1").await, PLAN);
    }
}
