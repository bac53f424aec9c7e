use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::{
    models::{Candidate, RecommendationDraft, ResolvedItem},
    services::resolver::{CatalogResolver, LookupError},
};

/// Resolves every candidate of a draft concurrently
///
/// All lookups run to completion; a slow or failing lookup never cancels its
/// siblings. Output keeps candidate order with unmatched entries removed.
#[derive(Clone)]
pub struct ResolutionAggregator {
    resolver: Arc<CatalogResolver>,
    limit: Option<Arc<Semaphore>>,
}

impl ResolutionAggregator {
    pub fn new(resolver: Arc<CatalogResolver>) -> Self {
        Self {
            resolver,
            limit: None,
        }
    }

    /// Caps the number of catalog lookups in flight across all rounds
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.limit = Some(Arc::new(Semaphore::new(max.max(1))));
        self
    }

    pub async fn aggregate(&self, draft: &RecommendationDraft) -> Vec<ResolvedItem> {
        let outcomes = self.resolve_all(&draft.candidates).await;

        let mut items = Vec::with_capacity(outcomes.len());
        let mut unmatched = 0usize;

        for (candidate, outcome) in draft.candidates.iter().zip(outcomes) {
            match outcome {
                Ok(item) => items.push(item),
                Err(e) => {
                    unmatched += 1;
                    tracing::warn!(
                        title = %candidate.title,
                        year = candidate.year,
                        error = %e,
                        "Candidate unmatched, dropping"
                    );
                }
            }
        }

        if unmatched > 0 {
            tracing::warn!(
                resolved = items.len(),
                unmatched,
                "Partial catalog resolution"
            );
        }

        items
    }

    /// One outcome per candidate, in candidate order
    pub async fn resolve_all(
        &self,
        candidates: &[Candidate],
    ) -> Vec<Result<ResolvedItem, LookupError>> {
        let mut tasks = Vec::with_capacity(candidates.len());

        for candidate in candidates.iter().cloned() {
            let resolver = self.resolver.clone();
            let limit = self.limit.clone();
            tasks.push(tokio::spawn(resolve_one(resolver, limit, candidate)));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(error = %e, "Lookup task join error");
                    Err(LookupError::Task(e.to_string()))
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }
}

async fn resolve_one(
    resolver: Arc<CatalogResolver>,
    limit: Option<Arc<Semaphore>>,
    candidate: Candidate,
) -> Result<ResolvedItem, LookupError> {
    let _permit = match limit {
        Some(semaphore) => Some(
            semaphore
                .acquire_owned()
                .await
                .map_err(|e| LookupError::Task(e.to_string()))?,
        ),
        None => None,
    };

    resolver.resolve(&candidate).await
}
