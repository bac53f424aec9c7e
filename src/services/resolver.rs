use std::sync::Arc;

use crate::{
    error::AppError,
    models::{Candidate, CatalogMatch, CatalogQuery, ResolvedItem},
    services::catalog::CatalogSearch,
};

/// Why a single candidate did not make it into the results
///
/// Never surfaced to API callers; the candidate is simply dropped.
#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("no catalog match")]
    NoMatch,

    #[error("best match {matched:?} too dissimilar (similarity {similarity:.2})")]
    Rejected { matched: String, similarity: f64 },

    #[error(transparent)]
    Catalog(#[from] AppError),

    #[error("lookup task failed: {0}")]
    Task(String),
}

/// How the first catalog hit is vetted before it is accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchPolicy {
    /// Take the catalog's top hit as-is
    FirstResult,
    /// Take the top hit only if its title (or original title) is at least
    /// `threshold` similar to the candidate title, on a 0.0..=1.0 scale
    TitleSimilarity { threshold: f64 },
}

impl MatchPolicy {
    fn vet(&self, candidate: &Candidate, hit: &CatalogMatch) -> Result<(), LookupError> {
        match *self {
            MatchPolicy::FirstResult => Ok(()),
            MatchPolicy::TitleSimilarity { threshold } => {
                let similarity = title_similarity(&candidate.title, &hit.title)
                    .max(title_similarity(&candidate.title, &hit.original_title));
                if similarity >= threshold {
                    Ok(())
                } else {
                    Err(LookupError::Rejected {
                        matched: hit.title.clone(),
                        similarity,
                    })
                }
            }
        }
    }
}

/// Case-insensitive normalized Levenshtein similarity
pub fn title_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

/// Where poster and backdrop images are served from
#[derive(Debug, Clone)]
pub struct ImageUrls {
    pub base_url: String,
    pub poster_size: String,
    pub backdrop_size: String,
}

impl ImageUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            poster_size: "w500".to_string(),
            backdrop_size: "w1280".to_string(),
        }
    }

    fn url(&self, size: &str, path: Option<String>) -> Option<String> {
        path.map(|p| {
            format!(
                "{}/{}/{}",
                self.base_url.trim_end_matches('/'),
                size,
                p.trim_start_matches('/')
            )
        })
    }
}

/// Matches one candidate against the catalog
pub struct CatalogResolver {
    catalog: Arc<dyn CatalogSearch>,
    locale: String,
    images: ImageUrls,
    policy: MatchPolicy,
}

impl CatalogResolver {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        locale: impl Into<String>,
        images: ImageUrls,
        policy: MatchPolicy,
    ) -> Self {
        Self {
            catalog,
            locale: locale.into(),
            images,
            policy,
        }
    }

    /// Searches by title and year and maps the top hit into a [`ResolvedItem`]
    ///
    /// Only the first hit is ever considered. With [`MatchPolicy::FirstResult`]
    /// a same-year hit with a different title is accepted.
    pub async fn resolve(&self, candidate: &Candidate) -> Result<ResolvedItem, LookupError> {
        let query = CatalogQuery {
            query: candidate.title.clone(),
            year: Some(candidate.year),
            locale: self.locale.clone(),
        };

        let hits = self.catalog.search(&query).await?;
        let best = hits.into_iter().next().ok_or(LookupError::NoMatch)?;
        self.policy.vet(candidate, &best)?;

        tracing::debug!(
            candidate = %candidate.title,
            year = candidate.year,
            catalog_id = best.id,
            matched = %best.title,
            "Candidate resolved"
        );

        Ok(self.enrich(best, candidate.reason.clone()))
    }

    fn enrich(&self, hit: CatalogMatch, reason: String) -> ResolvedItem {
        ResolvedItem {
            catalog_id: hit.id,
            poster_url: self.images.url(&self.images.poster_size, hit.poster_path),
            backdrop_url: self.images.url(&self.images.backdrop_size, hit.backdrop_path),
            title: hit.title,
            original_title: hit.original_title,
            overview: hit.overview,
            release_date: hit.release_date,
            vote_average: hit.vote_average,
            vote_count: hit.vote_count,
            reason,
        }
    }
}
