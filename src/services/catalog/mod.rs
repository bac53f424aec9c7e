/// Media catalog abstraction
///
/// The catalog verifies that a generator candidate exists and supplies its
/// metadata. Implementations return hits in the catalog's own relevance
/// order; callers treat the first hit as the best match.
use crate::{
    error::AppResult,
    models::{CatalogMatch, CatalogQuery},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Catalog search capability
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Search by title, optionally narrowed to a release year
    async fn search(&self, query: &CatalogQuery) -> AppResult<Vec<CatalogMatch>>;

    /// Catalog name for logging
    fn name(&self) -> &'static str;
}
