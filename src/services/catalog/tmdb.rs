/// The Movie Database (TMDB) catalog
///
/// Uses `/search/movie`, which ranks by relevance and accepts a release year
/// filter. Results are cached per (query, year, locale) when a cache is
/// configured.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogMatch, CatalogQuery, TmdbSearchResponse},
    services::catalog::CatalogSearch,
};
use reqwest::Client as HttpClient;

const SEARCH_CACHE_TTL: u64 = 86400; // 1 day

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Option<Cache>,
}

impl TmdbCatalog {
    pub fn new(api_key: String, api_url: String, cache: Option<Cache>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    fn query_params(&self, query: &CatalogQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("api_key", self.api_key.clone()),
            ("query", query.query.clone()),
            ("language", query.locale.clone()),
            ("include_adult", "false".to_string()),
        ];
        if let Some(year) = query.year {
            params.push(("year", year.to_string()));
        }
        params
    }

    async fn fetch(&self, query: &CatalogQuery) -> AppResult<Vec<CatalogMatch>> {
        let url = format!("{}/search/movie", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CatalogLookup(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        let hits: Vec<CatalogMatch> = search.results.into_iter().map(CatalogMatch::from).collect();

        tracing::info!(
            query = %query,
            results = hits.len(),
            provider = "tmdb",
            "Catalog search completed"
        );

        Ok(hits)
    }
}

#[async_trait::async_trait]
impl CatalogSearch for TmdbCatalog {
    async fn search(&self, query: &CatalogQuery) -> AppResult<Vec<CatalogMatch>> {
        if query.query.trim().is_empty() {
            return Err(AppError::Validation(
                "Search query cannot be empty".to_string(),
            ));
        }

        match &self.cache {
            Some(cache) => cached!(
                cache,
                CacheKey::CatalogSearch(query.clone()),
                SEARCH_CACHE_TTL,
                self.fetch(query)
            ),
            None => self.fetch(query).await,
        }
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TmdbCatalog {
        TmdbCatalog::new("test_key".to_string(), "http://test.local".to_string(), None)
    }

    fn param<'a>(params: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_query_params_with_year() {
        let params = catalog().query_params(&CatalogQuery {
            query: "Alien".to_string(),
            year: Some(1979),
            locale: "en-US".to_string(),
        });

        assert_eq!(param(&params, "query"), Some("Alien"));
        assert_eq!(param(&params, "year"), Some("1979"));
        assert_eq!(param(&params, "language"), Some("en-US"));
        assert_eq!(param(&params, "api_key"), Some("test_key"));
    }

    #[test]
    fn test_query_params_without_year() {
        let params = catalog().query_params(&CatalogQuery {
            query: "Alien".to_string(),
            year: None,
            locale: "ko-KR".to_string(),
        });

        assert_eq!(param(&params, "year"), None);
        assert_eq!(param(&params, "language"), Some("ko-KR"));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected_without_network() {
        let result = catalog()
            .search(&CatalogQuery {
                query: "   ".to_string(),
                year: Some(2000),
                locale: "en-US".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_catalog_is_an_error() {
        let catalog = TmdbCatalog::new(
            "test_key".to_string(),
            "http://127.0.0.1:9".to_string(),
            None,
        );
        let result = catalog
            .search(&CatalogQuery {
                query: "Heat".to_string(),
                year: Some(1995),
                locale: "en-US".to_string(),
            })
            .await;

        assert!(result.is_err());
    }
}
