use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod recommendation;
pub mod session;

pub use recommendation::{Candidate, GeneratorReply, RecommendationDraft, ResolvedItem};
pub use session::{ExclusionSet, MergeMode, Session};

/// Upper bound on candidates taken from a single generator reply
pub const MAX_CANDIDATES: usize = 5;

/// Parameters for one catalog search
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogQuery {
    pub query: String,
    pub year: Option<i32>,
    pub locale: String,
}

impl Display for CatalogQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({}) [{}]", self.query, year, self.locale),
            None => write!(f, "{} [{}]", self.query, self.locale),
        }
    }
}

/// One catalog search hit, as ranked by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMatch {
    pub id: u64,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: u64,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Envelope of GET /search/movie
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// Raw movie entry from TMDB search results
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
}

impl From<TmdbMovie> for CatalogMatch {
    fn from(movie: TmdbMovie) -> Self {
        // TMDB sends "" for some missing images instead of null
        let non_empty = |path: Option<String>| path.filter(|p| !p.trim().is_empty());

        CatalogMatch {
            id: movie.id,
            title: movie.title,
            original_title: movie.original_title,
            overview: movie.overview,
            poster_path: non_empty(movie.poster_path),
            backdrop_path: non_empty(movie.backdrop_path),
            release_date: movie.release_date,
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmdb_movie_deserialization() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "original_title": "Inception",
            "overview": "Cobb, a skilled thief...",
            "poster_path": "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
            "backdrop_path": null,
            "release_date": "2010-07-15",
            "vote_average": 8.4,
            "vote_count": 35000,
            "genre_ids": [28, 878]
        }"#;

        let movie: TmdbMovie = serde_json::from_str(json).unwrap();
        assert_eq!(movie.id, 27205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.backdrop_path, None);
        assert_eq!(movie.vote_count, 35000);
    }

    #[test]
    fn test_tmdb_movie_to_catalog_match_drops_blank_images() {
        let movie = TmdbMovie {
            id: 1,
            title: "Heat".to_string(),
            original_title: "Heat".to_string(),
            overview: String::new(),
            poster_path: Some(String::new()),
            backdrop_path: Some("/bg.jpg".to_string()),
            release_date: "1995-12-15".to_string(),
            vote_average: 7.9,
            vote_count: 7000,
        };

        let hit: CatalogMatch = movie.into();
        assert_eq!(hit.poster_path, None);
        assert_eq!(hit.backdrop_path, Some("/bg.jpg".to_string()));
    }

    #[test]
    fn test_search_response_tolerates_missing_results() {
        let response: TmdbSearchResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_catalog_match_serializes_camel_case() {
        let hit = CatalogMatch {
            id: 603,
            title: "The Matrix".to_string(),
            original_title: "The Matrix".to_string(),
            overview: String::new(),
            poster_path: None,
            backdrop_path: None,
            release_date: "1999-03-30".to_string(),
            vote_average: 8.2,
            vote_count: 25000,
        };

        let value = serde_json::to_value(&hit).unwrap();
        assert_eq!(value["originalTitle"], "The Matrix");
        assert_eq!(value["releaseDate"], "1999-03-30");
        assert!(value.get("original_title").is_none());
    }

    #[test]
    fn test_catalog_query_display() {
        let query = CatalogQuery {
            query: "Alien".to_string(),
            year: Some(1979),
            locale: "en-US".to_string(),
        };
        assert_eq!(format!("{}", query), "Alien (1979) [en-US]");
    }
}
