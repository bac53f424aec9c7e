use serde::{Deserialize, Serialize};

/// A title proposed by the generator, not yet verified against the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub year: i32,
    pub reason: String,
}

/// Schema-valid generator output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendationDraft {
    #[serde(rename = "summary")]
    pub summary_text: String,
    /// At most [`crate::models::MAX_CANDIDATES`] entries, in generator order
    #[serde(rename = "items")]
    pub candidates: Vec<Candidate>,
}

/// What the generator answered with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorReply {
    /// The model needs more detail before it can recommend anything
    Clarification { question: String },
    Recommendations(RecommendationDraft),
}

/// A candidate matched to a catalog entry and enriched with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItem {
    pub catalog_id: u64,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: u64,
    /// The generator's justification, carried through unchanged
    pub reason: String,
}
