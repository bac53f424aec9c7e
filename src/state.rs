use std::sync::Arc;

use crate::services::{catalog::CatalogSearch, QuizService, RecommendationPipeline};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: RecommendationPipeline,
    pub quiz: QuizService,
    /// Same catalog the pipeline resolves against, exposed for direct search
    pub catalog: Arc<dyn CatalogSearch>,
    pub locale: String,
}

impl AppState {
    pub fn new(
        pipeline: RecommendationPipeline,
        quiz: QuizService,
        catalog: Arc<dyn CatalogSearch>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            quiz,
            catalog,
            locale: locale.into(),
        }
    }
}
